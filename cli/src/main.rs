//! Identify CLI - replay scripted identify sessions.
//!
//! ```text
//! identify replay <script.json>
//! ```
//!
//! Each script step is played against a recording UI, behind the buffered
//! identify UI unless `[session] buffered = false` is configured. Calls that
//! reached the recording UI are printed as JSON lines on stdout, followed by
//! a summary line. Logs go to stderr (`RUST_LOG`, default `info`).

mod script;

use std::env;
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use identify_config::IdentifyConfig;

const USAGE: &str = "\
Usage: identify replay <script.json>

Replays a scripted identify session through the buffered identify UI and
prints every call that reached the UI as JSON lines.

Configuration is read from ~/.identify/config.toml.
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Replay { script: PathBuf },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [] => Ok(Self::Help),
            [flag] if flag == "-h" || flag == "--help" || flag == "help" => Ok(Self::Help),
            [cmd, script] if cmd == "replay" => Ok(Self::Replay {
                script: PathBuf::from(script),
            }),
            [cmd] if cmd == "replay" => bail!("replay needs a script path\n\n{USAGE}"),
            _ => bail!("unrecognized arguments: {}\n\n{USAGE}", args.join(" ")),
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries the transcript; keep logs off it.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    match Command::parse(&args)? {
        Command::Help => {
            print!("{USAGE}");
            Ok(())
        }
        Command::Replay { script } => replay(&script).await,
    }
}

async fn replay(path: &Path) -> Result<()> {
    if let Some(config_path) = IdentifyConfig::path() {
        tracing::debug!(path = %config_path.display(), "Reading identify config");
    }
    let config = IdentifyConfig::load().unwrap_or_default();
    tracing::info!(
        script = %path.display(),
        buffered = config.session.buffered,
        "Replaying identify script"
    );

    let steps = script::load_script(path)?;
    let report = script::run_script(steps, &config).await?;

    let mut out = stdout().lock();
    out.write_all(report.to_json_lines()?.as_bytes())?;
    out.flush()?;
    Ok(())
}
