//! Identify engine: the UI capability boundary and the buffering decorator.
//!
//! A verification pipeline reports its progress through an [`IdentifyUi`].
//! Wrapping the real UI in a [`BufferedIdentifyUi`] lets the pipeline run an
//! identify pass speculatively:
//!
//! ```text
//! pipeline -> BufferedIdentifyUi -> (only if trust breaks) real IdentifyUi
//! ```
//!
//! Notifications are held back until a proof check or identity snapshot
//! breaks tracking. A clean pass never reaches the real UI; its confirmation
//! prompt is answered with a canned [`ConfirmResult`](identify_types::ConfirmResult).

mod buffered;
mod error;
mod recording;
mod ui;

pub use buffered::{BufferedIdentifyUi, SessionPhase, Suppression};
pub use error::UiError;
pub use recording::{RecordingUi, UiCall};
pub use ui::{IdentifyUi, UiCallKind, UiFut};

#[cfg(test)]
mod tests;
