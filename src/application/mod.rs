//! Application layer - orchestrates the interview over the ports.
//!
//! - `session` - one participant's run: start, submit, reply, dismiss
//! - `persistence` - interaction snapshots in the app-data store
//! - `settings_resolver` - builder settings with defaults
//! - `review` - researcher listing, transcripts and resets
//! - `view` - what the participant currently sees

pub mod persistence;
pub mod review;
pub mod session;
pub mod settings_resolver;
pub mod view;

pub use persistence::{InteractionRecorder, PersistenceError, SyncStatus, INTERACTION_TYPE};
pub use review::{ConversationReview, InteractionSummary, Transcript};
pub use session::{InteractionSession, PendingReply, SessionError, SessionOptions, Step, StepReport};
pub use settings_resolver::{read_settings_file, SettingsFileError, SettingsResolver};
pub use view::{ConversationView, ParticipantView};
