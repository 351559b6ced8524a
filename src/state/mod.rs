//! Client-side state: routing, conversation, composer and summary view

mod app_state;
mod conversation;
mod summary_view;
mod voice_input;

pub use app_state::{AppState, Route};
pub use conversation::ConversationSession;
pub use summary_view::{format_timestamp, StatusColor, SummaryViewState};
pub use voice_input::{VoiceInput, MAX_RECORDING};
