// Public modules
pub mod ask_params;
pub mod chat_message;
pub mod chat_room;
pub mod chat_stream_event;
pub mod error_code;
pub mod message_id;
pub mod message_role;
pub mod pipeline_step;
pub mod step_status;
pub mod token_response;
pub mod user_profile;

// Re-exports
pub use ask_params::AskParams;
pub use chat_message::ChatMessage;
pub use chat_room::ChatRoom;
pub use chat_stream_event::{ChatStreamEvent, DoneEvent, ErrorEvent, StepEvent, TokenEvent};
pub use error_code::{ErrorCode, ErrorCodeParseError};
pub use message_id::MessageId;
pub use message_role::{MessageRole, MessageRoleParseError};
pub use pipeline_step::{PipelineStep, PipelineStepParseError};
pub use step_status::{StepState, StepStatus};
pub use token_response::TokenResponse;
pub use user_profile::{UserProfile, UserUpdate};
