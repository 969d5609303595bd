pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::{ChatError, ChatErrorKind, ParseTagError, ProviderError, RouterError};
pub use event::{OutcomeEvent, CHAT_EVENT_TYPE};
pub use traits::{OutcomeReporter, ProviderAdapter};
pub use types::{
    AdapterRequest, ChatMessage, ChatRequest, ChatResult, NormalizedResponse, ProviderId, Role,
    TaskCategory, ToolCall, ToolSpec, Usage,
};
