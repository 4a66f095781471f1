mod analyst;
mod client;
mod error;
mod prompt;
mod report;

pub use analyst::{MacroStrategist, TEMPERATURE};
pub use client::{
    ChatMessage,
    ChatRequest,
    ChatResponse,
    Choice,
    CompletionClient,
    DeepSeekClient,
    MessageContent,
};
pub use error::CompletionError;
pub use prompt::{build_context, signed_pct, system_prompt, user_prompt};
pub use report::{
    format_report_for_display,
    Report,
    EMPTY_COMPLETION_PLACEHOLDER,
    EMPTY_REPORT_PLACEHOLDER,
};
