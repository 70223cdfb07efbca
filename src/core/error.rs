//! Error kinds surfaced by the library.
//!
//! The binary wraps these in `anyhow` for reporting; inside the polling
//! loop they are logged and the loop keeps going.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectError {
    /// Free-form date/time text that none of the accepted forms match
    #[error("could not understand date/time '{text}'")]
    Parse { text: String },

    /// A state record could not be read, written or decoded
    #[error("state record '{key}': {detail}")]
    StateIo { key: &'static str, detail: String },

    /// The notification or speech program is missing or failed
    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: String, detail: String },
}

impl ReflectError {
    pub fn parse(text: impl Into<String>) -> Self {
        ReflectError::Parse { text: text.into() }
    }

    pub fn state_io(key: &'static str, detail: impl ToString) -> Self {
        ReflectError::StateIo {
            key,
            detail: detail.to_string(),
        }
    }

    pub fn external_tool(tool: impl Into<String>, detail: impl ToString) -> Self {
        ReflectError::ExternalTool {
            tool: tool.into(),
            detail: detail.to_string(),
        }
    }
}

pub type ReflectResult<T> = std::result::Result<T, ReflectError>;
