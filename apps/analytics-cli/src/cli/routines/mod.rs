//! # Routines
//!
//! A routine is the body of a CLI command. It returns a [`RoutineSuccess`] carrying the
//! message shown when it completes, or a [`RoutineFailure`] carrying the message shown to
//! the user and the underlying error, if any.
//!
//! ```rust
//! pub fn my_routine() -> Result<RoutineSuccess, RoutineFailure> {
//!     do_the_work().map_err(|e| {
//!         RoutineFailure::new(
//!             Message::new("Failed".to_string(), "to do the work".to_string()),
//!             e,
//!         )
//!     })?;
//!     Ok(RoutineSuccess::success(Message::new(
//!         "Done".to_string(),
//!         "with the work".to_string(),
//!     )))
//! }
//! ```

use super::display::{self, Message, MessageType};

pub mod model_generation;
pub mod parse;

#[derive(Debug, Clone)]
#[must_use = "The message should be displayed."]
pub struct RoutineSuccess {
    pub message: Message,
    pub message_type: MessageType,
}

impl From<RoutineFailure> for anyhow::Error {
    fn from(failure: RoutineFailure) -> Self {
        if let Some(err) = failure.error {
            err
        } else {
            anyhow::anyhow!("{}: {}", failure.message.action, failure.message.details)
        }
    }
}

impl RoutineSuccess {
    pub fn success(message: Message) -> Self {
        Self {
            message,
            message_type: MessageType::Success,
        }
    }

    /// A success that prints nothing, for output already written (e.g. JSON).
    pub fn silent() -> Self {
        Self::success(Message::new(String::new(), String::new()))
    }

    pub fn show(&self) {
        if !self.message.is_empty() {
            display::show_message_wrapper(self.message_type, self.message.clone());
        }
    }
}

#[derive(Debug)]
pub struct RoutineFailure {
    pub message: Message,
    pub message_type: MessageType,
    pub error: Option<anyhow::Error>,
}

impl RoutineFailure {
    pub fn new<F: Into<anyhow::Error>>(message: Message, error: F) -> Self {
        Self {
            message,
            message_type: MessageType::Error,
            error: Some(error.into()),
        }
    }

    /// create a RoutineFailure error without an error
    pub fn error(message: Message) -> Self {
        Self {
            message,
            message_type: MessageType::Error,
            error: None,
        }
    }
}
