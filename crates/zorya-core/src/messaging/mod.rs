//! Outbound messaging port. The Telegram adapter implements it; application
//! code and tests only ever see the trait.

pub mod port;
pub mod types;

pub use port::MessagingPort;
pub use types::{ChatAction, FormatMode, InlineButton, Keyboard, SendOptions};
