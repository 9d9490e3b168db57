use async_trait::async_trait;

use super::types::{ChatAction, FormatMode, SendOptions};
use crate::domain::{ChatId, MessageRef};
use crate::Result;

/// Outbound messaging operations the application needs from the transport.
///
/// Failures map to [`crate::Error::Transport`]. No retry policy lives behind
/// this trait beyond what the transport itself requires (e.g. flood-control
/// waits); a failed channel post is not re-sent.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    /// Post to the configured channel.
    async fn send_to_channel(
        &self,
        text: &str,
        mode: FormatMode,
        opts: SendOptions,
    ) -> Result<MessageRef>;

    /// Message a chat directly.
    async fn send_to_user(
        &self,
        chat: ChatId,
        text: &str,
        mode: FormatMode,
        opts: SendOptions,
    ) -> Result<MessageRef>;

    /// Reply to a specific message.
    async fn send_reply(&self, target: MessageRef, text: &str) -> Result<MessageRef>;

    /// Fire a chat action ("typing").
    async fn send_chat_action(&self, chat: ChatId, action: ChatAction) -> Result<()>;
}
