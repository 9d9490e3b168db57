//! Telegram transport: the messaging-port implementation plus the dispatch
//! wiring and update handlers.

pub mod handlers;
pub mod router;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId as TgChatId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton,
    KeyboardMarkup, KeyboardRemove, MessageId as TgMessageId, ParseMode, ReplyMarkup,
};

use zorya_core::domain::{ChatId, MessageId, MessageRef};
use zorya_core::messaging::{ChatAction, FormatMode, Keyboard, MessagingPort, SendOptions};
use zorya_core::{Error, Result};

const SEND_ATTEMPTS: usize = 3;

pub struct TelegramMessenger {
    bot: Bot,
    channel: TgChatId,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, channel_chat_id: i64) -> Self {
        Self {
            bot,
            channel: TgChatId(channel_chat_id),
        }
    }

    async fn send(
        &self,
        chat: TgChatId,
        text: &str,
        mode: FormatMode,
        opts: &SendOptions,
    ) -> Result<MessageRef> {
        let sent = with_flood_retry(|| {
            let mut req = self.bot.send_message(chat, text);
            match mode {
                FormatMode::Structural => req = req.parse_mode(ParseMode::Html),
                FormatMode::Escaped => req = req.parse_mode(ParseMode::MarkdownV2),
                FormatMode::Plain => {}
            }
            if let Some(keyboard) = &opts.keyboard {
                req = req.reply_markup(to_reply_markup(keyboard));
            }
            if opts.disable_link_preview {
                req = req.disable_web_page_preview(true);
            }
            req
        })
        .await
        .map_err(to_transport)?;
        Ok(message_ref(&sent))
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_to_channel(
        &self,
        text: &str,
        mode: FormatMode,
        opts: SendOptions,
    ) -> Result<MessageRef> {
        self.send(self.channel, text, mode, &opts).await
    }

    async fn send_to_user(
        &self,
        chat: ChatId,
        text: &str,
        mode: FormatMode,
        opts: SendOptions,
    ) -> Result<MessageRef> {
        self.send(tg_chat(chat), text, mode, &opts).await
    }

    async fn send_reply(&self, target: MessageRef, text: &str) -> Result<MessageRef> {
        let sent = with_flood_retry(|| {
            self.bot
                .send_message(tg_chat(target.chat_id), text)
                .reply_to_message_id(TgMessageId(target.message_id.0))
        })
        .await
        .map_err(to_transport)?;
        Ok(message_ref(&sent))
    }

    async fn send_chat_action(&self, chat: ChatId, action: ChatAction) -> Result<()> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
        };
        with_flood_retry(|| self.bot.send_chat_action(tg_chat(chat), tg_action))
            .await
            .map_err(to_transport)?;
        Ok(())
    }
}

/// Honour Telegram flood-control waits, up to a small attempt cap. Every
/// other error goes straight back to the caller.
async fn with_flood_retry<T, Fut>(
    mut op: impl FnMut() -> Fut,
) -> std::result::Result<T, teloxide::RequestError>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
    Fut::IntoFuture: Send,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(teloxide::RequestError::RetryAfter(wait)) if attempt + 1 < SEND_ATTEMPTS => {
                attempt += 1;
                tracing::warn!(wait_secs = wait.as_secs(), attempt, "telegram flood control, waiting");
                tokio::time::sleep(wait).await;
            }
            other => return other,
        }
    }
}

fn tg_chat(chat: ChatId) -> TgChatId {
    TgChatId(chat.0)
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}

fn to_transport(e: teloxide::RequestError) -> Error {
    Error::Transport(e.to_string())
}

fn to_reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply(rows) => {
            let rows: Vec<Vec<KeyboardButton>> = rows
                .iter()
                .map(|row| row.iter().map(|label| KeyboardButton::new(label.clone())).collect())
                .collect();
            ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard(true))
        }
        Keyboard::Inline(rows) => {
            let rows: Vec<Vec<InlineKeyboardButton>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.clone()))
                        .collect()
                })
                .collect();
            ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
        }
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}
