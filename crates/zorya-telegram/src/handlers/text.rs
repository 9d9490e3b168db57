//! Plain-text messages: the reply-keyboard buttons, the admin relay, and the
//! unknown-input hint.

use std::sync::Arc;

use teloxide::prelude::*;

use zorya_core::domain::{ChatId, UserId};
use zorya_core::messaging::{FormatMode, SendOptions};
use zorya_core::readings::{from_button, reading_keyboard};

use crate::router::AppState;

pub async fn handle(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let chat = ChatId(msg.chat.id.0);
    let user = UserId(from.id.0 as i64);

    // An armed relay forwards the admin's next plain message to the channel.
    if state.is_admin(user) && state.relay.take() {
        let note = match state
            .messenger
            .send_to_channel(text, FormatMode::Plain, SendOptions::default())
            .await
        {
            Ok(_) => "✅ Надіслано в канал.".to_string(),
            Err(e) => format!("⚠️ Не вдалося надіслати: {e}"),
        };
        let _ = state
            .messenger
            .send_to_user(chat, &note, FormatMode::Plain, SendOptions::default())
            .await;
        return Ok(());
    }

    // Keyboard buttons and free text only mean something in a private chat.
    if !msg.chat.is_private() {
        return Ok(());
    }

    if let Some(kind) = from_button(text) {
        tracing::info!(user = user.0, kind = kind.label(), "reading requested via keyboard");
        if let Err(e) = state.readings.handle_request(chat, user, kind).await {
            tracing::error!(user = user.0, error = %e, "reading request failed");
        }
        return Ok(());
    }

    let _ = state
        .messenger
        .send_to_user(
            chat,
            "🤔 Ви ввели невідому команду. Оберіть потрібний прогноз нижче:",
            FormatMode::Plain,
            SendOptions::with_keyboard(reading_keyboard()),
        )
        .await;
    Ok(())
}
