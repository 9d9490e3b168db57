//! Inline-button callbacks from /gadaniye.

use std::sync::Arc;

use teloxide::prelude::*;

use zorya_core::domain::{ChatId, UserId};
use zorya_core::readings::from_callback;

use crate::router::AppState;

pub async fn handle(bot: Bot, query: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    // Stop the button spinner no matter what happens next.
    let _ = bot.answer_callback_query(query.id.clone()).await;

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some(kind) = from_callback(data) else {
        tracing::warn!(data, "unknown callback action");
        return Ok(());
    };
    let Some(message) = query.message else {
        return Ok(());
    };
    let chat = ChatId(message.chat.id.0);
    let user = UserId(query.from.id.0 as i64);
    tracing::info!(user = user.0, kind = kind.label(), "reading requested via inline button");

    if let Err(e) = state.readings.handle_request(chat, user, kind).await {
        tracing::error!(user = user.0, error = %e, "reading request failed");
    }
    Ok(())
}
