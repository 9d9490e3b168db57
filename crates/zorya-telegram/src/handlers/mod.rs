//! Update handlers: one entry point for messages, one for callback queries.

pub mod callback;
pub mod commands;
pub mod text;

use std::sync::Arc;

use teloxide::prelude::*;

use zorya_core::domain::{ChatId, UserId};

use crate::router::AppState;

pub async fn on_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let user = UserId(from.id.0 as i64);

    // While this user's reading generates, nothing else is dispatched.
    if state.readings.is_busy(user) {
        tracing::info!(user = user.0, "message while a reading is in flight");
        let _ = state.readings.notify_busy(ChatId(msg.chat.id.0)).await;
        return Ok(());
    }

    match msg.text() {
        Some(text) if text.trim_start().starts_with('/') => commands::handle(msg, state).await,
        Some(_) => text::handle(msg, state).await,
        None => Ok(()),
    }
}

pub async fn on_callback(bot: Bot, query: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    callback::handle(bot, query, state).await
}
