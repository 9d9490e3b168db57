//! Slash commands: the public trio plus the admin surface.

use std::sync::Arc;

use teloxide::prelude::*;

use zorya_core::domain::{ChatId, MessageId, MessageRef, UserId};
use zorya_core::formatting::escape_markdown_v2;
use zorya_core::messaging::{FormatMode, InlineButton, Keyboard, SendOptions};
use zorya_core::posts::PostKind;
use zorya_core::readings::{self, reading_keyboard};

use crate::router::AppState;

const ADMIN_COMMANDS: &[&str] = &[
    "test",
    "humor",
    "taro",
    "match",
    "week",
    "number",
    "wish",
    "tarot_analysis",
    "reply",
    "text",
    "cancel",
    "reset_all",
];

const WELCOME: &str = "Привіт 🌙 Я бот-астролог Микола Бондарь, публікую гороскопи кожен день 🪐\n\n\
    Оберіть свій *індивідуальний розклад Таро* за допомогою кнопок нижче, \
    або скористайтеся командою:\n👉 /gadaniye";

pub async fn handle(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(raw) = msg.text() else {
        return Ok(());
    };
    let Some(from) = msg.from() else {
        return Ok(());
    };
    let Some((cmd, args)) = parse_command(raw, &state.bot_username) else {
        return Ok(());
    };
    let chat = ChatId(msg.chat.id.0);
    let user = UserId(from.id.0 as i64);
    tracing::info!(user = user.0, cmd, "command received");

    match cmd {
        "start" => {
            let _ = state
                .messenger
                .send_to_user(
                    chat,
                    &escape_markdown_v2(WELCOME),
                    FormatMode::Escaped,
                    SendOptions::with_keyboard(reading_keyboard()),
                )
                .await;
        }
        "gadaniye" => {
            let text = escape_markdown_v2(
                "🔮 *Оберіть тип передбачення Таро:*\nЗверніть увагу, кожен тип має свій ліміт часу.",
            );
            let buttons = Keyboard::Inline(vec![vec![
                InlineButton::new(readings::BTN_DAY, readings::CB_DAY),
                InlineButton::new(readings::BTN_WEEK, readings::CB_WEEK),
                InlineButton::new(readings::BTN_MONTH, readings::CB_MONTH),
            ]]);
            let _ = state
                .messenger
                .send_to_user(
                    chat,
                    &text,
                    FormatMode::Escaped,
                    SendOptions::with_keyboard(buttons),
                )
                .await;
        }
        "show_menu" => {
            let _ = state
                .messenger
                .send_to_user(
                    chat,
                    "Меню відкрито 👇",
                    FormatMode::Plain,
                    SendOptions::with_keyboard(reading_keyboard()),
                )
                .await;
        }
        "hide_menu" => {
            let _ = state
                .messenger
                .send_to_user(
                    chat,
                    "Меню приховано. Відкрити знову: /show_menu",
                    FormatMode::Plain,
                    SendOptions::with_keyboard(Keyboard::Remove),
                )
                .await;
        }
        other if ADMIN_COMMANDS.contains(&other) => {
            if !state.is_admin(user) {
                notify(chat, &state, "🚫 Ця команда доступна лише адміністратору.").await;
                return Ok(());
            }
            handle_admin(other, args, chat, &state).await;
        }
        _ => {
            let _ = state
                .messenger
                .send_to_user(
                    chat,
                    "🤔 Ви ввели невідому команду. Оберіть потрібний прогноз нижче:",
                    FormatMode::Plain,
                    SendOptions::with_keyboard(reading_keyboard()),
                )
                .await;
        }
    }
    Ok(())
}

async fn handle_admin(cmd: &str, args: &str, chat: ChatId, state: &Arc<AppState>) {
    match cmd {
        "test" => run_post(PostKind::SeriousHoroscope, chat, state).await,
        "humor" => run_post(PostKind::FunnyHoroscope, chat, state).await,
        "taro" => run_post(PostKind::TarotCard, chat, state).await,
        "match" => run_post(PostKind::Compatibility, chat, state).await,
        "week" => run_post(PostKind::WeeklyHoroscope, chat, state).await,
        "number" => run_post(PostKind::Numerology, chat, state).await,
        "wish" => run_post(PostKind::DailyWish, chat, state).await,
        "tarot_analysis" => run_post(PostKind::TarotAnalysis, chat, state).await,
        "reply" => handle_reply(args, chat, state).await,
        "text" => handle_text_post(args, chat, state).await,
        "cancel" => {
            state.relay.disarm();
            notify(chat, state, "Скасовано. Режим пересилання вимкнено.").await;
        }
        "reset_all" => {
            notify(chat, state, "⚙️ Починаю повне очищення історії...").await;
            match reset_stores(state).await {
                Ok(()) => {
                    notify(
                        chat,
                        state,
                        "✅ Всі файли історії (TAROT + USERS) успішно скинуті!",
                    )
                    .await;
                }
                Err(e) => notify(chat, state, &format!("⚠️ Помилка: {e}")).await,
            }
        }
        _ => {}
    }
}

/// Run a post builder on demand, reporting progress to the admin chat.
async fn run_post(kind: PostKind, chat: ChatId, state: &Arc<AppState>) {
    notify(chat, state, &format!("⚙️ Готую публікацію: {}...", kind.title_ua())).await;
    match state.posts.run(kind).await {
        Ok(()) => notify(chat, state, &format!("✅ Опубліковано: {}", kind.title_ua())).await,
        Err(e) => notify(chat, state, &format!("⚠️ Помилка публікації: {e}")).await,
    }
}

async fn handle_reply(args: &str, chat: ChatId, state: &Arc<AppState>) {
    let Some((target_chat, message_id, text)) = parse_reply_target(args) else {
        notify(chat, state, "Формат: /reply <посилання на пост> <текст>").await;
        return;
    };
    let target = MessageRef {
        chat_id: target_chat,
        message_id: MessageId(message_id),
    };
    match state.messenger.send_reply(target, text).await {
        Ok(_) => notify(chat, state, "✅ Відповідь надіслано.").await,
        Err(e) => notify(chat, state, &format!("⚠️ Не вдалося відповісти: {e}")).await,
    }
}

/// `/text <body>` posts straight to the channel; bare `/text` arms the relay
/// so the admin's next plain message goes out instead.
async fn handle_text_post(args: &str, chat: ChatId, state: &Arc<AppState>) {
    let body = args.trim();
    if body.is_empty() {
        state.relay.arm();
        notify(
            chat,
            state,
            "Режим пересилання увімкнено: наступне повідомлення піде в канал. Скасувати: /cancel",
        )
        .await;
        return;
    }
    match state
        .messenger
        .send_to_channel(body, FormatMode::Plain, SendOptions::default())
        .await
    {
        Ok(_) => notify(chat, state, "✅ Текст опубліковано в каналі.").await,
        Err(e) => notify(chat, state, &format!("⚠️ Помилка публікації: {e}")).await,
    }
}

async fn reset_stores(state: &Arc<AppState>) -> zorya_core::Result<()> {
    state.history.reset().await?;
    state.users.reset().await
}

async fn notify(chat: ChatId, state: &Arc<AppState>, text: &str) {
    let _ = state
        .messenger
        .send_to_user(chat, text, FormatMode::Plain, SendOptions::default())
        .await;
}

/// Split `/cmd@bot arg…` into the bare command and its argument tail. A
/// mention of a different bot returns None.
pub fn parse_command<'a>(text: &'a str, bot_username: &str) -> Option<(&'a str, &'a str)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let (head, rest) = match text.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim_start()),
        None => (text, ""),
    };
    let head = &head[1..];
    let (cmd, mention) = match head.split_once('@') {
        Some((c, m)) => (c, Some(m)),
        None => (head, None),
    };
    if let Some(mention) = mention {
        if !mention.eq_ignore_ascii_case(bot_username) {
            return None;
        }
    }
    if cmd.is_empty() {
        None
    } else {
        Some((cmd, rest))
    }
}

/// Parse a `https://t.me/c/<internal>/<message>` link plus reply text. The
/// internal id maps onto the real chat id with the `-100` prefix.
pub fn parse_reply_target(args: &str) -> Option<(ChatId, i32, &str)> {
    let re = regex::Regex::new(r"(?s)^https://t\.me/c/(\d+)/(\d+)\s+(.+)$").expect("valid regex");
    let caps = re.captures(args.trim())?;
    let internal = caps.get(1)?.as_str();
    let message_id: i32 = caps.get(2)?.as_str().parse().ok()?;
    let text = caps.get(3)?.as_str();
    let chat_id: i64 = format!("-100{internal}").parse().ok()?;
    Some((ChatId(chat_id), message_id, text))
}
