//! Personal tarot readings over direct chat: the keyboard entry points, the
//! busy/quota gate, interactive-profile generation and MarkdownV2 delivery.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::{ChatId, ReadingKind, UserId};
use crate::formatting::{decorate_first_bold, escape_markdown_v2};
use crate::generation::GenerationClient;
use crate::limits::{admit, format_wait_ua, Admission, RequestGate, SoftDeadline};
use crate::messaging::{ChatAction, FormatMode, Keyboard, MessagingPort, SendOptions};
use crate::prompts;
use crate::users::UserDirectory;
use crate::zodiac::random_tarot_emoji;
use crate::Result;

pub const BTN_DAY: &str = "На день ☀️";
pub const BTN_WEEK: &str = "На тиждень 📅";
pub const BTN_MONTH: &str = "На місяць 🌕";

pub const CB_DAY: &str = "PREDICT_DAY";
pub const CB_WEEK: &str = "PREDICT_WEEK";
pub const CB_MONTH: &str = "PREDICT_MONTH";

/// The persistent reply keyboard every private chat gets.
pub fn reading_keyboard() -> Keyboard {
    Keyboard::Reply(vec![vec![
        BTN_DAY.to_string(),
        BTN_WEEK.to_string(),
        BTN_MONTH.to_string(),
    ]])
}

pub fn from_button(label: &str) -> Option<ReadingKind> {
    match label.trim() {
        BTN_DAY => Some(ReadingKind::Day),
        BTN_WEEK => Some(ReadingKind::Week),
        BTN_MONTH => Some(ReadingKind::Month),
        _ => None,
    }
}

pub fn from_callback(data: &str) -> Option<ReadingKind> {
    match data {
        CB_DAY => Some(ReadingKind::Day),
        CB_WEEK => Some(ReadingKind::Week),
        CB_MONTH => Some(ReadingKind::Month),
        _ => None,
    }
}

fn heading_ua(kind: ReadingKind) -> &'static str {
    match kind {
        ReadingKind::Day => "✨ *Ваше індивідуальне передбачення Таро на день* ✨",
        ReadingKind::Week => "✨ *Ваше індивідуальне передбачення Таро на тиждень* ✨",
        ReadingKind::Month => "✨ *Ваше індивідуальне передбачення Таро на місяць* ✨",
    }
}

pub struct ReadingService {
    generation: Arc<GenerationClient>,
    users: Arc<UserDirectory>,
    gate: Arc<RequestGate>,
    messenger: Arc<dyn MessagingPort>,
    channel_link: String,
    soft_timeout: Duration,
}

impl ReadingService {
    pub fn new(
        generation: Arc<GenerationClient>,
        users: Arc<UserDirectory>,
        gate: Arc<RequestGate>,
        messenger: Arc<dyn MessagingPort>,
        channel_link: impl Into<String>,
        soft_timeout: Duration,
    ) -> Self {
        Self {
            generation,
            users,
            gate,
            messenger,
            channel_link: channel_link.into(),
            soft_timeout,
        }
    }

    /// Pre-dispatch check so command handling can short-circuit while a
    /// reading is in flight for this user.
    pub fn is_busy(&self, user: UserId) -> bool {
        self.gate.is_busy(user)
    }

    /// Tell the user their reading is still generating.
    pub async fn notify_busy(&self, chat: ChatId) -> Result<()> {
        let busy = escape_markdown_v2(
            "⏳ Ваш персональний розклад вже генерується. Зачекайте кілька секунд.",
        );
        self.messenger
            .send_to_user(
                chat,
                &busy,
                FormatMode::Escaped,
                SendOptions::with_keyboard(reading_keyboard()),
            )
            .await?;
        Ok(())
    }

    /// Run the full flow for one request. The returned error is transport or
    /// persistence trouble only; generation failures are reported to the
    /// user in-band.
    pub async fn handle_request(&self, chat: ChatId, user: UserId, kind: ReadingKind) -> Result<()> {
        let Some(_guard) = self.gate.try_begin(user) else {
            tracing::info!(user = user.0, kind = kind.label(), "reading already in flight");
            self.notify_busy(chat).await?;
            return Ok(());
        };

        let class = kind.quota_class();
        let last = self.users.last_request_ms(user, class).await;
        if let Admission::Throttled { remaining } =
            admit(last, class, Utc::now().timestamp_millis())
        {
            tracing::info!(user = user.0, kind = kind.label(), "quota window still open");
            let note = format!(
                "⏳ Ви вже отримували прогноз {}. Спробуйте через {}",
                class.label_ua(),
                format_wait_ua(remaining)
            );
            self.messenger
                .send_to_user(chat, &note, FormatMode::Plain, SendOptions::default())
                .await?;
            return Ok(());
        }

        let _deadline = SoftDeadline::watch(kind.label(), self.soft_timeout);
        self.messenger
            .send_to_user(
                chat,
                "🔮 У кожної карти є голос. Твоя — вже шепоче...",
                FormatMode::Plain,
                SendOptions::default(),
            )
            .await?;
        self.messenger
            .send_chat_action(chat, ChatAction::Typing)
            .await?;

        let prompt = prompts::personal_reading(kind);
        match self
            .generation
            .generate_interactive(&prompt, kind.label())
            .await
        {
            Ok(text) => {
                let decorated = decorate_first_bold(&text, random_tarot_emoji());
                let message = format!(
                    "{}\n\n{}\n\n[Гороскопи та розклади у нашому каналі: Код Долі📌]({})",
                    heading_ua(kind),
                    escape_markdown_v2(&decorated),
                    self.channel_link
                );
                self.messenger
                    .send_to_user(
                        chat,
                        &message,
                        FormatMode::Escaped,
                        SendOptions::with_keyboard(reading_keyboard()).without_preview(),
                    )
                    .await?;
                self.users
                    .mark_fulfilled(user, class, Utc::now().timestamp_millis())
                    .await?;
                tracing::info!(user = user.0, kind = kind.label(), "personal reading delivered");
            }
            Err(e) => {
                tracing::error!(
                    user = user.0,
                    kind = kind.label(),
                    error = %e,
                    "personal reading failed"
                );
                self.messenger
                    .send_to_user(
                        chat,
                        "⚠️ Сталася помилка. Спробуйте пізніше.",
                        FormatMode::Plain,
                        SendOptions::default(),
                    )
                    .await?;
            }
        }
        Ok(())
    }
}
