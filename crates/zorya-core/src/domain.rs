use std::time::Duration;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Independent per-user rate-limit bucket.
///
/// Windows are fixed wall-clock spans, not calendar boundaries: "daily" means
/// 24h since the last fulfilled request, not "since midnight".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuotaClass {
    Daily,
    Weekly,
    Monthly,
}

impl QuotaClass {
    pub fn window(self) -> Duration {
        match self {
            QuotaClass::Daily => Duration::from_secs(24 * 60 * 60),
            QuotaClass::Weekly => Duration::from_secs(7 * 24 * 60 * 60),
            QuotaClass::Monthly => Duration::from_secs(30 * 24 * 60 * 60),
        }
    }

    /// Human-readable reading name used in throttle replies.
    pub fn label_ua(self) -> &'static str {
        match self {
            QuotaClass::Daily => "на день",
            QuotaClass::Weekly => "на тиждень",
            QuotaClass::Monthly => "на місяць",
        }
    }
}

/// Which personalized reading a user asked for. Each maps to one quota class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadingKind {
    Day,
    Week,
    Month,
}

impl ReadingKind {
    pub fn quota_class(self) -> QuotaClass {
        match self {
            ReadingKind::Day => QuotaClass::Daily,
            ReadingKind::Week => QuotaClass::Weekly,
            ReadingKind::Month => QuotaClass::Monthly,
        }
    }

    /// Stable label for logs.
    pub fn label(self) -> &'static str {
        match self {
            ReadingKind::Day => "reading-day",
            ReadingKind::Week => "reading-week",
            ReadingKind::Month => "reading-month",
        }
    }
}
