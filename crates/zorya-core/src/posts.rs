//! Scheduled post assembly: one builder per post kind, each producing an
//! ordered body that goes out as a single channel message. A section whose
//! generation never recovered degrades into the quiet placeholder line; the
//! rest of the post is unaffected.

use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, Utc};

use crate::calendar::{date_line, life_path_number, week_range_line};
use crate::generation::{GenerationClient, FAILURE_SENTINEL, SILENT_STARS};
use crate::history::TarotHistory;
use crate::prompts;
use crate::publisher::ChannelPublisher;
use crate::zodiac::{random_sign_pair, ZodiacSign, SIGNS};
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostKind {
    DailyWish,
    Numerology,
    TarotCard,
    FunnyHoroscope,
    SeriousHoroscope,
    TarotAnalysis,
    WeeklyHoroscope,
    Compatibility,
}

impl PostKind {
    /// Stable machine name used in logs and the schedule table.
    pub fn name(self) -> &'static str {
        match self {
            Self::DailyWish => "daily-wish",
            Self::Numerology => "numerology",
            Self::TarotCard => "tarot-card",
            Self::FunnyHoroscope => "funny-horoscope",
            Self::SeriousHoroscope => "serious-horoscope",
            Self::TarotAnalysis => "tarot-analysis",
            Self::WeeklyHoroscope => "weekly-horoscope",
            Self::Compatibility => "compatibility",
        }
    }

    pub fn title_ua(self) -> &'static str {
        match self {
            Self::DailyWish => "Побажання дня",
            Self::Numerology => "Нумерологія дня",
            Self::TarotCard => "Карта дня Таро",
            Self::FunnyHoroscope => "Кумедний гороскоп",
            Self::SeriousHoroscope => "Серйозний гороскоп",
            Self::TarotAnalysis => "Вечірній розбір Таро",
            Self::WeeklyHoroscope => "Тижневий гороскоп",
            Self::Compatibility => "Гороскоп сумісності",
        }
    }
}

struct BuiltPost {
    body: String,
    /// Raw generated text to pull a drawn card out of, for tarot posts.
    record_card_from: Option<String>,
}

pub struct PostService {
    generation: Arc<GenerationClient>,
    history: Arc<TarotHistory>,
    publisher: Arc<ChannelPublisher>,
    schedule_offset: FixedOffset,
}

impl PostService {
    pub fn new(
        generation: Arc<GenerationClient>,
        history: Arc<TarotHistory>,
        publisher: Arc<ChannelPublisher>,
        schedule_offset: FixedOffset,
    ) -> Self {
        Self {
            generation,
            history,
            publisher,
            schedule_offset,
        }
    }

    /// Build and publish one post. Generation failures degrade inside the
    /// body; only the channel send itself can fail. The drawn card (if any)
    /// is recorded after a successful send, and a record failure never undoes
    /// the post.
    pub async fn run(&self, kind: PostKind) -> Result<()> {
        tracing::info!(post = kind.name(), "building scheduled post");
        let built = self.build(kind).await;
        self.publisher.publish(kind.name(), &built.body).await?;
        if let Some(source) = built.record_card_from {
            if let Err(e) = self.history.record_from_text(&source).await {
                tracing::warn!(post = kind.name(), error = %e, "failed to record drawn card");
            }
        }
        Ok(())
    }

    async fn build(&self, kind: PostKind) -> BuiltPost {
        match kind {
            PostKind::DailyWish => self.daily_wish().await,
            PostKind::Numerology => self.numerology().await,
            PostKind::TarotCard => self.tarot_card().await,
            PostKind::FunnyHoroscope => self.funny().await,
            PostKind::SeriousHoroscope => self.serious().await,
            PostKind::TarotAnalysis => self.tarot_analysis().await,
            PostKind::WeeklyHoroscope => self.weekly().await,
            PostKind::Compatibility => self.compatibility().await,
        }
    }

    fn now_local(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.schedule_offset)
    }

    async fn daily_wish(&self) -> BuiltPost {
        let date = date_line(self.now_local().date_naive());
        let prompt = prompts::daily_wish(&date);
        let text = presentable(self.generation.generate_bulk(&prompt, "daily-wish").await);
        BuiltPost {
            body: format!("*Доброго ранку! ☕ Побажання на {date}* ✨\n\n{text}\n\n"),
            record_card_from: None,
        }
    }

    async fn numerology(&self) -> BuiltPost {
        let today = self.now_local().date_naive();
        let date = date_line(today);
        let number = life_path_number(today);
        let prompt = prompts::numerology(number, &date);
        let text = presentable(self.generation.generate_bulk(&prompt, "numerology").await);
        BuiltPost {
            body: format!(
                "*Нумерологія Дня 🔢 {date}*\n\n*Ваше число дня: {number}*\n\n{text}\n\n"
            ),
            record_card_from: None,
        }
    }

    async fn tarot_card(&self) -> BuiltPost {
        let date = date_line(self.now_local().date_naive());
        let excluded = self.history.exclusions().await;
        let prompt = prompts::tarot_card(&excluded);
        let text = self.generation.generate_persistent(&prompt, "tarot-card").await;
        BuiltPost {
            body: format!("*Карта Дня Таро 🔮✨ {date}*\n\n{text}\n\n"),
            record_card_from: Some(text),
        }
    }

    async fn tarot_analysis(&self) -> BuiltPost {
        let date = date_line(self.now_local().date_naive());
        let excluded = self.history.exclusions().await;
        let prompt = prompts::tarot_analysis(&excluded);
        let text = self
            .generation
            .generate_persistent(&prompt, "tarot-analysis")
            .await;
        BuiltPost {
            body: format!("*Розбір Карти Таро на вечір 🃏🌙 {date}*\n\n{text}\n\n"),
            record_card_from: Some(text),
        }
    }

    async fn funny(&self) -> BuiltPost {
        let date = date_line(self.now_local().date_naive());
        let body = self
            .sign_sections(
                "funny-horoscope",
                format!("*Кумедний гороскоп на сьогодні 😂 {date}*\n\n"),
                false,
                prompts::funny_horoscope,
                |sign, text| format!("{} *{}* - {}\n\n", sign.emoji, sign.name, text),
            )
            .await;
        BuiltPost {
            body,
            record_card_from: None,
        }
    }

    async fn serious(&self) -> BuiltPost {
        let tomorrow = self.now_local().date_naive() + Days::new(1);
        let date = date_line(tomorrow);
        let body = self
            .sign_sections(
                "serious-horoscope",
                format!("*Гороскоп на завтра 🗓️ {date}*\n\n"),
                true,
                prompts::serious_horoscope,
                |sign, text| format!("{} **{}**\n{}\n\n", sign.emoji, sign.name, text),
            )
            .await;
        BuiltPost {
            body,
            record_card_from: None,
        }
    }

    async fn weekly(&self) -> BuiltPost {
        let range = week_range_line(self.now_local().date_naive());
        let body = self
            .sign_sections(
                "weekly-horoscope",
                format!("*Що чекає на цьому тижні? 🗓️ {range}*\n\n"),
                true,
                prompts::weekly_horoscope,
                |sign, text| format!("{} *{}*\n{}\n\n", sign.emoji, sign.name, text),
            )
            .await;
        BuiltPost {
            body,
            record_card_from: None,
        }
    }

    async fn compatibility(&self) -> BuiltPost {
        let (first, second) = random_sign_pair();
        let prompt = prompts::compatibility(first.name, second.name);
        let text = presentable(self.generation.generate_bulk(&prompt, "compatibility").await);
        BuiltPost {
            body: format!(
                "*Гороскоп сумісності ❤️ {} {} & {} {}*\n\n{}\n\n",
                first.emoji, first.name, second.emoji, second.name, text
            ),
            record_card_from: None,
        }
    }

    /// One section per sign, generated sequentially in roster order. The
    /// assembled body always lists signs in that fixed order.
    async fn sign_sections<P, L>(
        &self,
        label: &str,
        heading: String,
        persistent: bool,
        prompt_for: P,
        line: L,
    ) -> String
    where
        P: Fn(&str) -> String,
        L: Fn(&ZodiacSign, &str) -> String,
    {
        let mut body = heading;
        for sign in &SIGNS {
            let prompt = prompt_for(sign.name);
            let text = if persistent {
                self.generation.generate_persistent(&prompt, label).await
            } else {
                presentable(self.generation.generate_bulk(&prompt, label).await)
            };
            body.push_str(&line(sign, &text));
        }
        body
    }
}

/// The raw failure sentinel never reaches the channel; a dead section shows
/// the quiet placeholder line instead.
fn presentable(text: String) -> String {
    if text == FAILURE_SENTINEL {
        SILENT_STARS.to_string()
    } else {
        text
    }
}
