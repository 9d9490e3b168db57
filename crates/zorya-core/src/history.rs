//! Used-card history behind the "don't repeat a card" prompt clause.
//!
//! One JSON array on disk, capped at the deck size. When the store is full
//! the next card starts a fresh cycle: the list is cleared first, then the
//! new card goes in.

use std::path::PathBuf;

use regex::Regex;
use tokio::sync::Mutex;

use crate::Result;

/// A standard tarot deck. The history can never name more cards than exist.
pub const TAROT_DECK_SIZE: usize = 78;

pub struct TarotHistory {
    path: PathBuf,
    capacity: usize,
    cards: Mutex<Vec<String>>,
}

impl TarotHistory {
    /// Read the history file. A missing or unreadable file is an empty
    /// history, not an error.
    pub fn load(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let cards = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(cards) => cards,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "tarot history is corrupt, starting empty"
                    );
                    Vec::new()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no tarot history yet, starting empty");
                Vec::new()
            }
        };
        Self {
            path,
            capacity,
            cards: Mutex::new(cards),
        }
    }

    /// Snapshot of the used-card names, for prompt exclusion clauses.
    pub async fn exclusions(&self) -> Vec<String> {
        self.cards.lock().await.clone()
    }

    /// Pull the first `*Card Name*` marker out of generated text and record
    /// it. Text without a marker is logged and skipped: the post already went
    /// out, the exclusion list just misses one card.
    pub async fn record_from_text(&self, text: &str) -> Result<Option<String>> {
        let re = Regex::new(r"\*([^*]+)\*").expect("valid regex");
        let Some(name) = re
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
        else {
            let snippet: String = text.chars().take(80).collect();
            tracing::warn!(snippet, "no card marker in generated text, history not updated");
            return Ok(None);
        };

        let mut cards = self.cards.lock().await;
        if cards.len() >= self.capacity {
            tracing::info!(capacity = self.capacity, "tarot history full, starting a new cycle");
            cards.clear();
        }
        if !cards.iter().any(|c| c == &name) {
            cards.push(name.clone());
            self.persist(&cards)?;
        }
        Ok(Some(name))
    }

    /// Drop all recorded cards, on disk included.
    pub async fn reset(&self) -> Result<()> {
        let mut cards = self.cards.lock().await;
        cards.clear();
        self.persist(&cards)
    }

    fn persist(&self, cards: &[String]) -> Result<()> {
        let json = serde_json::to_string_pretty(cards)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("zorya-tarot-{}-{}.json", tag, std::process::id()))
    }

    #[tokio::test]
    async fn records_the_first_bold_marker() {
        let path = temp_file("record");
        let _ = std::fs::remove_file(&path);
        let history = TarotHistory::load(&path, TAROT_DECK_SIZE);
        let name = history
            .record_from_text("*Маг* — день змін. *Сонце* теж тут.")
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("Маг"));
        assert_eq!(history.exclusions().await, vec!["Маг".to_string()]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_marker_is_skipped() {
        let path = temp_file("skip");
        let _ = std::fs::remove_file(&path);
        let history = TarotHistory::load(&path, TAROT_DECK_SIZE);
        let name = history.record_from_text("текст без маркера").await.unwrap();
        assert_eq!(name, None);
        assert!(history.exclusions().await.is_empty());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn duplicates_are_not_recorded_twice() {
        let path = temp_file("dup");
        let _ = std::fs::remove_file(&path);
        let history = TarotHistory::load(&path, TAROT_DECK_SIZE);
        history.record_from_text("*Маг* раз").await.unwrap();
        history.record_from_text("*Маг* два").await.unwrap();
        assert_eq!(history.exclusions().await.len(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn full_history_clears_before_the_next_card() {
        let path = temp_file("cycle");
        let _ = std::fs::remove_file(&path);
        let history = TarotHistory::load(&path, 3);
        for name in ["Маг", "Сонце", "Вежа"] {
            history
                .record_from_text(&format!("*{name}* текст"))
                .await
                .unwrap();
        }
        assert_eq!(history.exclusions().await.len(), 3);
        // The next card opens a new cycle as its only member.
        history.record_from_text("*Місяць* текст").await.unwrap();
        assert_eq!(history.exclusions().await, vec!["Місяць".to_string()]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn history_survives_a_reload() {
        let path = temp_file("reload");
        let _ = std::fs::remove_file(&path);
        {
            let history = TarotHistory::load(&path, TAROT_DECK_SIZE);
            history.record_from_text("*Зірка* світить").await.unwrap();
        }
        let reloaded = TarotHistory::load(&path, TAROT_DECK_SIZE);
        assert_eq!(reloaded.exclusions().await, vec!["Зірка".to_string()]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let path = temp_file("corrupt");
        std::fs::write(&path, "{не json").unwrap();
        let history = TarotHistory::load(&path, TAROT_DECK_SIZE);
        assert!(history.exclusions().await.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
