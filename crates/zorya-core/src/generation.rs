//! Generation client: retry/backoff around the text-generation provider.
//!
//! Two fixed operating profiles: "bulk" for scheduled posts (more retries,
//! longer per-call timeout, failure collapses into a sentinel string) and
//! "interactive" for user requests (fewer retries, shorter timeout, failure is
//! a real error). On top of bulk sits a persistent wrapper that also retries
//! *soft* failures: calls that technically succeeded but produced nothing
//! worth publishing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{Error, Result};

/// Sentinel text the bulk profile yields when every retry failed.
pub const FAILURE_SENTINEL: &str = "❌ Не вдалося згенерувати вміст.";

/// Placeholder line for a section whose generation never recovered.
pub const SILENT_STARS: &str = "Зірки сьогодні мовчать для цього знаку. 🌟";

/// Text-generation provider port. Prompt in, text out, fails sometimes.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backoff {
    Exponential,
    Linear,
}

#[derive(Clone, Copy, Debug)]
pub struct RetryProfile {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub request_timeout: Duration,
    pub backoff: Backoff,
}

impl RetryProfile {
    pub fn bulk() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(5_000),
            request_timeout: Duration::from_millis(120_000),
            backoff: Backoff::Exponential,
        }
    }

    pub fn interactive() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(3_000),
            request_timeout: Duration::from_millis(80_000),
            backoff: Backoff::Linear,
        }
    }

    /// Wait before the retry that follows `failed_attempt` (1-based).
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential => {
                self.base_delay * 2u32.saturating_pow(failed_attempt.saturating_sub(1))
            }
            Backoff::Linear => self.base_delay * failed_attempt.max(1),
        }
    }
}

/// Policy for the persistent wrapper around bulk generation.
///
/// A result is a soft failure when it is empty, equals the sentinel, or has
/// a trimmed length at or below `min_chars`.
#[derive(Clone, Copy, Debug)]
pub struct SoftRetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub delay_step: Duration,
    pub max_delay: Duration,
    pub min_chars: usize,
}

impl Default for SoftRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            base_delay: Duration::from_millis(2_000),
            delay_step: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(10_000),
            min_chars: 10,
        }
    }
}

impl SoftRetryPolicy {
    /// Capped linearly-growing wait after `failed_attempt` (1-based).
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let d = self.base_delay + self.delay_step * failed_attempt;
        if d > self.max_delay {
            self.max_delay
        } else {
            d
        }
    }

    fn is_meaningful(&self, text: &str) -> bool {
        !text.is_empty()
            && text != FAILURE_SENTINEL
            && text.trim().chars().count() > self.min_chars
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GenerationConfig {
    pub bulk: RetryProfile,
    pub interactive: RetryProfile,
    pub soft_retry: SoftRetryPolicy,
    /// Minimum spacing between provider calls, shared by all flows.
    pub min_provider_interval: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            bulk: RetryProfile::bulk(),
            interactive: RetryProfile::interactive(),
            soft_retry: SoftRetryPolicy::default(),
            min_provider_interval: Duration::from_millis(2_000),
        }
    }
}

struct NextSlot {
    interval: Duration,
    next: Instant,
}

impl NextSlot {
    /// Reserve the next start slot and return the wait required before it.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// Fixed-interval dispatch pacing for provider calls.
///
/// Every caller reserves the next start slot; concurrent callers line up
/// one interval apart instead of hitting the provider back to back.
pub struct ProviderPacer {
    slot: Mutex<NextSlot>,
}

impl ProviderPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            slot: Mutex::new(NextSlot {
                interval: min_interval,
                next: Instant::now(),
            }),
        }
    }

    pub async fn pace(&self) {
        let wait = { self.slot.lock().await.reserve() };
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }
}

pub struct GenerationClient {
    provider: Arc<dyn TextGenerator>,
    pacer: ProviderPacer,
    cfg: GenerationConfig,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn TextGenerator>, cfg: GenerationConfig) -> Self {
        Self {
            provider,
            pacer: ProviderPacer::new(cfg.min_provider_interval),
            cfg,
        }
    }

    /// Bulk profile, for scheduled posts. Never errors: exhausted retries
    /// collapse into the sentinel so the caller can keep assembling the rest
    /// of the post.
    pub async fn generate_bulk(&self, prompt: &str, label: &str) -> String {
        match self.run_profile(prompt, label, self.cfg.bulk).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(label, error = %e, "bulk generation exhausted retries");
                FAILURE_SENTINEL.to_string()
            }
        }
    }

    /// Interactive profile, for user-facing requests. Exhausted retries
    /// surface as `Error::Generation`; the caller aborts and informs the user.
    pub async fn generate_interactive(&self, prompt: &str, label: &str) -> Result<String> {
        self.run_profile(prompt, label, self.cfg.interactive).await
    }

    /// Bulk generation that additionally retries soft failures (empty output,
    /// the sentinel, or suspiciously short text). Yields a fixed quiet line
    /// once the attempt budget is spent.
    pub async fn generate_persistent(&self, prompt: &str, label: &str) -> String {
        let policy = self.cfg.soft_retry;
        for attempt in 1..=policy.max_attempts {
            let text = self.generate_bulk(prompt, label).await;
            if policy.is_meaningful(&text) {
                return text;
            }
            tracing::warn!(
                label,
                attempt,
                max = policy.max_attempts,
                chars = text.trim().chars().count(),
                "soft generation failure, retrying"
            );
            if attempt < policy.max_attempts {
                sleep(policy.delay_after(attempt)).await;
            }
        }
        tracing::error!(
            label,
            attempts = policy.max_attempts,
            "generation never produced meaningful text, using fallback line"
        );
        SILENT_STARS.to_string()
    }

    async fn run_profile(&self, prompt: &str, label: &str, profile: RetryProfile) -> Result<String> {
        for attempt in 1..=profile.max_retries {
            self.pacer.pace().await;
            match self.provider.generate(prompt, profile.request_timeout).await {
                Ok(text) => return Ok(tidy(&text)),
                Err(e) => {
                    tracing::warn!(
                        label,
                        attempt,
                        max = profile.max_retries,
                        error = %e,
                        "provider call failed"
                    );
                    if attempt < profile.max_retries {
                        sleep(profile.delay_after(attempt)).await;
                    }
                }
            }
        }
        Err(Error::Generation {
            label: label.to_string(),
            attempts: profile.max_retries,
        })
    }
}

/// Trim and collapse the runs of blank lines the provider likes to emit.
pub fn tidy(text: &str) -> String {
    let re = Regex::new(r"[\r\n]{2,}").expect("valid regex");
    re.replace_all(text.trim(), "\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedProvider {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
        reply: String,
    }

    impl ScriptedProvider {
        fn new(failures: usize, reply: &str) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedProvider {
        async fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::Provider("scripted outage".to_string()));
            }
            Ok(self.reply.clone())
        }
    }

    /// Provider whose successive replies are scripted; repeats the last entry
    /// once the script runs out.
    struct SequenceProvider {
        replies: std::sync::Mutex<Vec<String>>,
    }

    impl SequenceProvider {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: std::sync::Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for SequenceProvider {
        async fn generate(&self, _prompt: &str, _timeout: Duration) -> Result<String> {
            let mut replies = self.replies.lock().expect("replies lock");
            if replies.len() > 1 {
                Ok(replies.remove(0))
            } else {
                Ok(replies.first().cloned().unwrap_or_default())
            }
        }
    }

    fn fast_config() -> GenerationConfig {
        GenerationConfig {
            bulk: RetryProfile {
                max_retries: 5,
                base_delay: Duration::from_millis(1),
                request_timeout: Duration::from_secs(1),
                backoff: Backoff::Exponential,
            },
            interactive: RetryProfile {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
                request_timeout: Duration::from_secs(1),
                backoff: Backoff::Linear,
            },
            soft_retry: SoftRetryPolicy {
                max_attempts: 20,
                base_delay: Duration::from_millis(1),
                delay_step: Duration::ZERO,
                max_delay: Duration::from_millis(2),
                min_chars: 10,
            },
            min_provider_interval: Duration::ZERO,
        }
    }

    #[test]
    fn exponential_backoff_doubles_per_failed_attempt() {
        let p = RetryProfile::bulk();
        assert_eq!(p.delay_after(1), Duration::from_millis(5_000));
        assert_eq!(p.delay_after(2), Duration::from_millis(10_000));
        assert_eq!(p.delay_after(3), Duration::from_millis(20_000));
        assert_eq!(p.delay_after(4), Duration::from_millis(40_000));
    }

    #[test]
    fn linear_backoff_grows_per_failed_attempt() {
        let p = RetryProfile::interactive();
        assert_eq!(p.delay_after(1), Duration::from_millis(3_000));
        assert_eq!(p.delay_after(2), Duration::from_millis(6_000));
    }

    #[test]
    fn soft_retry_delay_grows_then_caps() {
        let p = SoftRetryPolicy::default();
        assert_eq!(p.delay_after(1), Duration::from_millis(3_000));
        assert_eq!(p.delay_after(7), Duration::from_millis(9_000));
        assert_eq!(p.delay_after(8), Duration::from_millis(10_000));
        assert_eq!(p.delay_after(15), Duration::from_millis(10_000));
    }

    #[test]
    fn soft_failure_detection() {
        let p = SoftRetryPolicy::default();
        assert!(!p.is_meaningful(""));
        assert!(!p.is_meaningful(FAILURE_SENTINEL));
        assert!(!p.is_meaningful("1234567890")); // exactly min_chars
        assert!(p.is_meaningful("Довгий змістовний прогноз"));
    }

    #[test]
    fn tidy_trims_and_collapses_blank_runs() {
        assert_eq!(tidy("  а\n\n\nб\r\nв  "), "а\nб\nв");
        assert_eq!(tidy("один\nдва"), "один\nдва");
    }

    #[tokio::test]
    async fn bulk_profile_recovers_after_four_failures() {
        let provider = Arc::new(ScriptedProvider::new(4, "Зорі всміхаються"));
        let client = GenerationClient::new(provider.clone(), fast_config());
        let out = client.generate_bulk("п", "test-post").await;
        assert_eq!(out, "Зорі всміхаються");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn bulk_profile_returns_sentinel_when_exhausted() {
        let provider = Arc::new(ScriptedProvider::new(99, "невидиме"));
        let client = GenerationClient::new(provider.clone(), fast_config());
        let out = client.generate_bulk("п", "test-post").await;
        assert_eq!(out, FAILURE_SENTINEL);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn interactive_profile_raises_terminal_failure() {
        let provider = Arc::new(ScriptedProvider::new(2, "невидиме"));
        let client = GenerationClient::new(provider.clone(), fast_config());
        let err = client
            .generate_interactive("п", "reading-day")
            .await
            .unwrap_err();
        match err {
            Error::Generation { label, attempts } => {
                assert_eq!(label, "reading-day");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn persistent_retries_past_soft_failures() {
        let provider = Arc::new(SequenceProvider::new(&[
            "",
            FAILURE_SENTINEL,
            "коротко",
            "Довгий змістовний прогноз на день",
        ]));
        let client = GenerationClient::new(provider, fast_config());
        let out = client.generate_persistent("п", "serious-horoscope").await;
        assert_eq!(out, "Довгий змістовний прогноз на день");
    }

    #[tokio::test]
    async fn persistent_falls_back_after_attempt_budget() {
        let mut cfg = fast_config();
        cfg.soft_retry.max_attempts = 3;
        let provider = Arc::new(SequenceProvider::new(&[""]));
        let client = GenerationClient::new(provider, cfg);
        let out = client.generate_persistent("п", "serious-horoscope").await;
        assert_eq!(out, SILENT_STARS);
    }

    #[tokio::test]
    async fn pacer_spaces_out_calls() {
        let pacer = ProviderPacer::new(Duration::from_millis(30));
        let started = std::time::Instant::now();
        pacer.pace().await;
        pacer.pace().await;
        pacer.pace().await;
        assert!(started.elapsed() >= Duration::from_millis(55));
    }
}
