//! Admission control for personal readings: one in-flight request per user,
//! a quota window per reading class, and a log-only soft deadline over the
//! whole request.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::domain::{QuotaClass, UserId};

/// Quota decision for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Throttled { remaining: Duration },
}

/// Pure window check: admitted when there is no previous fulfilled request
/// or the class window has fully elapsed since it.
pub fn admit(last_ms: Option<i64>, class: QuotaClass, now_ms: i64) -> Admission {
    let Some(last) = last_ms else {
        return Admission::Admitted;
    };
    let window_ms = class.window().as_millis() as i64;
    let elapsed = now_ms.saturating_sub(last);
    if elapsed >= window_ms {
        Admission::Admitted
    } else {
        Admission::Throttled {
            remaining: Duration::from_millis((window_ms - elapsed) as u64),
        }
    }
}

/// "N год. M хв." rendering of a remaining wait, floored.
pub fn format_wait_ua(remaining: Duration) -> String {
    let total_minutes = remaining.as_secs() / 60;
    format!("{} год. {} хв.", total_minutes / 60, total_minutes % 60)
}

/// One in-flight personal reading per user. `try_begin` hands out a guard
/// whose Drop releases the slot, so every exit path frees the user.
#[derive(Default)]
pub struct RequestGate {
    active: Mutex<HashSet<i64>>,
}

impl RequestGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_busy(&self, user: UserId) -> bool {
        self.locked().contains(&user.0)
    }

    pub fn try_begin(self: &Arc<Self>, user: UserId) -> Option<InFlightGuard> {
        let mut active = self.locked();
        if !active.insert(user.0) {
            return None;
        }
        Some(InFlightGuard {
            gate: Arc::clone(self),
            user: user.0,
        })
    }

    /// The lock is only held for set operations, never across an await.
    fn locked(&self) -> MutexGuard<'_, HashSet<i64>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct InFlightGuard {
    gate: Arc<RequestGate>,
    user: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gate.locked().remove(&self.user);
    }
}

/// Log-only watchdog over a reading flow. If the guard lives past the limit
/// a warning fires; nothing is cancelled.
pub struct SoftDeadline {
    token: CancellationToken,
}

impl SoftDeadline {
    pub fn watch(label: &str, limit: Duration) -> Self {
        let token = CancellationToken::new();
        let watched = token.clone();
        let label = label.to_string();
        tokio::spawn(async move {
            tokio::select! {
                _ = watched.cancelled() => {}
                _ = sleep(limit) => {
                    tracing::warn!(
                        label = %label,
                        limit_secs = limit.as_secs(),
                        "reading exceeded its soft time limit, still running"
                    );
                }
            }
        });
        Self { token }
    }
}

impl Drop for SoftDeadline {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
