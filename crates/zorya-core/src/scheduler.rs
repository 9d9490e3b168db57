//! The fixed publication schedule: a small five-field cron engine evaluated
//! in the configured UTC offset, and one cancellable loop per trigger.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::posts::{PostKind, PostService};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub struct TriggerSpec {
    pub name: &'static str,
    pub cron: &'static str,
    pub kind: PostKind,
}

/// The publication plan. Times are local to the configured offset.
pub const TRIGGERS: [TriggerSpec; 8] = [
    TriggerSpec { name: "daily-wish", cron: "0 7 * * *", kind: PostKind::DailyWish },
    TriggerSpec { name: "numerology", cron: "0 8 * * *", kind: PostKind::Numerology },
    TriggerSpec { name: "weekly-horoscope", cron: "0 9 * * 1", kind: PostKind::WeeklyHoroscope },
    TriggerSpec { name: "tarot-card", cron: "0 10 * * *", kind: PostKind::TarotCard },
    TriggerSpec { name: "funny-horoscope", cron: "0 12 * * *", kind: PostKind::FunnyHoroscope },
    TriggerSpec { name: "serious-horoscope", cron: "0 18 * * *", kind: PostKind::SeriousHoroscope },
    TriggerSpec { name: "tarot-analysis", cron: "0 19 * * *", kind: PostKind::TarotAnalysis },
    TriggerSpec { name: "compatibility", cron: "0 20 * * 5", kind: PostKind::Compatibility },
];

#[derive(Clone, Debug, PartialEq, Eq)]
struct Field {
    any: bool,
    /// Sorted, deduplicated allowed values. Empty when `any`.
    values: Vec<u32>,
}

impl Field {
    fn parse(spec: &str, min: u32, max: u32) -> Result<Self> {
        if spec == "*" {
            return Ok(Self { any: true, values: Vec::new() });
        }
        let mut values = Vec::new();
        for part in spec.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((r, s)) => {
                    let step: u32 = parse_num(s, spec)?;
                    if step == 0 {
                        return Err(bad(spec));
                    }
                    (r, step)
                }
                None => (part, 1),
            };
            let (lo, hi) = if range == "*" {
                (min, max)
            } else if let Some((a, b)) = range.split_once('-') {
                (parse_num(a, spec)?, parse_num(b, spec)?)
            } else {
                let v = parse_num(range, spec)?;
                (v, v)
            };
            if lo < min || hi > max || lo > hi {
                return Err(bad(spec));
            }
            let mut v = lo;
            while v <= hi {
                values.push(v);
                v += step;
            }
        }
        values.sort_unstable();
        values.dedup();
        Ok(Self { any: false, values })
    }

    fn matches(&self, value: u32) -> bool {
        self.any || self.values.binary_search(&value).is_ok()
    }
}

fn bad(spec: &str) -> Error {
    Error::Config(format!("bad cron field: {spec}"))
}

fn parse_num(raw: &str, spec: &str) -> Result<u32> {
    raw.parse().map_err(|_| bad(spec))
}

/// Five-field cron expression: minute, hour, day-of-month, month,
/// day-of-week (0 or 7 both meaning Sunday).
#[derive(Clone, Debug)]
pub struct CronExpr {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl CronExpr {
    pub fn parse(expr: &str) -> Result<Self> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(Error::Config(format!(
                "cron expression needs 5 fields: {expr}"
            )));
        }
        let minute = Field::parse(fields[0], 0, 59)?;
        let hour = Field::parse(fields[1], 0, 23)?;
        let day_of_month = Field::parse(fields[2], 1, 31)?;
        let month = Field::parse(fields[3], 1, 12)?;
        let mut day_of_week = Field::parse(fields[4], 0, 7)?;
        if !day_of_week.any {
            for v in &mut day_of_week.values {
                if *v == 7 {
                    *v = 0;
                }
            }
            day_of_week.values.sort_unstable();
            day_of_week.values.dedup();
        }
        Ok(Self {
            minute,
            hour,
            day_of_month,
            month,
            day_of_week,
        })
    }

    pub fn matches(&self, at: DateTime<FixedOffset>) -> bool {
        if !self.minute.matches(at.minute())
            || !self.hour.matches(at.hour())
            || !self.month.matches(at.month())
        {
            return false;
        }
        let dom = self.day_of_month.matches(at.day());
        let dow = self.day_of_week.matches(at.weekday().num_days_from_sunday());
        // Classic cron rule: when both day fields are restricted, either one
        // matching is enough.
        if !self.day_of_month.any && !self.day_of_week.any {
            dom || dow
        } else {
            dom && dow
        }
    }

    /// First matching minute strictly after `from`, or None when nothing
    /// matches within the next year.
    pub fn next_after(&self, from: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let mut candidate =
            from.with_second(0)?.with_nanosecond(0)? + chrono::Duration::minutes(1);
        let limit = from + chrono::Duration::days(366);
        while candidate <= limit {
            if self.matches(candidate) {
                return Some(candidate);
            }
            candidate += chrono::Duration::minutes(1);
        }
        None
    }
}

struct JobEntry {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SchedulerState {
    jobs: Vec<JobEntry>,
}

pub struct PostScheduler {
    posts: Arc<PostService>,
    offset: FixedOffset,
    state: Mutex<SchedulerState>,
}

impl PostScheduler {
    pub fn new(posts: Arc<PostService>, offset: FixedOffset) -> Self {
        Self {
            posts,
            offset,
            state: Mutex::new(SchedulerState::default()),
        }
    }

    /// Parse the trigger table and spawn one loop per entry. Idempotent.
    pub async fn start(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.jobs.is_empty() {
            return Ok(());
        }
        for trigger in TRIGGERS {
            let cron = CronExpr::parse(trigger.cron)?;
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(job_loop(
                self.posts.clone(),
                trigger,
                cron,
                self.offset,
                cancel.clone(),
            ));
            state.jobs.push(JobEntry {
                name: trigger.name,
                cancel,
                handle,
            });
        }
        tracing::info!(jobs = state.jobs.len(), "post schedule started");
        Ok(())
    }

    /// Cancel every loop and wait for them to wind down.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        for job in &state.jobs {
            job.cancel.cancel();
        }
        for job in state.jobs.drain(..) {
            if job.handle.await.is_err() {
                tracing::warn!(job = job.name, "schedule loop ended with a panic");
            }
        }
        tracing::info!("post schedule stopped");
    }
}

async fn job_loop(
    posts: Arc<PostService>,
    trigger: TriggerSpec,
    cron: CronExpr,
    offset: FixedOffset,
    cancel: CancellationToken,
) {
    loop {
        let now = Utc::now().with_timezone(&offset);
        let Some(next) = cron.next_after(now) else {
            tracing::warn!(job = trigger.name, "no upcoming run within a year, loop exiting");
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(job = trigger.name, next = %next, "next run scheduled");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = sleep(wait) => {
                if let Err(e) = posts.run(trigger.kind).await {
                    tracing::error!(job = trigger.name, error = %e, "scheduled post failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kyiv() -> FixedOffset {
        FixedOffset::east_opt(2 * 3_600).expect("valid offset")
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        kyiv().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn the_whole_trigger_table_parses() {
        for trigger in TRIGGERS {
            CronExpr::parse(trigger.cron).expect(trigger.name);
        }
    }

    #[test]
    fn daily_trigger_fires_only_at_its_minute() {
        let cron = CronExpr::parse("0 10 * * *").unwrap();
        assert!(cron.matches(at(2026, 8, 23, 10, 0)));
        assert!(!cron.matches(at(2026, 8, 23, 10, 1)));
        assert!(!cron.matches(at(2026, 8, 23, 11, 0)));
    }

    #[test]
    fn weekly_trigger_respects_the_weekday() {
        let cron = CronExpr::parse("0 9 * * 1").unwrap();
        // 2026-08-24 is a Monday.
        assert!(cron.matches(at(2026, 8, 24, 9, 0)));
        assert!(!cron.matches(at(2026, 8, 23, 9, 0)));
    }

    #[test]
    fn sunday_spells_both_zero_and_seven() {
        let zero = CronExpr::parse("0 9 * * 0").unwrap();
        let seven = CronExpr::parse("0 9 * * 7").unwrap();
        // 2026-08-23 is a Sunday.
        assert!(zero.matches(at(2026, 8, 23, 9, 0)));
        assert!(seven.matches(at(2026, 8, 23, 9, 0)));
    }

    #[test]
    fn next_after_lands_on_the_coming_run() {
        let cron = CronExpr::parse("0 20 * * 5").unwrap();
        // From Sunday evening the next Friday-20:00 run is five days out.
        let next = cron.next_after(at(2026, 8, 23, 21, 30)).unwrap();
        assert_eq!(next, at(2026, 8, 28, 20, 0));
    }

    #[test]
    fn next_after_skips_the_current_minute() {
        let cron = CronExpr::parse("0 10 * * *").unwrap();
        let next = cron.next_after(at(2026, 8, 23, 10, 0)).unwrap();
        assert_eq!(next, at(2026, 8, 24, 10, 0));
    }

    #[test]
    fn lists_ranges_and_steps_parse() {
        let cron = CronExpr::parse("*/15 8-10 1,15 * *").unwrap();
        assert!(cron.matches(at(2026, 8, 1, 8, 45)));
        assert!(cron.matches(at(2026, 9, 15, 10, 0)));
        assert!(!cron.matches(at(2026, 8, 2, 9, 0)));
        assert!(!cron.matches(at(2026, 8, 1, 8, 10)));
    }

    #[test]
    fn restricted_day_fields_match_either_way() {
        let cron = CronExpr::parse("0 0 13 * 5").unwrap();
        assert!(cron.matches(at(2026, 8, 13, 0, 0))); // Thursday the 13th
        assert!(cron.matches(at(2026, 8, 14, 0, 0))); // Friday the 14th
        assert!(!cron.matches(at(2026, 8, 15, 0, 0))); // Saturday the 15th
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        assert!(CronExpr::parse("0 25 * * *").is_err());
        assert!(CronExpr::parse("0 10 * *").is_err());
        assert!(CronExpr::parse("x 10 * * *").is_err());
        assert!(CronExpr::parse("*/0 * * * *").is_err());
        assert!(CronExpr::parse("5-1 * * * *").is_err());
    }
}
