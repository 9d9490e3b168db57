//! Per-user quota timestamps, persisted as one JSON file. Field names stay
//! camelCase so existing store files keep loading, and free-form profile
//! data rides along untouched.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{QuotaClass, UserId};
use crate::Result;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRecord {
    pub last_day_ts: i64,
    pub last_week_ts: i64,
    pub last_month_ts: i64,
    /// Free-form per-user data; preserved verbatim across rewrites.
    pub profile: Value,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            last_day_ts: 0,
            last_week_ts: 0,
            last_month_ts: 0,
            profile: Value::Object(serde_json::Map::new()),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct UsersFile {
    #[serde(default)]
    users: HashMap<String, UserRecord>,
}

pub struct UserDirectory {
    path: PathBuf,
    state: Mutex<UsersFile>,
}

impl UserDirectory {
    /// Read the store file. A missing or unreadable file is an empty store,
    /// not an error.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "users store is corrupt, starting empty"
                    );
                    UsersFile::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no users store yet, starting empty");
                UsersFile::default()
            }
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    /// Unix-millisecond timestamp of the user's last fulfilled request in
    /// this quota class. A zero slot counts as "never".
    pub async fn last_request_ms(&self, user: UserId, class: QuotaClass) -> Option<i64> {
        let state = self.state.lock().await;
        let record = state.users.get(&user.0.to_string())?;
        let ts = quota_slot(record, class);
        (ts > 0).then_some(ts)
    }

    /// Stamp the quota slot at `now_ms`. Timestamps only move forward.
    pub async fn mark_fulfilled(&self, user: UserId, class: QuotaClass, now_ms: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        {
            let record = state.users.entry(user.0.to_string()).or_default();
            let slot = quota_slot_mut(record, class);
            *slot = (*slot).max(now_ms);
        }
        self.persist(&state)
    }

    /// Forget every user record, on disk included.
    pub async fn reset(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.users.clear();
        self.persist(&state)
    }

    fn persist(&self, state: &UsersFile) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

fn quota_slot(record: &UserRecord, class: QuotaClass) -> i64 {
    match class {
        QuotaClass::Daily => record.last_day_ts,
        QuotaClass::Weekly => record.last_week_ts,
        QuotaClass::Monthly => record.last_month_ts,
    }
}

fn quota_slot_mut(record: &mut UserRecord, class: QuotaClass) -> &mut i64 {
    match class {
        QuotaClass::Daily => &mut record.last_day_ts,
        QuotaClass::Weekly => &mut record.last_week_ts,
        QuotaClass::Monthly => &mut record.last_month_ts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("zorya-users-{}-{}.json", tag, std::process::id()))
    }

    #[tokio::test]
    async fn unknown_user_has_no_timestamps() {
        let path = temp_file("fresh");
        let _ = std::fs::remove_file(&path);
        let dir = UserDirectory::load(&path);
        assert_eq!(dir.last_request_ms(UserId(7), QuotaClass::Daily).await, None);
    }

    #[tokio::test]
    async fn fulfilled_requests_persist_per_class() {
        let path = temp_file("persist");
        let _ = std::fs::remove_file(&path);
        let dir = UserDirectory::load(&path);
        dir.mark_fulfilled(UserId(7), QuotaClass::Daily, 1_000)
            .await
            .unwrap();
        dir.mark_fulfilled(UserId(7), QuotaClass::Weekly, 2_000)
            .await
            .unwrap();
        assert_eq!(
            dir.last_request_ms(UserId(7), QuotaClass::Daily).await,
            Some(1_000)
        );
        assert_eq!(
            dir.last_request_ms(UserId(7), QuotaClass::Weekly).await,
            Some(2_000)
        );
        assert_eq!(dir.last_request_ms(UserId(7), QuotaClass::Monthly).await, None);

        let reloaded = UserDirectory::load(&path);
        assert_eq!(
            reloaded.last_request_ms(UserId(7), QuotaClass::Daily).await,
            Some(1_000)
        );
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn timestamps_never_move_backwards() {
        let path = temp_file("monotonic");
        let _ = std::fs::remove_file(&path);
        let dir = UserDirectory::load(&path);
        dir.mark_fulfilled(UserId(1), QuotaClass::Daily, 5_000)
            .await
            .unwrap();
        dir.mark_fulfilled(UserId(1), QuotaClass::Daily, 4_000)
            .await
            .unwrap();
        assert_eq!(
            dir.last_request_ms(UserId(1), QuotaClass::Daily).await,
            Some(5_000)
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn store_fields_stay_camel_case() {
        let record = UserRecord {
            last_day_ts: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"lastDayTs\":1"));
        assert!(json.contains("\"profile\":{}"));

        let parsed: UserRecord =
            serde_json::from_str(r#"{"lastDayTs": 9, "profile": {"name": "Оля"}}"#).unwrap();
        assert_eq!(parsed.last_day_ts, 9);
        assert_eq!(parsed.last_week_ts, 0);
        assert_eq!(parsed.profile["name"], "Оля");
    }

    #[tokio::test]
    async fn corrupt_store_starts_empty() {
        let path = temp_file("corrupt");
        std::fs::write(&path, "не json зовсім").unwrap();
        let dir = UserDirectory::load(&path);
        assert_eq!(dir.last_request_ms(UserId(7), QuotaClass::Daily).await, None);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn reset_clears_disk_and_memory() {
        let path = temp_file("reset");
        let _ = std::fs::remove_file(&path);
        let dir = UserDirectory::load(&path);
        dir.mark_fulfilled(UserId(3), QuotaClass::Monthly, 9_000)
            .await
            .unwrap();
        dir.reset().await.unwrap();
        assert_eq!(dir.last_request_ms(UserId(3), QuotaClass::Monthly).await, None);

        let reloaded = UserDirectory::load(&path);
        assert_eq!(
            reloaded.last_request_ms(UserId(3), QuotaClass::Monthly).await,
            None
        );
        let _ = std::fs::remove_file(&path);
    }
}
