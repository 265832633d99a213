use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::preferences::KeyValueStore;

/// Storage scope of the rater. Hosts should open their preferences with it so that rater keys
/// don't mix with unrelated host settings.
pub const NAMESPACE: &str = "apprater";

pub const DONT_SHOW_AGAIN: &str = "appRater.dontShowAgain";
pub const LAUNCH_COUNT: &str = "appRater.launchCount";
pub const DATE_FIRST_LAUNCH: &str = "appRater.firstLaunch";

/// Value of [DATE_FIRST_LAUNCH] until the first launch has been recorded.
pub const FIRST_LAUNCH_UNSET: i64 = 0;

/// Snapshot of everything the rater persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RaterState {
    pub dismissed: bool,
    pub launch_count: u64,
    /// Milliseconds since epoch, [FIRST_LAUNCH_UNSET] if not recorded yet.
    pub first_launch: i64,
}

/// Typed access to the persisted rater values. Every setter commits right away and write errors
/// are logged and dropped, so a failed write simply leaves the old value in place on the next
/// process start.
pub struct CounterStore<S> {
    store: S,
}

impl<S: KeyValueStore> CounterStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn is_dismissed_permanently(&self) -> bool {
        self.store
            .get(DONT_SHOW_AGAIN)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn set_dismissed_permanently(&mut self, dismissed: bool) {
        self.write(DONT_SHOW_AGAIN, Value::Bool(dismissed));
    }

    pub fn launch_count(&self) -> u64 {
        self.store
            .get(LAUNCH_COUNT)
            .and_then(|v| v.as_u64())
            .unwrap_or(0)
    }

    pub fn set_launch_count(&mut self, launch_count: u64) {
        self.write(LAUNCH_COUNT, launch_count.into());
    }

    pub fn first_launch(&self) -> i64 {
        self.store
            .get(DATE_FIRST_LAUNCH)
            .and_then(|v| v.as_i64())
            .unwrap_or(FIRST_LAUNCH_UNSET)
    }

    pub fn set_first_launch(&mut self, first_launch: i64) {
        self.write(DATE_FIRST_LAUNCH, first_launch.into());
    }

    /// Read-modify-write of the launch counter. Not atomic on its own; the engine calls it under
    /// its lock.
    pub fn increment_launch_count(&mut self) -> u64 {
        let next = self.launch_count().saturating_add(1);
        self.set_launch_count(next);
        next
    }

    pub fn snapshot(&self) -> RaterState {
        RaterState {
            dismissed: self.is_dismissed_permanently(),
            launch_count: self.launch_count(),
            first_launch: self.first_launch(),
        }
    }

    fn write(&mut self, key: &str, value: Value) {
        debug!("Writing {key} = {value}");
        self.store.set(key, value);
        if let Err(e) = self.store.commit() {
            warn!("Failed to commit {key}, the value may be lost: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use serde_json::json;

    use crate::{
        storage::preferences::{MemoryPreferences, MockKeyValueStore},
        utils::logging::TEST_LOGGING,
    };

    use super::*;

    #[test]
    fn test_defaults_on_empty_store() {
        let store = CounterStore::new(MemoryPreferences::new());
        assert_eq!(store.snapshot(), RaterState::default());
        assert!(!store.is_dismissed_permanently());
        assert_eq!(store.launch_count(), 0);
        assert_eq!(store.first_launch(), FIRST_LAUNCH_UNSET);
    }

    #[test]
    fn test_values_are_written_under_stable_keys() {
        let mut store = CounterStore::new(MemoryPreferences::new());
        store.set_dismissed_permanently(true);
        store.set_launch_count(4);
        store.set_first_launch(1_530_662_400_000);

        let prefs = store.store;
        assert_eq!(prefs.get("appRater.dontShowAgain"), Some(json!(true)));
        assert_eq!(prefs.get("appRater.launchCount"), Some(json!(4)));
        assert_eq!(prefs.get("appRater.firstLaunch"), Some(json!(1_530_662_400_000i64)));
    }

    #[test]
    fn test_dismissed_flag_can_be_cleared() {
        let mut store = CounterStore::new(MemoryPreferences::new());
        store.set_dismissed_permanently(true);
        store.set_dismissed_permanently(false);
        assert!(!store.is_dismissed_permanently());
    }

    #[test]
    fn test_increment() {
        let mut store = CounterStore::new(MemoryPreferences::new());
        assert_eq!(store.increment_launch_count(), 1);
        assert_eq!(store.increment_launch_count(), 2);
        assert_eq!(store.launch_count(), 2);
    }

    #[test]
    fn test_values_of_wrong_type_fall_back_to_defaults() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(LAUNCH_COUNT, json!("seven"));
        prefs.set(DONT_SHOW_AGAIN, json!(1));
        let store = CounterStore::new(prefs);
        assert_eq!(store.launch_count(), 0);
        assert!(!store.is_dismissed_permanently());
    }

    #[test]
    fn test_commit_failures_are_swallowed() {
        *TEST_LOGGING;
        let mut prefs = MockKeyValueStore::new();
        prefs.expect_set().times(1).return_const(());
        prefs
            .expect_commit()
            .times(1)
            .returning(|| Err(anyhow!("disk full")));

        let mut store = CounterStore::new(prefs);
        store.set_launch_count(3);
    }
}
