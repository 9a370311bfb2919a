use crate::model::Preferences;
use crate::storage::{load_preferences, save_preferences, KvStore, StoreError};
use crate::timer::TimerState;
use log::info;

/// Application-wide UI state. Only `prefs` is written back to the store;
/// the drawer flag and the countdown live for the session.
#[derive(Debug)]
pub struct AppState<S> {
    kv: S,
    prefs: Preferences,
    timer_drawer_open: bool,
    timer: TimerState,
}

impl<S: KvStore> AppState<S> {
    pub fn load(kv: S) -> Self {
        let prefs = load_preferences(&kv);
        AppState {
            kv,
            prefs,
            timer_drawer_open: false,
            timer: TimerState::default(),
        }
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn timer(&self) -> &TimerState {
        &self.timer
    }

    pub fn timer_drawer_open(&self) -> bool {
        self.timer_drawer_open
    }

    pub fn set_onboarding_completed(&mut self, completed: bool) -> Result<(), StoreError> {
        self.update_prefs(|p| p.onboarding_completed = completed)
    }

    pub fn toggle_blur(&mut self) -> Result<(), StoreError> {
        self.update_prefs(|p| p.blur_enabled = !p.blur_enabled)
    }

    pub fn set_blur_enabled(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.update_prefs(|p| p.blur_enabled = enabled)
    }

    pub fn toggle_focus_mode(&mut self) -> Result<(), StoreError> {
        self.update_prefs(|p| p.focus_mode_enabled = !p.focus_mode_enabled)
    }

    pub fn set_focus_mode_enabled(&mut self, enabled: bool) -> Result<(), StoreError> {
        self.update_prefs(|p| p.focus_mode_enabled = enabled)
    }

    pub fn set_timer_drawer_open(&mut self, open: bool) {
        self.timer_drawer_open = open;
    }

    pub fn open_timer_drawer(&mut self) {
        self.set_timer_drawer_open(true);
    }

    pub fn close_timer_drawer(&mut self) {
        self.set_timer_drawer_open(false);
    }

    /// Starting a countdown also closes the drawer it was picked from.
    pub fn start_timer(&mut self, hours: u64, minutes: u64) {
        self.timer.start(hours, minutes);
        self.timer_drawer_open = false;
        info!(
            "event=timer_start duration_seconds={}",
            self.timer.duration_seconds
        );
    }

    pub fn pause_timer(&mut self) {
        self.timer.pause();
    }

    pub fn resume_timer(&mut self) {
        self.timer.resume();
    }

    pub fn stop_timer(&mut self) {
        self.timer.stop();
        info!("event=timer_stop");
    }

    /// Returns true when the countdown just reached zero.
    pub fn decrement_time(&mut self) -> bool {
        let finished = self.timer.tick();
        if finished {
            info!(
                "event=timer_finished duration_seconds={}",
                self.timer.duration_seconds
            );
        }
        finished
    }

    fn update_prefs<F>(&mut self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut next = self.prefs;
        f(&mut next);
        save_preferences(&mut self.kv, &next)?;
        self.prefs = next;
        info!(
            "event=settings_save blur={} focus={} onboarding={}",
            self.prefs.blur_enabled, self.prefs.focus_mode_enabled, self.prefs.onboarding_completed
        );
        Ok(())
    }

    #[cfg(test)]
    fn into_kv(self) -> S {
        self.kv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryKv;
    use crate::storage::SETTINGS_KEY;

    #[test]
    fn defaults_on_empty_store() {
        let state = AppState::load(MemoryKv::default());
        assert!(state.prefs().blur_enabled);
        assert!(!state.prefs().focus_mode_enabled);
        assert!(!state.prefs().onboarding_completed);
        assert!(!state.timer_drawer_open());
        assert_eq!(*state.timer(), TimerState::default());
    }

    #[test]
    fn preferences_survive_reload_but_session_state_does_not() {
        let mut state = AppState::load(MemoryKv::default());
        state.toggle_blur().unwrap();
        state.toggle_focus_mode().unwrap();
        state.set_onboarding_completed(true).unwrap();
        state.open_timer_drawer();
        state.start_timer(0, 25);
        state.open_timer_drawer();

        let reloaded = AppState::load(state.into_kv());
        assert!(!reloaded.prefs().blur_enabled);
        assert!(reloaded.prefs().focus_mode_enabled);
        assert!(reloaded.prefs().onboarding_completed);
        assert!(!reloaded.timer_drawer_open());
        assert_eq!(*reloaded.timer(), TimerState::default());
    }

    #[test]
    fn persisted_blob_holds_only_preference_flags() {
        let mut state = AppState::load(MemoryKv::default());
        state.start_timer(1, 0);
        state.set_blur_enabled(false).unwrap();
        let kv = state.into_kv();
        let raw = kv.entries.get(SETTINGS_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["blurEnabled", "focusModeEnabled", "onboardingCompleted"]);
    }

    #[test]
    fn start_timer_closes_drawer() {
        let mut state = AppState::load(MemoryKv::default());
        state.open_timer_drawer();
        state.start_timer(0, 15);
        assert!(!state.timer_drawer_open());
        assert!(state.timer().active);
        assert_eq!(state.timer().remaining_seconds, 900);
    }

    #[test]
    fn decrement_reports_completion_once() {
        let mut state = AppState::load(MemoryKv::default());
        state.start_timer(0, 1);
        let completions = (0..70).filter(|_| state.decrement_time()).count();
        assert_eq!(completions, 1);
        assert!(!state.timer().active);
        assert_eq!(state.timer().remaining_seconds, 0);
    }

    #[test]
    fn pause_and_resume_through_store() {
        let mut state = AppState::load(MemoryKv::default());
        state.start_timer(0, 2);
        state.decrement_time();
        state.pause_timer();
        state.decrement_time();
        assert_eq!(state.timer().remaining_seconds, 119);
        state.resume_timer();
        state.decrement_time();
        assert_eq!(state.timer().remaining_seconds, 118);
        state.stop_timer();
        assert!(!state.timer().is_visible());
    }

    struct ReadOnlyKv;

    impl KvStore for ReadOnlyKv {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn failed_save_leaves_preferences_unchanged() {
        let mut state = AppState::load(ReadOnlyKv);
        assert!(state.toggle_blur().is_err());
        assert!(state.prefs().blur_enabled);
        assert!(state.set_focus_mode_enabled(true).is_err());
        assert!(!state.prefs().focus_mode_enabled);
        assert!(state.set_onboarding_completed(true).is_err());
        assert_eq!(state.prefs(), &Preferences::default());
    }
}
