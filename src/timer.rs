use std::time::Duration;

/// One-shot countdown. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerState {
    pub active: bool,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
}

impl TimerState {
    /// Durations too large to represent saturate at `u64::MAX` seconds.
    pub fn start(&mut self, hours: u64, minutes: u64) {
        let total = hours
            .saturating_mul(3_600)
            .saturating_add(minutes.saturating_mul(60));
        self.active = total > 0;
        self.duration_seconds = total;
        self.remaining_seconds = total;
    }

    pub fn pause(&mut self) {
        self.active = false;
    }

    /// A finished countdown stays finished.
    pub fn resume(&mut self) {
        self.active = self.remaining_seconds > 0;
    }

    pub fn stop(&mut self) {
        *self = TimerState::default();
    }

    /// One second elapsed. Returns true when this tick finished the countdown.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.active = false;
            return true;
        }
        false
    }

    /// The countdown is shown only while time remains.
    pub fn is_visible(&self) -> bool {
        self.remaining_seconds > 0
    }
}

/// Turns irregular loop wake-ups into whole one-second ticks.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ticker {
    carry: Duration,
}

impl Ticker {
    const PERIOD: Duration = Duration::from_secs(1);

    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.carry += elapsed;
        let mut ticks = 0;
        while self.carry >= Self::PERIOD {
            self.carry -= Self::PERIOD;
            ticks += 1;
        }
        ticks
    }

    pub fn reset(&mut self) {
        self.carry = Duration::ZERO;
    }
}

/// `H:MM:SS` with hours, `M:SS` without.
pub fn format_clock(seconds: u64) -> String {
    let hrs = seconds / 3_600;
    let mins = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    if hrs > 0 {
        format!("{}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_durations_saturate_instead_of_overflowing() {
        let mut timer = TimerState::default();
        timer.start(u64::MAX / 1000, 0);
        assert!(timer.active);
        assert_eq!(timer.duration_seconds, u64::MAX);
        assert_eq!(timer.remaining_seconds, timer.duration_seconds);
        assert!(!timer.tick());
        assert!(timer.remaining_seconds <= timer.duration_seconds);

        timer.start(0, u64::MAX);
        assert_eq!(timer.duration_seconds, u64::MAX);
    }

    #[test]
    fn fifteen_minutes_runs_down_and_stops() {
        let mut timer = TimerState::default();
        timer.start(0, 15);
        assert_eq!(timer.duration_seconds, 900);
        assert_eq!(timer.remaining_seconds, 900);
        assert!(timer.active);

        let finished: Vec<bool> = (0..900).map(|_| timer.tick()).collect();
        assert_eq!(timer.remaining_seconds, 0);
        assert!(!timer.active);
        assert_eq!(finished.iter().filter(|f| **f).count(), 1);
        assert!(finished[899]);
        assert!(!timer.is_visible());
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut timer = TimerState::default();
        timer.start(1, 0);
        for _ in 0..10 {
            timer.tick();
        }
        timer.pause();
        for _ in 0..50 {
            timer.tick();
        }
        assert_eq!(timer.remaining_seconds, 3_590);
        timer.resume();
        timer.tick();
        assert_eq!(timer.remaining_seconds, 3_589);
        assert!(timer.remaining_seconds <= timer.duration_seconds);
    }

    #[test]
    fn stop_resets_everything() {
        let mut timer = TimerState::default();
        timer.start(0, 5);
        timer.tick();
        timer.stop();
        assert_eq!(timer, TimerState::default());
    }

    #[test]
    fn resume_after_finish_does_not_restart() {
        let mut timer = TimerState::default();
        timer.start(0, 1);
        for _ in 0..60 {
            timer.tick();
        }
        timer.resume();
        assert!(!timer.active);
        assert!(!timer.tick());
    }

    #[test]
    fn zero_duration_never_activates() {
        let mut timer = TimerState::default();
        timer.start(0, 0);
        assert!(!timer.active);
        assert!(!timer.tick());
    }

    #[test]
    fn ticker_accumulates_partial_seconds() {
        let mut ticker = Ticker::default();
        assert_eq!(ticker.advance(Duration::from_millis(400)), 0);
        assert_eq!(ticker.advance(Duration::from_millis(700)), 1);
        assert_eq!(ticker.advance(Duration::from_millis(2_900)), 3);
        ticker.reset();
        assert_eq!(ticker.advance(Duration::from_millis(999)), 0);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(900), "15:00");
        assert_eq!(format_clock(3_600 + 2 * 60 + 3), "1:02:03");
    }
}
