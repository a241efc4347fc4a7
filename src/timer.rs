//! Pomodoro countdown.
//!
//! `Timer` is a plain state machine advanced one second per [`Timer::tick`];
//! the `timer` command drives it from a sleep loop and draws it in place.

use crate::config::TimerPresets;
use crate::error::{AppError, Result};
use crate::fields::TimerKind;

/// Result of advancing the timer by one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Not running; nothing changed.
    Idle,
    Running { remaining: u32 },
    /// Reached zero on this tick. Reported once.
    Expired,
}

#[derive(Debug, Clone)]
pub struct Timer {
    presets: TimerPresets,
    kind: TimerKind,
    custom_secs: u32,
    time_left: u32,
    running: bool,
}

impl Timer {
    pub fn new(presets: TimerPresets) -> Self {
        let custom_secs = presets.pomodoro_minutes.saturating_mul(60);
        let mut timer = Timer {
            presets,
            kind: TimerKind::Pomodoro,
            custom_secs,
            time_left: 0,
            running: false,
        };
        timer.time_left = timer.duration();
        timer
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Full length of the current kind, in seconds.
    pub fn duration(&self) -> u32 {
        match self.kind {
            TimerKind::Pomodoro => self.presets.pomodoro_minutes.saturating_mul(60),
            TimerKind::ShortBreak => self.presets.short_break_minutes.saturating_mul(60),
            TimerKind::LongBreak => self.presets.long_break_minutes.saturating_mul(60),
            TimerKind::Custom => self.custom_secs,
        }
    }

    pub fn start(&mut self) {
        if self.time_left > 0 {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.time_left = self.duration();
    }

    /// Switch preset; stops the timer and restores the full duration.
    pub fn change_kind(&mut self, kind: TimerKind) {
        self.kind = kind;
        self.reset();
    }

    /// Set the custom length from user input in whole minutes.
    pub fn set_custom_minutes(&mut self, input: &str) -> Result<()> {
        let minutes: u32 = input
            .trim()
            .parse()
            .ok()
            .filter(|m| *m > 0)
            .ok_or_else(|| AppError::invalid_input("Please enter a valid number of minutes."))?;
        self.custom_secs = minutes
            .checked_mul(60)
            .ok_or_else(|| AppError::invalid_input("Please enter a valid number of minutes."))?;
        if self.kind == TimerKind::Custom {
            self.reset();
        }
        Ok(())
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.running = false;
            Tick::Expired
        } else {
            Tick::Running { remaining: self.time_left }
        }
    }

    /// Remaining share of the full duration, in [0, 1].
    pub fn remaining_fraction(&self) -> f64 {
        match self.duration() {
            0 => 0.0,
            total => self.time_left as f64 / total as f64,
        }
    }

    /// `mm:ss` rendering of the remaining time.
    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.time_left / 60, self.time_left % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presets() -> TimerPresets {
        TimerPresets {
            pomodoro_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
        }
    }

    #[test]
    fn test_new_timer_is_idle_pomodoro() {
        let mut timer = Timer::new(presets());
        assert_eq!(timer.kind(), TimerKind::Pomodoro);
        assert_eq!(timer.time_left(), 25 * 60);
        assert_eq!(timer.display(), "25:00");
        assert_eq!(timer.tick(), Tick::Idle);
        assert_eq!(timer.remaining_fraction(), 1.0);
    }

    #[test]
    fn test_tick_counts_down_and_expires_once() {
        let mut timer = Timer::new(presets());
        timer.set_custom_minutes("1").unwrap();
        timer.change_kind(TimerKind::Custom);
        timer.start();
        for expected in (1..60).rev() {
            assert_eq!(timer.tick(), Tick::Running { remaining: expected });
        }
        assert_eq!(timer.tick(), Tick::Expired);
        assert!(!timer.is_running());
        assert_eq!(timer.tick(), Tick::Idle);
        assert_eq!(timer.display(), "00:00");
        assert_eq!(timer.remaining_fraction(), 0.0);

        timer.start();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_change_kind_stops_and_resets() {
        let mut timer = Timer::new(presets());
        timer.start();
        timer.tick();
        timer.change_kind(TimerKind::ShortBreak);
        assert!(!timer.is_running());
        assert_eq!(timer.time_left(), 5 * 60);
        timer.change_kind(TimerKind::LongBreak);
        assert_eq!(timer.display(), "15:00");
    }

    #[test]
    fn test_pause_and_reset() {
        let mut timer = Timer::new(presets());
        timer.start();
        timer.tick();
        timer.tick();
        timer.pause();
        assert_eq!(timer.tick(), Tick::Idle);
        assert_eq!(timer.display(), "24:58");
        timer.reset();
        assert_eq!(timer.display(), "25:00");
    }

    #[test]
    fn test_custom_minutes_validation() {
        let mut timer = Timer::new(presets());
        assert!(timer.set_custom_minutes("0").is_err());
        assert!(timer.set_custom_minutes("-3").is_err());
        assert!(timer.set_custom_minutes("abc").is_err());
        timer.set_custom_minutes(" 45 ").unwrap();
        assert_eq!(timer.time_left(), 25 * 60);
        timer.change_kind(TimerKind::Custom);
        assert_eq!(timer.time_left(), 45 * 60);
    }

    #[test]
    fn test_oversized_preset_saturates() {
        let mut timer = Timer::new(TimerPresets {
            pomodoro_minutes: 80_000_000,
            ..presets()
        });
        assert_eq!(timer.time_left(), u32::MAX);
        timer.start();
        assert_eq!(timer.tick(), Tick::Running { remaining: u32::MAX - 1 });
    }

    #[test]
    fn test_remaining_fraction_midway() {
        let mut timer = Timer::new(presets());
        timer.change_kind(TimerKind::ShortBreak);
        timer.start();
        for _ in 0..150 {
            timer.tick();
        }
        assert_eq!(timer.remaining_fraction(), 0.5);
    }
}
