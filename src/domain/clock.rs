use crate::domain::models::{Phase, TimerConfiguration};

/// Emitted by [`SessionClock::tick`] on the tick that crosses a phase
/// boundary. Work completions are the only events the recorder persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    WorkIntervalCompleted { duration_minutes: u32 },
    BreakIntervalCompleted,
}

/// Countdown state machine for the focus timer.
///
/// States are `Idle(phase)` and `Running(phase)`; an external scheduler
/// drives `tick` once per elapsed wall-clock second while running. The
/// clock never rests at zero: the tick that reaches zero flips the phase,
/// reloads the full duration of the next phase and keeps running
/// (automatic continuation is fixed behavior, not configurable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    config: TimerConfiguration,
    phase: Phase,
    remaining_seconds: u32,
    running: bool,
}

impl SessionClock {
    pub fn new(config: TimerConfiguration) -> Self {
        Self {
            phase: Phase::Work,
            remaining_seconds: config.duration_seconds(Phase::Work),
            running: false,
            config,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn configuration(&self) -> TimerConfiguration {
        self.config
    }

    /// `Idle(p) -> Running(p)`; no-op when already running.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// `Running(p) -> Idle(p)`, preserving the remaining countdown.
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Any state to `Idle(current phase)` with the countdown restored to
    /// the full duration of the current phase. Never flips phase and
    /// never emits a completion.
    pub fn reset(&mut self) {
        self.running = false;
        self.remaining_seconds = self.config.duration_seconds(self.phase);
    }

    /// Replaces the interval configuration. Rejected configurations leave
    /// the clock fully untouched, prior configuration included. A
    /// successful apply is a hard reset point: the clock stops and the
    /// countdown is recomputed from the new duration of the current phase.
    pub fn apply_configuration(&mut self, config: TimerConfiguration) -> Result<(), String> {
        config.validate()?;
        self.config = config;
        self.running = false;
        self.remaining_seconds = config.duration_seconds(self.phase);
        Ok(())
    }

    /// Advances the countdown by one elapsed second. Idle clocks are left
    /// untouched. The tick that reaches zero performs the phase
    /// completion in one transition: flip phase, reload the new phase's
    /// full duration, stay running, and report the crossing exactly once.
    pub fn tick(&mut self) -> Option<ClockEvent> {
        if !self.running {
            return None;
        }
        if self.remaining_seconds > 1 {
            self.remaining_seconds -= 1;
            return None;
        }

        let completed = self.phase;
        self.phase = completed.flipped();
        self.remaining_seconds = self.config.duration_seconds(self.phase);
        match completed {
            Phase::Work => Some(ClockEvent::WorkIntervalCompleted {
                duration_minutes: self.config.work_minutes,
            }),
            Phase::Break => Some(ClockEvent::BreakIntervalCompleted),
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(TimerConfiguration::default())
    }
}
