//! Mode state machine.
//!
//! [`ModeMachine`] owns the [`SystemState`], the menu selection, the
//! tone-enabled flag and the pitch estimator, and is the single writer of
//! all of them. Transitions are driven exclusively by [`InputEvent`]s, with
//! one exception: the bounded auto-return from [`SystemState::DiapasonPlaying`],
//! which the main loop drives through [`ModeMachine::poll_auto_return`].
//!
//! Every state-entry side effect is idempotent — re-entering a state
//! repeatedly rewrites the same flags to the same values and never
//! accumulates anything.

use crate::input::InputEvent;
use crate::pitch::{PitchConfig, PitchEstimator, PitchReading};

/// The device's top-level mode. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    /// Root menu: pick between tuner and diapason. Initial state.
    ModeSelect,
    /// Live pitch estimation against the natural notes.
    Tuner,
    /// Reference display with the 440 Hz tone running.
    Diapason,
    /// Held reference tone; auto-returns to [`SystemState::Diapason`].
    DiapasonPlaying,
}

/// Menu entry highlighted in [`SystemState::ModeSelect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuChoice {
    Tuner,
    Diapason,
}

// ── TunerConfig ──────────────────────────────────────────────────────────

/// Device-level tunables outside the pitch pipeline.
///
/// Defaults match the reference deployment. Debounce intervals vary per
/// input class: push buttons need only mechanical-bounce suppression, the
/// joystick zones use a longer interval as tilt-repeat suppression.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TunerConfig {
    /// Push-button debounce interval in ms. Default: 50.
    pub button_debounce_ms: u64,
    /// Joystick-tilt debounce interval in ms. Default: 250.
    pub select_debounce_ms: u64,
    /// How long [`SystemState::DiapasonPlaying`] holds before auto-return,
    /// in ms. Default: 1000.
    pub play_duration_ms: u64,
    /// Main-loop pacing delay in ms. Default: 100.
    pub loop_period_ms: u64,
    /// Joystick ADC reading below which the tilt counts as "up".
    /// Default: 1000.
    pub joystick_low: u16,
    /// Joystick ADC reading above which the tilt counts as "down".
    /// Default: 3000.
    pub joystick_high: u16,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            button_debounce_ms: 50,
            select_debounce_ms: 250,
            play_duration_ms: 1000,
            loop_period_ms: 100,
            joystick_low: 1000,
            joystick_high: 3000,
        }
    }
}

// ── ModeMachine ──────────────────────────────────────────────────────────

/// Owner of the system state and the per-mode volatile state.
///
/// The main loop is the only caller; interrupt-context code communicates
/// with the machine exclusively through latched [`InputEvent`]s.
#[derive(Debug)]
pub struct ModeMachine {
    state: SystemState,
    choice: MenuChoice,
    tone_enabled: bool,
    play_deadline_ms: Option<u64>,
    play_duration_ms: u64,
    estimator: PitchEstimator,
    reading: Option<PitchReading>,
}

impl ModeMachine {
    /// Create a machine in [`SystemState::ModeSelect`] with a zeroed
    /// estimate and the tone stopped.
    pub fn new(config: &TunerConfig, pitch: PitchConfig) -> Self {
        Self {
            state: SystemState::ModeSelect,
            choice: MenuChoice::Tuner,
            tone_enabled: false,
            play_deadline_ms: None,
            play_duration_ms: config.play_duration_ms,
            estimator: PitchEstimator::new(pitch),
            reading: None,
        }
    }

    // ── Read access ──────────────────────────────────────────────────

    /// Currently active state.
    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Menu entry highlighted in mode selection.
    pub fn choice(&self) -> MenuChoice {
        self.choice
    }

    /// Whether the reference tone should be sounding right now.
    pub fn tone_enabled(&self) -> bool {
        self.tone_enabled
    }

    /// Latest pitch reading of the current tuner session, if any.
    pub fn reading(&self) -> Option<&PitchReading> {
        self.reading.as_ref()
    }

    // ── Event handling ───────────────────────────────────────────────

    /// Apply one input event. Returns `true` when anything observable
    /// (state, selection) changed, so callers can gate redraws.
    pub fn handle_event(&mut self, event: InputEvent, now_ms: u64) -> bool {
        match (self.state, event) {
            (SystemState::ModeSelect, InputEvent::SelectPrev) => {
                let changed = self.choice != MenuChoice::Tuner;
                self.choice = MenuChoice::Tuner;
                changed
            }
            (SystemState::ModeSelect, InputEvent::SelectNext) => {
                let changed = self.choice != MenuChoice::Diapason;
                self.choice = MenuChoice::Diapason;
                changed
            }
            (SystemState::ModeSelect, InputEvent::Confirm) => {
                match self.choice {
                    MenuChoice::Tuner => self.enter(SystemState::Tuner, now_ms),
                    MenuChoice::Diapason => self.enter(SystemState::Diapason, now_ms),
                }
                true
            }

            (SystemState::Tuner, InputEvent::Back) => {
                self.enter(SystemState::ModeSelect, now_ms);
                true
            }

            (SystemState::Diapason, InputEvent::Confirm) => {
                self.enter(SystemState::DiapasonPlaying, now_ms);
                true
            }
            (SystemState::Diapason, InputEvent::Back) => {
                self.enter(SystemState::ModeSelect, now_ms);
                true
            }

            (SystemState::DiapasonPlaying, InputEvent::Back) => {
                self.enter(SystemState::Diapason, now_ms);
                true
            }

            _ => false,
        }
    }

    /// Drive the one time-triggered transition: the bounded auto-return
    /// from [`SystemState::DiapasonPlaying`]. Returns `true` on transition.
    pub fn poll_auto_return(&mut self, now_ms: u64) -> bool {
        if self.state == SystemState::DiapasonPlaying {
            if let Some(deadline) = self.play_deadline_ms {
                if now_ms >= deadline {
                    self.enter(SystemState::Diapason, now_ms);
                    return true;
                }
            }
        }
        false
    }

    /// Run one estimation pass. Only meaningful in
    /// [`SystemState::Tuner`]; in any other state the window is ignored
    /// and `None` is returned.
    pub fn process_window(&mut self, window: &[u16]) -> Option<&PitchReading> {
        if self.state != SystemState::Tuner {
            return None;
        }
        self.reading = Some(self.estimator.process(window));
        self.reading.as_ref()
    }

    /// The pitch configuration the machine was built with.
    pub fn pitch_config(&self) -> &PitchConfig {
        self.estimator.config()
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Enter `next`, applying its (idempotent) entry side effects.
    fn enter(&mut self, next: SystemState, now_ms: u64) {
        match next {
            SystemState::ModeSelect => {
                self.tone_enabled = false;
                self.play_deadline_ms = None;
                self.reading = None;
            }
            SystemState::Tuner => {
                self.tone_enabled = false;
                self.play_deadline_ms = None;
                self.estimator.reset();
                self.reading = None;
            }
            SystemState::Diapason => {
                self.tone_enabled = true;
                self.play_deadline_ms = None;
            }
            SystemState::DiapasonPlaying => {
                self.tone_enabled = true;
                self.play_deadline_ms = Some(now_ms + self.play_duration_ms);
            }
        }
        self.state = next;
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────
