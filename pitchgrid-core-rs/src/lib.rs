//! Core logic for the pitchgrid instrument tuner.
//!
//! This crate holds everything about the tuner that is independent of the
//! RP2040 peripherals: debounced edge input, the zero-crossing pitch
//! estimator, the mode state machine, and the feedback renderer that maps a
//! detected note onto a 5×5 glyph, a tri-color lamp and an optional
//! reference tone.
//!
//! # Architecture
//!
//! ```text
//! buttons/joystick ──▶ input::DebouncedButton ──▶ InputEvent
//!                                                    │
//!                                                    ▼
//! mic samples ──▶ pitch::PitchEstimator ──▶ state::ModeMachine
//!                                                    │
//!                                                    ▼
//!                              feedback::Feedback (glyph, lamp, tone)
//! ```
//!
//! The firmware crate owns the peripherals and drives this crate from its
//! main loop; every type here is `no_std`, allocation-free and testable on
//! the host.
//!
//! # Crate Features
//!
//! - **`defmt`** — structured logging and `defmt::Format` derives for
//!   embedded targets.

#![no_std]

pub mod feedback;
pub mod input;
pub mod pitch;
pub mod state;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use feedback::{Feedback, LampColor, ToneSpec};
pub use input::{DebouncedButton, EventLatch, InputEvent};
pub use pitch::{
    estimate, Note, NoteGlyph, PitchConfig, PitchConfigError, PitchEstimator, PitchReading,
    TuningVerdict, NOTE_GLYPHS,
};
pub use state::{MenuChoice, ModeMachine, SystemState, TunerConfig};
