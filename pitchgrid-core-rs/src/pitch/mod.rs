//! Pitch estimation over raw microphone sample windows.
//!
//! The estimator turns one fixed-size window of unsigned 12-bit ADC
//! readings into a smoothed frequency estimate, the nearest natural note,
//! and a [`TuningVerdict`]. The pipeline is deliberately cheap — a
//! peak-to-peak amplitude gate, a rising zero-crossing count, octave
//! folding, exponential smoothing, and a nearest-note match — so a full
//! pass fits comfortably between two sample captures on a small core.
//!
//! # Pipeline
//!
//! ```text
//! SampleWindow ─▶ amplitude gate ─▶ crossing count ─▶ calibration
//!        ─▶ octave fold ─▶ exponential smoothing ─▶ nearest note ─▶ verdict
//! ```
//!
//! Ambiguous or absent input never fails: it degrades to
//! [`TuningVerdict::Silent`] and the smoothed estimate is held unchanged.
//! All tunables live in [`PitchConfig`]; there are no module-level magic
//! numbers.

mod config;
mod estimator;
mod notes;

pub use config::{PitchConfig, PitchConfigError};
pub use estimator::{estimate, fold_to_register, PitchEstimator, PitchReading, TuningVerdict};
pub use notes::{Note, NoteGlyph, NOTE_COUNT, NOTE_GLYPHS};
