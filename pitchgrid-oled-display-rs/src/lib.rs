//! Async status display for the pitchgrid tuner (SSD1306, 128×64).
//!
//! Two layers: [`Oled`], a thin lifecycle wrapper around the [`ssd1306`]
//! crate in async buffered-graphics mode, and [`Screen`], an immutable
//! per-mode snapshot of what the display should show. The firmware builds a
//! `Screen` from the mode machine each iteration and calls
//! [`Oled::show`] only when the snapshot changed, so the ~20 ms I2C flush
//! is skipped on quiet frames.
//!
//! # Crate Features
//!
//! - **`defmt`** — structured logging via [`defmt`].

#![no_std]

pub mod driver;
pub mod error;
pub mod screens;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use driver::Oled;
pub use error::OledError;
pub use screens::{Screen, ScreenLayout};
