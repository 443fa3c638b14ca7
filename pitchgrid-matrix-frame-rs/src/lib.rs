//! Frame mapping for the 5×5 WS2812 light matrix.
//!
//! The matrix chain is wired serpentine: physical LED 0 starts the bottom
//! row, rows run bottom-to-top, and the column direction alternates per
//! row. This crate owns the translation from the logical glyph grid (row 0
//! at the top, columns left to right) into the chain's native scan order,
//! plus the GRB color-word encoding of the WS2812 wire format.
//!
//! Pushing the ordered cells out over the PIO state machine is left to the
//! transmission collaborator in the firmware crate.

#![no_std]

mod frame;

pub use frame::{cell_index, Frame, Rgb, MATRIX_SIDE, NUM_CELLS};
