//! Per-mode screen snapshots and rendering.
//!
//! A [`Screen`] captures everything the display should show for one mode:
//! a title, an optional status line, up to two button-hint lines, and (in
//! mode selection) the highlighted menu entry. Snapshots compare with `==`
//! so the firmware can skip the I2C flush when nothing changed.

use core::fmt::Write;

use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};
use heapless::String;

use pitchgrid::pitch::{Note, TuningVerdict};
use pitchgrid::state::MenuChoice;

// ── ScreenLayout ─────────────────────────────────────────────────────────

/// Layout geometry for the 128×64 panel.
///
/// All coordinates live here — there are no module-level layout constants.
/// The defaults place the button hints on the bottom two text rows, where
/// the device's key legend has always lived.
#[derive(Debug, Clone)]
pub struct ScreenLayout {
    /// Panel width in pixels. Default: 128.
    pub width: u32,
    /// X coordinate for left-aligned text. Default: 2.
    pub text_x: i32,
    /// Y coordinate of the title row. Default: 0.
    pub title_y: i32,
    /// Y coordinate of the status row. Default: 22.
    pub status_y: i32,
    /// Y coordinates of the two menu rows. Default: 14 and 30.
    pub menu_y: [i32; 2],
    /// Height of the selection rectangle. Default: 13.
    pub menu_row_height: u32,
    /// Y coordinates of the two hint rows. Default: 44 and 54.
    pub hint_y: [i32; 2],
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            width: 128,
            text_x: 2,
            title_y: 0,
            status_y: 22,
            menu_y: [14, 30],
            menu_row_height: 13,
            hint_y: [44, 54],
        }
    }
}

// ── Screen ───────────────────────────────────────────────────────────────

/// Immutable snapshot of one display frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Root menu with one entry highlighted.
    ModeSelect { choice: MenuChoice },
    /// Tuner mode, showing the latest reading (if any).
    Tuner {
        note: Option<Note>,
        verdict: TuningVerdict,
    },
    /// Diapason mode; `playing` marks the held-tone sub-state.
    Diapason { playing: bool },
}

impl Screen {
    /// Title line.
    pub fn title(&self) -> &'static str {
        match self {
            Screen::ModeSelect { .. } => "Select mode",
            Screen::Tuner { .. } => "Tuner",
            Screen::Diapason { playing: false } => "Diapason",
            Screen::Diapason { playing: true } => "Playing...",
        }
    }

    /// The two button-hint lines; empty strings are not drawn.
    pub fn hints(&self) -> [&'static str; 2] {
        match self {
            Screen::ModeSelect { .. } => ["A: select", ""],
            Screen::Tuner { .. } => ["B: back", ""],
            Screen::Diapason { playing: false } => ["A: play", "B: back"],
            Screen::Diapason { playing: true } => ["B: stop", ""],
        }
    }

    /// Status line under the title, empty when the mode has none.
    pub fn status_line(&self) -> String<24> {
        let mut line = String::new();
        match self {
            Screen::Tuner {
                note: Some(note),
                verdict,
            } => {
                let _ = write!(line, "Note {} - {}", note.letter(), verdict_label(*verdict));
            }
            Screen::Tuner { note: None, .. } => {
                let _ = line.push_str("Listening...");
            }
            Screen::Diapason { .. } => {
                let _ = line.push_str("A = 440 Hz");
            }
            Screen::ModeSelect { .. } => {}
        }
        line
    }
}

/// Human label for a verdict.
fn verdict_label(verdict: TuningVerdict) -> &'static str {
    match verdict {
        TuningVerdict::Flat => "flat",
        TuningVerdict::Sharp => "sharp",
        TuningVerdict::InTune => "in tune",
        TuningVerdict::Silent => "silent",
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

/// Draw a [`Screen`] into a display buffer.
///
/// ```text
/// ┌────────────────────────────┐
/// │ Title                      │ ← title_y
/// │  1: Tuner      ┐ menu rows │ ← menu_y (ModeSelect only,
/// │ ┌2:─Diapason─┐ ┘           │   rectangle on the highlight)
/// │ Status line                │ ← status_y (other modes)
/// │ A: select                  │ ← hint_y[0]
/// │ B: back                    │ ← hint_y[1]
/// └────────────────────────────┘
/// ```
pub fn render_screen<D>(
    display: &mut D,
    screen: &Screen,
    layout: &ScreenLayout,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);

    Text::with_baseline(
        screen.title(),
        Point::new(layout.text_x, layout.title_y),
        style,
        Baseline::Top,
    )
    .draw(display)?;

    match screen {
        Screen::ModeSelect { choice } => {
            let entries = ["1: Tuner", "2: Diapason"];
            for (label, y) in entries.iter().zip(layout.menu_y) {
                Text::with_baseline(label, Point::new(layout.text_x + 4, y), style, Baseline::Top)
                    .draw(display)?;
            }

            let selected = match choice {
                MenuChoice::Tuner => layout.menu_y[0],
                MenuChoice::Diapason => layout.menu_y[1],
            };
            Rectangle::new(
                Point::new(0, selected - 2),
                Size::new(layout.width, layout.menu_row_height),
            )
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(display)?;
        }
        _ => {
            let status = screen.status_line();
            if !status.is_empty() {
                Text::with_baseline(
                    status.as_str(),
                    Point::new(layout.text_x, layout.status_y),
                    style,
                    Baseline::Top,
                )
                .draw(display)?;
            }
        }
    }

    for (hint, y) in screen.hints().iter().zip(layout.hint_y) {
        if !hint.is_empty() {
            Text::with_baseline(hint, Point::new(layout.text_x, y), style, Baseline::Top)
                .draw(display)?;
        }
    }

    Ok(())
}

// ── Unit Tests ───────────────────────────────────────────────────────────
