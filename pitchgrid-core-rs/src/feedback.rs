//! Tone feedback rendering.
//!
//! Pure mappings from a pitch reading (or the reference mode) onto the three
//! feedback channels: the 5×5 note glyph, the tri-color indicator lamp, and
//! the optional reference tone. Writing the results to the physical matrix,
//! lamp pins and PWM slice is the firmware's job.

use crate::pitch::{Note, NoteGlyph, TuningVerdict};

// ── Lamp ─────────────────────────────────────────────────────────────────

/// Tri-color lamp signal. A direct, stateless function of the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LampColor {
    Off,
    Green,
    /// Red and green channels together.
    Amber,
    Red,
}

impl LampColor {
    /// Map a tuning verdict onto the lamp.
    pub fn from_verdict(verdict: TuningVerdict) -> Self {
        match verdict {
            TuningVerdict::InTune => LampColor::Green,
            TuningVerdict::Flat => LampColor::Amber,
            TuningVerdict::Sharp => LampColor::Red,
            TuningVerdict::Silent => LampColor::Off,
        }
    }

    /// Pin levels as `(red, green, blue)`.
    pub fn channels(self) -> (bool, bool, bool) {
        match self {
            LampColor::Off => (false, false, false),
            LampColor::Green => (false, true, false),
            LampColor::Amber => (true, true, false),
            LampColor::Red => (true, false, false),
        }
    }
}

// ── Tone ─────────────────────────────────────────────────────────────────

/// PWM parameters for a square-wave tone.
///
/// The slice counts `sys_clock / clock_div` ticks up to `wrap`, with the
/// output high for the first `level` ticks. `level` is held at wrap/128
/// (≈ 0.8 % duty) to keep the piezo subdued. Stopping the tone is the
/// firmware's responsibility and must disable the slice output rather than
/// write a zero level, which would leave a DC bias on the pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ToneSpec {
    /// Integer clock divider for the PWM slice.
    pub clock_div: u8,
    /// Wrap (period) value of the counter.
    pub wrap: u16,
    /// Compare level; ticks the output stays high per period.
    pub level: u16,
}

impl ToneSpec {
    /// Derive the slice parameters for a square wave at `freq_hz`.
    ///
    /// Picks the smallest integer divider whose wrap value fits the 16-bit
    /// counter, then `wrap = sys_clock / div / freq`. `freq_hz` must be
    /// positive and reachable with a divider ≤ 255 (anything above ~8 Hz
    /// at 125 MHz); both hold for every note this device plays.
    pub fn square(freq_hz: f32, sys_clock_hz: u32) -> Self {
        let mut clock_div = 1u32;
        let ticks = sys_clock_hz as f32 / freq_hz;
        while clock_div < 255 && ticks / clock_div as f32 > u16::MAX as f32 {
            clock_div += 1;
        }
        let wrap = (ticks / clock_div as f32) as u16;
        Self {
            clock_div: clock_div as u8,
            wrap,
            level: wrap / 128,
        }
    }
}

// ── Feedback ─────────────────────────────────────────────────────────────

/// One frame of feedback across all three channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feedback {
    /// Glyph to show on the matrix; `None` clears it.
    pub glyph: Option<&'static NoteGlyph>,
    /// Indicator lamp signal.
    pub lamp: LampColor,
    /// Reference tone, present only in diapason modes.
    pub tone: Option<ToneSpec>,
}

impl Feedback {
    /// Everything off (mode-select screen, or before the first reading).
    pub fn idle() -> Self {
        Self {
            glyph: None,
            lamp: LampColor::Off,
            tone: None,
        }
    }

    /// Tuner-mode feedback for one pitch reading.
    ///
    /// A silent verdict clears the glyph even when a stale note is passed
    /// in — feedback must never hold a note the microphone no longer hears.
    pub fn for_reading(note: Option<Note>, verdict: TuningVerdict) -> Self {
        let glyph = match (note, verdict) {
            (_, TuningVerdict::Silent) | (None, _) => None,
            (Some(note), _) => Some(note.glyph()),
        };
        Self {
            glyph,
            lamp: LampColor::from_verdict(verdict),
            tone: None,
        }
    }

    /// Diapason-mode feedback: the A glyph plus the reference tone.
    pub fn reference(tone: ToneSpec) -> Self {
        Self {
            glyph: Some(Note::A.glyph()),
            lamp: LampColor::Off,
            tone: Some(tone),
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Lamp mapping ─────────────────────────────────────────────────

    #[test]
    fn verdicts_map_to_the_spec_colors() {
        assert_eq!(
            LampColor::from_verdict(TuningVerdict::InTune),
            LampColor::Green
        );
        assert_eq!(LampColor::from_verdict(TuningVerdict::Flat), LampColor::Amber);
        assert_eq!(LampColor::from_verdict(TuningVerdict::Sharp), LampColor::Red);
        assert_eq!(
            LampColor::from_verdict(TuningVerdict::Silent),
            LampColor::Off
        );
    }

    #[test]
    fn amber_is_red_plus_green() {
        assert_eq!(LampColor::Amber.channels(), (true, true, false));
        assert_eq!(LampColor::Green.channels(), (false, true, false));
        assert_eq!(LampColor::Red.channels(), (true, false, false));
        assert_eq!(LampColor::Off.channels(), (false, false, false));
    }

    // ── Tone derivation ──────────────────────────────────────────────

    #[test]
    fn concert_a_fits_the_counter_at_125_mhz() {
        let tone = ToneSpec::square(440.0, 125_000_000);
        assert_eq!(tone.clock_div, 5);
        assert_eq!(tone.wrap, 56_818);
        // ≈ 0.8 % duty.
        assert_eq!(tone.level, tone.wrap / 128);
        assert!(tone.level > 0);
    }

    #[test]
    fn derived_period_reproduces_the_frequency() {
        for freq in [261.63f32, 440.0, 493.88] {
            let tone = ToneSpec::square(freq, 125_000_000);
            let actual =
                125_000_000.0 / (tone.clock_div as f32 * tone.wrap as f32);
            let error = (actual - freq) / freq;
            assert!(error.abs() < 0.001, "{} Hz off by {}", freq, error);
        }
    }

    #[test]
    fn high_frequencies_use_unit_divider() {
        let tone = ToneSpec::square(10_000.0, 125_000_000);
        assert_eq!(tone.clock_div, 1);
        assert_eq!(tone.wrap, 12_500);
    }

    // ── Feedback frames ──────────────────────────────────────────────

    #[test]
    fn in_tune_reading_shows_the_note_glyph() {
        let fb = Feedback::for_reading(Some(Note::A), TuningVerdict::InTune);
        assert_eq!(fb.glyph, Some(Note::A.glyph()));
        assert_eq!(fb.lamp, LampColor::Green);
        assert!(fb.tone.is_none());
    }

    #[test]
    fn silent_reading_clears_everything() {
        // Even with a stale note attached.
        let fb = Feedback::for_reading(Some(Note::G), TuningVerdict::Silent);
        assert_eq!(fb.glyph, None);
        assert_eq!(fb.lamp, LampColor::Off);
    }

    #[test]
    fn missing_note_never_lights_the_matrix() {
        let fb = Feedback::for_reading(None, TuningVerdict::InTune);
        assert_eq!(fb.glyph, None);
    }

    #[test]
    fn reference_frame_carries_the_a_glyph_and_tone() {
        let fb = Feedback::reference(ToneSpec::square(440.0, 125_000_000));
        assert_eq!(fb.glyph, Some(Note::A.glyph()));
        assert!(fb.tone.is_some());
    }
}
