//! Zero-crossing frequency estimation and nearest-note matching.

use libm::fabsf;

use super::config::PitchConfig;
use super::notes::Note;

/// Categorical judgment of one estimation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TuningVerdict {
    /// Estimate below the target tolerance band.
    Flat,
    /// Estimate above the target tolerance band.
    Sharp,
    /// Estimate within ±tolerance of the target.
    InTune,
    /// Window too quiet or too ambiguous to estimate.
    Silent,
}

/// Result of one estimation pass.
///
/// On [`TuningVerdict::Silent`] the `estimate` field carries the *previous*
/// smoothed value unchanged (freeze, not decay) and `note` is `None` — the
/// caller clears feedback instead of holding a stale note.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PitchReading {
    /// Smoothed frequency estimate in Hz.
    pub estimate: f32,
    /// Nearest natural note, absent when silent.
    pub note: Option<Note>,
    /// Tuning verdict for this pass.
    pub verdict: TuningVerdict,
}

impl PitchReading {
    fn silent(held_estimate: f32) -> Self {
        Self {
            estimate: held_estimate,
            note: None,
            verdict: TuningVerdict::Silent,
        }
    }
}

// ── Pipeline stages ──────────────────────────────────────────────────────

/// Count rising transitions across the midpoint value.
fn rising_crossings(window: &[u16], midpoint: u16) -> u32 {
    let mut count = 0;
    for pair in window.windows(2) {
        if pair[0] < midpoint && pair[1] >= midpoint {
            count += 1;
        }
    }
    count
}

/// Peak-to-peak amplitude of the window.
fn peak_to_peak(window: &[u16]) -> u16 {
    let mut min = u16::MAX;
    let mut max = u16::MIN;
    for &sample in window {
        min = min.min(sample);
        max = max.max(sample);
    }
    max.saturating_sub(min)
}

/// Fold a raw frequency into the instrument register.
///
/// Zero-crossing counting cannot tell a fundamental from its octave
/// multiples, so estimates are rescaled by powers of two toward the band
/// `[fold_mid, fold_high)`: anything at or above `fold_high` is halved
/// until it drops below, `[fold_low, fold_mid)` is doubled once, and
/// anything below `fold_low` is quadrupled once. Frequencies already in
/// `[fold_mid, fold_high)` pass through unchanged.
pub fn fold_to_register(mut f: f32, cfg: &PitchConfig) -> f32 {
    if f >= cfg.fold_high_hz {
        while f >= cfg.fold_high_hz {
            f *= 0.5;
        }
    } else if f < cfg.fold_low_hz {
        f *= 4.0;
    } else if f < cfg.fold_mid_hz {
        f *= 2.0;
    }
    f
}

/// Rescale `target` by powers of two until it sits within a factor of √2
/// of `anchor`, so octave errors in either direction do not bias the
/// nearest-note comparison. `anchor` must be positive.
fn fold_toward(mut target: f32, anchor: f32) -> f32 {
    const SQRT2: f32 = core::f32::consts::SQRT_2;
    while target > anchor * SQRT2 {
        target *= 0.5;
    }
    while target < anchor / SQRT2 {
        target *= 2.0;
    }
    target
}

/// Find the natural note whose (register-folded) target frequency is
/// closest to `estimate`. Returns the note and its folded target.
fn nearest_note(estimate: f32, cfg: &PitchConfig) -> (Note, f32) {
    let mut best = Note::A;
    let mut best_target = cfg.reference_a_hz;
    let mut best_diff = f32::INFINITY;

    for note in Note::ALL {
        let target = fold_toward(note.target_hz(cfg.reference_a_hz), estimate);
        let diff = fabsf(estimate - target);
        if diff < best_diff {
            best = note;
            best_target = target;
            best_diff = diff;
        }
    }
    (best, best_target)
}

// ── Estimation pass ──────────────────────────────────────────────────────

/// Run one full estimation pass over a sample window.
///
/// `prev_estimate` is the smoothed value from the previous pass; a
/// non-positive value (the post-reset state) seeds the average directly
/// from this window instead of dragging the result toward zero.
///
/// Silence — low amplitude, fewer than `min_crossings` transitions, or a
/// non-positive raw frequency — short-circuits before folding and matching
/// run, holding `prev_estimate` unchanged.
pub fn estimate(window: &[u16], prev_estimate: f32, cfg: &PitchConfig) -> PitchReading {
    if window.len() < 2 {
        return PitchReading::silent(prev_estimate);
    }
    if peak_to_peak(window) < cfg.silence_threshold {
        return PitchReading::silent(prev_estimate);
    }

    let crossings = rising_crossings(window, cfg.midpoint);
    if crossings < cfg.min_crossings {
        return PitchReading::silent(prev_estimate);
    }

    // One rising crossing per cycle: f = crossings · rate / len, then the
    // deployment calibration scale.
    let raw =
        crossings as f32 * cfg.sample_rate_hz as f32 / window.len() as f32 * cfg.calibration;
    if raw <= 0.0 {
        return PitchReading::silent(prev_estimate);
    }

    let folded = fold_to_register(raw, cfg);
    let smoothed = if prev_estimate > 0.0 {
        cfg.smoothing * folded + (1.0 - cfg.smoothing) * prev_estimate
    } else {
        folded
    };

    let (note, target) = nearest_note(smoothed, cfg);
    let diff = smoothed - target;
    let verdict = if fabsf(diff) <= cfg.tolerance_hz {
        TuningVerdict::InTune
    } else if diff < 0.0 {
        TuningVerdict::Flat
    } else {
        TuningVerdict::Sharp
    };

    PitchReading {
        estimate: smoothed,
        note: Some(note),
        verdict,
    }
}

// ── Stateful wrapper ─────────────────────────────────────────────────────

/// Owns the smoothed estimate across passes.
///
/// The lifecycle follows the tuner mode: [`reset`](Self::reset) on mode
/// entry zeroes the estimate, then [`process`](Self::process) updates it
/// once per captured window.
#[derive(Debug, Clone)]
pub struct PitchEstimator {
    config: PitchConfig,
    smoothed: f32,
}

impl PitchEstimator {
    /// Create an estimator with a zeroed estimate.
    pub fn new(config: PitchConfig) -> Self {
        Self {
            config,
            smoothed: 0.0,
        }
    }

    /// Zero the smoothed estimate (tuner-mode entry).
    pub fn reset(&mut self) {
        self.smoothed = 0.0;
    }

    /// Run one pass and fold the result into the smoothed state.
    pub fn process(&mut self, window: &[u16]) -> PitchReading {
        let reading = estimate(window, self.smoothed, &self.config);
        self.smoothed = reading.estimate;
        reading
    }

    /// Current smoothed estimate in Hz (0 after a reset).
    pub fn smoothed(&self) -> f32 {
        self.smoothed
    }

    /// The estimator's configuration.
    pub fn config(&self) -> &PitchConfig {
        &self.config
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use libm::sinf;

    const TAU: f32 = core::f32::consts::TAU;

    /// Synthesize a 512-sample sine window around the 12-bit midpoint.
    fn sine_window(freq_hz: f32, rate_hz: f32, amplitude: f32) -> [u16; 512] {
        let mut window = [2048u16; 512];
        for (i, slot) in window.iter_mut().enumerate() {
            let phase = TAU * freq_hz * i as f32 / rate_hz;
            *slot = (2048.0 + amplitude * sinf(phase)) as u16;
        }
        window
    }

    // ── Reference signal ─────────────────────────────────────────────

    #[test]
    fn pure_a440_reads_in_tune() {
        let cfg = PitchConfig::default();
        let window = sine_window(440.0, 4000.0, 1000.0);

        let reading = estimate(&window, 0.0, &cfg);
        assert_eq!(reading.note, Some(Note::A));
        assert_eq!(reading.verdict, TuningVerdict::InTune);
        assert!(
            fabsf(reading.estimate - 440.0) <= 6.0,
            "estimate {} too far from 440",
            reading.estimate
        );
    }

    #[test]
    fn middle_c_matches_note_c() {
        let cfg = PitchConfig::default();
        let window = sine_window(261.63, 4000.0, 1000.0);

        let reading = estimate(&window, 0.0, &cfg);
        assert_eq!(reading.note, Some(Note::C));
    }

    // ── Silence paths ────────────────────────────────────────────────

    #[test]
    fn constant_window_is_silent_and_holds_the_estimate() {
        let cfg = PitchConfig::default();
        let window = [2048u16; 512];

        let reading = estimate(&window, 123.4, &cfg);
        assert_eq!(reading.verdict, TuningVerdict::Silent);
        assert_eq!(reading.note, None);
        assert_eq!(reading.estimate, 123.4);
    }

    #[test]
    fn quiet_sine_below_threshold_is_silent() {
        let cfg = PitchConfig::default();
        // Peak-to-peak ≈ 120 < 130 threshold.
        let window = sine_window(440.0, 4000.0, 60.0);

        let reading = estimate(&window, 0.0, &cfg);
        assert_eq!(reading.verdict, TuningVerdict::Silent);
    }

    #[test]
    fn loud_but_single_transition_is_silent() {
        let cfg = PitchConfig::default();
        // A step: one rising crossing, huge amplitude.
        let mut window = [500u16; 512];
        for slot in window.iter_mut().skip(256) {
            *slot = 3500;
        }

        let reading = estimate(&window, 0.0, &cfg);
        assert_eq!(reading.verdict, TuningVerdict::Silent);
    }

    #[test]
    fn empty_and_single_sample_windows_are_silent() {
        let cfg = PitchConfig::default();
        assert_eq!(estimate(&[], 7.0, &cfg).verdict, TuningVerdict::Silent);
        assert_eq!(estimate(&[2048], 7.0, &cfg).verdict, TuningVerdict::Silent);
    }

    // ── Octave folding ───────────────────────────────────────────────

    #[test]
    fn folding_is_identity_on_the_target_band() {
        let cfg = PitchConfig::default();
        let mut f = 250.0;
        while f < 500.0 {
            assert_eq!(fold_to_register(f, &cfg), f);
            f += 7.3;
        }
    }

    #[test]
    fn high_frequencies_halve_into_the_band() {
        let cfg = PitchConfig::default();
        assert_eq!(fold_to_register(880.0, &cfg), 440.0);
        // Two octaves up still lands in band.
        let folded = fold_to_register(1760.0, &cfg);
        assert!((250.0..500.0).contains(&folded));
    }

    #[test]
    fn low_bands_are_boosted() {
        let cfg = PitchConfig::default();
        assert_eq!(fold_to_register(130.0, &cfg), 260.0);
        assert_eq!(fold_to_register(100.0, &cfg), 400.0);
    }

    #[test]
    fn octave_doubled_input_still_matches_a() {
        let cfg = PitchConfig::default();
        // A5 at 880 Hz folds onto the A4 register.
        let window = sine_window(880.0, 4000.0, 1000.0);

        let reading = estimate(&window, 0.0, &cfg);
        assert_eq!(reading.note, Some(Note::A));
    }

    // ── Target folding in the note match ─────────────────────────────

    #[test]
    fn estimate_near_band_bottom_matches_folded_b() {
        let cfg = PitchConfig::default();
        // 250 Hz is closest to B3 (246.94), reachable only by folding the
        // B4 target down an octave.
        let (note, target) = nearest_note(250.0, &cfg);
        assert_eq!(note, Note::B);
        assert!(fabsf(target - 246.94) < 0.01);
    }

    // ── Smoothing ────────────────────────────────────────────────────

    #[test]
    fn zero_prior_seeds_from_the_window() {
        let cfg = PitchConfig::default();
        let window = sine_window(440.0, 4000.0, 1000.0);

        let reading = estimate(&window, 0.0, &cfg);
        // Without seeding, α = 0.1 would report ≈ 44 Hz here.
        assert!(reading.estimate > 400.0);
    }

    #[test]
    fn nonzero_prior_is_exponentially_blended() {
        let cfg = PitchConfig::default();
        let window = sine_window(440.0, 4000.0, 1000.0);

        let seeded = estimate(&window, 0.0, &cfg).estimate;
        let blended = estimate(&window, 400.0, &cfg).estimate;
        let expected = cfg.smoothing * seeded + (1.0 - cfg.smoothing) * 400.0;
        assert!(fabsf(blended - expected) < 0.01);
    }

    #[test]
    fn estimator_converges_over_repeated_passes() {
        let cfg = PitchConfig::default();
        let window = sine_window(440.0, 4000.0, 1000.0);
        let mut est = PitchEstimator::new(cfg);

        // Pull the state away from the signal, then let passes converge.
        est.smoothed = 300.0;
        let mut last = PitchReading::silent(0.0);
        for _ in 0..60 {
            last = est.process(&window);
        }
        assert_eq!(last.note, Some(Note::A));
        assert_eq!(last.verdict, TuningVerdict::InTune);
    }

    #[test]
    fn silent_pass_freezes_the_estimator_state() {
        let cfg = PitchConfig::default();
        let sine = sine_window(440.0, 4000.0, 1000.0);
        let quiet = [2048u16; 512];
        let mut est = PitchEstimator::new(cfg);

        est.process(&sine);
        let before = est.smoothed();
        est.process(&quiet);
        assert_eq!(est.smoothed(), before);
    }

    #[test]
    fn reset_zeroes_the_estimate() {
        let cfg = PitchConfig::default();
        let sine = sine_window(440.0, 4000.0, 1000.0);
        let mut est = PitchEstimator::new(cfg);

        est.process(&sine);
        assert!(est.smoothed() > 0.0);
        est.reset();
        assert_eq!(est.smoothed(), 0.0);
    }

    // ── Verdict edges ────────────────────────────────────────────────

    #[test]
    fn flat_and_sharp_verdicts() {
        let cfg = PitchConfig::default();

        // 425 Hz: well under A4 but still closer to A than to G.
        let window = sine_window(425.0, 4000.0, 1000.0);
        let reading = estimate(&window, 0.0, &cfg);
        assert_eq!(reading.note, Some(Note::A));
        assert_eq!(reading.verdict, TuningVerdict::Flat);

        // 460 Hz: 20 Hz over A4.
        let window = sine_window(460.0, 4000.0, 1000.0);
        let reading = estimate(&window, 0.0, &cfg);
        assert_eq!(reading.note, Some(Note::A));
        assert_eq!(reading.verdict, TuningVerdict::Sharp);
    }
}
