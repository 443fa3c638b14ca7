//! Run one synthetic estimation pass on the host and print the result.
//!
//! ```text
//! cargo run --example sine_pass
//! ```

use pitchgrid::pitch::{estimate, PitchConfig};

fn main() {
    let cfg = PitchConfig::default();

    // 440 Hz sine, one window at the configured rate.
    let mut window = vec![2048u16; cfg.window_len];
    for (i, slot) in window.iter_mut().enumerate() {
        let phase = core::f32::consts::TAU * 440.0 * i as f32 / cfg.sample_rate_hz as f32;
        *slot = (2048.0 + 1000.0 * phase.sin()) as u16;
    }

    let reading = estimate(&window, 0.0, &cfg);
    println!(
        "estimate: {:.1} Hz  note: {:?}  verdict: {:?}",
        reading.estimate, reading.note, reading.verdict
    );
}
