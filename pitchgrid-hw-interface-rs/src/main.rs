//! pitchgrid-hw-interface
//!
//! Firmware for the pitchgrid tuner on the Raspberry Pi Pico (RP2040).
//! Wires the three library crates into the live device loop:
//!
//! 1. Button A / button B fire falling edges; two edge-wait tasks debounce
//!    them and post `Confirm` / `Back` into the shared event latch.
//! 2. The main loop owns the `ModeMachine`. Each iteration it drains the
//!    latch, polls the joystick zones for menu navigation, and (in tuner
//!    mode) captures one microphone window through the ADC.
//! 3. The resulting feedback frame drives the 5×5 WS2812 matrix over PIO,
//!    the tri-color lamp GPIOs, and the buzzer PWM slice; the SSD1306
//!    shows the per-mode status screen.
//!
//! Peripheral initialisation failure is fatal: the device cannot tune
//! without its sensors, so the loop never starts.

#![no_std]
#![no_main]

use defmt::{error, info, warn};
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{I2C1, PIO0};
use embassy_rp::pio::{self, Pio};
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_rp::pwm::{self, Pwm};
use embassy_time::{Duration, Instant, Ticker, Timer};
use fixed::traits::ToFixed;
use smart_leds::RGB8;
use {defmt_rtt as _, panic_probe as _};

use matrix_frame::{Frame, Rgb, NUM_CELLS};
use pitchgrid::feedback::{Feedback, ToneSpec};
use pitchgrid::input::{DebouncedButton, EventLatch, InputEvent};
use pitchgrid::pitch::PitchConfig;
use pitchgrid::state::{ModeMachine, SystemState, TunerConfig};
use pitchgrid_oled_display_rs::{Oled, Screen, ScreenLayout};

// ---------------------------------------------------------------------------
// Interrupt binding
// ---------------------------------------------------------------------------

bind_interrupts!(struct Irqs {
    ADC_IRQ_FIFO => adc::InterruptHandler;
    I2C1_IRQ => i2c::InterruptHandler<I2C1>;
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
});

// ---------------------------------------------------------------------------
// Shared state and deployment constants
// ---------------------------------------------------------------------------

/// Button events posted by the edge-wait tasks, taken by the main loop.
/// The only mutable state shared across execution contexts.
static EVENTS: EventLatch = EventLatch::new();

/// RP2040 system clock, the base for the PWM tone derivation.
const SYS_CLOCK_HZ: u32 = 125_000_000;

/// Capture buffer length. Must match `PitchConfig::window_len`.
const WINDOW_LEN: usize = 512;

/// Glyph color on the matrix: amber, scaled well below full brightness.
const GLYPH_COLOR: Rgb = Rgb::new(64, 64, 0);

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Interrupt-style button monitoring.
///
/// Waits for the falling edge (buttons are active-low with pull-ups),
/// debounces it, and posts the accepted event into [`EVENTS`]. The main
/// loop never touches the pin; this task never touches the machine.
#[embassy_executor::task(pool_size = 2)]
async fn button_task(mut pin: Input<'static>, mut button: DebouncedButton) {
    info!("button task started: {}", button.event());
    loop {
        pin.wait_for_falling_edge().await;
        let now = Instant::now().as_millis();
        if let Some(event) = button.poll(pin.is_low(), now) {
            EVENTS.post(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Fill one sample window from the microphone ADC at the configured rate.
///
/// Blocks the calling context for the full window duration (512 samples at
/// 4 kHz ≈ 128 ms); no other tuning activity proceeds during a capture and
/// there is no cancellation. A failed conversion contributes a midpoint
/// sample rather than aborting the window.
async fn capture_window(
    adc: &mut Adc<'static, adc::Async>,
    mic: &mut AdcChannel<'static>,
    window: &mut [u16; WINDOW_LEN],
    config: &PitchConfig,
) {
    let mut ticker = Ticker::every(Duration::from_micros(config.sample_period_us()));
    for slot in window.iter_mut() {
        *slot = match adc.read(mic).await {
            Ok(sample) => sample,
            Err(_) => config.midpoint,
        };
        ticker.next().await;
    }
}

// ---------------------------------------------------------------------------
// Output application
// ---------------------------------------------------------------------------

/// Apply a tone change to the buzzer slice.
///
/// `None` disables the slice output entirely. Writing a zero compare level
/// instead would hold the pin driven and leave a DC bias on the piezo.
fn apply_tone(buzzer: &mut Pwm<'static>, tone: Option<ToneSpec>) {
    let mut config = pwm::Config::default();
    match tone {
        Some(spec) => {
            config.divider = spec.clock_div.to_fixed();
            config.top = spec.wrap;
            config.compare_b = spec.level;
            config.enable = true;
        }
        None => {
            config.enable = false;
        }
    }
    buzzer.set_config(&config);
}

/// Drive the tri-color lamp GPIOs from a feedback frame.
fn apply_lamp(
    feedback: &Feedback,
    red: &mut Output<'static>,
    green: &mut Output<'static>,
    blue: &mut Output<'static>,
) {
    let (r, g, b) = feedback.lamp.channels();
    red.set_level(Level::from(r));
    green.set_level(Level::from(g));
    blue.set_level(Level::from(b));
}

/// Build the matrix frame for a feedback state.
fn matrix_frame(feedback: &Feedback) -> Frame {
    match feedback.glyph {
        Some(glyph) => Frame::from_glyph(glyph, GLYPH_COLOR),
        None => Frame::new(),
    }
}

/// Build the status screen for the current machine state.
fn screen_for(machine: &ModeMachine) -> Screen {
    match machine.state() {
        SystemState::ModeSelect => Screen::ModeSelect {
            choice: machine.choice(),
        },
        SystemState::Tuner => {
            let (note, verdict) = match machine.reading() {
                Some(reading) => (reading.note, reading.verdict),
                None => (None, pitchgrid::pitch::TuningVerdict::Silent),
            };
            Screen::Tuner { note, verdict }
        }
        SystemState::Diapason => Screen::Diapason { playing: false },
        SystemState::DiapasonPlaying => Screen::Diapason { playing: true },
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("pitchgrid-hw-interface starting");

    let tuner_config = TunerConfig::default();
    let pitch_config = PitchConfig::default();
    // Config violations are programming errors; never start the loop on one.
    if let Err(e) = pitch_config.validate() {
        defmt::panic!("invalid pitch config: {}", e);
    }
    defmt::assert_eq!(pitch_config.window_len, WINDOW_LEN);

    // —— Pin assignments ————————————————————————————————————————————————
    // BTN_A  → GP5   active-low, pull-up     BTN_B   → GP6
    // WS2812 → GP7 (PIO0)                    LAMP_G  → GP11
    // LAMP_B → GP12                          LAMP_R  → GP13
    // I2C1   → SDA GP14, SCL GP15            BUZZER  → GP21 (PWM2 B)
    // JOY_Y  → GP26 (ADC0)                   MIC     → GP28 (ADC2)
    // ————————————————————————————————————————————————————————————————————

    // Buttons, interrupt-style discipline: each has its own edge-wait task.
    let button_a = Input::new(p.PIN_5, Pull::Up);
    let button_b = Input::new(p.PIN_6, Pull::Up);
    spawner
        .spawn(button_task(
            button_a,
            DebouncedButton::new(InputEvent::Confirm, tuner_config.button_debounce_ms),
        ))
        .unwrap();
    spawner
        .spawn(button_task(
            button_b,
            DebouncedButton::new(InputEvent::Back, tuner_config.button_debounce_ms),
        ))
        .unwrap();

    // ADC, shared between the microphone and the joystick axis. Reads are
    // issued one at a time from this loop only.
    let mut adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let mut mic = AdcChannel::new_pin(p.PIN_28, Pull::None);
    let mut joystick = AdcChannel::new_pin(p.PIN_26, Pull::None);

    // Joystick tilt as two virtual buttons through the same debounce path,
    // with the longer interval acting as tilt-repeat suppression.
    let mut joy_up = DebouncedButton::new(InputEvent::SelectPrev, tuner_config.select_debounce_ms);
    let mut joy_down =
        DebouncedButton::new(InputEvent::SelectNext, tuner_config.select_debounce_ms);

    // Buzzer PWM slice, output disabled until a mode enables the tone.
    let mut tone_off = pwm::Config::default();
    tone_off.enable = false;
    let mut buzzer = Pwm::new_output_b(p.PWM_SLICE2, p.PIN_21, tone_off);
    let reference_tone = ToneSpec::square(pitch_config.reference_a_hz, SYS_CLOCK_HZ);

    // Tri-color lamp.
    let mut lamp_red = Output::new(p.PIN_13, Level::Low);
    let mut lamp_green = Output::new(p.PIN_11, Level::Low);
    let mut lamp_blue = Output::new(p.PIN_12, Level::Low);

    // WS2812 matrix over PIO0.
    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let ws2812_program = PioWs2812Program::new(&mut common);
    let mut matrix: PioWs2812<'_, PIO0, 0, NUM_CELLS> =
        PioWs2812::new(&mut common, sm0, p.DMA_CH0, p.PIN_7, &ws2812_program);

    // SSD1306 status display on I2C1. Init failure is fatal.
    let i2c = I2c::new_async(p.I2C1, p.PIN_15, p.PIN_14, Irqs, i2c::Config::default());
    let mut oled = Oled::new(i2c, 0x3C);
    if let Err(e) = oled.init().await {
        error!("OLED init failed: {}", e);
        loop {
            Timer::after_secs(1).await;
        }
    }
    let layout = ScreenLayout::default();

    let mut machine = ModeMachine::new(&tuner_config, pitch_config.clone());
    let mut window = [0u16; WINDOW_LEN];

    // Cached outputs; peripherals are rewritten only on change so repeated
    // entries into the same state stay idempotent at the hardware level.
    let mut shown_screen: Option<Screen> = None;
    let mut shown_frame: Option<Frame> = None;
    let mut active_tone: Option<ToneSpec> = None;

    info!("entering main loop");
    loop {
        let now = Instant::now().as_millis();

        // Latched button events (interrupt discipline).
        if let Some(event) = EVENTS.take() {
            machine.handle_event(event, now);
        }

        // Joystick zones (polled discipline).
        let axis = adc
            .read(&mut joystick)
            .await
            .unwrap_or(pitch_config.midpoint);
        if let Some(event) = joy_up.poll(axis < tuner_config.joystick_low, now) {
            machine.handle_event(event, now);
        }
        if let Some(event) = joy_down.poll(axis > tuner_config.joystick_high, now) {
            machine.handle_event(event, now);
        }

        machine.poll_auto_return(now);

        // One estimation pass per iteration while tuning. The capture
        // blocks this loop for the full window by design.
        if machine.state() == SystemState::Tuner {
            capture_window(&mut adc, &mut mic, &mut window, &pitch_config).await;
            machine.process_window(&window);
        }

        // Render the three feedback channels.
        let feedback = match machine.state() {
            SystemState::ModeSelect => Feedback::idle(),
            SystemState::Tuner => match machine.reading() {
                Some(reading) => Feedback::for_reading(reading.note, reading.verdict),
                None => Feedback::idle(),
            },
            SystemState::Diapason | SystemState::DiapasonPlaying => {
                Feedback::reference(reference_tone)
            }
        };

        let frame = matrix_frame(&feedback);
        if shown_frame != Some(frame) {
            let mut colors = [RGB8::default(); NUM_CELLS];
            for (color, cell) in colors.iter_mut().zip(frame.cells()) {
                *color = RGB8::new(cell.r, cell.g, cell.b);
            }
            matrix.write(&colors).await;
            shown_frame = Some(frame);
        }

        apply_lamp(&feedback, &mut lamp_red, &mut lamp_green, &mut lamp_blue);

        let tone = if machine.tone_enabled() {
            feedback.tone
        } else {
            None
        };
        if active_tone != tone {
            apply_tone(&mut buzzer, tone);
            active_tone = tone;
        }

        let screen = screen_for(&machine);
        if shown_screen != Some(screen) {
            // A failed flush keeps the previous frame on the panel; retry
            // on the next change rather than stalling the loop.
            match oled.show(&screen, &layout).await {
                Ok(()) => shown_screen = Some(screen),
                Err(e) => warn!("OLED update failed: {}", e),
            }
        }

        Timer::after_millis(tuner_config.loop_period_ms).await;
    }
}
