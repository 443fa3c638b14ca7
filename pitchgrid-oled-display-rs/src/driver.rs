//! SSD1306 lifecycle wrapper.
//!
//! [`Oled`] owns the display in async buffered-graphics mode: construction
//! generates no I2C traffic, [`Oled::init`] sends the initialisation
//! sequence once, and [`Oled::show`] renders a [`Screen`] into the frame
//! buffer and flushes it to hardware.

use display_interface_i2c::I2CInterface;
use embedded_hal_async::i2c::I2c;
use ssd1306::{
    mode::BufferedGraphicsModeAsync, prelude::*, I2CDisplayInterface, Ssd1306Async,
};

use crate::error::OledError;
use crate::screens::{render_screen, Screen, ScreenLayout};

/// Concrete display type used internally by [`Oled`].
type Display<I2C> = Ssd1306Async<
    I2CInterface<I2C>,
    DisplaySize128x64,
    BufferedGraphicsModeAsync<DisplaySize128x64>,
>;

/// Async driver for the SSD1306 128×64 status display over I2C.
///
/// # Lifecycle
///
/// 1. [`Oled::new()`] — constructs the driver; no I2C traffic.
/// 2. [`Oled::init()`] — sends the SSD1306 initialisation sequence.
/// 3. [`Oled::show()`] — clears the buffer, renders a [`Screen`], flushes.
///
/// Every display operation before a successful `init()` fails with
/// [`OledError::NotInitialized`].
///
/// # Example
///
/// ```no_run
/// use pitchgrid::state::MenuChoice;
/// use pitchgrid_oled_display_rs::{Oled, Screen, ScreenLayout};
///
/// # async fn example(i2c: impl embedded_hal_async::i2c::I2c) {
/// let mut oled = Oled::new(i2c, 0x3C);
/// oled.init().await.unwrap();
/// let screen = Screen::ModeSelect { choice: MenuChoice::Tuner };
/// oled.show(&screen, &ScreenLayout::default()).await.unwrap();
/// # }
/// ```
pub struct Oled<I2C> {
    display: Display<I2C>,
    initialized: bool,
}

impl<I2C> Oled<I2C>
where
    I2C: I2c,
{
    /// Construct an uninitialised driver for the display at `address`
    /// (typically `0x3C` or `0x3D`).
    pub fn new(i2c: I2C, address: u8) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(i2c, address);
        let display =
            Ssd1306Async::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
                .into_buffered_graphics_mode();

        Self {
            display,
            initialized: false,
        }
    }

    /// Send the SSD1306 initialisation sequence. Must succeed once before
    /// any rendering.
    pub async fn init(&mut self) -> Result<(), OledError> {
        self.display
            .init()
            .await
            .map_err(|_| OledError::InitializationFailed)?;
        self.initialized = true;
        Ok(())
    }

    /// Render `screen` into the frame buffer and flush it to hardware.
    ///
    /// The flush transfers the full 1 KiB buffer — roughly 20 ms at
    /// 400 kHz — so callers gate this on a screen change.
    pub async fn show(
        &mut self,
        screen: &Screen,
        layout: &ScreenLayout,
    ) -> Result<(), OledError> {
        if !self.initialized {
            return Err(OledError::NotInitialized);
        }
        self.display.clear_buffer();
        render_screen(&mut self.display, screen, layout)?;
        self.display.flush().await?;
        Ok(())
    }

    /// Clear the display (buffer and hardware).
    pub async fn clear(&mut self) -> Result<(), OledError> {
        if !self.initialized {
            return Err(OledError::NotInitialized);
        }
        self.display.clear_buffer();
        self.display.flush().await?;
        Ok(())
    }

    /// Whether `init()` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
