//! button_mirror - two buttons mirrored onto two LEDs.
//!
//! Polls Button 1/2 every 100 ms and drives LED 1/2 to match. Pins are
//! the nRF52840-DK ones, all active-low.

#![no_std]
#![no_main]

use core::convert::Infallible;

use central_uart::config::MIRROR_POLL_MS;
use central_uart::mirror::{DeclaredPin, Mirror, Polarity};
use defmt::{error, info, trace, warn};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive, Pin, Pull};
use embassy_time::{Duration, Timer};
use embedded_hal::digital::PinState;
// Critical-section provider for both images; this image also needs S140 flashed.
use nrf_softdevice as _;
use {defmt_rtt as _, panic_probe as _};

/// A DK pin with its devicetree-style polarity.
struct BoardPin {
    pin: AnyPin,
    polarity: Polarity,
}

impl BoardPin {
    fn active_low(pin: AnyPin) -> Self {
        Self {
            pin,
            polarity: Polarity::ActiveLow,
        }
    }
}

impl DeclaredPin for BoardPin {
    type Input = Input<'static>;
    type Output = Output<'static>;
    type Error = Infallible;

    fn is_ready(&self) -> bool {
        // nRF GPIO ports have no separate bring-up.
        true
    }

    fn polarity(&self) -> Polarity {
        self.polarity
    }

    fn into_input(self) -> Result<Input<'static>, Infallible> {
        let pull = match self.polarity {
            Polarity::ActiveLow => Pull::Up,
            Polarity::ActiveHigh => Pull::Down,
        };
        Ok(Input::new(self.pin, pull))
    }

    fn into_output(self, initial: PinState) -> Result<Output<'static>, Infallible> {
        let level = match initial {
            PinState::High => Level::High,
            PinState::Low => Level::Low,
        };
        Ok(Output::new(self.pin, level, OutputDrive::Standard))
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());

    let buttons = [
        BoardPin::active_low(p.P0_11.degrade()),
        BoardPin::active_low(p.P0_12.degrade()),
    ];
    let leds = [
        BoardPin::active_low(p.P0_13.degrade()),
        BoardPin::active_low(p.P0_14.degrade()),
    ];

    let mut mirror = match Mirror::init(buttons, leds) {
        Ok(mirror) => mirror,
        Err(e) => {
            error!("GPIO setup failed: {} (code {})", e, e.code());
            return;
        }
    };
    info!("Mirroring buttons to LEDs every {} ms", MIRROR_POLL_MS);

    loop {
        match mirror.poll() {
            Ok([b0, b1]) => trace!("buttons {} {}", b0, b1),
            Err(e) => warn!("GPIO poll failed: {}", e),
        }
        Timer::after(Duration::from_millis(MIRROR_POLL_MS)).await;
    }
}
