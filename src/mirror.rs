//! Button → LED mirror.
//!
//! Two inputs drive two outputs 1:1. Each poll reads both buttons and
//! writes their logical value to the matching LED; no debouncing, no
//! edge detection. Values are logical: an active-low button that is
//! pressed reads `true`, and writing `true` lights an active-low LED.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::error::{Error, GpioError, PinRole};

/// Electrical meaning of "active" for a pin, as the board declares it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Logical value of a pin reading.
    pub fn is_active(self, high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => high,
            Polarity::ActiveLow => !high,
        }
    }

    /// Electrical level that represents `active`.
    pub fn level(self, active: bool) -> PinState {
        PinState::from(self.is_active(active))
    }
}

/// A pin declared by the board but not yet configured.
///
/// Its port may not be ready; configuring it consumes the declaration
/// and yields an `embedded-hal` pin.
pub trait DeclaredPin {
    type Input: InputPin;
    type Output: OutputPin;
    type Error;

    /// Whether the GPIO port backing this pin is usable.
    fn is_ready(&self) -> bool;

    fn polarity(&self) -> Polarity;

    fn into_input(self) -> Result<Self::Input, Self::Error>;

    /// Configure as output, driven to `initial` immediately.
    fn into_output(self, initial: PinState) -> Result<Self::Output, Self::Error>;
}

struct Channel<I, O> {
    input: I,
    input_polarity: Polarity,
    input_role: PinRole,
    output: O,
    output_polarity: Polarity,
    output_role: PinRole,
}

/// The configured mirror: button0 → led0, button1 → led1.
pub struct Mirror<I, O> {
    channels: [Channel<I, O>; 2],
}

impl<I: InputPin, O: OutputPin> Mirror<I, O> {
    /// Check and configure all four pins.
    ///
    /// Readiness is checked for led0, led1, button0, button1 in that order
    /// before anything is configured. LEDs come up driven active.
    pub fn init<B, L>(buttons: [B; 2], leds: [L; 2]) -> Result<Self, Error>
    where
        B: DeclaredPin<Input = I>,
        L: DeclaredPin<Output = O>,
    {
        let [led0, led1] = leds;
        let [button0, button1] = buttons;

        ensure_ready(&led0, PinRole::Led0)?;
        ensure_ready(&led1, PinRole::Led1)?;
        ensure_ready(&button0, PinRole::Button0)?;
        ensure_ready(&button1, PinRole::Button1)?;

        let led0_polarity = led0.polarity();
        let led1_polarity = led1.polarity();
        let out0 = configure_output(led0, PinRole::Led0)?;
        let out1 = configure_output(led1, PinRole::Led1)?;

        let button0_polarity = button0.polarity();
        let button1_polarity = button1.polarity();
        let in0 = button0
            .into_input()
            .map_err(|_| GpioError::Configure(PinRole::Button0))?;
        let in1 = button1
            .into_input()
            .map_err(|_| GpioError::Configure(PinRole::Button1))?;

        Ok(Self {
            channels: [
                Channel {
                    input: in0,
                    input_polarity: button0_polarity,
                    input_role: PinRole::Button0,
                    output: out0,
                    output_polarity: led0_polarity,
                    output_role: PinRole::Led0,
                },
                Channel {
                    input: in1,
                    input_polarity: button1_polarity,
                    input_role: PinRole::Button1,
                    output: out1,
                    output_polarity: led1_polarity,
                    output_role: PinRole::Led1,
                },
            ],
        })
    }

    /// One polling cycle. Returns the mirrored logical values.
    pub fn poll(&mut self) -> Result<[bool; 2], Error> {
        let mut values = [false; 2];
        for (value, ch) in values.iter_mut().zip(self.channels.iter_mut()) {
            let high = ch
                .input
                .is_high()
                .map_err(|_| GpioError::Read(ch.input_role))?;
            let active = ch.input_polarity.is_active(high);
            ch.output
                .set_state(ch.output_polarity.level(active))
                .map_err(|_| GpioError::Write(ch.output_role))?;
            *value = active;
        }
        Ok(values)
    }
}

fn ensure_ready<P: DeclaredPin>(pin: &P, role: PinRole) -> Result<(), Error> {
    if pin.is_ready() {
        Ok(())
    } else {
        Err(GpioError::NotReady(role).into())
    }
}

fn configure_output<P: DeclaredPin>(pin: P, role: PinRole) -> Result<P::Output, Error> {
    let initial = pin.polarity().level(true);
    pin.into_output(initial)
        .map_err(|_| GpioError::Configure(role).into())
}
