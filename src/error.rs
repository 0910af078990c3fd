//! Unified error type for central-uart.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // GPIO
    /// A pin could not be brought up or driven.
    Gpio(GpioError),
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Scan was cancelled or could not start.
    ScanFailed,
    /// Characteristic subscribe/notify failed.
    NotifyFailed,
    /// NUS handles were never assigned on this link.
    NotDiscovered,
    /// The NUS write was rejected by the stack.
    SendFailed,
    /// Connection to the peripheral was lost unexpectedly.
    Disconnected,
}

/// Which of the four declared sample pins an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    Led0,
    Led1,
    Button0,
    Button1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// The GPIO port backing the pin reported not-ready.
    NotReady(PinRole),
    /// Pin mode configuration failed.
    Configure(PinRole),
    /// Reading an input failed.
    Read(PinRole),
    /// Driving an output failed.
    Write(PinRole),
}

// errno values returned by startup paths.
const ENODEV: i32 = 19;
const EIO: i32 = 5;

impl Error {
    /// Negative errno-style code, as a sample `main` would return it.
    pub fn code(&self) -> i32 {
        match self {
            Error::Gpio(GpioError::NotReady(_)) => -ENODEV,
            Error::Gpio(_) => -EIO,
            Error::Ble(BleError::Raw(raw)) => -(((*raw & 0x7FFF_FFFF) as i32).max(1)),
            Error::Ble(_) => -EIO,
        }
    }
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl From<GpioError> for Error {
    fn from(e: GpioError) -> Self {
        Error::Gpio(e)
    }
}
