//! GPIO pin abstractions
//!
//! Pins are described in terms of *asserted* and *released* rather than
//! electrical levels wherever the clock logic cares about meaning (a driver
//! enabled, a limit switch pressed). [`ActiveLow`] flips the sense for lines
//! wired the other way round.

/// Digital output pin
pub trait OutputPin {
    /// Drive the pin high (logic 1)
    fn set_high(&mut self);

    /// Drive the pin low (logic 0)
    fn set_low(&mut self);

    /// Drive the pin to a specific level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self) -> bool;
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// Polarity adapter for active-low lines
///
/// Wrapping a pin in `ActiveLow` makes `set_high` drive the line low and
/// `is_high` report a low line, so callers can always treat "high" as
/// "asserted". The stepper driver enable input is the usual customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveLow<P>(pub P);

impl<P> ActiveLow<P> {
    /// Unwrap the underlying pin
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: OutputPin> OutputPin for ActiveLow<P> {
    fn set_high(&mut self) {
        self.0.set_low();
    }

    fn set_low(&mut self) {
        self.0.set_high();
    }

    fn is_set_high(&self) -> bool {
        !self.0.is_set_high()
    }
}

impl<P: InputPin> InputPin for ActiveLow<P> {
    fn is_high(&self) -> bool {
        self.0.is_low()
    }
}

/// Output whose sense is chosen at runtime
///
/// Same as [`ActiveLow`] when `active_low` is set, a plain pass-through
/// otherwise. Used where polarity comes from configuration rather than
/// the board wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Polarity<P> {
    pin: P,
    active_low: bool,
}

impl<P> Polarity<P> {
    /// Wrap `pin`, inverting it if `active_low`
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }
}

impl<P: OutputPin> OutputPin for Polarity<P> {
    fn set_high(&mut self) {
        self.pin.set_state(!self.active_low);
    }

    fn set_low(&mut self) {
        self.pin.set_state(self.active_low);
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high() != self.active_low
    }
}
