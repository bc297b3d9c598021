//! GPIO output wrapper

use embassy_rp::gpio::Output;
use railclock_hal::OutputPin;

/// Push-pull output implementing [`railclock_hal::OutputPin`]
///
/// Wrap in [`railclock_hal::ActiveLow`] for lines that assert low.
pub struct RpOutput<'d>(Output<'d>);

impl<'d> RpOutput<'d> {
    /// Wrap a configured output
    pub fn new(output: Output<'d>) -> Self {
        Self(output)
    }
}

impl OutputPin for RpOutput<'_> {
    fn set_high(&mut self) {
        self.0.set_high();
    }

    fn set_low(&mut self) {
        self.0.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.0.is_set_high()
    }
}
