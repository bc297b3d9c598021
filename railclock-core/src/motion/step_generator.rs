//! Event-driven step generator
//!
//! Drives one axis through a single [`MotionCommand`]: energise the driver,
//! arm the alarm, toggle the step line on every alarm tick and stop early on
//! a limit switch or an abort. Ticks and limit edges arrive through an
//! [`EventSource`], which in firmware is the axis event queue filled from
//! interrupt context.

use embedded_hal_async::delay::DelayNs;
use railclock_hal::{AlarmTimer, InputPin, OutputPin};

use super::command::{AxisEvent, Direction, Limit, MotionCommand, MoveResult};

/// Default wait between driver enable and the first step, in milliseconds
pub const DEFAULT_SETTLE_MS: u32 = 20;

/// Default receive window before a missing tick is treated as a stall
pub const DEFAULT_EVENT_TIMEOUT_MS: u32 = 1000;

/// Source of events for a running move
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Wait for the next event
    ///
    /// Returns `None` when nothing arrived within `timeout_ms`.
    async fn next_event(&mut self, timeout_ms: u32) -> Option<AxisEvent>;

    /// Drop ticks and limit edges queued before the current move started
    ///
    /// A pending abort for the current move must survive this.
    fn discard_pending(&mut self);
}

/// Something that can carry out a [`MotionCommand`]
///
/// Implemented by [`StepGenerator`]; the axis worker is written against
/// this trait so it can be exercised without pins.
#[allow(async_fn_in_trait)]
pub trait MoveExecutor {
    /// Run one command to its end
    async fn execute<E: EventSource>(&mut self, command: &MotionCommand, events: &mut E)
        -> MoveResult;

    /// Full steps actually taken by the most recent command
    fn last_steps(&self) -> u32;
}

/// Timing used around every move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepTiming {
    /// Wait after enabling and before disabling the driver (ms)
    pub settle_ms: u32,
    /// Longest gap between events during a move (ms)
    pub event_timeout_ms: u32,
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE_MS,
            event_timeout_ms: DEFAULT_EVENT_TIMEOUT_MS,
        }
    }
}

/// Lines wired to one stepper driver and its carriage
///
/// Output pins are "high = asserted": wrap active-low lines in
/// [`railclock_hal::ActiveLow`]. Limit inputs read high while pressed.
pub struct AxisPins<EN, STEP, DIR, LL, RL> {
    /// Driver enable
    pub enable: EN,
    /// Step pulse
    pub step: STEP,
    /// Direction select
    pub dir: DIR,
    /// Left (position zero) limit switch
    pub left_limit: LL,
    /// Right (far end) limit switch
    pub right_limit: RL,
}

/// Step generator for one axis
pub struct StepGenerator<EN, STEP, DIR, LL, RL, T, D> {
    pins: AxisPins<EN, STEP, DIR, LL, RL>,
    alarm: T,
    delay: D,
    timing: StepTiming,
    forward_is_increasing: bool,
    last_steps: u32,
}

impl<EN, STEP, DIR, LL, RL, T, D> StepGenerator<EN, STEP, DIR, LL, RL, T, D>
where
    EN: OutputPin,
    STEP: OutputPin,
    DIR: OutputPin,
    LL: InputPin,
    RL: InputPin,
    T: AlarmTimer,
    D: DelayNs,
{
    /// Create a step generator, leaving the driver disabled
    ///
    /// # Arguments
    ///
    /// * `forward_is_increasing` - direction line high moves the carriage
    ///   away from the left limit
    pub fn new(
        mut pins: AxisPins<EN, STEP, DIR, LL, RL>,
        mut alarm: T,
        delay: D,
        timing: StepTiming,
        forward_is_increasing: bool,
    ) -> Self {
        alarm.stop();
        pins.step.set_low();
        pins.enable.set_low();

        Self {
            pins,
            alarm,
            delay,
            timing,
            forward_is_increasing,
            last_steps: 0,
        }
    }

    /// Full steps taken by the most recent move
    pub fn last_steps(&self) -> u32 {
        self.last_steps
    }

    /// Alarm tick rate, for building commands
    pub fn resolution_hz(&self) -> u32 {
        self.alarm.resolution_hz()
    }

    /// Check if a limit switch is currently pressed
    pub fn limit_active(&self, limit: Limit) -> bool {
        match limit {
            Limit::Left => self.pins.left_limit.is_high(),
            Limit::Right => self.pins.right_limit.is_high(),
        }
    }

    /// Execute one move to its end
    ///
    /// A move that would start against the limit in its direction of
    /// travel returns that limit immediately without energising the
    /// driver. Otherwise the driver is always released again before this
    /// returns, whichever way the move ended.
    pub async fn execute<E: EventSource>(
        &mut self,
        command: &MotionCommand,
        events: &mut E,
    ) -> MoveResult {
        self.last_steps = 0;

        let blocking = command.direction.limit();
        if self.limit_active(blocking) {
            return blocking.result();
        }
        if command.step_count == 0 {
            return MoveResult::Completed;
        }

        // Ticks and edges left over from the previous move
        events.discard_pending();

        self.pins.enable.set_high();
        self.pins.step.set_low();
        let dir_level = (command.direction == Direction::Increasing) == self.forward_is_increasing;
        self.pins.dir.set_state(dir_level);
        self.delay.delay_ms(self.timing.settle_ms).await;

        self.alarm.start(command.tick_period);

        let result = self.run(command, blocking, events).await;

        self.alarm.stop();
        self.pins.step.set_low();
        self.delay.delay_ms(self.timing.settle_ms).await;
        self.pins.enable.set_low();

        result
    }

    async fn run<E: EventSource>(
        &mut self,
        command: &MotionCommand,
        blocking: Limit,
        events: &mut E,
    ) -> MoveResult {
        let total = command.half_steps();
        let mut remaining = total;

        let result = loop {
            if remaining == 0 {
                break MoveResult::Completed;
            }

            match events.next_event(self.timing.event_timeout_ms).await {
                Some(AxisEvent::Tick) => {
                    remaining -= 1;
                    // Odd remainder raises the line: the step lands on the first toggle
                    self.pins.step.set_state(remaining % 2 == 1);
                }
                Some(AxisEvent::Abort) => break MoveResult::Aborted,
                Some(edge) => {
                    // Re-read the level: edges bounce, and the far switch may
                    // chatter while we move away from it
                    if let Some(limit) = edge.limit() {
                        if limit == blocking && self.limit_active(limit) {
                            break limit.result();
                        }
                    }
                }
                None => break MoveResult::Error,
            }
        };

        let toggles = total - remaining;
        self.last_steps = u32::try_from(toggles.div_ceil(2)).unwrap_or(u32::MAX);
        result
    }
}

impl<EN, STEP, DIR, LL, RL, T, D> MoveExecutor for StepGenerator<EN, STEP, DIR, LL, RL, T, D>
where
    EN: OutputPin,
    STEP: OutputPin,
    DIR: OutputPin,
    LL: InputPin,
    RL: InputPin,
    T: AlarmTimer,
    D: DelayNs,
{
    async fn execute<E: EventSource>(
        &mut self,
        command: &MotionCommand,
        events: &mut E,
    ) -> MoveResult {
        StepGenerator::execute(self, command, events).await
    }

    fn last_steps(&self) -> u32 {
        self.last_steps
    }
}


#[cfg(test)]
mod tests {
    use super::sim::{pins, Bench, NoDelay, SimAlarm, SimPin};
    use super::*;
    use embassy_futures::block_on;
    use proptest::prelude::*;

    type SimGenerator<'a> = StepGenerator<
        SimPin<'a>,
        SimPin<'a>,
        SimPin<'a>,
        SimPin<'a>,
        SimPin<'a>,
        SimAlarm<'a>,
        NoDelay,
    >;

    fn generator(bench: &Bench, forward_is_increasing: bool) -> SimGenerator<'_> {
        StepGenerator::new(
            pins(bench),
            SimAlarm(bench),
            NoDelay,
            StepTiming::default(),
            forward_is_increasing,
        )
    }

    #[derive(Clone, Copy)]
    enum Inject {
        PressLeft,
        PressRight,
        LeftBounce,
        RightBounce,
        Abort,
        Stall,
    }

    /// Tick stream that follows the simulated alarm, with one injected event
    struct SimEvents<'a> {
        bench: &'a Bench,
        ticks: u32,
        inject: Option<(u32, Inject)>,
    }

    impl<'a> SimEvents<'a> {
        fn new(bench: &'a Bench) -> Self {
            Self {
                bench,
                ticks: 0,
                inject: None,
            }
        }

        fn with(bench: &'a Bench, after_ticks: u32, inject: Inject) -> Self {
            Self {
                bench,
                ticks: 0,
                inject: Some((after_ticks, inject)),
            }
        }
    }

    impl EventSource for SimEvents<'_> {
        async fn next_event(&mut self, _timeout_ms: u32) -> Option<AxisEvent> {
            if let Some((at, inject)) = self.inject {
                if at == self.ticks {
                    self.inject = None;
                    return match inject {
                        Inject::PressLeft => {
                            self.bench.left.set(true);
                            Some(AxisEvent::LeftLimitEdge)
                        }
                        Inject::PressRight => {
                            self.bench.right.set(true);
                            Some(AxisEvent::RightLimitEdge)
                        }
                        Inject::LeftBounce => Some(AxisEvent::LeftLimitEdge),
                        Inject::RightBounce => Some(AxisEvent::RightLimitEdge),
                        Inject::Abort => Some(AxisEvent::Abort),
                        Inject::Stall => None,
                    };
                }
            }

            if self.bench.alarm_running.get() {
                self.ticks += 1;
                Some(AxisEvent::Tick)
            } else {
                None
            }
        }

        fn discard_pending(&mut self) {}
    }

    fn assert_released(bench: &Bench) {
        assert!(!bench.enable.get());
        assert!(!bench.step.get());
        assert!(!bench.alarm_running.get());
    }

    #[test]
    fn test_new_leaves_driver_disabled() {
        let bench = Bench::default();
        bench.enable.set(true);
        bench.step.set(true);
        let _gen = generator(&bench, true);
        assert!(!bench.enable.get());
        assert!(!bench.step.get());
    }

    #[test]
    fn test_completed_move_arms_alarm_with_period() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Increasing, 625, 10);

        let result = block_on(gen.execute(&cmd, &mut SimEvents::new(&bench)));

        assert_eq!(result, MoveResult::Completed);
        assert_eq!(bench.alarm_period.get(), 625);
        assert_eq!(bench.rising_edges.get(), 10);
        assert_eq!(gen.last_steps(), 10);
        assert_released(&bench);
    }

    #[test]
    fn test_direction_line_follows_calibration() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let up = MotionCommand::new(Direction::Increasing, 100, 1);
        block_on(gen.execute(&up, &mut SimEvents::new(&bench)));
        assert!(bench.dir.get());

        let bench = Bench::default();
        let mut gen = generator(&bench, false);
        block_on(gen.execute(&up, &mut SimEvents::new(&bench)));
        assert!(!bench.dir.get());

        let down = MotionCommand::new(Direction::Decreasing, 100, 1);
        block_on(gen.execute(&down, &mut SimEvents::new(&bench)));
        assert!(bench.dir.get());
    }

    #[test]
    fn test_zero_steps_never_energises() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Decreasing, 625, 0);

        let result = block_on(gen.execute(&cmd, &mut SimEvents::new(&bench)));

        assert_eq!(result, MoveResult::Completed);
        assert_eq!(bench.enable_count.get(), 0);
        assert_eq!(bench.alarm_starts.get(), 0);
    }

    #[test]
    fn test_active_limit_blocks_move() {
        let bench = Bench::default();
        bench.left.set(true);
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Decreasing, 625, 500);

        let result = block_on(gen.execute(&cmd, &mut SimEvents::new(&bench)));

        assert_eq!(result, MoveResult::HitLeftLimit);
        assert_eq!(bench.rising_edges.get(), 0);
        assert_eq!(bench.enable_count.get(), 0);
        assert_eq!(bench.alarm_starts.get(), 0);
        assert_eq!(gen.last_steps(), 0);
    }

    #[test]
    fn test_active_limit_behind_does_not_block() {
        let bench = Bench::default();
        bench.left.set(true);
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Increasing, 625, 5);

        let result = block_on(gen.execute(&cmd, &mut SimEvents::new(&bench)));

        assert_eq!(result, MoveResult::Completed);
        assert_eq!(bench.rising_edges.get(), 5);
    }

    #[test]
    fn test_limit_in_travel_direction_stops_move() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Decreasing, 166, 100);
        let mut events = SimEvents::with(&bench, 51, Inject::PressLeft);

        let result = block_on(gen.execute(&cmd, &mut events));

        assert_eq!(result, MoveResult::HitLeftLimit);
        // 51 toggles: the 51st raised the line for step 26
        assert_eq!(bench.rising_edges.get(), 26);
        assert_eq!(gen.last_steps(), 26);
        assert_released(&bench);
    }

    #[test]
    fn test_right_limit_stops_increasing_move() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Increasing, 166, 100);
        let mut events = SimEvents::with(&bench, 20, Inject::PressRight);

        let result = block_on(gen.execute(&cmd, &mut events));

        assert_eq!(result, MoveResult::HitRightLimit);
        assert_eq!(gen.last_steps(), 10);
    }

    #[test]
    fn test_opposite_limit_edge_is_ignored() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Increasing, 166, 20);
        let mut events = SimEvents::with(&bench, 3, Inject::PressLeft);

        let result = block_on(gen.execute(&cmd, &mut events));

        assert_eq!(result, MoveResult::Completed);
        assert_eq!(bench.rising_edges.get(), 20);
    }

    #[test]
    fn test_bounce_without_level_is_ignored() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Decreasing, 166, 20);
        let mut events = SimEvents::with(&bench, 7, Inject::LeftBounce);
        assert_eq!(block_on(gen.execute(&cmd, &mut events)), MoveResult::Completed);

        let cmd = MotionCommand::new(Direction::Increasing, 166, 20);
        let mut events = SimEvents::with(&bench, 7, Inject::RightBounce);
        assert_eq!(block_on(gen.execute(&cmd, &mut events)), MoveResult::Completed);
    }

    #[test]
    fn test_missing_tick_is_error() {
        let bench = Bench::default();
        let mut gen = generator(&bench, true);
        let cmd = MotionCommand::new(Direction::Increasing, 625, 50);
        let mut events = SimEvents::with(&bench, 13, Inject::Stall);

        let result = block_on(gen.execute(&cmd, &mut events));

        assert_eq!(result, MoveResult::Error);
        assert_eq!(gen.last_steps(), 7);
        assert_released(&bench);
    }

    proptest! {
        #[test]
        fn test_unobstructed_move_takes_exactly_n_steps(
            steps in 0u32..400,
            period in 1u32..5_000,
            forward in any::<bool>(),
            increasing in any::<bool>(),
        ) {
            let bench = Bench::default();
            let mut gen = generator(&bench, forward);
            let direction = if increasing { Direction::Increasing } else { Direction::Decreasing };
            let cmd = MotionCommand::new(direction, period, steps);

            let result = block_on(gen.execute(&cmd, &mut SimEvents::new(&bench)));

            prop_assert_eq!(result, MoveResult::Completed);
            prop_assert_eq!(bench.rising_edges.get(), steps);
            prop_assert_eq!(gen.last_steps(), steps);
            prop_assert!(!bench.enable.get());
            prop_assert!(!bench.step.get());
            prop_assert!(!bench.alarm_running.get());
        }

        #[test]
        fn test_abort_always_ends_move(steps in 1u32..300, at in 0u32..600) {
            let bench = Bench::default();
            let mut gen = generator(&bench, true);
            let cmd = MotionCommand::new(Direction::Increasing, 166, steps);
            let mut events = SimEvents::with(&bench, at, Inject::Abort);

            let result = block_on(gen.execute(&cmd, &mut events));

            if at < steps * 2 {
                prop_assert_eq!(result, MoveResult::Aborted);
                prop_assert_eq!(gen.last_steps(), at.div_ceil(2));
            } else {
                prop_assert_eq!(result, MoveResult::Completed);
            }
            prop_assert!(bench.rising_edges.get() <= steps);
            prop_assert!(!bench.enable.get());
            prop_assert!(!bench.alarm_running.get());
        }
    }
}
