//! Clock orchestrator
//!
//! Reads the wall clock once per cycle and turns changes into moves on the
//! two axes. All choreography lives here; the axes only ever see single
//! point-to-point moves.
//!
//! Targets are always recomputed from the fresh reading and the axis's own
//! step position, never accumulated, so rounding cannot drift.

use embassy_futures::join::join;
use embedded_hal_async::delay::DelayNs;
use railclock_hal::OutputPin;

use super::fault::{ClockFault, Hand, MoveFault, Phase};
use super::reading::{Advance, ClockReading};
use super::state::{ClockState, SharedState};
use super::WallClock;
use crate::axis::AxisControl;
use crate::config::ClockConfig;
use crate::motion::{mm_to_um, Direction, MotionCommand, MoveResult};

/// What one cycle did, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// State at the start of the cycle
    pub from: ClockState,
    /// State at the end of the cycle
    pub to: ClockState,
    /// Reading the hands show afterwards, once known
    pub shown: Option<ClockReading>,
    /// Fault raised during this cycle
    pub fault: Option<ClockFault>,
}

impl CycleReport {
    /// Check if the cycle changed state
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Top-level sequencer for the two hands
pub struct Orchestrator<'a, H, N, C, D, S> {
    hour: &'a H,
    minute: &'a N,
    clock: &'a C,
    shared: &'a SharedState,
    delay: D,
    status: S,
    config: ClockConfig,
    shown: Option<ClockReading>,
    last_fault: Option<ClockFault>,
}

impl<'a, H, N, C, D, S> Orchestrator<'a, H, N, C, D, S>
where
    H: AxisControl,
    N: AxisControl,
    C: WallClock,
    D: DelayNs,
    S: OutputPin,
{
    /// Create the orchestrator
    ///
    /// # Arguments
    ///
    /// * `hour`, `minute` - axis handles; the workers must already be running
    /// * `clock` - wall clock, also written by the command interface
    /// * `shared` - clock state, also written by the command interface
    /// * `delay` - poll and choreography pauses
    /// * `status` - fault indicator line
    /// * `config` - geometry, speeds and timing
    pub fn new(
        hour: &'a H,
        minute: &'a N,
        clock: &'a C,
        shared: &'a SharedState,
        delay: D,
        status: S,
        config: ClockConfig,
    ) -> Self {
        let mut orchestrator = Self {
            hour,
            minute,
            clock,
            shared,
            delay,
            status,
            config,
            shown: None,
            last_fault: None,
        };
        orchestrator.refresh_status();
        orchestrator
    }

    /// Current state
    pub fn state(&self) -> ClockState {
        self.shared.get()
    }

    /// Reading the hands were last moved to
    pub fn shown(&self) -> Option<ClockReading> {
        self.shown
    }

    /// Fault that stopped the clock, if this orchestrator raised it
    pub fn last_fault(&self) -> Option<ClockFault> {
        self.last_fault
    }

    /// Run one step of the state machine
    ///
    /// Homing, time-setting and whole rollover choreographies complete
    /// within a single cycle.
    pub async fn cycle(&mut self) -> CycleReport {
        let from = self.shared.get();

        let outcome = match from {
            ClockState::Uninitialized => self.home().await,
            ClockState::SettingTime => self.set_time().await,
            ClockState::Running => self.follow_time().await,
            _ => Ok(()),
        };

        let fault = outcome.err();
        if let Some(fault) = fault {
            self.shared.force_fault();
            self.last_fault = Some(fault);
        }
        self.refresh_status();

        CycleReport {
            from,
            to: self.shared.get(),
            shown: self.shown,
            fault,
        }
    }

    /// Sleep one poll interval, then bring the status line up to date
    pub async fn idle(&mut self) {
        self.delay.delay_ms(self.config.timing.poll_interval_ms).await;
        self.refresh_status();
    }

    async fn home(&mut self) -> Result<(), ClockFault> {
        if !self.shared.advance(ClockState::Uninitialized, ClockState::Homing) {
            return Ok(());
        }

        let speeds = self.config.speeds;
        self.seek_left_limits(Phase::Homing, speeds.homing_hz).await?;

        let home = mm_to_um(self.config.track.home_mm);
        self.move_both(Phase::Parking, home, speeds.normal_hz, home, speeds.normal_hz)
            .await?;

        self.shared
            .advance(ClockState::Homing, ClockState::AwaitingTimeSync);
        Ok(())
    }

    async fn set_time(&mut self) -> Result<(), ClockFault> {
        let reading = self.read_clock();
        let track = self.config.track;
        let hz = self.config.speeds.set_time_hz;

        self.move_both(
            Phase::SettingTime,
            track.hour_position_um(reading.hour),
            hz,
            track.minute_position_um(reading.minute),
            hz,
        )
        .await?;

        self.shown = Some(reading);
        self.shared.advance(ClockState::SettingTime, ClockState::Running);
        Ok(())
    }

    async fn follow_time(&mut self) -> Result<(), ClockFault> {
        let now = self.read_clock();
        let Some(shown) = self.shown else {
            self.shown = Some(now);
            return Ok(());
        };

        match now.advance_from(&shown) {
            Advance::None => Ok(()),
            Advance::Minute => {
                let target = self.config.track.minute_position_um(now.minute);
                let hz = self.config.speeds.minute_hz;
                self.move_one(self.minute, Phase::MinuteAdvance, Hand::Minute, target, hz)
                    .await?;
                self.shown = Some(now);
                Ok(())
            }
            Advance::Hour => {
                self.rollover(ClockState::AdvancingMinuteRollover, now).await
            }
            Advance::HalfDay => {
                self.rollover(ClockState::AdvancingHalfDayRollover, now).await
            }
        }
    }

    async fn rollover(&mut self, state: ClockState, now: ClockReading) -> Result<(), ClockFault> {
        // Refused when a time-set or an emergency stop got in first
        if !self.shared.advance(ClockState::Running, state) {
            return Ok(());
        }

        if state == ClockState::AdvancingHalfDayRollover {
            self.half_day_rollover().await?;
        } else {
            self.hour_rollover(now.hour).await?;
        }

        self.shown = Some(ClockReading::new(now.hour, 0));
        self.shared.advance(state, ClockState::Running);
        Ok(())
    }

    /// Sweep the minute hand off the dial and back while the hour hand
    /// steps forward
    async fn hour_rollover(&mut self, hour: u8) -> Result<(), ClockFault> {
        let track = self.config.track;
        let speeds = self.config.speeds;
        let phase = Phase::HourAdvance;

        let far_right = mm_to_um(track.right_limit_mm);
        self.move_one(self.minute, phase, Hand::Minute, far_right, speeds.minute_hz)
            .await?;
        self.pause(self.config.timing.long_pause_ms).await;

        let end = mm_to_um(track.end_mm());
        self.move_one(self.minute, phase, Hand::Minute, end, speeds.minute_return_hz)
            .await?;

        // hour_advance_hz covers one hour mark in the time minute_return_hz
        // covers the whole dial, so both land together
        self.move_both(
            phase,
            track.hour_position_um(hour),
            speeds.hour_advance_hz,
            mm_to_um(track.start_mm),
            speeds.minute_return_hz,
        )
        .await
    }

    /// Run both hands to the far end, re-home, then return to 0:00
    async fn half_day_rollover(&mut self) -> Result<(), ClockFault> {
        let track = self.config.track;
        let speeds = self.config.speeds;
        let timing = self.config.timing;
        let phase = Phase::HalfDayRollover;
        let end = mm_to_um(track.end_mm());
        let start = mm_to_um(track.start_mm);

        self.move_one(self.hour, phase, Hand::Hour, end, speeds.hour_slow_hz)
            .await?;
        self.pause(timing.long_pause_ms).await;

        self.move_one(self.minute, phase, Hand::Minute, end, speeds.normal_hz)
            .await?;
        self.pause(timing.long_pause_ms).await;

        self.seek_left_limits(phase, speeds.minute_return_hz).await?;
        self.pause(timing.short_pause_ms).await;

        self.move_one(self.minute, phase, Hand::Minute, start, speeds.normal_hz)
            .await?;
        self.pause(timing.short_pause_ms).await;

        self.move_one(self.hour, phase, Hand::Hour, start, speeds.hour_slow_hz)
            .await
    }

    fn read_clock(&self) -> ClockReading {
        ClockReading::from_epoch(self.clock.now_epoch(), self.config.utc_offset_minutes)
    }

    fn refresh_status(&mut self) {
        let fault = self.shared.get().is_fault();
        self.status.set_state(fault != self.config.status.active_low);
    }

    async fn pause(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    /// Refuse to issue moves once something else forced `Fault`
    fn ensure_live(&self, phase: Phase) -> Result<(), ClockFault> {
        if self.shared.get().is_fault() {
            return Err(ClockFault::halted(phase));
        }
        Ok(())
    }

    /// Command moving an axis from its current step position to `target_um`
    fn command_to<A: AxisControl>(&self, axis: &A, target_um: i32, step_hz: u32) -> MotionCommand {
        let drive = &self.config.drive;
        let delta = drive
            .position_to_steps(target_um)
            .saturating_sub(axis.position_steps());
        MotionCommand::new(
            Direction::toward(delta),
            drive.tick_period(step_hz),
            delta.unsigned_abs(),
        )
    }

    fn seek_command(&self, step_hz: u32) -> MotionCommand {
        let drive = &self.config.drive;
        let seek_um = u32::try_from(mm_to_um(self.config.track.seek_mm)).unwrap_or(0);
        MotionCommand::new(
            Direction::Decreasing,
            drive.tick_period(step_hz),
            drive.distance_to_steps(seek_um),
        )
    }

    async fn move_one<A: AxisControl>(
        &self,
        axis: &A,
        phase: Phase,
        hand: Hand,
        target_um: i32,
        step_hz: u32,
    ) -> Result<(), ClockFault> {
        self.ensure_live(phase)?;
        let command = self.command_to(axis, target_um, step_hz);
        let pending = axis
            .submit(command)
            .map_err(|err| ClockFault::on(phase, hand, MoveFault::Rejected(err)))?;
        expect(phase, hand, pending.await, MoveResult::Completed)
    }

    /// Move both hands at once to their own targets
    async fn move_both(
        &self,
        phase: Phase,
        hour_um: i32,
        hour_hz: u32,
        minute_um: i32,
        minute_hz: u32,
    ) -> Result<(), ClockFault> {
        let hour = self.command_to(self.hour, hour_um, hour_hz);
        let minute = self.command_to(self.minute, minute_um, minute_hz);
        self.move_pair(phase, hour, minute, MoveResult::Completed)
            .await
    }

    /// Drive both hands into their left limits and re-zero them
    async fn seek_left_limits(&self, phase: Phase, step_hz: u32) -> Result<(), ClockFault> {
        let seek = self.seek_command(step_hz);
        self.move_pair(phase, seek, seek, MoveResult::HitLeftLimit)
            .await
    }

    /// Submit both commands before awaiting either
    async fn move_pair(
        &self,
        phase: Phase,
        hour_command: MotionCommand,
        minute_command: MotionCommand,
        expected: MoveResult,
    ) -> Result<(), ClockFault> {
        self.ensure_live(phase)?;
        let hour = self
            .hour
            .submit(hour_command)
            .map_err(|err| ClockFault::on(phase, Hand::Hour, MoveFault::Rejected(err)))?;
        let minute = self
            .minute
            .submit(minute_command)
            .map_err(|err| ClockFault::on(phase, Hand::Minute, MoveFault::Rejected(err)))?;

        let (hour_result, minute_result) = join(hour, minute).await;
        expect(phase, Hand::Hour, hour_result, expected)?;
        expect(phase, Hand::Minute, minute_result, expected)
    }
}

fn expect(
    phase: Phase,
    hand: Hand,
    result: MoveResult,
    expected: MoveResult,
) -> Result<(), ClockFault> {
    match MoveFault::check(result, expected) {
        Some(cause) => Err(ClockFault::on(phase, hand, cause)),
        None => Ok(()),
    }
}
