//! Per-axis worker
//!
//! Pulls commands off an [`AxisLink`] one at a time, runs each through a
//! [`MoveExecutor`] and hands the result back. Each axis has its own worker
//! task, so the two carriages move concurrently.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal_async::delay::DelayNs;

use super::link::AxisLink;
use crate::motion::{AxisEvent, EventSource, MotionCommand, MoveExecutor, MoveResult};

/// Event source reading an axis link's event queue with a receive timeout
///
/// Only aborts raised after `abort_baseline` are reported; the wake-up
/// events they post are otherwise ignored.
pub struct QueuedEvents<'a, M: RawMutex, D, const N: usize> {
    link: &'a AxisLink<M, N>,
    delay: &'a mut D,
    abort_baseline: u32,
}

impl<'a, M: RawMutex, D: DelayNs, const N: usize> QueuedEvents<'a, M, D, N> {
    /// Read events from `link`, timing out with `delay`
    pub fn new(link: &'a AxisLink<M, N>, delay: &'a mut D, abort_baseline: u32) -> Self {
        Self {
            link,
            delay,
            abort_baseline,
        }
    }

    fn aborted(&self) -> bool {
        self.link.abort_raised_since(self.abort_baseline)
    }
}

impl<M: RawMutex, D: DelayNs, const N: usize> EventSource for QueuedEvents<'_, M, D, N> {
    async fn next_event(&mut self, timeout_ms: u32) -> Option<AxisEvent> {
        loop {
            if self.aborted() {
                return Some(AxisEvent::Abort);
            }

            match select(self.link.next_event(), self.delay.delay_ms(timeout_ms)).await {
                // Stale wake-up from an abort that does not apply to this move
                Either::First(AxisEvent::Abort) if !self.aborted() => continue,
                Either::First(event) => return Some(event),
                Either::Second(()) => return self.aborted().then_some(AxisEvent::Abort),
            }
        }
    }

    fn discard_pending(&mut self) {
        self.link.discard_events();
    }
}

/// What happened to one command, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    /// The command as submitted
    pub command: MotionCommand,
    /// How it ended
    pub result: MoveResult,
    /// Full steps actually taken
    pub steps: u32,
    /// Axis position afterwards, in steps
    pub position_steps: i32,
}

/// Consumer side of one axis
pub struct AxisWorker<'a, M: RawMutex, X, D, const N: usize> {
    link: &'a AxisLink<M, N>,
    executor: X,
    delay: D,
}

impl<'a, M, X, D, const N: usize> AxisWorker<'a, M, X, D, N>
where
    M: RawMutex,
    X: MoveExecutor,
    D: DelayNs,
{
    /// Create a worker
    ///
    /// # Arguments
    ///
    /// * `link` - queues shared with the orchestrator and interrupt side
    /// * `executor` - the axis step generator
    /// * `delay` - timer used for the per-event receive timeout
    pub fn new(link: &'a AxisLink<M, N>, executor: X, delay: D) -> Self {
        Self {
            link,
            executor,
            delay,
        }
    }

    /// Wait for the next command, execute it and deliver its result
    pub async fn process_next(&mut self) -> MoveReport {
        let submission = self.link.next_submission().await;
        let command = submission.command;
        let baseline = self.link.abort_baseline(&submission);

        let mut events = QueuedEvents::new(self.link, &mut self.delay, baseline);
        let result = self.executor.execute(&command, &mut events).await;
        let steps = self.executor.last_steps();

        self.link.complete(submission, steps, result);

        MoveReport {
            command,
            result,
            steps,
            position_steps: self.link.position_steps(),
        }
    }
}
