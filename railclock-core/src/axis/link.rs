//! Command and result plumbing between the orchestrator and one axis worker
//!
//! An [`AxisLink`] is the only thing the two sides share. It is built in a
//! `static` so interrupt callbacks, the worker task and the orchestrator can
//! all reach it:
//!
//! - a bounded command queue, consumed strictly in order by the worker
//! - one result slot per queue entry, each resolved exactly once
//! - the event queue the worker's step generator reads during a move
//! - the axis position and homed flag, written only by the worker

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};

use crate::motion::{AxisEvent, Direction, MotionCommand, MoveResult};

/// Commands that may wait behind the one executing
pub const COMMAND_QUEUE_DEPTH: usize = 5;

/// Events buffered between the interrupt side and the step generator
pub const EVENT_QUEUE_DEPTH: usize = 10;

/// Submission errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisError {
    /// Every queue entry is taken; the caller issued more moves than it awaited
    QueueFull,
}

/// Operations the orchestrator needs from an axis
///
/// Implemented by [`AxisLink`]; tests substitute scripted axes.
pub trait AxisControl {
    /// Future resolving to the result of a submitted move
    type Pending<'a>: Future<Output = MoveResult>
    where
        Self: 'a;

    /// Queue a move behind any already queued
    fn submit(&self, command: MotionCommand) -> Result<Self::Pending<'_>, AxisError>;

    /// Stop the move currently executing, if any
    fn request_abort(&self);

    /// Absolute position in steps from the left limit
    fn position_steps(&self) -> i32;
}

const SLOT_FREE: u8 = 0;
const SLOT_PENDING: u8 = 1;
const SLOT_DONE: u8 = 2;
const SLOT_ABANDONED: u8 = 3;

/// One-shot result slot
struct ResultSlot<M: RawMutex> {
    state: AtomicU8,
    result: Signal<M, MoveResult>,
}

impl<M: RawMutex> ResultSlot<M> {
    const NEW: Self = Self {
        state: AtomicU8::new(SLOT_FREE),
        result: Signal::new(),
    };

    fn claim(&self) -> bool {
        let claimed = self
            .state
            .compare_exchange(SLOT_FREE, SLOT_PENDING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.result.reset();
        }
        claimed
    }

    fn release(&self) {
        self.result.reset();
        self.state.store(SLOT_FREE, Ordering::Release);
    }

    /// Deliver the result, or recycle the slot if nobody is waiting any more
    fn resolve(&self, result: MoveResult) {
        match self.state.compare_exchange(
            SLOT_PENDING,
            SLOT_DONE,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => self.result.signal(result),
            Err(_) => self.release(),
        }
    }

    /// Called when a handle goes away before reading its result
    fn abandon(&self) {
        if self
            .state
            .compare_exchange(SLOT_PENDING, SLOT_ABANDONED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // Result already delivered and never read
            self.release();
        }
    }
}

/// A queued command and the slot its result goes to
#[derive(Debug, Clone, Copy)]
pub(crate) struct Submission {
    pub command: MotionCommand,
    slot: usize,
    /// Abort count when the command was queued
    aborts_at_submit: u32,
}

/// Shared state of one axis
pub struct AxisLink<M: RawMutex, const N: usize = COMMAND_QUEUE_DEPTH> {
    commands: Channel<M, Submission, N>,
    slots: [ResultSlot<M>; N],
    events: Channel<M, AxisEvent, EVENT_QUEUE_DEPTH>,
    /// Aborts requested so far, wrapping
    aborts: AtomicU32,
    /// Value of `aborts` when the last move ended
    aborts_at_finish: AtomicU32,
    position: AtomicI32,
    homed: AtomicBool,
}

impl<M: RawMutex, const N: usize> Default for AxisLink<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> AxisLink<M, N> {
    /// Create an idle, unhomed axis link
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            slots: [ResultSlot::NEW; N],
            events: Channel::new(),
            aborts: AtomicU32::new(0),
            aborts_at_finish: AtomicU32::new(0),
            position: AtomicI32::new(0),
            homed: AtomicBool::new(false),
        }
    }

    /// Queue a move and get a handle to await its result
    ///
    /// Moves run strictly in submission order. Fails with
    /// [`AxisError::QueueFull`] when `N` results are already outstanding.
    pub fn submit(&self, command: MotionCommand) -> Result<MoveHandle<'_, M>, AxisError> {
        let slot = self
            .slots
            .iter()
            .position(|slot| slot.claim())
            .ok_or(AxisError::QueueFull)?;

        let submission = Submission {
            command,
            slot,
            aborts_at_submit: self.aborts.load(Ordering::Acquire),
        };
        if self.commands.try_send(submission).is_err() {
            self.slots[slot].release();
            return Err(AxisError::QueueFull);
        }

        Ok(MoveHandle {
            slot: &self.slots[slot],
            finished: false,
        })
    }

    /// Ask the executing move to stop
    ///
    /// Non-blocking and safe from any task. Stops the executing move. With
    /// the axis idle it stops the next move to start, if that move was
    /// submitted before the abort; moves submitted afterwards are unaffected.
    pub fn request_abort(&self) {
        self.aborts.fetch_add(1, Ordering::AcqRel);
        // Wakes a waiting step generator; if the queue is full the count is
        // picked up on the next receive anyway
        let _ = self.events.try_send(AxisEvent::Abort);
    }

    /// Post an event from interrupt or callback context
    ///
    /// Returns `false` if the event queue was full and the event dropped.
    pub fn post_event(&self, event: AxisEvent) -> bool {
        self.events.try_send(event).is_ok()
    }

    /// Absolute position in steps from the left limit
    pub fn position_steps(&self) -> i32 {
        self.position.load(Ordering::Acquire)
    }

    /// Check if the position has been referenced against the left limit
    /// since the last interrupted move
    pub fn is_homed(&self) -> bool {
        self.homed.load(Ordering::Acquire)
    }

    pub(crate) async fn next_submission(&self) -> Submission {
        self.commands.receive().await
    }

    pub(crate) async fn next_event(&self) -> AxisEvent {
        self.events.receive().await
    }

    /// Abort count a starting move compares against
    ///
    /// Aborts count for a move if they were raised after it was submitted
    /// and after the previous move ended, whichever came later.
    pub(crate) fn abort_baseline(&self, submission: &Submission) -> u32 {
        let now = self.aborts.load(Ordering::Acquire);
        let submitted = submission.aborts_at_submit;
        let finished = self.aborts_at_finish.load(Ordering::Acquire);
        if now.wrapping_sub(submitted) <= now.wrapping_sub(finished) {
            submitted
        } else {
            finished
        }
    }

    pub(crate) fn abort_raised_since(&self, baseline: u32) -> bool {
        self.aborts.load(Ordering::Acquire) != baseline
    }

    /// Drop queued ticks and limit edges
    ///
    /// Abort requests are counted separately and survive this.
    pub(crate) fn discard_events(&self) {
        while self.events.try_receive().is_ok() {}
    }

    /// Account for a finished move, then hand its result to the submitter
    pub(crate) fn complete(&self, submission: Submission, steps: u32, result: MoveResult) {
        self.aborts_at_finish
            .store(self.aborts.load(Ordering::Acquire), Ordering::Release);

        let direction = submission.command.direction;
        if result == MoveResult::HitLeftLimit && direction == Direction::Decreasing {
            self.position.store(0, Ordering::Release);
            self.homed.store(true, Ordering::Release);
        } else {
            let travelled = i32::try_from(steps).unwrap_or(i32::MAX) * direction.sign();
            self.position.fetch_add(travelled, Ordering::AcqRel);
            if !result.keeps_position() {
                self.homed.store(false, Ordering::Release);
            }
        }

        if let Some(slot) = self.slots.get(submission.slot) {
            slot.resolve(result);
        }
    }
}

impl<M: RawMutex, const N: usize> AxisControl for AxisLink<M, N> {
    type Pending<'a>
        = MoveHandle<'a, M>
    where
        Self: 'a;

    fn submit(&self, command: MotionCommand) -> Result<Self::Pending<'_>, AxisError> {
        AxisLink::submit(self, command)
    }

    fn request_abort(&self) {
        AxisLink::request_abort(self)
    }

    fn position_steps(&self) -> i32 {
        AxisLink::position_steps(self)
    }
}

/// Future resolving to the result of one submitted move
///
/// Dropping the handle early is allowed: the move still runs and its slot
/// is recycled once the worker finishes it.
pub struct MoveHandle<'a, M: RawMutex> {
    slot: &'a ResultSlot<M>,
    finished: bool,
}

impl<M: RawMutex> Future for MoveHandle<'_, M> {
    type Output = MoveResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let wait = core::pin::pin!(this.slot.result.wait());
        match wait.poll(cx) {
            Poll::Ready(result) => {
                this.finished = true;
                this.slot.release();
                Poll::Ready(result)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<M: RawMutex> Drop for MoveHandle<'_, M> {
    fn drop(&mut self) {
        if !self.finished {
            self.slot.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    type TestLink = AxisLink<NoopRawMutex, 2>;

    fn cmd(direction: Direction, steps: u32) -> MotionCommand {
        MotionCommand::new(direction, 625, steps)
    }

    #[test]
    fn test_submit_is_bounded() {
        let link = TestLink::new();
        let _a = link.submit(cmd(Direction::Increasing, 1)).unwrap();
        let _b = link.submit(cmd(Direction::Increasing, 2)).unwrap();
        assert_eq!(
            link.submit(cmd(Direction::Increasing, 3)).err(),
            Some(AxisError::QueueFull)
        );
    }

    #[test]
    fn test_result_reaches_handle() {
        let link = TestLink::new();
        let handle = link.submit(cmd(Direction::Increasing, 40)).unwrap();

        let submission = block_on(link.next_submission());
        link.complete(submission, 40, MoveResult::Completed);

        assert_eq!(block_on(handle), MoveResult::Completed);
        assert_eq!(link.position_steps(), 40);
    }

    #[test]
    fn test_commands_are_delivered_in_order() {
        let link = TestLink::new();
        let _a = link.submit(cmd(Direction::Increasing, 1)).unwrap();
        let _b = link.submit(cmd(Direction::Decreasing, 2)).unwrap();

        assert_eq!(block_on(link.next_submission()).command.step_count, 1);
        assert_eq!(block_on(link.next_submission()).command.step_count, 2);
    }

    #[test]
    fn test_abandoned_slot_is_recycled() {
        let link = TestLink::new();
        drop(link.submit(cmd(Direction::Increasing, 1)).unwrap());
        drop(link.submit(cmd(Direction::Increasing, 2)).unwrap());
        assert!(link.submit(cmd(Direction::Increasing, 3)).is_err());

        // The worker still runs both moves and frees their slots
        let first = block_on(link.next_submission());
        link.complete(first, 1, MoveResult::Completed);
        let second = block_on(link.next_submission());
        link.complete(second, 2, MoveResult::Completed);

        let handle = link.submit(cmd(Direction::Increasing, 3)).unwrap();
        let third = block_on(link.next_submission());
        link.complete(third, 3, MoveResult::HitRightLimit);
        assert_eq!(block_on(handle), MoveResult::HitRightLimit);
        assert_eq!(link.position_steps(), 6);
    }

    #[test]
    fn test_unread_result_frees_slot_on_drop() {
        let link = TestLink::new();
        let handle = link.submit(cmd(Direction::Increasing, 1)).unwrap();
        let submission = block_on(link.next_submission());
        link.complete(submission, 1, MoveResult::Completed);
        drop(handle);

        let _a = link.submit(cmd(Direction::Increasing, 1)).unwrap();
        let _b = link.submit(cmd(Direction::Increasing, 1)).unwrap();
    }

    #[test]
    fn test_left_limit_on_decreasing_move_homes() {
        let link = TestLink::new();
        let _h = link.submit(cmd(Direction::Increasing, 100)).unwrap();
        let s = block_on(link.next_submission());
        link.complete(s, 100, MoveResult::Completed);
        assert!(!link.is_homed());

        let _h = link.submit(cmd(Direction::Decreasing, 56_000)).unwrap();
        let s = block_on(link.next_submission());
        link.complete(s, 117, MoveResult::HitLeftLimit);
        assert_eq!(link.position_steps(), 0);
        assert!(link.is_homed());
    }

    #[test]
    fn test_interrupted_move_clears_homed() {
        let link = TestLink::new();
        let _h = link.submit(cmd(Direction::Decreasing, 10)).unwrap();
        let s = block_on(link.next_submission());
        link.complete(s, 0, MoveResult::HitLeftLimit);
        assert!(link.is_homed());

        let _h = link.submit(cmd(Direction::Increasing, 10)).unwrap();
        let s = block_on(link.next_submission());
        link.complete(s, 4, MoveResult::Aborted);
        assert_eq!(link.position_steps(), 4);
        assert!(!link.is_homed());
    }

    #[test]
    fn test_abort_counts_and_wakes_queue() {
        let link = TestLink::new();
        link.request_abort();
        assert_eq!(block_on(link.next_event()), AxisEvent::Abort);
        assert!(link.abort_raised_since(0));
    }

    #[test]
    fn test_discard_drops_stale_events_but_keeps_abort() {
        let link = TestLink::new();
        let _h = link.submit(cmd(Direction::Increasing, 10)).unwrap();
        assert!(link.post_event(AxisEvent::Tick));
        link.request_abort();
        link.discard_events();

        let s = block_on(link.next_submission());
        assert!(link.abort_raised_since(link.abort_baseline(&s)));
        assert!(link.events.try_receive().is_err());
    }

    #[test]
    fn test_abort_before_submit_does_not_carry_over() {
        let link = TestLink::new();
        link.request_abort();
        let _h = link.submit(cmd(Direction::Increasing, 10)).unwrap();

        let s = block_on(link.next_submission());
        assert!(!link.abort_raised_since(link.abort_baseline(&s)));
    }

    #[test]
    fn test_abort_is_spent_by_the_move_it_stopped() {
        let link = TestLink::new();
        let _a = link.submit(cmd(Direction::Increasing, 10)).unwrap();
        let _b = link.submit(cmd(Direction::Increasing, 10)).unwrap();

        let first = block_on(link.next_submission());
        let baseline = link.abort_baseline(&first);
        link.request_abort();
        assert!(link.abort_raised_since(baseline));
        link.complete(first, 3, MoveResult::Aborted);

        // Queued behind the aborted move, so it still runs
        let second = block_on(link.next_submission());
        assert!(!link.abort_raised_since(link.abort_baseline(&second)));
    }

    #[test]
    fn test_post_event_reports_overflow() {
        let link = TestLink::new();
        for _ in 0..EVENT_QUEUE_DEPTH {
            assert!(link.post_event(AxisEvent::Tick));
        }
        assert!(!link.post_event(AxisEvent::Tick));
    }
}
