//! Host stand-ins for the orchestrator's collaborators
//!
//! Scripted axes that move instantly and log every submit and await, a
//! manual wall clock, a pause recorder and a status line.

use core::cell::{Cell, RefCell};
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use embedded_hal_async::delay::DelayNs;
use heapless::{Deque, Vec};
use railclock_hal::OutputPin;

use super::fault::Hand;
use super::state::{ClockState, SharedState};
use super::WallClock;
use crate::axis::{AxisControl, AxisError};
use crate::motion::{Direction, MotionCommand, MoveResult};

/// 2024-01-01T00:00:00Z
pub const NEW_YEAR: u64 = 1_704_067_200;

/// Epoch of `hour:minute` UTC on [`NEW_YEAR`]
pub fn at(hour: u64, minute: u64) -> u64 {
    NEW_YEAR + hour * 3600 + minute * 60
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Hand, command, position once it finishes, clock state at submit time
    Submit(Hand, MotionCommand, i32, ClockState),
    /// The orchestrator awaited this hand's result
    Await(Hand),
}

pub type SubmitRecord = (Hand, MotionCommand, i32, ClockState);

#[derive(Default)]
pub struct Journal {
    entries: RefCell<Vec<Entry, 64>>,
}

impl Journal {
    fn push(&self, entry: Entry) {
        self.entries.borrow_mut().push(entry).unwrap();
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn entries(&self) -> Vec<Entry, 64> {
        self.entries.borrow().clone()
    }

    pub fn submits(&self) -> Vec<SubmitRecord, 64> {
        self.entries
            .borrow()
            .iter()
            .filter_map(|entry| match *entry {
                Entry::Submit(hand, command, position, state) => {
                    Some((hand, command, position, state))
                }
                Entry::Await(_) => None,
            })
            .collect()
    }
}

/// Axis that finishes every move at submit time
///
/// Without a scripted result, a decreasing move that would pass zero stops
/// on the left limit and re-zeroes; anything else completes.
pub struct ScriptedAxis<'a> {
    hand: Hand,
    journal: &'a Journal,
    shared: &'a SharedState,
    position: Cell<i32>,
    script: RefCell<Deque<MoveResult, 8>>,
    aborts: Cell<u32>,
}

impl<'a> ScriptedAxis<'a> {
    pub fn new(hand: Hand, journal: &'a Journal, shared: &'a SharedState) -> Self {
        Self {
            hand,
            journal,
            shared,
            position: Cell::new(0),
            script: RefCell::new(Deque::new()),
            aborts: Cell::new(0),
        }
    }

    /// Force the result of the next move
    pub fn script(&self, result: MoveResult) {
        self.script.borrow_mut().push_back(result).unwrap();
    }

    pub fn position(&self) -> i32 {
        self.position.get()
    }

    pub fn aborts(&self) -> u32 {
        self.aborts.get()
    }
}

impl AxisControl for ScriptedAxis<'_> {
    type Pending<'b>
        = ScriptedMove<'b>
    where
        Self: 'b;

    fn submit(&self, command: MotionCommand) -> Result<Self::Pending<'_>, AxisError> {
        let current = self.position.get();
        let target = current + command.direction.sign() * command.step_count as i32;

        let scripted = self.script.borrow_mut().pop_front();
        let result = scripted.unwrap_or(
            if command.direction == Direction::Decreasing && target < 0 {
                MoveResult::HitLeftLimit
            } else {
                MoveResult::Completed
            },
        );
        match result {
            MoveResult::HitLeftLimit => self.position.set(0),
            MoveResult::Completed => self.position.set(target),
            _ => {}
        }

        self.journal.push(Entry::Submit(
            self.hand,
            command,
            self.position.get(),
            self.shared.get(),
        ));
        Ok(ScriptedMove {
            journal: self.journal,
            hand: self.hand,
            result,
        })
    }

    fn request_abort(&self) {
        self.aborts.set(self.aborts.get() + 1);
    }

    fn position_steps(&self) -> i32 {
        self.position.get()
    }
}

pub struct ScriptedMove<'a> {
    journal: &'a Journal,
    hand: Hand,
    result: MoveResult,
}

impl Future for ScriptedMove<'_> {
    type Output = MoveResult;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<MoveResult> {
        self.journal.push(Entry::Await(self.hand));
        Poll::Ready(self.result)
    }
}

#[derive(Default)]
pub struct ManualClock {
    epoch: Cell<u64>,
}

impl ManualClock {
    pub fn set(&self, epoch: u64) {
        self.epoch.set(epoch);
    }

    pub fn get(&self) -> u64 {
        self.epoch.get()
    }
}

impl WallClock for ManualClock {
    fn now_epoch(&self) -> u64 {
        self.epoch.get()
    }

    fn set_epoch(&self, epoch: u64) {
        self.epoch.set(epoch);
    }
}

/// Records every millisecond pause instead of sleeping
#[derive(Default)]
pub struct PauseLog {
    pauses: RefCell<Vec<u32, 16>>,
}

impl PauseLog {
    pub fn delay(&self) -> PauseDelay<'_> {
        PauseDelay {
            log: self,
            on_pause: None,
        }
    }

    /// Delay that also runs `hook` at every pause
    pub fn delay_with<'a>(&'a self, hook: &'a dyn Fn()) -> PauseDelay<'a> {
        PauseDelay {
            log: self,
            on_pause: Some(hook),
        }
    }

    pub fn recorded(&self) -> Vec<u32, 16> {
        self.pauses.borrow().clone()
    }
}

pub struct PauseDelay<'a> {
    log: &'a PauseLog,
    on_pause: Option<&'a dyn Fn()>,
}

impl DelayNs for PauseDelay<'_> {
    async fn delay_ns(&mut self, _ns: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.log.pauses.borrow_mut().push(ms).unwrap();
        if let Some(hook) = self.on_pause {
            hook();
        }
    }
}

#[derive(Default)]
pub struct StatusLine {
    level: Cell<bool>,
}

impl StatusLine {
    pub fn pin(&self) -> StatusPin<'_> {
        StatusPin(&self.level)
    }

    pub fn is_high(&self) -> bool {
        self.level.get()
    }
}

pub struct StatusPin<'a>(&'a Cell<bool>);

impl OutputPin for StatusPin<'_> {
    fn set_high(&mut self) {
        self.0.set(true);
    }

    fn set_low(&mut self) {
        self.0.set(false);
    }

    fn is_set_high(&self) -> bool {
        self.0.get()
    }
}
