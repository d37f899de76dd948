use alloc::vec::Vec;
use core::time::Duration;

/// The two timers a session owns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Timer {
    /// Game clock, repeats every period until cancelled.
    Clock,
    /// Touch hold detection, fires once.
    LongPress,
}

impl Timer {
    pub const fn repeats(self) -> bool {
        matches!(self, Self::Clock)
    }
}

/// Source of cancellable timers, provided by whatever hosts the session.
///
/// When a timer fires the host calls [`Session::on_timer`](crate::Session::on_timer). Cancelling a handle must
/// guarantee the timer never fires afterwards.
pub trait Scheduler {
    type Handle;

    fn schedule(&mut self, timer: Timer, after: Duration) -> Self::Handle;

    fn cancel(&mut self, handle: Self::Handle);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Copy, Clone, Debug, PartialEq)]
struct Scheduled {
    id: TimerId,
    timer: Timer,
    period: Duration,
    due: Duration,
}

/// Deterministic scheduler where time only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    scheduled: Vec<Scheduled>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self, timer: Timer) -> usize {
        self.scheduled.iter().filter(|s| s.timer == timer).count()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduled.is_empty()
    }

    /// Fires the earliest timer due no later than `until`. When nothing is due the clock moves to `until`.
    pub fn fire_next(&mut self, until: Duration) -> Option<Timer> {
        let Some(index) = self
            .scheduled
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due <= until)
            .min_by_key(|(_, s)| (s.due, s.id))
            .map(|(index, _)| index)
        else {
            self.now = self.now.max(until);
            return None;
        };

        let entry = &mut self.scheduled[index];
        let timer = entry.timer;
        self.now = entry.due;

        // a zero period would fire forever at the same instant
        if timer.repeats() && !entry.period.is_zero() {
            entry.due += entry.period;
        } else {
            self.scheduled.remove(index);
        }

        log::trace!("{:?} fired at {:?}", timer, self.now);
        Some(timer)
    }

    /// Moves time forward, returning every timer that fired in order.
    pub fn advance(&mut self, by: Duration) -> Vec<Timer> {
        let until = self.now + by;
        let mut fired = Vec::new();
        while let Some(timer) = self.fire_next(until) {
            fired.push(timer);
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    type Handle = TimerId;

    fn schedule(&mut self, timer: Timer, after: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.scheduled.push(Scheduled {
            id,
            timer,
            period: after,
            due: self.now + after,
        });
        id
    }

    fn cancel(&mut self, handle: TimerId) {
        self.scheduled.retain(|s| s.id != handle);
    }
}
