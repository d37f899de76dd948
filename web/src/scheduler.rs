use gloo::timers::callback::{Interval, Timeout};
use retrosweeper_core::{Scheduler, Timer};
use std::time::Duration;
use yew::html::Scope;

use crate::game::{GameView, Msg};

/// Browser timer, cleared when dropped.
pub(crate) enum TimerHandle {
    Repeating(Interval),
    Once(Timeout),
}

/// Schedules session timers on the browser event loop, delivering them back to the view as messages.
pub(crate) struct GlooScheduler {
    link: Scope<GameView>,
}

impl GlooScheduler {
    pub(crate) fn new(link: Scope<GameView>) -> Self {
        Self { link }
    }
}

impl Scheduler for GlooScheduler {
    type Handle = TimerHandle;

    fn schedule(&mut self, timer: Timer, after: Duration) -> TimerHandle {
        let millis = after.as_millis().try_into().unwrap_or(u32::MAX);
        let link = self.link.clone();
        let fire = move || link.send_message(Msg::TimerFired(timer));

        log::trace!("scheduling {:?} in {}ms", timer, millis);
        if timer.repeats() {
            TimerHandle::Repeating(Interval::new(millis, fire))
        } else {
            TimerHandle::Once(Timeout::new(millis, fire))
        }
    }

    fn cancel(&mut self, handle: TimerHandle) {
        match handle {
            TimerHandle::Repeating(interval) => drop(interval.cancel()),
            TimerHandle::Once(timeout) => drop(timeout.cancel()),
        }
    }
}
