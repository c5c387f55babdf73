//! Cancellable timers on the virtual clock
//!
//! Timers are the only cancellable units of work in the interaction layer.
//! A timer is either one-shot ([`TimerQueue::after`]) or repeating
//! ([`TimerQueue::every`]); repeating callbacks return [`ControlFlow`] to
//! decide whether they run again.
//!
//! Due timers fire in deadline order, ties broken by scheduling order.
//! Callbacks may schedule or cancel other timers (including themselves).

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::clock::{Clock, Millis};

new_key_type! {
    /// Handle to a scheduled timer
    pub struct TimerId;
}

/// Whether a repeating timer should keep running
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Stop,
}

enum Callback {
    Once(Box<dyn FnOnce()>),
    Repeat(Box<dyn FnMut() -> ControlFlow>),
}

struct TimerEntry {
    deadline: Millis,
    /// Scheduling sequence, for stable ordering of equal deadlines
    seq: u64,
    interval: Option<Millis>,
    /// Taken while the callback runs
    callback: Option<Callback>,
}

#[derive(Default)]
struct TimerInner {
    timers: SlotMap<TimerId, TimerEntry>,
    next_seq: u64,
}

impl TimerInner {
    fn insert(&mut self, deadline: Millis, interval: Option<Millis>, callback: Callback) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert(TimerEntry {
            deadline,
            seq,
            interval,
            callback: Some(callback),
        })
    }

    /// Earliest runnable timer at or before `now`
    fn next_due(&self, now: Millis) -> Option<TimerId> {
        self.timers
            .iter()
            .filter(|(_, t)| t.callback.is_some() && t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.seq))
            .map(|(id, _)| id)
    }
}

/// Timer queue shared by every component of a session
#[derive(Clone)]
pub struct TimerQueue {
    inner: Rc<RefCell<TimerInner>>,
    clock: Clock,
}

impl TimerQueue {
    pub fn new(clock: Clock) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TimerInner::default())),
            clock,
        }
    }

    /// The clock this queue schedules against
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Current time
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Run `f` once after `delay` ms
    pub fn after<F>(&self, delay: Millis, f: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        let deadline = self.clock.now() + delay;
        self.inner
            .borrow_mut()
            .insert(deadline, None, Callback::Once(Box::new(f)))
    }

    /// Run `f` every `interval` ms (first run after one interval) until it
    /// returns [`ControlFlow::Stop`] or the timer is cancelled
    pub fn every<F>(&self, interval: Millis, f: F) -> TimerId
    where
        F: FnMut() -> ControlFlow + 'static,
    {
        let interval = interval.max(1);
        let deadline = self.clock.now() + interval;
        self.inner
            .borrow_mut()
            .insert(deadline, Some(interval), Callback::Repeat(Box::new(f)))
    }

    /// Cancel a pending timer
    ///
    /// Returns `false` if the timer already fired or was cancelled.
    pub fn cancel(&self, id: TimerId) -> bool {
        self.inner.borrow_mut().timers.remove(id).is_some()
    }

    /// Cancel `previous` (if any) and return `next`
    ///
    /// Convenience for the "replace the pending timer for this task" pattern.
    pub fn replace(&self, previous: Option<TimerId>, next: impl FnOnce(&Self) -> TimerId) -> TimerId {
        if let Some(previous) = previous {
            self.cancel(previous);
        }
        next(self)
    }

    /// Whether the timer is still scheduled
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.inner.borrow().timers.contains_key(id)
    }

    /// Number of scheduled timers
    pub fn len(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Earliest deadline among scheduled timers
    pub fn next_deadline(&self) -> Option<Millis> {
        self.inner
            .borrow()
            .timers
            .values()
            .filter(|t| t.callback.is_some())
            .map(|t| t.deadline)
            .min()
    }

    /// Cancel every timer
    pub fn clear(&self) {
        // Drop callbacks outside the borrow; they may own other queue handles
        let drained: Vec<TimerEntry> = {
            let mut inner = self.inner.borrow_mut();
            let ids: Vec<TimerId> = inner.timers.keys().collect();
            ids.into_iter()
                .filter_map(|id| inner.timers.remove(id))
                .collect()
        };
        drop(drained);
    }

    /// Fire every timer due at or before `now`
    ///
    /// Returns the number of callbacks run.
    pub fn fire_due(&self, now: Millis) -> usize {
        let mut fired = 0;
        loop {
            let (id, callback) = {
                let mut inner = self.inner.borrow_mut();
                let Some(id) = inner.next_due(now) else {
                    break;
                };
                let entry = &mut inner.timers[id];
                let callback = entry.callback.take();
                if entry.interval.is_none() {
                    inner.timers.remove(id);
                }
                (id, callback)
            };

            fired += 1;
            match callback {
                Some(Callback::Once(f)) => f(),
                Some(Callback::Repeat(mut f)) => {
                    let flow = f();
                    let mut inner = self.inner.borrow_mut();
                    match (flow, inner.timers.get_mut(id)) {
                        (ControlFlow::Continue, Some(entry)) => {
                            entry.deadline += entry.interval.unwrap_or(1);
                            entry.callback = Some(Callback::Repeat(f));
                        }
                        (ControlFlow::Stop, Some(_)) => {
                            inner.timers.remove(id);
                        }
                        // Cancelled from inside its own callback
                        (_, None) => {}
                    }
                }
                None => {}
            }
        }
        fired
    }
}

impl std::fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerQueue")
            .field("now", &self.clock.now())
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn queue() -> TimerQueue {
        TimerQueue::new(Clock::new())
    }

    #[test]
    fn test_once_fires_at_deadline() {
        let timers = queue();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        timers.after(100, move || h.set(h.get() + 1));

        assert_eq!(timers.next_deadline(), Some(100));
        assert_eq!(timers.fire_due(99), 0);
        assert_eq!(timers.fire_due(100), 1);
        assert_eq!(hits.get(), 1);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_fire_order_is_deadline_then_schedule_order() {
        let timers = queue();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, delay) in [("b", 20), ("a", 10), ("c", 20)] {
            let log = log.clone();
            timers.after(delay, move || log.borrow_mut().push(name));
        }
        timers.fire_due(50);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cancel() {
        let timers = queue();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let id = timers.after(10, move || h.set(1));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        timers.fire_due(100);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_every_until_stop() {
        let timers = queue();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let id = timers.every(50, move || {
            c.set(c.get() + 1);
            if c.get() == 3 {
                ControlFlow::Stop
            } else {
                ControlFlow::Continue
            }
        });

        timers.fire_due(120);
        assert_eq!(count.get(), 2);
        assert!(timers.is_pending(id));
        timers.fire_due(1000);
        assert_eq!(count.get(), 3);
        assert!(!timers.is_pending(id));
    }

    #[test]
    fn test_repeating_timer_cancelled_from_own_callback() {
        let timers = queue();
        let slot: Rc<Cell<Option<TimerId>>> = Rc::new(Cell::new(None));
        let count = Rc::new(Cell::new(0));

        let t = timers.clone();
        let s = slot.clone();
        let c = count.clone();
        let id = timers.every(10, move || {
            c.set(c.get() + 1);
            if let Some(id) = s.get() {
                t.cancel(id);
            }
            ControlFlow::Continue
        });
        slot.set(Some(id));

        timers.fire_due(100);
        assert_eq!(count.get(), 1);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_replace_cancels_previous() {
        let timers = queue();
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = log.clone();
        let first = timers.after(10, move || l1.borrow_mut().push(1));
        let l2 = log.clone();
        timers.replace(Some(first), |t| t.after(10, move || l2.borrow_mut().push(2)));
        timers.fire_due(10);
        assert_eq!(*log.borrow(), vec![2]);
    }

    #[test]
    fn test_callback_can_schedule_due_timer() {
        let timers = queue();
        let hits = Rc::new(Cell::new(0));
        let t = timers.clone();
        let h = hits.clone();
        timers.after(5, move || {
            let h = h.clone();
            t.after(0, move || h.set(h.get() + 1));
        });
        // The nested timer is due at clock time 0 and fires in the same pass
        assert_eq!(timers.fire_due(5), 2);
        assert_eq!(hits.get(), 1);
    }
}
