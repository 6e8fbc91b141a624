//! Timer registry on a virtual millisecond clock
//!
//! Periodic triggers and one-shot deferred actions live in one owned
//! collection. Nothing fires on its own: the engine pulls due timers with
//! [`TimerRegistry::pop_due`] and runs each step to completion before asking
//! for the next one, so a step that cancels timers is seen by the very next
//! pull. A cancelled timer is removed, never just flagged.

/// Handle to an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Periodic { period_ms: u64 },
    Once,
}

#[derive(Debug, Clone)]
struct Timer<K> {
    id: TimerId,
    key: K,
    due_ms: u64,
    schedule: Schedule,
}

/// A timer that came due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<K> {
    pub id: TimerId,
    pub key: K,
    /// Virtual time the timer fired at
    pub at_ms: u64,
}

/// Owned set of cancellable timers keyed by `K`
#[derive(Debug, Clone)]
pub struct TimerRegistry<K> {
    now_ms: u64,
    next_id: u64,
    timers: Vec<Timer<K>>,
}

impl<K> Default for TimerRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TimerRegistry<K> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            timers: Vec::new(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    fn allocate(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Fire every `period_ms`, first at now + period
    pub fn arm_periodic(&mut self, key: K, period_ms: u64) -> TimerId {
        let period_ms = period_ms.max(1);
        let id = self.allocate();
        self.timers.push(Timer {
            id,
            key,
            due_ms: self.now_ms + period_ms,
            schedule: Schedule::Periodic { period_ms },
        });
        id
    }

    /// Fire once after `delay_ms`
    pub fn arm_once(&mut self, key: K, delay_ms: u64) -> TimerId {
        let id = self.allocate();
        self.timers.push(Timer {
            id,
            key,
            due_ms: self.now_ms + delay_ms,
            schedule: Schedule::Once,
        });
        id
    }

    /// Returns false if the timer already fired (one-shot) or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Drop every armed timer, returning how many were armed
    pub fn cancel_all(&mut self) -> usize {
        let n = self.timers.len();
        self.timers.clear();
        n
    }

    /// Change a periodic timer's period; the next fire is now + period
    pub fn set_period(&mut self, id: TimerId, period_ms: u64) -> bool {
        let period_ms = period_ms.max(1);
        let now = self.now_ms;
        match self.timers.iter_mut().find(|t| t.id == id) {
            Some(timer) if matches!(timer.schedule, Schedule::Periodic { .. }) => {
                timer.schedule = Schedule::Periodic { period_ms };
                timer.due_ms = now + period_ms;
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    pub fn due_at(&self, id: TimerId) -> Option<u64> {
        self.timers.iter().find(|t| t.id == id).map(|t| t.due_ms)
    }

    /// Advance the clock without firing anything
    pub fn settle(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }
}

impl<K: Copy> TimerRegistry<K> {
    /// Pop the earliest timer due at or before `until_ms`.
    ///
    /// Ties go to the timer armed first. The clock moves to the fire time;
    /// periodic timers are rescheduled, one-shots are removed.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired<K>> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.id))
            .map(|(i, _)| i)?;

        let at_ms = self.timers[idx].due_ms;
        self.now_ms = self.now_ms.max(at_ms);

        let fired = match self.timers[idx].schedule {
            Schedule::Periodic { period_ms } => {
                let timer = &mut self.timers[idx];
                timer.due_ms += period_ms;
                Fired {
                    id: timer.id,
                    key: timer.key,
                    at_ms,
                }
            }
            Schedule::Once => {
                let timer = self.timers.swap_remove(idx);
                Fired {
                    id: timer.id,
                    key: timer.key,
                    at_ms,
                }
            }
        };
        Some(fired)
    }
}
