// Cooperative scheduling primitives: interval and one-shot tasks driven by an
// explicit clock, and generation stamps for deferred work.

use tracing::trace;

/// Game time in seconds.
pub type GameTime = f64;

/// Cancellation handle returned for every scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Monotonically increasing stamp source for deferred work.
///
/// Work scheduled with stamp `n` should act only if `is_current(n)` still
/// holds when it fires; any later `bump` supersedes it.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    latest: u64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new stamp, invalidating every earlier one.
    pub fn bump(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn current(&self) -> u64 {
        self.latest
    }

    pub fn is_current(&self, stamp: u64) -> bool {
        stamp == self.latest
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TaskHandle,
    due: GameTime,
    period: Option<GameTime>,
    task: T,
}

/// Timer wheel over an externally advanced clock.
///
/// Nothing runs on its own: the owner calls [`Scheduler::advance_to`] and
/// handles whatever tasks fell due, in due order.
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: GameTime,
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T: Clone> Scheduler<T> {
    pub fn new(now: GameTime) -> Self {
        Scheduler {
            now,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> GameTime {
        self.now
    }

    pub fn schedule_once(&mut self, delay: GameTime, task: T) -> TaskHandle {
        self.insert(self.now + delay.max(0.0), None, task)
    }

    /// Schedule `task` every `period` seconds, first firing one period from now.
    pub fn schedule_every(&mut self, period: GameTime, task: T) -> TaskHandle {
        self.insert(self.now + period, Some(period), task)
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        before != self.entries.len()
    }

    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Move the clock to `now` and return every task that fell due.
    ///
    /// A periodic task fires at most once per call and is re-armed on its
    /// own cadence, skipping periods that were missed entirely.
    pub fn advance_to(&mut self, now: GameTime) -> Vec<T> {
        if now > self.now {
            self.now = now;
        }
        let now = self.now;

        let mut due: Vec<(GameTime, TaskHandle)> = self
            .entries
            .iter()
            .filter(|e| e.due <= now)
            .map(|e| (e.due, e.handle))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut fired = Vec::with_capacity(due.len());
        for (_, handle) in due {
            let Some(idx) = self.entries.iter().position(|e| e.handle == handle) else {
                continue;
            };
            match self.entries[idx].period {
                Some(period) if period > 0.0 => {
                    let entry = &mut self.entries[idx];
                    let missed = ((now - entry.due) / period).floor() + 1.0;
                    entry.due += period * missed;
                    fired.push(entry.task.clone());
                }
                _ => {
                    let entry = self.entries.remove(idx);
                    fired.push(entry.task);
                }
            }
        }
        if !fired.is_empty() {
            trace!("{} scheduled task(s) fired at t={now:.2}", fired.len());
        }
        fired
    }

    fn insert(&mut self, due: GameTime, period: Option<GameTime>, task: T) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        self.entries.push(Entry {
            handle,
            due,
            period,
            task,
        });
        handle
    }
}
