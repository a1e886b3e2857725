//! Virtual-clock task scheduler
//!
//! Owns every periodic and deferred task of a session. The host advances a
//! millisecond clock and drains due tasks one at a time, so handlers may
//! cancel or schedule tasks between firings.

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// What a task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Whole-second countdown step
    CoarseTick,
    /// 10 ms display sub-counter
    FineTick,
    /// Animation and movement update
    Frame,
    /// Deferred move to the next question
    AdvanceQuestion,
}

#[derive(Debug, Clone)]
struct Task {
    id: TaskId,
    kind: TaskKind,
    due: u64,
    period: Option<u64>,
}

/// Cancellable tasks on a virtual millisecond clock
#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    next_id: u64,
    tasks: Vec<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    fn push(&mut self, kind: TaskKind, due: u64, period: Option<u64>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task { id, kind, due, period });
        id
    }

    /// Fire once, `delay_ms` from now
    pub fn schedule_once(&mut self, kind: TaskKind, delay_ms: u64) -> TaskId {
        self.push(kind, self.now + delay_ms, None)
    }

    /// Fire every `period_ms`, first firing one period from now
    pub fn schedule_every(&mut self, kind: TaskKind, period_ms: u64) -> TaskId {
        let period = period_ms.max(1);
        self.push(kind, self.now + period, Some(period))
    }

    /// Returns false if the task had already fired or been cancelled
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Number of live tasks of `kind`
    pub fn count(&self, kind: TaskKind) -> usize {
        self.tasks.iter().filter(|t| t.kind == kind).count()
    }

    /// Pop the earliest task due at or before `until`, moving the clock to its
    /// due time. Ties fire in registration order.
    pub fn pop_due(&mut self, until: u64) -> Option<(TaskId, TaskKind)> {
        let (index, _) = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.id))?;

        let task = &mut self.tasks[index];
        let fired = (task.id, task.kind);
        self.now = self.now.max(task.due);
        match task.period {
            Some(period) => task.due += period,
            None => {
                self.tasks.swap_remove(index);
            }
        }
        Some(fired)
    }

    /// Move the clock forward once every due task has been drained
    pub fn settle(&mut self, until: u64) {
        self.now = self.now.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler, until: u64) -> Vec<(u64, TaskKind)> {
        let mut fired = Vec::new();
        while let Some((_, kind)) = scheduler.pop_due(until) {
            fired.push((scheduler.now(), kind));
        }
        scheduler.settle(until);
        fired
    }

    #[test]
    fn test_once_fires_once() {
        let mut s = Scheduler::new();
        let id = s.schedule_once(TaskKind::AdvanceQuestion, 1000);
        assert!(drain(&mut s, 999).is_empty());
        assert!(s.is_scheduled(id));
        assert_eq!(drain(&mut s, 1000), vec![(1000, TaskKind::AdvanceQuestion)]);
        assert!(!s.is_scheduled(id));
        assert!(drain(&mut s, 5000).is_empty());
    }

    #[test]
    fn test_periodic_and_ties_in_registration_order() {
        let mut s = Scheduler::new();
        s.schedule_every(TaskKind::CoarseTick, 1000);
        s.schedule_every(TaskKind::FineTick, 500);
        let fired = drain(&mut s, 2000);
        assert_eq!(
            fired,
            vec![
                (500, TaskKind::FineTick),
                (1000, TaskKind::CoarseTick),
                (1000, TaskKind::FineTick),
                (1500, TaskKind::FineTick),
                (2000, TaskKind::CoarseTick),
                (2000, TaskKind::FineTick),
            ]
        );
        assert_eq!(s.now(), 2000);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let id = s.schedule_every(TaskKind::Frame, 16);
        assert_eq!(drain(&mut s, 40).len(), 2);
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(drain(&mut s, 1000).is_empty());
        assert_eq!(s.count(TaskKind::Frame), 0);
    }

    #[test]
    fn test_schedule_relative_to_firing_time() {
        let mut s = Scheduler::new();
        s.schedule_once(TaskKind::CoarseTick, 100);
        let (_, kind) = s.pop_due(1000).unwrap();
        assert_eq!(kind, TaskKind::CoarseTick);
        // A task scheduled from inside a handler counts from the firing instant
        s.schedule_once(TaskKind::AdvanceQuestion, 100);
        assert_eq!(drain(&mut s, 1000), vec![(200, TaskKind::AdvanceQuestion)]);
    }
}
