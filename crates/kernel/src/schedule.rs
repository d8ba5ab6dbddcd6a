use crate::grid::TileKey;
use gq_common::ActorId;

/// Recurring work the world performs on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Move a falling actor one level down.
    Fall(ActorId),
    /// Close an open door once nothing stands in it.
    DoorClose(TileKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    pub kind: TaskKind,
    pub period: u64,
    pub due: u64,
}

/// Logical-clock task list.
///
/// The driver advances time; due tasks are handed back in insertion order
/// and the caller decides whether each one runs again.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticks elapsed.
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Queued tasks, in the order they were scheduled.
    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.tasks
    }

    /// Whether a task of this kind is queued.
    pub fn contains(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    /// Queue `kind` to fire `period` ticks from now. A task that is already
    /// queued is left alone.
    pub fn schedule(&mut self, kind: TaskKind, period: u64) -> bool {
        if self.contains(kind) {
            return false;
        }
        let period = period.max(1);
        self.tasks.push(ScheduledTask {
            kind,
            period,
            due: self.now + period,
        });
        true
    }

    /// Drop a queued task. Returns whether one was queued.
    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.kind != kind);
        before != self.tasks.len()
    }

    /// Rewrite every task that refers to `old`.
    pub fn rename_actor(&mut self, old: ActorId, new: ActorId) {
        for task in &mut self.tasks {
            if task.kind == TaskKind::Fall(old) {
                task.kind = TaskKind::Fall(new);
            }
        }
    }

    /// Advance the clock one tick and take the tasks now due.
    pub fn advance(&mut self) -> Vec<ScheduledTask> {
        self.now += 1;
        let now = self.now;
        let (due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = pending;
        due
    }

    /// Put a task that just fired back in the queue for its next period.
    pub fn requeue(&mut self, task: ScheduledTask) {
        if self.contains(task.kind) {
            return;
        }
        self.tasks.push(ScheduledTask {
            due: self.now + task.period,
            ..task
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_fires_after_period() {
        let mut s = Scheduler::new();
        s.schedule(TaskKind::Fall(ActorId(1)), 2);
        assert!(s.advance().is_empty());
        let due = s.advance();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].kind, TaskKind::Fall(ActorId(1)));
        assert!(s.is_empty());
    }

    #[test]
    fn duplicate_schedule_ignored() {
        let mut s = Scheduler::new();
        assert!(s.schedule(TaskKind::Fall(ActorId(1)), 1));
        assert!(!s.schedule(TaskKind::Fall(ActorId(1)), 1));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn requeue_uses_period() {
        let mut s = Scheduler::new();
        s.schedule(TaskKind::Fall(ActorId(1)), 3);
        for _ in 0..2 {
            assert!(s.advance().is_empty());
        }
        let task = s.advance().remove(0);
        s.requeue(task);
        assert_eq!(s.tasks()[0].due, s.now() + 3);
    }

    #[test]
    fn due_tasks_keep_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule(TaskKind::Fall(ActorId(2)), 1);
        s.schedule(TaskKind::Fall(ActorId(1)), 1);
        let kinds: Vec<_> = s.advance().into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TaskKind::Fall(ActorId(2)), TaskKind::Fall(ActorId(1))]
        );
    }

    #[test]
    fn cancel_and_rename() {
        let mut s = Scheduler::new();
        s.schedule(TaskKind::Fall(ActorId(1)), 1);
        s.rename_actor(ActorId(1), ActorId(9));
        assert!(s.contains(TaskKind::Fall(ActorId(9))));
        assert!(s.cancel(TaskKind::Fall(ActorId(9))));
        assert!(!s.cancel(TaskKind::Fall(ActorId(9))));
    }
}
