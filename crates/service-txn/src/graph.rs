//! Task graph bookkeeping
//!
//! Tracks which tasks are waiting, running, executed or done. A task is done
//! once it has executed and every child it spawned is done; only done tasks
//! satisfy dependencies.

use crate::task::{ErasedTask, TaskId};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskStatus {
    Waiting,
    Running,
    Executed,
    Done,
}

struct TaskSlot {
    name: String,
    task: Option<Arc<dyn ErasedTask>>,
    dependencies: Vec<TaskId>,
    parent: Option<TaskId>,
    pending_children: usize,
    status: TaskStatus,
}

/// A task handed out for execution
pub(crate) struct ReadyTask {
    pub id: TaskId,
    pub name: String,
    pub task: Arc<dyn ErasedTask>,
}

#[derive(Default)]
pub(crate) struct TaskGraph {
    slots: Vec<TaskSlot>,
}

impl TaskGraph {
    pub fn insert(
        &mut self,
        name: String,
        task: Arc<dyn ErasedTask>,
        dependencies: Vec<TaskId>,
        parent: Option<TaskId>,
    ) -> TaskId {
        let id = TaskId(self.slots.len());
        let dependencies = dependencies
            .into_iter()
            .filter(|dep| {
                let known = dep.0 < self.slots.len();
                if !known {
                    warn!("Task {} declared unknown dependency {}", name, dep);
                }
                known
            })
            .collect();

        if let Some(parent) = parent {
            if let Some(slot) = self.slots.get_mut(parent.0) {
                slot.pending_children += 1;
            }
        }

        self.slots.push(TaskSlot {
            name,
            task: Some(task),
            dependencies,
            parent,
            pending_children: 0,
            status: TaskStatus::Waiting,
        });
        id
    }

    /// Every waiting task whose dependencies are done, in creation order
    pub fn take_ready(&mut self) -> Vec<ReadyTask> {
        let ready: Vec<usize> = (0..self.slots.len())
            .filter(|&index| {
                let slot = &self.slots[index];
                slot.status == TaskStatus::Waiting
                    && slot
                        .dependencies
                        .iter()
                        .all(|dep| self.slots[dep.0].status == TaskStatus::Done)
            })
            .collect();

        ready
            .into_iter()
            .filter_map(|index| {
                let slot = &mut self.slots[index];
                slot.status = TaskStatus::Running;
                slot.task.take().map(|task| ReadyTask {
                    id: TaskId(index),
                    name: slot.name.clone(),
                    task,
                })
            })
            .collect()
    }

    pub fn mark_executed(&mut self, id: TaskId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.status = TaskStatus::Executed;
        }
        self.try_complete(id);
    }

    fn try_complete(&mut self, id: TaskId) {
        let mut current = Some(id);
        while let Some(id) = current.take() {
            let Some(slot) = self.slots.get_mut(id.0) else {
                return;
            };
            if slot.status != TaskStatus::Executed || slot.pending_children > 0 {
                return;
            }
            slot.status = TaskStatus::Done;
            if let Some(parent) = slot.parent {
                if let Some(parent_slot) = self.slots.get_mut(parent.0) {
                    parent_slot.pending_children -= 1;
                    current = Some(parent);
                }
            }
        }
    }

    pub fn is_done(&self, id: TaskId) -> bool {
        self.slots
            .get(id.0)
            .is_some_and(|slot| slot.status == TaskStatus::Done)
    }

    pub fn unfinished(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status != TaskStatus::Done)
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
