//! Kanban board state: an immutable snapshot of every task plus a reducer for
//! drag gestures. Column order is derived from each task's position in the
//! snapshot, and `order` is recomputed densely after every move.

pub mod controller;

pub use controller::{BoardController, DragResult, ROLLBACK_MESSAGE};

use crate::types::{Task, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Task(String),
    Column(TaskStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDrag {
    pub task_id: String,
    pub origin_status: TaskStatus,
    pub origin_order: i64,
}

/// What a finished drag changed for the dragged task. Only these two fields
/// are sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub task_id: String,
    pub from_status: TaskStatus,
    pub status: TaskStatus,
    pub order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardState {
    tasks: Vec<Task>,
    active: Option<ActiveDrag>,
}

impl BoardState {
    pub fn new(mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|task| task.order);
        Self {
            tasks,
            active: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        self.active.as_ref()
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn column(&self, status: TaskStatus) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.status == status)
            .collect()
    }

    pub fn columns(&self) -> Vec<(TaskStatus, Vec<&Task>)> {
        TaskStatus::ALL
            .iter()
            .map(|status| (*status, self.column(*status)))
            .collect()
    }

    pub fn begin_drag(&self, task_id: &str) -> Self {
        if self.active.is_some() {
            return self.clone();
        }
        let Some(task) = self.task(task_id) else {
            return self.clone();
        };

        let mut next = self.clone();
        next.active = Some(ActiveDrag {
            task_id: task.id.clone(),
            origin_status: task.status,
            origin_order: task.order,
        });
        next
    }

    /// Hovering a different column moves the card there right away. Nothing
    /// is reordered or persisted until the drop.
    pub fn drag_over(&self, task_id: &str, target: &DropTarget) -> Self {
        let DropTarget::Column(status) = target else {
            return self.clone();
        };

        let mut next = self.clone();
        if let Some(task) = next.tasks.iter_mut().find(|task| task.id == task_id)
            && task.status != *status
        {
            task.status = *status;
        }
        next
    }

    pub fn drag_end(
        &self,
        task_id: &str,
        target: Option<&DropTarget>,
    ) -> (Self, Option<MoveOutcome>) {
        let mut next = self.clone();
        let active = next
            .active
            .take()
            .filter(|active| active.task_id == task_id);

        let Some(src) = next.tasks.iter().position(|task| task.id == task_id) else {
            return (next, None);
        };
        let (origin_status, origin_order) = match &active {
            Some(active) => (active.origin_status, active.origin_order),
            None => (next.tasks[src].status, next.tasks[src].order),
        };

        let destination = match target {
            Some(DropTarget::Task(over_id)) if over_id != task_id => next
                .tasks
                .iter()
                .position(|task| task.id == *over_id)
                .map(|index| (next.tasks[index].status, Some(index))),
            Some(DropTarget::Column(status)) => Some((*status, None)),
            _ => None,
        };
        let Some((status, over_index)) = destination else {
            next.tasks[src].status = origin_status;
            return (next, None);
        };

        let mut dragged = next.tasks.remove(src);
        dragged.status = status;
        let dst = match over_index {
            Some(index) => index,
            None => next
                .tasks
                .iter()
                .rposition(|task| task.status == status)
                .map(|last| last + 1)
                .unwrap_or(src),
        };
        next.tasks.insert(dst.min(next.tasks.len()), dragged);

        if status == origin_status && dst == src {
            let unchanged = next.tasks[src].order == origin_order;
            if unchanged {
                return (next, None);
            }
        }

        next.recompute_order(&[origin_status, status]);

        let Some(moved) = next.task(task_id) else {
            return (next, None);
        };
        if moved.status == origin_status && moved.order == origin_order {
            return (next, None);
        }
        let outcome = MoveOutcome {
            task_id: task_id.to_string(),
            from_status: origin_status,
            status: moved.status,
            order: moved.order,
        };
        (next, Some(outcome))
    }

    /// Target that moves `task_id` one step in `direction`, or `None` at a
    /// board edge.
    pub fn neighbor_target(&self, task_id: &str, direction: Direction) -> Option<DropTarget> {
        let task = self.task(task_id)?;
        match direction {
            Direction::Up | Direction::Down => {
                let column = self.column(task.status);
                let index = column.iter().position(|other| other.id == task_id)?;
                let neighbor = match direction {
                    Direction::Up => index.checked_sub(1)?,
                    _ => index + 1,
                };
                column
                    .get(neighbor)
                    .map(|other| DropTarget::Task(other.id.clone()))
            }
            Direction::Left | Direction::Right => {
                let index = TaskStatus::ALL
                    .iter()
                    .position(|status| *status == task.status)?;
                let neighbor = match direction {
                    Direction::Left => index.checked_sub(1)?,
                    _ => index + 1,
                };
                TaskStatus::ALL
                    .get(neighbor)
                    .map(|status| DropTarget::Column(*status))
            }
        }
    }

    /// Replaces a task with the server's copy, keeping its board position.
    pub fn with_server_task(&self, mut task: Task) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.tasks.iter_mut().find(|existing| existing.id == task.id) {
            task.order = slot.order;
            *slot = task;
        }
        next
    }

    fn recompute_order(&mut self, statuses: &[TaskStatus]) {
        for status in statuses {
            let mut position = 0;
            for task in self.tasks.iter_mut().filter(|task| task.status == *status) {
                task.order = position;
                position += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Priority;

    fn task(id: &str, status: TaskStatus, order: i64) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {id}"),
            description: None,
            status,
            priority: Priority::Medium,
            due_date: None,
            created_at: String::new(),
            updated_at: String::new(),
            user_id: None,
            order,
        }
    }

    fn placements(state: &BoardState, status: TaskStatus) -> Vec<(String, i64)> {
        state
            .column(status)
            .iter()
            .map(|task| (task.id.clone(), task.order))
            .collect()
    }

    fn dense(state: &BoardState) -> bool {
        TaskStatus::ALL.iter().all(|status| {
            state
                .column(*status)
                .iter()
                .enumerate()
                .all(|(index, task)| task.order == index as i64)
        })
    }

    #[test]
    fn test_new_orders_columns_by_order() {
        let state = BoardState::new(vec![
            task("b", TaskStatus::Pending, 1),
            task("a", TaskStatus::Pending, 0),
        ]);
        assert_eq!(
            placements(&state, TaskStatus::Pending),
            vec![("a".to_string(), 0), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn test_drag_onto_task_above_swaps_orders() {
        let state = BoardState::new(vec![
            task("1", TaskStatus::Pending, 0),
            task("2", TaskStatus::Pending, 1),
        ]);

        let state = state.begin_drag("2");
        let (state, outcome) = state.drag_end("2", Some(&DropTarget::Task("1".to_string())));

        assert_eq!(
            placements(&state, TaskStatus::Pending),
            vec![("2".to_string(), 0), ("1".to_string(), 1)]
        );
        assert_eq!(
            outcome,
            Some(MoveOutcome {
                task_id: "2".to_string(),
                from_status: TaskStatus::Pending,
                status: TaskStatus::Pending,
                order: 0,
            })
        );
        assert!(state.active().is_none());
    }

    #[test]
    fn test_drop_into_empty_column_takes_order_zero() {
        let state = BoardState::new(vec![task("1", TaskStatus::Pending, 0)]);

        let state = state.begin_drag("1");
        let state = state.drag_over("1", &DropTarget::Column(TaskStatus::Completed));
        assert_eq!(
            state.task("1").map(|task| task.status),
            Some(TaskStatus::Completed)
        );

        let (state, outcome) =
            state.drag_end("1", Some(&DropTarget::Column(TaskStatus::Completed)));

        assert!(state.column(TaskStatus::Pending).is_empty());
        assert_eq!(
            placements(&state, TaskStatus::Completed),
            vec![("1".to_string(), 0)]
        );
        let outcome = outcome.expect("move should persist");
        assert_eq!(outcome.from_status, TaskStatus::Pending);
        assert_eq!((outcome.status, outcome.order), (TaskStatus::Completed, 0));
    }

    #[test]
    fn test_drop_on_column_appends_after_last_task() {
        let state = BoardState::new(vec![
            task("p1", TaskStatus::Pending, 0),
            task("c1", TaskStatus::Completed, 0),
            task("p2", TaskStatus::Pending, 1),
            task("c2", TaskStatus::Completed, 1),
        ]);

        let (state, outcome) =
            state.drag_end("p1", Some(&DropTarget::Column(TaskStatus::Completed)));

        assert_eq!(
            placements(&state, TaskStatus::Completed),
            vec![
                ("c1".to_string(), 0),
                ("c2".to_string(), 1),
                ("p1".to_string(), 2)
            ]
        );
        assert_eq!(
            placements(&state, TaskStatus::Pending),
            vec![("p2".to_string(), 0)]
        );
        assert_eq!(outcome.map(|outcome| outcome.order), Some(2));
        assert!(dense(&state));
    }

    #[test]
    fn test_drop_onto_task_in_other_column_takes_its_slot() {
        let state = BoardState::new(vec![
            task("c1", TaskStatus::Completed, 0),
            task("c2", TaskStatus::Completed, 1),
            task("p1", TaskStatus::Pending, 2),
        ]);

        let (state, outcome) = state.drag_end("p1", Some(&DropTarget::Task("c2".to_string())));

        assert_eq!(
            placements(&state, TaskStatus::Completed),
            vec![
                ("c1".to_string(), 0),
                ("p1".to_string(), 1),
                ("c2".to_string(), 2)
            ]
        );
        assert!(state.column(TaskStatus::Pending).is_empty());
        assert_eq!(
            outcome.map(|outcome| (outcome.status, outcome.order)),
            Some((TaskStatus::Completed, 1))
        );
    }

    #[test]
    fn test_drop_on_self_is_a_no_op() {
        let state = BoardState::new(vec![
            task("1", TaskStatus::Pending, 0),
            task("2", TaskStatus::Pending, 1),
        ]);
        let before = state.clone();

        let dragging = state.begin_drag("2");
        let (after, outcome) = dragging.drag_end("2", Some(&DropTarget::Task("2".to_string())));

        assert_eq!(outcome, None);
        assert_eq!(after, before);
    }

    #[test]
    fn test_drop_without_target_restores_origin_status() {
        let state = BoardState::new(vec![task("1", TaskStatus::Pending, 0)]);

        let state = state.begin_drag("1");
        let state = state.drag_over("1", &DropTarget::Column(TaskStatus::Completed));
        let (state, outcome) = state.drag_end("1", None);

        assert_eq!(outcome, None);
        assert_eq!(
            state.task("1").map(|task| task.status),
            Some(TaskStatus::Pending)
        );
        assert!(state.active().is_none());
    }

    #[test]
    fn test_drop_on_own_column_at_end_is_a_no_op() {
        let state = BoardState::new(vec![
            task("1", TaskStatus::Pending, 0),
            task("2", TaskStatus::Pending, 1),
        ]);

        let (after, outcome) =
            state.drag_end("2", Some(&DropTarget::Column(TaskStatus::Pending)));

        assert_eq!(outcome, None);
        assert_eq!(after.tasks(), state.tasks());
    }

    #[test]
    fn test_begin_drag_ignored_while_drag_active() {
        let state = BoardState::new(vec![
            task("1", TaskStatus::Pending, 0),
            task("2", TaskStatus::Pending, 1),
        ]);

        let state = state.begin_drag("1").begin_drag("2");
        assert_eq!(
            state.active().map(|active| active.task_id.as_str()),
            Some("1")
        );

        let unknown = BoardState::default().begin_drag("missing");
        assert!(unknown.active().is_none());
    }

    #[test]
    fn test_reorder_repairs_sparse_orders() {
        let state = BoardState::new(vec![
            task("1", TaskStatus::Pending, 0),
            task("2", TaskStatus::Pending, 5),
            task("3", TaskStatus::Pending, 9),
        ]);

        let (state, outcome) = state.drag_end("1", Some(&DropTarget::Task("3".to_string())));

        assert_eq!(
            placements(&state, TaskStatus::Pending),
            vec![
                ("2".to_string(), 0),
                ("3".to_string(), 1),
                ("1".to_string(), 2)
            ]
        );
        assert!(outcome.is_some());
        assert!(dense(&state));
    }

    #[test]
    fn test_neighbor_target_respects_board_edges() {
        let state = BoardState::new(vec![
            task("1", TaskStatus::Pending, 0),
            task("2", TaskStatus::Pending, 1),
            task("3", TaskStatus::Completed, 0),
        ]);

        assert_eq!(state.neighbor_target("1", Direction::Up), None);
        assert_eq!(
            state.neighbor_target("1", Direction::Down),
            Some(DropTarget::Task("2".to_string()))
        );
        assert_eq!(state.neighbor_target("1", Direction::Left), None);
        assert_eq!(
            state.neighbor_target("1", Direction::Right),
            Some(DropTarget::Column(TaskStatus::Completed))
        );
        assert_eq!(state.neighbor_target("3", Direction::Right), None);
    }

    #[test]
    fn test_move_down_places_task_after_neighbor() {
        let state = BoardState::new(vec![
            task("1", TaskStatus::Pending, 0),
            task("2", TaskStatus::Pending, 1),
            task("3", TaskStatus::Pending, 2),
        ]);

        let target = state.neighbor_target("1", Direction::Down);
        let (state, _) = state.drag_end("1", target.as_ref());

        assert_eq!(
            placements(&state, TaskStatus::Pending),
            vec![
                ("2".to_string(), 0),
                ("1".to_string(), 1),
                ("3".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_with_server_task_keeps_local_order() {
        let state = BoardState::new(vec![task("1", TaskStatus::Pending, 3)]);
        let mut server_copy = task("1", TaskStatus::Completed, 0);
        server_copy.title = "Renamed".to_string();

        let state = state.with_server_task(server_copy);
        let updated = state.task("1").expect("task should remain");
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.order, 3);
    }
}
