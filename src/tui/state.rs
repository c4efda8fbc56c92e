use std::collections::HashMap;

use crate::board::{BoardState, Direction, DragResult, DropTarget};
use crate::types::TaskStatus;

use super::interaction::InteractionMap;

/// View state of the interactive board: focus, selection, the drag in
/// progress and the hit regions of the last frame.
#[derive(Debug, Default)]
pub struct BoardUi {
    pub focused_column: usize,
    pub selected: HashMap<TaskStatus, usize>,
    pub scroll: HashMap<TaskStatus, usize>,
    pub dragging: Option<String>,
    pub hover: Option<DropTarget>,
    pub notice: Option<String>,
    pub user_label: String,
    pub should_quit: bool,
    pub interaction_map: InteractionMap,
}

impl BoardUi {
    pub fn new(user_label: impl Into<String>) -> Self {
        Self {
            user_label: user_label.into(),
            ..Self::default()
        }
    }

    pub fn focused_status(&self) -> TaskStatus {
        TaskStatus::ALL
            .get(self.focused_column)
            .copied()
            .unwrap_or(TaskStatus::Pending)
    }

    pub fn selected_index(&self, status: TaskStatus) -> usize {
        self.selected.get(&status).copied().unwrap_or(0)
    }

    pub fn selected_task(&self, state: &BoardState) -> Option<String> {
        let status = self.focused_status();
        state
            .column(status)
            .get(self.selected_index(status))
            .map(|task| task.id.clone())
    }

    /// Moves focus between columns or selection within the focused column.
    pub fn focus_step(&mut self, state: &BoardState, direction: Direction) {
        match direction {
            Direction::Left => {
                self.focused_column = self.focused_column.saturating_sub(1);
            }
            Direction::Right => {
                self.focused_column = (self.focused_column + 1).min(TaskStatus::ALL.len() - 1);
            }
            Direction::Up | Direction::Down => {
                let status = self.focused_status();
                let len = state.column(status).len();
                if len == 0 {
                    return;
                }
                let current = self.selected_index(status).min(len - 1);
                let next = match direction {
                    Direction::Up => current.saturating_sub(1),
                    _ => (current + 1).min(len - 1),
                };
                self.selected.insert(status, next);
            }
        }
    }

    /// Puts focus and selection on `task_id` wherever it now sits.
    pub fn follow(&mut self, state: &BoardState, task_id: &str) {
        for (column, status) in TaskStatus::ALL.iter().enumerate() {
            if let Some(index) = state
                .column(*status)
                .iter()
                .position(|task| task.id == task_id)
            {
                self.focused_column = column;
                self.selected.insert(*status, index);
                return;
            }
        }
    }

    /// Keeps selections inside their columns after the board changed shape.
    pub fn clamp(&mut self, state: &BoardState) {
        for status in TaskStatus::ALL {
            let len = state.column(status).len();
            let index = self.selected_index(status);
            self.selected.insert(status, index.min(len.saturating_sub(1)));
        }
    }

    pub fn record(&mut self, result: &DragResult) {
        self.notice = match result {
            DragResult::NoChange => None,
            DragResult::Persisted(task) => Some(format!("Moved \"{}\"", task.title)),
            DragResult::RolledBack(err) => Some(err.user_message()),
        };
    }
}
