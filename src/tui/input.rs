use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::board::{Direction, DropTarget};

use super::interaction::Hit;
use super::state::BoardUi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Reload,
    DismissError,
    Focus(Direction),
    Move(Direction),
    Toggle,
    BeginDrag(String),
    DragOver(DropTarget),
    Drop(Option<DropTarget>),
    CancelDrag,
}

pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    let action = match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('r') => Action::Reload,
        KeyCode::Esc => Action::DismissError,
        KeyCode::Char(' ') | KeyCode::Char('t') => Action::Toggle,
        KeyCode::Char('h') | KeyCode::Left => Action::Focus(Direction::Left),
        KeyCode::Char('l') | KeyCode::Right => Action::Focus(Direction::Right),
        KeyCode::Char('k') | KeyCode::Up => Action::Focus(Direction::Up),
        KeyCode::Char('j') | KeyCode::Down => Action::Focus(Direction::Down),
        KeyCode::Char('H') => Action::Move(Direction::Left),
        KeyCode::Char('L') => Action::Move(Direction::Right),
        KeyCode::Char('K') => Action::Move(Direction::Up),
        KeyCode::Char('J') => Action::Move(Direction::Down),
        _ => return None,
    };
    Some(action)
}

pub fn action_for_mouse(mouse: MouseEvent, ui: &BoardUi) -> Option<Action> {
    let hit = ui.interaction_map.resolve(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => match hit {
            Some(Hit::DismissError) => Some(Action::DismissError),
            Some(Hit::Task { task_id, .. }) => Some(Action::BeginDrag(task_id.clone())),
            _ => None,
        },
        MouseEventKind::Drag(MouseButton::Left) => {
            ui.dragging.as_ref()?;
            let target = hit.and_then(Hit::drop_target)?;
            if ui.hover.as_ref() == Some(&target) {
                return None;
            }
            Some(Action::DragOver(target))
        }
        MouseEventKind::Up(MouseButton::Left) => {
            ui.dragging.as_ref()?;
            Some(Action::Drop(hit.and_then(Hit::drop_target)))
        }
        MouseEventKind::Down(MouseButton::Right) => {
            ui.dragging.as_ref()?;
            Some(Action::CancelDrag)
        }
        _ => None,
    }
}
