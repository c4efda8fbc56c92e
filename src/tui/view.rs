use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    },
};

use crate::board::{BoardState, DropTarget};
use crate::types::{Priority, Task, TaskStatus, format_due_date};

use super::interaction::{Hit, InteractionLayer};
use super::state::BoardUi;

const MIN_COLUMN_WIDTH: u16 = 20;
const CARD_HEIGHT: u16 = 2;
const CARD_STRIDE: u16 = 3;

pub const HELP: &str = concat!(
    "h/l j/k: select  H/L: move column  J/K: reorder  ",
    "space: toggle  drag: mouse  r: reload  q: quit",
);

pub fn render(frame: &mut Frame<'_>, ui: &mut BoardUi, state: &BoardState, error: Option<&str>) {
    ui.interaction_map.clear();

    let banner_height = u16::from(error.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], ui, state);
    if let Some(message) = error {
        render_error_banner(frame, chunks[1], ui, message);
    }
    render_columns(frame, chunks[2], ui, state);
    render_footer(frame, chunks[3], ui);
}

fn render_header(frame: &mut Frame<'_>, area: Rect, ui: &BoardUi, state: &BoardState) {
    let header = Block::default()
        .borders(Borders::TOP | Borders::LEFT | Borders::RIGHT)
        .title(" taskdeck board ")
        .title_alignment(Alignment::Left);
    let summary = Block::default()
        .title(format!(" {} | {} tasks ", ui.user_label, state.tasks().len()))
        .title_alignment(Alignment::Right);

    frame.render_widget(header, area);
    frame.render_widget(summary, area);
}

fn render_error_banner(frame: &mut Frame<'_>, area: Rect, ui: &mut BoardUi, message: &str) {
    let banner = Paragraph::new(format!(" {message}  [Esc/click to dismiss] "))
        .style(Style::default().fg(Color::White).bg(Color::Red))
        .alignment(Alignment::Center);
    frame.render_widget(banner, area);
    ui.interaction_map
        .register(InteractionLayer::Banner, area, Hit::DismissError);
}

fn render_footer(frame: &mut Frame<'_>, area: Rect, ui: &BoardUi) {
    let notice = match (&ui.dragging, &ui.notice) {
        (Some(_), _) => "Dragging: release over a card or column, right click to cancel",
        (None, Some(notice)) => notice.as_str(),
        (None, None) => HELP,
    };
    let footer = Block::default()
        .borders(Borders::BOTTOM | Borders::LEFT | Borders::RIGHT)
        .title(format!(" {notice} "))
        .title_alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

fn render_columns(frame: &mut Frame<'_>, area: Rect, ui: &mut BoardUi, state: &BoardState) {
    let count = TaskStatus::ALL.len() as u16;
    if area.width < count.saturating_mul(MIN_COLUMN_WIDTH) {
        let msg = Paragraph::new(format!(
            "Terminal too narrow for the board. Increase width to at least {} cells.",
            count.saturating_mul(MIN_COLUMN_WIDTH)
        ))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .title(" Resize Needed "),
        );
        frame.render_widget(msg, area);
        return;
    }

    let constraints: Vec<Constraint> = TaskStatus::ALL
        .iter()
        .map(|_| Constraint::Ratio(1, u32::from(count)))
        .collect();
    let column_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, status) in TaskStatus::ALL.iter().copied().enumerate() {
        let chunk = column_chunks[i];
        let is_focused = i == ui.focused_column;
        let is_drop_column = ui.dragging.is_some()
            && ui.hover.as_ref() == Some(&DropTarget::Column(status));
        let tasks = state.column(status);

        let border_type = if is_focused {
            BorderType::Double
        } else {
            BorderType::Plain
        };
        let border_style = if is_drop_column {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(border_type)
            .border_style(border_style)
            .title(format!(" {} ({}) ", status.label(), tasks.len()))
            .title_alignment(Alignment::Center);
        let inner = block.inner(chunk);
        frame.render_widget(block, chunk);
        ui.interaction_map
            .register(InteractionLayer::Column, chunk, Hit::Column(status));

        if tasks.is_empty() {
            frame.render_widget(
                Paragraph::new("No tasks here. Drop one to start.").alignment(Alignment::Center),
                inner,
            );
            continue;
        }

        let visible = usize::from((inner.height / CARD_STRIDE).max(1));
        let selected = ui.selected_index(status);
        let scroll = scroll_offset(ui.scroll.get(&status).copied().unwrap_or(0), selected, visible);
        ui.scroll.insert(status, scroll);

        let mut y_offset = 0;
        for (j, task) in tasks.iter().enumerate().skip(scroll) {
            if y_offset + CARD_HEIGHT > inner.height {
                break;
            }
            let card_area = Rect {
                x: inner.x,
                y: inner.y + y_offset,
                width: inner.width.saturating_sub(1),
                height: CARD_HEIGHT,
            };
            let is_selected = is_focused && j == selected;
            let is_dragged = ui.dragging.as_deref() == Some(task.id.as_str());
            frame.render_widget(card(task, is_selected, is_dragged), card_area);
            ui.interaction_map.register(
                InteractionLayer::Card,
                card_area,
                Hit::Task {
                    task_id: task.id.clone(),
                    status,
                },
            );
            y_offset += CARD_STRIDE;
        }

        if tasks.len() > visible {
            let mut scroll_state = ScrollbarState::new(tasks.len()).position(scroll);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .thumb_style(Style::default().fg(Color::Gray).bg(Color::DarkGray))
                .track_symbol(Some("│"))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            frame.render_stateful_widget(
                scrollbar,
                Rect {
                    x: chunk.x + chunk.width - 1,
                    y: inner.y,
                    height: inner.height,
                    width: 1,
                },
                &mut scroll_state,
            );
        }
    }
}

fn card(task: &Task, is_selected: bool, is_dragged: bool) -> Paragraph<'_> {
    let prefix = if is_selected { "▸" } else { " " };
    let mut title_style = Style::default();
    if task.status == TaskStatus::Completed {
        title_style = title_style.add_modifier(Modifier::CROSSED_OUT);
    }
    if is_dragged {
        title_style = title_style.add_modifier(Modifier::ITALIC).fg(Color::Cyan);
    }
    let bg_color = if is_selected || is_dragged {
        Color::DarkGray
    } else {
        Color::Reset
    };

    let line1 = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(task.title.as_str(), title_style),
    ]);
    let line2 = Line::from(vec![
        Span::raw("  "),
        Span::styled(
            task.priority.label(),
            Style::default().fg(priority_color(task.priority)),
        ),
        Span::styled(
            format!("  due {}", format_due_date(task.due_date)),
            Style::default().fg(Color::Gray),
        ),
    ]);

    Paragraph::new(vec![line1, line2]).style(Style::default().bg(bg_color))
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

/// Smallest shift of `current` that keeps `selected` within `visible` rows.
fn scroll_offset(current: usize, selected: usize, visible: usize) -> usize {
    if selected < current {
        selected
    } else if selected >= current + visible {
        selected + 1 - visible
    } else {
        current
    }
}
