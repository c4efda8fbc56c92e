//! Interactive kanban board: renders the two status columns with ratatui and
//! turns mouse drags and key presses into `BoardController` calls.

pub mod input;
pub mod interaction;
pub mod state;
pub mod view;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::{
    cursor::Show,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    style::ResetColor,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::api::{ApiClient, Transport};
use crate::board::BoardController;
use crate::tasks::TaskService;

pub use input::Action;
pub use state::BoardUi;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

static TERMINAL_RESTORED: AtomicBool = AtomicBool::new(true);

/// Runs the board until the user quits or the session is lost.
pub async fn run_board<T: Transport>(
    client: &ApiClient<T>,
    fetch_limit: u64,
    user_label: String,
) -> Result<()> {
    let mut controller = BoardController::new(TaskService::new(client), fetch_limit);
    controller
        .load()
        .await
        .map_err(|err| anyhow!(err.user_message()))
        .context("failed to load the board")?;

    let _guard = TerminalGuard;
    let mut terminal = setup_terminal()?;
    let mut ui = BoardUi::new(user_label);

    let mut redraw = true;
    while !ui.should_quit {
        if redraw {
            terminal
                .draw(|frame| view::render(frame, &mut ui, controller.state(), controller.error()))
                .context("failed to render frame")?;
            redraw = false;
        }

        if !event::poll(POLL_INTERVAL).context("failed to poll terminal events")? {
            continue;
        }
        let action = match event::read().context("failed to read terminal event")? {
            Event::Key(key) => input::action_for_key(key),
            Event::Mouse(mouse) => input::action_for_mouse(mouse, &ui),
            Event::Resize(_, _) => {
                redraw = true;
                None
            }
            _ => None,
        };

        if let Some(action) = action {
            apply(&mut controller, &mut ui, action).await;
            redraw = true;
        }

        if client.session().token().is_none() {
            warn!("session ended while the board was open");
            restore_terminal()?;
            return Err(anyhow!("Your session has expired. Sign in again."));
        }
    }

    restore_terminal()?;
    info!("board closed");
    Ok(())
}

pub async fn apply<T: Transport>(
    controller: &mut BoardController<'_, T>,
    ui: &mut BoardUi,
    action: Action,
) {
    match action {
        Action::Quit => ui.should_quit = true,
        Action::Reload => {
            ui.notice = match controller.load().await {
                Ok(()) => Some("Board reloaded".to_string()),
                Err(err) => Some(err.user_message()),
            };
        }
        Action::DismissError => {
            controller.dismiss_error();
            ui.notice = None;
        }
        Action::Focus(direction) => ui.focus_step(controller.state(), direction),
        Action::Move(direction) => {
            if let Some(task_id) = ui.selected_task(controller.state()) {
                let result = controller.move_step(&task_id, direction).await;
                ui.record(&result);
                ui.follow(controller.state(), &task_id);
            }
        }
        Action::Toggle => {
            if let Some(task_id) = ui.selected_task(controller.state()) {
                ui.notice = match controller.toggle(&task_id).await {
                    Ok(task) => {
                        ui.follow(controller.state(), &task_id);
                        Some(format!("\"{}\" is now {}", task.title, task.status.label()))
                    }
                    Err(err) => Some(err.user_message()),
                };
            }
        }
        Action::BeginDrag(task_id) => {
            controller.begin_drag(&task_id);
            ui.follow(controller.state(), &task_id);
            ui.dragging = Some(task_id);
            ui.hover = None;
            ui.notice = None;
        }
        Action::DragOver(target) => {
            if let Some(task_id) = ui.dragging.clone() {
                controller.drag_over(&task_id, &target);
                ui.hover = Some(target);
            }
        }
        Action::Drop(target) => {
            if let Some(task_id) = ui.dragging.take() {
                ui.hover = None;
                let result = controller.drag_end(&task_id, target.as_ref()).await;
                ui.record(&result);
                ui.follow(controller.state(), &task_id);
            }
        }
        Action::CancelDrag => {
            if let Some(task_id) = ui.dragging.take() {
                ui.hover = None;
                let result = controller.drag_end(&task_id, None).await;
                ui.record(&result);
            }
        }
    }
    ui.clamp(controller.state());
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    TERMINAL_RESTORED.store(false, Ordering::SeqCst);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("failed to initialize terminal")
}

/// Leaves raw mode and the alternate screen. Safe to call more than once.
pub fn restore_terminal() -> Result<()> {
    if TERMINAL_RESTORED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let _ = disable_raw_mode();

    let mut stdout = io::stdout();
    let _ = execute!(
        stdout,
        LeaveAlternateScreen,
        DisableMouseCapture,
        Show,
        ResetColor
    );
    let _ = stdout.flush();

    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore_terminal();
    }
}
