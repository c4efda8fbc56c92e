use std::collections::HashSet;

use clap::{Args, Subcommand};
use serde_json::{Value, json};
use tracing::error;

use crate::{
    api::{ApiClient, ApiError, Transport},
    auth::{
        AuthManager, ClientGuard, RouteDecision, RouteGuard, SessionState, TokenClaims,
        guard::{BOARD_ROUTE, LOGIN_ROUTE, REGISTER_ROUTE, TASKS_ROUTE},
    },
    board::{BoardController, BoardState, DragResult, DropTarget},
    form::{FormErrors, LoginForm, RegisterForm, SubmitError, TaskForm},
    settings::{SETTING_KEYS, Settings},
    tasks::{ListView, TaskService},
    types::{Choice, Priority, Task, TaskFilters, TaskStatus, format_due_date},
};

const SCHEMA_VERSION: &str = "cli.v1";

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    /// Log in, register, log out or show the session
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// List and edit tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Show or rearrange the kanban board; opens the interactive board when
    /// no subcommand is given
    Board {
        #[command(subcommand)]
        command: Option<BoardCommand>,
    },
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AuthCommand {
    Login(LoginArgs),
    Register(RegisterArgs),
    Logout,
    Status,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    List(TaskListArgs),
    Show(TaskIdArgs),
    Create(TaskCreateArgs),
    Edit(TaskEditArgs),
    Toggle(TaskIdArgs),
    Delete(TaskDeleteArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum BoardCommand {
    Show,
    Move(BoardMoveArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    Show,
    Get { key: String },
    Set { key: String, value: String },
    Path,
}

#[derive(Debug, Clone, Args)]
pub struct LoginArgs {
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    #[arg(long, value_name = "PASSWORD")]
    pub password: String,
}

#[derive(Debug, Clone, Args)]
pub struct RegisterArgs {
    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    #[arg(long, value_name = "PASSWORD")]
    pub password: String,

    /// Create the account without signing in
    #[arg(long)]
    pub no_login: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TaskListArgs {
    #[arg(long, value_name = "STATUS", default_value = "all")]
    pub status: Choice<TaskStatus>,

    #[arg(long, value_name = "PRIORITY", default_value = "all")]
    pub priority: Choice<Priority>,

    #[arg(long, value_name = "TEXT", default_value = "")]
    pub search: String,

    #[arg(long, value_name = "N", default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Clone, Args)]
pub struct TaskIdArgs {
    #[arg(value_name = "TASK_ID")]
    pub id: String,
}

#[derive(Debug, Clone, Args)]
pub struct TaskCreateArgs {
    #[arg(long, value_name = "TEXT")]
    pub title: String,

    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    #[arg(long, value_name = "STATUS", default_value = "PENDING")]
    pub status: String,

    #[arg(long, value_name = "PRIORITY", default_value = "MEDIUM")]
    pub priority: String,

    #[arg(long = "due", value_name = "YYYY-MM-DD")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskEditArgs {
    #[arg(value_name = "TASK_ID")]
    pub id: String,

    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,

    #[arg(long, value_name = "PRIORITY")]
    pub priority: Option<String>,

    /// Pass an empty value to clear the due date.
    #[arg(long = "due", value_name = "YYYY-MM-DD")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskDeleteArgs {
    #[arg(value_name = "TASK_ID")]
    pub id: String,

    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
#[group(id = "drop_target", required = true, multiple = false)]
pub struct BoardMoveArgs {
    #[arg(value_name = "TASK_ID")]
    pub id: String,

    /// Drop onto another task, taking its slot
    #[arg(long, value_name = "TASK_ID", group = "drop_target")]
    pub onto_task: Option<String>,

    /// Drop onto a column, after its last task
    #[arg(long, value_name = "STATUS", group = "drop_target")]
    pub onto_column: Option<TaskStatus>,
}

/// Everything a command needs: the API client (with its session) and the
/// effective settings.
pub struct CliContext<'a, T> {
    pub client: &'a ApiClient<T>,
    pub settings: &'a Settings,
    pub now_unix: i64,
}

pub async fn run<T: Transport>(
    context: &CliContext<'_, T>,
    command: RootCommand,
    json_output: bool,
    quiet: bool,
) -> i32 {
    match execute(context, command).await {
        Ok(output) => {
            print_success(output, json_output, quiet);
            0
        }
        Err(err) => {
            print_error(&err, json_output);
            err.exit_code
        }
    }
}

#[derive(Debug)]
pub struct CommandOutput {
    pub command: &'static str,
    pub data: Value,
    pub text: String,
}

#[derive(Debug)]
pub struct CliError {
    pub exit_code: i32,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

type CliResult<T> = Result<T, CliError>;

pub async fn execute<T: Transport>(
    context: &CliContext<'_, T>,
    command: RootCommand,
) -> CliResult<CommandOutput> {
    match command {
        RootCommand::Auth { command } => execute_auth_command(context, command).await,
        RootCommand::Task { command } => {
            require_route(context, TASKS_ROUTE)?;
            execute_task_command(context, command).await
        }
        RootCommand::Board { command } => {
            require_route(context, BOARD_ROUTE)?;
            match command.unwrap_or(BoardCommand::Show) {
                BoardCommand::Show => board_show(context).await,
                BoardCommand::Move(args) => board_move(context, args).await,
            }
        }
        RootCommand::Config { command } => config_command(context.settings, command),
    }
}

/// Applies the route guard before a command touches the API.
fn require_route<T>(context: &CliContext<'_, T>, route: &str) -> CliResult<()> {
    match RouteGuard::new(context.client.session()).check(route) {
        RouteDecision::Allow => Ok(()),
        RouteDecision::Redirect(target) if target.starts_with(LOGIN_ROUTE) => {
            Err(unauthorized_error(
                "not logged in; run `taskdeck auth login` first",
                Some(json!({ "redirect": target })),
            ))
        }
        RouteDecision::Redirect(target) => {
            let who = context
                .client
                .session()
                .user()
                .map(|user| format!(" as {}", user.email))
                .unwrap_or_default();
            Err(conflict_error(
                "ALREADY_LOGGED_IN",
                format!("already logged in{who}; run `taskdeck auth logout` first"),
                Some(json!({ "redirect": target })),
            ))
        }
    }
}

async fn execute_auth_command<T: Transport>(
    context: &CliContext<'_, T>,
    command: AuthCommand,
) -> CliResult<CommandOutput> {
    let auth = AuthManager::new(context.client);
    match command {
        AuthCommand::Login(args) => {
            // a stale stored token must not block a fresh login
            auth.bootstrap(context.now_unix).await;
            require_route(context, LOGIN_ROUTE)?;
            LoginForm {
                email: args.email.clone(),
                password: args.password.clone(),
            }
            .validate()
            .map_err(invalid_input_error)?;

            let user = auth
                .login(args.email.trim(), &args.password)
                .await
                .map_err(api_error)?;
            Ok(CommandOutput {
                command: "auth login",
                data: json!({ "user": user }),
                text: format!("logged in as {} <{}>", user.name, user.email),
            })
        }
        AuthCommand::Register(args) => {
            auth.bootstrap(context.now_unix).await;
            require_route(context, REGISTER_ROUTE)?;
            RegisterForm {
                name: args.name.clone(),
                email: args.email.clone(),
                password: args.password.clone(),
            }
            .validate()
            .map_err(invalid_input_error)?;

            let user = auth
                .register(
                    args.name.trim(),
                    args.email.trim(),
                    &args.password,
                    !args.no_login,
                )
                .await
                .map_err(api_error)?;
            let logged_in = auth.session().snapshot().is_authenticated();
            let text = if logged_in {
                format!("registered and logged in as {} <{}>", user.name, user.email)
            } else {
                format!("registered {} <{}>", user.name, user.email)
            };
            Ok(CommandOutput {
                command: "auth register",
                data: json!({ "user": user, "logged_in": logged_in }),
                text,
            })
        }
        AuthCommand::Logout => {
            auth.logout();
            Ok(CommandOutput {
                command: "auth logout",
                data: json!({ "logged_out": true }),
                text: "logged out".to_string(),
            })
        }
        AuthCommand::Status => {
            let state = auth.bootstrap(context.now_unix).await;
            let expires_at = context
                .client
                .session()
                .token()
                .and_then(|token| TokenClaims::decode(&token))
                .and_then(|claims| claims.exp);
            match state {
                SessionState::Authenticated(user) => {
                    let expiry = expires_at
                        .and_then(|exp| chrono::DateTime::from_timestamp(exp, 0))
                        .map(|time| {
                            format!(" (token expires {})", time.format("%Y-%m-%d %H:%M UTC"))
                        })
                        .unwrap_or_default();
                    Ok(CommandOutput {
                        command: "auth status",
                        data: json!({
                            "authenticated": true,
                            "user": user,
                            "expires_at": expires_at,
                        }),
                        text: format!("logged in as {} <{}>{expiry}", user.name, user.email),
                    })
                }
                SessionState::Anonymous => Ok(CommandOutput {
                    command: "auth status",
                    data: json!({ "authenticated": false }),
                    text: "not logged in".to_string(),
                }),
            }
        }
    }
}

async fn execute_task_command<T: Transport>(
    context: &CliContext<'_, T>,
    command: TaskCommand,
) -> CliResult<CommandOutput> {
    let service = TaskService::new(context.client);
    match command {
        TaskCommand::List(args) => task_list(context, &service, args).await,
        TaskCommand::Show(args) => task_show(context, &service, args).await,
        TaskCommand::Create(args) => task_create(&service, args).await,
        TaskCommand::Edit(args) => task_edit(context, &service, args).await,
        TaskCommand::Toggle(args) => task_toggle(context, &service, args).await,
        TaskCommand::Delete(args) => task_delete(context, &service, args).await,
    }
}

async fn task_list<T: Transport>(
    context: &CliContext<'_, T>,
    service: &TaskService<'_, T>,
    args: TaskListArgs,
) -> CliResult<CommandOutput> {
    let tasks = service
        .list_all(context.settings.fetch_limit)
        .await
        .map_err(api_error)?;
    let filters = TaskFilters {
        status: args.status,
        priority: args.priority,
        search: args.search,
    };
    let view = ListView::build(&tasks, &filters, args.page, context.settings.page_size);

    let data = json!({
        "tasks": view.items.iter().map(|task| task_json(task)).collect::<Vec<_>>(),
        "page": view.page,
        "total_pages": view.total_pages,
        "matching": view.matching,
        "total": view.total,
    });
    let text = render_task_list_text(&view);

    Ok(CommandOutput {
        command: "task list",
        data,
        text,
    })
}

fn render_task_list_text(view: &ListView<'_>) -> String {
    if view.total == 0 {
        return "No tasks yet. Create one with `taskdeck task create --title ...`.".to_string();
    }
    if view.matching == 0 {
        return "No tasks match the current filters.".to_string();
    }
    if view.items.is_empty() {
        return format!(
            "Page {} is empty ({} pages).",
            view.page, view.total_pages
        );
    }

    let headers = ["ID", "Title", "Status", "Priority", "Due"];
    let rows = view
        .items
        .iter()
        .map(|task| {
            vec![
                short_id(&task.id),
                task.title.replace('\n', " "),
                task.status.label().to_string(),
                task.priority.label().to_string(),
                format_due_date(task.due_date),
            ]
        })
        .collect::<Vec<_>>();

    format!("{}\n{}", render_text_table(&headers, &rows), view.summary())
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            let width = cell.chars().count();
            if width > widths[index] {
                widths[index] = width;
            }
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(*width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let render_row = |cells: Vec<&str>| {
        format!(
            "| {} |",
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
                .collect::<Vec<_>>()
                .join(" | ")
        )
    };

    let mut lines = vec![border.clone(), render_row(headers.to_vec()), border.clone()];
    for row in rows {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines.push(border);
    lines.join("\n")
}

async fn task_show<T: Transport>(
    context: &CliContext<'_, T>,
    service: &TaskService<'_, T>,
    args: TaskIdArgs,
) -> CliResult<CommandOutput> {
    let id = resolve_task(context, service, &args.id).await?.id;
    let task = service.get(&id).await.map_err(api_error)?;

    let text = [
        format!("ID:          {}", task.id),
        format!("Title:       {}", task.title),
        format!("Status:      {}", task.status.label()),
        format!("Priority:    {}", task.priority.label()),
        format!("Due:         {}", format_due_date(task.due_date)),
        format!("Created:     {}", task.created_at),
        format!("Updated:     {}", task.updated_at),
        format!(
            "Description: {}",
            task.description.as_deref().unwrap_or("-")
        ),
    ]
    .join("\n");

    Ok(CommandOutput {
        command: "task show",
        data: json!({ "task": task_json(&task) }),
        text,
    })
}

async fn task_create<T: Transport>(
    service: &TaskService<'_, T>,
    args: TaskCreateArgs,
) -> CliResult<CommandOutput> {
    let form = TaskForm {
        title: args.title,
        description: args.description.unwrap_or_default(),
        status: args.status,
        priority: args.priority,
        due_date: args.due_date.unwrap_or_default(),
        ..TaskForm::create()
    };
    let created = form.submit(service).await.map_err(submit_error)?;

    Ok(CommandOutput {
        command: "task create",
        data: json!({ "task": task_json(&created) }),
        text: format!("created task {} ({})", created.title, created.id),
    })
}

async fn task_edit<T: Transport>(
    context: &CliContext<'_, T>,
    service: &TaskService<'_, T>,
    args: TaskEditArgs,
) -> CliResult<CommandOutput> {
    if args.title.is_none()
        && args.description.is_none()
        && args.status.is_none()
        && args.priority.is_none()
        && args.due_date.is_none()
    {
        return Err(usage_error(
            "TASK_EDIT_EMPTY",
            "provide at least one of --title, --description, --status, --priority, or --due",
        ));
    }

    let task = resolve_task(context, service, &args.id).await?;
    let mut form = TaskForm::edit(&task);
    if let Some(title) = args.title {
        form.title = title;
    }
    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(status) = args.status {
        form.status = status;
    }
    if let Some(priority) = args.priority {
        form.priority = priority;
    }
    if let Some(due_date) = args.due_date {
        form.due_date = due_date;
    }

    let updated = form.submit(service).await.map_err(submit_error)?;
    Ok(CommandOutput {
        command: "task edit",
        data: json!({ "task": task_json(&updated) }),
        text: format!("updated task {} ({})", updated.title, updated.id),
    })
}

async fn task_toggle<T: Transport>(
    context: &CliContext<'_, T>,
    service: &TaskService<'_, T>,
    args: TaskIdArgs,
) -> CliResult<CommandOutput> {
    let task = resolve_task(context, service, &args.id).await?;
    let updated = service.toggle_status(&task).await.map_err(api_error)?;

    Ok(CommandOutput {
        command: "task toggle",
        data: json!({ "task": task_json(&updated) }),
        text: format!(
            "task {} is now {}",
            short_id(&updated.id),
            updated.status.label().to_ascii_lowercase()
        ),
    })
}

async fn task_delete<T: Transport>(
    context: &CliContext<'_, T>,
    service: &TaskService<'_, T>,
    args: TaskDeleteArgs,
) -> CliResult<CommandOutput> {
    let task = resolve_task(context, service, &args.id).await?;
    if !args.yes {
        return Err(usage_error(
            "CONFIRMATION_REQUIRED",
            format!(
                "deleting '{}' cannot be undone; re-run with --yes to confirm",
                task.title
            ),
        ));
    }

    service.delete(&task.id).await.map_err(api_error)?;
    Ok(CommandOutput {
        command: "task delete",
        data: json!({ "deleted": true, "task_id": task.id }),
        text: format!("deleted task {}", task.id),
    })
}

async fn board_show<T: Transport>(context: &CliContext<'_, T>) -> CliResult<CommandOutput> {
    let mut controller = BoardController::new(
        TaskService::new(context.client),
        context.settings.fetch_limit,
    );
    controller.load().await.map_err(api_error)?;

    Ok(CommandOutput {
        command: "board show",
        data: board_json(controller.state()),
        text: render_board_text(controller.state()),
    })
}

async fn board_move<T: Transport>(
    context: &CliContext<'_, T>,
    args: BoardMoveArgs,
) -> CliResult<CommandOutput> {
    let mut controller = BoardController::new(
        TaskService::new(context.client),
        context.settings.fetch_limit,
    );
    controller.load().await.map_err(api_error)?;

    let task_id = resolve_task_in(controller.state().tasks(), &args.id)?.id;
    let target = match (args.onto_task, args.onto_column) {
        (Some(other), _) => {
            DropTarget::Task(resolve_task_in(controller.state().tasks(), &other)?.id)
        }
        (None, Some(status)) => DropTarget::Column(status),
        (None, None) => {
            return Err(usage_error(
                "DROP_TARGET_REQUIRED",
                "provide --onto-task or --onto-column",
            ));
        }
    };

    match controller.move_to(&task_id, &target).await {
        DragResult::NoChange => Ok(CommandOutput {
            command: "board move",
            data: json!({ "moved": false, "task_id": task_id }),
            text: format!("task {} is already in place", short_id(&task_id)),
        }),
        DragResult::Persisted(_) => {
            let placed = controller.state().task(&task_id).cloned();
            let (status, order) = placed
                .map(|task| (task.status, task.order))
                .unwrap_or((TaskStatus::Pending, 0));
            Ok(CommandOutput {
                command: "board move",
                data: json!({
                    "moved": true,
                    "task_id": task_id,
                    "status": status,
                    "order": order,
                    "board": board_json(controller.state()),
                }),
                text: format!(
                    "moved task {} to {} at position {}",
                    short_id(&task_id),
                    status.label(),
                    order + 1
                ),
            })
        }
        DragResult::RolledBack(err) => {
            let mut cli_err = api_error(err);
            cli_err.message = format!(
                "{} ({})",
                controller.error().unwrap_or("move failed"),
                cli_err.message
            );
            Err(cli_err)
        }
    }
}

fn render_board_text(state: &BoardState) -> String {
    let mut lines = Vec::new();
    for (status, tasks) in state.columns() {
        lines.push(format!("{} ({})", status.label(), tasks.len()));
        if tasks.is_empty() {
            lines.push("  (empty)".to_string());
        }
        for task in tasks {
            lines.push(format!(
                "  {:>2}. {}  {}  [{}]",
                task.order + 1,
                short_id(&task.id),
                task.title.replace('\n', " "),
                task.priority.label()
            ));
        }
    }
    lines.join("\n")
}

fn board_json(state: &BoardState) -> Value {
    let columns = state
        .columns()
        .into_iter()
        .map(|(status, tasks)| {
            json!({
                "status": status,
                "tasks": tasks.into_iter().map(task_json).collect::<Vec<_>>(),
            })
        })
        .collect::<Vec<_>>();
    json!({ "columns": columns })
}

fn config_command(settings: &Settings, command: ConfigCommand) -> CliResult<CommandOutput> {
    match command {
        ConfigCommand::Show => {
            let data = serde_json::to_value(settings).map_err(runtime_error)?;
            let text = SETTING_KEYS
                .iter()
                .filter_map(|key| settings.get(key).ok().map(|value| format!("{key} = {value}")))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(CommandOutput {
                command: "config show",
                data: json!({ "settings": data }),
                text,
            })
        }
        ConfigCommand::Get { key } => {
            let value = settings
                .get(&key)
                .map_err(|err| usage_error("UNKNOWN_SETTING", err.to_string()))?;
            Ok(CommandOutput {
                command: "config get",
                data: json!({ "key": key, "value": value }),
                text: value,
            })
        }
        ConfigCommand::Set { key, value } => {
            let mut updated = Settings::load();
            updated
                .set(&key, &value)
                .map_err(|err| usage_error("INVALID_SETTING", format!("{err:#}")))?;
            updated.save().map_err(|err| runtime_error(format!("{err:#}")))?;
            let stored = updated.get(&key).map_err(runtime_error)?;
            Ok(CommandOutput {
                command: "config set",
                data: json!({ "key": key, "value": stored }),
                text: format!("{key} = {stored}"),
            })
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()
                .ok_or_else(|| runtime_error("unable to determine config path"))?;
            Ok(CommandOutput {
                command: "config path",
                data: json!({ "path": path.display().to_string() }),
                text: path.display().to_string(),
            })
        }
    }
}

/// Requires an authenticated user before opening the interactive board.
pub fn ensure_signed_in(client_guard: &ClientGuard<'_>) -> Result<(), CliError> {
    client_guard
        .require_user()
        .map(|_| ())
        .map_err(api_error)
}

async fn resolve_task<T: Transport>(
    context: &CliContext<'_, T>,
    service: &TaskService<'_, T>,
    selector: &str,
) -> CliResult<Task> {
    let tasks = service
        .list_all(context.settings.fetch_limit)
        .await
        .map_err(api_error)?;
    resolve_task_in(&tasks, selector)
}

/// Matches an exact id first, then a unique case-insensitive id prefix.
fn resolve_task_in(tasks: &[Task], selector: &str) -> CliResult<Task> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(usage_error("TASK_ID_REQUIRED", "task id cannot be empty"));
    }

    if let Some(task) = tasks.iter().find(|task| task.id == trimmed) {
        return Ok(task.clone());
    }

    let needle = trimmed.to_ascii_lowercase();
    let mut seen = HashSet::new();
    let matches = tasks
        .iter()
        .filter(|task| task.id.to_ascii_lowercase().starts_with(&needle))
        .filter(|task| seen.insert(task.id.clone()))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [single] => Ok((*single).clone()),
        [] => Err(not_found_error(
            "TASK_NOT_FOUND",
            format!("task '{selector}' not found"),
        )),
        many => Err(conflict_error(
            "TASK_ID_AMBIGUOUS",
            format!(
                "task id prefix '{selector}' matches {} tasks; use a longer id",
                many.len()
            ),
            Some(json!({
                "matches": many.iter().map(|task| task.id.clone()).collect::<Vec<_>>()
            })),
        )),
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "status": task.status,
        "priority": task.priority,
        "due_date": task.due_date.map(|date| date.format("%Y-%m-%d").to_string()),
        "order": task.order,
        "created_at": task.created_at,
        "updated_at": task.updated_at,
    })
}

fn usage_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 2,
        code,
        message: message.into(),
        details: None,
    }
}

fn not_found_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 3,
        code,
        message: message.into(),
        details: None,
    }
}

fn conflict_error(
    code: &'static str,
    message: impl Into<String>,
    details: Option<Value>,
) -> CliError {
    CliError {
        exit_code: 4,
        code,
        message: message.into(),
        details,
    }
}

fn runtime_error(err: impl std::fmt::Display) -> CliError {
    CliError {
        exit_code: 5,
        code: "RUNTIME_ERROR",
        message: err.to_string(),
        details: None,
    }
}

fn unauthorized_error(message: impl Into<String>, details: Option<Value>) -> CliError {
    CliError {
        exit_code: 6,
        code: "UNAUTHORIZED",
        message: message.into(),
        details,
    }
}

fn invalid_input_error(errors: FormErrors) -> CliError {
    let details = errors
        .iter()
        .map(|(field, message)| (field.to_string(), Value::String(message.to_string())))
        .collect::<serde_json::Map<_, _>>();
    CliError {
        exit_code: 2,
        code: "INVALID_INPUT",
        message: errors.to_string(),
        details: Some(Value::Object(details)),
    }
}

fn submit_error(err: SubmitError) -> CliError {
    match err {
        SubmitError::Invalid(errors) => invalid_input_error(errors),
        SubmitError::Api(err) => api_error(err),
    }
}

fn api_error(err: ApiError) -> CliError {
    let details = match &err {
        ApiError::Http { status, code, .. } => Some(json!({ "status": status, "code": code })),
        _ => None,
    };
    let message = err.user_message();

    if err.is_unauthorized() {
        return unauthorized_error(
            format!("{message} (run `taskdeck auth login`)"),
            details,
        );
    }
    if err.is_not_found() {
        return CliError {
            details,
            ..not_found_error("NOT_FOUND", message)
        };
    }
    if err.is_conflict() {
        return conflict_error("CONFLICT", message, details);
    }
    if err.is_validation() {
        return CliError {
            details,
            ..usage_error("VALIDATION_FAILED", message)
        };
    }

    let code = match err {
        ApiError::Network(_) => "NETWORK_ERROR",
        ApiError::Decode(_) => "BAD_RESPONSE",
        _ if err.is_forbidden() => "FORBIDDEN",
        _ => "API_ERROR",
    };
    CliError {
        exit_code: 5,
        code,
        message,
        details,
    }
}

fn print_success(output: CommandOutput, json_output: bool, quiet: bool) {
    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "command": output.command,
            "data": output.data
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => println!("{value}"),
            Err(_) => println!("{}", payload),
        }
        return;
    }

    if quiet {
        return;
    }

    if output.text.is_empty() {
        println!("ok");
    } else {
        println!("{}", output.text);
    }
}

pub fn print_error(err: &CliError, json_output: bool) {
    error!(
        code = err.code,
        message = %err.message,
        details = ?err.details,
        "cli command failed"
    );

    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "error": {
                "code": err.code,
                "message": err.message,
                "details": err.details
            }
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => eprintln!("{value}"),
            Err(_) => eprintln!("{}", payload),
        }
        return;
    }

    eprintln!("error[{}]: {}", err.code, err.message);
}
