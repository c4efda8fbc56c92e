use tracing::{info, warn};

use crate::api::{ApiError, Transport};
use crate::tasks::TaskService;
use crate::types::{Task, TaskPatch};

use super::{BoardState, Direction, DropTarget};

pub const ROLLBACK_MESSAGE: &str = "Failed to update the task. Reverting changes.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragResult {
    NoChange,
    Persisted(Task),
    RolledBack(ApiError),
}

/// Owns the board snapshot and keeps it in step with the server. Drops are
/// applied locally first, then persisted; a failed save reloads everything.
pub struct BoardController<'a, T> {
    service: TaskService<'a, T>,
    fetch_limit: u64,
    state: BoardState,
    authoritative: BoardState,
    error: Option<String>,
}

impl<'a, T: Transport> BoardController<'a, T> {
    pub fn new(service: TaskService<'a, T>, fetch_limit: u64) -> Self {
        Self {
            service,
            fetch_limit,
            state: BoardState::default(),
            authoritative: BoardState::default(),
            error: None,
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub async fn load(&mut self) -> Result<(), ApiError> {
        let tasks = self.service.list_all(self.fetch_limit).await?;
        info!(count = tasks.len(), "board loaded");
        self.state = BoardState::new(tasks);
        self.authoritative = self.state.clone();
        self.error = None;
        Ok(())
    }

    pub fn begin_drag(&mut self, task_id: &str) {
        self.state = self.state.begin_drag(task_id);
    }

    pub fn drag_over(&mut self, task_id: &str, target: &DropTarget) {
        self.state = self.state.drag_over(task_id, target);
    }

    pub async fn drag_end(&mut self, task_id: &str, target: Option<&DropTarget>) -> DragResult {
        let (next, outcome) = self.state.drag_end(task_id, target);
        self.state = next;

        let Some(outcome) = outcome else {
            return DragResult::NoChange;
        };

        let patch = TaskPatch::placement(outcome.status, outcome.order);
        match self.service.update(&outcome.task_id, &patch).await {
            Ok(task) => {
                info!(
                    task = %outcome.task_id,
                    from = %outcome.from_status,
                    to = %outcome.status,
                    order = outcome.order,
                    "task moved"
                );
                self.state = self.state.with_server_task(task.clone());
                self.authoritative = self.state.clone();
                DragResult::Persisted(task)
            }
            Err(err) => {
                warn!(
                    task = %outcome.task_id,
                    error = %err,
                    "failed to persist move, reloading board"
                );
                if let Err(reload_err) = self.load().await {
                    warn!(error = %reload_err, "board reload failed, restoring last known state");
                    self.state = self.authoritative.clone();
                }
                self.error = Some(ROLLBACK_MESSAGE.to_string());
                DragResult::RolledBack(err)
            }
        }
    }

    /// Drag without a pointer: a full gesture on a computed target.
    pub async fn move_to(&mut self, task_id: &str, target: &DropTarget) -> DragResult {
        self.begin_drag(task_id);
        self.drag_over(task_id, target);
        self.drag_end(task_id, Some(target)).await
    }

    pub async fn move_step(&mut self, task_id: &str, direction: Direction) -> DragResult {
        match self.state.neighbor_target(task_id, direction) {
            Some(target) => self.move_to(task_id, &target).await,
            None => DragResult::NoChange,
        }
    }

    /// Flips the task's status on the server, then reloads so both columns
    /// reflect the server's ordering.
    pub async fn toggle(&mut self, task_id: &str) -> Result<Task, ApiError> {
        let Some(task) = self.state.task(task_id).cloned() else {
            return Err(ApiError::from_response(404, b""));
        };
        let updated = self.service.toggle_status(&task).await?;
        info!(task = %task_id, status = %updated.status, "task toggled");
        self.load().await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::{ApiClient, ApiResponse, RequestBody};
    use crate::auth::SessionHandle;
    use crate::types::TaskStatus;

    fn task_json(id: &str, status: &str, order: i64) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Task {id}"),
            "status": status,
            "priority": "LOW",
            "order": order,
        })
    }

    fn page(tasks: Vec<serde_json::Value>) -> ApiResponse {
        ApiResponse::new(200, json!({"total": tasks.len(), "data": tasks}).to_string())
    }

    fn client(responses: Vec<ApiResponse>) -> ApiClient<ScriptedTransport> {
        ApiClient::with_default_chain(
            ScriptedTransport::new(responses),
            SessionHandle::in_memory(),
        )
    }

    fn orders(
        controller: &BoardController<'_, ScriptedTransport>,
    ) -> Vec<(String, TaskStatus, i64)> {
        controller
            .state()
            .tasks()
            .iter()
            .map(|task| (task.id.clone(), task.status, task.order))
            .collect()
    }

    #[tokio::test]
    async fn test_successful_move_persists_status_and_order() {
        let client = client(vec![
            page(vec![task_json("1", "PENDING", 0), task_json("2", "PENDING", 1)]),
            ApiResponse::new(200, task_json("2", "PENDING", 0).to_string()),
        ]);
        let mut controller = BoardController::new(TaskService::new(&client), 100);
        controller.load().await.expect("board should load");

        let result = controller
            .move_to("2", &DropTarget::Task("1".to_string()))
            .await;

        assert!(matches!(result, DragResult::Persisted(ref task) if task.id == "2"));
        assert_eq!(
            orders(&controller),
            vec![
                ("2".to_string(), TaskStatus::Pending, 0),
                ("1".to_string(), TaskStatus::Pending, 1)
            ]
        );
        let seen = client.transport().seen();
        assert_eq!(seen[1].path, "/tasks/2");
        assert_eq!(
            seen[1].body,
            Some(RequestBody::Json(json!({"status": "PENDING", "order": 0})))
        );
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn test_no_op_drop_makes_no_request() {
        let client = client(vec![page(vec![task_json("1", "PENDING", 0)])]);
        let mut controller = BoardController::new(TaskService::new(&client), 100);
        controller.load().await.expect("board should load");

        let result = controller
            .move_to("1", &DropTarget::Task("1".to_string()))
            .await;

        assert_eq!(result, DragResult::NoChange);
        assert_eq!(client.transport().seen().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_save_reloads_authoritative_order() {
        let client = client(vec![
            page(vec![task_json("1", "PENDING", 0), task_json("2", "PENDING", 1)]),
            ApiResponse::new(500, r#"{"detail": "boom"}"#),
            page(vec![task_json("1", "PENDING", 0), task_json("2", "PENDING", 1)]),
        ]);
        let mut controller = BoardController::new(TaskService::new(&client), 100);
        controller.load().await.expect("board should load");

        let result = controller.move_step("1", Direction::Right).await;

        assert!(matches!(result, DragResult::RolledBack(ref err) if err.is_server_error()));
        assert_eq!(controller.error(), Some(ROLLBACK_MESSAGE));
        assert_eq!(
            orders(&controller),
            vec![
                ("1".to_string(), TaskStatus::Pending, 0),
                ("2".to_string(), TaskStatus::Pending, 1)
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_reload_restores_last_known_state() {
        let client = client(vec![
            page(vec![task_json("1", "PENDING", 0)]),
            ApiResponse::new(503, ""),
        ]);
        let mut controller = BoardController::new(TaskService::new(&client), 100);
        controller.load().await.expect("board should load");

        let result = controller.move_step("1", Direction::Right).await;

        assert!(matches!(result, DragResult::RolledBack(_)));
        assert_eq!(
            orders(&controller),
            vec![("1".to_string(), TaskStatus::Pending, 0)]
        );
        assert!(controller.state().active().is_none());

        controller.dismiss_error();
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn test_toggle_flips_status_and_reloads() {
        let client = client(vec![
            page(vec![task_json("1", "PENDING", 0)]),
            ApiResponse::new(200, task_json("1", "COMPLETED", 0).to_string()),
            page(vec![task_json("1", "COMPLETED", 0)]),
        ]);
        let mut controller = BoardController::new(TaskService::new(&client), 100);
        controller.load().await.expect("board should load");

        let task = controller.toggle("1").await.expect("toggle should succeed");

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(
            orders(&controller),
            vec![("1".to_string(), TaskStatus::Completed, 0)]
        );
        assert!(controller.toggle("missing").await.is_err());
    }
}
