use serde::Deserialize;
use tracing::debug;

use crate::api::{ApiClient, ApiError, ApiRequest, ApiResponse, Transport};
use crate::types::{NewTask, Task, TaskPage, TaskPatch};

pub const TASKS_PATH: &str = "/tasks";

/// Single-task responses arrive either wrapped as `{data: [Task]}` or bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum TaskEnvelope {
    Wrapped { data: Vec<Task> },
    Bare(Task),
}

impl TaskEnvelope {
    fn into_task(self) -> Option<Task> {
        match self {
            TaskEnvelope::Wrapped { data } => data.into_iter().next(),
            TaskEnvelope::Bare(task) => Some(task),
        }
    }
}

pub struct TaskService<'a, T> {
    client: &'a ApiClient<T>,
}

impl<'a, T: Transport> TaskService<'a, T> {
    pub fn new(client: &'a ApiClient<T>) -> Self {
        Self { client }
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<TaskPage, ApiError> {
        let request = ApiRequest::get(TASKS_PATH)
            .query("skip", skip)
            .query("limit", limit);
        self.client.execute(request).await?.json()
    }

    /// Fetches every task, one page of `limit` at a time.
    pub async fn list_all(&self, limit: u64) -> Result<Vec<Task>, ApiError> {
        let limit = limit.max(1);
        let mut tasks = Vec::new();
        loop {
            let page = self.list(tasks.len() as u64, limit).await?;
            let received = page.data.len();
            tasks.extend(page.data);
            debug!(received, total = page.total, "fetched task page");
            if received == 0 || tasks.len() as u64 >= page.total {
                break;
            }
        }
        Ok(tasks)
    }

    pub async fn get(&self, id: &str) -> Result<Task, ApiError> {
        let response = self.client.execute(ApiRequest::get(task_path(id))).await?;
        single_task(&response)
    }

    pub async fn create(&self, task: &NewTask) -> Result<Task, ApiError> {
        let body = serde_json::to_value(task).map_err(|err| ApiError::Decode(err.to_string()))?;
        let response = self
            .client
            .execute(ApiRequest::post(TASKS_PATH).json(body))
            .await?;
        single_task(&response)
    }

    pub async fn update(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let body = serde_json::to_value(patch).map_err(|err| ApiError::Decode(err.to_string()))?;
        let response = self
            .client
            .execute(ApiRequest::patch(task_path(id)).json(body))
            .await?;
        single_task(&response)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .execute(ApiRequest::delete(task_path(id)))
            .await?;
        Ok(())
    }

    pub async fn toggle_status(&self, task: &Task) -> Result<Task, ApiError> {
        self.update(&task.id, &TaskPatch::status(task.status.toggled()))
            .await
    }
}

fn task_path(id: &str) -> String {
    format!("{TASKS_PATH}/{}", urlencoding::encode(id))
}

fn single_task(response: &ApiResponse) -> Result<Task, ApiError> {
    response
        .json::<TaskEnvelope>()?
        .into_task()
        .ok_or_else(|| ApiError::from_response(404, b""))
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::api::RequestBody;
    use crate::api::testing::{ScriptedTransport, respond};
    use crate::auth::SessionHandle;
    use crate::types::TaskStatus;

    fn task_json(id: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("Task {id}"),
            "status": status,
            "priority": "MEDIUM",
            "created_at": "2025-01-01T00:00:00",
        })
    }

    fn client(responses: Vec<ApiResponse>) -> ApiClient<ScriptedTransport> {
        ApiClient::with_default_chain(
            ScriptedTransport::new(responses),
            SessionHandle::in_memory(),
        )
    }

    #[tokio::test]
    async fn list_all_walks_pages_until_total() {
        let client = client(vec![
            respond(
                200,
                json!({"total": 3, "data": [task_json("1", "PENDING"), task_json("2", "PENDING")]}),
            ),
            respond(200, json!({"total": 3, "data": [task_json("3", "COMPLETED")]})),
        ]);
        let service = TaskService::new(&client);

        let tasks = service.list_all(2).await.expect("list should succeed");

        assert_eq!(
            tasks.iter().map(|task| task.id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
        let seen = client.transport().seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1].query,
            vec![
                ("skip".to_string(), "2".to_string()),
                ("limit".to_string(), "2".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn list_all_stops_on_short_server_page() {
        let client = client(vec![respond(200, json!({"total": 10, "data": []}))]);
        let service = TaskService::new(&client);

        let tasks = service.list_all(100).await.expect("list should succeed");
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn get_unwraps_data_envelope_and_reports_empty_as_not_found() {
        let client = client(vec![
            respond(200, json!({"data": [task_json("a b", "PENDING")]})),
            respond(200, json!({"data": []})),
        ]);
        let service = TaskService::new(&client);

        let task = service.get("a b").await.expect("task should load");
        assert_eq!(task.id, "a b");
        assert_eq!(client.transport().seen()[0].path, "/tasks/a%20b");

        let err = service.get("missing").await.expect_err("should be missing");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_accepts_bare_task_response() {
        let client = client(vec![respond(200, task_json("7", "COMPLETED"))]);
        let service = TaskService::new(&client);

        let task = service
            .update("7", &TaskPatch::placement(TaskStatus::Completed, 0))
            .await
            .expect("update should succeed");

        assert_eq!(task.status, TaskStatus::Completed);
        let request = &client.transport().seen()[0];
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(
            request.body,
            Some(RequestBody::Json(json!({"status": "COMPLETED", "order": 0})))
        );
    }

    #[tokio::test]
    async fn toggle_status_sends_flipped_status() {
        let client = client(vec![respond(200, json!({"data": [task_json("7", "COMPLETED")]}))]);
        let service = TaskService::new(&client);
        let task: Task =
            serde_json::from_value(task_json("7", "PENDING")).expect("task should parse");

        service
            .toggle_status(&task)
            .await
            .expect("toggle should succeed");

        assert_eq!(
            client.transport().seen()[0].body,
            Some(RequestBody::Json(json!({"status": "COMPLETED"})))
        );
    }

    #[tokio::test]
    async fn delete_surfaces_server_errors() {
        let client = client(vec![
            ApiResponse::new(204, ""),
            respond(404, json!({"detail": "Task not found"})),
        ]);
        let service = TaskService::new(&client);

        service.delete("1").await.expect("delete should succeed");
        let err = service.delete("1").await.expect_err("second delete fails");
        assert_eq!(err.user_message(), "Task not found");
    }
}
