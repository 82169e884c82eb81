use super::{ApiClient, ListQuery};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::request::{HttpClient, HttpMethod};
use taskmanager_shared::{
    AddParticipantRequest, CreateTaskRequest, PaginatedResponse, Task, TaskParticipant,
    TaskStatus, UpdateTaskStatusRequest,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub paging: ListQuery,
    pub status: Option<TaskStatus>,
}

impl TaskQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.paging.pairs();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_api_str().to_string()));
        }
        pairs
    }
}

/// 任务接口，以及某员工的任务列表
pub struct TaskClient<C> {
    api: ApiClient<C>,
}

impl<C: HttpClient> TaskClient<C> {
    pub fn new(http: C, config: ClientConfig) -> Self {
        Self {
            api: ApiClient::new(http, config),
        }
    }

    pub async fn list(&self, query: &TaskQuery) -> ClientResult<PaginatedResponse<Task>> {
        let req = self
            .api
            .request_with_query(HttpMethod::Get, "tasks", &query.pairs())?;
        self.api
            .call(req, "tasks.list", "could not load tasks")
            .await
    }

    pub async fn get(&self, id: Uuid) -> ClientResult<Task> {
        let req = self.api.request(HttpMethod::Get, &format!("tasks/{}", id))?;
        self.api.call(req, "tasks.get", "task not found").await
    }

    pub async fn create(&self, body: &CreateTaskRequest) -> ClientResult<Task> {
        let req = self
            .api
            .request(HttpMethod::Post, "tasks")?
            .with_json(body)?;
        self.api
            .call(req, "tasks.create", "could not create task")
            .await
    }

    pub async fn update_status(&self, id: Uuid, status: TaskStatus) -> ClientResult<Task> {
        let req = self
            .api
            .request(HttpMethod::Patch, &format!("tasks/{}/status", id))?
            .with_json(&UpdateTaskStatusRequest { status })?;
        self.api
            .call(req, "tasks.update_status", "could not update task status")
            .await
    }

    /// 只检查状态码，响应不带数据
    pub async fn archive(&self, id: Uuid) -> ClientResult<()> {
        let req = self
            .api
            .request(HttpMethod::Patch, &format!("tasks/{}/archive", id))?;
        self.api.execute(req, "tasks.archive").await?;
        Ok(())
    }

    pub async fn participants(&self, task_id: Uuid) -> ClientResult<Vec<TaskParticipant>> {
        let req = self
            .api
            .request(HttpMethod::Get, &format!("tasks/{}/participants", task_id))?;
        self.api
            .call(req, "tasks.participants", "could not load participants")
            .await
    }

    pub async fn add_participant(
        &self,
        task_id: Uuid,
        body: &AddParticipantRequest,
    ) -> ClientResult<TaskParticipant> {
        let req = self
            .api
            .request(HttpMethod::Post, &format!("tasks/{}/participants", task_id))?
            .with_json(body)?;
        self.api
            .call(req, "tasks.add_participant", "could not add participant")
            .await
    }

    pub async fn list_for_employee(
        &self,
        employee_id: Uuid,
        query: &ListQuery,
    ) -> ClientResult<PaginatedResponse<Task>> {
        let req = self.api.request_with_query(
            HttpMethod::Get,
            &format!("employees/{}/tasks", employee_id),
            &query.pairs(),
        )?;
        self.api
            .call(req, "tasks.list_for_employee", "could not load employee tasks")
            .await
    }
}
