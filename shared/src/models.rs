use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =========================================================
// 员工 (Employees)
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub position: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub department: String,
    pub position: String,
    pub email: String,
}

/// 部分更新，缺省字段服务端不会修改
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEmployeeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// =========================================================
// 认证载荷 (Auth Payloads)
// =========================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub department: String,
    pub position: String,
    pub email: String,
    pub password: String,
    /// 仅用于表单校验，不发送给服务端
    #[serde(skip_serializing, default)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 注册和登录的返回体。刷新凭据通过 HttpOnly Cookie 下发，不会出现在这里。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub employee: Employee,
}

/// 刷新接口的返回体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// 健康检查返回体（无需认证）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

// =========================================================
// 任务 (Tasks)
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_api_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_api_str() == raw)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// 优先级，线上以整数传输
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskPriority {
    Low = 0,
    Medium = 1,
    High = 2,
}

impl TaskPriority {
    pub fn from_level(level: i32) -> Option<Self> {
        match level {
            0 => Some(TaskPriority::Low),
            1 => Some(TaskPriority::Medium),
            2 => Some(TaskPriority::High),
            _ => None,
        }
    }

    pub fn level(&self) -> i32 {
        *self as i32
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Executor,
    Responsible,
    Customer,
}

impl Default for ParticipantRole {
    fn default() -> Self {
        ParticipantRole::Executor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// 原始状态字符串，类型化的值见 [`Task::status_kind`]
    pub status: String,
    /// 原始优先级，0..=2
    pub priority: i32,
    pub created_by: Uuid,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn status_kind(&self) -> Option<TaskStatus> {
        TaskStatus::parse(&self.status)
    }

    pub fn priority_kind(&self) -> Option<TaskPriority> {
        TaskPriority::from_level(self.priority)
    }

    /// `low`/`medium`/`high`，越界时为 `unknown`
    pub fn priority_label(&self) -> &'static str {
        self.priority_kind()
            .map(|p| p.display_label())
            .unwrap_or("unknown")
    }

    pub fn status_label(&self) -> &str {
        self.status_kind()
            .map(|s| s.display_label())
            .unwrap_or(self.status.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInput {
    /// 保留为文本，格式错误的 id 由校验报告
    pub employee_id: String,
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub participants: Vec<ParticipantInput>,
}

impl Default for CreateTaskRequest {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: TaskPriority::default().level(),
            due_date: None,
            participants: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddParticipantRequest {
    pub employee_id: Uuid,
    pub role: ParticipantRole,
}

/// 任务参与者。服务端曾用 `created_at` 和 `assigned_at` 表示同一字段，两者都接受。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParticipant {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    pub employee_id: Uuid,
    pub role: String,
    #[serde(default, alias = "assigned_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
}
