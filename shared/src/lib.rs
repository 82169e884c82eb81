//! TaskManager 共享数据结构
//!
//! - `envelope`: `{success, data, error}` 响应信封与分页信封
//! - `models`: 员工、任务、参与者以及认证相关载荷
//! - `validation`: 请求体的字段约束

pub mod envelope;
pub mod models;
pub mod validation;

pub use chrono;
pub use uuid;

pub use envelope::{ApiError, ApiResponse, EnvelopeOutcome, PaginatedResponse};
pub use models::*;
pub use validation::{FieldViolation, Validate};

// =========================================================
// 常量 (Constants)
// =========================================================

/// 保存访问令牌的存储键
pub const STORAGE_KEY_ACCESS_TOKEN: &str = "access_token";
/// 保存令牌过期时间（RFC 3339）的存储键
pub const STORAGE_KEY_EXPIRES_AT: &str = "expires_at";

pub const DEFAULT_API_BASE_PATH: &str = "/api/v1";
