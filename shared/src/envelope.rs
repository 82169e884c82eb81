use serde::{Deserialize, Serialize};

/// 失败信封中的错误体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ApiError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// 所有 API 端点统一的响应信封
///
/// `success` 为真时只看 `data`，为假时只看 `error`。两者在线上都可能缺失，
/// 调用方应通过 [`ApiResponse::into_outcome`] 读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

/// 信封的解读结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeOutcome<T> {
    /// `success` 为真且有 `data`
    Data(T),
    /// `success` 为假，附带服务端错误（如果有）
    Failed(Option<ApiError>),
    /// `success` 为真但 `data` 为 null 或缺失
    Empty,
}

impl<T> ApiResponse<T> {
    pub fn into_outcome(self) -> EnvelopeOutcome<T> {
        if !self.success {
            return EnvelopeOutcome::Failed(self.error);
        }
        match self.data {
            Some(data) => EnvelopeOutcome::Data(data),
            None => EnvelopeOutcome::Empty,
        }
    }
}

/// 列表分页信封，字段原样暴露
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn is_last_page(&self) -> bool {
        self.page >= self.total_pages
    }
}
