use std::fmt;

// =========================================================
// 错误分级 (Error Status)
// =========================================================

/// 客户端调用的失败层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorStatus {
    /// 非 2xx 状态码，或请求根本没有完成
    Transport,
    /// 状态码为 2xx，但响应信封报告失败或没有 data
    Application,
    /// 键值存储失败
    Storage,
    /// JSON 编解码失败
    Serialization,
    /// 无法解析 API 基础地址
    Config,
}

impl ClientErrorStatus {
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientErrorStatus::Transport => "TRANSPORT_ERROR",
            ClientErrorStatus::Application => "APPLICATION_ERROR",
            ClientErrorStatus::Storage => "STORAGE_ERROR",
            ClientErrorStatus::Serialization => "SERIALIZATION_ERROR",
            ClientErrorStatus::Config => "CONFIG_ERROR",
        }
    }
}

// =========================================================
// 操作链路 (Operation Trace)
// =========================================================

/// 操作链路中的一步，例如带任务 id 的 `tasks.get`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 客户端错误 (Client Error)
// =========================================================

/// 所有客户端操作返回的错误
///
/// - `status`: 失败层级
/// - `message`: 传输失败时为原始响应体；应用失败时为信封中的
///   `error.message`（缺失时为固定兜底文案）
/// - `http_status`: 只要收到了响应就会设置
/// - `api_code`: 服务端返回的 `error.code`（如果有）
#[derive(Debug)]
pub struct ClientError {
    pub status: ClientErrorStatus,
    pub message: String,
    http_status: Option<u16>,
    api_code: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl ClientError {
    pub fn new(status: ClientErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            http_status: None,
            api_code: None,
            source: None,
            spans: Vec::new(),
        }
    }

    // --- 便捷构造 ---

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorStatus::Transport, message)
    }

    /// 收到了非 2xx 响应
    pub fn http(status_code: u16, body: impl Into<String>) -> Self {
        let mut err = Self::transport(body);
        err.http_status = Some(status_code);
        err
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(ClientErrorStatus::Application, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ClientErrorStatus::Storage, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ClientErrorStatus::Serialization, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ClientErrorStatus::Config, message)
    }

    // --- 上下文构建 ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_api_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        if !code.is_empty() {
            self.api_code = Some(code);
        }
        self
    }

    pub fn with_http_status(mut self, status_code: u16) -> Self {
        self.http_status = Some(status_code);
        self
    }

    // --- 访问器 ---

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn api_code(&self) -> Option<&str> {
        self.api_code.as_deref()
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    /// 服务端拒绝了 Bearer 令牌。不会自动刷新，调用方需要重新登录或手动调用 refresh。
    pub fn is_unauthorized(&self) -> bool {
        self.http_status == Some(401)
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

// =========================================================
// 类型转换 (Conversions)
// =========================================================

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::serialization(e.to_string()).with_source(e)
    }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        ClientError::config(e.to_string()).with_source(e)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::transport(e.to_string()).with_source(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_trace() {
        let err = ClientError::http(500, "boom")
            .in_op("http.send")
            .in_op_with("tasks.get", "42");
        assert_eq!(
            err.to_string(),
            "[TRANSPORT_ERROR] boom | trace: http.send -> tasks.get(42)"
        );
        assert_eq!(err.http_status(), Some(500));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn unauthorized_is_detected_from_status() {
        assert!(ClientError::http(401, "").is_unauthorized());
        assert!(!ClientError::application("nope").is_unauthorized());
    }

    #[test]
    fn empty_api_code_is_ignored() {
        let err = ClientError::application("x").with_api_code("");
        assert_eq!(err.api_code(), None);
        let err = ClientError::application("x").with_api_code("NOT_FOUND");
        assert_eq!(err.api_code(), Some("NOT_FOUND"));
    }

    #[test]
    fn json_errors_keep_their_source() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: ClientError = parse.into();
        assert_eq!(err.status, ClientErrorStatus::Serialization);
        assert!(std::error::Error::source(&err).is_some());
    }
}
