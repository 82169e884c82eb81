use crate::error::{ClientError, ClientResult};
use taskmanager_shared::DEFAULT_API_BASE_PATH;
use url::Url;

// =========================================================
// 运行时配置 (Runtime Configuration)
// =========================================================

/// 未设置 `TASKMANAGER_ORIGIN` 时使用
pub const DEFAULT_ORIGIN: &str = "http://localhost:8080";

const ENV_ORIGIN: &str = "TASKMANAGER_ORIGIN";
const ENV_API_BASE_URL: &str = "TASKMANAGER_API_BASE_URL";

/// 解析后的 API 地址
///
/// 基础地址总是以且仅以一个 `/` 结尾，相对路径会拼接在它下面。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_base_url: Url,
}

impl ClientConfig {
    /// 以页面 `origin` 为基准解析 `base_path`
    ///
    /// `base_path` 本身是绝对地址时忽略 origin。
    pub fn resolve(origin: &str, base_path: &str) -> ClientResult<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| ClientError::from(e).in_op_with("config.resolve", origin))?;
        let joined = origin
            .join(base_path)
            .map_err(|e| ClientError::from(e).in_op_with("config.resolve", base_path))?;
        Ok(Self {
            api_base_url: normalize_trailing_slash(joined),
        })
    }

    /// 从环境变量读取 origin 和基础路径，读不到就用 `DEFAULT_ORIGIN` 和 `/api/v1`
    pub fn from_env() -> ClientResult<Self> {
        let origin = std::env::var(ENV_ORIGIN).unwrap_or_else(|_| DEFAULT_ORIGIN.to_string());
        let base_path =
            std::env::var(ENV_API_BASE_URL).unwrap_or_else(|_| DEFAULT_API_BASE_PATH.to_string());
        Self::resolve(&origin, &base_path)
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// 相对 API 基础地址的端点，例如 `tasks/42/status`
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.api_base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::from(e).in_op_with("config.endpoint", path))
    }
}

fn normalize_trailing_slash(mut url: Url) -> Url {
    let trimmed = format!("{}/", url.path().trim_end_matches('/'));
    url.set_path(&trimmed);
    url
}
