//! 资源客户端
//!
//! 每次调用先要求 2xx（否则直接以原始响应体失败，不看信封），再解开信封。
//! 2xx 但没有 `data` 时以该操作的固定文案失败。

mod employees;
mod tasks;


pub use employees::{EmployeeClient, EmployeeQuery};
pub use tasks::{TaskClient, TaskQuery};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use taskmanager_shared::{ApiResponse, EnvelopeOutcome};

// =========================================================
// 信封处理 (Envelope Handling)
// =========================================================

/// 解开 2xx 响应中的 `{success, data, error}`
///
/// `success:false` 使用服务端文案，`data:null` 使用 `fallback`。
pub(crate) fn unwrap_envelope<T: DeserializeOwned>(
    resp: HttpResponse,
    fallback: &str,
) -> ClientResult<T> {
    let status = resp.status;
    let envelope: ApiResponse<T> = resp.json()?;

    match envelope.into_outcome() {
        EnvelopeOutcome::Data(data) => Ok(data),
        EnvelopeOutcome::Failed(error) => {
            let error = error.unwrap_or_default();
            let message = if error.message.is_empty() {
                fallback.to_string()
            } else {
                error.message
            };
            Err(ClientError::application(message)
                .with_api_code(error.code)
                .with_http_status(status))
        }
        EnvelopeOutcome::Empty => {
            Err(ClientError::application(fallback).with_http_status(status))
        }
    }
}

// =========================================================
// 分页 (Paging)
// =========================================================

/// 分页参数。未设置的字段由服务端决定（默认第 1 页，每页 20 条）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ListQuery {
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            pairs.push(("page_size", page_size.to_string()));
        }
        pairs
    }
}

// =========================================================
// 公共请求逻辑 (Shared Request Plumbing)
// =========================================================

pub(crate) struct ApiClient<C> {
    http: C,
    config: ClientConfig,
}

impl<C: HttpClient> ApiClient<C> {
    pub(crate) fn new(http: C, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub(crate) fn request(&self, method: HttpMethod, path: &str) -> ClientResult<HttpRequest> {
        self.request_with_query(method, path, &[])
    }

    pub(crate) fn request_with_query(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ClientResult<HttpRequest> {
        let mut url = self.config.endpoint(path)?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(HttpRequest::new(url.as_str(), method))
    }

    /// 发送并要求 2xx
    pub(crate) async fn execute(&self, req: HttpRequest, op: &str) -> ClientResult<HttpResponse> {
        log::debug!("{} {} ({})", req.method.as_str(), req.url, op);
        self.http
            .send(req)
            .await
            .and_then(HttpResponse::error_for_status)
            .map_err(|e| e.in_op(op.to_string()))
    }

    /// 发送、要求 2xx，再解开信封
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        req: HttpRequest,
        op: &str,
        fallback: &str,
    ) -> ClientResult<T> {
        let resp = self.execute(req, op).await?;
        unwrap_envelope(resp, fallback).map_err(|e| e.in_op(op.to_string()))
    }
}
