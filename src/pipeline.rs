//! 请求管道
//!
//! 每个阶段包装一个内层 [`HttpClient`]，自身也实现 `HttpClient`，通过嵌套组合。
//! 认证链为 `BearerHandler<CookieHandler<T>>`：先加 Bearer 头，再强制携带 Cookie。

use crate::error::ClientResult;
use crate::request::{Credentials, HttpClient, HttpRequest, HttpResponse};
use crate::storage::{KeyValueStorage, TokenStore};

// =========================================================
// Cookie 阶段 (Cookie Stage)
// =========================================================

/// 强制 `credentials: include`，使 HttpOnly 刷新 Cookie 随请求发送，其余原样透传
#[derive(Clone)]
pub struct CookieHandler<C> {
    inner: C,
}

impl<C> CookieHandler<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> HttpClient for CookieHandler<C> {
    async fn send(&self, mut req: HttpRequest) -> ClientResult<HttpResponse> {
        req.credentials = Credentials::Include;
        self.inner.send(req).await
    }
}

// =========================================================
// Bearer 阶段 (Bearer Stage)
// =========================================================

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// 从令牌存储读取令牌并附加 `Authorization: Bearer <token>`
///
/// 401 原样返回给调用方，不会自动刷新重试。
pub struct BearerHandler<C, S> {
    inner: C,
    tokens: TokenStore<S>,
}

impl<C: Clone, S> Clone for BearerHandler<C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

impl<C, S> BearerHandler<C, S> {
    pub fn new(inner: C, tokens: TokenStore<S>) -> Self {
        Self { inner, tokens }
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient, S: KeyValueStorage> HttpClient for BearerHandler<C, S> {
    async fn send(&self, mut req: HttpRequest) -> ClientResult<HttpResponse> {
        let token = self
            .tokens
            .load_access_token()
            .await
            .map_err(|e| e.in_op("bearer.load_token"))?;

        match token.as_deref().map(clean_token) {
            Some(token) if !token.is_empty() => {
                req.headers.insert(
                    AUTHORIZATION_HEADER.to_string(),
                    format!("Bearer {}", token),
                );
            }
            _ => {
                log::debug!("no access token, sending {} unauthenticated", req.url);
            }
        }

        let url = req.url.clone();
        let resp = self.inner.send(req).await?;

        if resp.status == 401 {
            log::warn!("401 from {}; re-authentication required", url);
        }
        Ok(resp)
    }
}

/// 去掉某些写入方留下的 JSON 引号和首尾空白
fn clean_token(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HttpMethod;
    use crate::request::mock::MockHttpClient;
    use crate::storage::MemoryStorage;
    use std::rc::Rc;
    use taskmanager_shared::STORAGE_KEY_ACCESS_TOKEN;

    const URL: &str = "http://tm.local/api/v1/tasks";

    fn chain() -> (
        Rc<MockHttpClient>,
        Rc<MemoryStorage>,
        BearerHandler<CookieHandler<Rc<MockHttpClient>>, MemoryStorage>,
    ) {
        let mock = Rc::new(MockHttpClient::new());
        let storage = Rc::new(MemoryStorage::new());
        let handler = BearerHandler::new(
            CookieHandler::new(mock.clone()),
            TokenStore::new(storage.clone()),
        );
        (mock, storage, handler)
    }

    #[tokio::test]
    async fn cookie_stage_forces_include() {
        let mock = Rc::new(MockHttpClient::new());
        let handler = CookieHandler::new(mock.clone());
        handler
            .send(HttpRequest::new(URL, HttpMethod::Get))
            .await
            .unwrap();
        let sent = mock.last_request().unwrap();
        assert_eq!(sent.credentials, Credentials::Include);
        assert!(sent.header(AUTHORIZATION_HEADER).is_none());
    }

    #[tokio::test]
    async fn bearer_stage_attaches_cleaned_token() {
        let (mock, storage, handler) = chain();
        storage
            .set_item(STORAGE_KEY_ACCESS_TOKEN, " \"h.e.s\" \n")
            .await
            .unwrap();

        handler
            .send(HttpRequest::new(URL, HttpMethod::Get))
            .await
            .unwrap();

        let sent = mock.last_request().unwrap();
        assert_eq!(sent.header("authorization"), Some("Bearer h.e.s"));
        assert_eq!(sent.credentials, Credentials::Include);
    }

    #[tokio::test]
    async fn missing_token_sends_unauthenticated() {
        let (mock, _, handler) = chain();
        handler
            .send(HttpRequest::new(URL, HttpMethod::Get))
            .await
            .unwrap();
        assert!(mock.last_request().unwrap().header("authorization").is_none());
    }

    #[tokio::test]
    async fn quotes_only_token_is_treated_as_absent() {
        let (mock, storage, handler) = chain();
        storage
            .set_item(STORAGE_KEY_ACCESS_TOKEN, "\"\"")
            .await
            .unwrap();
        handler
            .send(HttpRequest::new(URL, HttpMethod::Get))
            .await
            .unwrap();
        assert!(mock.last_request().unwrap().header("authorization").is_none());
    }

    #[tokio::test]
    async fn unauthorized_passes_through_without_retry() {
        let (mock, storage, handler) = chain();
        storage
            .set_item(STORAGE_KEY_ACCESS_TOKEN, "stale.token.x")
            .await
            .unwrap();
        mock.mock_raw(HttpMethod::Get, URL, 401, "token expired");

        let resp = handler
            .send(HttpRequest::new(URL, HttpMethod::Get))
            .await
            .unwrap();
        assert_eq!(resp.status, 401);
        assert_eq!(mock.request_count(), 1);
    }
}
