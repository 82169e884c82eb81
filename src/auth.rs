//! 认证客户端：注册、登录、刷新、登出
//!
//! 只经过 Cookie 阶段，从不附加 Bearer 头，过期令牌不会和新凭据一起发出。

use crate::api::unwrap_envelope;
use crate::claims::{Identity, decode_claims};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use crate::session::SessionNotifier;
use crate::storage::{KeyValueStorage, TokenStore};
use serde::Serialize;
use std::rc::Rc;
use taskmanager_shared::{AuthResponse, HealthStatus, LoginRequest, RegisterRequest, TokenResponse};

#[cfg(test)]
mod tests;

const REGISTER_FAILED: &str = "registration failed";
const LOGIN_FAILED: &str = "login failed";
const REFRESH_FAILED: &str = "could not refresh the access token";

pub struct AuthClient<C, S> {
    http: C,
    config: ClientConfig,
    tokens: TokenStore<S>,
    session: Rc<SessionNotifier<S>>,
}

impl<C: HttpClient, S: KeyValueStorage> AuthClient<C, S> {
    pub fn new(
        http: C,
        config: ClientConfig,
        tokens: TokenStore<S>,
        session: Rc<SessionNotifier<S>>,
    ) -> Self {
        Self {
            http,
            config,
            tokens,
            session,
        }
    }

    pub async fn register(&self, body: &RegisterRequest) -> ClientResult<AuthResponse> {
        self.authenticate("auth/register", body, REGISTER_FAILED)
            .await
            .map_err(|e| e.in_op("auth.register"))
    }

    pub async fn login(&self, body: &LoginRequest) -> ClientResult<AuthResponse> {
        self.authenticate("auth/login", body, LOGIN_FAILED)
            .await
            .map_err(|e| e.in_op("auth.login"))
    }

    /// 用刷新 Cookie 换取新的访问令牌
    ///
    /// 任何失败都会先在本地登出再返回错误。
    pub async fn refresh(&self) -> ClientResult<TokenResponse> {
        match self.try_refresh().await {
            Ok(token) => Ok(token),
            Err(e) => {
                log::warn!("token refresh failed, logging out: {}", e);
                self.logout().await;
                Err(e.in_op("auth.refresh"))
            }
        }
    }

    /// 本地总是成功
    ///
    /// 服务端调用尽力而为；无论结果如何都会清空令牌并通知观察者。
    pub async fn logout(&self) {
        match self.post("auth/logout", &serde_json::json!({})).await {
            Ok(resp) if !resp.is_success() => {
                log::warn!("logout returned HTTP {}; clearing local session anyway", resp.status);
            }
            Ok(_) => {}
            Err(e) => log::warn!("logout request failed; clearing local session anyway: {}", e),
        }

        if let Err(e) = self.tokens.clear().await {
            log::error!("could not clear stored token on logout: {}", e);
        }
        self.session.mark_logged_out();
    }

    /// 从已保存的令牌解码身份，不访问服务端
    pub async fn current_user(&self) -> Option<Identity> {
        let token = match self.tokens.load_access_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("current user: {}", e);
                return None;
            }
        };
        match decode_claims(&token) {
            Ok(claims) => Some(claims.identity()),
            Err(e) => {
                log::debug!("current user: {}", e);
                None
            }
        }
    }

    /// `GET health`，响应没有信封
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let url = self.config.endpoint("health")?;
        let resp = self
            .http
            .send(HttpRequest::new(url.as_str(), HttpMethod::Get))
            .await
            .and_then(HttpResponse::error_for_status)
            .map_err(|e| e.in_op("auth.health"))?;
        resp.json().map_err(|e| e.in_op("auth.health"))
    }

    // --- 内部实现 ---

    async fn authenticate<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ClientResult<AuthResponse> {
        let resp = self.post(path, body).await?.error_for_status()?;
        let auth: AuthResponse = unwrap_envelope(resp, fallback)?;

        self.tokens.save(&auth.access_token, auth.expires_at).await?;
        self.session.mark_authenticated(Identity::from(&auth.employee));
        log::debug!("authenticated as {}", auth.employee.email);
        Ok(auth)
    }

    async fn try_refresh(&self) -> ClientResult<TokenResponse> {
        let resp = self
            .post("auth/refresh", &serde_json::json!({}))
            .await?
            .error_for_status()?;
        let token: TokenResponse = unwrap_envelope(resp, REFRESH_FAILED)?;
        self.tokens
            .save(&token.access_token, token.expires_at)
            .await?;
        Ok(token)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<HttpResponse> {
        let url = self.config.endpoint(path)?;
        let req = HttpRequest::new(url.as_str(), HttpMethod::Post).with_json(body)?;
        self.http
            .send(req)
            .await
            .map_err(|e| e.in_op_with("http.send", path))
    }
}
