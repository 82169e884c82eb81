//! 会话上下文
//!
//! 把配置、令牌存储、状态通知器和各个客户端装配到一起，由调用方显式持有，
//! 不依赖任何全局单例。

use crate::api::{EmployeeClient, TaskClient};
use crate::auth::AuthClient;
use crate::config::ClientConfig;
use crate::pipeline::{BearerHandler, CookieHandler};
use crate::request::HttpClient;
use crate::session::{AuthState, SessionNotifier};
use crate::storage::{KeyValueStorage, TokenStore};
use std::rc::Rc;

/// 资源请求走的完整管道：先加 Bearer 头，再强制携带 Cookie。
pub type AuthenticatedPipeline<T, S> = BearerHandler<CookieHandler<T>, S>;

pub struct SessionContext<T, S> {
    config: ClientConfig,
    tokens: TokenStore<S>,
    session: Rc<SessionNotifier<S>>,
    auth: AuthClient<CookieHandler<T>, S>,
    employees: EmployeeClient<AuthenticatedPipeline<T, S>>,
    tasks: TaskClient<AuthenticatedPipeline<T, S>>,
}

impl<T, S> SessionContext<T, S>
where
    T: HttpClient + Clone,
    S: KeyValueStorage,
{
    /// 所有客户端共享同一个 `transport` 和同一份存储。
    pub fn new(config: ClientConfig, transport: T, storage: Rc<S>) -> Self {
        let tokens = TokenStore::new(storage);
        let session = Rc::new(SessionNotifier::new(tokens.clone()));

        let cookie = CookieHandler::new(transport);
        let authenticated = BearerHandler::new(cookie.clone(), tokens.clone());

        Self {
            auth: AuthClient::new(cookie, config.clone(), tokens.clone(), session.clone()),
            employees: EmployeeClient::new(authenticated.clone(), config.clone()),
            tasks: TaskClient::new(authenticated, config.clone()),
            config,
            tokens,
            session,
        }
    }

    /// 启动时调用一次，从已保存的令牌恢复登录状态。
    pub async fn restore(&self) -> AuthState {
        self.session.restore_from_storage().await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore<S> {
        &self.tokens
    }

    pub fn session(&self) -> &Rc<SessionNotifier<S>> {
        &self.session
    }

    pub fn auth(&self) -> &AuthClient<CookieHandler<T>, S> {
        &self.auth
    }

    pub fn employees(&self) -> &EmployeeClient<AuthenticatedPipeline<T, S>> {
        &self.employees
    }

    pub fn tasks(&self) -> &TaskClient<AuthenticatedPipeline<T, S>> {
        &self.tasks
    }
}

// =========================================================
// 原生环境 (reqwest + 内存存储)
// =========================================================

#[cfg(not(target_arch = "wasm32"))]
pub type NativeSession =
    SessionContext<crate::request::ReqwestHttpClient, crate::storage::MemoryStorage>;

#[cfg(not(target_arch = "wasm32"))]
impl NativeSession {
    /// 令牌只保存在进程内存中，进程退出即失效。
    pub fn native(config: ClientConfig) -> crate::error::ClientResult<Self> {
        let transport = crate::request::ReqwestHttpClient::new()?;
        Ok(Self::new(
            config,
            transport,
            Rc::new(crate::storage::MemoryStorage::new()),
        ))
    }
}
