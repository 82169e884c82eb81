//! TaskManager API 客户端
//!
//! 分层结构：
//! - `request`: HTTP 抽象（`HttpClient` trait 与原生实现）
//! - `pipeline`: 请求管道（Cookie 阶段、Bearer 阶段）
//! - `storage`: 键值存储抽象与令牌存储
//! - `claims`: 访问令牌载荷解码
//! - `session`: 登录状态与观察者
//! - `auth` / `api`: 认证客户端与资源客户端
//! - `context`: 把以上各层装配成一个会话

pub mod api;
pub mod auth;
pub mod claims;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod session;
pub mod storage;

pub use taskmanager_shared as shared;

pub use api::{EmployeeClient, EmployeeQuery, ListQuery, TaskClient, TaskQuery};
pub use auth::AuthClient;
pub use claims::{ClaimsError, Identity, IdentityClaims, decode_claims};
pub use config::ClientConfig;
pub use context::{AuthenticatedPipeline, SessionContext};
pub use error::{ClientError, ClientErrorStatus, ClientResult};
pub use pipeline::{BearerHandler, CookieHandler};
pub use request::{Credentials, HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use session::{AuthState, SessionNotifier, SubscriptionId};
pub use storage::{KeyValueStorage, MemoryStorage, SessionToken, TokenStore};

#[cfg(not(target_arch = "wasm32"))]
pub use context::NativeSession;
#[cfg(not(target_arch = "wasm32"))]
pub use request::ReqwestHttpClient;
