//! 访问令牌载荷中的身份声明
//!
//! 这里不校验签名，签名由服务端在每次调用时校验；客户端只读取令牌属于谁。

use base64::{Engine, engine::general_purpose};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use taskmanager_shared::Employee;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    #[error("token must have three dot-separated segments, found {0}")]
    Malformed(usize),
    #[error("payload segment is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload segment is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("claim `{0}` is missing")]
    MissingClaim(&'static str),
    #[error("claim `employee_id` is not a UUID: {0}")]
    InvalidEmployeeId(#[from] uuid::Error),
}

/// 会话所属的员工
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub employee_id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&Employee> for Identity {
    fn from(employee: &Employee) -> Self {
        Self {
            employee_id: employee.id,
            name: employee.name.clone(),
            email: employee.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub employee_id: Uuid,
    pub email: String,
    pub name: String,
    /// Unix 时间戳（秒）
    pub exp: Option<i64>,
}

impl IdentityClaims {
    pub fn identity(&self) -> Identity {
        Identity {
            employee_id: self.employee_id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    /// 没有 `exp` 的令牌在客户端看来永不过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_some_and(|exp| exp <= now.timestamp())
    }
}

/// 把 `header.payload.signature` 解码为身份声明
pub fn decode_claims(token: &str) -> Result<IdentityClaims, ClaimsError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::Malformed(segments.len()));
    }

    let bytes = general_purpose::STANDARD.decode(restore_padding(segments[1]))?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes)?;

    let employee_id = required_claim(&claims, "employee_id")?;
    let email = required_claim(&claims, "email")?;
    let name = required_claim(&claims, "name")?;
    let exp = claims.get("exp").and_then(Value::as_i64);

    Ok(IdentityClaims {
        employee_id: Uuid::parse_str(&employee_id)?,
        email,
        name,
        exp,
    })
}

/// base64url 转标准字母表，并补齐到 4 的倍数
fn restore_padding(segment: &str) -> String {
    let mut base64 = segment.replace('-', "+").replace('_', "/");
    match base64.len() % 4 {
        2 => base64.push_str("=="),
        3 => base64.push('='),
        _ => {}
    }
    base64
}

fn required_claim(claims: &Map<String, Value>, key: &'static str) -> Result<String, ClaimsError> {
    match claims.get(key) {
        None | Some(Value::Null) => Err(ClaimsError::MissingClaim(key)),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
    }
}
