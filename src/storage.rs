use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use taskmanager_shared::{STORAGE_KEY_ACCESS_TOKEN, STORAGE_KEY_EXPIRES_AT};

// =========================================================
// 存储抽象 (Storage Abstraction)
// =========================================================

/// 持久化字符串存储，例如浏览器的 `localStorage`
///
/// 键不存在时返回 `Ok(None)`，不是错误。
#[async_trait(?Send)]
pub trait KeyValueStorage {
    async fn get_item(&self, key: &str) -> ClientResult<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> ClientResult<()>;
    async fn remove_item(&self, key: &str) -> ClientResult<()>;
}

#[async_trait(?Send)]
impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Rc<S> {
    async fn get_item(&self, key: &str) -> ClientResult<Option<String>> {
        (**self).get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> ClientResult<()> {
        (**self).set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> ClientResult<()> {
        (**self).remove_item(key).await
    }
}

/// 进程内存储，用于原生环境和测试
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RefCell<HashMap<String, String>>,
    /// 置位时模拟存储故障
    failing: std::cell::Cell<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }

    fn check(&self, op: &str, key: &str) -> ClientResult<()> {
        if self.failing.get() {
            Err(ClientError::storage("storage unavailable").in_op_with(op.to_string(), key))
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl KeyValueStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> ClientResult<Option<String>> {
        self.check("storage.get", key)?;
        Ok(self.map.borrow().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> ClientResult<()> {
        self.check("storage.set", key)?;
        self.map
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> ClientResult<()> {
        self.check("storage.remove", key)?;
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

// =========================================================
// 令牌存储 (Token Store)
// =========================================================

/// 当前访问令牌及其过期时间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub access_token: String,
    /// 过期时间缺失或无法解析时为 `None`
    pub expires_at: Option<DateTime<Utc>>,
}

/// 持有持久化的访问令牌
///
/// 刷新凭据不在这里，它只存在于 HttpOnly Cookie 中。
pub struct TokenStore<S> {
    storage: Rc<S>,
}

impl<S> Clone for TokenStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: KeyValueStorage> TokenStore<S> {
    pub fn new(storage: Rc<S>) -> Self {
        Self { storage }
    }

    /// 保存令牌，不检查令牌格式
    ///
    /// 过期时间写入失败时撤回已写入的令牌。
    pub async fn save(&self, access_token: &str, expires_at: DateTime<Utc>) -> ClientResult<()> {
        self.storage
            .set_item(STORAGE_KEY_ACCESS_TOKEN, access_token)
            .await
            .map_err(|e| e.in_op("token_store.save"))?;
        if let Err(e) = self
            .storage
            .set_item(STORAGE_KEY_EXPIRES_AT, &expires_at.to_rfc3339())
            .await
        {
            // 不留下只写了一半的令牌
            if let Err(rollback) = self.storage.remove_item(STORAGE_KEY_ACCESS_TOKEN).await {
                log::error!("could not roll back partially saved token: {}", rollback);
            }
            return Err(e.in_op("token_store.save"));
        }
        log::debug!(
            "token saved (len={}, expires_at={})",
            access_token.len(),
            expires_at
        );
        Ok(())
    }

    /// `Ok(None)` 即未登录
    pub async fn load(&self) -> ClientResult<Option<SessionToken>> {
        let Some(access_token) = self.load_access_token().await? else {
            return Ok(None);
        };
        let expires_at = self
            .storage
            .get_item(STORAGE_KEY_EXPIRES_AT)
            .await
            .map_err(|e| e.in_op("token_store.load"))?
            .and_then(|raw| parse_expiry(&raw));
        Ok(Some(SessionToken {
            access_token,
            expires_at,
        }))
    }

    /// 只读令牌，不读过期时间
    pub async fn load_access_token(&self) -> ClientResult<Option<String>> {
        let token = self
            .storage
            .get_item(STORAGE_KEY_ACCESS_TOKEN)
            .await
            .map_err(|e| e.in_op("token_store.load"))?;
        Ok(token.filter(|t| !t.trim().is_empty()))
    }

    /// 删除两个键。第一个删除失败时仍会尝试第二个。
    pub async fn clear(&self) -> ClientResult<()> {
        let token = self.storage.remove_item(STORAGE_KEY_ACCESS_TOKEN).await;
        let expiry = self.storage.remove_item(STORAGE_KEY_EXPIRES_AT).await;
        token
            .and(expiry)
            .map_err(|e| e.in_op("token_store.clear"))
    }
}

/// 接受 RFC 3339，允许外层带 JSON 引号
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim().trim_matches('"');
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
