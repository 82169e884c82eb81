//! LocalStorage 封装模块
//!
//! 使用 `web_sys::Storage` 实现客户端的 `KeyValueStorage` trait。

use async_trait::async_trait;
use taskmanager_client::{ClientError, ClientResult, KeyValueStorage};

/// 浏览器 LocalStorage
///
/// 每次操作都重新获取 `Storage` 实例，不缓存句柄。
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    /// 获取 LocalStorage 实例
    ///
    /// 隐私模式或被禁用时返回存储错误。
    fn storage() -> ClientResult<web_sys::Storage> {
        let window =
            web_sys::window().ok_or_else(|| ClientError::storage("无法获取 window 对象"))?;
        window
            .local_storage()
            .map_err(|e| ClientError::storage(format!("访问 localStorage 失败: {:?}", e)))?
            .ok_or_else(|| ClientError::storage("localStorage 不可用"))
    }
}

#[async_trait(?Send)]
impl KeyValueStorage for LocalStorage {
    async fn get_item(&self, key: &str) -> ClientResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| ClientError::storage(format!("{:?}", e)).in_op_with("storage.get", key))
    }

    async fn set_item(&self, key: &str, value: &str) -> ClientResult<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| ClientError::storage(format!("{:?}", e)).in_op_with("storage.set", key))
    }

    async fn remove_item(&self, key: &str) -> ClientResult<()> {
        Self::storage()?
            .remove_item(key)
            .map_err(|e| ClientError::storage(format!("{:?}", e)).in_op_with("storage.remove", key))
    }
}
