//! TaskManager 浏览器端入口
//!
//! - `web::FetchHttpClient`: fetch 传输，按请求设置 `credentials`
//! - `web::LocalStorage`: 令牌持久化
//! - `connect`: 以页面 origin 装配一个会话上下文

pub mod web;

use std::rc::Rc;
use taskmanager_client::{ClientConfig, ClientError, ClientResult, SessionContext};
use taskmanager_shared::DEFAULT_API_BASE_PATH;
use wasm_bindgen::prelude::*;
use web::{FetchHttpClient, LocalStorage};

// 使用 lol_alloc 作为全局分配器以减小 WASM 体积
#[cfg(target_arch = "wasm32")]
use lol_alloc::{AssumeSingleThreaded, FreeListAllocator};

#[cfg(target_arch = "wasm32")]
#[global_allocator]
static ALLOCATOR: AssumeSingleThreaded<FreeListAllocator> =
    unsafe { AssumeSingleThreaded::new(FreeListAllocator::new()) };

pub type BrowserSession = SessionContext<FetchHttpClient, LocalStorage>;

/// 模块实例化时安装 panic hook 和日志输出
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // 重复初始化时返回 Err，忽略即可
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// 以当前页面的 origin 拼出 API 地址
pub fn connect() -> ClientResult<BrowserSession> {
    let origin = web_sys::window()
        .ok_or_else(|| ClientError::config("无法获取 window 对象"))?
        .location()
        .origin()
        .map_err(|e| ClientError::config(format!("无法读取页面 origin: {:?}", e)))?;

    let config = config_for_origin(&origin)?;
    log::info!("API base: {}", config.api_base_url());
    Ok(SessionContext::new(config, FetchHttpClient, Rc::new(LocalStorage)))
}

fn config_for_origin(origin: &str) -> ClientResult<ClientConfig> {
    ClientConfig::resolve(origin, DEFAULT_API_BASE_PATH).map_err(|e| e.in_op("frontend.connect"))
}
