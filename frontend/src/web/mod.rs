//! 原生 Web API 封装模块
//!
//! 把浏览器的 fetch 与 LocalStorage 接到客户端的两个 trait 上。

mod http;
mod storage;

pub use http::FetchHttpClient;
pub use storage::LocalStorage;
