//! HTTP 传输层
//!
//! 基于 `web_sys::fetch` 实现客户端的 `HttpClient` trait。

use async_trait::async_trait;
use taskmanager_client::{ClientError, ClientResult, Credentials, HttpClient, HttpRequest, HttpResponse};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, Response};

/// 浏览器 fetch 传输
///
/// 无状态，Cookie 由浏览器自己管理。
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHttpClient;

/// 把请求的 Cookie 策略翻译成 fetch 的 `credentials` 选项
fn request_credentials(credentials: Credentials) -> RequestCredentials {
    match credentials {
        Credentials::SameOrigin => RequestCredentials::SameOrigin,
        Credentials::Include => RequestCredentials::Include,
    }
}

fn js_error(context: &str, e: JsValue) -> ClientError {
    ClientError::transport(format!("{}: {:?}", context, e))
}

#[async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> ClientResult<HttpResponse> {
        let url = req.url.clone();

        let headers = Headers::new().map_err(|e| js_error("创建 Headers 失败", e))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| js_error("设置 Header 失败", e))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());
        opts.set_credentials(request_credentials(req.credentials));

        if let Some(body) = &req.body {
            opts.set_body(&JsValue::from_str(body));
        }

        let request = Request::new_with_str_and_init(&url, &opts)
            .map_err(|e| js_error("请求构建失败", e).in_op_with("fetch", url.clone()))?;

        let window = web_sys::window()
            .ok_or_else(|| ClientError::transport("无法获取 window 对象"))?;

        // 网络层失败（断网、CORS 等）在这里表现为 reject
        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| js_error("网络错误", e).in_op_with("fetch", url.clone()))?;

        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| js_error("Response 类型转换失败", e))?;

        let status = response.status();
        let promise = response
            .text()
            .map_err(|e| js_error("响应解析失败", e))?;
        let text = JsFuture::from(promise)
            .await
            .map_err(|e| js_error("响应解析失败", e).in_op_with("fetch.read_body", url.clone()))?;

        let body = text
            .as_string()
            .ok_or_else(|| ClientError::transport("响应体无法转换为字符串"))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_map_to_fetch_options() {
        assert_eq!(
            request_credentials(Credentials::Include),
            RequestCredentials::Include
        );
        assert_eq!(
            request_credentials(Credentials::SameOrigin),
            RequestCredentials::SameOrigin
        );
    }
}
