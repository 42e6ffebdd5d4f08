//! HTTP 客户端抽象
//! 规则拉取与跳转探测共用，便于在无网络环境下注入测试实现

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use super::header_converter::HeaderConverter;
use crate::error::RcuResult;

/// 请求方法（仅需 GET/HEAD）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
}

/// 请求描述
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    // 跳转探测无需读取响应体
    pub read_body: bool,
    // 规则拉取需跟随跳转，跳转探测必须自行处理 3xx
    pub follow_redirects: bool,
}

impl HttpRequest {
    /// 读取响应体的 GET 请求
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            read_body: true,
            follow_redirects: true,
        }
    }

    /// 不读取响应体的探测请求
    pub fn probe(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderConverter::browser_headers(),
            read_body: false,
            follow_redirects: false,
        }
    }
}

/// 响应描述
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, Vec<String>>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        HeaderConverter::first_value(&self.headers, name)
    }
}

/// HTTP 客户端接口（不自动跟随跳转）
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> RcuResult<HttpResponse>;
}

/// 基于 reqwest 的生产实现
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    // 不跟随跳转（探测用）
    client: Client,
    // 默认跳转策略（拉取规则用）
    following: Client,
}

impl ReqwestHttpClient {
    /// 创建客户端，超时由调用方配置
    pub fn new(timeout: Duration) -> RcuResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let following = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, following })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> RcuResult<HttpResponse> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Head => Method::HEAD,
        };

        let client = if request.follow_redirects {
            &self.following
        } else {
            &self.client
        };
        let mut builder = client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = HeaderConverter::to_hashmap(response.headers());
        debug!("{:?} {} 返回状态码 {}", request.method, request.url, status);

        let body = if request.read_body {
            response.text().await?
        } else {
            String::new()
        };

        Ok(HttpResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_http;

    #[tokio::test]
    async fn test_get_follows_redirects_while_probe_does_not() {
        let base = serve_http(vec![
            ("/old", 301, Some("/new"), String::new()),
            ("/new", 200, None, "moved here".to_string()),
        ])
        .await;
        let client = ReqwestHttpClient::new(Duration::from_secs(5)).unwrap();

        let fetched = client.execute(HttpRequest::get(format!("{}/old", base))).await.unwrap();
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body, "moved here");

        let probed = client
            .execute(HttpRequest::probe(HttpMethod::Head, format!("{}/old", base)))
            .await
            .unwrap();
        assert_eq!(probed.status, 301);
        assert_eq!(probed.header("location"), Some("/new"));
        assert!(probed.body.is_empty());
    }
}
