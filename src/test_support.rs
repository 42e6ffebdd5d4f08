//! 测试辅助：示例规则库与可编排的 HTTP 客户端

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::error::{RcuResult, RsClearUrlsError};
use crate::rule::RuleSet;
use crate::utils::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

/// 抽样的 ClearURLs 规则（与上游格式一致）
pub const SAMPLE_RULES_JSON: &str = r#"{
    "providers": {
        "Google": {
            "urlPattern": "^https?:\\/\\/(?:[a-z0-9-]+\\.)*?google(?:\\.[a-z]{2,}){1,}",
            "completeProvider": false,
            "rules": ["ved", "ei", "source", "gs_lcp", "aqs", "sourceid", "uact", "rlz", "sclient", "client"],
            "rawRules": [],
            "referralMarketing": [],
            "exceptions": [],
            "redirections": ["^https?:\\/\\/(?:[a-z0-9-]+\\.)*?google(?:\\.[a-z]{2,}){1,}\\/url\\?.*?(?:url|q)=(https?[^&]+)"],
            "forceRedirection": false
        },
        "YouTube": {
            "urlPattern": "^https?:\\/\\/(?:[a-z0-9-]+\\.)*?(youtube\\.com|youtu\\.be)",
            "completeProvider": false,
            "rules": ["feature", "gclid", "si", "pp", "ab_channel"],
            "rawRules": [],
            "referralMarketing": [],
            "exceptions": [],
            "redirections": [],
            "forceRedirection": false
        },
        "Amazon": {
            "urlPattern": "^https?:\\/\\/(?:[a-z0-9-]+\\.)*?amazon(?:\\.[a-z]{2,}){1,}",
            "completeProvider": false,
            "rules": ["qid", "sr", "ref_", "keywords", "sprefix", "tag", "linkCode", "camp", "creative", "creativeASIN", "psc"],
            "rawRules": ["\\/ref=[^/?]*"],
            "referralMarketing": [],
            "exceptions": ["^https?:\\/\\/(?:[a-z0-9-]+\\.)*?amazon(?:\\.[a-z]{2,}){1,}\\/gp\\/.*?(?:redirector.html|cart|your-account)"],
            "redirections": [],
            "forceRedirection": false
        },
        "TikTok": {
            "urlPattern": "^https?:\\/\\/(?:[a-z0-9-]+\\.)*?tiktok\\.com",
            "completeProvider": false,
            "rules": ["u_code", "_d", "_t", "timestamp", "share_app_name", "_r", "checksum", "language"],
            "rawRules": [],
            "referralMarketing": [],
            "exceptions": [],
            "redirections": [],
            "forceRedirection": false
        },
        "Doubleclick": {
            "urlPattern": "^https?:\\/\\/(?:[a-z0-9-]+\\.)*?doubleclick(?:\\.[a-z]{2,}){1,}",
            "completeProvider": true,
            "rules": [],
            "rawRules": [],
            "referralMarketing": [],
            "exceptions": [],
            "redirections": ["^https?:\\/\\/(?:[a-z0-9-]+\\.)*?doubleclick(?:\\.[a-z]{2,}){1,}\\/.*?tag_for_child_directed_treatment=;%3F(.*)"],
            "forceRedirection": false
        },
        "globalRules": {
            "urlPattern": ".*",
            "completeProvider": false,
            "rules": [
                "utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content",
                "mtm_campaign", "mtm_kwd", "ga_source", "ga_medium", "ga_term", "ga_content",
                "ga_campaign", "yclid", "_openstat", "fbclid", "gclid", "msclkid"
            ],
            "rawRules": [],
            "referralMarketing": [],
            "exceptions": [],
            "redirections": [],
            "forceRedirection": false
        }
    }
}"#;

pub fn sample_rules() -> RuleSet {
    RuleSet::from_json(SAMPLE_RULES_JSON).expect("样例规则应可解析")
}

/// 可编排响应的 HTTP 客户端，记录所有请求
#[derive(Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<HashMap<(HttpMethod, String), RcuResult<HttpResponse>>>,
    calls: Mutex<Vec<(HttpMethod, String)>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置某方法+URL的响应（可重复使用）
    pub fn respond(self, method: HttpMethod, url: &str, status: u16, location: Option<&str>, body: &str) -> Self {
        let mut headers = HashMap::new();
        if let Some(location) = location {
            headers.insert("location".to_string(), vec![location.to_string()]);
        }
        let response = HttpResponse {
            status,
            headers,
            body: body.to_string(),
        };
        self.responses
            .lock()
            .unwrap()
            .insert((method, url.to_string()), Ok(response));
        self
    }

    /// 设置 HEAD 跳转
    pub fn redirect(self, url: &str, location: &str) -> Self {
        self.respond(HttpMethod::Head, url, 302, Some(location), "")
    }

    /// 设置某方法+URL的网络错误
    pub fn fail(self, method: HttpMethod, url: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method, url.to_string()),
            Err(RsClearUrlsError::RuleFetchError(format!("模拟网络错误：{}", url))),
        );
        self
    }

    pub fn calls(&self) -> Vec<(HttpMethod, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn execute(&self, request: HttpRequest) -> RcuResult<HttpResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method, request.url.clone()));

        let responses = self.responses.lock().unwrap();
        match responses.get(&(request.method, request.url.clone())) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(e)) => Err(RsClearUrlsError::RuleFetchError(e.to_string())),
            // 未编排的URL按普通 200 处理（无跳转）
            None => Ok(HttpResponse {
                status: 200,
                ..Default::default()
            }),
        }
    }
}

/// 本地路由：路径、状态码、Location、响应体
pub type Route = (&'static str, u16, Option<&'static str>, String);

/// 启动本地 HTTP 服务（每个连接一个请求），返回基础URL；未配置的路径返回 404
pub async fn serve_http(routes: Vec<Route>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定本地端口失败");
    let addr = listener.local_addr().expect("读取本地地址失败");
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, location, body) = routes
                    .iter()
                    .find(|(route, ..)| *route == path)
                    .map(|(_, status, location, body)| (*status, *location, body.clone()))
                    .unwrap_or((404, None, String::new()));

                let mut response = format!(
                    "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n",
                    status,
                    body.len()
                );
                if let Some(location) = location {
                    response.push_str(&format!("Location: {}\r\n", location));
                }
                response.push_str("\r\n");
                response.push_str(&body);

                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}
