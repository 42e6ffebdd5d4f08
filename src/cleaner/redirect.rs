//! 跳转解析
//! 1. 规则声明的跳转：从包装链接中提取目标URL（无需网络请求）
//! 2. 真实HTTP跳转：HEAD 探测 3xx + Location，HEAD 返回 404/405 时改用 GET 重试

use std::sync::Arc;

use percent_encoding::percent_decode_str;
use tracing::debug;
use url::Url;

use super::matcher::ProviderMatcher;
use crate::compiler::CompiledRuleSet;
use crate::error::{RcuResult, RsClearUrlsError};
use crate::utils::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

/// 跳转解析器
#[derive(Clone)]
pub struct RedirectResolver {
    // None 表示不探测真实HTTP跳转
    http: Option<Arc<dyn HttpClient>>,
}

impl RedirectResolver {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http: Some(http) }
    }

    /// 仅解析规则声明的跳转
    pub fn offline() -> Self {
        Self { http: None }
    }

    /// 解析当前URL的跳转目标
    pub async fn resolve(&self, url: &Url, rules: &CompiledRuleSet) -> RcuResult<Option<String>> {
        if let Some(target) = Self::extract_declared(url.as_str(), rules)? {
            if target != url.as_str() {
                return Ok(Some(target));
            }
        }

        Ok(self.probe(url).await)
    }

    /// 按匹配站点的 redirections 规则提取内嵌目标（第一个捕获组，百分号解码）
    pub fn extract_declared(url: &str, rules: &CompiledRuleSet) -> RcuResult<Option<String>> {
        let Some(provider) = ProviderMatcher::find(rules, url) else {
            return Ok(None);
        };

        for pattern in &provider.redirections {
            let Some(embedded) = pattern
                .captures(url)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
            else {
                continue;
            };

            if Self::has_malformed_escape(embedded) {
                return Err(RsClearUrlsError::RedirectDecodeError(format!("{}（无效的百分号转义）", embedded)));
            }
            let target = percent_decode_str(embedded)
                .decode_utf8()
                .map_err(|e| RsClearUrlsError::RedirectDecodeError(format!("{}（{}）", embedded, e)))?
                .into_owned();
            debug!("站点 {} 的跳转规则命中：{} -> {}", provider.name, url, target);
            return Ok(Some(target));
        }

        Ok(None)
    }

    /// `%` 后必须紧跟两位十六进制数字
    fn has_malformed_escape(text: &str) -> bool {
        let bytes = text.as_bytes();
        bytes.iter().enumerate().any(|(i, &b)| {
            b == b'%'
                && !matches!(
                    (bytes.get(i + 1), bytes.get(i + 2)),
                    (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
                )
        })
    }

    /// 探测真实HTTP跳转，任何网络错误都视为无跳转
    pub async fn probe(&self, url: &Url) -> Option<String> {
        let http = self.http.as_ref()?;

        let head = match http.execute(HttpRequest::probe(HttpMethod::Head, url.as_str())).await {
            Ok(response) => response,
            Err(e) => {
                debug!("HEAD 探测失败，视为无跳转：{}（{}）", url, e);
                return None;
            }
        };
        if let Some(location) = Self::extract_location(url, &head) {
            return Some(location);
        }

        // 部分服务端不支持 HEAD
        if head.status == 404 || head.status == 405 {
            match http.execute(HttpRequest::probe(HttpMethod::Get, url.as_str())).await {
                Ok(response) => return Self::extract_location(url, &response),
                Err(e) => debug!("GET 探测失败，视为无跳转：{}（{}）", url, e),
            }
        }

        None
    }

    /// 从 3xx 响应中读取 Location，`/` 开头的路径拼接原URL的协议与主机
    fn extract_location(original: &Url, response: &HttpResponse) -> Option<String> {
        if !response.is_redirect() {
            return None;
        }
        let location = response.header("location")?;

        if location.starts_with('/') {
            let host = original.host_str()?;
            let authority = match original.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };
            return Some(format!("{}://{}{}", original.scheme(), authority, location));
        }

        Some(location.to_string())
    }
}
