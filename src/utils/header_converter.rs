//! Header格式转换工具
//! 不同Header格式之间的转换，以及跳转探测使用的浏览器请求头

use std::collections::HashMap;
use reqwest::header::HeaderMap;
use tracing::warn;

/// 跳转探测使用的浏览器请求头（部分服务端会拒绝非浏览器请求）
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("User-Agent", "Mozilla/5.0 (X11; Linux x86_64; rv:143.0) Gecko/20100101 Firefox/143.0"),
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate, br, zstd"),
    ("Sec-GPC", "1"),
    ("Upgrade-Insecure-Requests", "1"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Connection", "keep-alive"),
];

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 将HeaderMap转换为HashMap<String, Vec<String>>（键统一小写）
    pub fn to_hashmap(header_map: &HeaderMap) -> HashMap<String, Vec<String>> {
        let mut map = HashMap::new();
        let mut iter_count = 0;

        for (key, value) in header_map.iter() {
            iter_count += 1;
            if iter_count > 1000 {
                warn!("Header迭代超过1000次，强制终止");
                break;
            }

            let key_str = key.as_str().to_lowercase();
            let value_str = value.to_str().unwrap_or("").to_string();

            map.entry(key_str)
                .or_insert_with(Vec::new)
                .push(value_str);
        }

        map
    }

    /// 取指定Header的第一个非空值（名称不区分大小写）
    pub fn first_value<'a>(headers: &'a HashMap<String, Vec<String>>, name: &str) -> Option<&'a str> {
        headers
            .get(&name.to_lowercase())
            .and_then(|values| values.iter().find(|v| !v.is_empty()))
            .map(String::as_str)
    }

    /// 浏览器请求头的拥有所有权版本
    pub fn browser_headers() -> Vec<(String, String)> {
        BROWSER_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
