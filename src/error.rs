//! 全局错误类型定义

use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum RsClearUrlsError {
    // 规则相关错误
    #[error("规则拉取失败：{0}")]
    RuleFetchError(String),
    #[error("规则完整性校验失败：期望 {expected}，实际 {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("规则不可用且无本地缓存兜底：{0}")]
    RulesUnavailable(String),

    // 净化相关错误
    #[error("跳转目标解码失败：{0}")]
    RedirectDecodeError(String),
    #[error("净化器未初始化")]
    CleanerNotInitialized,

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("MessagePack序列化/反序列化失败：{0}")]
    MsgPackError(String),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
}

// 全局Result类型
pub type RcuResult<T> = Result<T, RsClearUrlsError>;
