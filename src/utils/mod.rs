//! 工具模块：HTTP客户端、Header转换、片段解析、时钟
pub mod clock;
pub mod fragment;
pub mod header_converter;
pub mod http_client;

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::fragment::FragmentParams;
pub use self::header_converter::{HeaderConverter, BROWSER_HEADERS};
pub use self::http_client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
