//! API 模块常量定义

/// 访客标识 Cookie 名称
pub const VISITOR_COOKIE_NAME: &str = "rl_visitor";

/// 访客 Cookie 有效期（天）
pub const VISITOR_COOKIE_MAX_AGE_DAYS: i64 = 365;

/// 请求 ID 响应头
pub const REQUEST_ID_HEADER: &str = "x-request-id";
