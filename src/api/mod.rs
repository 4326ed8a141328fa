//! HTTP 接口层
//!
//! - `services`: 落地页、cabinet API、健康检查的路由与处理器
//! - `middleware`: 访客标识与请求追踪

pub mod constants;
pub mod middleware;
pub mod services;
