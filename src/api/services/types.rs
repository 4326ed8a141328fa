//! 统一 API 响应结构与错误码

use serde::Serialize;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字，按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 推荐链接错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    NotFound = 1004,
    InternalServerError = 1005,
    ServiceUnavailable = 1030,

    // 推荐链接错误 3000-3099
    LinkNotFound = 3000,
    ProfileUnavailable = 3001,
    QrExportFailed = 3002,
}

#[derive(Serialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: ErrorCode,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: ErrorCode::Success,
            data,
        }
    }

    pub fn with_code(code: ErrorCode, data: T) -> Self {
        Self { code, data }
    }
}

/// 不带业务数据的错误体
#[derive(Serialize, Clone, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiResponse<ErrorBody> {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            data: ErrorBody {
                error: message.into(),
            },
        }
    }
}

/// 健康检查响应
#[derive(Serialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u32,
    pub checks: HealthChecks,
    pub response_time_ms: u32,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthChecks {
    pub attribution: HealthAttributionCheck,
    pub profile_source: HealthProfileSourceCheck,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthAttributionCheck {
    pub status: String,
    pub backend: String,
    pub policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthProfileSourceCheck {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_as_number() {
        let json = serde_json::to_value(ApiResponse::error(ErrorCode::LinkNotFound, "gone")).unwrap();
        assert_eq!(json["code"], 3000);
        assert_eq!(json["data"]["error"], "gone");
        assert_eq!(serde_json::to_value(ApiResponse::ok(1)).unwrap()["code"], 0);
    }
}
