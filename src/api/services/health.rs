use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{HttpResponse, Responder, web};
use tracing::{error, info, trace};

use super::types::{
    ApiResponse, ErrorCode, HealthAttributionCheck, HealthChecks, HealthProfileSourceCheck,
    HealthResponse,
};
use crate::services::LandingService;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: chrono::Utc::now(),
        }
    }
}

/// 运行时长的可读形式，如 `1d 2h 3m 4s`
fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (days, rem) = (seconds / 86_400, seconds % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let (minutes, secs) = (rem / 60, rem % 60);
    match (days, hours, minutes) {
        (0, 0, 0) => format!("{}s", secs),
        (0, 0, _) => format!("{}m {}s", minutes, secs),
        (0, _, _) => format!("{}h {}m {}s", hours, minutes, secs),
        _ => format!("{}d {}h {}m {}s", days, hours, minutes, secs),
    }
}

/// Health Service
///
/// 只探测归因后端是否可读；分析后端按需访问，不在健康检查中调用。
pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        landing: web::Data<Arc<LandingService>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let start_time = Instant::now();
        trace!("Received health check request");

        let store = landing.attribution_store();
        let (status, error) =
            match tokio::time::timeout(Duration::from_secs(5), store.probe()).await {
                Ok(Ok(())) => ("healthy", None),
                Ok(Err(e)) => {
                    error!("Attribution backend health check failed: {}", e);
                    ("unhealthy", Some(format!("backend error: {}", e)))
                }
                Err(_) => {
                    error!("Attribution backend health check timeout");
                    ("unhealthy", Some("timeout".to_string()))
                }
            };

        let now = chrono::Utc::now();
        let uptime_seconds = (now - app_start_time.start_datetime).num_seconds();
        let is_healthy = error.is_none();

        let health_data = HealthResponse {
            status: status.to_string(),
            timestamp: now.to_rfc3339(),
            uptime: uptime_seconds.max(0) as u32,
            checks: HealthChecks {
                attribution: HealthAttributionCheck {
                    status: status.to_string(),
                    backend: store.backend_name().to_string(),
                    policy: store.policy().to_string(),
                    error,
                },
                profile_source: HealthProfileSourceCheck {
                    name: landing.profile_source_name().to_string(),
                },
            },
            response_time_ms: start_time.elapsed().as_millis() as u32,
        };

        info!(
            "Health check completed in {:?}, status: {}, uptime: {}",
            start_time.elapsed(),
            status,
            format_uptime(uptime_seconds)
        );

        if is_healthy {
            HttpResponse::Ok().json(ApiResponse::ok(health_data))
        } else {
            HttpResponse::ServiceUnavailable()
                .json(ApiResponse::with_code(ErrorCode::ServiceUnavailable, health_data))
        }
    }

    // 简单的就绪检查，只返回 200 状态码
    pub async fn readiness_check() -> impl Responder {
        trace!("Received readiness check request");

        HttpResponse::Ok()
            .append_header(("Content-Type", "text/plain"))
            .body("OK")
    }

    // 活跃性检查
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");

        HttpResponse::NoContent().finish()
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check))
        .route("/live", web::get().to(HealthService::liveness_check))
        .route("/live", web::head().to(HealthService::liveness_check))
}
