//! Cabinet API
//!
//! 直接按 token 查询推荐 cabinet，不经过重定向策略。

use std::sync::Arc;

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::{debug, info};

use super::types::{ApiResponse, ErrorCode};
use crate::api::middleware::VisitorId;
use crate::cabinet::CabinetView;
use crate::profile::{NotFoundReason, ReportPeriod};
use crate::referral::ReferralToken;
use crate::services::LandingService;

#[derive(Debug, Deserialize, Default)]
pub struct CabinetQuery {
    pub period: Option<String>,
}

pub struct CabinetHandler;

impl CabinetHandler {
    fn parse_request(
        token: &str,
        query: &CabinetQuery,
        landing: &LandingService,
    ) -> Option<(ReferralToken, ReportPeriod)> {
        let token = ReferralToken::parse(token)?;
        let period = ReportPeriod::parse_or(query.period.as_deref(), landing.default_period());
        Some((token, period))
    }

    fn bad_token() -> HttpResponse {
        HttpResponse::BadRequest().json(ApiResponse::error(
            ErrorCode::BadRequest,
            "referral token is empty",
        ))
    }

    fn view_response(view: CabinetView) -> HttpResponse {
        match &view {
            CabinetView::NotFound { reason, .. } => {
                let code = match reason {
                    NotFoundReason::Missing => ErrorCode::LinkNotFound,
                    NotFoundReason::Unavailable => ErrorCode::ProfileUnavailable,
                };
                HttpResponse::NotFound().json(ApiResponse::with_code(code, view))
            }
            _ => HttpResponse::Ok().json(ApiResponse::ok(view)),
        }
    }

    pub async fn get_cabinet(
        path: web::Path<String>,
        query: web::Query<CabinetQuery>,
        visitor: VisitorId,
        landing: web::Data<Arc<LandingService>>,
    ) -> impl Responder {
        let Some((token, period)) = Self::parse_request(&path, &query, &landing) else {
            return Self::bad_token();
        };

        debug!("Cabinet request for {} ({})", token, period);
        let view = landing.cabinet(Some(visitor.as_str()), &token, period).await;
        Self::view_response(view)
    }

    pub async fn export_qr(
        path: web::Path<String>,
        query: web::Query<CabinetQuery>,
        landing: web::Data<Arc<LandingService>>,
    ) -> impl Responder {
        let Some((token, period)) = Self::parse_request(&path, &query, &landing) else {
            return Self::bad_token();
        };

        let view = landing.cabinet(None, &token, period).await;
        let Some(presenter) = landing.presenter(&view) else {
            return Self::view_response(view);
        };

        let notice = presenter.export_qr(landing.qr_output_dir()).await;
        if notice.is_success() {
            info!("QR code exported for {}", token);
            HttpResponse::Ok().json(ApiResponse::ok(notice))
        } else {
            HttpResponse::InternalServerError()
                .json(ApiResponse::with_code(ErrorCode::QrExportFailed, notice))
        }
    }
}

/// Cabinet 路由配置
pub fn cabinet_routes() -> actix_web::Scope {
    web::scope("/api/cabinet")
        .route("/{token}", web::get().to(CabinetHandler::get_cabinet))
        .route("/{token}", web::head().to(CabinetHandler::get_cabinet))
        .route("/{token}/qr", web::post().to(CabinetHandler::export_qr))
}
