//! 落地页路由
//!
//! `GET /` 与 `GET /ref/{share_token}`：重定向返回 307，就地渲染返回 cabinet JSON。

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, LOCATION};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use tracing::trace;

use super::types::{ApiResponse, ErrorCode};
use crate::api::middleware::VisitorId;
use crate::referral::Navigation;
use crate::services::{LandingOutcome, LandingService};

pub struct LandingHandler;

impl LandingHandler {
    pub async fn handle_landing(
        req: HttpRequest,
        visitor: VisitorId,
        landing: web::Data<Arc<LandingService>>,
    ) -> impl Responder {
        // path 保持原始编码，token 在解析时解码
        let nav = Navigation::from_parts(req.path(), Some(req.query_string()));
        trace!("Landing navigation: {}", nav.location());

        let outcome = landing.handle(visitor.as_str(), &nav).await;
        Self::respond(outcome)
    }

    fn respond(outcome: LandingOutcome) -> HttpResponse {
        match &outcome {
            LandingOutcome::Redirect { decision } => match decision.target() {
                Some(target) => HttpResponse::TemporaryRedirect()
                    .insert_header((LOCATION, target.to_string()))
                    .insert_header((CACHE_CONTROL, "no-store"))
                    .finish(),
                None => HttpResponse::Ok().json(ApiResponse::ok(outcome)),
            },
            LandingOutcome::Plain => HttpResponse::Ok().json(ApiResponse::ok(outcome)),
            LandingOutcome::Cabinet { view, .. } => {
                let (status, code) = if view.is_not_found() {
                    (StatusCode::NOT_FOUND, ErrorCode::LinkNotFound)
                } else {
                    (StatusCode::OK, ErrorCode::Success)
                };
                HttpResponse::build(status).json(ApiResponse::with_code(code, outcome))
            }
        }
    }
}

/// 落地页路由配置
pub fn landing_routes() -> actix_web::Scope {
    web::scope("")
        .route("/", web::get().to(LandingHandler::handle_landing))
        .route("/", web::head().to(LandingHandler::handle_landing))
        .route("/ref/{share_token}", web::get().to(LandingHandler::handle_landing))
        .route("/ref/{share_token}", web::head().to(LandingHandler::handle_landing))
}
