//! Cabinet API and health route tests

mod common;

use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::Value;

use referral_landing::api::constants::VISITOR_COOKIE_NAME;
use referral_landing::api::middleware::VisitorMiddleware;
use referral_landing::api::services::{AppStartTime, cabinet_routes, health_routes};
use referral_landing::attribution::CampaignAttribution;
use referral_landing::config::AttributionPolicy;
use referral_landing::referral::ReferralToken;

use common::{harness, test_config};

macro_rules! cabinet_app {
    ($harness:expr) => {
        test::init_service(
            App::new()
                .wrap(VisitorMiddleware)
                .app_data(web::Data::new($harness.landing.clone()))
                .app_data(web::Data::new(AppStartTime::now()))
                .service(web::scope("/health").service(health_routes()))
                .service(cabinet_routes()),
        )
        .await
    };
}

#[actix_web::test]
async fn test_get_cabinet_view() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::LastTouch);
    let app = cabinet_app!(h);

    let req = TestRequest::get()
        .uri("/api/cabinet/Beauty2024?period=90d")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["data"]["status"], "loaded");
    assert_eq!(body["data"]["period"], "90d");
    // 相对链接（无前导斜杠）按 origin 规范化
    assert_eq!(body["data"]["link"], "https://salon.example/ref/beauty2024");
    assert_eq!(body["data"]["metrics"]["conversion_rate"], 30.0);
    assert_eq!(body["data"]["window"]["date_from"], "2024-03-01");
    assert_eq!(body["data"]["total_leads"], 2);
}

#[actix_web::test]
async fn test_get_cabinet_unknown_token() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::LastTouch);
    let app = cabinet_app!(h);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/cabinet/nobody").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3000);
    assert_eq!(body["data"]["message"], "link not found or inactive");
}

#[actix_web::test]
async fn test_get_cabinet_backend_failure() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::LastTouch);
    h.source.fail_token("flaky");
    let app = cabinet_app!(h);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/cabinet/flaky").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3001);
    assert_eq!(body["data"]["reason"], "unavailable");
}

#[actix_web::test]
async fn test_blank_token_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::LastTouch);
    let app = cabinet_app!(h);

    let resp = test::call_service(
        &app,
        TestRequest::get().uri("/api/cabinet/%20%20").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.source.calls(), 0);
}

#[actix_web::test]
async fn test_cabinet_fetch_upgrades_existing_attribution() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::LastTouch);
    let visitor = "0b6c7d84-53f5-4f39-9a43-5f7a5fd3c5a1";
    h.store
        .persist(
            visitor,
            CampaignAttribution::new(ReferralToken::parse("anna").unwrap(), "/ref/anna"),
        )
        .await;
    let app = cabinet_app!(h);

    let req = TestRequest::get()
        .uri("/api/cabinet/anna")
        .cookie(Cookie::new(VISITOR_COOKIE_NAME, visitor))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let record = h.store.current(visitor).await.unwrap();
    assert_eq!(record.campaign_id, Some(42));
    assert_eq!(record.share_token.as_str(), "anna");
}

#[actix_web::test]
async fn test_export_qr_writes_svg() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::LastTouch);
    let app = cabinet_app!(h);

    let resp = test::call_service(
        &app,
        TestRequest::post().uri("/api/cabinet/anna/qr").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["kind"], "success");

    let svg = std::fs::read_to_string(dir.path().join("referral-anna.svg")).unwrap();
    assert!(svg.contains("<svg"));
}

#[actix_web::test]
async fn test_export_qr_unknown_token() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::LastTouch);
    let app = cabinet_app!(h);

    let resp = test::call_service(
        &app,
        TestRequest::post().uri("/api/cabinet/nobody/qr").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[actix_web::test]
async fn test_health_check() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(&test_config(dir.path()), AttributionPolicy::FirstTouch);
    let app = cabinet_app!(h);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["attribution"]["backend"], "memory");
    assert_eq!(body["data"]["checks"]["attribution"]["policy"], "first_touch");
    assert_eq!(body["data"]["checks"]["profile_source"]["name"], "static");

    let resp = test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = test::call_service(&app, TestRequest::get().uri("/health/ready").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
