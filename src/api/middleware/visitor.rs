//! Visitor middleware
//!
//! 从 `rl_visitor` Cookie 读取访客标识，缺失或非法时生成新的 UUID 并在响应中下发。
//! 同时为每个请求生成 request_id，注入 tracing span 并写回 `X-Request-ID`。

use std::future::{Ready as StdReady, ready as std_ready};
use std::rc::Rc;

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::header::{HeaderName, HeaderValue},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

use crate::api::constants::{REQUEST_ID_HEADER, VISITOR_COOKIE_MAX_AGE_DAYS, VISITOR_COOKIE_NAME};

/// 访客标识，可从 request extensions 中提取，也可直接作为 handler 参数
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitorId {
    id: String,
    /// 本次请求新生成，需要下发 Cookie
    fresh: bool,
}

impl VisitorId {
    /// 从请求 Cookie 读取；没有合法 Cookie 时生成新标识
    pub fn from_cookie_value(value: Option<&str>) -> Self {
        match value.and_then(|v| Uuid::parse_str(v.trim()).ok()) {
            Some(id) => Self {
                id: id.to_string(),
                fresh: false,
            },
            None => Self {
                id: Uuid::new_v4().to_string(),
                fresh: true,
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn cookie(&self) -> Cookie<'static> {
        Cookie::build(VISITOR_COOKIE_NAME, self.id.clone())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::days(VISITOR_COOKIE_MAX_AGE_DAYS))
            .finish()
    }
}

impl FromRequest for VisitorId {
    type Error = Error;
    type Future = StdReady<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        // 中间件已注入时直接复用；Ref 需在读取 Cookie 前释放
        let injected = req.extensions().get::<VisitorId>().cloned();
        let visitor = injected.unwrap_or_else(|| {
            VisitorId::from_cookie_value(req.cookie(VISITOR_COOKIE_NAME).as_ref().map(|c| c.value()))
        });
        std_ready(Ok(visitor))
    }
}

/// Visitor 中间件工厂
#[derive(Clone, Default)]
pub struct VisitorMiddleware;

impl<S, B> Transform<S, ServiceRequest> for VisitorMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = VisitorService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(VisitorService {
            service: Rc::new(service),
        }))
    }
}

pub struct VisitorService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for VisitorService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        let visitor = VisitorId::from_cookie_value(
            req.cookie(VISITOR_COOKIE_NAME).as_ref().map(|c| c.value()),
        );
        req.extensions_mut().insert(visitor.clone());

        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "request",
            request_id = %request_id,
            visitor = %visitor.as_str(),
            method = %req.method(),
            path = %req.path(),
        );

        Box::pin(
            async move {
                let mut response = srv.call(req).await?;

                if visitor.is_fresh()
                    && let Err(e) = response.response_mut().add_cookie(&visitor.cookie())
                {
                    warn!("Failed to set visitor cookie: {}", e);
                }

                if let Ok(header_value) = HeaderValue::from_str(&request_id) {
                    response
                        .headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), header_value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}
