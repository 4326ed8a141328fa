//! 落地页重定向策略
//!
//! 每次导航恰好产生一个决策。规则按顺序判断：
//! 1. 已解析 token 且非 cabinet 模式 → 跳转账号流程
//! 2. token 只来自 query 且请求 cabinet 模式 → 跳转规范 `/ref/{token}`
//! 3. 其余情况就地渲染
//!
//! 目标与当前位置相同时返回就地渲染，避免重定向循环。

use serde::Serialize;

use super::navigation::{ACCOUNT_PATH, Navigation, REF_ROUTE_PREFIX, build_location, params};
use super::token::{ReferralToken, ResolvedToken, TokenSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectDecision {
    RedirectToAccount { target: String },
    RedirectToCanonical { target: String },
    RenderInPlace,
}

impl RedirectDecision {
    pub fn target(&self) -> Option<&str> {
        match self {
            RedirectDecision::RedirectToAccount { target }
            | RedirectDecision::RedirectToCanonical { target } => Some(target),
            RedirectDecision::RenderInPlace => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        self.target().is_some()
    }
}

/// 账号创建流程目标：`/account?ref_share={token}` + 其余参数
pub fn account_target(token: &ReferralToken, nav: &Navigation) -> String {
    let mut query = vec![(params::REF_SHARE.to_string(), token.to_string())];
    query.extend(nav.query_without(&[params::REF_CAMPAIGN, params::CABINET, params::REF_SHARE]));
    build_location(ACCOUNT_PATH, &query)
}

/// 规范化目标：`/ref/{token}` + 其余参数（保留 cabinet）
pub fn canonical_target(token: &ReferralToken, nav: &Navigation) -> String {
    let path = format!(
        "{}{}",
        REF_ROUTE_PREFIX,
        urlencoding::encode(token.as_str())
    );
    let query = nav.query_without(&[params::REF_CAMPAIGN, params::REF_SHARE]);
    build_location(&path, &query)
}

/// 根据解析结果与当前导航决定动作
pub fn decide(nav: &Navigation, resolved: Option<&ResolvedToken>) -> RedirectDecision {
    let Some(resolved) = resolved else {
        return RedirectDecision::RenderInPlace;
    };

    let cabinet_mode = nav.cabinet_mode();
    let decision = if !cabinet_mode {
        RedirectDecision::RedirectToAccount {
            target: account_target(&resolved.token, nav),
        }
    } else if resolved.source != TokenSource::Route {
        RedirectDecision::RedirectToCanonical {
            target: canonical_target(&resolved.token, nav),
        }
    } else {
        RedirectDecision::RenderInPlace
    };

    match decision.target() {
        Some(target) if Navigation::from_location(target).location() == nav.location() => {
            RedirectDecision::RenderInPlace
        }
        _ => decision,
    }
}
