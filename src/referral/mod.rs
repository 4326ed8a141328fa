//! Referral resolution
//!
//! Pure, synchronous building blocks of the landing flow:
//! - `token`: canonical referral token from route/query signals
//! - `navigation`: path + ordered query of a single navigation
//! - `policy`: redirect decision for a resolved navigation
//! - `link`: referral link normalization

pub mod link;
pub mod navigation;
pub mod policy;
pub mod token;

pub use link::normalize_referral_link;
pub use navigation::{Navigation, params};
pub use policy::{RedirectDecision, decide};
pub use token::{ReferralToken, ResolvedToken, TokenSource, resolve_token};

/// 从导航中提取三个信号并解析 token
pub fn resolve_navigation(nav: &Navigation) -> Option<ResolvedToken> {
    let route_token = nav.route_token();
    resolve_token(
        route_token.as_deref(),
        nav.param(params::REF_SHARE),
        nav.param(params::REF_CAMPAIGN),
    )
}
