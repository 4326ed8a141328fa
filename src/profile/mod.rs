//! 推荐 cabinet 分析数据
//!
//! - `model`: 后端数据契约与边界校验
//! - `source`: 后端数据源（HTTP / 静态）
//! - `fetcher`: 按 token 拉取并丢弃过期响应

pub mod fetcher;
pub mod model;
pub mod source;

pub use fetcher::{
    AttributionUpgrade, FetchTicket, LoadOutcome, NotFoundReason, ProfileFetcher, ProfileState,
};
pub use model::{
    CampaignInfo, LeadEventType, ReferralCabinetProfile, ReferralLead, ReferralLinkInfo,
    ReferralMetrics, ReferrerInfo, ReferrerKind, ReportPeriod, ReportWindow,
    parse_profile_response,
};
pub use source::{HttpProfileSource, ProfileSource, StaticProfileSource};
