use serde::Serialize;

use crate::profile::{
    CampaignInfo, NotFoundReason, ProfileState, ReferralLead, ReferralMetrics,
    ReferrerInfo, ReportPeriod, ReportWindow,
};
use crate::referral::{ReferralToken, normalize_referral_link};

pub const LINK_NOT_FOUND_MESSAGE: &str = "link not found or inactive";

/// 返回给客户端的 cabinet 视图
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CabinetView {
    Loaded {
        token: ReferralToken,
        period: ReportPeriod,
        campaign: CampaignInfo,
        window: ReportWindow,
        referrer: ReferrerInfo,
        /// 规范化后的绝对链接
        link: String,
        metrics: ReferralMetrics,
        leads: Vec<ReferralLead>,
        total_leads: usize,
    },
    NotFound {
        token: ReferralToken,
        reason: NotFoundReason,
        message: &'static str,
    },
    Loading {
        token: ReferralToken,
    },
}

impl CabinetView {
    /// 由拉取状态构建视图；Idle 状态没有 token，返回 None
    pub fn from_state(
        state: &ProfileState,
        period: ReportPeriod,
        origin: &str,
        leads_page_size: usize,
    ) -> Option<Self> {
        match state {
            ProfileState::Idle => None,
            ProfileState::Loading { token } => Some(CabinetView::Loading {
                token: token.clone(),
            }),
            ProfileState::NotFound { token, reason } => Some(CabinetView::NotFound {
                token: token.clone(),
                reason: reason.clone(),
                message: LINK_NOT_FOUND_MESSAGE,
            }),
            ProfileState::Loaded { token, profile } => {
                // 后端未给链接时退回规范路由
                let raw = profile
                    .link
                    .raw()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("/ref/{}", urlencoding::encode(token.as_str())));
                Some(CabinetView::Loaded {
                    token: token.clone(),
                    period,
                    campaign: profile.campaign.clone(),
                    window: profile.period.clone(),
                    referrer: profile.referrer.clone(),
                    link: normalize_referral_link(&raw, origin),
                    metrics: profile.metrics.clone(),
                    leads: profile.leads.iter().take(leads_page_size).cloned().collect(),
                    total_leads: profile.leads.len(),
                })
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CabinetView::NotFound { .. })
    }

    /// Loaded 视图的链接与活动名（供展示层操作）
    pub fn link_and_title(&self) -> Option<(&str, &str)> {
        match self {
            CabinetView::Loaded { link, campaign, .. } => Some((link, campaign.name.as_str())),
            _ => None,
        }
    }
}
