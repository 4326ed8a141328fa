//! Profile 拉取器
//!
//! 每个实例对应一个 cabinet 视图的生命周期：
//! - 同一 token + period 只拉取一次，token 变化才重新拉取
//! - 每次请求携带 ticket（代数 + token），完成时 ticket 已过期则丢弃结果
//! - 成功且带 campaign id 时升级归因记录

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace, warn};

use super::model::{ReferralCabinetProfile, ReportPeriod};
use super::source::ProfileSource;
use crate::attribution::AttributionStore;
use crate::errors::Result;
use crate::referral::ReferralToken;

/// 视图可见的 profile 状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProfileState {
    Idle,
    Loading {
        token: ReferralToken,
    },
    Loaded {
        token: ReferralToken,
        profile: Arc<ReferralCabinetProfile>,
    },
    NotFound {
        token: ReferralToken,
        reason: NotFoundReason,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// 后端返回 null
    Missing,
    /// 网络或后端错误
    Unavailable,
}

/// 一次请求的凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    token: ReferralToken,
    period: ReportPeriod,
}

impl FetchTicket {
    pub fn token(&self) -> &ReferralToken {
        &self.token
    }

    pub fn period(&self) -> ReportPeriod {
        self.period
    }
}

/// `load` 的结果
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Arc<ReferralCabinetProfile>),
    NotFound(NotFoundReason),
    /// 与当前 token 相同，未重新拉取
    AlreadyCurrent,
    /// 响应到达时 token 已变化，结果已丢弃
    Stale,
}

/// 拉取成功后用于升级归因的上下文
#[derive(Clone)]
pub struct AttributionUpgrade {
    pub store: Arc<AttributionStore>,
    pub visitor: String,
}

struct FetcherState {
    generation: u64,
    key: Option<(ReferralToken, ReportPeriod)>,
    view: ProfileState,
}

pub struct ProfileFetcher {
    source: Arc<dyn ProfileSource>,
    upgrade: Option<AttributionUpgrade>,
    state: Mutex<FetcherState>,
}

impl ProfileFetcher {
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        Self {
            source,
            upgrade: None,
            state: Mutex::new(FetcherState {
                generation: 0,
                key: None,
                view: ProfileState::Idle,
            }),
        }
    }

    /// 拉取成功后升级该访客的归因记录
    pub fn with_attribution_upgrade(mut self, upgrade: AttributionUpgrade) -> Self {
        self.upgrade = Some(upgrade);
        self
    }

    pub fn state(&self) -> ProfileState {
        self.state.lock().view.clone()
    }

    /// 为新 token 开始一次请求；与当前 token 相同时返回 None
    pub fn begin(&self, token: &ReferralToken, period: ReportPeriod) -> Option<FetchTicket> {
        let mut state = self.state.lock();
        if let Some((current, current_period)) = &state.key
            && current == token
            && *current_period == period
        {
            trace!("Profile for {} already requested, skipping", token);
            return None;
        }

        state.generation += 1;
        state.key = Some((token.clone(), period));
        state.view = ProfileState::Loading {
            token: token.clone(),
        };

        Some(FetchTicket {
            generation: state.generation,
            token: token.clone(),
            period,
        })
    }

    /// 应用请求结果；ticket 过期时丢弃
    pub fn complete(
        &self,
        ticket: &FetchTicket,
        result: Result<Option<ReferralCabinetProfile>>,
    ) -> LoadOutcome {
        let mut state = self.state.lock();
        if state.generation != ticket.generation {
            debug!(
                "Discarding stale profile response for {} (generation {} < {})",
                ticket.token, ticket.generation, state.generation
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(Some(profile)) => {
                let profile = Arc::new(profile);
                state.view = ProfileState::Loaded {
                    token: ticket.token.clone(),
                    profile: Arc::clone(&profile),
                };
                LoadOutcome::Loaded(profile)
            }
            Ok(None) => {
                debug!("No referral profile for {}", ticket.token);
                state.view = ProfileState::NotFound {
                    token: ticket.token.clone(),
                    reason: NotFoundReason::Missing,
                };
                LoadOutcome::NotFound(NotFoundReason::Missing)
            }
            Err(e) => {
                warn!("Referral profile for {} unavailable: {}", ticket.token, e);
                state.view = ProfileState::NotFound {
                    token: ticket.token.clone(),
                    reason: NotFoundReason::Unavailable,
                };
                LoadOutcome::NotFound(NotFoundReason::Unavailable)
            }
        }
    }

    /// 拉取 token 对应的 profile
    pub async fn load(&self, token: &ReferralToken, period: ReportPeriod) -> LoadOutcome {
        let Some(ticket) = self.begin(token, period) else {
            return LoadOutcome::AlreadyCurrent;
        };

        trace!("Fetching profile for {} via {} source", token, self.source.name());
        let result = self.source.fetch(ticket.token(), ticket.period()).await;
        let outcome = self.complete(&ticket, result);

        if let LoadOutcome::Loaded(profile) = &outcome
            && let Some(campaign_id) = profile.campaign_id()
            && let Some(upgrade) = &self.upgrade
        {
            upgrade
                .store
                .upgrade_campaign(&upgrade.visitor, ticket.token(), campaign_id)
                .await;
        }

        outcome
    }
}
