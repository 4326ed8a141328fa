//! 落地页流程
//!
//! 一次导航的完整处理：
//! 1. 解析 token 并决定是否重定向（重定向时直接返回，不写归因、不拉取）
//! 2. 就地渲染时并发写归因、拉取 profile
//! 3. profile 带权威 campaign id 时升级归因

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::attribution::{AttributionStore, CampaignAttribution, PersistOutcome};
use crate::cabinet::{
    CabinetPresenter, CabinetView, Clipboard, LINK_NOT_FOUND_MESSAGE, MemoryClipboard, Notice,
    ShareTarget, UnavailableShare,
};
use crate::config::StaticConfig;
use crate::profile::{
    AttributionUpgrade, LoadOutcome, ProfileFetcher, ProfileSource, ReportPeriod,
};
use crate::referral::{
    Navigation, RedirectDecision, ReferralToken, decide, params, resolve_navigation,
};

/// 一次导航的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LandingOutcome {
    Redirect {
        decision: RedirectDecision,
    },
    /// 没有推荐 token 的普通落地页
    Plain,
    Cabinet {
        attribution: PersistOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        upgrade: Option<PersistOutcome>,
        view: CabinetView,
    },
}

pub struct LandingService {
    store: Arc<AttributionStore>,
    source: Arc<dyn ProfileSource>,
    clipboard: Arc<dyn Clipboard>,
    share: Arc<dyn ShareTarget>,
    origin: String,
    leads_page_size: usize,
    default_period: ReportPeriod,
    qr_output_dir: PathBuf,
}

impl LandingService {
    pub fn new(
        config: &StaticConfig,
        store: Arc<AttributionStore>,
        source: Arc<dyn ProfileSource>,
    ) -> Self {
        Self {
            store,
            source,
            clipboard: Arc::new(MemoryClipboard::new()),
            share: Arc::new(UnavailableShare),
            origin: config.server.origin.clone(),
            leads_page_size: config.cabinet.leads_page_size,
            default_period: config.cabinet.default_period,
            qr_output_dir: PathBuf::from(&config.cabinet.qr_output_dir),
        }
    }

    /// 替换展示层使用的剪贴板与分享能力
    pub fn with_presenter_backends(
        mut self,
        clipboard: Arc<dyn Clipboard>,
        share: Arc<dyn ShareTarget>,
    ) -> Self {
        self.clipboard = clipboard;
        self.share = share;
        self
    }

    pub fn attribution_store(&self) -> &Arc<AttributionStore> {
        &self.store
    }

    pub fn default_period(&self) -> ReportPeriod {
        self.default_period
    }

    pub fn profile_source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn qr_output_dir(&self) -> &Path {
        &self.qr_output_dir
    }

    /// 处理一次落地页导航
    pub async fn handle(&self, visitor: &str, nav: &Navigation) -> LandingOutcome {
        let resolved = resolve_navigation(nav);
        let decision = decide(nav, resolved.as_ref());

        if let Some(target) = decision.target() {
            info!(
                "Landing {} -> {} (token: {})",
                nav.location(),
                target,
                resolved
                    .as_ref()
                    .map(|r| r.token.as_str())
                    .unwrap_or("-")
            );
            return LandingOutcome::Redirect { decision };
        }

        let Some(resolved) = resolved else {
            debug!("Landing {} without referral token", nav.location());
            return LandingOutcome::Plain;
        };

        let token = resolved.token;
        let period = ReportPeriod::parse_or(nav.param(params::PERIOD), self.default_period);
        let attribution = CampaignAttribution::new(token.clone(), nav.path());
        let fetcher = ProfileFetcher::new(Arc::clone(&self.source));

        // 归因写入与 profile 拉取互不依赖
        let (persisted, loaded) = tokio::join!(
            self.store.persist(visitor, attribution),
            fetcher.load(&token, period)
        );

        let upgrade = match &loaded {
            LoadOutcome::Loaded(profile) => match profile.campaign_id() {
                Some(campaign_id) => {
                    Some(self.store.upgrade_campaign(visitor, &token, campaign_id).await)
                }
                None => None,
            },
            _ => None,
        };

        let view = CabinetView::from_state(
            &fetcher.state(),
            period,
            &self.origin,
            self.leads_page_size,
        )
        .unwrap_or(CabinetView::Loading {
            token: token.clone(),
        });

        debug!(
            "Cabinet for {} rendered in place (attribution: {:?}, upgrade: {:?})",
            token, persisted, upgrade
        );

        LandingOutcome::Cabinet {
            attribution: persisted,
            upgrade,
            view,
        }
    }

    /// 直接获取 cabinet 视图（不经过重定向策略）
    ///
    /// 带访客时，拉取成功会升级该访客已有的同 token 归因。
    pub async fn cabinet(
        &self,
        visitor: Option<&str>,
        token: &ReferralToken,
        period: ReportPeriod,
    ) -> CabinetView {
        let mut fetcher = ProfileFetcher::new(Arc::clone(&self.source));
        if let Some(visitor) = visitor {
            fetcher = fetcher.with_attribution_upgrade(AttributionUpgrade {
                store: Arc::clone(&self.store),
                visitor: visitor.to_string(),
            });
        }

        fetcher.load(token, period).await;
        CabinetView::from_state(&fetcher.state(), period, &self.origin, self.leads_page_size)
            .unwrap_or(CabinetView::Loading {
                token: token.clone(),
            })
    }

    /// 为已加载的视图构建展示层
    pub fn presenter(&self, view: &CabinetView) -> Option<CabinetPresenter> {
        let CabinetView::Loaded { token, .. } = view else {
            return None;
        };
        let (link, title) = view.link_and_title()?;
        Some(CabinetPresenter::new(
            token.clone(),
            link,
            title,
            Arc::clone(&self.clipboard),
            Arc::clone(&self.share),
        ))
    }

    /// 导出 token 的二维码到配置目录
    pub async fn export_qr(&self, token: &ReferralToken, period: ReportPeriod) -> Notice {
        let view = self.cabinet(None, token, period).await;
        match self.presenter(&view) {
            Some(presenter) => presenter.export_qr(&self.qr_output_dir).await,
            None => Notice::failure(LINK_NOT_FOUND_MESSAGE),
        }
    }
}
