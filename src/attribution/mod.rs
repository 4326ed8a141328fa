//! 归因存储
//!
//! 每个访客一条记录（不按 token 区分），默认最后写入者胜出。
//! 存储失败只记录日志，以 `PersistOutcome::Failed` 返回，不会中断渲染。

pub mod file;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::{AttributionBackendKind, AttributionConfig, AttributionPolicy};
use crate::referral::ReferralToken;

pub use file::FileAttributionBackend;
pub use memory::MemoryAttributionBackend;

/// 会话去重缓存容量
const SESSION_CACHE_CAPACITY: u64 = 100_000;
/// 会话空闲超时（30 分钟无导航视为新会话）
const SESSION_IDLE_SECS: u64 = 30 * 60;
const HEALTH_PROBE_VISITOR: &str = "__health_probe__";

/// 访客的归因记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignAttribution {
    #[serde(default)]
    pub campaign_id: Option<u64>,
    pub share_token: ReferralToken,
    pub first_seen_path: String,
    pub recorded_at: DateTime<Utc>,
}

impl CampaignAttribution {
    /// 合成 token 自带 campaign id
    pub fn new(share_token: ReferralToken, first_seen_path: impl Into<String>) -> Self {
        Self {
            campaign_id: share_token.campaign_id(),
            share_token,
            first_seen_path: first_seen_path.into(),
            recorded_at: Utc::now(),
        }
    }

    fn fingerprint(&self) -> (ReferralToken, Option<u64>) {
        (self.share_token.clone(), self.campaign_id)
    }

    /// 与另一条记录是否指向同一个 campaign（合成与显式 token 互通）
    pub fn same_campaign_as(&self, other: &CampaignAttribution) -> bool {
        self.share_token
            .same_campaign(self.campaign_id, &other.share_token, other.campaign_id)
    }
}

/// 写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistOutcome {
    Written,
    /// 本会话已写过相同记录
    Deduplicated,
    /// 策略或记录不匹配，未写入
    Skipped,
    Failed,
}

/// 归因存储后端
#[async_trait]
pub trait AttributionBackend: Send + Sync {
    async fn load(&self, visitor: &str) -> anyhow::Result<Option<CampaignAttribution>>;

    async fn store(&self, visitor: &str, record: CampaignAttribution) -> anyhow::Result<()>;

    /// 后端名称（用于日志）
    fn name(&self) -> &'static str;
}

pub struct AttributionStore {
    backend: Arc<dyn AttributionBackend>,
    policy: AttributionPolicy,
    /// visitor → 本会话最后写入的 (token, campaign_id)
    session: moka::sync::Cache<String, (ReferralToken, Option<u64>)>,
}

impl AttributionStore {
    pub fn new(backend: Arc<dyn AttributionBackend>, policy: AttributionPolicy) -> Self {
        let session = moka::sync::Cache::builder()
            .max_capacity(SESSION_CACHE_CAPACITY)
            .time_to_idle(Duration::from_secs(SESSION_IDLE_SECS))
            .build();
        Self {
            backend,
            policy,
            session,
        }
    }

    /// 根据配置创建存储
    pub fn from_config(config: &AttributionConfig) -> Self {
        let backend: Arc<dyn AttributionBackend> = match config.backend {
            AttributionBackendKind::Memory => Arc::new(MemoryAttributionBackend::new(
                config.max_capacity,
                (config.ttl_secs > 0).then(|| Duration::from_secs(config.ttl_secs)),
            )),
            AttributionBackendKind::File => Arc::new(FileAttributionBackend::new(&config.file_path)),
        };
        debug!(
            "Attribution store: {} backend, {} policy",
            backend.name(),
            config.policy
        );
        Self::new(backend, config.policy)
    }

    pub fn policy(&self) -> AttributionPolicy {
        self.policy
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// 探测后端可读（健康检查用）
    pub async fn probe(&self) -> anyhow::Result<()> {
        self.backend.load(HEALTH_PROBE_VISITOR).await.map(|_| ())
    }

    /// 读取访客当前记录，失败视为无记录
    pub async fn current(&self, visitor: &str) -> Option<CampaignAttribution> {
        match self.backend.load(visitor).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to load attribution for visitor {}: {}", visitor, e);
                None
            }
        }
    }

    /// 保存一次解析出的归因
    ///
    /// 本会话已写过同一 campaign 且后端记录仍在时去重；后端记录过期或被替换后重新写入。
    pub async fn persist(
        &self,
        visitor: &str,
        mut attribution: CampaignAttribution,
    ) -> PersistOutcome {
        let in_session = self.session.get(visitor).is_some_and(|(token, campaign_id)| {
            attribution
                .share_token
                .same_campaign(attribution.campaign_id, &token, campaign_id)
        });

        let stored = match self.backend.load(visitor).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(
                    "Failed to read attribution for visitor {} ({} backend): {}",
                    visitor,
                    self.backend.name(),
                    e
                );
                if self.policy == AttributionPolicy::FirstTouch {
                    return PersistOutcome::Failed;
                }
                None
            }
        };

        if let Some(existing) = &stored
            && attribution.same_campaign_as(existing)
        {
            if in_session {
                trace!(
                    "Attribution {} already written for visitor {} in this session",
                    attribution.share_token, visitor
                );
                self.session.insert(visitor.to_string(), existing.fingerprint());
                return PersistOutcome::Deduplicated;
            }
            // 同一 token 再次到达时保留已知的权威 id
            if attribution.campaign_id.is_none() && attribution.share_token == existing.share_token {
                attribution.campaign_id = existing.campaign_id;
            }
        }

        if self.policy == AttributionPolicy::FirstTouch
            && let Some(existing) = stored
        {
            trace!(
                "First-touch attribution {} kept for visitor {}",
                existing.share_token, visitor
            );
            self.session.insert(visitor.to_string(), existing.fingerprint());
            return PersistOutcome::Skipped;
        }

        self.write(visitor, attribution).await
    }

    /// 用后端权威 campaign id 升级记录，token 字符串保持不变
    ///
    /// 只在已存记录与给定 token 指向同一 campaign 时生效。
    pub async fn upgrade_campaign(
        &self,
        visitor: &str,
        token: &ReferralToken,
        campaign_id: u64,
    ) -> PersistOutcome {
        if campaign_id == 0 {
            return PersistOutcome::Skipped;
        }

        let existing = match self.backend.load(visitor).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!("Failed to read attribution for upgrade ({}): {}", visitor, e);
                return PersistOutcome::Failed;
            }
        };

        match existing {
            Some(record)
                if &record.share_token == token
                    || record
                        .share_token
                        .same_campaign(record.campaign_id, token, Some(campaign_id)) =>
            {
                if record.campaign_id == Some(campaign_id) {
                    return PersistOutcome::Deduplicated;
                }
                debug!(
                    "Upgrading attribution {} for visitor {}: campaign {:?} -> {}",
                    token, visitor, record.campaign_id, campaign_id
                );
                let upgraded = CampaignAttribution {
                    campaign_id: Some(campaign_id),
                    ..record
                };
                self.write(visitor, upgraded).await
            }
            _ => PersistOutcome::Skipped,
        }
    }

    async fn write(&self, visitor: &str, record: CampaignAttribution) -> PersistOutcome {
        let fingerprint = record.fingerprint();
        match self.backend.store(visitor, record).await {
            Ok(()) => {
                self.session.insert(visitor.to_string(), fingerprint);
                PersistOutcome::Written
            }
            Err(e) => {
                warn!(
                    "Failed to persist attribution for visitor {} ({} backend): {}",
                    visitor,
                    self.backend.name(),
                    e
                );
                PersistOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn token(raw: &str) -> ReferralToken {
        ReferralToken::parse(raw).unwrap()
    }

    fn memory_store(policy: AttributionPolicy) -> AttributionStore {
        AttributionStore::new(Arc::new(MemoryAttributionBackend::new(100, None)), policy)
    }

    struct BrokenBackend {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl AttributionBackend for BrokenBackend {
        async fn load(&self, _visitor: &str) -> anyhow::Result<Option<CampaignAttribution>> {
            anyhow::bail!("storage offline")
        }

        async fn store(&self, _visitor: &str, _record: CampaignAttribution) -> anyhow::Result<()> {
            self.attempts.fetch_add(1, Ordering::Relaxed);
            anyhow::bail!("storage offline")
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[test]
    fn test_synthesized_token_carries_campaign_id() {
        let record = CampaignAttribution::new(ReferralToken::for_campaign(12), "/");
        assert_eq!(record.campaign_id, Some(12));
        let record = CampaignAttribution::new(token("anna"), "/ref/anna");
        assert_eq!(record.campaign_id, None);
    }

    #[tokio::test]
    async fn test_last_touch_overwrites() {
        let store = memory_store(AttributionPolicy::LastTouch);
        let first = CampaignAttribution::new(token("a"), "/ref/a");
        let second = CampaignAttribution::new(token("b"), "/ref/b");

        assert_eq!(store.persist("v1", first).await, PersistOutcome::Written);
        assert_eq!(store.persist("v1", second).await, PersistOutcome::Written);
        assert_eq!(store.current("v1").await.unwrap().share_token, token("b"));
    }

    #[tokio::test]
    async fn test_repeated_write_is_deduplicated() {
        let store = memory_store(AttributionPolicy::LastTouch);
        let record = CampaignAttribution::new(token("a"), "/ref/a");
        assert_eq!(store.persist("v1", record.clone()).await, PersistOutcome::Written);

        let again = CampaignAttribution::new(token("a"), "/ref/a?cabinet=1");
        assert_eq!(store.persist("v1", again).await, PersistOutcome::Deduplicated);
        assert_eq!(store.current("v1").await.unwrap().first_seen_path, "/ref/a");

        // 其他访客不受影响
        assert_eq!(store.persist("v2", record).await, PersistOutcome::Written);
    }

    #[tokio::test]
    async fn test_expired_record_is_written_again() {
        let store = AttributionStore::new(
            Arc::new(MemoryAttributionBackend::new(100, Some(Duration::from_millis(50)))),
            AttributionPolicy::LastTouch,
        );
        let record = CampaignAttribution::new(ReferralToken::for_campaign(7), "/?ref_campaign=7");

        assert_eq!(store.persist("v1", record.clone()).await, PersistOutcome::Written);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(store.current("v1").await.is_none());

        assert_eq!(store.persist("v1", record).await, PersistOutcome::Written);
        assert_eq!(store.current("v1").await.unwrap().campaign_id, Some(7));
    }

    #[tokio::test]
    async fn test_known_campaign_id_survives_repeat_visit() {
        let store = memory_store(AttributionPolicy::LastTouch);
        store
            .persist("v1", CampaignAttribution::new(token("anna"), "/ref/anna"))
            .await;
        store.upgrade_campaign("v1", &token("anna"), 42).await;

        let again = CampaignAttribution::new(token("anna"), "/ref/anna");
        assert_eq!(store.persist("v1", again.clone()).await, PersistOutcome::Deduplicated);
        assert_eq!(store.current("v1").await.unwrap().campaign_id, Some(42));

        // 新会话（新进程）写入时沿用已知 id
        let restarted = AttributionStore::new(store.backend.clone(), AttributionPolicy::LastTouch);
        assert_eq!(restarted.persist("v1", again).await, PersistOutcome::Written);
        assert_eq!(restarted.current("v1").await.unwrap().campaign_id, Some(42));
    }

    #[tokio::test]
    async fn test_synthesized_and_explicit_tokens_are_same_campaign() {
        let store = memory_store(AttributionPolicy::LastTouch);
        store
            .persist("v1", CampaignAttribution::new(token("anna"), "/ref/anna"))
            .await;
        store.upgrade_campaign("v1", &token("anna"), 42).await;

        let synthesized = CampaignAttribution::new(ReferralToken::for_campaign(42), "/?ref_campaign=42");
        assert_eq!(store.persist("v1", synthesized).await, PersistOutcome::Deduplicated);
        assert_eq!(store.current("v1").await.unwrap().share_token, token("anna"));

        let store = memory_store(AttributionPolicy::LastTouch);
        store
            .persist("v2", CampaignAttribution::new(ReferralToken::for_campaign(42), "/"))
            .await;
        assert_eq!(
            store.upgrade_campaign("v2", &token("anna"), 42).await,
            PersistOutcome::Deduplicated
        );
        assert_eq!(
            store.upgrade_campaign("v2", &token("bella"), 41).await,
            PersistOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_first_touch_keeps_original() {
        let store = memory_store(AttributionPolicy::FirstTouch);
        assert_eq!(
            store
                .persist("v1", CampaignAttribution::new(token("a"), "/ref/a"))
                .await,
            PersistOutcome::Written
        );
        assert_eq!(
            store
                .persist("v1", CampaignAttribution::new(token("b"), "/ref/b"))
                .await,
            PersistOutcome::Skipped
        );
        assert_eq!(store.current("v1").await.unwrap().share_token, token("a"));
    }

    #[tokio::test]
    async fn test_upgrade_synthesized_campaign() {
        let store = memory_store(AttributionPolicy::LastTouch);
        let synthesized = ReferralToken::for_campaign(42);
        store
            .persist("v1", CampaignAttribution::new(synthesized.clone(), "/"))
            .await;

        // 相同 id：无需写入
        assert_eq!(
            store.upgrade_campaign("v1", &synthesized, 42).await,
            PersistOutcome::Deduplicated
        );

        let explicit = token("anna");
        store
            .persist("v2", CampaignAttribution::new(explicit.clone(), "/ref/anna"))
            .await;
        assert_eq!(
            store.upgrade_campaign("v2", &explicit, 42).await,
            PersistOutcome::Written
        );
        let record = store.current("v2").await.unwrap();
        assert_eq!(record.campaign_id, Some(42));
        assert_eq!(record.share_token, explicit);
        assert_eq!(record.first_seen_path, "/ref/anna");
    }

    #[tokio::test]
    async fn test_upgrade_ignores_other_token() {
        let store = memory_store(AttributionPolicy::LastTouch);
        store
            .persist("v1", CampaignAttribution::new(token("newer"), "/ref/newer"))
            .await;
        assert_eq!(
            store.upgrade_campaign("v1", &token("older"), 5).await,
            PersistOutcome::Skipped
        );
        assert_eq!(
            store.upgrade_campaign("nobody", &token("older"), 5).await,
            PersistOutcome::Skipped
        );
        assert_eq!(store.current("v1").await.unwrap().campaign_id, None);
    }

    #[tokio::test]
    async fn test_backend_failures_are_contained() {
        let backend = Arc::new(BrokenBackend {
            attempts: AtomicUsize::new(0),
        });
        let store = AttributionStore::new(backend.clone(), AttributionPolicy::LastTouch);
        let record = CampaignAttribution::new(token("a"), "/ref/a");

        assert_eq!(store.persist("v1", record.clone()).await, PersistOutcome::Failed);
        // 失败不记入会话，下次仍会重试
        assert_eq!(store.persist("v1", record).await, PersistOutcome::Failed);
        assert_eq!(backend.attempts.load(Ordering::Relaxed), 2);
        assert!(store.current("v1").await.is_none());
        assert_eq!(
            store.upgrade_campaign("v1", &token("a"), 3).await,
            PersistOutcome::Failed
        );
    }

    #[tokio::test]
    async fn test_first_touch_read_failure_does_not_write() {
        let backend = Arc::new(BrokenBackend {
            attempts: AtomicUsize::new(0),
        });
        let store = AttributionStore::new(backend.clone(), AttributionPolicy::FirstTouch);
        let outcome = store
            .persist("v1", CampaignAttribution::new(token("a"), "/ref/a"))
            .await;
        assert_eq!(outcome, PersistOutcome::Failed);
        assert_eq!(backend.attempts.load(Ordering::Relaxed), 0);
    }
}
