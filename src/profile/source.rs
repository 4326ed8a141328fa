//! 推荐 cabinet 数据源
//!
//! - `HttpProfileSource`: 调用分析后端 `GET referral-link-profile/{token}?period=`
//! - `StaticProfileSource`: 内存/fixture 数据，用于测试与离线 CLI

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use moka::future::Cache;
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::model::{ReferralCabinetProfile, ReportPeriod, parse_profile_response};
use crate::config::BackendConfig;
use crate::errors::{ReferralError, Result};
use crate::referral::ReferralToken;

/// 后端 profile 查询 trait
///
/// `Ok(None)` 表示后端明确没有该 token 的 profile。
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch(
        &self,
        token: &ReferralToken,
        period: ReportPeriod,
    ) -> Result<Option<ReferralCabinetProfile>>;

    /// 数据源名称（用于日志）
    fn name(&self) -> &'static str;
}

type CacheKey = (String, ReportPeriod);

/// 分析后端 HTTP 数据源
///
/// 内置 Moka 缓存（TTL 可配置，0 关闭）：
/// - 成功结果（含 null profile）按 token + period 缓存
/// - 错误不缓存
/// - 同一 key 的并发请求只发一次 HTTP
pub struct HttpProfileSource {
    base_url: String,
    agent: Agent,
    cache: Option<Cache<CacheKey, Option<ReferralCabinetProfile>>>,
}

impl HttpProfileSource {
    pub fn new(config: &BackendConfig) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs.max(1))))
            .build()
            .into();

        let cache = (config.cache_ttl_secs > 0).then(|| {
            Cache::builder()
                .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                .max_capacity(config.cache_capacity)
                .build()
        });

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent,
            cache,
        }
    }

    /// 构建请求 URL（token 已规范化）
    pub fn profile_url(&self, token: &ReferralToken) -> String {
        format!(
            "{}/referral-link-profile/{}",
            self.base_url,
            urlencoding::encode(token.as_str())
        )
    }

    /// 同步请求（在 spawn_blocking 中调用）
    fn fetch_sync(
        agent: Agent,
        url: String,
        period: ReportPeriod,
    ) -> Result<Option<ReferralCabinetProfile>> {
        let resp = match agent.get(&url).query("period", period.as_ref()).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                trace!("Profile backend returned 404 for \"{}\"", url);
                return Ok(None);
            }
            Err(e) => {
                return Err(ReferralError::profile_backend(format!(
                    "request to \"{}\" failed: {}",
                    url, e
                )));
            }
        };

        let body = resp.into_body().read_to_vec().map_err(|e| {
            ReferralError::profile_backend(format!("reading response from \"{}\" failed: {}", url, e))
        })?;

        parse_profile_response(&body)
    }

    async fn fetch_uncached(
        &self,
        token: &ReferralToken,
        period: ReportPeriod,
    ) -> Result<Option<ReferralCabinetProfile>> {
        let url = self.profile_url(token);
        let agent = self.agent.clone();
        debug!("Fetching referral profile from {}", url);

        tokio::task::spawn_blocking(move || Self::fetch_sync(agent, url, period))
            .await
            .map_err(|e| ReferralError::profile_backend(format!("fetch task failed: {}", e)))?
    }
}

#[async_trait]
impl ProfileSource for HttpProfileSource {
    async fn fetch(
        &self,
        token: &ReferralToken,
        period: ReportPeriod,
    ) -> Result<Option<ReferralCabinetProfile>> {
        let Some(cache) = &self.cache else {
            return self.fetch_uncached(token, period).await;
        };

        let key = (token.as_str().to_string(), period);
        cache
            .try_get_with(key, async {
                trace!("Profile cache miss for {} ({})", token, period);
                self.fetch_uncached(token, period).await
            })
            .await
            .map_err(|e: Arc<ReferralError>| {
                warn!("Profile fetch for {} failed: {}", token, e);
                (*e).clone()
            })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// 内存数据源
///
/// 未登记的 token 返回 `Ok(None)`；`fail_token` 登记的 token 返回后端错误。
#[derive(Default)]
pub struct StaticProfileSource {
    profiles: DashMap<String, ReferralCabinetProfile>,
    failing: DashSet<String>,
    calls: AtomicUsize,
}

impl StaticProfileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(self, token: &str, profile: ReferralCabinetProfile) -> Self {
        self.insert(token, profile);
        self
    }

    pub fn insert(&self, token: &str, profile: ReferralCabinetProfile) {
        if let Some(token) = ReferralToken::parse(token) {
            self.profiles.insert(token.to_string(), profile);
        }
    }

    pub fn fail_token(&self, token: &str) {
        if let Some(token) = ReferralToken::parse(token) {
            self.failing.insert(token.to_string());
        }
    }

    /// 从 JSON fixture 加载：`{"token": {profile} | null, ...}`
    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let entries: HashMap<String, Option<ReferralCabinetProfile>> =
            serde_json::from_str(&content)?;

        let source = Self::new();
        for (token, profile) in entries {
            if let Some(profile) = profile {
                profile.validate()?;
                source.insert(&token, profile);
            }
        }
        Ok(source)
    }

    /// 已处理的 fetch 次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ProfileSource for StaticProfileSource {
    async fn fetch(
        &self,
        token: &ReferralToken,
        _period: ReportPeriod,
    ) -> Result<Option<ReferralCabinetProfile>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(token.as_str()) {
            return Err(ReferralError::profile_backend(format!(
                "backend unavailable for {}",
                token
            )));
        }
        Ok(self.profiles.get(token.as_str()).map(|p| p.clone()))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::model::fixtures;

    #[tokio::test]
    async fn test_static_source_lookup_is_normalized() {
        let source = StaticProfileSource::new().with_profile(" Anna ", fixtures::profile(Some(3), "a"));
        let token = ReferralToken::parse("anna").unwrap();
        let found = source.fetch(&token, ReportPeriod::Days30).await.unwrap();
        assert_eq!(found.unwrap().campaign_id(), Some(3));

        let missing = ReferralToken::parse("bob").unwrap();
        assert!(source.fetch(&missing, ReportPeriod::Days30).await.unwrap().is_none());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_static_source_failure() {
        let source = StaticProfileSource::new();
        source.fail_token("down");
        let token = ReferralToken::parse("down").unwrap();
        let err = source.fetch(&token, ReportPeriod::All).await.unwrap_err();
        assert!(matches!(err, ReferralError::ProfileBackend(_)));
    }

    #[test]
    fn test_fixture_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        let profile = serde_json::to_value(fixtures::profile(Some(9), "fixture")).unwrap();
        let body = serde_json::json!({ "cmp9": profile, "gone": null });
        std::fs::write(&path, body.to_string()).unwrap();

        let source = StaticProfileSource::from_fixture_file(&path).unwrap();
        assert!(source.profiles.contains_key("cmp9"));
        assert!(!source.profiles.contains_key("gone"));
    }

    #[test]
    fn test_profile_url_encodes_token() {
        let source = HttpProfileSource::new(&BackendConfig {
            base_url: "http://backend.local/api/".to_string(),
            ..BackendConfig::default()
        });
        let token = ReferralToken::parse("a/b").unwrap();
        assert_eq!(
            source.profile_url(&token),
            "http://backend.local/api/referral-link-profile/a%2Fb"
        );
    }

    #[tokio::test]
    async fn test_http_source_unreachable_backend_is_error() {
        let source = HttpProfileSource::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            cache_ttl_secs: 0,
            cache_capacity: 10,
        });
        let token = ReferralToken::parse("x").unwrap();
        let err = source.fetch(&token, ReportPeriod::Days7).await.unwrap_err();
        assert!(matches!(err, ReferralError::ProfileBackend(_)));
    }
}
