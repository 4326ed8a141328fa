use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use super::{AttributionBackend, CampaignAttribution};

/// 内存归因后端（Moka）
///
/// 进程重启后丢失；可选 TTL 作为存储层的过期策略。
pub struct MemoryAttributionBackend {
    records: Cache<String, CampaignAttribution>,
}

impl MemoryAttributionBackend {
    pub fn new(max_capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            records: builder.build(),
        }
    }
}

#[async_trait]
impl AttributionBackend for MemoryAttributionBackend {
    async fn load(&self, visitor: &str) -> anyhow::Result<Option<CampaignAttribution>> {
        Ok(self.records.get(visitor).await)
    }

    async fn store(&self, visitor: &str, record: CampaignAttribution) -> anyhow::Result<()> {
        self.records.insert(visitor.to_string(), record).await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
