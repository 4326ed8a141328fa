use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::{AttributionBackend, CampaignAttribution};

type Records = BTreeMap<String, CampaignAttribution>;

/// JSON 文件归因后端
///
/// 首次访问时读入整份文件，之后每次写入先写临时文件再 rename 替换。
/// 进程内写入通过互斥锁串行化；多进程共享同一文件时最后写入者胜出。
pub struct FileAttributionBackend {
    path: PathBuf,
    records: Mutex<Option<Records>>,
}

impl FileAttributionBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            records: Mutex::new(None),
        }
    }

    async fn read_file(&self) -> anyhow::Result<Records> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Records::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("corrupt attribution file {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "Attribution file {} not found, starting empty",
                    self.path.display()
                );
                Ok(Records::new())
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn write_file(&self, records: &Records) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        trace!("Attribution file {} updated", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl AttributionBackend for FileAttributionBackend {
    async fn load(&self, visitor: &str) -> anyhow::Result<Option<CampaignAttribution>> {
        let mut guard = self.records.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        Ok(guard.as_ref().and_then(|records| records.get(visitor).cloned()))
    }

    async fn store(&self, visitor: &str, record: CampaignAttribution) -> anyhow::Result<()> {
        let mut guard = self.records.lock().await;
        let mut records = match guard.take() {
            Some(records) => records,
            None => self.read_file().await?,
        };

        let previous = records.insert(visitor.to_string(), record);
        if let Err(e) = self.write_file(&records).await {
            // 写盘失败时回滚内存状态，保持与磁盘一致
            match previous {
                Some(previous) => {
                    records.insert(visitor.to_string(), previous);
                }
                None => {
                    records.remove(visitor);
                }
            }
            *guard = Some(records);
            return Err(e);
        }

        *guard = Some(records);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
