use async_trait::async_trait;
use serde::Serialize;

use crate::errors::{ReferralError, Result};

/// 分享内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub url: String,
}

/// 平台原生分享能力
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// 平台是否支持原生分享
    fn is_available(&self) -> bool;

    async fn share(&self, payload: &SharePayload) -> Result<()>;
}

/// 没有原生分享能力的平台
pub struct UnavailableShare;

#[async_trait]
impl ShareTarget for UnavailableShare {
    fn is_available(&self) -> bool {
        false
    }

    async fn share(&self, _payload: &SharePayload) -> Result<()> {
        Err(ReferralError::share("native share is not available"))
    }
}
