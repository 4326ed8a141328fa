//! 推荐 cabinet 数据契约
//!
//! 后端返回的负载在边界处反序列化并校验，字段缺失或数值不一致的
//! 负载直接拒绝，不会以默认值继续传播。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::errors::{ReferralError, Result};

/// 报表周期
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, EnumIter, AsRefStr,
)]
pub enum ReportPeriod {
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Days7,
    #[default]
    #[serde(rename = "30d")]
    #[strum(serialize = "30d")]
    Days30,
    #[serde(rename = "90d")]
    #[strum(serialize = "90d")]
    Days90,
    #[serde(rename = "all")]
    #[strum(serialize = "all")]
    All,
}

impl ReportPeriod {
    /// 解析 query 中的周期，无法识别时使用默认值
    pub fn parse_or(raw: Option<&str>, default: ReportPeriod) -> ReportPeriod {
        raw.and_then(|s| s.parse().ok()).unwrap_or(default)
    }
}

impl std::fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for ReportPeriod {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "7d" => Ok(Self::Days7),
            "30d" => Ok(Self::Days30),
            "90d" => Ok(Self::Days90),
            "all" => Ok(Self::All),
            _ => Err(format!(
                "Invalid report period: '{}'. Valid: 7d, 30d, 90d, all",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInfo {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportWindow {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferrerKind {
    /// 个人推荐链接
    Individual,
    /// campaign 通用链接
    Campaign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferrerInfo {
    pub kind: ReferrerKind,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferralLinkInfo {
    #[serde(default)]
    pub relative: Option<String>,
    #[serde(default)]
    pub absolute: Option<String>,
}

impl ReferralLinkInfo {
    /// 优先绝对链接
    pub fn raw(&self) -> Option<&str> {
        fn present(link: &Option<String>) -> Option<&str> {
            link.as_deref().filter(|s| !s.trim().is_empty())
        }
        present(&self.absolute).or_else(|| present(&self.relative))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralMetrics {
    pub total_clicks: u64,
    pub unique_clicks: u64,
    pub total_bookings: u64,
    pub registered_clients: u64,
    /// 后端计算的百分比，原样透传
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadEventType {
    Visit,
    Booking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralLead {
    pub id: u64,
    pub event_type: LeadEventType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub registered: bool,
    #[serde(default)]
    pub booked: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferralCabinetProfile {
    pub campaign: CampaignInfo,
    #[serde(default)]
    pub period: ReportWindow,
    pub referrer: ReferrerInfo,
    #[serde(default)]
    pub link: ReferralLinkInfo,
    pub metrics: ReferralMetrics,
    /// 后端顺序（最新在前），只读
    #[serde(default)]
    pub leads: Vec<ReferralLead>,
}

impl ReferralCabinetProfile {
    /// 后端给出的权威 campaign id
    pub fn campaign_id(&self) -> Option<u64> {
        self.campaign.id.filter(|id| *id > 0)
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.metrics;
        if m.unique_clicks > m.total_clicks {
            return Err(ReferralError::malformed_profile(format!(
                "unique_clicks ({}) exceeds total_clicks ({})",
                m.unique_clicks, m.total_clicks
            )));
        }
        if m.registered_clients > m.total_bookings {
            return Err(ReferralError::malformed_profile(format!(
                "registered_clients ({}) exceeds total_bookings ({})",
                m.registered_clients, m.total_bookings
            )));
        }
        if !m.conversion_rate.is_finite() || !(0.0..=100.0).contains(&m.conversion_rate) {
            return Err(ReferralError::malformed_profile(format!(
                "conversion_rate {} is outside [0, 100]",
                m.conversion_rate
            )));
        }
        if let (Some(from), Some(to)) = (self.period.date_from, self.period.date_to)
            && from > to
        {
            return Err(ReferralError::malformed_profile(format!(
                "period date_from {} is after date_to {}",
                from, to
            )));
        }
        Ok(())
    }
}

/// 后端响应外壳：`{"profile": ... | null}`
#[derive(Debug, Clone, Deserialize)]
struct ProfileEnvelope {
    #[serde(default)]
    profile: Option<ReferralCabinetProfile>,
}

/// 解析并校验后端响应
pub fn parse_profile_response(body: &[u8]) -> Result<Option<ReferralCabinetProfile>> {
    let envelope: ProfileEnvelope = serde_json::from_slice(body)
        .map_err(|e| ReferralError::malformed_profile(format!("invalid profile payload: {}", e)))?;
    match envelope.profile {
        Some(profile) => {
            profile.validate()?;
            Ok(Some(profile))
        }
        None => Ok(None),
    }
}
