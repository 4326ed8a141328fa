//! 推荐 token 解析
//!
//! 三个信号按固定优先级取第一个命中的：
//! 1. 路由段 `/ref/{token}`
//! 2. query 参数 `ref_share`
//! 3. query 参数 `ref_campaign`（正整数）合成为 `cmp{id}`

use std::fmt;

use serde::{Deserialize, Serialize};

/// 合成 campaign token 的前缀
pub const CAMPAIGN_TOKEN_PREFIX: &str = "cmp";

/// token 来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    Route,
    QueryShare,
    QueryCampaign,
}

/// 规范化后的推荐 token（已 trim + 小写，非空）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferralToken(String);

impl ReferralToken {
    /// 规范化原始输入，空白输入返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_lowercase()))
    }

    /// 由数字 campaign id 合成 token
    pub fn for_campaign(campaign_id: u64) -> Self {
        Self(format!("{}{}", CAMPAIGN_TOKEN_PREFIX, campaign_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 合成 token 对应的 campaign id；显式 share token 返回 None
    pub fn campaign_id(&self) -> Option<u64> {
        self.0
            .strip_prefix(CAMPAIGN_TOKEN_PREFIX)
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<u64>().ok())
            .filter(|id| *id > 0)
    }

    /// 两个 token 是否指向同一个 campaign
    ///
    /// `campaign_id` / `other_campaign_id` 为各自已知的权威 id，缺省时取合成 token 自带的 id。
    /// 相同 token 只有在两侧 id 冲突时才视为不同。
    pub fn same_campaign(
        &self,
        campaign_id: Option<u64>,
        other: &ReferralToken,
        other_campaign_id: Option<u64>,
    ) -> bool {
        let ids = (
            campaign_id.or_else(|| self.campaign_id()),
            other_campaign_id.or_else(|| other.campaign_id()),
        );
        if self == other {
            return !matches!(ids, (Some(a), Some(b)) if a != b);
        }
        matches!(ids, (Some(a), Some(b)) if a == b)
    }
}

impl fmt::Display for ReferralToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReferralToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReferralToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ReferralToken::parse(&value).ok_or_else(|| "referral token must not be empty".to_string())
    }
}

impl From<ReferralToken> for String {
    fn from(token: ReferralToken) -> Self {
        token.0
    }
}

/// 解析结果：token 及其来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: ReferralToken,
    pub source: TokenSource,
}

/// 解析 `ref_campaign`，只接受正整数；其他值视为缺省
pub fn parse_campaign_id(raw: Option<&str>) -> Option<u64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|id| *id > 0)
}

/// 按优先级解析推荐 token
pub fn resolve_token(
    route_token: Option<&str>,
    query_share_token: Option<&str>,
    query_campaign_id: Option<&str>,
) -> Option<ResolvedToken> {
    if let Some(token) = route_token.and_then(ReferralToken::parse) {
        return Some(ResolvedToken {
            token,
            source: TokenSource::Route,
        });
    }

    if let Some(token) = query_share_token.and_then(ReferralToken::parse) {
        return Some(ResolvedToken {
            token,
            source: TokenSource::QueryShare,
        });
    }

    parse_campaign_id(query_campaign_id).map(|id| ResolvedToken {
        token: ReferralToken::for_campaign(id),
        source: TokenSource::QueryCampaign,
    })
}
