use colored::Colorize;

use super::cli_landing_service;
use crate::cabinet::CabinetView;
use crate::config::StaticConfig;
use crate::errors::{ReferralError, Result};
use crate::profile::ReportPeriod;
use crate::referral::ReferralToken;

/// 打印后对推荐链接执行的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Copy,
    /// 原生分享，不可用时回退到复制
    Share,
}

pub async fn show_profile(
    token: &str,
    period: Option<&str>,
    fixture: Option<&str>,
    action: Option<LinkAction>,
    config: &StaticConfig,
) -> Result<()> {
    let token = ReferralToken::parse(token)
        .ok_or_else(|| ReferralError::validation("Referral token is empty"))?;
    let landing = cli_landing_service(config, fixture)?;
    let period = ReportPeriod::parse_or(period, landing.default_period());

    let view = landing.cabinet(None, &token, period).await;
    if let CabinetView::NotFound { message, .. } = &view {
        return Err(ReferralError::not_found(format!("{}: {}", token, message)));
    }

    if let CabinetView::Loaded {
        campaign,
        link,
        metrics,
        total_leads,
        ..
    } = &view
    {
        println!("{} {}", "Campaign:".bold(), campaign.name.green());
        println!("{} {}", "Link:".bold(), link.cyan());
        println!(
            "{} {} clicks, {} bookings, {:.1}% conversion, {} leads",
            format!("Metrics ({}):", period).bold(),
            metrics.total_clicks,
            metrics.total_bookings,
            metrics.conversion_rate,
            total_leads
        );
    }
    println!("{}", serde_json::to_string_pretty(&view)?);

    if let Some(action) = action
        && let Some(presenter) = landing.presenter(&view)
    {
        let notice = match action {
            LinkAction::Copy => presenter.copy_link(),
            LinkAction::Share => presenter.share_link().await,
        };
        if !notice.is_success() {
            return Err(ReferralError::clipboard(
                notice.detail.unwrap_or(notice.message),
            ));
        }
        println!("{}", notice.message.green());
    }
    Ok(())
}
