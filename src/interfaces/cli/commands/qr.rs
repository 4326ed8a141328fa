use std::path::Path;

use colored::Colorize;

use super::cli_landing_service;
use crate::config::StaticConfig;
use crate::errors::{ReferralError, Result};
use crate::referral::ReferralToken;

pub async fn export_qr(
    token: &str,
    out: Option<&str>,
    fixture: Option<&str>,
    config: &StaticConfig,
) -> Result<()> {
    let token = ReferralToken::parse(token)
        .ok_or_else(|| ReferralError::validation("Referral token is empty"))?;
    let landing = cli_landing_service(config, fixture)?;

    let view = landing.cabinet(None, &token, landing.default_period()).await;
    let presenter = landing
        .presenter(&view)
        .ok_or_else(|| ReferralError::not_found(format!("{}: link not found or inactive", token)))?;

    let dir = out.map(Path::new).unwrap_or(landing.qr_output_dir());
    let notice = presenter.export_qr(dir).await;
    if !notice.is_success() {
        return Err(ReferralError::qr_code(
            notice.detail.unwrap_or(notice.message),
        ));
    }

    println!(
        "{} {}",
        notice.message.green(),
        notice.detail.unwrap_or_default().blue()
    );
    Ok(())
}
