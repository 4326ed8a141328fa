use colored::Colorize;

use crate::config::StaticConfig;
use crate::errors::{ReferralError, Result};
use crate::referral::{Navigation, decide, params, resolve_navigation};

/// 接受 `/path?query` 或绝对 URL
pub fn navigation_from_input(input: &str, force_cabinet: bool) -> Result<Navigation> {
    let input = input.trim();
    let nav = if input.starts_with('/') {
        Navigation::from_location(input)
    } else if input.contains("://") {
        let url = url::Url::parse(input)?;
        Navigation::from_parts(url.path(), url.query())
    } else {
        return Err(ReferralError::validation(format!(
            "Expected a path starting with '/' or an absolute URL, got '{}'",
            input
        )));
    };

    if force_cabinet && !nav.cabinet_mode() {
        let mut query = nav.query_without(&[params::CABINET]);
        query.push((params::CABINET.to_string(), "1".to_string()));
        return Ok(Navigation::new(nav.path(), query));
    }
    Ok(nav)
}

pub fn resolve_url(input: &str, force_cabinet: bool, _config: &StaticConfig) -> Result<()> {
    let nav = navigation_from_input(input, force_cabinet)?;
    let resolved = resolve_navigation(&nav);
    let decision = decide(&nav, resolved.as_ref());

    println!("{} {}", "Location:".bold(), nav.location().cyan());
    match &resolved {
        Some(resolved) => println!(
            "{} {} {}",
            "Token:".bold(),
            resolved.token.as_str().green(),
            format!("({:?})", resolved.source).dimmed()
        ),
        None => println!("{} {}", "Token:".bold(), "none".dimmed()),
    }
    match decision.target() {
        Some(target) => println!("{} 307 -> {}", "Decision:".bold(), target.yellow()),
        None => println!("{} {}", "Decision:".bold(), "render in place".green()),
    }
    Ok(())
}
