mod config_gen;
mod profile;
mod qr;
mod resolve;

pub use config_gen::config_generate;
pub use profile::{LinkAction, show_profile};
pub use qr::export_qr;
pub use resolve::{navigation_from_input, resolve_url};

use std::sync::Arc;

use crate::attribution::{AttributionStore, MemoryAttributionBackend};
use crate::cabinet::{Clipboard, UnavailableShare};
#[cfg(not(feature = "clipboard"))]
use crate::cabinet::MemoryClipboard;
use crate::config::StaticConfig;
use crate::errors::Result;
use crate::profile::{HttpProfileSource, ProfileSource, StaticProfileSource};
use crate::services::LandingService;

/// CLI 使用的落地页服务：指定 fixture 时离线读取，否则访问后端
///
/// CLI 不写入持久化归因。
pub(crate) fn cli_landing_service(
    config: &StaticConfig,
    fixture: Option<&str>,
) -> Result<LandingService> {
    let store = Arc::new(AttributionStore::new(
        Arc::new(MemoryAttributionBackend::new(1, None)),
        config.attribution.policy,
    ));
    let source: Arc<dyn ProfileSource> = match fixture {
        Some(path) => Arc::new(StaticProfileSource::from_fixture_file(path)?),
        None => Arc::new(HttpProfileSource::new(&config.backend)),
    };
    let landing = LandingService::new(config, store, source);
    Ok(landing.with_presenter_backends(cli_clipboard(), Arc::new(UnavailableShare)))
}

#[cfg(feature = "clipboard")]
fn cli_clipboard() -> Arc<dyn Clipboard> {
    Arc::new(crate::cabinet::SystemClipboard)
}

#[cfg(not(feature = "clipboard"))]
fn cli_clipboard() -> Arc<dyn Clipboard> {
    Arc::new(MemoryClipboard::new())
}
