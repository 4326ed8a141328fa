use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::attribution::AttributionStore;
use crate::config::StaticConfig;
use crate::profile::{HttpProfileSource, ProfileSource};
use crate::services::LandingService;

pub struct StartupContext {
    pub landing: Arc<LandingService>,
    pub route_config: RouteConfig,
}

#[derive(Clone, Debug)]
pub struct RouteConfig {
    pub health_prefix: String,
}

/// 按配置组装落地页服务（HTTP 数据源 + 归因存储）
pub fn build_landing_service(config: &StaticConfig) -> LandingService {
    let store = Arc::new(AttributionStore::from_config(&config.attribution));
    let source: Arc<dyn ProfileSource> = Arc::new(HttpProfileSource::new(&config.backend));
    LandingService::new(config, store, source)
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    tokio::fs::create_dir_all(&config.cabinet.qr_output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create QR output directory {}",
                config.cabinet.qr_output_dir
            )
        })?;

    let landing = Arc::new(build_landing_service(config));
    let store = landing.attribution_store();
    info!(
        "Using attribution backend: {} ({})",
        store.backend_name(),
        store.policy()
    );

    // 文件损坏等问题在启动时暴露，但不阻止启动
    if let Err(e) = store.probe().await {
        warn!("Attribution backend is not readable yet: {:#}", e);
    }

    info!(
        "Profile source: {} at {}",
        landing.profile_source_name(),
        config.backend.base_url
    );

    let route_config = RouteConfig {
        health_prefix: config.routes.health_prefix.clone(),
    };

    debug!("Pre-startup completed in {:?}", start_time.elapsed());
    Ok(StartupContext {
        landing,
        route_config,
    })
}
