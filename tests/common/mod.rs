//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;

use referral_landing::attribution::{AttributionStore, MemoryAttributionBackend};
use referral_landing::config::{AttributionPolicy, StaticConfig};
use referral_landing::profile::{ProfileSource, ReferralCabinetProfile, StaticProfileSource};
use referral_landing::services::LandingService;

pub const ORIGIN: &str = "https://salon.example";

pub fn profile(campaign_id: Option<u64>, name: &str, relative_link: &str) -> ReferralCabinetProfile {
    serde_json::from_value(json!({
        "campaign": { "id": campaign_id, "name": name, "is_active": true },
        "period": { "date_from": "2024-03-01", "date_to": "2024-03-31" },
        "referrer": { "kind": "campaign" },
        "link": { "relative": relative_link },
        "metrics": {
            "total_clicks": 10,
            "unique_clicks": 7,
            "total_bookings": 3,
            "registered_clients": 2,
            "conversion_rate": 30.0
        },
        "leads": [
            { "id": 2, "event_type": "booking", "name": "Ira", "booked": true },
            { "id": 1, "event_type": "visit" }
        ]
    }))
    .expect("valid profile fixture")
}

pub fn test_config(qr_dir: &std::path::Path) -> StaticConfig {
    let mut config = StaticConfig::default();
    config.server.origin = ORIGIN.to_string();
    config.cabinet.qr_output_dir = qr_dir.to_string_lossy().into_owned();
    config
}

pub struct Harness {
    pub landing: Arc<LandingService>,
    pub store: Arc<AttributionStore>,
    pub source: Arc<StaticProfileSource>,
}

pub fn harness(config: &StaticConfig, policy: AttributionPolicy) -> Harness {
    let store = Arc::new(AttributionStore::new(
        Arc::new(MemoryAttributionBackend::new(1_000, None)),
        policy,
    ));
    let source = Arc::new(
        StaticProfileSource::new()
            .with_profile("cmp12", profile(Some(12), "Spring promo", "/ref/cmp12"))
            .with_profile("anna", profile(Some(42), "Anna's friends", "/ref/anna"))
            .with_profile("beauty2024", profile(Some(7), "Beauty 2024", "ref/beauty2024")),
    );
    let dyn_source: Arc<dyn ProfileSource> = source.clone();
    let landing = Arc::new(LandingService::new(config, store.clone(), dyn_source));
    Harness {
        landing,
        store,
        source,
    }
}
