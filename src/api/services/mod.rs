pub mod cabinet;
pub mod health;
pub mod landing;
pub mod types;

pub use cabinet::{CabinetHandler, cabinet_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use landing::{LandingHandler, landing_routes};
pub use types::{ApiResponse, ErrorCode};
