mod landing;

pub use landing::{LandingOutcome, LandingService};
