pub mod visitor;

pub use visitor::{VisitorId, VisitorMiddleware};
