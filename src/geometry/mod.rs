pub mod bounds;
pub mod projection;

pub use bounds::BoundingBox;
pub use projection::{Crs, Projector};
