pub mod controller;
pub mod interpolation;
pub mod projection;

pub use controller::{SyncController, nearest_valid_point, parse_offset};
pub use interpolation::interpolate_at;
pub use projection::{ProjectedPoint, Projection, project, project_per_second};
