//! Headless harness around `thicket_procgen`: configuration, a first-person
//! camera, frustum statistics and JSON export for a small forest.

pub mod camera;
pub mod config;
pub mod forest;
pub mod frustum;

pub use camera::Camera;
pub use config::{CameraConfig, DemoConfig};
pub use forest::{grow_forest, Forest, ForestExport, TreeSummary};
pub use frustum::{branch_bounds, Frustum};
