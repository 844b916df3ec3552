use std::path::Path;

use anyhow::Context;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thicket_procgen::TreeSettings;

use crate::camera::Camera;

/// Demo configuration, loaded from JSON. Missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub trunk_radius: f32,
    pub generations: u32,
    pub max_branching: u8,
    pub tree_count: usize,
    /// Fixed seed for reproducible forests; entropy when absent
    pub seed: Option<u64>,
    pub camera: CameraConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let tree = TreeSettings::default();
        Self {
            trunk_radius: tree.trunk_radius,
            generations: tree.generations,
            max_branching: tree.max_branching,
            tree_count: 5,
            seed: None,
            camera: CameraConfig::default(),
        }
    }
}

impl DemoConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn tree_settings(&self) -> TreeSettings {
        TreeSettings {
            trunk_radius: self.trunk_radius,
            generations: self.generations,
            max_branching: self.max_branching,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub look: [f32; 3],
    pub up: [f32; 3],
    pub near: f32,
    pub far: f32,
    /// Vertical field of view in degrees
    pub height_angle: f32,
    pub aspect_ratio: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [-10.0, 1.0, -10.0],
            look: [0.9, -0.05, 0.5],
            up: [0.0, 1.0, 0.0],
            near: 1.0,
            far: 150.0,
            height_angle: 60.0,
            aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl CameraConfig {
    pub fn build(&self) -> Camera {
        let mut camera = Camera::default();
        camera.orient_look(
            Vec3::from_array(self.eye),
            Vec3::from_array(self.look),
            Vec3::from_array(self.up),
        );
        camera.set_clip(self.near, self.far);
        camera.set_height_angle(self.height_angle);
        camera.set_aspect_ratio(self.aspect_ratio);
        camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DemoConfig::default();
        assert_eq!(config.tree_count, 5);
        assert_eq!(config.tree_settings(), TreeSettings::default());
        assert_eq!(config.camera.far, 150.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DemoConfig = serde_json::from_str(
            r#"{ "generations": 3, "seed": 42, "camera": { "far": 80.0 } }"#,
        )
        .unwrap();

        assert_eq!(config.generations, 3);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.trunk_radius, 1.0);
        assert_eq!(config.camera.far, 80.0);
        assert_eq!(config.camera.eye, [-10.0, 1.0, -10.0]);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let error = DemoConfig::load(Path::new("/nonexistent/thicket.json")).unwrap_err();
        assert!(format!("{error:#}").contains("/nonexistent/thicket.json"));
    }

    #[test]
    fn test_camera_from_config() {
        let camera = CameraConfig::default().build();
        assert_eq!(camera.eye(), Vec3::new(-10.0, 1.0, -10.0));
        assert_eq!(camera.near, 1.0);
        assert!((camera.height_angle - 60f32.to_radians()).abs() < 1e-6);
    }
}
