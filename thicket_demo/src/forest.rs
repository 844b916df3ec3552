use std::collections::VecDeque;

use glam::Mat4;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thicket_procgen::{TreeError, TreeMaker, TreeSettings, TreeStats, TreeTransforms};

use crate::frustum::{branch_bounds, Frustum};

/// Several tree instances sharing one topology
#[derive(Debug, Clone)]
pub struct Forest {
    maker: TreeMaker,
    transforms: TreeTransforms,
    trees: Vec<TreeStats>,
}

/// Expand a topology and place `tree_count` instances of it.
pub fn grow_forest(settings: TreeSettings, tree_count: usize, rng: &mut impl Rng) -> Result<Forest, TreeError> {
    let maker = TreeMaker::new(settings, rng)?;
    let mut forest = Forest {
        maker,
        transforms: TreeTransforms::new(),
        trees: Vec::with_capacity(tree_count),
    };
    forest.plant(tree_count, rng)?;
    Ok(forest)
}

impl Forest {
    /// Drop every tree and grow a fresh forest from a new topology.
    pub fn regrow(&mut self, settings: TreeSettings, tree_count: usize, rng: &mut impl Rng) -> Result<(), TreeError> {
        self.maker.reset(settings, rng)?;
        self.transforms.clear();
        self.trees.clear();
        self.plant(tree_count, rng)
    }

    fn plant(&mut self, tree_count: usize, rng: &mut impl Rng) -> Result<(), TreeError> {
        for _ in 0..tree_count {
            let stats = self.maker.make_tree(&mut self.transforms, rng)?;
            self.trees.push(stats);
        }

        log::info!(
            "Grew {} trees: {} branches, {} leaves",
            self.trees.len(),
            self.transforms.branches.len(),
            self.transforms.leaves.len()
        );
        Ok(())
    }

    pub fn maker(&self) -> &TreeMaker {
        &self.maker
    }

    pub fn transforms(&self) -> &TreeTransforms {
        &self.transforms
    }

    pub fn trees(&self) -> &[TreeStats] {
        &self.trees
    }

    /// Number of branch instances whose bounding sphere touches the frustum
    pub fn visible_branches(&self, frustum: &Frustum) -> usize {
        self.transforms
            .branches
            .iter()
            .filter(|transform| {
                let (center, radius) = branch_bounds(transform);
                frustum.contains_sphere(center, radius)
            })
            .count()
    }

    pub fn export(&self) -> ForestExport {
        let matrices = |transforms: &VecDeque<Mat4>| -> Vec<[f32; 16]> {
            transforms.iter().map(Mat4::to_cols_array).collect()
        };

        ForestExport {
            grammar: self.maker.grammar().to_string(),
            trunk_radius: self.maker.settings().trunk_radius,
            trees: self
                .trees
                .iter()
                .map(|stats| TreeSummary {
                    origin: stats.origin.to_array(),
                    branches: stats.branches,
                    leaves: stats.leaves,
                })
                .collect(),
            branches: matrices(&self.transforms.branches),
            leaves: matrices(&self.transforms.leaves),
        }
    }
}

/// JSON document describing a grown forest. Matrices are column-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestExport {
    pub grammar: String,
    pub trunk_radius: f32,
    pub trees: Vec<TreeSummary>,
    pub branches: Vec<[f32; 16]>,
    pub leaves: Vec<[f32; 16]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSummary {
    pub origin: [f32; 2],
    pub branches: usize,
    pub leaves: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings(generations: u32) -> TreeSettings {
        TreeSettings {
            generations,
            ..TreeSettings::default()
        }
    }

    #[test]
    fn test_forest_counts() {
        let mut rng = StdRng::seed_from_u64(111);
        let forest = grow_forest(settings(4), 5, &mut rng).unwrap();
        let grammar = forest.maker().grammar();

        assert_eq!(forest.trees().len(), 5);
        assert_eq!(forest.transforms().branches.len(), 5 * grammar.branch_count());
        assert_eq!(forest.transforms().leaves.len(), 5 * grammar.leaf_count());
        assert!(forest.trees().iter().all(|t| t.branches == grammar.branch_count()));
    }

    #[test]
    fn test_regrow_replaces_trees() {
        let mut rng = StdRng::seed_from_u64(222);
        let mut forest = grow_forest(settings(3), 5, &mut rng).unwrap();

        forest.regrow(settings(2), 2, &mut rng).unwrap();
        let grammar = forest.maker().grammar();
        assert_eq!(grammar.max_depth(), 2);
        assert_eq!(forest.trees().len(), 2);
        assert_eq!(forest.transforms().branches.len(), 2 * grammar.branch_count());
    }

    #[test]
    fn test_regrow_rejects_bad_settings() {
        let mut rng = StdRng::seed_from_u64(333);
        let mut forest = grow_forest(settings(2), 1, &mut rng).unwrap();
        let bad = TreeSettings {
            trunk_radius: -1.0,
            ..TreeSettings::default()
        };
        assert_eq!(
            forest.regrow(bad, 3, &mut rng),
            Err(TreeError::InvalidTrunkRadius(-1.0))
        );
        assert_eq!(forest.trees().len(), 1);
    }

    #[test]
    fn test_too_many_generations_rejected() {
        let mut rng = StdRng::seed_from_u64(666);
        let settings = TreeSettings {
            generations: 3000,
            max_branching: 1,
            ..TreeSettings::default()
        };
        assert_eq!(
            grow_forest(settings, 5, &mut rng).unwrap_err(),
            TreeError::InvalidGenerations(3000)
        );
    }

    #[test]
    fn test_export_json() {
        let mut rng = StdRng::seed_from_u64(444);
        let forest = grow_forest(settings(3), 2, &mut rng).unwrap();
        let export = forest.export();

        assert_eq!(export.grammar, forest.maker().grammar().to_string());
        assert_eq!(export.trees.len(), 2);
        assert_eq!(export.branches.len(), forest.transforms().branches.len());
        assert_eq!(
            Mat4::from_cols_array(&export.leaves[0]),
            forest.transforms().leaves[0]
        );

        let json = serde_json::to_string(&export).unwrap();
        let parsed: ForestExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.grammar, export.grammar);
        assert_eq!(parsed.trees, export.trees);
    }

    #[test]
    fn test_visible_branches() {
        let mut rng = StdRng::seed_from_u64(555);
        let forest = grow_forest(settings(3), 3, &mut rng).unwrap();

        // A camera high above the scatter area looking straight down sees every tree
        let mut camera = crate::camera::Camera::default();
        camera.orient_look(glam::Vec3::new(0.0, 300.0, 0.0), glam::Vec3::NEG_Y, glam::Vec3::Z);
        camera.set_clip(1.0, 1000.0);
        let frustum = Frustum::from_view_proj(&camera.view_projection_matrix());
        assert_eq!(
            forest.visible_branches(&frustum),
            forest.transforms().branches.len()
        );

        // Looking away from the forest sees nothing
        camera.orient_look(glam::Vec3::new(0.0, 300.0, 0.0), glam::Vec3::Y, glam::Vec3::Z);
        let frustum = Frustum::from_view_proj(&camera.view_projection_matrix());
        assert_eq!(forest.visible_branches(&frustum), 0);
    }
}
