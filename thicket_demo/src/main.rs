use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thicket_demo::{grow_forest, DemoConfig, Frustum};
use thicket_procgen::{instance_mesh, unit_cylinder, unit_leaf};

/// Cylinder tessellation used when baking branches
const CYLINDER_SLICES: u32 = 12;
const CYLINDER_STACKS: u32 = 1;

#[derive(Parser, Debug, Clone)]
#[command(name = "thicket")]
#[command(about = "Grow a small forest of L-system trees", long_about = None)]
pub struct Cli {
    /// JSON config file; defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of trees to place
    #[arg(long)]
    pub trees: Option<usize>,

    /// Grammar rewrite passes
    #[arg(long)]
    pub generations: Option<u32>,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the forest transforms as JSON to this path
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut DemoConfig) {
        if let Some(trees) = self.trees {
            config.tree_count = trees;
        }
        if let Some(generations) = self.generations {
            config.generations = generations;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    cli.apply(&mut config);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let forest = grow_forest(config.tree_settings(), config.tree_count, &mut rng)
        .context("growing forest")?;
    let grammar = forest.maker().grammar();
    log::info!(
        "Topology: {} generations, {} symbols, {} branches and {} leaves per tree",
        grammar.max_depth(),
        grammar.len(),
        grammar.branch_count(),
        grammar.leaf_count()
    );
    log::debug!("Grammar: {}", grammar);

    for (index, tree) in forest.trees().iter().enumerate() {
        log::info!(
            "Tree {} at ({:.2}, {:.2})",
            index,
            tree.origin.x,
            tree.origin.y
        );
    }

    let camera = config.camera.build();
    log::info!(
        "Camera at {:?} looking along {:?}",
        camera.eye(),
        camera.look()
    );
    let frustum = Frustum::from_view_proj(&camera.view_projection_matrix());
    log::info!(
        "{} of {} branches inside the view frustum",
        forest.visible_branches(&frustum),
        forest.transforms().branches.len()
    );

    let cylinder = unit_cylinder(CYLINDER_SLICES, CYLINDER_STACKS)?;
    let bark = instance_mesh(&cylinder, &forest.transforms().branches);
    let foliage = instance_mesh(&unit_leaf(), &forest.transforms().leaves);
    log::info!(
        "Baked meshes: bark {} vertices / {} triangles, foliage {} vertices / {} triangles",
        bark.vertices.len(),
        bark.triangle_count(),
        foliage.vertices.len(),
        foliage.triangle_count()
    );

    if let Some(path) = &cli.output {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &forest.export())
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Wrote forest to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["thicket", "--trees", "3", "--seed", "9"]);
        let mut config = DemoConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.tree_count, 3);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.generations, 6);
    }

    #[test]
    fn test_cli_generations_bounded() {
        let cli = Cli::parse_from(["thicket", "--generations", "3000"]);
        let mut config = DemoConfig {
            max_branching: 1,
            ..DemoConfig::default()
        };
        cli.apply(&mut config);

        assert_eq!(
            config.tree_settings().validate(),
            Err(thicket_procgen::TreeError::InvalidGenerations(3000))
        );
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["thicket"]);
        assert!(cli.config.is_none());
        assert!(cli.output.is_none());
    }
}
