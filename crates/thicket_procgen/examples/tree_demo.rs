use rand::rngs::StdRng;
use rand::SeedableRng;
use thicket_procgen::{instance_mesh, unit_cylinder, unit_leaf, Grammar, TreeMaker, TreeSettings, TreeTransforms};

fn main() {
    println!("=== Thicket - Tree Generation Demo ===\n");

    for max_branching in 1..=3 {
        let mut rng = StdRng::seed_from_u64(12345);
        let settings = TreeSettings {
            max_branching,
            ..TreeSettings::default()
        };
        let maker = TreeMaker::new(settings, &mut rng).expect("valid settings");
        let grammar = maker.grammar();

        println!("--- Up to {} children per growth point ---", max_branching);
        println!("Generations: {}", settings.generations);
        println!("Grammar length: {} symbols", grammar.len());
        println!("Branches per tree: {}", grammar.branch_count());
        println!("Leaves per tree: {}", grammar.leaf_count());

        let mut transforms = TreeTransforms::new();
        let stats = maker.make_tree(&mut transforms, &mut rng).expect("expanded grammar");
        println!("Planted at ({:.2}, {:.2})", stats.origin.x, stats.origin.y);

        let height = transforms
            .branches
            .iter()
            .map(|t| t.transform_point3(glam::Vec3::new(0.0, 0.0, 0.5)).y)
            .fold(0.0f32, f32::max);
        println!("Tree height: {:.2}m\n", height);
    }

    // A hand-written topology: a fork whose right child splits three ways
    let grammar: Grammar = "[b[x][c[x][x][x]]]".parse().expect("known symbols");
    let maker = TreeMaker::with_grammar(0.5, grammar).expect("balanced grammar");
    let mut transforms = TreeTransforms::new();
    let mut rng = StdRng::seed_from_u64(99999);
    for _ in 0..5 {
        maker.make_tree(&mut transforms, &mut rng).expect("balanced grammar");
    }

    let cylinder = unit_cylinder(12, 1).expect("valid tessellation");
    let bark = instance_mesh(&cylinder, &transforms.branches);
    let foliage = instance_mesh(&unit_leaf(), &transforms.leaves);

    println!("=== Hand-written grammar: {} ===", maker.grammar());
    println!("5 trees: {} branches, {} leaves", transforms.branches.len(), transforms.leaves.len());
    println!(
        "Bark mesh: {} vertices, {} triangles",
        bark.vertices.len(),
        bark.triangle_count()
    );
    println!(
        "Foliage mesh: {} vertices, {} triangles",
        foliage.vertices.len(),
        foliage.triangle_count()
    );
}
