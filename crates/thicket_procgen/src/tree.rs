use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

use crate::error::TreeError;
use crate::grammar::{Grammar, Symbol, MAX_BRANCHING, MAX_GENERATIONS};

/// Half-width of the square tree instances are scattered over
pub const SCATTER_EXTENT: f32 = 15.0;

/// Branch length range, as multiples of the branch radius
const LENGTH_RANGE: (f32, f32) = (5.0, 15.0);

/// Growth parameters for one tree topology
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSettings {
    pub trunk_radius: f32,
    pub generations: u32,
    /// Largest number of children a growth point may split into (1..=3)
    pub max_branching: u8,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            trunk_radius: 1.0,
            generations: 6,
            max_branching: MAX_BRANCHING,
        }
    }
}

impl TreeSettings {
    pub fn validate(&self) -> Result<(), TreeError> {
        validate_trunk_radius(self.trunk_radius)?;
        if self.generations == 0 || self.generations > MAX_GENERATIONS {
            return Err(TreeError::InvalidGenerations(self.generations));
        }
        if self.max_branching == 0 || self.max_branching > MAX_BRANCHING {
            return Err(TreeError::InvalidBranching(self.max_branching));
        }
        Ok(())
    }
}

fn validate_trunk_radius(trunk_radius: f32) -> Result<(), TreeError> {
    if trunk_radius.is_finite() && trunk_radius > 0.0 {
        Ok(())
    } else {
        Err(TreeError::InvalidTrunkRadius(trunk_radius))
    }
}

/// Orientation and size of one child branch relative to its parent.
///
/// Angles are in radians. `phi` tilts the branch away from the parent axis,
/// `theta` picks the direction of the tilt around it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchParams {
    pub phi: f32,
    pub theta: f32,
    pub size_ratio: f32,
}

impl BranchParams {
    /// Record consumed by the trunk: straight up, full size
    pub const ROOT: BranchParams = BranchParams {
        phi: 0.0,
        theta: 0.0,
        size_ratio: 1.0,
    };

    /// A single continuation, slightly thinner than the parent.
    pub fn single(rng: &mut impl Rng) -> Self {
        Self {
            phi: uniform(rng, 0.0, 60.0).to_radians(),
            theta: uniform(rng, 0.0, 360.0).to_radians(),
            size_ratio: 0.75,
        }
    }

    /// A balanced fork: the thicker child stays closer to the parent axis and
    /// the two children lean in opposite directions.
    pub fn fork(rng: &mut impl Rng) -> [Self; 2] {
        let theta1 = uniform(rng, 0.0, 360.0).to_radians();
        let theta2 = theta1 + 180f32.to_radians();

        let ratio1 = uniform(rng, 0.25, 0.95);
        let ratio2 = 1.30 - ratio1;

        [
            Self {
                phi: ((1.0 - ratio1) * 45.0).to_radians(),
                theta: theta1,
                size_ratio: ratio1,
            },
            Self {
                phi: ((1.0 - ratio2) * 45.0).to_radians(),
                theta: theta2,
                size_ratio: ratio2,
            },
        ]
    }

    /// Three independent children fanned around the parent axis.
    pub fn trident(rng: &mut impl Rng) -> [Self; 3] {
        let theta1 = uniform(rng, 0.0, 360.0);
        let theta2 = theta1 + uniform(rng, 35.0, 160.0);
        let theta3 = theta2 + uniform(rng, 35.0, 160.0);

        [theta1, theta2, theta3].map(|theta| Self {
            phi: uniform(rng, 25.0, 80.0).to_radians(),
            theta: theta.to_radians(),
            size_ratio: uniform(rng, 0.25, 0.70),
        })
    }

    /// Rotation by `phi` around the axis `(sin theta, cos theta, 0)`
    pub fn rotation(&self) -> Mat4 {
        rotation(self.phi, self.theta)
    }
}

fn rotation(phi: f32, theta: f32) -> Mat4 {
    Mat4::from_axis_angle(Vec3::new(theta.sin(), theta.cos(), 0.0), phi)
}

fn uniform(rng: &mut impl Rng, low: f32, high: f32) -> f32 {
    low + rng.gen::<f32>() * (high - low)
}

/// Placement matrices produced by [`TreeMaker::make_tree`].
///
/// Both queues hold the most recently emitted transform first. Branch transforms
/// map the unit cylinder (unit radius, unit length along +Z, centred at the
/// origin) into world space; leaf transforms orient a unit leaf at a twig tip.
#[derive(Debug, Clone, Default)]
pub struct TreeTransforms {
    pub branches: VecDeque<Mat4>,
    pub leaves: VecDeque<Mat4>,
}

impl TreeTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.branches.clear();
        self.leaves.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty() && self.leaves.is_empty()
    }

    /// Put `newer` in front of everything already held, keeping its order.
    fn prepend(&mut self, newer: TreeTransforms) {
        for transform in newer.branches.into_iter().rev() {
            self.branches.push_front(transform);
        }
        for transform in newer.leaves.into_iter().rev() {
            self.leaves.push_front(transform);
        }
    }
}

/// Summary of one tree instance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeStats {
    pub branches: usize,
    pub leaves: usize,
    pub max_depth: usize,
    /// Horizontal offset of the tree base (world X, world Z)
    pub origin: Vec2,
}

/// Grows trees from an expanded grammar.
///
/// The topology is fixed when the maker is built or reset; every
/// [`make_tree`](TreeMaker::make_tree) call re-rolls angles, lengths, size
/// ratios and position.
#[derive(Debug, Clone)]
pub struct TreeMaker {
    settings: TreeSettings,
    grammar: Grammar,
}

impl TreeMaker {
    pub fn new(settings: TreeSettings, rng: &mut impl Rng) -> Result<Self, TreeError> {
        settings.validate()?;
        let grammar = Grammar::expand(settings.generations, settings.max_branching, rng)?;
        Ok(Self { settings, grammar })
    }

    pub fn initialize(trunk_radius: f32, generations: u32, rng: &mut impl Rng) -> Result<Self, TreeError> {
        Self::new(
            TreeSettings {
                trunk_radius,
                generations,
                ..TreeSettings::default()
            },
            rng,
        )
    }

    /// Use an existing topology, e.g. one parsed from text.
    pub fn with_grammar(trunk_radius: f32, grammar: Grammar) -> Result<Self, TreeError> {
        validate_trunk_radius(trunk_radius)?;
        grammar.validate()?;

        let settings = TreeSettings {
            trunk_radius,
            generations: grammar.max_depth() as u32,
            max_branching: grammar
                .symbols()
                .iter()
                .map(|s| s.degree() as u8)
                .max()
                .unwrap_or(1)
                .max(1),
        };

        Ok(Self { settings, grammar })
    }

    /// Rebuild the topology from scratch. On error the current topology is kept.
    pub fn reset(&mut self, settings: TreeSettings, rng: &mut impl Rng) -> Result<(), TreeError> {
        *self = Self::new(settings, rng)?;
        Ok(())
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Walk the grammar once, placing a freshly randomised tree.
    ///
    /// Transforms are added in front of whatever `out` already holds. Nothing is
    /// added if the walk fails.
    pub fn make_tree(&self, out: &mut TreeTransforms, rng: &mut impl Rng) -> Result<TreeStats, TreeError> {
        let origin = Vec2::new(
            uniform(rng, -SCATTER_EXTENT, SCATTER_EXTENT),
            uniform(rng, -SCATTER_EXTENT, SCATTER_EXTENT),
        );

        // Branches grow along local +Z; stand them up on world +Y
        let world = Mat4::from_translation(Vec3::new(origin.x, 0.0, origin.y))
            * Mat4::from_rotation_x(-FRAC_PI_2);

        let mut traversal = Traversal::new(self.grammar.symbols(), self.settings.trunk_radius, world, rng);
        let end = traversal.walk(0, Mat4::IDENTITY, None, 0)?;
        debug_assert_eq!(end, self.grammar.len());
        debug_assert_eq!(traversal.radius, self.settings.trunk_radius);

        if !traversal.params.is_empty() {
            return Err(TreeError::LeakedParameters(traversal.params.len()));
        }

        let stats = TreeStats {
            branches: traversal.emitted.branches.len(),
            leaves: traversal.emitted.leaves.len(),
            max_depth: traversal.max_depth,
            origin,
        };
        out.prepend(traversal.emitted);

        log::trace!(
            "Grew tree at ({:.2}, {:.2}): {} branches, {} leaves, depth {}",
            origin.x,
            origin.y,
            stats.branches,
            stats.leaves,
            stats.max_depth
        );

        Ok(stats)
    }
}

/// Per-call walk state. The cursor is threaded through `walk` explicitly.
struct Traversal<'a, R> {
    symbols: &'a [Symbol],
    rng: &'a mut R,
    /// Pending child parameters, consumed last-in first-out
    params: Vec<BranchParams>,
    radius: f32,
    world: Mat4,
    emitted: TreeTransforms,
    max_depth: usize,
}

impl<'a, R: Rng> Traversal<'a, R> {
    fn new(symbols: &'a [Symbol], trunk_radius: f32, world: Mat4, rng: &'a mut R) -> Self {
        Self {
            symbols,
            rng,
            params: vec![BranchParams::ROOT],
            radius: trunk_radius,
            world,
            emitted: TreeTransforms::new(),
            max_depth: 0,
        }
    }

    /// Process symbols from `cursor` in the coordinate frame `frame` until the
    /// closing bracket of the branch opened at `opened_at` (or the end of input
    /// at top level). Returns the position just past what was consumed.
    fn walk(&mut self, mut cursor: usize, frame: Mat4, opened_at: Option<usize>, depth: usize) -> Result<usize, TreeError> {
        while let Some(&symbol) = self.symbols.get(cursor) {
            match symbol {
                Symbol::BranchOpen => {
                    cursor = self.open_branch(cursor, frame, depth + 1)?;
                    continue;
                }
                Symbol::BranchClose => {
                    return match opened_at {
                        Some(_) => Ok(cursor + 1),
                        None => Err(TreeError::UnexpectedClose { position: cursor }),
                    };
                }
                Symbol::BranchOne => self.params.push(BranchParams::single(&mut *self.rng)),
                Symbol::BranchTwo => self.params.extend(BranchParams::fork(&mut *self.rng)),
                Symbol::BranchThree => self.params.extend(BranchParams::trident(&mut *self.rng)),
                Symbol::Leaf => {
                    if opened_at.is_none() {
                        return Err(TreeError::UnnestedLeaf { position: cursor });
                    }
                    self.emit_leaf(frame);
                }
                Symbol::GrowthPoint => return Err(TreeError::UnexpandedGrowthPoint { position: cursor }),
            }
            cursor += 1;
        }

        match opened_at {
            Some(position) => Err(TreeError::UnclosedBranch { position }),
            None => Ok(cursor),
        }
    }

    fn open_branch(&mut self, position: usize, frame: Mat4, depth: usize) -> Result<usize, TreeError> {
        if depth > MAX_GENERATIONS as usize {
            return Err(TreeError::TooDeep {
                position,
                max: MAX_GENERATIONS as usize,
            });
        }
        let params = self
            .params
            .pop()
            .ok_or(TreeError::ParameterUnderflow { position })?;

        let parent_radius = self.radius;
        self.radius *= params.size_ratio;
        let radius = self.radius;
        let length = uniform(&mut *self.rng, LENGTH_RANGE.0, LENGTH_RANGE.1) * radius;

        let oriented = frame * params.rotation();
        // The unit cylinder is centred on its origin, so it sits half a length up
        let placement = oriented * Mat4::from_translation(Vec3::Z * (length * 0.5));
        let child_frame = oriented * Mat4::from_translation(Vec3::Z * length);

        self.emitted.branches.push_front(
            self.world * placement * Mat4::from_scale(Vec3::new(radius, radius, length)),
        );
        self.max_depth = self.max_depth.max(depth);

        let next = self.walk(position + 1, child_frame, Some(position), depth)?;
        self.radius = parent_radius;

        Ok(next)
    }

    /// Leaves are oriented in the twig-tip frame, so they share the world
    /// placement of the branch that carries them.
    fn emit_leaf(&mut self, frame: Mat4) {
        let phi = uniform(&mut *self.rng, 0.0, 30.0).to_radians();
        let theta = uniform(&mut *self.rng, 0.0, 360.0).to_radians();
        self.emitted
            .leaves
            .push_front(self.world * frame * rotation(phi, theta));
    }
}
