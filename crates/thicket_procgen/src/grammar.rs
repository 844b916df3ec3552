use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::TreeError;

/// Largest branch degree a growth point may split into.
pub const MAX_BRANCHING: u8 = 3;

/// Most rewrite passes a topology may go through, which is also the deepest
/// bracket nesting a grammar may have. Twelve passes at degree 3 already
/// yield about 177k leaves.
pub const MAX_GENERATIONS: u32 = 12;

/// One symbol of the tree grammar.
///
/// The textual form (`! a b c x [ ]`) is what `Display` and `FromStr` use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Placeholder rewritten by the next expansion pass
    GrowthPoint,
    BranchOne,
    BranchTwo,
    BranchThree,
    Leaf,
    BranchOpen,
    BranchClose,
}

impl Symbol {
    pub fn to_char(self) -> char {
        match self {
            Symbol::GrowthPoint => '!',
            Symbol::BranchOne => 'a',
            Symbol::BranchTwo => 'b',
            Symbol::BranchThree => 'c',
            Symbol::Leaf => 'x',
            Symbol::BranchOpen => '[',
            Symbol::BranchClose => ']',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '!' => Some(Symbol::GrowthPoint),
            'a' => Some(Symbol::BranchOne),
            'b' => Some(Symbol::BranchTwo),
            'c' => Some(Symbol::BranchThree),
            'x' => Some(Symbol::Leaf),
            '[' => Some(Symbol::BranchOpen),
            ']' => Some(Symbol::BranchClose),
            _ => None,
        }
    }

    /// Branching symbol for a split into `degree` children.
    pub fn branching(degree: usize) -> Option<Self> {
        match degree {
            1 => Some(Symbol::BranchOne),
            2 => Some(Symbol::BranchTwo),
            3 => Some(Symbol::BranchThree),
            _ => None,
        }
    }

    /// Number of child branches this symbol announces (0 for non-branching symbols).
    pub fn degree(self) -> usize {
        match self {
            Symbol::BranchOne => 1,
            Symbol::BranchTwo => 2,
            Symbol::BranchThree => 3,
            _ => 0,
        }
    }
}

/// Expanded production string describing the topology of a tree
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Grammar {
    symbols: Vec<Symbol>,
}

impl Grammar {
    /// Grow a topology from a single growth point over `generations` rewrite passes.
    ///
    /// Every growth point becomes `[ <degree> <degree growth points> ]`, with the
    /// degree drawn uniformly from `1..=max_branching`. On the last pass growth
    /// points become leaf twigs `[ x ]` instead.
    pub fn expand(generations: u32, max_branching: u8, rng: &mut impl Rng) -> Result<Self, TreeError> {
        if generations == 0 || generations > MAX_GENERATIONS {
            return Err(TreeError::InvalidGenerations(generations));
        }
        if max_branching == 0 || max_branching > MAX_BRANCHING {
            return Err(TreeError::InvalidBranching(max_branching));
        }

        let mut current = vec![Symbol::GrowthPoint];

        for pass in 1..=generations {
            let last_pass = pass == generations;
            let mut next = Vec::with_capacity(current.len() * 4);

            for &symbol in &current {
                if symbol != Symbol::GrowthPoint {
                    next.push(symbol);
                    continue;
                }

                if last_pass {
                    next.extend([Symbol::BranchOpen, Symbol::Leaf, Symbol::BranchClose]);
                    continue;
                }

                let degree = random_degree(max_branching, rng);
                next.push(Symbol::BranchOpen);
                next.extend(Symbol::branching(degree));
                next.extend(std::iter::repeat(Symbol::GrowthPoint).take(degree));
                next.push(Symbol::BranchClose);
            }

            current = next;
        }

        let grammar = Self { symbols: current };
        log::debug!(
            "Expanded tree grammar over {} generations: {} symbols, {} branches, {} leaves",
            generations,
            grammar.len(),
            grammar.branch_count(),
            grammar.leaf_count()
        );

        Ok(grammar)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn count(&self, symbol: Symbol) -> usize {
        self.symbols.iter().filter(|&&s| s == symbol).count()
    }

    /// Number of branch segments one traversal emits
    pub fn branch_count(&self) -> usize {
        self.count(Symbol::BranchOpen)
    }

    /// Number of leaves one traversal emits
    pub fn leaf_count(&self) -> usize {
        self.count(Symbol::Leaf)
    }

    /// Deepest bracket nesting. For an expanded grammar this equals its generation count.
    pub fn max_depth(&self) -> usize {
        let mut depth = 0usize;
        let mut deepest = 0usize;
        for symbol in &self.symbols {
            match symbol {
                Symbol::BranchOpen => {
                    depth += 1;
                    deepest = deepest.max(depth);
                }
                Symbol::BranchClose => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        deepest
    }

    /// Check that the string can be walked without running out of branch
    /// parameters, leaving any unconsumed, or unbalancing the brackets.
    /// Nesting deeper than `MAX_GENERATIONS` is rejected.
    ///
    /// The trunk bracket is accounted for by one implicit pending record.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut pending = 1usize;
        let mut open = Vec::new();

        for (position, &symbol) in self.symbols.iter().enumerate() {
            match symbol {
                Symbol::GrowthPoint => return Err(TreeError::UnexpandedGrowthPoint { position }),
                Symbol::BranchOpen => {
                    if pending == 0 {
                        return Err(TreeError::ParameterUnderflow { position });
                    }
                    pending -= 1;
                    open.push(position);
                    if open.len() > MAX_GENERATIONS as usize {
                        return Err(TreeError::TooDeep {
                            position,
                            max: MAX_GENERATIONS as usize,
                        });
                    }
                }
                Symbol::BranchClose => {
                    if open.pop().is_none() {
                        return Err(TreeError::UnexpectedClose { position });
                    }
                }
                Symbol::Leaf => {
                    if open.is_empty() {
                        return Err(TreeError::UnnestedLeaf { position });
                    }
                }
                branch => pending += branch.degree(),
            }
        }

        if let Some(&position) = open.last() {
            return Err(TreeError::UnclosedBranch { position });
        }
        if pending != 0 {
            return Err(TreeError::LeakedParameters(pending));
        }

        Ok(())
    }
}

fn random_degree(max_branching: u8, rng: &mut impl Rng) -> usize {
    let max = max_branching as usize;
    (1 + (rng.gen::<f32>() * max as f32) as usize).min(max)
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Grammar {
    type Err = TreeError;

    /// Parses the textual alphabet, skipping whitespace. No validation is done here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols = s
            .chars()
            .enumerate()
            .filter(|(_, ch)| !ch.is_whitespace())
            .map(|(position, ch)| {
                Symbol::from_char(ch).ok_or(TreeError::UnknownSymbol { symbol: ch, position })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { symbols })
    }
}
