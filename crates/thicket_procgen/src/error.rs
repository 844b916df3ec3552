/// Errors raised while building a tree topology or walking it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("generation count must be between 1 and {max}, got {0}", max = crate::grammar::MAX_GENERATIONS)]
    InvalidGenerations(u32),

    #[error("trunk radius must be a positive finite number, got {0}")]
    InvalidTrunkRadius(f32),

    #[error("branching degree must be 1, 2 or 3, got {0}")]
    InvalidBranching(u8),

    #[error("cylinder needs at least 3 slices and 1 stack, got {slices} slices and {stacks} stacks")]
    InvalidMesh { slices: u32, stacks: u32 },

    #[error("unknown grammar symbol {symbol:?} at position {position}")]
    UnknownSymbol { symbol: char, position: usize },

    #[error("branch opened at position {position} with no pending branch parameters")]
    ParameterUnderflow { position: usize },

    #[error("growth point at position {position} was never expanded")]
    UnexpandedGrowthPoint { position: usize },

    #[error("closing bracket at position {position} has no matching open bracket")]
    UnexpectedClose { position: usize },

    #[error("branch opened at position {position} is never closed")]
    UnclosedBranch { position: usize },

    #[error("branch opened at position {position} nests deeper than {max} levels")]
    TooDeep { position: usize, max: usize },

    #[error("leaf at position {position} is not attached to any branch")]
    UnnestedLeaf { position: usize },

    #[error("{0} branch parameter record(s) left unconsumed after traversal")]
    LeakedParameters(usize),
}
