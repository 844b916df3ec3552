//! Procedural trees grown from a bracketed L-system.
//!
//! [`Grammar`] expands the topology once; [`TreeMaker`] walks it to place any
//! number of randomised tree instances as branch and leaf transforms, and
//! [`mesh`] provides the unit primitives those transforms are defined against.

pub mod error;
pub mod grammar;
pub mod mesh;
pub mod tree;

pub use error::*;
pub use grammar::*;
pub use mesh::*;
pub use tree::*;
