//! Inverse kinematics for branching skeletal rigs.
//!
//! Implements the forward-reaching half of the FABRIK family: bone
//! rotations are derived tip-to-base so that effector-bearing bones move
//! toward their targets, with multiple distal demands averaged at branch
//! points (e.g. two arms sharing a spine).
//!
//! # Architecture
//!
//! ```text
//! Skeleton + Subtree ──► ChainTree ──► FabrikSolver ──► bone rotations
//!                                          ▲
//!                         SolverConfig ────┘ (dispatch by algorithm name)
//! ```
//!
//! The [`ChainTree`] decomposes the selected bone subtree into linear
//! chains that branch only where the rig branches. [`FabrikSolver`]
//! precomputes one blended target per effector, then runs the forward-reach
//! pass for a configured number of iterations. [`IkSolver`] is the
//! family-wide strategy interface; [`build_solver`] picks an implementation
//! by name.

pub mod chain;
pub mod fabrik;
pub mod solver;

pub use chain::{Chain, ChainTree};
pub use fabrik::FabrikSolver;
pub use solver::{build_solver, IkSolver};
