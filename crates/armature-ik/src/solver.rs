//! Solver strategy interface and dispatch.

use armature_rig::{ArmatureError, BoneId, ConfigError, Skeleton, SolverConfig, Subtree};

use crate::fabrik::FabrikSolver;

/// Common interface of the IK solver family.
///
/// A solver is constructed once for a fixed skeleton topology and subtree
/// selection, then solved repeatedly as effector targets move.
pub trait IkSolver {
    /// Strategy name, matching the `algorithm` config key.
    fn name(&self) -> &str;

    /// Run up to the configured number of iterations against the current
    /// bone and effector state. Returns the number of iterations performed.
    fn solve(&mut self, skeleton: &mut Skeleton) -> u32;

    /// Visit every bone the solver operates on, parents before children.
    fn visit_bones(&self, visit: &mut dyn FnMut(BoneId));

    /// Visit the effector-bearing bone of every leaf chain, in effector
    /// slot order.
    fn visit_effectors(&self, visit: &mut dyn FnMut(BoneId));
}

/// Construct the solver named by `config.algorithm`.
pub fn build_solver(
    skeleton: &Skeleton,
    subtree: &Subtree,
    config: &SolverConfig,
) -> Result<Box<dyn IkSolver>, ArmatureError> {
    match config.algorithm.as_str() {
        FabrikSolver::NAME => Ok(Box::new(FabrikSolver::new(skeleton, subtree, config)?)),
        other => Err(ConfigError::UnknownAlgorithm(other.to_owned()).into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
