//! Skeletal rig data model for the Armature IK crates.
//!
//! A rig is a tree of [`Bone`]s stored in an index-based arena
//! ([`Skeleton`]). Bones carry a local offset, a local orientation, and a
//! length along their local forward axis. Effectors and poles attach to
//! individual bones; a [`Subtree`] selects the portion of the rig handed to
//! a solver.
//!
//! # Architecture
//!
//! ```text
//! Skeleton ──► Subtree selection ──► solver (armature-ik)
//!     │
//!     └──► transform:: frame conversions shared by solvers
//! ```

pub mod bone;
pub mod config;
pub mod effector;
pub mod error;
pub mod subtree;
pub mod transform;

pub use bone::{Bone, BoneId, Skeleton};
pub use config::SolverConfig;
pub use effector::{Effector, EffectorFeatures, Pole};
pub use error::{ArmatureError, ChainError, ConfigError};
pub use subtree::Subtree;
