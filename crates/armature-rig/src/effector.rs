//! Effector targets and pole constraints.

use bitflags::bitflags;
use nalgebra::Vector3;

bitflags! {
    /// Per-effector feature toggles.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectorFeatures: u32 {
        /// Blend the target's distance and direction separately instead of
        /// lerping endpoints, anchored at the nearest chain base. Keeps the
        /// effective reach distance stable as the weight varies.
        const WEIGHT_NLERP = 1 << 0;
    }
}

/// Pulls the distal end of its bone toward a desired position.
#[derive(Debug, Clone, PartialEq)]
pub struct Effector {
    /// Desired position, expressed in the frame of the IK root's parent.
    pub target_position: Vector3<f32>,
    /// Blend factor in `[0, 1]`: 0 ignores the target, 1 reaches fully.
    pub weight: f32,
    pub features: EffectorFeatures,
}

impl Effector {
    /// New effector with full weight and no extra features.
    pub fn new(target_position: Vector3<f32>) -> Self {
        Self {
            target_position,
            weight: 1.0,
            features: EffectorFeatures::empty(),
        }
    }

    /// Set the blend weight, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_features(mut self, features: EffectorFeatures) -> Self {
        self.features = features;
        self
    }
}

/// Orientation-plane constraint.
///
/// Carried as data only: solvers diagnose misplaced poles but do not apply
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct Pole {
    /// Pole position in the frame of the IK root's parent.
    pub position: Vector3<f32>,
    /// Roll angle about the bone axis, in radians.
    pub angle: f32,
}
