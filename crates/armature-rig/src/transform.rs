//! Frame conversions between bone-local spaces.
//!
//! A "space" is identified by `Option<BoneId>`: `Some(bone)` is that bone's
//! local frame, `None` is rig-global space (the frame a root bone's
//! `position` lives in). The per-step transform follows the convention
//! documented in [`crate::bone`]: a point `p` in bone `b`'s frame maps into
//! `b`'s parent `q`'s frame as `b.rotation * p + b.position + q.length * ez`.

use nalgebra::{UnitQuaternion, Vector3};

use crate::bone::{BoneId, Skeleton};

/// Canonical forward axis of every bone's local frame.
pub fn forward() -> Vector3<f32> {
    Vector3::z()
}

/// Transform a position from `bone`'s local frame into an ancestor `space`.
///
/// # Panics
///
/// Panics if `space` is not `None` or an ancestor of (or equal to) `bone`.
pub fn pos_local_to_space(
    skeleton: &Skeleton,
    pos: Vector3<f32>,
    bone: BoneId,
    space: Option<BoneId>,
) -> Vector3<f32> {
    let mut p = pos;
    let mut cur = Some(bone);
    while cur != space {
        let id = cur.expect("space must be an ancestor of bone");
        let b = &skeleton[id];
        p = b.rotation * p + b.position;
        if let Some(parent) = b.parent() {
            p.z += skeleton[parent].length;
        }
        cur = b.parent();
    }
    p
}

/// Transform a position from an ancestor `space` into `bone`'s local frame.
///
/// Exact inverse of [`pos_local_to_space`].
///
/// # Panics
///
/// Panics if `space` is not `None` or an ancestor of (or equal to) `bone`.
pub fn pos_space_to_local(
    skeleton: &Skeleton,
    pos: Vector3<f32>,
    space: Option<BoneId>,
    bone: BoneId,
) -> Vector3<f32> {
    let mut path = Vec::new();
    let mut cur = Some(bone);
    while cur != space {
        let id = cur.expect("space must be an ancestor of bone");
        path.push(id);
        cur = skeleton[id].parent();
    }

    let mut p = pos;
    for &id in path.iter().rev() {
        let b = &skeleton[id];
        if let Some(parent) = b.parent() {
            p.z -= skeleton[parent].length;
        }
        p -= b.position;
        p = b.rotation.inverse_transform_vector(&p);
    }
    p
}

/// Shortest-arc rotation mapping the canonical forward axis (`+Z`) onto
/// `direction`.
///
/// Near-zero input yields the identity; an anti-parallel input yields a
/// half-turn about `+X` (the tie-break is arbitrary but fixed).
pub fn swing_to(direction: &Vector3<f32>) -> UnitQuaternion<f32> {
    if direction.norm_squared() <= f32::EPSILON {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::rotation_between(&Vector3::z(), direction).unwrap_or_else(|| {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
