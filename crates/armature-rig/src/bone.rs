//! Bone arena and rig tree.
//!
//! Bones live in a [`Skeleton`] arena and reference each other by
//! [`BoneId`] index, so the tree structure is plain data with no pointer
//! graph. Child lists keep insertion order, which gives every traversal in
//! the solver crates a stable, deterministic sibling ordering.
//!
//! # Frame convention
//!
//! A bone's local frame has its origin at the bone's head and its forward
//! axis along local `+Z`; the bone's tail sits at `(0, 0, length)` in its
//! own frame. `position` is the offset of the bone's head from its
//! *parent's tail*, expressed in the parent's frame, and `rotation` is the
//! bone's orientation relative to its parent. A point `p` in a bone's frame
//! maps into its parent's frame as
//! `rotation * p + position + (0, 0, parent.length)`.

use nalgebra::{UnitQuaternion, Vector3};
use std::ops::{Index, IndexMut};

use crate::effector::{Effector, Pole};

/// Index of a bone inside a [`Skeleton`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(usize);

impl BoneId {
    /// Raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single bone in the rig tree.
#[derive(Debug, Clone)]
pub struct Bone {
    name: String,
    parent: Option<BoneId>,
    children: Vec<BoneId>,

    /// Head offset from the parent's tail, in the parent's frame.
    pub position: Vector3<f32>,
    /// Orientation relative to the parent's frame.
    pub rotation: UnitQuaternion<f32>,
    /// Extent along the bone's local `+Z` axis.
    pub length: f32,

    /// Present only on bones the caller marked as IK targets.
    pub effector: Option<Effector>,
    /// Orientation-plane constraint; only meaningful at chain tips.
    pub pole: Option<Pole>,
}

impl Bone {
    /// Human-readable bone name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent bone, `None` for a rig root.
    pub const fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[BoneId] {
        &self.children
    }
}

/// Arena of bones forming one or more rooted rig trees.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root bone (no parent). `position` is expressed in rig-global
    /// space.
    pub fn add_root(
        &mut self,
        name: &str,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        length: f32,
    ) -> BoneId {
        self.push_bone(name, None, position, rotation, length)
    }

    /// Add a bone under `parent`.
    pub fn add_bone(
        &mut self,
        name: &str,
        parent: BoneId,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        length: f32,
    ) -> BoneId {
        let id = self.push_bone(name, Some(parent), position, rotation, length);
        self.bones[parent.index()].children.push(id);
        id
    }

    fn push_bone(
        &mut self,
        name: &str,
        parent: Option<BoneId>,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        length: f32,
    ) -> BoneId {
        let id = BoneId(self.bones.len());
        self.bones.push(Bone {
            name: name.to_owned(),
            parent,
            children: Vec::new(),
            position,
            rotation,
            length,
            effector: None,
            pole: None,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.index()]
    }

    pub fn bone_mut(&mut self, id: BoneId) -> &mut Bone {
        &mut self.bones[id.index()]
    }

    pub fn parent(&self, id: BoneId) -> Option<BoneId> {
        self.bones[id.index()].parent
    }

    pub fn children(&self, id: BoneId) -> &[BoneId] {
        &self.bones[id.index()].children
    }

    /// Attach an effector to a bone, replacing any existing one.
    pub fn attach_effector(&mut self, id: BoneId, effector: Effector) {
        self.bones[id.index()].effector = Some(effector);
    }

    /// Attach a pole constraint to a bone, replacing any existing one.
    pub fn attach_pole(&mut self, id: BoneId, pole: Pole) {
        self.bones[id.index()].pole = Some(pole);
    }

    /// Iterate over all bone ids in arena order.
    pub fn bone_ids(&self) -> impl Iterator<Item = BoneId> {
        (0..self.bones.len()).map(BoneId)
    }
}

impl Index<BoneId> for Skeleton {
    type Output = Bone;

    fn index(&self, id: BoneId) -> &Bone {
        &self.bones[id.index()]
    }
}

impl IndexMut<BoneId> for Skeleton {
    fn index_mut(&mut self, id: BoneId) -> &mut Bone {
        &mut self.bones[id.index()]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_chain(lengths: &[f32]) -> (Skeleton, Vec<BoneId>) {
        let mut skel = Skeleton::new();
        let mut ids = Vec::new();
        let mut parent: Option<BoneId> = None;
        for (i, &len) in lengths.iter().enumerate() {
            let name = format!("bone{i}");
            let id = match parent {
                None => skel.add_root(
                    &name,
                    Vector3::zeros(),
                    UnitQuaternion::identity(),
                    len,
                ),
                Some(p) => skel.add_bone(
                    &name,
                    p,
                    Vector3::zeros(),
                    UnitQuaternion::identity(),
                    len,
                ),
            };
            ids.push(id);
            parent = Some(id);
        }
        (skel, ids)
    }

    #[test]
    fn arena_links() {
        let (skel, ids) = straight_chain(&[1.0, 2.0, 3.0]);
        assert_eq!(skel.len(), 3);
        assert_eq!(skel.parent(ids[0]), None);
        assert_eq!(skel.parent(ids[2]), Some(ids[1]));
        assert_eq!(skel.children(ids[0]), &[ids[1]]);
        assert_eq!(skel[ids[2]].length, 3.0);
        assert_eq!(skel[ids[1]].name(), "bone1");
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut skel = Skeleton::new();
        let root = skel.add_root("root", Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        let a = skel.add_bone("a", root, Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        let b = skel.add_bone("b", root, Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        let c = skel.add_bone("c", root, Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        assert_eq!(skel.children(root), &[a, b, c]);
    }

    #[test]
    fn attach_effector_and_pole() {
        let (mut skel, ids) = straight_chain(&[1.0, 1.0]);
        assert!(skel[ids[1]].effector.is_none());
        skel.attach_effector(ids[1], Effector::new(Vector3::new(0.0, 0.0, 2.0)));
        skel.attach_pole(
            ids[0],
            Pole {
                position: Vector3::zeros(),
                angle: 0.0,
            },
        );
        assert!(skel[ids[1]].effector.is_some());
        assert!(skel[ids[0]].pole.is_some());
    }

    #[test]
    fn bone_ids_cover_arena() {
        let (skel, ids) = straight_chain(&[1.0, 1.0, 1.0]);
        let collected: Vec<BoneId> = skel.bone_ids().collect();
        assert_eq!(collected, ids);
    }
}
