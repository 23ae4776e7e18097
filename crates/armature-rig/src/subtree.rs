//! Subtree selection: the portion of a rig handed to a solver.

use std::collections::HashSet;

use crate::bone::{BoneId, Skeleton};

/// A rooted selection of bones inside a [`Skeleton`].
///
/// The root is always part of the selection. Solvers treat every bone
/// outside the selection (the root's ancestors in particular) as static.
#[derive(Debug, Clone)]
pub struct Subtree {
    root: BoneId,
    selected: HashSet<BoneId>,
}

impl Subtree {
    /// New selection containing only `root`.
    pub fn new(root: BoneId) -> Self {
        let mut selected = HashSet::new();
        selected.insert(root);
        Self { root, selected }
    }

    pub const fn root(&self) -> BoneId {
        self.root
    }

    /// Add a single bone to the selection.
    pub fn select(&mut self, bone: BoneId) {
        self.selected.insert(bone);
    }

    /// Select `tip` and every ancestor up to (and including) the root.
    ///
    /// # Panics
    ///
    /// Panics if `tip` does not descend from the selection root.
    pub fn select_chain(&mut self, skeleton: &Skeleton, tip: BoneId) {
        let mut cur = tip;
        loop {
            self.selected.insert(cur);
            if cur == self.root {
                break;
            }
            cur = skeleton
                .parent(cur)
                .expect("tip must descend from the subtree root");
        }
    }

    pub fn contains(&self, bone: BoneId) -> bool {
        self.selected.contains(&bone)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Number of selected bones that have no selected children.
    ///
    /// This equals the number of leaf chains a chain tree built from this
    /// selection will have, and therefore the number of effectors a solver
    /// expects.
    pub fn leaf_count(&self, skeleton: &Skeleton) -> usize {
        self.selected
            .iter()
            .filter(|&&id| {
                !skeleton
                    .children(id)
                    .iter()
                    .any(|child| self.selected.contains(child))
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{UnitQuaternion, Vector3};

    fn branching_rig() -> (Skeleton, BoneId, BoneId, BoneId) {
        // spine -> chest -> {arm_l, arm_r}
        let mut skel = Skeleton::new();
        let spine = skel.add_root("spine", Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        let chest = skel.add_bone("chest", spine, Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        let arm_l = skel.add_bone("arm.L", chest, Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        let arm_r = skel.add_bone("arm.R", chest, Vector3::zeros(), UnitQuaternion::identity(), 1.0);
        (skel, spine, arm_l, arm_r)
    }

    #[test]
    fn new_selects_root() {
        let (skel, spine, _, _) = branching_rig();
        let sub = Subtree::new(spine);
        assert!(sub.contains(spine));
        assert_eq!(sub.len(), 1);
        assert_eq!(sub.leaf_count(&skel), 1);
    }

    #[test]
    fn select_chain_walks_to_root() {
        let (skel, spine, arm_l, _) = branching_rig();
        let mut sub = Subtree::new(spine);
        sub.select_chain(&skel, arm_l);
        assert_eq!(sub.len(), 3); // spine, chest, arm.L
        assert!(sub.contains(arm_l));
    }

    #[test]
    fn leaf_count_matches_branching() {
        let (skel, spine, arm_l, arm_r) = branching_rig();
        let mut sub = Subtree::new(spine);
        sub.select_chain(&skel, arm_l);
        sub.select_chain(&skel, arm_r);
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.leaf_count(&skel), 2);
    }

    #[test]
    #[should_panic(expected = "tip must descend from the subtree root")]
    fn select_chain_panics_for_non_descendant_tip() {
        let (skel, _, arm_l, arm_r) = branching_rig();
        let mut sub = Subtree::new(arm_l);
        // arm.R never reaches arm.L walking up the rig.
        sub.select_chain(&skel, arm_r);
    }
}
