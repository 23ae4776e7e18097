//! Chain-tree decomposition of a bone subtree.
//!
//! A [`Chain`] is a maximal linear run of bones with no internal branching,
//! ordered base to tip. Chains form a tree isomorphic to the branch
//! structure of the underlying subtree: a chain's children are the chains
//! rooted at its tip bone's branching children. Chains live in an arena
//! where every parent precedes its children, so a reverse index sweep
//! visits children before parents without recursion.

use armature_rig::{BoneId, ChainError, Skeleton, Subtree};

/// A maximal non-branching run of bones, base to tip.
#[derive(Debug, Clone)]
pub struct Chain {
    bones: Vec<BoneId>,
    children: Vec<usize>,
    parent: Option<usize>,
}

impl Chain {
    /// Proximal-most bone.
    pub fn base_bone(&self) -> BoneId {
        self.bones[0]
    }

    /// Distal-most bone.
    pub fn tip_bone(&self) -> BoneId {
        *self.bones.last().expect("chain holds at least one bone")
    }

    /// Bones in base-to-tip order.
    pub fn bones(&self) -> &[BoneId] {
        &self.bones
    }

    /// Child chain indices, in the rig's sibling order.
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// (bone, distal-neighbor) pairs, iterated from tip-adjacent toward the
    /// base.
    pub fn bone_pairs(&self) -> impl Iterator<Item = (BoneId, BoneId)> + '_ {
        (0..self.bones.len().saturating_sub(1))
            .rev()
            .map(move |i| (self.bones[i], self.bones[i + 1]))
    }
}

/// Arena of chains mirroring the subtree's branch topology.
#[derive(Debug, Clone)]
pub struct ChainTree {
    chains: Vec<Chain>,
}

impl ChainTree {
    /// Decompose `subtree` into chains.
    ///
    /// Fails if part of the selection is unreachable from the subtree root,
    /// or if a leaf chain's tip bone carries no effector.
    pub fn build(skeleton: &Skeleton, subtree: &Subtree) -> Result<Self, ChainError> {
        let mut chains: Vec<Chain> = Vec::new();
        let mut reached = 0usize;

        // Depth-first worklist; children of a branch are pushed in reverse
        // so they pop (and land in the arena) in sibling order.
        let mut work: Vec<(BoneId, Option<usize>)> = vec![(subtree.root(), None)];
        while let Some((start, parent)) = work.pop() {
            let idx = chains.len();
            if let Some(p) = parent {
                chains[p].children.push(idx);
            }

            let mut bones = vec![start];
            let mut cur = start;
            loop {
                let selected: Vec<BoneId> = skeleton
                    .children(cur)
                    .iter()
                    .copied()
                    .filter(|&b| subtree.contains(b))
                    .collect();
                if selected.len() == 1 {
                    cur = selected[0];
                    bones.push(cur);
                } else {
                    for &child in selected.iter().rev() {
                        work.push((child, Some(idx)));
                    }
                    break;
                }
            }

            reached += bones.len();
            chains.push(Chain {
                bones,
                children: Vec::new(),
                parent,
            });
        }

        if reached != subtree.len() {
            return Err(ChainError::Disconnected {
                selected: subtree.len(),
                reached,
            });
        }

        let tree = Self { chains };
        for &leaf in &tree.leaf_chains() {
            let tip = tree.chains[leaf].tip_bone();
            if skeleton[tip].effector.is_none() {
                return Err(ChainError::LeafMissingEffector(
                    skeleton[tip].name().to_owned(),
                ));
            }
        }
        Ok(tree)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn chain(&self, idx: usize) -> &Chain {
        &self.chains[idx]
    }

    /// The chain containing the subtree root; its base bone is the base of
    /// the whole solved subtree.
    pub fn root(&self) -> &Chain {
        &self.chains[0]
    }

    /// Indices of every leaf chain, in depth-first order.
    ///
    /// This is the order effectors are enumerated in everywhere: leaf chain
    /// `i` pairs with effector slot `i`.
    pub fn leaf_chains(&self) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let chain = &self.chains[idx];
            if chain.children.is_empty() {
                leaves.push(idx);
            }
            for &child in chain.children.iter().rev() {
                stack.push(child);
            }
        }
        leaves
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use armature_rig::Effector;
    use nalgebra::{UnitQuaternion, Vector3};

    fn add(skel: &mut Skeleton, name: &str, parent: Option<BoneId>) -> BoneId {
        match parent {
            None => skel.add_root(name, Vector3::zeros(), UnitQuaternion::identity(), 1.0),
            Some(p) => skel.add_bone(name, p, Vector3::zeros(), UnitQuaternion::identity(), 1.0),
        }
    }

    /// spine0 -> spine1 -> {arm_l0 -> arm_l1, arm_r0 -> arm_r1}
    fn two_arm_rig() -> (Skeleton, Subtree, [BoneId; 6]) {
        let mut skel = Skeleton::new();
        let s0 = add(&mut skel, "spine0", None);
        let s1 = add(&mut skel, "spine1", Some(s0));
        let l0 = add(&mut skel, "arm.L0", Some(s1));
        let l1 = add(&mut skel, "arm.L1", Some(l0));
        let r0 = add(&mut skel, "arm.R0", Some(s1));
        let r1 = add(&mut skel, "arm.R1", Some(r0));
        skel.attach_effector(l1, Effector::new(Vector3::zeros()));
        skel.attach_effector(r1, Effector::new(Vector3::zeros()));

        let mut sub = Subtree::new(s0);
        sub.select_chain(&skel, l1);
        sub.select_chain(&skel, r1);
        (skel, sub, [s0, s1, l0, l1, r0, r1])
    }

    #[test]
    fn single_chain_decomposition() {
        let mut skel = Skeleton::new();
        let a = add(&mut skel, "a", None);
        let b = add(&mut skel, "b", Some(a));
        let c = add(&mut skel, "c", Some(b));
        skel.attach_effector(c, Effector::new(Vector3::zeros()));

        let mut sub = Subtree::new(a);
        sub.select_chain(&skel, c);
        let tree = ChainTree::build(&skel, &sub).unwrap();

        assert_eq!(tree.chain_count(), 1);
        assert_eq!(tree.root().bones(), &[a, b, c]);
        assert_eq!(tree.root().base_bone(), a);
        assert_eq!(tree.root().tip_bone(), c);
        assert_eq!(tree.leaf_chains(), vec![0]);
    }

    #[test]
    fn branching_decomposition() {
        let (skel, sub, [s0, s1, l0, l1, r0, r1]) = two_arm_rig();
        let tree = ChainTree::build(&skel, &sub).unwrap();

        assert_eq!(tree.chain_count(), 3);
        assert_eq!(tree.root().bones(), &[s0, s1]);
        assert_eq!(tree.root().children().len(), 2);

        // Sibling order follows the rig's child order: left arm first.
        let left = tree.chain(tree.root().children()[0]);
        let right = tree.chain(tree.root().children()[1]);
        assert_eq!(left.bones(), &[l0, l1]);
        assert_eq!(right.bones(), &[r0, r1]);
        assert_eq!(left.parent(), Some(0));
    }

    #[test]
    fn parents_precede_children_in_arena() {
        let (skel, sub, _) = two_arm_rig();
        let tree = ChainTree::build(&skel, &sub).unwrap();
        for idx in 0..tree.chain_count() {
            if let Some(parent) = tree.chain(idx).parent() {
                assert!(parent < idx);
            }
        }
    }

    #[test]
    fn leaf_chains_in_depth_first_order() {
        let (skel, sub, _) = two_arm_rig();
        let tree = ChainTree::build(&skel, &sub).unwrap();
        let leaves = tree.leaf_chains();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves, vec![tree.root().children()[0], tree.root().children()[1]]);
    }

    #[test]
    fn leaf_chain_count_matches_subtree_leaf_count() {
        let (skel, sub, _) = two_arm_rig();
        let tree = ChainTree::build(&skel, &sub).unwrap();
        assert_eq!(tree.leaf_chains().len(), sub.leaf_count(&skel));
    }

    #[test]
    fn bone_pairs_iterate_tipward_to_base() {
        let mut skel = Skeleton::new();
        let a = add(&mut skel, "a", None);
        let b = add(&mut skel, "b", Some(a));
        let c = add(&mut skel, "c", Some(b));
        skel.attach_effector(c, Effector::new(Vector3::zeros()));
        let mut sub = Subtree::new(a);
        sub.select_chain(&skel, c);
        let tree = ChainTree::build(&skel, &sub).unwrap();

        let pairs: Vec<_> = tree.root().bone_pairs().collect();
        assert_eq!(pairs, vec![(b, c), (a, b)]);
    }

    #[test]
    fn disconnected_selection_rejected() {
        let (skel, mut sub, _) = two_arm_rig();
        // Orphan bone: in a different tree entirely.
        let mut skel2 = skel.clone();
        let orphan = skel2.add_root(
            "orphan",
            Vector3::zeros(),
            UnitQuaternion::identity(),
            1.0,
        );
        sub.select(orphan);
        let err = ChainTree::build(&skel2, &sub).unwrap_err();
        assert!(matches!(err, ChainError::Disconnected { .. }));
    }

    #[test]
    fn leaf_without_effector_rejected() {
        let mut skel = Skeleton::new();
        let a = add(&mut skel, "a", None);
        let b = add(&mut skel, "hand", Some(a));
        let mut sub = Subtree::new(a);
        sub.select_chain(&skel, b);
        let err = ChainTree::build(&skel, &sub).unwrap_err();
        assert!(matches!(err, ChainError::LeafMissingEffector(name) if name == "hand"));
    }
}
