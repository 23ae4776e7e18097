//! Forward-reaching FABRIK solver.
//!
//! Per solve call, target data is computed once: each effector's desired
//! position is blended with the tip bone's current reach point by the
//! effector weight (optionally NLERP-smoothed around the nearest chain
//! base). The forward pass then walks the chain tree from the leaves
//! toward the base, rotating each bone to aim at its target and folding
//! the resulting positions upward; at branch points the children's
//! propagated base positions are averaged into a single pull.
//!
//! This is a best-effort iterative solver: there is no backward
//! root-anchoring pass and no working convergence check, so every solve
//! runs the full iteration budget.

use log::{debug, warn};
use nalgebra::Vector3;

use armature_rig::transform::{pos_local_to_space, pos_space_to_local, swing_to};
use armature_rig::{
    ArmatureError, BoneId, Effector, EffectorFeatures, Skeleton, SolverConfig, Subtree,
};

use crate::chain::ChainTree;
use crate::solver::IkSolver;

/// Forward-reaching FABRIK solver over a branching chain tree.
///
/// Owns the chain decomposition plus two parallel arrays: the leaf chain
/// indices (one per effector, depth-first order) and the per-effector
/// target positions recomputed at the start of every solve. Bones
/// themselves stay in the caller's [`Skeleton`]; only `rotation` fields of
/// bones inside the chain tree are written.
///
/// Not reentrant: concurrent solves on one instance race on the target
/// buffer and on bone state. One instance per rig, solved from one thread.
pub struct FabrikSolver {
    chain_tree: ChainTree,
    /// Leaf chain indices, depth-first; slot `i` pairs with
    /// `target_positions[i]`.
    effector_chains: Vec<usize>,
    target_positions: Vec<Vector3<f32>>,
    /// Reverse map: chain index -> effector slot, `None` for inner chains.
    effector_slots: Vec<Option<usize>>,
    /// Nominal IK root; may sit above the chain base, in which case
    /// effector targets are reconciled between the two parent frames.
    root_bone: BoneId,
    max_iterations: u32,
    tolerance: f32,
}

impl FabrikSolver {
    /// Strategy name under which this solver registers.
    pub const NAME: &'static str = "fabrik";

    /// Build a solver for the given subtree selection.
    ///
    /// Decomposes the subtree into a chain tree, sizes the effector arrays
    /// from the subtree's leaf count, and validates pole placement.
    pub fn new(
        skeleton: &Skeleton,
        subtree: &Subtree,
        config: &SolverConfig,
    ) -> Result<Self, ArmatureError> {
        config.validate()?;
        let chain_tree = ChainTree::build(skeleton, subtree)?;

        let num_effectors = subtree.leaf_count(skeleton);
        let effector_chains = chain_tree.leaf_chains();
        assert_eq!(
            effector_chains.len(),
            num_effectors,
            "leaf chain count must equal the subtree leaf count"
        );

        let mut effector_slots = vec![None; chain_tree.chain_count()];
        for (slot, &chain) in effector_chains.iter().enumerate() {
            effector_slots[chain] = Some(slot);
        }

        validate_poles(skeleton, &chain_tree);
        debug!(
            "fabrik: initialized with {} end-effectors, {} chains",
            num_effectors,
            chain_tree.chain_count()
        );

        Ok(Self {
            chain_tree,
            effector_chains,
            target_positions: vec![Vector3::zeros(); num_effectors],
            effector_slots,
            root_bone: subtree.root(),
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        })
    }

    /// Override the nominal IK root.
    ///
    /// `root` must be the chain base itself or one of its static ancestors;
    /// effector targets are interpreted in the frame of `root`'s parent.
    pub fn set_root_bone(&mut self, root: BoneId) {
        self.root_bone = root;
    }

    /// Base bone of the whole solved subtree.
    pub fn base_bone(&self) -> BoneId {
        self.chain_tree.root().base_bone()
    }

    pub fn num_effectors(&self) -> usize {
        self.effector_chains.len()
    }

    pub fn chain_tree(&self) -> &ChainTree {
        &self.chain_tree
    }

    /// Per-effector targets computed by the last solve, in the frame of the
    /// base bone's parent.
    pub fn target_positions(&self) -> &[Vector3<f32>] {
        &self.target_positions
    }

    /// Run the solver: compute target data once, then repeat the forward
    /// pass up to `max_iterations` times. Returns the number of iterations
    /// performed.
    pub fn solve(&mut self, skeleton: &mut Skeleton) -> u32 {
        self.calculate_target_data(skeleton);

        let tol_squared = self.tolerance * self.tolerance;
        let mut iteration = 0;
        while iteration < self.max_iterations {
            let _base_pos = self.solve_chain_forwards(skeleton);
            iteration += 1;
            if self.all_targets_reached(skeleton, tol_squared) {
                break;
            }
        }
        iteration
    }

    /// Compute the "actual" target for every effector, in the frame of the
    /// base bone's parent. Runs once per solve; every iteration reuses
    /// these fixed positions against the updated bone state.
    fn calculate_target_data(&mut self, skeleton: &Skeleton) {
        let base_parent = skeleton.parent(self.base_bone());
        let root_parent = skeleton.parent(self.root_bone);

        for i in 0..self.effector_chains.len() {
            let chain = self.chain_tree.chain(self.effector_chains[i]);
            let tip_bone = chain.tip_bone();
            let eff = skeleton[tip_bone]
                .effector
                .clone()
                .expect("leaf chain tip bone must carry an effector");

            // The effector target lives in the parent-of-root frame; the
            // solver works in the parent-of-base frame. The two differ only
            // when the nominal root sits above the chain base; both are
            // static ancestors.
            let mut target = if root_parent == base_parent {
                eff.target_position
            } else {
                let bp = base_parent.expect("IK root must sit at or above the chain base");
                pos_space_to_local(skeleton, eff.target_position, root_parent, bp)
            };

            // Current reach point: the tip bone's distal end, in the same
            // frame. Weight 0 must leave the rig untouched, so the blend
            // anchors here.
            let tip_len = skeleton[tip_bone].length;
            let tip_pos = pos_local_to_space(
                skeleton,
                Vector3::new(0.0, 0.0, tip_len),
                tip_bone,
                base_parent,
            );

            target = tip_pos + (target - tip_pos) * eff.weight;

            if eff.features.contains(EffectorFeatures::WEIGHT_NLERP) {
                target = self.nlerp_target(skeleton, i, target, &eff, base_parent, root_parent);
            }

            self.target_positions[i] = target;
        }
    }

    /// Distance-preserving rework of a blended target, pinned to the leaf
    /// chain's base bone (the nearest branch or root ancestor).
    ///
    /// Lerping positions shrinks or stretches the effective reach distance
    /// as the weight varies; blending the distance from the nearest stable
    /// joint and re-applying it along the blended direction keeps
    /// transitions smooth.
    fn nlerp_target(
        &self,
        skeleton: &Skeleton,
        slot: usize,
        target: Vector3<f32>,
        eff: &Effector,
        base_parent: Option<BoneId>,
        root_parent: Option<BoneId>,
    ) -> Vector3<f32> {
        let chain = self.chain_tree.chain(self.effector_chains[slot]);
        let tip_bone = chain.tip_bone();
        let subbase = chain.base_bone();
        let tip_len = skeleton[tip_bone].length;

        let to_tip = pos_local_to_space(
            skeleton,
            Vector3::new(0.0, 0.0, tip_len),
            tip_bone,
            Some(subbase),
        );
        let to_eff = pos_space_to_local(skeleton, eff.target_position, root_parent, subbase);

        let target_distance =
            to_eff.norm() * eff.weight + to_tip.norm() * (1.0 - eff.weight);

        let local = pos_space_to_local(skeleton, target, base_parent, subbase);
        let norm = local.norm();
        if norm <= f32::EPSILON {
            return target;
        }
        pos_local_to_space(
            skeleton,
            local * (target_distance / norm),
            subbase,
            base_parent,
        )
    }

    /// The target pulled into a chain: the mean of its children's propagated
    /// base positions, or (for a leaf) its own precomputed effector target
    /// re-expressed in the tip bone's local frame.
    fn incoming_target(
        &self,
        skeleton: &Skeleton,
        idx: usize,
        results: &[Vector3<f32>],
    ) -> Vector3<f32> {
        let chain = self.chain_tree.chain(idx);
        if chain.children().is_empty() {
            let slot = self.effector_slots[idx].expect("leaf chain must own an effector slot");
            let base_parent = skeleton.parent(self.base_bone());
            pos_space_to_local(
                skeleton,
                self.target_positions[slot],
                base_parent,
                chain.tip_bone(),
            )
        } else {
            let sum: Vector3<f32> = chain
                .children()
                .iter()
                .map(|&child| results[child])
                .sum();
            sum / chain.children().len() as f32
        }
    }

    /// One forward-reach pass over the whole chain tree.
    ///
    /// Children are processed before their parent chain (reverse arena
    /// sweep; parents precede children in the arena), so each chain can
    /// average its children's already-propagated base positions. Returns
    /// the propagated base position reflected about the base bone's offset,
    /// which would seed a backward root-anchoring pass.
    fn solve_chain_forwards(&self, skeleton: &mut Skeleton) -> Vector3<f32> {
        let chain_count = self.chain_tree.chain_count();
        let mut results = vec![Vector3::zeros(); chain_count];

        for idx in (0..chain_count).rev() {
            let mut target = self.incoming_target(skeleton, idx, &results);
            let chain = self.chain_tree.chain(idx);

            // The tip bone is unconstrained during forward iteration: aim
            // its forward axis at the target, then re-express the target in
            // the rotated frame and step the reference point from the
            // bone's head to its tail.
            {
                let delta = swing_to(&target);
                let bone = &mut skeleton[chain.tip_bone()];
                bone.rotation *= delta;
                target = Vector3::new(0.0, 0.0, target.norm() - bone.length);
                target = bone.rotation * target + bone.position;
            }

            for (bone_id, child_id) in chain.bone_pairs() {
                let bone_length = skeleton[bone_id].length;
                // Complete the transform into this bone's frame.
                target.z += bone_length;

                // The child bone may be displaced from the straight
                // continuation of this bone; that fixed angular offset must
                // be subtracted so the child aims at the target while this
                // bone rotates underneath it.
                let child_head =
                    skeleton[child_id].position + Vector3::new(0.0, 0.0, bone_length);
                let offset_rot = swing_to(&child_head);
                let delta = swing_to(&target) * offset_rot.inverse();

                skeleton[bone_id].rotation *= delta;
                // Counter-rotate the child so its orientation in space is
                // unchanged.
                let child = &mut skeleton[child_id];
                child.rotation = delta.inverse() * child.rotation;

                // Rotating the bone moved the target in its local frame by
                // the inverse amount; then shift the reference point past
                // the child's head and fold into the next frame up.
                target = delta.inverse() * target - child_head;
                let bone = &skeleton[bone_id];
                target = bone.rotation * target + bone.position;
            }

            results[idx] = target;
        }

        // Seed value for a backward pass: the propagated base position
        // reflected about the base bone's own offset.
        let base = &skeleton[self.base_bone()];
        2.0 * base.position - results[0]
    }

    /// Convergence check. Not implemented: always reports "not converged",
    /// so the solve loop runs its full iteration budget. A working version
    /// would re-express every tip bone's distal end in the parent-of-base
    /// frame and compare squared distances against `tol_squared`.
    fn all_targets_reached(&self, _skeleton: &Skeleton, _tol_squared: f32) -> bool {
        false
    }
}

impl IkSolver for FabrikSolver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn solve(&mut self, skeleton: &mut Skeleton) -> u32 {
        FabrikSolver::solve(self, skeleton)
    }

    fn visit_bones(&self, visit: &mut dyn FnMut(BoneId)) {
        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let chain = self.chain_tree.chain(idx);
            for &bone in chain.bones() {
                visit(bone);
            }
            for &child in chain.children().iter().rev() {
                stack.push(child);
            }
        }
    }

    fn visit_effectors(&self, visit: &mut dyn FnMut(BoneId)) {
        for &chain in &self.effector_chains {
            visit(self.chain_tree.chain(chain).tip_bone());
        }
    }
}

/// Warn about poles attached anywhere but a chain tip, where they have no
/// effect. Diagnostic only; returns the number of misplaced poles.
pub fn validate_poles(skeleton: &Skeleton, chain_tree: &ChainTree) -> usize {
    let mut misplaced = 0;
    for idx in 0..chain_tree.chain_count() {
        let chain = chain_tree.chain(idx);
        let tip = chain.tip_bone();
        for &bone in chain.bones() {
            if bone == tip {
                continue;
            }
            if skeleton[bone].pole.is_some() {
                warn!(
                    "fabrik: pole attached to bone '{}' has no effect and will be ignored",
                    skeleton[bone].name()
                );
                misplaced += 1;
            }
        }
    }
    if misplaced > 0 {
        warn!(
            "fabrik: poles only make sense at the ends of chains, such as effector bones or bones with multiple children"
        );
    }
    misplaced
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
