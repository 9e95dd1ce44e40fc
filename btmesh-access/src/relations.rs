//! C2 — Relation Graph.
//!
//! Grounded on `access.c`'s `struct mod_relation`, `MOD_REL_LIST_FOR_EACH`,
//! `bt_mesh_model_extend`, `bt_mesh_model_correspond`, and the ring-merge
//! technique implicit in `extend`'s "all models in one extension cluster
//! share one ring" behavior (the original splices `next` pointers exactly
//! the way a classic circular-linked-list union does).

use crate::composition::{CompositionRegistry, ModelRef};
use crate::error::AccessError;
use heapless::Vec;

/// `type ∈ [0x00, 0xFE]` is a correspondence-group id; `0xFF` marks
/// extension, per §3's relation record tuple.
pub const RELATION_TYPE_EXT: u8 = 0xFF;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Relation {
    pub elem_base: u8,
    pub idx_base: u8,
    pub elem_ext: u8,
    pub idx_ext: u8,
    pub rel_type: u8,
}

pub struct RelationGraph<const R: usize> {
    relations: Vec<Relation, R>,
}

impl<const R: usize> Default for RelationGraph<R> {
    fn default() -> Self {
        Self { relations: Vec::new() }
    }
}

impl<const R: usize> RelationGraph<R> {
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// `bt_mesh_model_extend` — merges the circular `next`-lists of `ext`
    /// and `base`, marks `base` as `EXTENDED`, and registers a `0xFF`
    /// relation unless already present. Re-extending the same pair, or
    /// extending a model by itself, is a no-op.
    pub fn extend<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
        &mut self,
        registry: &mut CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
        ext: ModelRef,
        base: ModelRef,
    ) -> Result<(), AccessError> {
        let ext_idx = registry.flat_index(ext).ok_or(AccessError::InvalidArgument)?;
        let base_idx = registry.flat_index(base).ok_or(AccessError::InvalidArgument)?;
        if ext_idx == base_idx {
            return Ok(());
        }

        let exists = self.relations.iter().any(|r| {
            r.rel_type == RELATION_TYPE_EXT
                && r.elem_ext == ext.elem_idx
                && r.idx_ext == ext.mod_idx
                && r.elem_base == base.elem_idx
                && r.idx_base == base.mod_idx
        });

        if !ring_contains(registry, ext_idx, base_idx) {
            merge_rings(registry, ext_idx, base_idx);
        }
        registry.runtime_mut(base_idx).unwrap().extended = true;

        if !exists {
            self.relations
                .push(Relation {
                    elem_base: base.elem_idx,
                    idx_base: base.mod_idx,
                    elem_ext: ext.elem_idx,
                    idx_ext: ext.mod_idx,
                    rel_type: RELATION_TYPE_EXT,
                })
                .map_err(|_| AccessError::OutOfMemory)?;
        }
        Ok(())
    }

    /// `bt_mesh_model_correspond` — one-pass scan tracking the maximum
    /// existing correspondence-group id; reuses it if `a` or `b` already
    /// appears in a correspondence relation, else allocates `max + 1`.
    pub fn correspond(&mut self, a: ModelRef, b: ModelRef) -> Result<u8, AccessError> {
        let mut max_id: Option<u8> = None;
        let mut reuse: Option<u8> = None;
        for r in self.relations.iter() {
            if r.rel_type == RELATION_TYPE_EXT {
                continue;
            }
            max_id = Some(max_id.map_or(r.rel_type, |m| m.max(r.rel_type)));
            let touches_a = (r.elem_base, r.idx_base) == (a.elem_idx, a.mod_idx) || (r.elem_ext, r.idx_ext) == (a.elem_idx, a.mod_idx);
            let touches_b = (r.elem_base, r.idx_base) == (b.elem_idx, b.mod_idx) || (r.elem_ext, r.idx_ext) == (b.elem_idx, b.mod_idx);
            if touches_a || touches_b {
                reuse = Some(r.rel_type);
            }
        }
        let id = reuse.unwrap_or_else(|| max_id.map_or(0, |m| m + 1));
        self.relations
            .push(Relation {
                elem_base: a.elem_idx,
                idx_base: a.mod_idx,
                elem_ext: b.elem_idx,
                idx_ext: b.mod_idx,
                rel_type: id,
            })
            .map_err(|_| AccessError::OutOfMemory)?;
        Ok(id)
    }

    /// Relations in which `model` is the extending side — used by the page
    /// 1 serializer to compute `ext_count` and the short/long format
    /// decision (§4.3).
    pub fn extensions_of(&self, model: ModelRef) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(move |r| r.rel_type == RELATION_TYPE_EXT && r.elem_ext == model.elem_idx && r.idx_ext == model.mod_idx)
    }

    /// The correspondence id for `model`, if it participates in one.
    pub fn correspondence_of(&self, model: ModelRef) -> Option<u8> {
        self.relations.iter().find_map(|r| {
            if r.rel_type == RELATION_TYPE_EXT {
                return None;
            }
            let is_a = (r.elem_base, r.idx_base) == (model.elem_idx, model.mod_idx);
            let is_b = (r.elem_ext, r.idx_ext) == (model.elem_idx, model.mod_idx);
            (is_a || is_b).then_some(r.rel_type)
        })
    }

    /// Walks the extension ring starting at `start`, checking whether any
    /// member on the same element as `dispatch_elem_idx` subscribes to
    /// `group` — "subscription lookup walks the extension ring... but only
    /// if the found model is on the same element as the dispatched one"
    /// (§4.5).
    pub fn subscribes_group<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
        &self,
        registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
        dispatch_elem_idx: u8,
        start: usize,
        group: btmesh_common::address::Address,
    ) -> bool {
        for idx in RingWalk::new(registry, start) {
            let rt = registry.runtime(idx).unwrap();
            if rt.elem_idx != dispatch_elem_idx {
                continue;
            }
            if rt.groups.iter().any(|s| matches!(s, crate::composition::Slot::Used(a) if *a == group)) {
                return true;
            }
        }
        false
    }

    /// Same as [`Self::subscribes_group`] but for a resolved virtual-label
    /// index (the label has already been looked up via the external
    /// virtual-address store per §6).
    pub fn subscribes_label<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
        &self,
        registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
        dispatch_elem_idx: u8,
        start: usize,
        label_idx: u16,
    ) -> bool {
        for idx in RingWalk::new(registry, start) {
            let rt = registry.runtime(idx).unwrap();
            if rt.elem_idx != dispatch_elem_idx {
                continue;
            }
            if rt.labels.iter().any(|s| matches!(s, crate::composition::Slot::Used(l) if *l == label_idx)) {
                return true;
            }
        }
        false
    }
}

fn ring_contains<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    start: usize,
    target: usize,
) -> bool {
    RingWalk::new(registry, start).any(|idx| idx == target)
}

fn merge_rings<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &mut CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    a: usize,
    b: usize,
) {
    let a_next = registry.runtime(a).unwrap().next;
    let b_next = registry.runtime(b).unwrap().next;
    registry.runtime_mut(a).unwrap().next = b_next;
    registry.runtime_mut(b).unwrap().next = a_next;
}

/// Iterates a circular extension ring starting at `start`, stopping once it
/// returns to `start` (bounded so a malformed ring can never loop forever).
pub struct RingWalk<'a, const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize> {
    registry: &'a CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    start: usize,
    current: Option<usize>,
    steps: usize,
    limit: usize,
}

impl<'a, const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>
    RingWalk<'a, E, M, KEYS, GROUPS, LABELS>
{
    fn new(registry: &'a CompositionRegistry<E, M, KEYS, GROUPS, LABELS>, start: usize) -> Self {
        let limit = registry.total_models();
        Self { registry, start, current: Some(start), steps: 0, limit }
    }
}

impl<'a, const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize> Iterator
    for RingWalk<'a, E, M, KEYS, GROUPS, LABELS>
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.current?;
        if self.steps >= self.limit {
            self.current = None;
            return None;
        }
        self.steps += 1;
        let next = self.registry.runtime(current).unwrap().next;
        self.current = if next == self.start { None } else { Some(next) };
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{CompositionDescriptor, ModelDescriptor};
    use btmesh_common::location::UNKNOWN;
    use btmesh_common::{CompanyIdentifier, ModelIdentifier, ProductIdentifier, VersionIdentifier};

    fn two_element_registry() -> CompositionRegistry<2, 4, 2, 2, 2> {
        let mut d: CompositionDescriptor<2, 4> =
            CompositionDescriptor::new(CompanyIdentifier(0), ProductIdentifier(0), VersionIdentifier(0), 0, Default::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let e1 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e1, ModelDescriptor::new(ModelIdentifier::SIG(0x1001))).unwrap();
        CompositionRegistry::register(d).unwrap()
    }

    #[test]
    fn extend_joins_ring_and_sets_flag() {
        let mut reg = two_element_registry();
        let mut graph: RelationGraph<4> = RelationGraph::default();
        let ext = ModelRef { elem_idx: 1, mod_idx: 0 };
        let base = ModelRef { elem_idx: 0, mod_idx: 0 };
        graph.extend(&mut reg, ext, base).unwrap();

        assert!(reg.runtime(0).unwrap().extended);
        let ext_idx = reg.flat_index(ext).unwrap();
        let base_idx = reg.flat_index(base).unwrap();
        assert!(ring_contains(&reg, ext_idx, base_idx));
        assert_eq!(graph.relations().len(), 1);

        // Re-extending is a no-op: ring membership unchanged, no duplicate relation.
        graph.extend(&mut reg, ext, base).unwrap();
        assert_eq!(graph.relations().len(), 1);
    }

    #[test]
    fn correspond_reuses_group_id() {
        let mut graph: RelationGraph<4> = RelationGraph::default();
        let a = ModelRef { elem_idx: 0, mod_idx: 0 };
        let b = ModelRef { elem_idx: 1, mod_idx: 0 };
        let c = ModelRef { elem_idx: 1, mod_idx: 1 };
        let id1 = graph.correspond(a, b).unwrap();
        let id2 = graph.correspond(b, c).unwrap();
        assert_eq!(id1, id2);
    }
}
