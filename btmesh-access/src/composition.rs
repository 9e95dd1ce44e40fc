//! C1 — Composition Registry.
//!
//! Grounded on `access.c`'s `comp_add_elem`/`comp_add_model`/`mod_init`/
//! `bt_mesh_comp_register`/`bt_mesh_comp_provision`/`bt_mesh_comp_unprovision`/
//! `bt_mesh_elem_find`, and on the flat `models`/`vnd_models` arrays Zephyr's
//! `struct bt_mesh_elem` points into — modeled here as two flat arenas
//! (`elements`, `models`) rather than `btmesh-common`'s generic
//! `Composition<X>`, because that type has no notion of an assigned
//! per-element unicast address, which this spec requires at provisioning.

use crate::error::AccessError;
use btmesh_common::address::{Address, UnicastAddress};
use btmesh_common::location::Location;
use btmesh_common::{CompanyIdentifier, ModelIdentifier, ProductIdentifier, VersionIdentifier};
use heapless::Vec;

/// A single `{len, id, data}` metadata entry, terminated in the original by
/// `data == NULL`; here the terminator is simply the end of the slice.
#[derive(Copy, Clone, Debug)]
pub struct MetadataEntry {
    pub id: u16,
    pub data: &'static [u8],
}

/// Feature bitmap emitted in page 0 (relay/proxy/friend/low-power).
#[derive(Copy, Clone, Debug, Default)]
pub struct Features {
    pub relay: bool,
    pub proxy: bool,
    pub friend: bool,
    pub low_power: bool,
}

impl Features {
    pub fn bits(&self) -> u16 {
        (self.relay as u16) | (self.proxy as u16) << 1 | (self.friend as u16) << 2 | (self.low_power as u16) << 3
    }
}

/// Compile-time model description. Fixed at init, so metadata — known
/// ahead of time and never mutated — lives in a `'static` slice rather than
/// a bounded heapless vec, matching the original's static
/// `const struct bt_mesh_models_metadata_entry metadata[]` arrays.
#[derive(Copy, Clone, Debug)]
pub struct ModelDescriptor {
    pub identifier: ModelIdentifier,
    pub metadata: &'static [MetadataEntry],
    pub supports_subscription: bool,
    pub supports_publication: bool,
    /// Device-key-only model (e.g. Large Composition Data Server extending
    /// Configuration Server) — only the device key wildcard binds it.
    pub devkey_only: bool,
}

impl ModelDescriptor {
    pub const fn new(identifier: ModelIdentifier) -> Self {
        Self {
            identifier,
            metadata: &[],
            supports_subscription: true,
            supports_publication: true,
            devkey_only: false,
        }
    }
}

/// Per-element metadata: location plus how many of the flat `models` arena
/// entries belong to this element (SIG block first, then vendor block, per
/// §3's "vendor index shifted by SIG count" convention).
#[derive(Copy, Clone, Debug)]
pub struct ElementMeta {
    pub loc: Location,
    pub sig_count: u8,
    pub vendor_count: u8,
}

pub struct CompositionDescriptor<const E: usize, const M: usize> {
    pub cid: CompanyIdentifier,
    pub pid: ProductIdentifier,
    pub vid: VersionIdentifier,
    pub crpl: u16,
    pub features: Features,
    pub elements: Vec<ElementMeta, E>,
    /// Flat arena: element 0's SIG models, element 0's vendor models,
    /// element 1's SIG models, element 1's vendor models, ...
    pub models: Vec<ModelDescriptor, M>,
}

impl<const E: usize, const M: usize> CompositionDescriptor<E, M> {
    pub fn new(cid: CompanyIdentifier, pid: ProductIdentifier, vid: VersionIdentifier, crpl: u16, features: Features) -> Self {
        Self {
            cid,
            pid,
            vid,
            crpl,
            features,
            elements: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Appends an element and returns its index. The SIG and vendor model
    /// lists must be pushed onto `models` (via [`Self::push_model`])
    /// immediately afterward, in SIG-then-vendor order, before the next
    /// element is added — the flat arena's layout depends on that order.
    pub fn push_element(&mut self, loc: Location) -> Result<u8, AccessError> {
        let idx = self.elements.len();
        self.elements
            .push(ElementMeta { loc, sig_count: 0, vendor_count: 0 })
            .map_err(|_| AccessError::OutOfMemory)?;
        Ok(idx as u8)
    }

    pub fn push_model(&mut self, elem_idx: u8, descriptor: ModelDescriptor) -> Result<(), AccessError> {
        let elem = self.elements.get_mut(elem_idx as usize).ok_or(AccessError::InvalidArgument)?;
        self.models.push(descriptor).map_err(|_| AccessError::OutOfMemory)?;
        match descriptor.identifier {
            ModelIdentifier::SIG(_) => elem.sig_count += 1,
            ModelIdentifier::Vendor(..) => elem.vendor_count += 1,
        }
        Ok(())
    }

    /// Flat-arena start index of element `elem_idx`'s model block.
    fn element_start(&self, elem_idx: u8) -> usize {
        self.elements[..elem_idx as usize]
            .iter()
            .map(|e| e.sig_count as usize + e.vendor_count as usize)
            .sum()
    }

    /// Resolves `(elem_idx, local_idx)` — where `local_idx` is the §3
    /// vendor-shifted index within the element — to a flat arena index.
    pub fn flat_index(&self, elem_idx: u8, local_idx: u8) -> Option<usize> {
        let elem = self.elements.get(elem_idx as usize)?;
        if local_idx as usize >= elem.sig_count as usize + elem.vendor_count as usize {
            return None;
        }
        Some(self.element_start(elem_idx) + local_idx as usize)
    }
}

/// Bound application-key slot. Models are bound to at most one device-key
/// wildcard plus any number of application keys; the wildcard matches any
/// inbound message carrying a device key, per the design note's
/// `{None, AnyDevKey, App(idx)}` tagged representation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum BoundKey {
    Unused,
    AnyDevKey,
    App(u16),
}

/// A dense-from-front slot with a tombstone, preserving insertion position
/// across persistence round-trips per §3's invariant.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Slot<T> {
    Empty,
    Used(T),
}

#[derive(Copy, Clone, Default, Debug)]
pub struct PendingFlags {
    pub bind: bool,
    pub sub: bool,
    pub publish: bool,
    pub data: bool,
}

impl PendingFlags {
    pub fn any(&self) -> bool {
        self.bind || self.sub || self.publish || self.data
    }
}

/// Mutable per-model runtime state installed by [`CompositionRegistry::register`].
pub struct ModelRuntime<const KEYS: usize, const GROUPS: usize, const LABELS: usize> {
    pub elem_idx: u8,
    pub mod_idx: u8,
    pub extended: bool,
    /// Circular extension-ring link; a freshly registered model is a
    /// singleton ring pointing at itself.
    pub next: usize,
    pub keys: Vec<BoundKey, KEYS>,
    pub groups: Vec<Slot<Address>, GROUPS>,
    /// Indices into an external virtual-address store (§6), not raw UUIDs.
    pub labels: Vec<Slot<u16>, LABELS>,
    pub publication: Option<crate::publication::PublicationState>,
    pub pending: PendingFlags,
}

impl<const KEYS: usize, const GROUPS: usize, const LABELS: usize> ModelRuntime<KEYS, GROUPS, LABELS> {
    /// `bt_mesh_model_has_key` — device-key wildcard matches any message
    /// carrying a device key; otherwise the bound app-key index must match.
    pub fn has_key(&self, app_idx: Option<u16>, is_dev_key: bool) -> bool {
        self.keys.iter().any(|k| match k {
            BoundKey::Unused => false,
            BoundKey::AnyDevKey => is_dev_key,
            BoundKey::App(idx) => app_idx == Some(*idx),
        })
    }
}

/// Reference to a model by its `(element, §3 vendor-shifted local)` index
/// pair — the same coordinate space relation records use.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ModelRef {
    pub elem_idx: u8,
    pub mod_idx: u8,
}

pub struct CompositionRegistry<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize> {
    descriptor: CompositionDescriptor<E, M>,
    pub(crate) runtime: Vec<ModelRuntime<KEYS, GROUPS, LABELS>, M>,
    element_addrs: Vec<Address, E>,
    primary: Option<UnicastAddress>,
}

impl<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>
    CompositionRegistry<E, M, KEYS, GROUPS, LABELS>
{
    /// `bt_mesh_comp_register` — fails with `InvalidArgument` when the
    /// element count is zero; installs each model's runtime slot (element
    /// index, §3 local index, bound keys reset to `Unused`, publication
    /// back-pointer installed via `Option`, timer armed stopped) in
    /// iteration order.
    pub fn register(descriptor: CompositionDescriptor<E, M>) -> Result<Self, AccessError> {
        if descriptor.elements.is_empty() {
            return Err(AccessError::InvalidArgument);
        }
        let mut runtime = Vec::new();
        let mut flat = 0usize;
        for (elem_idx, elem) in descriptor.elements.iter().enumerate() {
            let total = elem.sig_count as usize + elem.vendor_count as usize;
            for local in 0..total {
                let model = &descriptor.models[flat];
                let keys = Vec::new();
                let groups = Vec::new();
                let labels = Vec::new();
                runtime
                    .push(ModelRuntime {
                        elem_idx: elem_idx as u8,
                        mod_idx: local as u8,
                        extended: false,
                        next: flat,
                        keys,
                        groups,
                        labels,
                        publication: if model.supports_publication {
                            Some(crate::publication::PublicationState::default())
                        } else {
                            None
                        },
                        pending: PendingFlags::default(),
                    })
                    .map_err(|_| AccessError::OutOfMemory)?;
                flat += 1;
            }
        }
        let mut element_addrs = Vec::new();
        for _ in 0..descriptor.elements.len() {
            element_addrs.push(Address::Unassigned).map_err(|_| AccessError::OutOfMemory)?;
        }
        Ok(Self {
            descriptor,
            runtime,
            element_addrs,
            primary: None,
        })
    }

    pub fn descriptor(&self) -> &CompositionDescriptor<E, M> {
        &self.descriptor
    }

    pub fn element_count(&self) -> usize {
        self.descriptor.elements.len()
    }

    pub fn element_meta(&self, idx: u8) -> Option<&ElementMeta> {
        self.descriptor.elements.get(idx as usize)
    }

    pub fn model_descriptor(&self, flat: usize) -> Option<&ModelDescriptor> {
        self.descriptor.models.get(flat)
    }

    pub fn flat_index(&self, r: ModelRef) -> Option<usize> {
        self.descriptor.flat_index(r.elem_idx, r.mod_idx)
    }

    /// `bt_mesh_comp_provision` — `elem[i].addr = primary + i`.
    pub fn provision(&mut self, primary: UnicastAddress) {
        self.primary = Some(primary);
        for (i, addr) in self.element_addrs.iter_mut().enumerate() {
            *addr = Address::Unicast(primary + i as u8);
        }
    }

    /// `bt_mesh_comp_unprovision` — resets all addresses to `UNASSIGNED`.
    pub fn unprovision(&mut self) {
        self.primary = None;
        for addr in self.element_addrs.iter_mut() {
            *addr = Address::Unassigned;
        }
    }

    pub fn is_provisioned(&self) -> bool {
        self.primary.is_some()
    }

    pub fn element_address(&self, idx: u8) -> Option<Address> {
        self.element_addrs.get(idx as usize).copied()
    }

    /// `bt_mesh_elem_find` — unicast only; `addr - elem[0].addr`,
    /// out-of-range returns `None`. Per the design notes' Open Question
    /// (c), elements are assumed contiguous starting at `primary`.
    pub fn elem_find(&self, addr: Address) -> Option<u8> {
        let Address::Unicast(addr) = addr else { return None };
        let primary = self.primary?;
        if addr < primary {
            return None;
        }
        let idx = addr - primary;
        if (idx as usize) < self.element_addrs.len() {
            Some(idx)
        } else {
            None
        }
    }

    /// `bt_mesh_has_addr` — would this node accept a message to `addr`.
    pub fn has_addr(&self, addr: Address) -> bool {
        self.element_addrs.iter().any(|a| *a == addr)
    }

    pub fn runtime(&self, flat: usize) -> Option<&ModelRuntime<KEYS, GROUPS, LABELS>> {
        self.runtime.get(flat)
    }

    pub fn runtime_mut(&mut self, flat: usize) -> Option<&mut ModelRuntime<KEYS, GROUPS, LABELS>> {
        self.runtime.get_mut(flat)
    }

    pub fn total_models(&self) -> usize {
        self.runtime.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btmesh_common::location::UNKNOWN;

    fn sample() -> CompositionRegistry<2, 4, 4, 4, 2> {
        let mut d: CompositionDescriptor<2, 4> = CompositionDescriptor::new(
            CompanyIdentifier(0x01AB),
            ProductIdentifier(0x0002),
            VersionIdentifier(0x0003),
            5,
            Features { relay: true, ..Default::default() },
        );
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        CompositionRegistry::register(d).unwrap()
    }

    #[test]
    fn register_positions() {
        let reg = sample();
        let rt = reg.runtime(0).unwrap();
        assert_eq!(rt.elem_idx, 0);
        assert_eq!(rt.mod_idx, 0);
        assert_eq!(rt.next, 0);
    }

    #[test]
    fn register_rejects_empty() {
        let d: CompositionDescriptor<2, 4> = CompositionDescriptor::new(
            CompanyIdentifier(0),
            ProductIdentifier(0),
            VersionIdentifier(0),
            0,
            Features::default(),
        );
        assert_eq!(
            CompositionRegistry::<2, 4, 4, 4, 2>::register(d).unwrap_err(),
            AccessError::InvalidArgument
        );
    }

    #[test]
    fn provision_assigns_contiguous() {
        let mut reg = sample();
        let primary = UnicastAddress::new(0x0006).unwrap();
        reg.provision(primary);
        assert_eq!(reg.element_address(0), Some(Address::Unicast(primary)));
        assert_eq!(reg.elem_find(Address::Unicast(primary)), Some(0));
        reg.unprovision();
        assert_eq!(reg.element_address(0), Some(Address::Unassigned));
        assert_eq!(reg.elem_find(Address::Unicast(primary)), None);
    }
}
