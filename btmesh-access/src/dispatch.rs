//! C5 — Opcode Decoder & Dispatcher.
//!
//! Grounded on `access.c`'s `get_opcode`, `find_op`, `element_model_recv`,
//! `bt_mesh_model_recv`, `bt_mesh_access_recv`, and `model_has_dst`.

use crate::composition::{CompositionRegistry, ModelRef};
use crate::config::{Config, RESERVED_OPCODE};
use crate::error::DispatchStatus;
use crate::relations::RelationGraph;
use btmesh_common::address::{Address, GroupAddress};
use btmesh_common::CompanyIdentifier;

/// A decoded opcode, distinct from `btmesh_common::opcode::Opcode` because
/// that type's `split` neither rejects `0x7F` nor applies the three-octet
/// company-id little-endian asymmetry this spec requires (§4.5).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DecodedOpcode {
    OneOctet(u8),
    TwoOctet(u8, u8),
    /// `byte0`, plus a little-endian company id spanning bytes 1–2 — the
    /// original's intentional asymmetry versus the big-endian two-octet
    /// form, kept to match the model-layer encoding.
    ThreeOctet(u8, CompanyIdentifier),
}

impl DecodedOpcode {
    pub fn len(&self) -> usize {
        match self {
            Self::OneOctet(_) => 1,
            Self::TwoOctet(..) => 2,
            Self::ThreeOctet(..) => 3,
        }
    }
}

/// `get_opcode` — `0b00xxxxxx`/`0b01xxxxxx` (not `0x7F`) is a one-octet
/// opcode; `0x7F` is rejected; `0b10xxxxxx` is two-octet big-endian;
/// `0b11xxxxxx` is three-octet with byte0 shifted 16 and a **little-endian**
/// company id in bytes 1–2.
pub fn decode_opcode(data: &[u8]) -> Option<(DecodedOpcode, &[u8])> {
    let first = *data.first()?;
    match first {
        RESERVED_OPCODE => None,
        b if b & 0b1100_0000 == 0b0000_0000 || b & 0b1100_0000 == 0b0100_0000 => Some((DecodedOpcode::OneOctet(b), &data[1..])),
        b if b & 0b1100_0000 == 0b1000_0000 => {
            if data.len() < 2 {
                return None;
            }
            Some((DecodedOpcode::TwoOctet(data[0], data[1]), &data[2..]))
        }
        _ => {
            if data.len() < 3 {
                return None;
            }
            let cid = CompanyIdentifier(u16::from_le_bytes([data[1], data[2]]));
            Some((DecodedOpcode::ThreeOctet(data[0], cid), &data[3..]))
        }
    }
}

/// A candidate model's static opcode table entry: an exact opcode match
/// plus a length contract — `Ge(n)` meaning "at least n", `Eq(n)` meaning
/// "exactly n" (the original's `op->len >= 0` / `op->len < 0` split).
#[derive(Copy, Clone, Debug)]
pub enum LengthContract {
    AtLeast(usize),
    Exactly(usize),
}

impl LengthContract {
    fn satisfied_by(&self, len: usize) -> bool {
        match self {
            Self::AtLeast(n) => len >= *n,
            Self::Exactly(n) => len == *n,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct OpcodeEntry {
    pub opcode: DecodedOpcode,
    pub contract: LengthContract,
}

/// `va_get_uuid_by_idx`/`va_get_idx_by_uuid` (§6) — the external label-UUID
/// table backing virtual addressing. Subscriptions and publications only
/// ever carry the resolved `u16` index (§3, §7); this trait is the boundary
/// where a full 128-bit label UUID on the wire gets turned into that index,
/// or back.
pub trait VirtualAddressStore {
    fn va_get_idx_by_uuid(&self, uuid: &[u8; 16]) -> Option<u16>;
    fn va_get_uuid_by_idx(&self, idx: u16) -> Option<[u8; 16]>;
}

/// Resolves an inbound virtual-address PDU's label UUID into the index
/// [`RecvContext::label_idx`] expects. An unregistered UUID resolves to
/// `None`, which `element_recv` treats as addressed to no label it knows.
pub fn resolve_label_idx(store: &impl VirtualAddressStore, uuid: &[u8; 16]) -> Option<u16> {
    store.va_get_idx_by_uuid(uuid)
}

/// The inbound message context passed to dispatch: destination address,
/// the matched application-key index or device-key flag, and (for virtual
/// destinations) the resolved label index from the external
/// virtual-address store.
#[derive(Copy, Clone, Debug)]
pub struct RecvContext {
    pub dst: Address,
    pub app_idx: Option<u16>,
    pub is_dev_key: bool,
    pub label_idx: Option<u16>,
}

/// Finds the opcode entry and its owning model within one element's model
/// list, honoring §4.5 rule 1: SIG list for opcode length < 3, vendor list
/// (optionally CID-filtered) for length 3.
fn find_opcode_in_element<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    config: &Config,
    elem_idx: u8,
    opcode: DecodedOpcode,
    opcode_table: impl Fn(usize) -> &'static [OpcodeEntry],
) -> Option<usize> {
    let meta = registry.element_meta(elem_idx)?;
    let base = registry.flat_index(ModelRef { elem_idx, mod_idx: 0 })?;
    let total = meta.sig_count as usize + meta.vendor_count as usize;
    let is_vendor_lookup = opcode.len() == 3;
    let range = if is_vendor_lookup { (meta.sig_count as usize)..total } else { 0..(meta.sig_count as usize) };
    for local in range {
        let flat = base + local;
        if is_vendor_lookup && config.vendor_cid_strict {
            if let DecodedOpcode::ThreeOctet(_, cid) = opcode {
                if let btmesh_common::ModelIdentifier::Vendor(model_cid, _) = registry.model_descriptor(flat)?.identifier {
                    if model_cid.0 != cid.0 {
                        continue;
                    }
                }
            }
        }
        for entry in opcode_table(flat) {
            if opcodes_equal(entry.opcode, opcode) {
                return Some(flat);
            }
        }
    }
    None
}

fn opcodes_equal(a: DecodedOpcode, b: DecodedOpcode) -> bool {
    match (a, b) {
        (DecodedOpcode::OneOctet(x), DecodedOpcode::OneOctet(y)) => x == y,
        (DecodedOpcode::TwoOctet(x0, x1), DecodedOpcode::TwoOctet(y0, y1)) => x0 == y0 && x1 == y1,
        (DecodedOpcode::ThreeOctet(x0, xc), DecodedOpcode::ThreeOctet(y0, yc)) => x0 == y0 && xc.0 == yc.0,
        _ => false,
    }
}

/// `model_has_dst` (§4.5 rule 4).
fn model_has_dst<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize, const R: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    graph: &RelationGraph<R>,
    flat: usize,
    elem_idx: u8,
    ctx: &RecvContext,
) -> bool {
    match ctx.dst {
        Address::Unicast(addr) => registry.element_address(elem_idx) == Some(Address::Unicast(addr)),
        Address::Virtual(_) => {
            let Some(label_idx) = ctx.label_idx else { return false };
            graph.subscribes_label(registry, elem_idx, flat, label_idx)
        }
        Address::Group(GroupAddress::Normal(_)) => graph.subscribes_group(registry, elem_idx, flat, ctx.dst),
        Address::Group(_) => {
            // Fixed group (AllProxies/Friends/Relays/Nodes/RFU).
            if elem_idx == 0 {
                true
            } else {
                graph.subscribes_group(registry, elem_idx, flat, ctx.dst)
            }
        }
        Address::Unassigned => false,
    }
}

/// `element_model_recv` — per-element delivery. `opcode_table`/`contract`
/// resolve a flat model index to its static opcode table; `handler`
/// actually invokes the model and returns `Ok(())` on success or `Err(())`
/// on a handler-reported failure (both map through the buffer
/// save/restore-on-error semantics at the call site, owned by the
/// integrator since the handler itself is outside this crate's scope).
pub fn element_recv<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize, const R: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    graph: &RelationGraph<R>,
    config: &Config,
    elem_idx: u8,
    opcode: DecodedOpcode,
    payload_len: usize,
    ctx: &RecvContext,
    opcode_table: impl Fn(usize) -> &'static [OpcodeEntry],
    mut dispatch: impl FnMut(usize) -> Result<(), ()>,
) -> DispatchStatus {
    let Some(flat) = find_opcode_in_element(registry, config, elem_idx, opcode, &opcode_table) else {
        return DispatchStatus::WrongOpcode;
    };
    let rt = registry.runtime(flat).unwrap();
    if !rt.has_key(ctx.app_idx, ctx.is_dev_key) {
        return DispatchStatus::WrongKey;
    }
    if !model_has_dst(registry, graph, flat, elem_idx, ctx) {
        return DispatchStatus::InvalidAddress;
    }
    let contract = opcode_table(flat)
        .iter()
        .find(|e| opcodes_equal(e.opcode, opcode))
        .map(|e| e.contract);
    if let Some(contract) = contract {
        if !contract.satisfied_by(payload_len) {
            return DispatchStatus::MessageNotUnderstood;
        }
    }
    match dispatch(flat) {
        Ok(()) => DispatchStatus::Success,
        Err(()) => DispatchStatus::MessageNotUnderstood,
    }
}

/// The process-wide application-layer raw-message callback (§9's "global
/// state" note; `msg_cb` in the original). Registered once by the
/// integrator; invoked with the untouched inbound buffer and receive
/// context after per-element delivery has been attempted, regardless of
/// the resulting [`DispatchStatus`] — mirrors `bt_mesh_access_recv` calling
/// `msg_cb` unconditionally alongside normal model dispatch.
pub trait RawMessageCallback {
    fn recv(&mut self, data: &[u8], ctx: &RecvContext);
}

/// `bt_mesh_model_recv` (§4.5 rule set, top half): unicast destinations go
/// to the single addressed element; anything else tries every element and
/// aggregates `SUCCESS` if any element succeeded, else the last
/// non-success. Finally, per §4.5 rule 3 / §9, invokes the optional
/// process-wide raw-message callback with the untouched inbound buffer.
pub fn access_recv<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize, const R: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    graph: &RelationGraph<R>,
    config: &Config,
    data: &[u8],
    ctx: &RecvContext,
    opcode_table: impl Fn(usize) -> &'static [OpcodeEntry],
    mut dispatch: impl FnMut(usize) -> Result<(), ()>,
    msg_cb: Option<&mut dyn RawMessageCallback>,
) -> DispatchStatus {
    let status = (|| {
        let Some((opcode, rest)) = decode_opcode(data) else {
            return DispatchStatus::WrongOpcode;
        };

        if let Address::Unicast(addr) = ctx.dst {
            let Some(elem_idx) = registry.elem_find(Address::Unicast(addr)) else {
                return DispatchStatus::InvalidAddress;
            };
            return element_recv(registry, graph, config, elem_idx, opcode, rest.len(), ctx, &opcode_table, &mut dispatch);
        }

        let mut aggregated = DispatchStatus::WrongOpcode;
        let mut any_success = false;
        for elem_idx in 0..registry.element_count() as u8 {
            let status = element_recv(registry, graph, config, elem_idx, opcode, rest.len(), ctx, &opcode_table, &mut dispatch);
            if status == DispatchStatus::Success {
                any_success = true;
            }
            aggregated = status;
        }
        if any_success {
            DispatchStatus::Success
        } else {
            aggregated
        }
    })();

    if let Some(cb) = msg_cb {
        cb.recv(data, ctx);
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_reserved_opcode() {
        assert!(decode_opcode(&[0x7F]).is_none());
    }

    #[test]
    fn three_octet_rejects_short_payload() {
        assert!(decode_opcode(&[0xC2, 0x31]).is_none());
    }

    #[test]
    fn three_octet_company_id_is_little_endian() {
        let (opcode, rest) = decode_opcode(&[0xC2, 0x31, 0x11]).unwrap();
        assert_eq!(opcode, DecodedOpcode::ThreeOctet(0xC2, CompanyIdentifier(0x1131)));
        assert!(rest.is_empty());
    }

    #[test]
    fn two_octet_is_big_endian() {
        let (opcode, _) = decode_opcode(&[0x82, 0x31]).unwrap();
        assert_eq!(opcode, DecodedOpcode::TwoOctet(0x82, 0x31));
    }

    #[test]
    fn one_octet_below_0x7f() {
        let (opcode, _) = decode_opcode(&[0x52]).unwrap();
        assert_eq!(opcode, DecodedOpcode::OneOctet(0x52));
    }

    struct OneEntryVaStore {
        uuid: [u8; 16],
        idx: u16,
    }

    impl VirtualAddressStore for OneEntryVaStore {
        fn va_get_idx_by_uuid(&self, uuid: &[u8; 16]) -> Option<u16> {
            (*uuid == self.uuid).then_some(self.idx)
        }
        fn va_get_uuid_by_idx(&self, idx: u16) -> Option<[u8; 16]> {
            (idx == self.idx).then_some(self.uuid)
        }
    }

    #[test]
    fn resolve_label_idx_finds_registered_uuid_only() {
        let store = OneEntryVaStore { uuid: [0xAA; 16], idx: 3 };
        assert_eq!(resolve_label_idx(&store, &[0xAA; 16]), Some(3));
        assert_eq!(resolve_label_idx(&store, &[0xBB; 16]), None);
    }

    struct RecordingCallback {
        calls: usize,
    }

    impl RawMessageCallback for RecordingCallback {
        fn recv(&mut self, _data: &[u8], _ctx: &RecvContext) {
            self.calls += 1;
        }
    }

    #[test]
    fn raw_message_callback_fires_even_on_wrong_opcode() {
        use crate::composition::{CompositionDescriptor, ModelDescriptor};
        use crate::config::Config;
        use crate::relations::RelationGraph;
        use btmesh_common::location::UNKNOWN;
        use btmesh_common::{ModelIdentifier, ProductIdentifier, VersionIdentifier};

        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(0), ProductIdentifier(0), VersionIdentifier(0), 0, Default::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let registry: CompositionRegistry<1, 1, 1, 1, 1> = CompositionRegistry::register(d).unwrap();
        let graph: RelationGraph<1> = RelationGraph::default();
        let ctx = RecvContext { dst: Address::Unassigned, app_idx: None, is_dev_key: false, label_idx: None };

        let mut cb = RecordingCallback { calls: 0 };
        let status = access_recv(
            &registry,
            &graph,
            &Config::default(),
            &[0x7F],
            &ctx,
            |_| &[] as &[OpcodeEntry],
            |_| Ok(()),
            Some(&mut cb),
        );
        assert_eq!(status, DispatchStatus::WrongOpcode);
        assert_eq!(cb.calls, 1);
    }
}
