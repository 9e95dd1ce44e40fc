//! C7 — Model State Persistence.
//!
//! Grounded on `access.c`'s `mod_settings_commit`, `bind_store`/`sub_store`/
//! `mod_pub_store`/`model_data_store`, `store_pending`/`store_pending_mod`,
//! and the path layout built by `encode_mod_path` (`bt/mesh/{s,v}/<eid><mid>/…`).
//! Settings writes are synchronous from this crate's point of view — the
//! `SettingsStore` trait is whatever backing the integrator wires up (flash,
//! a file, an in-memory map for tests).

use crate::composition::{BoundKey, CompositionRegistry, PendingFlags, Slot};
use crate::error::AccessError;
use crate::high_pages::HighPageKind;
use crate::log_macros::warn;
use crate::publication::{PublicationState, PublishPeriod, PublishRetransmit};
use btmesh_common::address::{Address, GroupAddress};
use btmesh_common::ModelIdentifier;
use core::fmt::Write as _;
use embassy_time::Instant;
use heapless::{String, Vec};

/// `save_one(path, bytes, len)` / `delete(path)` /
/// `load_subtree_direct(path, cb, arg)` (§6). `load_subtree_direct` hands
/// each stored key's path suffix and bytes to `reader`, mirroring the
/// original's `(key, len, read_cb, cb_arg)` settings-handler signature
/// without the original's serialize-then-copy indirection.
pub trait SettingsStore {
    fn save_one(&mut self, path: &str, bytes: &[u8]) -> Result<(), AccessError>;
    fn delete(&mut self, path: &str) -> Result<(), AccessError>;
    fn load_subtree_direct(&mut self, path: &str, reader: &mut dyn FnMut(&str, &[u8])) -> Result<(), AccessError>;
}

/// `lpn_group_add(addr)` (§6) — the low-power role's hook for mirroring a
/// model's subscription list into its friendship poll set. Called once per
/// subscribed group whenever a subscription section is committed; absent
/// (`None`) when the node isn't acting as an LPN.
pub trait LowPowerGroups {
    fn lpn_group_add(&mut self, addr: GroupAddress);
}

const MAX_PATH: usize = 32;

fn model_kind(identifier: ModelIdentifier) -> char {
    match identifier {
        ModelIdentifier::SIG(_) => 's',
        ModelIdentifier::Vendor(..) => 'v',
    }
}

/// `encode_mod_path` — `bt/mesh/{s|v}/<elem_idx><mod_idx>/<section>`, both
/// indices rendered as two lowercase hex digits. `mod_idx` here is the same
/// vendor-shifted element-local index used by relation records (§3), not a
/// separate per-kind counter, so one index space serves both.
fn model_path(kind: char, elem_idx: u8, mod_idx: u8, section: &str) -> Result<String<MAX_PATH>, AccessError> {
    let mut path = String::new();
    write!(path, "bt/mesh/{kind}/{elem_idx:02x}{mod_idx:02x}/{section}").map_err(|_| AccessError::NoBuffer)?;
    Ok(path)
}

/// `encode_mod_path` variant used by `model_data_store` —
/// `bt/mesh/{s|v}/<eid><mid>/data/<name>`, the free-form per-model blob
/// namespace from §6, distinct from the fixed `bind`/`sub`/`subv`/`pub`
/// sections.
fn data_path(kind: char, elem_idx: u8, mod_idx: u8, name: &str) -> Result<String<MAX_PATH>, AccessError> {
    let mut path = String::new();
    write!(path, "bt/mesh/{kind}/{elem_idx:02x}{mod_idx:02x}/data/{name}").map_err(|_| AccessError::NoBuffer)?;
    Ok(path)
}

fn high_page_path(kind: HighPageKind) -> &'static str {
    match kind {
        HighPageKind::Composition128 => "bt/mesh/cmp/128",
        HighPageKind::Composition129 => "bt/mesh/cmp/129",
        HighPageKind::Composition130 => "bt/mesh/cmp/130",
        HighPageKind::Metadata128 => "bt/mesh/metadata/128",
    }
}

/// `bind_store` — packs bound app-key indices as LE `u16`s, skipping
/// `Unused`; the device-key wildcard is encoded as the sentinel `0xFFFF`.
pub fn encode_bind<const KEYS: usize, const N: usize>(keys: &heapless::Vec<BoundKey, KEYS>) -> Result<Vec<u8, N>, AccessError> {
    let mut out = Vec::new();
    for key in keys.iter() {
        let code: u16 = match key {
            BoundKey::Unused => continue,
            BoundKey::AnyDevKey => 0xFFFF,
            BoundKey::App(idx) => *idx,
        };
        out.extend_from_slice(&code.to_le_bytes()).map_err(|_| AccessError::NoBuffer)?;
    }
    Ok(out)
}

pub fn decode_bind<const KEYS: usize>(bytes: &[u8]) -> Result<heapless::Vec<BoundKey, KEYS>, AccessError> {
    let mut out = Vec::new();
    for chunk in bytes.chunks_exact(2) {
        let code = u16::from_le_bytes([chunk[0], chunk[1]]);
        let key = if code == 0xFFFF { BoundKey::AnyDevKey } else { BoundKey::App(code) };
        out.push(key).map_err(|_| AccessError::OutOfMemory)?;
    }
    Ok(out)
}

fn group_numeric(addr: &GroupAddress) -> u16 {
    u16::from_be_bytes(addr.as_bytes())
}

/// `sub_store` — packs subscribed group addresses as LE `u16`s, skipping
/// empty slots.
pub fn encode_sub<const GROUPS: usize, const N: usize>(groups: &heapless::Vec<Slot<Address>, GROUPS>) -> Result<Vec<u8, N>, AccessError> {
    let mut out = Vec::new();
    for slot in groups.iter() {
        if let Slot::Used(Address::Group(g)) = slot {
            out.extend_from_slice(&group_numeric(g).to_le_bytes()).map_err(|_| AccessError::NoBuffer)?;
        }
    }
    Ok(out)
}

pub fn decode_sub<const GROUPS: usize>(bytes: &[u8]) -> Result<heapless::Vec<Slot<Address>, GROUPS>, AccessError> {
    let mut out = Vec::new();
    for chunk in bytes.chunks_exact(2) {
        let numeric = u16::from_le_bytes([chunk[0], chunk[1]]);
        let group = unsafe { GroupAddress::new_unchecked(numeric.to_be_bytes()) };
        out.push(Slot::Used(Address::Group(group))).map_err(|_| AccessError::OutOfMemory)?;
    }
    Ok(out)
}

/// `subv_store` — packs subscribed virtual-label indices (resolved via the
/// external virtual-address store, §6) as LE `u16`s.
pub fn encode_subv<const LABELS: usize, const N: usize>(labels: &heapless::Vec<Slot<u16>, LABELS>) -> Result<Vec<u8, N>, AccessError> {
    let mut out = Vec::new();
    for slot in labels.iter() {
        if let Slot::Used(idx) = slot {
            out.extend_from_slice(&idx.to_le_bytes()).map_err(|_| AccessError::NoBuffer)?;
        }
    }
    Ok(out)
}

pub fn decode_subv<const LABELS: usize>(bytes: &[u8]) -> Result<heapless::Vec<Slot<u16>, LABELS>, AccessError> {
    let mut out = Vec::new();
    for chunk in bytes.chunks_exact(2) {
        let idx = u16::from_le_bytes([chunk[0], chunk[1]]);
        out.push(Slot::Used(idx)).map_err(|_| AccessError::OutOfMemory)?;
    }
    Ok(out)
}

const PUB_RECORD_LEN_UNICAST: usize = 8;
const PUB_RECORD_LEN_VIRTUAL: usize = 10;

/// `mod_pub_store` — the fixed `/pub` record: `{addr:2, key:2, ttl:1,
/// retransmit:1, period:1, period_div:4|cred:1|rsvd:3}`, plus a trailing
/// `uuidx:2` only when `addr` is a virtual address.
pub fn encode_pub(state: &PublicationState) -> [u8; PUB_RECORD_LEN_VIRTUAL] {
    let mut out = [0u8; PUB_RECORD_LEN_VIRTUAL];
    let addr_numeric: u16 = match state.dst {
        Address::Unicast(a) => a.into(),
        Address::Group(g) => group_numeric(&g),
        Address::Virtual(v) => u16::from_be_bytes(v.as_bytes()),
        Address::Unassigned => 0,
    };
    out[0..2].copy_from_slice(&addr_numeric.to_le_bytes());
    out[2..4].copy_from_slice(&state.app_idx.to_le_bytes());
    out[4] = state.ttl;
    out[5] = state.retransmit.0;
    out[6] = state.period.0;
    out[7] = (state.period_div & 0x0F) | ((state.friendship_cred as u8) << 4);
    if let Address::Virtual(_) = state.dst {
        let idx = state.label_idx.unwrap_or(0);
        out[8..10].copy_from_slice(&idx.to_le_bytes());
    }
    out
}

/// Returns how many of `encode_pub`'s bytes are meaningful for this state
/// (8 for non-virtual destinations, 10 for virtual ones).
pub fn pub_record_len(state: &PublicationState) -> usize {
    match state.dst {
        Address::Virtual(_) => PUB_RECORD_LEN_VIRTUAL,
        _ => PUB_RECORD_LEN_UNICAST,
    }
}

/// Decodes a `/pub` record. `resolve_group`/`resolve_virtual` reconstruct
/// the original `Address` from the stored numeric form; the caller supplies
/// them since group-vs-virtual-vs-unicast can't be told apart from the
/// numeric address alone without the address-space rules in
/// `btmesh_common::address`.
pub fn decode_pub(bytes: &[u8]) -> Result<(PublicationState, Option<u16>), AccessError> {
    if bytes.len() < PUB_RECORD_LEN_UNICAST {
        return Err(AccessError::InvalidArgument);
    }
    let addr_numeric = u16::from_le_bytes([bytes[0], bytes[1]]);
    let app_idx = u16::from_le_bytes([bytes[2], bytes[3]]);
    let ttl = bytes[4];
    let retransmit = PublishRetransmit(bytes[5]);
    let period = PublishPeriod(bytes[6]);
    let period_div = bytes[7] & 0x0F;
    let friendship_cred = (bytes[7] >> 4) & 1 != 0;

    let is_virtual = addr_numeric & 0b1100_0000_0000_0000 == 0b1000_0000_0000_0000;
    let label_idx = if is_virtual {
        if bytes.len() < PUB_RECORD_LEN_VIRTUAL {
            return Err(AccessError::InvalidArgument);
        }
        Some(u16::from_le_bytes([bytes[8], bytes[9]]))
    } else {
        None
    };

    let dst = decode_pub_address(addr_numeric);

    let state = PublicationState {
        dst,
        app_idx,
        friendship_cred,
        ttl,
        period,
        retransmit,
        period_div,
        label_idx,
        ..Default::default()
    };
    Ok((state, label_idx))
}

fn decode_pub_address(numeric: u16) -> Address {
    let be = numeric.to_be_bytes();
    if numeric == 0 {
        Address::Unassigned
    } else if GroupAddress::is_group_address(&be) {
        Address::Group(unsafe { GroupAddress::new_unchecked(be) })
    } else if be[0] & 0b1100_0000 == 0b1000_0000 {
        Address::Virtual(unsafe { btmesh_common::address::VirtualAddress::new_unchecked(numeric) })
    } else {
        btmesh_common::address::UnicastAddress::parse(be)
            .map(Address::Unicast)
            .unwrap_or(Address::Unassigned)
    }
}

/// `store_pending_mod` / the flush half of `mod_settings_commit` —
/// iterates every model, writing only the sections its pending flags mark,
/// then clears them. Returns the number of models flushed (for test
/// assertions / logging); persistence errors are logged and leave the
/// flag set so the next flush retries it, per §7's policy.
///
/// `/data/<name>` blobs are model-private, so this crate can't encode or
/// size them itself — for a model with `pending.data` set, `data_source`
/// is asked to fill `name`/`bytes` and return `true` if it had something
/// ready. Returning `false` (nothing ready yet) leaves the flag set rather
/// than clearing it, exactly like a failed `write_section` call.
pub fn flush_pending<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &mut CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    store: &mut impl SettingsStore,
    mut lpn: Option<&mut dyn LowPowerGroups>,
    mut data_source: impl FnMut(usize, &mut String<16>, &mut Vec<u8, 64>) -> bool,
) -> usize {
    let mut flushed = 0;
    for flat in 0..registry.total_models() {
        let Some(descriptor) = registry.model_descriptor(flat).copied() else { continue };
        let Some(rt) = registry.runtime(flat) else { continue };
        if !rt.pending.any() {
            continue;
        }
        let kind = model_kind(descriptor.identifier);
        let elem_idx = rt.elem_idx;
        let mod_idx = rt.mod_idx;
        let pending = rt.pending;
        let mut ok = true;

        if pending.bind {
            ok &= write_section::<KEYS, GROUPS, LABELS, E, M>(registry, store, flat, kind, elem_idx, mod_idx, Section::Bind);
        }
        if pending.sub {
            ok &= write_section::<KEYS, GROUPS, LABELS, E, M>(registry, store, flat, kind, elem_idx, mod_idx, Section::Sub);
            ok &= write_section::<KEYS, GROUPS, LABELS, E, M>(registry, store, flat, kind, elem_idx, mod_idx, Section::SubV);
            if let Some(ref mut lpn) = lpn {
                if let Some(rt) = registry.runtime(flat) {
                    for slot in rt.groups.iter() {
                        if let Slot::Used(Address::Group(g)) = slot {
                            lpn.lpn_group_add(*g);
                        }
                    }
                }
            }
        }
        if pending.publish {
            ok &= write_pub_section(registry, store, flat, kind, elem_idx, mod_idx);
        }
        if pending.data {
            let mut name: String<16> = String::new();
            let mut bytes: Vec<u8, 64> = Vec::new();
            if data_source(flat, &mut name, &mut bytes) {
                ok &= model_data_store(registry, store, flat, &name, &bytes).is_ok();
            } else {
                ok = false;
            }
        }

        if ok {
            if let Some(rt) = registry.runtime_mut(flat) {
                rt.pending = PendingFlags::default();
            }
            flushed += 1;
        } else {
            warn!("persistence flush failed for a model; leaving pending flags set for retry");
        }
    }
    flushed
}

enum Section {
    Bind,
    Sub,
    SubV,
}

fn write_section<const KEYS: usize, const GROUPS: usize, const LABELS: usize, const E: usize, const M: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    store: &mut impl SettingsStore,
    flat: usize,
    kind: char,
    elem_idx: u8,
    mod_idx: u8,
    section: Section,
) -> bool {
    let Some(rt) = registry.runtime(flat) else { return false };
    let result: Result<(), AccessError> = (|| {
        match section {
            Section::Bind => {
                let bytes: Vec<u8, 64> = encode_bind(&rt.keys)?;
                let path = model_path(kind, elem_idx, mod_idx, "bind")?;
                if bytes.is_empty() {
                    store.delete(&path)
                } else {
                    store.save_one(&path, &bytes)
                }
            }
            Section::Sub => {
                let bytes: Vec<u8, 64> = encode_sub(&rt.groups)?;
                let path = model_path(kind, elem_idx, mod_idx, "sub")?;
                if bytes.is_empty() {
                    store.delete(&path)
                } else {
                    store.save_one(&path, &bytes)
                }
            }
            Section::SubV => {
                let bytes: Vec<u8, 64> = encode_subv(&rt.labels)?;
                let path = model_path(kind, elem_idx, mod_idx, "subv")?;
                if bytes.is_empty() {
                    store.delete(&path)
                } else {
                    store.save_one(&path, &bytes)
                }
            }
        }
    })();
    result.is_ok()
}

fn write_pub_section<const KEYS: usize, const GROUPS: usize, const LABELS: usize, const E: usize, const M: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    store: &mut impl SettingsStore,
    flat: usize,
    kind: char,
    elem_idx: u8,
    mod_idx: u8,
) -> bool {
    let Some(rt) = registry.runtime(flat) else { return false };
    let Some(pub_state) = &rt.publication else { return true };
    let result: Result<(), AccessError> = (|| {
        let path = model_path(kind, elem_idx, mod_idx, "pub")?;
        if pub_state.dst == Address::Unassigned {
            store.delete(&path)
        } else {
            let bytes = encode_pub(pub_state);
            store.save_one(&path, &bytes[..pub_record_len(pub_state)])
        }
    })();
    result.is_ok()
}

/// `bt_mesh_comp_load` / restores all persisted model state on boot. Loads
/// bindings, subscriptions, and publication records for one model; starting
/// publication timers afterward (with a long-window randomized first delay,
/// per §4.7) is the integrator's responsibility since it depends on the
/// full set of models being loaded first.
pub fn load_model<const KEYS: usize, const GROUPS: usize, const LABELS: usize, const E: usize, const M: usize>(
    registry: &mut CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    store: &mut impl SettingsStore,
    flat: usize,
) -> Result<(), AccessError> {
    let descriptor = registry.model_descriptor(flat).copied().ok_or(AccessError::NotFound)?;
    let (elem_idx, mod_idx) = {
        let rt = registry.runtime(flat).ok_or(AccessError::NotFound)?;
        (rt.elem_idx, rt.mod_idx)
    };
    let kind = model_kind(descriptor.identifier);

    let bind_path = model_path(kind, elem_idx, mod_idx, "bind")?;
    let mut bind_bytes: Vec<u8, 64> = Vec::new();
    let _ = store.load_subtree_direct(&bind_path, &mut |_, bytes| {
        let _ = bind_bytes.extend_from_slice(bytes);
    });
    if !bind_bytes.is_empty() {
        let keys = decode_bind::<KEYS>(&bind_bytes)?;
        if let Some(rt) = registry.runtime_mut(flat) {
            rt.keys = keys;
        }
    }

    let sub_path = model_path(kind, elem_idx, mod_idx, "sub")?;
    let mut sub_bytes: Vec<u8, 64> = Vec::new();
    let _ = store.load_subtree_direct(&sub_path, &mut |_, bytes| {
        let _ = sub_bytes.extend_from_slice(bytes);
    });
    if !sub_bytes.is_empty() {
        let groups = decode_sub::<GROUPS>(&sub_bytes)?;
        if let Some(rt) = registry.runtime_mut(flat) {
            rt.groups = groups;
        }
    }

    let subv_path = model_path(kind, elem_idx, mod_idx, "subv")?;
    let mut subv_bytes: Vec<u8, 64> = Vec::new();
    let _ = store.load_subtree_direct(&subv_path, &mut |_, bytes| {
        let _ = subv_bytes.extend_from_slice(bytes);
    });
    if !subv_bytes.is_empty() {
        let labels = decode_subv::<LABELS>(&subv_bytes)?;
        if let Some(rt) = registry.runtime_mut(flat) {
            rt.labels = labels;
        }
    }

    let pub_path = model_path(kind, elem_idx, mod_idx, "pub")?;
    let mut pub_bytes: Vec<u8, 16> = Vec::new();
    let _ = store.load_subtree_direct(&pub_path, &mut |_, bytes| {
        let _ = pub_bytes.extend_from_slice(bytes);
    });
    if !pub_bytes.is_empty() {
        let (state, _label_idx) = decode_pub(&pub_bytes)?;
        if let Some(rt) = registry.runtime_mut(flat) {
            rt.publication = Some(state);
        }
    }

    Ok(())
}

/// Persists a staged high-page/metadata blob (`bt/mesh/cmp/128|129|130`,
/// `bt/mesh/metadata/128`).
pub fn store_high_page(store: &mut impl SettingsStore, kind: HighPageKind, bytes: &[u8]) -> Result<(), AccessError> {
    store.save_one(high_page_path(kind), bytes)
}

/// `model_data_store` (§6) — writes a model-private `/data/<name>` blob
/// immediately, bypassing the pending-flag/flush cycle entirely. This is
/// the direct synchronous call a model handler makes when it already has
/// the bytes in hand; [`data_store_schedule`] is for the deferred case.
pub fn model_data_store<const KEYS: usize, const GROUPS: usize, const LABELS: usize, const E: usize, const M: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    store: &mut impl SettingsStore,
    flat: usize,
    name: &str,
    bytes: &[u8],
) -> Result<(), AccessError> {
    let descriptor = registry.model_descriptor(flat).copied().ok_or(AccessError::NotFound)?;
    let rt = registry.runtime(flat).ok_or(AccessError::NotFound)?;
    let kind = model_kind(descriptor.identifier);
    let path = data_path(kind, rt.elem_idx, rt.mod_idx, name)?;
    if bytes.is_empty() {
        store.delete(&path)
    } else {
        store.save_one(&path, bytes)
    }
}

/// `store_pending_mod`'s data half — marks a model's `/data/<name>` blob
/// dirty so the next [`flush_pending`] writes it through the caller's
/// `data_source` callback instead of storing it synchronously.
pub fn data_store_schedule<const KEYS: usize, const GROUPS: usize, const LABELS: usize, const E: usize, const M: usize>(
    registry: &mut CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    flat: usize,
) -> Result<(), AccessError> {
    let rt = registry.runtime_mut(flat).ok_or(AccessError::NotFound)?;
    rt.pending.data = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_support::TestClock;
    use btmesh_common::address::UnicastAddress;
    use std::collections::BTreeMap;

    struct MapStore(BTreeMap<String<MAX_PATH>, Vec<u8, 64>>);

    impl SettingsStore for MapStore {
        fn save_one(&mut self, path: &str, bytes: &[u8]) -> Result<(), AccessError> {
            let mut v = Vec::new();
            v.extend_from_slice(bytes).map_err(|_| AccessError::NoBuffer)?;
            let mut key = String::new();
            key.push_str(path).map_err(|_| AccessError::NoBuffer)?;
            self.0.insert(key, v);
            Ok(())
        }
        fn delete(&mut self, path: &str) -> Result<(), AccessError> {
            let mut key = String::new();
            key.push_str(path).map_err(|_| AccessError::NoBuffer)?;
            self.0.remove(&key);
            Ok(())
        }
        fn load_subtree_direct(&mut self, path: &str, reader: &mut dyn FnMut(&str, &[u8])) -> Result<(), AccessError> {
            let mut key = String::new();
            key.push_str(path).map_err(|_| AccessError::NoBuffer)?;
            if let Some(bytes) = self.0.get(&key) {
                reader(path, bytes);
            }
            Ok(())
        }
    }

    #[test]
    fn bind_round_trips_skipping_unused() {
        let mut keys: heapless::Vec<BoundKey, 4> = heapless::Vec::new();
        keys.push(BoundKey::App(3)).unwrap();
        keys.push(BoundKey::Unused).unwrap();
        keys.push(BoundKey::AnyDevKey).unwrap();
        let bytes: Vec<u8, 64> = encode_bind(&keys).unwrap();
        assert_eq!(bytes.len(), 4);
        let decoded: heapless::Vec<BoundKey, 4> = decode_bind(&bytes).unwrap();
        assert_eq!(decoded.as_slice(), &[BoundKey::App(3), BoundKey::AnyDevKey]);
    }

    #[test]
    fn pub_record_unicast_round_trips() {
        let mut state = PublicationState {
            dst: Address::Unicast(UnicastAddress::new(0x0042).unwrap()),
            app_idx: 7,
            ttl: 5,
            period: PublishPeriod::new(1, crate::publication::PeriodUnit::Sec1),
            retransmit: PublishRetransmit::new(2, 5),
            ..Default::default()
        };
        state.period_start = Some(Instant::from_millis(0));
        let bytes = encode_pub(&state);
        let len = pub_record_len(&state);
        assert_eq!(len, PUB_RECORD_LEN_UNICAST);
        let (decoded, label_idx) = decode_pub(&bytes[..len]).unwrap();
        assert_eq!(decoded.dst, state.dst);
        assert_eq!(decoded.app_idx, 7);
        assert_eq!(decoded.ttl, 5);
        assert_eq!(label_idx, None);
    }

    #[test]
    fn flush_pending_clears_flags_and_writes_paths() {
        use crate::composition::{CompositionDescriptor, Features, ModelDescriptor};
        use btmesh_common::{location::UNKNOWN, CompanyIdentifier, ProductIdentifier, VersionIdentifier};

        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(1), ProductIdentifier(1), VersionIdentifier(1), 0, Features::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let mut registry: CompositionRegistry<1, 1, 4, 4, 2> = CompositionRegistry::register(d).unwrap();

        {
            let rt = registry.runtime_mut(0).unwrap();
            rt.keys.push(BoundKey::App(9)).unwrap();
            rt.pending.bind = true;
        }

        let mut store = MapStore(BTreeMap::new());
        let flushed = flush_pending(&mut registry, &mut store, None, |_, _, _| false);
        assert_eq!(flushed, 1);
        assert!(!registry.runtime(0).unwrap().pending.any());
        assert!(store.0.contains_key(model_path('s', 0, 0, "bind").unwrap().as_str()));
        let _ = TestClock::new();
    }

    struct RecordingLpn(heapless::Vec<GroupAddress, 4>);

    impl LowPowerGroups for RecordingLpn {
        fn lpn_group_add(&mut self, addr: GroupAddress) {
            let _ = self.0.push(addr);
        }
    }

    #[test]
    fn flush_pending_mirrors_subscriptions_into_lpn_group_add() {
        use crate::composition::{CompositionDescriptor, Features, ModelDescriptor};
        use btmesh_common::{location::UNKNOWN, CompanyIdentifier, ProductIdentifier, VersionIdentifier};

        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(1), ProductIdentifier(1), VersionIdentifier(1), 0, Features::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let mut registry: CompositionRegistry<1, 1, 4, 4, 2> = CompositionRegistry::register(d).unwrap();

        let group = unsafe { GroupAddress::new_unchecked(0xC000u16.to_be_bytes()) };
        {
            let rt = registry.runtime_mut(0).unwrap();
            rt.groups.push(Slot::Used(Address::Group(group))).unwrap();
            rt.pending.sub = true;
        }

        let mut store = MapStore(BTreeMap::new());
        let mut lpn = RecordingLpn(heapless::Vec::new());
        let flushed = flush_pending(&mut registry, &mut store, Some(&mut lpn), |_, _, _| false);
        assert_eq!(flushed, 1);
        assert_eq!(lpn.0.as_slice(), &[group]);
    }

    #[test]
    fn model_data_store_writes_immediately() {
        use crate::composition::{CompositionDescriptor, Features, ModelDescriptor};
        use btmesh_common::{location::UNKNOWN, CompanyIdentifier, ProductIdentifier, VersionIdentifier};

        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(1), ProductIdentifier(1), VersionIdentifier(1), 0, Features::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let registry: CompositionRegistry<1, 1, 4, 4, 2> = CompositionRegistry::register(d).unwrap();

        let mut store = MapStore(BTreeMap::new());
        model_data_store(&registry, &mut store, 0, "scenes", &[1, 2, 3]).unwrap();
        assert_eq!(store.0.get(data_path('s', 0, 0, "scenes").unwrap().as_str()).unwrap().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn flush_pending_leaves_data_flag_set_when_source_has_nothing_ready() {
        use crate::composition::{CompositionDescriptor, Features, ModelDescriptor};
        use btmesh_common::{location::UNKNOWN, CompanyIdentifier, ProductIdentifier, VersionIdentifier};

        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(1), ProductIdentifier(1), VersionIdentifier(1), 0, Features::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let mut registry: CompositionRegistry<1, 1, 4, 4, 2> = CompositionRegistry::register(d).unwrap();

        data_store_schedule(&mut registry, 0).unwrap();
        assert!(registry.runtime(0).unwrap().pending.data);

        let mut store = MapStore(BTreeMap::new());
        let flushed = flush_pending(&mut registry, &mut store, None, |_, _, _| false);
        assert_eq!(flushed, 0);
        assert!(registry.runtime(0).unwrap().pending.data, "flag must stay set, not get silently cleared");
    }

    #[test]
    fn flush_pending_writes_data_and_clears_flag_when_source_is_ready() {
        use crate::composition::{CompositionDescriptor, Features, ModelDescriptor};
        use btmesh_common::{location::UNKNOWN, CompanyIdentifier, ProductIdentifier, VersionIdentifier};

        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(1), ProductIdentifier(1), VersionIdentifier(1), 0, Features::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let mut registry: CompositionRegistry<1, 1, 4, 4, 2> = CompositionRegistry::register(d).unwrap();

        data_store_schedule(&mut registry, 0).unwrap();

        let mut store = MapStore(BTreeMap::new());
        let flushed = flush_pending(&mut registry, &mut store, None, |flat, name, bytes| {
            if flat != 0 {
                return false;
            }
            name.push_str("scenes").unwrap();
            bytes.extend_from_slice(&[9, 8, 7]).unwrap();
            true
        });
        assert_eq!(flushed, 1);
        assert!(!registry.runtime(0).unwrap().pending.data);
        assert_eq!(store.0.get(data_path('s', 0, 0, "scenes").unwrap().as_str()).unwrap().as_slice(), &[9, 8, 7]);
    }
}
