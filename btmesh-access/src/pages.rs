//! C3 — Page Serializer.
//!
//! Grounded on `access.c`'s offset-windowed streaming primitives
//! (`data_buf_add_mem_offset`/`data_buf_add_le16_offset`/
//! `data_buf_add_u8_offset`) and `bt_mesh_comp_data_get_page_{0,1,2}` /
//! `bt_mesh_metadata_get_page_0`. Rather than building a page in a large
//! buffer and slicing it, [`Window`] streams bytes directly into the
//! caller's buffer, counting position as it goes — exactly the technique
//! the offset-add helpers use, and the only technique that keeps this
//! crate's memory footprint `O(buffer)` rather than `O(page size)`.

use crate::composition::{CompositionRegistry, ModelRef};
use crate::config::MIC_LEN;
use crate::relations::RelationGraph;
use btmesh_common::ModelIdentifier;
use heapless::Vec;

/// Result of a streamed serialization call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum StreamResult {
    /// The whole remaining page fit in the buffer; `usize` is the number of
    /// bytes written.
    Complete(usize),
    /// The buffer was exhausted (or a non-partial boundary was hit) before
    /// the whole remaining page was written; more data is available at a
    /// later offset. This is not an error — "Truncated-OK" per §4.3.
    Truncated(usize),
}

impl StreamResult {
    pub fn written(&self) -> usize {
        match self {
            Self::Complete(n) | Self::Truncated(n) => *n,
        }
    }
}

/// Streams bytes into `out`, honoring a byte `offset` window: bytes before
/// `offset` are counted but not written.
struct Window<'a> {
    pos: usize,
    offset: usize,
    out: &'a mut [u8],
    written: usize,
}

impl<'a> Window<'a> {
    fn new(out: &'a mut [u8], offset: usize) -> Self {
        Self { pos: 0, offset, out, written: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.pos >= self.offset && self.written < self.out.len() {
                self.out[self.written] = b;
                self.written += 1;
            }
            self.pos += 1;
        }
    }

    fn full(&self) -> bool {
        self.written >= self.out.len()
    }
}

/// Computes, from a list of cumulative byte-boundary positions (the end of
/// each atomic unit — an element for page 0, a model item / record / model
/// metadata block for page 1 / page 2 / metadata), the largest boundary
/// that still fits within `offset + out_len`, reserving `mic_reserve` bytes
/// when `allow_partial` is false. Returns the boundary's absolute byte
/// position (not an index).
fn clamp_to_boundary(boundaries: &[usize], offset: usize, out_len: usize, allow_partial: bool, mic_reserve: usize) -> usize {
    if allow_partial {
        return offset + out_len;
    }
    let limit = (offset + out_len).saturating_sub(mic_reserve);
    boundaries.iter().copied().filter(|&b| b <= limit).last().unwrap_or(0)
}

fn sig_and_vendor_counts<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    elem_idx: u8,
) -> (u8, u8) {
    let meta = registry.element_meta(elem_idx).unwrap();
    (meta.sig_count, meta.vendor_count)
}

// ---------------------------------------------------------------------
// Page 0
// ---------------------------------------------------------------------

const PAGE0_HEADER_LEN: usize = 2 + 2 + 2 + 2 + 2;

fn page0_element_len(sig: u8, vendor: u8) -> usize {
    2 + 1 + 1 + (sig as usize) * 2 + (vendor as usize) * 4
}

pub fn page0_size<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
) -> usize {
    let mut size = PAGE0_HEADER_LEN;
    for i in 0..registry.element_count() as u8 {
        let (sig, vendor) = sig_and_vendor_counts(registry, i);
        size += page0_element_len(sig, vendor);
    }
    size
}

fn page0_boundaries<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
) -> Vec<usize, 65> {
    let mut boundaries = Vec::new();
    let mut pos = PAGE0_HEADER_LEN;
    let _ = boundaries.push(pos);
    for i in 0..registry.element_count() as u8 {
        let (sig, vendor) = sig_and_vendor_counts(registry, i);
        pos += page0_element_len(sig, vendor);
        let _ = boundaries.push(pos);
    }
    boundaries
}

/// `bt_mesh_comp_data_get_page_0`. Per-element: `loc(2)`, `sig_count(1)`,
/// `vendor_count(1)`, then SIG ids (LE16 each), then vendor ids
/// (company LE16, id LE16).
pub fn get_page0<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    offset: usize,
    out: &mut [u8],
    allow_partial: bool,
) -> StreamResult {
    let total = page0_size(registry);
    let boundaries = page0_boundaries(registry);
    let limit = clamp_to_boundary(&boundaries, offset, out.len(), allow_partial, MIC_LEN);

    let mut w = Window::new(out, offset);
    let desc = registry.descriptor();
    w.put(&desc.cid.0.to_le_bytes());
    w.put(&desc.pid.0.to_le_bytes());
    w.put(&desc.vid.0.to_le_bytes());
    w.put(&desc.crpl.to_le_bytes());
    w.put(&desc.features.bits().to_le_bytes());

    'elems: for i in 0..registry.element_count() as u8 {
        if w.pos >= limit {
            break;
        }
        let meta = registry.element_meta(i).unwrap();
        w.put(&meta.loc.to_le_bytes());
        w.put(&[meta.sig_count, meta.vendor_count]);
        let mut flat = registry.flat_index(ModelRef { elem_idx: i, mod_idx: 0 }).unwrap();
        for _ in 0..meta.sig_count {
            if w.pos >= limit {
                break 'elems;
            }
            let m = registry.model_descriptor(flat).unwrap();
            if let ModelIdentifier::SIG(id) = m.identifier {
                w.put(&id.to_le_bytes());
            }
            flat += 1;
        }
        for _ in 0..meta.vendor_count {
            if w.pos >= limit {
                break 'elems;
            }
            let m = registry.model_descriptor(flat).unwrap();
            if let ModelIdentifier::Vendor(cid, id) = m.identifier {
                w.put(&cid.0.to_le_bytes());
                w.put(&id.to_le_bytes());
            }
            flat += 1;
        }
    }

    if w.pos >= total {
        StreamResult::Complete(w.written)
    } else {
        StreamResult::Truncated(w.written)
    }
}

// ---------------------------------------------------------------------
// Page 1
// ---------------------------------------------------------------------

const PAGE1_SHORT_OFFSET_MIN: i16 = -4;
const PAGE1_SHORT_OFFSET_MAX: i16 = 3;
const PAGE1_SHORT_MAX_EXT_COUNT: usize = 32;

struct ModelItemPlan {
    header: u8,
    corr_id: Option<u8>,
    /// Either `(base_mod_idx, rel_offset_mod_8)` short entries or
    /// `(rel_offset_wrapped, base_mod_idx)` long entries, pre-rendered as
    /// raw bytes in emission order.
    entries_short: Vec<u8, 32>,
    entries_long: Vec<(u8, u8), 32>,
    long_format: bool,
}

fn plan_model_item<const R: usize>(graph: &RelationGraph<R>, model: ModelRef) -> ModelItemPlan {
    let mut offsets: Vec<(i16, u8), 32> = Vec::new();
    for r in graph.extensions_of(model) {
        let offset = r.elem_base as i16 - r.elem_ext as i16;
        let _ = offsets.push((offset, r.idx_base));
    }
    let ext_count = offsets.len();
    let long_format = ext_count >= PAGE1_SHORT_MAX_EXT_COUNT
        || offsets.iter().any(|(off, _)| *off < PAGE1_SHORT_OFFSET_MIN || *off > PAGE1_SHORT_OFFSET_MAX);

    let corr_id = graph.correspondence_of(model);
    let mut header = ((ext_count as u8) & 0x3F) << 2;
    if corr_id.is_some() {
        header |= 0x01;
    }
    if long_format {
        header |= 0x02;
    }

    let mut entries_short = Vec::new();
    let mut entries_long = Vec::new();
    if long_format {
        for (off, base_idx) in offsets.iter() {
            let wrapped = if *off < 0 { (*off + 256) as u8 } else { *off as u8 };
            let _ = entries_long.push((wrapped, *base_idx));
        }
    } else {
        for (off, base_idx) in offsets.iter() {
            let wrapped = if *off < 0 { (*off + 8) as u8 } else { *off as u8 };
            let _ = entries_short.push((base_idx << 3) | (wrapped & 0x07));
        }
    }

    ModelItemPlan { header, corr_id, entries_short, entries_long, long_format }
}

fn model_item_len(plan: &ModelItemPlan) -> usize {
    1 + plan.corr_id.map_or(0, |_| 1) + if plan.long_format { plan.entries_long.len() * 2 } else { plan.entries_short.len() }
}

fn write_model_item(w: &mut Window, plan: &ModelItemPlan) {
    w.put(&[plan.header]);
    if let Some(id) = plan.corr_id {
        w.put(&[id]);
    }
    if plan.long_format {
        for (a, b) in plan.entries_long.iter() {
            w.put(&[*a, *b]);
        }
    } else {
        w.put(&plan.entries_short);
    }
}

/// Boundary granularity for page 1 is the "model entry" / element-header
/// unit, per §4.3's streaming discipline ("never emit partial
/// length-prefixed records inside a single page 1 ... model entry").
pub fn page1_boundaries<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize, const R: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    graph: &RelationGraph<R>,
) -> Vec<usize, 128> {
    let mut boundaries = Vec::new();
    let mut pos = 0usize;
    for i in 0..registry.element_count() as u8 {
        let meta = registry.element_meta(i).unwrap();
        pos += 2;
        let _ = boundaries.push(pos);
        let mut flat = registry.flat_index(ModelRef { elem_idx: i, mod_idx: 0 }).unwrap();
        for local in 0..(meta.sig_count as usize + meta.vendor_count as usize) {
            let plan = plan_model_item(graph, ModelRef { elem_idx: i, mod_idx: local as u8 });
            pos += model_item_len(&plan);
            let _ = boundaries.push(pos);
            flat += 1;
            let _ = flat;
        }
    }
    boundaries
}

pub fn page1_size<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize, const R: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    graph: &RelationGraph<R>,
) -> usize {
    page1_boundaries(registry, graph).last().copied().unwrap_or(0)
}

pub fn get_page1<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize, const R: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    graph: &RelationGraph<R>,
    offset: usize,
    out: &mut [u8],
    allow_partial: bool,
) -> StreamResult {
    let boundaries = page1_boundaries(registry, graph);
    let total = boundaries.last().copied().unwrap_or(0);
    let limit = clamp_to_boundary(&boundaries, offset, out.len(), allow_partial, MIC_LEN);

    let mut w = Window::new(out, offset);
    'elems: for i in 0..registry.element_count() as u8 {
        if w.pos >= limit {
            break;
        }
        let meta = registry.element_meta(i).unwrap();
        w.put(&[meta.sig_count, meta.vendor_count]);
        for local in 0..(meta.sig_count as usize + meta.vendor_count as usize) {
            if w.pos >= limit {
                break 'elems;
            }
            let plan = plan_model_item(graph, ModelRef { elem_idx: i, mod_idx: local as u8 });
            write_model_item(&mut w, &plan);
        }
    }

    if w.pos >= total {
        StreamResult::Complete(w.written)
    } else {
        StreamResult::Truncated(w.written)
    }
}

// ---------------------------------------------------------------------
// Page 2
// ---------------------------------------------------------------------

#[derive(Copy, Clone)]
pub struct Page2Record {
    pub profile_id: u16,
    pub version: (u8, u8, u8),
    pub elem_offsets: &'static [u8],
    pub additional_data: &'static [u8],
}

fn page2_record_len(r: &Page2Record) -> usize {
    2 + 3 + 1 + r.elem_offsets.len() + 2 + r.additional_data.len()
}

pub fn page2_size(records: &[Page2Record]) -> usize {
    records.iter().map(page2_record_len).sum()
}

fn page2_boundaries(records: &[Page2Record]) -> Vec<usize, 32> {
    let mut boundaries = Vec::new();
    let mut pos = 0;
    for r in records {
        pos += page2_record_len(r);
        let _ = boundaries.push(pos);
    }
    boundaries
}

/// `bt_mesh_comp_data_get_page_2`.
pub fn get_page2(records: &[Page2Record], offset: usize, out: &mut [u8], allow_partial: bool) -> StreamResult {
    let boundaries = page2_boundaries(records);
    let total = boundaries.last().copied().unwrap_or(0);
    let limit = clamp_to_boundary(&boundaries, offset, out.len(), allow_partial, MIC_LEN);

    let mut w = Window::new(out, offset);
    for r in records {
        if w.pos >= limit {
            break;
        }
        w.put(&r.profile_id.to_le_bytes());
        w.put(&[r.version.0, r.version.1, r.version.2]);
        w.put(&[r.elem_offsets.len() as u8]);
        w.put(r.elem_offsets);
        w.put(&(r.additional_data.len() as u16).to_le_bytes());
        w.put(r.additional_data);
    }

    if w.pos >= total {
        StreamResult::Complete(w.written)
    } else {
        StreamResult::Truncated(w.written)
    }
}

// ---------------------------------------------------------------------
// Metadata page 0
// ---------------------------------------------------------------------

fn model_metadata_block_len(identifier: ModelIdentifier, entries: &[crate::composition::MetadataEntry]) -> usize {
    let id_len = match identifier {
        ModelIdentifier::SIG(_) => 2,
        ModelIdentifier::Vendor(..) => 4,
    };
    let entries_len: usize = entries.iter().map(|e| 2 + 2 + e.data.len()).sum();
    id_len + 1 + entries_len
}

/// Boundary granularity is one whole model's metadata block (id + count +
/// all its entries), per the same "model entry" streaming-discipline rule
/// as page 1.
fn metadata_boundaries<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
) -> Vec<usize, 128> {
    let mut boundaries = Vec::new();
    let mut pos = 0usize;
    for i in 0..registry.element_count() as u8 {
        let meta = registry.element_meta(i).unwrap();
        pos += 2;
        let _ = boundaries.push(pos);
        let mut flat = registry.flat_index(ModelRef { elem_idx: i, mod_idx: 0 }).unwrap();
        for _ in 0..(meta.sig_count as usize + meta.vendor_count as usize) {
            let m = registry.model_descriptor(flat).unwrap();
            if !m.metadata.is_empty() {
                pos += model_metadata_block_len(m.identifier, m.metadata);
                let _ = boundaries.push(pos);
            }
            flat += 1;
        }
    }
    boundaries
}

pub fn metadata_page0_size<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
) -> usize {
    metadata_boundaries(registry).last().copied().unwrap_or(0)
}

/// `bt_mesh_metadata_get_page_0`. Only metadata-bearing models are counted
/// and emitted; each block is `{id, entry_count, {len(2), id(2), data}...}`.
pub fn get_metadata_page0<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    offset: usize,
    out: &mut [u8],
    allow_partial: bool,
) -> StreamResult {
    let boundaries = metadata_boundaries(registry);
    let total = boundaries.last().copied().unwrap_or(0);
    let limit = clamp_to_boundary(&boundaries, offset, out.len(), allow_partial, MIC_LEN);

    let mut w = Window::new(out, offset);
    'elems: for i in 0..registry.element_count() as u8 {
        if w.pos >= limit {
            break;
        }
        let meta = registry.element_meta(i).unwrap();
        let mut flat = registry.flat_index(ModelRef { elem_idx: i, mod_idx: 0 }).unwrap();
        let sig_with_meta = (0..meta.sig_count as usize)
            .filter(|&l| !registry.model_descriptor(flat + l).unwrap().metadata.is_empty())
            .count();
        let vnd_with_meta = (meta.sig_count as usize..(meta.sig_count as usize + meta.vendor_count as usize))
            .filter(|&l| !registry.model_descriptor(flat + l).unwrap().metadata.is_empty())
            .count();
        w.put(&[sig_with_meta as u8, vnd_with_meta as u8]);

        for _ in 0..(meta.sig_count as usize + meta.vendor_count as usize) {
            if w.pos >= limit {
                break 'elems;
            }
            let m = registry.model_descriptor(flat).unwrap();
            flat += 1;
            if m.metadata.is_empty() {
                continue;
            }
            match m.identifier {
                ModelIdentifier::SIG(id) => w.put(&id.to_le_bytes()),
                ModelIdentifier::Vendor(cid, id) => {
                    w.put(&cid.0.to_le_bytes());
                    w.put(&id.to_le_bytes());
                }
            }
            w.put(&[m.metadata.len() as u8]);
            for entry in m.metadata {
                w.put(&(entry.data.len() as u16).to_le_bytes());
                w.put(&entry.id.to_le_bytes());
                w.put(entry.data);
            }
        }
    }

    if w.pos >= total {
        StreamResult::Complete(w.written)
    } else {
        StreamResult::Truncated(w.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{CompositionDescriptor, ModelDescriptor};
    use btmesh_common::location::UNKNOWN;
    use btmesh_common::{CompanyIdentifier, ModelIdentifier, ProductIdentifier, VersionIdentifier};

    // Scenario 1: one element, one SIG model id 0x1000, CID=0x01AB,
    // PID=0x0002, VID=0x0003, CRPL=5, RELAY on.
    #[test]
    fn page0_scenario_one() {
        let mut d: CompositionDescriptor<1, 1> = CompositionDescriptor::new(
            CompanyIdentifier(0x01AB),
            ProductIdentifier(0x0002),
            VersionIdentifier(0x0003),
            5,
            crate::composition::Features { relay: true, ..Default::default() },
        );
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let reg: CompositionRegistry<1, 1, 1, 1, 1> = CompositionRegistry::register(d).unwrap();

        let mut out = [0u8; 64];
        let result = get_page0(&reg, 0, &mut out, true);
        let loc = UNKNOWN.to_le_bytes();
        let mut expected = heapless::Vec::<u8, 64>::new();
        expected.extend_from_slice(&[0xAB, 0x01, 0x02, 0x00, 0x03, 0x00, 0x05, 0x00, 0x01, 0x00]).unwrap();
        expected.extend_from_slice(&loc).unwrap();
        expected.extend_from_slice(&[0x01, 0x00, 0x00, 0x10]).unwrap();
        assert_eq!(&out[..result.written()], &expected[..]);
    }

    #[test]
    fn page0_streaming_concatenates() {
        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(0x01AB), ProductIdentifier(2), VersionIdentifier(3), 5, Default::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let reg: CompositionRegistry<1, 1, 1, 1, 1> = CompositionRegistry::register(d).unwrap();

        let full_size = page0_size(&reg);
        let mut whole = [0u8; 64];
        get_page0(&reg, 0, &mut whole[..full_size], true);

        let mut reassembled = heapless::Vec::<u8, 64>::new();
        let mut offset = 0;
        while offset < full_size {
            let mut buf = [0u8; 3];
            let r = get_page0(&reg, offset, &mut buf, true);
            reassembled.extend_from_slice(&buf[..r.written()]).unwrap();
            offset += r.written();
            if r.written() == 0 {
                break;
            }
        }
        assert_eq!(&reassembled[..], &whole[..full_size]);
    }

    // Scenario 6: non-partial truncation — header(10) + 9 of an 11-byte
    // element, MIC=4, must stop after the header.
    #[test]
    fn page0_nonpartial_stops_at_header() {
        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(0), ProductIdentifier(0), VersionIdentifier(0), 0, Default::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let reg: CompositionRegistry<1, 1, 1, 1, 1> = CompositionRegistry::register(d).unwrap();

        assert_eq!(page0_element_len(1, 0), 6);
        let mut out = [0u8; 19];
        let result = get_page0(&reg, 0, &mut out, false);
        assert_eq!(result, StreamResult::Truncated(PAGE0_HEADER_LEN));
    }

    // Scenario 2: element with 1 SIG model extending a base model 3
    // elements earlier at base-index 0 -> header 0x04, entry 0x05.
    #[test]
    fn page1_short_format_wraps_negative_offset() {
        let mut d: CompositionDescriptor<4, 4> =
            CompositionDescriptor::new(CompanyIdentifier(0), ProductIdentifier(0), VersionIdentifier(0), 0, Default::default());
        for _ in 0..4 {
            let e = d.push_element(UNKNOWN).unwrap();
            d.push_model(e, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        }
        let mut reg: CompositionRegistry<4, 4, 1, 1, 1> = CompositionRegistry::register(d).unwrap();
        let mut graph: RelationGraph<4> = RelationGraph::default();
        let ext = ModelRef { elem_idx: 3, mod_idx: 0 };
        let base = ModelRef { elem_idx: 0, mod_idx: 0 };
        graph.extend(&mut reg, ext, base).unwrap();

        let plan = plan_model_item(&graph, ext);
        assert!(!plan.long_format);
        assert_eq!(plan.header, 0x04);
        assert_eq!(plan.entries_short[0], 0x05);
    }
}
