//! C4 — High-Pages Store.
//!
//! Grounded on `access.c`'s `stored_pages[]` table, `new_page_data_is_equal`,
//! `stored_page_write`, `stored_page_read`/`stored_page_read_cb`, the
//! `next_elem_size_cdp{128,129,130}` element-boundary walkers, and
//! `bt_mesh_comp_128_elem_count`. Pages 128/129/130 (and metadata-128) are
//! pending successor pages a firmware update has staged in persistent
//! storage, served element-by-element so a provisioner reading the *live*
//! page sees consistent element boundaries even mid-rollout.

use crate::error::AccessError;
use heapless::Vec;

/// Which high page is being addressed; mirrors the `type` discriminant in
/// the original's `stored_pages[]` table plus the metadata-128 entry.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum HighPageKind {
    Composition128,
    Composition129,
    Composition130,
    Metadata128,
}

/// The 1-byte sentinel record meaning "identical to (or absent from) the
/// live page — fall back to it".
const SENTINEL: [u8; 1] = [0x00];

pub struct HighPageRecord<const N: usize> {
    data: Option<Vec<u8, N>>,
}

impl<const N: usize> Default for HighPageRecord<N> {
    fn default() -> Self {
        Self { data: None }
    }
}

impl<const N: usize> HighPageRecord<N> {
    fn is_sentinel(bytes: &[u8]) -> bool {
        bytes == SENTINEL
    }

    /// `stored_page_write` — if `data` is empty, or byte-identical to the
    /// live page passed in `current_live`, stores the 1-byte sentinel
    /// instead (saves flash when the staged page didn't actually change).
    pub fn write(&mut self, data: &[u8], current_live: &[u8]) -> Result<(), AccessError> {
        if data.is_empty() || data == current_live {
            let mut v = Vec::new();
            v.extend_from_slice(&SENTINEL).map_err(|_| AccessError::NoBuffer)?;
            self.data = Some(v);
        } else {
            let mut v = Vec::new();
            v.extend_from_slice(data).map_err(|_| AccessError::NoBuffer)?;
            self.data = Some(v);
        }
        Ok(())
    }

    /// `size(type, page)` — 0 if sentinel or absent, the stored length
    /// otherwise.
    pub fn size(&self) -> usize {
        match &self.data {
            None => 0,
            Some(d) if Self::is_sentinel(d) => 0,
            Some(d) => d.len(),
        }
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn raw(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// `stored_page_read` — `NotFound` if no record; success with zero
    /// bytes written if sentinel (fall back to current); otherwise reads
    /// the stored blob, honoring element boundaries via `element_sizer`
    /// when `allow_partial` is false.
    pub fn read(
        &self,
        offset: usize,
        out: &mut [u8],
        allow_partial: bool,
        element_sizer: impl Fn(&[u8]) -> usize,
    ) -> Result<usize, AccessError> {
        let Some(data) = &self.data else { return Err(AccessError::NotFound) };
        if Self::is_sentinel(data) {
            return Ok(0);
        }
        if offset > data.len() {
            return Ok(0);
        }
        if allow_partial {
            let remaining = &data[offset..];
            let n = remaining.len().min(out.len());
            out[..n].copy_from_slice(&remaining[..n]);
            return Ok(n);
        }

        // Walk element boundaries from the start of the blob, copying
        // whole elements into `out` until it would overflow, exactly as
        // `write_cdp_elems` rewalks the stored blob with a format-specific
        // sizing routine.
        let mut pos = 0usize;
        let mut written = 0usize;
        while pos < data.len() {
            let elem_len = element_sizer(&data[pos..]);
            if elem_len == 0 {
                break;
            }
            let elem_end = pos + elem_len;
            if pos >= offset {
                let start_in_out = written;
                let copy_len = elem_len.min(out.len().saturating_sub(start_in_out));
                if copy_len < elem_len {
                    break;
                }
                out[start_in_out..start_in_out + copy_len].copy_from_slice(&data[pos..pos + copy_len]);
                written += copy_len;
            }
            pos = elem_end;
        }
        Ok(written)
    }
}

/// `bt_mesh_comp_128_elem_count` — walks the stored page-128 blob counting
/// elements via `element_sizer`; callers fall back to the live element
/// count if nothing is staged.
pub fn count_elements(data: &[u8], element_sizer: impl Fn(&[u8]) -> usize) -> usize {
    let mut pos = 0;
    let mut count = 0;
    while pos < data.len() {
        let len = element_sizer(&data[pos..]);
        if len == 0 {
            break;
        }
        pos += len;
        count += 1;
    }
    count
}

/// Page-128 (composition page 0 layout) element sizer: `4 + 2*nSIG + 4*nVnd`.
pub fn elem_size_cdp128(bytes: &[u8]) -> usize {
    if bytes.len() < 4 {
        return 0;
    }
    let sig = bytes[2] as usize;
    let vnd = bytes[3] as usize;
    4 + 2 * sig + 4 * vnd
}

#[derive(Default)]
pub struct HighPagesStore<const N: usize> {
    pub page128: HighPageRecord<N>,
    pub page129: HighPageRecord<N>,
    pub page130: HighPageRecord<N>,
    pub metadata128: HighPageRecord<N>,
}

impl<const N: usize> HighPagesStore<N> {
    pub fn record(&self, kind: HighPageKind) -> &HighPageRecord<N> {
        match kind {
            HighPageKind::Composition128 => &self.page128,
            HighPageKind::Composition129 => &self.page129,
            HighPageKind::Composition130 => &self.page130,
            HighPageKind::Metadata128 => &self.metadata128,
        }
    }

    pub fn record_mut(&mut self, kind: HighPageKind) -> &mut HighPageRecord<N> {
        match kind {
            HighPageKind::Composition128 => &mut self.page128,
            HighPageKind::Composition129 => &mut self.page129,
            HighPageKind::Composition130 => &mut self.page130,
            HighPageKind::Metadata128 => &mut self.metadata128,
        }
    }

    /// `bt_mesh_comp_128_changed` — a staged page 128 record exists at all,
    /// sentinel or not (`stored_page_size_get(...) != 0` in the original,
    /// which is 1 for the sentinel record itself — this is the *raw* stored
    /// length, not the logical [`HighPageRecord::size`], which collapses the
    /// sentinel to 0).
    pub fn comp_128_changed(&self) -> bool {
        self.page128.exists()
    }

    /// `bt_mesh_comp_128_elem_count`.
    pub fn comp_128_elem_count(&self, live_elem_count: usize) -> usize {
        match self.page128.raw() {
            Some(data) if !HighPageRecord::<N>::is_sentinel(data) => count_elements(data, elem_size_cdp128),
            _ => live_elem_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scenario 5: write page 128 with content equal to live page 0 ->
    // stored record is the 1-byte sentinel; `size()` is 0;
    // `comp_128_changed()` is still true because a record exists.
    #[test]
    fn sentinel_collapse_on_equal_content() {
        let live = [0xAB, 0x01, 0x02, 0x00];
        let mut store: HighPagesStore<32> = HighPagesStore::default();
        store.record_mut(HighPageKind::Composition128).write(&live, &live).unwrap();
        assert_eq!(store.record(HighPageKind::Composition128).size(), 0);
        assert!(store.comp_128_changed());

        let mut out = [0u8; 32];
        let n = store
            .record(HighPageKind::Composition128)
            .read(0, &mut out, true, elem_size_cdp128)
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn differing_content_is_stored_verbatim() {
        let live = [0xAB, 0x01, 0x02, 0x00];
        let staged = [0xAB, 0x01, 0x03, 0x00];
        let mut store: HighPagesStore<32> = HighPagesStore::default();
        store.record_mut(HighPageKind::Composition128).write(&staged, &live).unwrap();
        assert_eq!(store.record(HighPageKind::Composition128).size(), 4);
    }

    #[test]
    fn elem_count_walks_blob() {
        // Two elements, each 0 SIG/0 vendor models -> 4 bytes each.
        let blob = [0u8, 0, 0, 0, /* elem 2 */ 0, 0, 0, 0];
        assert_eq!(count_elements(&blob, elem_size_cdp128), 2);
    }
}
