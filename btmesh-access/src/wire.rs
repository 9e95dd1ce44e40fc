//! Large Composition Data Server wire format (§6) and the configuration
//! server's page-negotiation helper `parse_page`.
//!
//! Grounded on `large_comp_data_srv.c`'s `handle_large_comp_data_get` /
//! `handle_models_metadata_get` and `access.c`'s `comp_data_get_page`'s page
//! clamp. Folded in as free functions rather than a full Configuration
//! Server model (out of scope per `spec.md` §1), since the scenarios in §8
//! exercise the clamp and wire-shape behavior independent of a running
//! foundation-model stack.

use crate::config::Config;
use crate::dispatch::DecodedOpcode;
use btmesh_common::CompanyIdentifier;

/// `LARGE_COMP_DATA_GET` / `LARGE_COMP_DATA_STATUS`.
pub const OP_LARGE_COMP_DATA_GET: DecodedOpcode = DecodedOpcode::TwoOctet(0x81, 0x42);
pub const OP_LARGE_COMP_DATA_STATUS: DecodedOpcode = DecodedOpcode::OneOctet(0x06);
/// `MODELS_METADATA_GET` / `MODELS_METADATA_STATUS`.
pub const OP_MODELS_METADATA_GET: DecodedOpcode = DecodedOpcode::TwoOctet(0x81, 0x44);
pub const OP_MODELS_METADATA_STATUS: DecodedOpcode = DecodedOpcode::OneOctet(0x07);

/// `{page:1, offset:2}`, little-endian offset.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct LargeDataGetRequest {
    pub page: u8,
    pub offset: u16,
}

impl LargeDataGetRequest {
    pub fn parse(params: &[u8]) -> Option<Self> {
        if params.len() != 3 {
            return None;
        }
        Some(Self { page: params[0], offset: u16::from_le_bytes([params[1], params[2]]) })
    }

    pub fn encode(&self, out: &mut [u8]) -> Option<usize> {
        if out.len() < 3 {
            return None;
        }
        out[0] = self.page;
        out[1..3].copy_from_slice(&self.offset.to_le_bytes());
        Some(3)
    }
}

/// `{page:1, offset:2, total:2, bytes…}`. `total` is the full page size (not
/// just the bytes in this response), letting the requester page through a
/// page too large for one message.
pub fn encode_large_data_status(page: u8, offset: u16, total: u16, chunk: &[u8], out: &mut [u8]) -> Option<usize> {
    let header = 5;
    if out.len() < header + chunk.len() {
        return None;
    }
    out[0] = page;
    out[1..3].copy_from_slice(&offset.to_le_bytes());
    out[3..5].copy_from_slice(&total.to_le_bytes());
    out[header..header + chunk.len()].copy_from_slice(chunk);
    Some(header + chunk.len())
}

/// Which composition/metadata pages this build has compiled in — feeds
/// both [`parse_page`] and [`resolve_large_page`].
#[derive(Copy, Clone, Debug)]
pub struct PageSupport {
    pub page1: bool,
    pub page2: bool,
    pub high_pages: bool,
}

impl From<&Config> for PageSupport {
    fn from(cfg: &Config) -> Self {
        Self { page1: cfg.page1, page2: cfg.page2, high_pages: cfg.high_pages }
    }
}

impl PageSupport {
    fn supports(&self, page: u8) -> bool {
        match page {
            0 => true,
            1 => self.page1,
            2 => self.page2,
            128 | 129 | 130 => self.high_pages,
            _ => false,
        }
    }
}

/// `parse_page` (§6, Configuration Server side) — the highest supported page
/// `<= requested`, checked in clamp order 130 → 129 → 128 → 2 → 1 → 0.
pub fn parse_page(requested: u8, support: PageSupport) -> u8 {
    const CANDIDATES: [u8; 6] = [130, 129, 128, 2, 1, 0];
    CANDIDATES.into_iter().find(|&c| c <= requested && support.supports(c)).unwrap_or(0)
}

/// `handle_large_comp_data_get` / `handle_models_metadata_get`'s page
/// resolution — unlike [`parse_page`]'s full clamp ladder, both of these
/// handlers only ever serve page 0 or page 128: any requested value `>= 128`
/// resolves to 128 when high pages are compiled in, and everything else
/// (including 1..127) resolves to plain page 0.
///
/// Open Question (a): this asymmetry with the composition-data handler's
/// finer-grained clamp is intentional and preserved verbatim.
pub fn resolve_large_page(requested: u8, high_pages_supported: bool) -> u8 {
    if requested >= 128 && high_pages_supported {
        128
    } else {
        0
    }
}

/// Vendor opcode company-id comparison helper, used when a model hosting
/// these handlers also answers vendor-specific composition queries; kept
/// here so callers don't need to import `CompanyIdentifier` separately.
pub fn same_company(a: CompanyIdentifier, b: CompanyIdentifier) -> bool {
    a.0 == b.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_request_round_trips() {
        let req = LargeDataGetRequest { page: 128, offset: 0x1234 };
        let mut buf = [0u8; 3];
        req.encode(&mut buf).unwrap();
        assert_eq!(LargeDataGetRequest::parse(&buf), Some(req));
    }

    #[test]
    fn status_header_layout() {
        let mut out = [0u8; 8];
        let n = encode_large_data_status(0, 2, 10, &[0xAA, 0xBB], &mut out).unwrap();
        assert_eq!(n, 7);
        assert_eq!(&out[..7], &[0, 2, 0, 10, 0, 0xAA, 0xBB]);
    }

    #[test]
    fn parse_page_clamps_down_by_support() {
        let support = PageSupport { page1: true, page2: false, high_pages: false };
        assert_eq!(parse_page(2, support), 1);
        assert_eq!(parse_page(0, support), 0);
        assert_eq!(parse_page(200, support), 1);
    }

    #[test]
    fn large_page_resolves_to_0_or_128_only() {
        assert_eq!(resolve_large_page(1, true), 0);
        assert_eq!(resolve_large_page(129, true), 128);
        assert_eq!(resolve_large_page(129, false), 0);
    }
}
