//! Crate-wide error type.
//!
//! One flat enum rather than a per-module error type, following
//! `btmesh-driver`'s `DriverError`/`StorageError` convention.

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    InvalidArgument,
    NotFound,
    OutOfMemory,
    NoBuffer,
    AddressUnassigned,
    MessageTooLarge,
    NotProvisioned,
    NotSupported,
}

impl core::fmt::Display for AccessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::InvalidArgument => "invalid argument",
            Self::NotFound => "not found",
            Self::OutOfMemory => "relation or composition table full",
            Self::NoBuffer => "response would not fit in the supplied buffer",
            Self::AddressUnassigned => "element address is unassigned",
            Self::MessageTooLarge => "message plus MIC exceeds MAX_SDU",
            Self::NotProvisioned => "node is not provisioned",
            Self::NotSupported => "feature not compiled in",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AccessError {}

/// Dispatch status codes surfaced on the response path, distinct from
/// [`AccessError`] — these are spec-defined wire-level access-layer
/// statuses, not this crate's own error kind.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchStatus {
    Success,
    WrongOpcode,
    WrongKey,
    InvalidAddress,
    MessageNotUnderstood,
}
