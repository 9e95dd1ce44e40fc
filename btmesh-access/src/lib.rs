//! Access layer of a Bluetooth Mesh node.
//!
//! Maintains the node's composition (elements and models, C1), the model
//! relation graph (C2), serializes Composition Data Pages and Models
//! Metadata (C3), stages pending high pages during a composition change
//! (C4), decodes and dispatches inbound opcodes (C5), drives periodic and
//! retransmitted publications (C6), persists model bindings/subscriptions/
//! publication state (C7), and is the outbound entry point models send
//! through (C8).
//!
//! Transport, persistence, the virtual-address store, and the low-power
//! role are external collaborators supplied by the integrator as trait
//! implementations (`clock::Transport`, `persistence::{SettingsStore,
//! LowPowerGroups}`, `dispatch::VirtualAddressStore`,
//! `access_send::{OpAggregator, DelayableQueue}`) — this crate owns the
//! access-layer state machines, not the bearers underneath it.

#![cfg_attr(not(test), no_std)]
#![allow(dead_code)]

pub mod access_send;
pub mod clock;
pub mod composition;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod high_pages;
pub(crate) mod log_macros;
pub mod pages;
pub mod persistence;
pub mod publication;
pub mod relations;
pub mod wire;

pub use error::AccessError;
