//! C8 — Access Send Path.
//!
//! Grounded on `access.c`'s `bt_mesh_model_send` — op-aggregator interception
//! first, then the key-binding check, then the delayable-message diversion,
//! falling through to `bt_mesh_trans_send` last.

use crate::clock::Transport;
use crate::composition::CompositionRegistry;
use crate::error::AccessError;
use btmesh_common::address::{Address, UnicastAddress};

/// The context a model supplies when sending: destination, the app-key
/// index or device-key flag to encrypt under, friendship credentials, TTL,
/// and whether this particular send should be randomly delayed (the
/// delayable-message manager is an external collaborator, §6).
#[derive(Copy, Clone, Debug)]
pub struct SendContext {
    pub dst: Address,
    pub app_idx: Option<u16>,
    pub is_dev_key: bool,
    pub friendship_cred: bool,
    pub ttl: Option<u8>,
    pub rnd_delay: bool,
}

/// `op_agg_{srv|cli}_accept` / `_send` (§6) — a server or client op
/// aggregator that may intercept a send bound for the transport and fold it
/// into an in-flight aggregated response instead. Returns `Some(result)`
/// when it accepted the message, `None` to let it fall through to the
/// ordinary send path.
pub trait OpAggregator {
    fn accept(&mut self, ctx: &SendContext, msg: &[u8]) -> Option<Result<(), AccessError>>;
}

/// No-op aggregator for integrators that haven't wired one up.
pub struct NoOpAggregator;

impl OpAggregator for NoOpAggregator {
    fn accept(&mut self, _ctx: &SendContext, _msg: &[u8]) -> Option<Result<(), AccessError>> {
        None
    }
}

/// The delayable-message buffer (§6) a send is diverted to when
/// `ctx.rnd_delay` is set and the destination isn't our own unicast
/// loopback.
pub trait DelayableQueue {
    fn enqueue(&mut self, ctx: &SendContext, msg: &[u8]) -> Result<(), AccessError>;
}

/// `bt_mesh_model_send`.
///
/// 1. If `op_agg` accepts the message, its result is returned directly.
/// 2. Otherwise the model must be bound to `ctx.app_idx`/device key.
/// 3. A random-delay request not targeting our own unicast address is
///    diverted to `delayable` instead of sent directly.
/// 4. Everything else goes straight to `transport`, sourced from the
///    model's element address.
pub fn model_send<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    flat: usize,
    ctx: &SendContext,
    msg: &[u8],
    op_agg: &mut impl OpAggregator,
    delayable: &mut impl DelayableQueue,
    transport: &mut impl Transport,
) -> Result<(), AccessError> {
    if let Some(result) = op_agg.accept(ctx, msg) {
        return result;
    }

    let rt = registry.runtime(flat).ok_or(AccessError::NotFound)?;
    if !rt.has_key(ctx.app_idx, ctx.is_dev_key) {
        return Err(AccessError::InvalidArgument);
    }

    let elem_addr = registry.element_address(rt.elem_idx).ok_or(AccessError::AddressUnassigned)?;

    if ctx.rnd_delay && !is_loopback(registry, ctx.dst) {
        return delayable.enqueue(ctx, msg);
    }

    let Address::Unicast(src) = elem_addr else { return Err(AccessError::AddressUnassigned) };
    transport.send(src, msg)
}

/// `bt_mesh_has_addr` used inline — a unicast destination that is one of
/// our own element addresses counts as loopback and bypasses the delayable
/// diversion.
fn is_loopback<const E: usize, const M: usize, const KEYS: usize, const GROUPS: usize, const LABELS: usize>(
    registry: &CompositionRegistry<E, M, KEYS, GROUPS, LABELS>,
    dst: Address,
) -> bool {
    matches!(dst, Address::Unicast(_)) && registry.has_addr(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{CompositionDescriptor, Features, ModelDescriptor};
    use btmesh_common::location::UNKNOWN;
    use btmesh_common::{CompanyIdentifier, ModelIdentifier, ProductIdentifier, VersionIdentifier};
    use core::cell::RefCell;

    struct RecordingTransport {
        sent: RefCell<Option<(UnicastAddress, heapless::Vec<u8, 16>)>>,
    }

    impl Transport for RecordingTransport {
        fn send(&mut self, src: UnicastAddress, sdu: &[u8]) -> Result<(), AccessError> {
            let mut v = heapless::Vec::new();
            v.extend_from_slice(sdu).unwrap();
            *self.sent.borrow_mut() = Some((src, v));
            Ok(())
        }
    }

    struct RejectingQueue;
    impl DelayableQueue for RejectingQueue {
        fn enqueue(&mut self, _ctx: &SendContext, _msg: &[u8]) -> Result<(), AccessError> {
            Err(AccessError::NotSupported)
        }
    }

    fn provisioned_registry() -> CompositionRegistry<1, 1, 2, 2, 2> {
        let mut d: CompositionDescriptor<1, 1> =
            CompositionDescriptor::new(CompanyIdentifier(0), ProductIdentifier(0), VersionIdentifier(0), 0, Features::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        let mut reg = CompositionRegistry::register(d).unwrap();
        reg.provision(UnicastAddress::new(0x0001).unwrap());
        reg
    }

    #[test]
    fn rejects_unbound_model() {
        let reg = provisioned_registry();
        let ctx = SendContext { dst: Address::Unicast(UnicastAddress::new(0x0002).unwrap()), app_idx: Some(0), is_dev_key: false, friendship_cred: false, ttl: None, rnd_delay: false };
        let mut transport = RecordingTransport { sent: RefCell::new(None) };
        let mut queue = RejectingQueue;
        let mut agg = NoOpAggregator;
        let err = model_send(&reg, 0, &ctx, &[1, 2, 3], &mut agg, &mut queue, &mut transport).unwrap_err();
        assert_eq!(err, AccessError::InvalidArgument);
    }

    #[test]
    fn sends_directly_when_bound_and_no_delay() {
        let mut reg = provisioned_registry();
        reg.runtime_mut(0).unwrap().keys.push(crate::composition::BoundKey::App(0)).unwrap();
        let ctx = SendContext { dst: Address::Unicast(UnicastAddress::new(0x0002).unwrap()), app_idx: Some(0), is_dev_key: false, friendship_cred: false, ttl: None, rnd_delay: false };
        let mut transport = RecordingTransport { sent: RefCell::new(None) };
        let mut queue = RejectingQueue;
        let mut agg = NoOpAggregator;
        model_send(&reg, 0, &ctx, &[1, 2, 3], &mut agg, &mut queue, &mut transport).unwrap();
        assert_eq!(transport.sent.borrow().as_ref().unwrap().0, UnicastAddress::new(0x0001).unwrap());
    }

    #[test]
    fn diverts_to_delayable_queue_for_non_loopback_random_delay() {
        let mut reg = provisioned_registry();
        reg.runtime_mut(0).unwrap().keys.push(crate::composition::BoundKey::App(0)).unwrap();
        let ctx = SendContext { dst: Address::Unicast(UnicastAddress::new(0x0002).unwrap()), app_idx: Some(0), is_dev_key: false, friendship_cred: false, ttl: None, rnd_delay: true };
        let mut transport = RecordingTransport { sent: RefCell::new(None) };
        let mut queue = RejectingQueue;
        let mut agg = NoOpAggregator;
        let err = model_send(&reg, 0, &ctx, &[1, 2, 3], &mut agg, &mut queue, &mut transport).unwrap_err();
        assert_eq!(err, AccessError::NotSupported);
        assert!(transport.sent.borrow().is_none());
    }

    #[test]
    fn loopback_bypasses_delayable_diversion() {
        let mut reg = provisioned_registry();
        reg.runtime_mut(0).unwrap().keys.push(crate::composition::BoundKey::App(0)).unwrap();
        let ctx = SendContext { dst: Address::Unicast(UnicastAddress::new(0x0001).unwrap()), app_idx: Some(0), is_dev_key: false, friendship_cred: false, ttl: None, rnd_delay: true };
        let mut transport = RecordingTransport { sent: RefCell::new(None) };
        let mut queue = RejectingQueue;
        let mut agg = NoOpAggregator;
        model_send(&reg, 0, &ctx, &[1, 2, 3], &mut agg, &mut queue, &mut transport).unwrap();
        assert!(transport.sent.borrow().is_some());
    }
}
