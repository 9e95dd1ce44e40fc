//! Cross-module integration scenarios from `spec.md` §8, exercised end to
//! end through the public API rather than against one module's internals.

use btmesh_access::composition::{
    BoundKey, CompositionDescriptor, CompositionRegistry, Features, ModelDescriptor, ModelRef, Slot,
};
use btmesh_access::dispatch::{access_recv, DecodedOpcode, LengthContract, OpcodeEntry, RecvContext};
use btmesh_access::error::DispatchStatus;
use btmesh_access::high_pages::{elem_size_cdp128, HighPageKind, HighPagesStore};
use btmesh_access::pages::get_page0;
use btmesh_access::relations::RelationGraph;
use btmesh_common::address::{Address, GroupAddress, UnicastAddress};
use btmesh_common::location::UNKNOWN;
use btmesh_common::{CompanyIdentifier, ModelIdentifier, ProductIdentifier, VersionIdentifier};

type Registry = CompositionRegistry<2, 2, 4, 4, 2>;

fn two_element_node() -> Registry {
    let mut d: CompositionDescriptor<2, 2> = CompositionDescriptor::new(
        CompanyIdentifier(0x01AB),
        ProductIdentifier(0x0002),
        VersionIdentifier(0x0003),
        5,
        Features { relay: true, ..Default::default() },
    );
    let e0 = d.push_element(UNKNOWN).unwrap();
    d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
    let e1 = d.push_element(UNKNOWN).unwrap();
    d.push_model(e1, ModelDescriptor::new(ModelIdentifier::SIG(0x1001))).unwrap();
    let mut reg = CompositionRegistry::register(d).unwrap();
    reg.provision(UnicastAddress::new(0x0010).unwrap());
    reg
}

// Scenario 1 (§8): one-element, one-SIG-model page 0 matches a known byte
// layout. Built here on the two-element fixture, checked against a
// single-element composition instead so the expected bytes stay simple.
#[test]
fn page0_matches_known_layout() {
    let mut d: CompositionDescriptor<1, 1> = CompositionDescriptor::new(
        CompanyIdentifier(0x01AB),
        ProductIdentifier(0x0002),
        VersionIdentifier(0x0003),
        5,
        Features { relay: true, ..Default::default() },
    );
    let e0 = d.push_element(UNKNOWN).unwrap();
    d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
    let reg: CompositionRegistry<1, 1, 1, 1, 1> = CompositionRegistry::register(d).unwrap();

    let mut out = [0u8; 32];
    let result = get_page0(&reg, 0, &mut out, true);
    let expected: [u8; 16] = [0xAB, 0x01, 0x02, 0x00, 0x03, 0x00, 0x05, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x10];
    assert_eq!(&out[..result.written()], &expected);
}

// Scenario 3 (§8): a model bound only to app-key 7 rejects a message
// carrying app-key 3 with WRONG_KEY, but accepts its own key.
#[test]
fn dispatch_wrong_key_then_success() {
    let mut reg = two_element_node();
    reg.runtime_mut(0).unwrap().keys.push(BoundKey::App(7)).unwrap();
    let graph: RelationGraph<4> = RelationGraph::default();
    let elem0_addr = Address::Unicast(UnicastAddress::new(0x0010).unwrap());

    let table: &[OpcodeEntry] = &[OpcodeEntry { opcode: DecodedOpcode::OneOctet(0x52), contract: LengthContract::AtLeast(0) }];
    let opcode_table = |flat: usize| if flat == 0 { table } else { &[] as &[OpcodeEntry] };

    let wrong_key_ctx = RecvContext { dst: elem0_addr, app_idx: Some(3), is_dev_key: false, label_idx: None };
    let status = access_recv(&reg, &graph, &Default::default(), &[0x52], &wrong_key_ctx, opcode_table, |_| Ok(()), None);
    assert_eq!(status, DispatchStatus::WrongKey);

    let right_key_ctx = RecvContext { dst: elem0_addr, app_idx: Some(7), is_dev_key: false, label_idx: None };
    let status = access_recv(&reg, &graph, &Default::default(), &[0x52], &right_key_ctx, opcode_table, |_| Ok(()), None);
    assert_eq!(status, DispatchStatus::Success);
}

// Extension ring subscription lookup (§4.5): a group subscribed on the base
// model of an extension ring is visible to the extending model's dispatch,
// as long as both are on the same element.
#[test]
fn extension_shares_subscription_within_element() {
    let mut reg: CompositionRegistry<1, 2, 2, 2, 2> = {
        let mut d: CompositionDescriptor<1, 2> =
            CompositionDescriptor::new(CompanyIdentifier(0), ProductIdentifier(0), VersionIdentifier(0), 0, Default::default());
        let e0 = d.push_element(UNKNOWN).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1000))).unwrap();
        d.push_model(e0, ModelDescriptor::new(ModelIdentifier::SIG(0x1001))).unwrap();
        CompositionRegistry::register(d).unwrap()
    };
    reg.provision(UnicastAddress::new(0x0001).unwrap());

    let base = ModelRef { elem_idx: 0, mod_idx: 0 };
    let ext = ModelRef { elem_idx: 0, mod_idx: 1 };
    let mut graph: RelationGraph<4> = RelationGraph::default();
    graph.extend(&mut reg, ext, base).unwrap();

    reg.runtime_mut(0).unwrap().groups.push(Slot::Used(Address::Group(GroupAddress::Normal(0xC100)))).unwrap();
    reg.runtime_mut(1).unwrap().keys.push(BoundKey::App(0)).unwrap();

    let table: &[OpcodeEntry] = &[OpcodeEntry { opcode: DecodedOpcode::OneOctet(0x10), contract: LengthContract::AtLeast(0) }];
    let opcode_table = |flat: usize| if flat == 1 { table } else { &[] as &[OpcodeEntry] };
    let ctx = RecvContext { dst: Address::Group(GroupAddress::Normal(0xC100)), app_idx: Some(0), is_dev_key: false, label_idx: None };
    let status = access_recv(&reg, &graph, &Default::default(), &[0x10], &ctx, opcode_table, |_| Ok(()), None);
    assert_eq!(status, DispatchStatus::Success);
}

// Scenario 5 (§8): staging page 128 identical to the live page 0 collapses
// to the 1-byte sentinel; `comp_128_changed` stays true because a record
// exists even though its effective size is 0.
#[test]
fn high_page_sentinel_collapse_against_live_page0() {
    let reg = two_element_node();
    let mut live = [0u8; 128];
    let written = get_page0(&reg, 0, &mut live, true).written();

    let mut store: HighPagesStore<128> = HighPagesStore::default();
    store.record_mut(HighPageKind::Composition128).write(&live[..written], &live[..written]).unwrap();

    assert_eq!(store.record(HighPageKind::Composition128).size(), 0);
    assert!(store.comp_128_changed());
    assert_eq!(store.comp_128_elem_count(reg.element_count()), reg.element_count());

    let mut out = [0u8; 128];
    let n = store.record(HighPageKind::Composition128).read(0, &mut out, true, elem_size_cdp128).unwrap();
    assert_eq!(n, 0);
}
