//! Tree building over a multi-level hierarchy.

use exoquery::{NodeInfo, ResourceType, TreeOptions};
use serde_json::json;

use crate::common::Portal;

#[test]
fn whole_portal_in_one_round_trip_per_level() {
    let portal = Portal::new();
    let client = portal.client();
    let mut levels = Vec::new();

    let tree = client
        .tree(
            &portal.auth,
            client.tree_options(),
            |rid, _| Ok(rid.clone()),
            |node| levels.push((node.level, node.kind)),
        )
        .unwrap();

    assert_eq!(portal.store.calls(), 3);
    assert_eq!(tree.len(), 7);
    assert_eq!(tree.id, portal.portal);
    assert_eq!(
        levels,
        vec![
            (0, ResourceType::Client),
            (1, ResourceType::Client),
            (1, ResourceType::Client),
            (1, ResourceType::Dataport),
            (2, ResourceType::Dataport),
            (2, ResourceType::Dataport),
            (2, ResourceType::Dataport),
        ]
    );
    for series in &portal.series {
        assert!(tree.find(series).is_some());
    }
}

#[test]
fn device_info_carries_aliases() {
    let portal = Portal::new();
    let client = portal.client();

    let tree = client
        .tree(
            &portal.auth,
            TreeOptions::default(),
            |rid, _| Ok(rid.clone()),
            |_| {},
        )
        .unwrap();

    let device = tree.find(&portal.devices[0]).unwrap();
    let NodeInfo::Resolved(info) = &device.info else {
        panic!("device info should resolve");
    };
    assert_eq!(
        info["aliases"][portal.series[0].as_str()],
        json!(["temp"])
    );
    assert_eq!(info["description"]["name"], json!("device-1"));
}

#[test]
fn subtree_of_device_context() {
    let portal = Portal::new();
    let client = portal.client();
    let device_auth = portal.auth.as_client(portal.devices[1].clone());

    let tree = client
        .tree(
            &device_auth,
            client.tree_options(),
            |rid, _| Ok(rid.clone()),
            |_| {},
        )
        .unwrap();

    assert_eq!(tree.id, portal.devices[1]);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.children[0].id, portal.series[2]);
}
