//! Tests for breadth-first tree building.

use std::sync::Arc;

use exo_core::{Auth, ResourceId, ResourceType};
use serde_json::json;

use super::Fixture;
use crate::{
    CallRecord, Command, Deferred, Error, Executor, MemoryStore, NodeInfo, Result, Rpc,
    TreeBuilder, TreeOptions,
};

/// Replaces the outcome of chosen commands with a failure status.
struct Tamper<F> {
    inner: Arc<MemoryStore>,
    fail: F,
}

impl<F: Fn(&Command) -> Option<&'static str>> Rpc for Tamper<F> {
    fn call(&self, auth: &Auth, commands: &[Command]) -> Result<Vec<CallRecord>> {
        let records = self.inner.call(auth, commands)?;
        Ok(records
            .into_iter()
            .map(|r| match (self.fail)(&r.command) {
                Some(status) => CallRecord::failed(r.command, status),
                None => r,
            })
            .collect())
    }
}

#[derive(Debug, PartialEq)]
struct Visited {
    id: ResourceId,
    level: usize,
    parent: Option<ResourceId>,
    children: usize,
}

fn build_and_visit<T: crate::Transport>(
    executor: &Executor<T>,
    auth: &Auth,
    options: TreeOptions,
) -> (crate::TreeNode, Vec<Visited>) {
    let mut visited = Vec::new();
    let tree = TreeBuilder::new(executor, auth, options)
        .build(
            |rid, _| Ok(rid.clone()),
            |node| {
                visited.push(Visited {
                    id: node.id.clone(),
                    level: node.level,
                    parent: node.parent.cloned(),
                    children: node.children.len(),
                })
            },
        )
        .unwrap();
    (tree, visited)
}

#[test]
fn test_root_with_leaves_takes_two_round_trips() {
    let fx = Fixture::new();
    let leaves: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| fx.dataport(name, 1..=3))
        .collect();
    let executor = fx.executor();

    let (tree, visited) = build_and_visit(&executor, &fx.auth, TreeOptions::default());

    assert_eq!(fx.store.calls(), 2);
    assert_eq!(tree.id, fx.root);
    assert_eq!(tree.kind, ResourceType::Client);
    assert_eq!(
        tree.children.iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
        leaves
    );
    assert_eq!(visited.len(), 4);
    assert_eq!(
        visited[0],
        Visited {
            id: fx.root.clone(),
            level: 0,
            parent: None,
            children: 3
        }
    );
    for (v, leaf) in visited[1..].iter().zip(&leaves) {
        assert_eq!(v.id, *leaf);
        assert_eq!(v.level, 1);
        assert_eq!(v.parent.as_ref(), Some(&fx.root));
        assert_eq!(v.children, 0);
    }
}

#[test]
fn test_first_round_trip_resolves_root() {
    let fx = Fixture::new();
    fx.dataport("a", 1..=3);
    let executor = fx.executor();

    build_and_visit(&executor, &fx.auth, TreeOptions::default());

    let log = fx.store.call_log();
    let procedures: Vec<_> = log[0].iter().map(Command::procedure).collect();
    assert_eq!(procedures, vec!["info", "lookup", "listing"]);
    // Leaves are never listed
    assert!(log[1].iter().all(|c| c.procedure() == "info"));
}

#[test]
fn test_nested_clients_one_round_trip_per_generation() {
    let fx = Fixture::new();
    let child = fx
        .store
        .create(&fx.root, ResourceType::Client, "child")
        .unwrap();
    let port = fx.dataport("port", 1..=2);
    let grandchild = fx
        .store
        .create(&child, ResourceType::Datarule, "rule")
        .unwrap();
    let executor = fx.executor();

    let (tree, visited) = build_and_visit(&executor, &fx.auth, TreeOptions::default());

    assert_eq!(fx.store.calls(), 3);
    assert_eq!(tree.len(), 4);
    // Clients are listed before dataports
    assert_eq!(tree.children[0].id, child);
    assert_eq!(tree.children[1].id, port);
    assert_eq!(tree.children[0].children[0].id, grandchild);
    assert_eq!(tree.find(&grandchild).unwrap().kind, ResourceType::Datarule);

    let levels: Vec<_> = visited.iter().map(|v| v.level).collect();
    assert_eq!(levels, vec![0, 1, 1, 2]);
    assert_eq!(visited[3].parent, Some(child));
}

#[test]
fn test_generation_larger_than_batch_is_split() {
    let fx = Fixture::new();
    for i in 0..5 {
        fx.dataport(&format!("p{}", i), 1..=1);
    }
    let executor = fx.executor();
    let options = TreeOptions {
        batch_size: 2,
        ..TreeOptions::default()
    };

    let (tree, visited) = build_and_visit(&executor, &fx.auth, options);

    // 1 for the root, ceil(5 / 2) for the leaves
    assert_eq!(fx.store.calls(), 4);
    assert_eq!(tree.children.len(), 5);
    assert_eq!(visited.len(), 6);
}

#[test]
fn test_tree_of_child_context() {
    let fx = Fixture::new();
    let child = fx
        .store
        .create(&fx.root, ResourceType::Client, "child")
        .unwrap();
    fx.dataport("outside", 1..=1);
    let executor = fx.executor();

    let auth = fx.auth.as_client(child.clone());
    let (tree, _) = build_and_visit(&executor, &auth, TreeOptions::default());

    assert_eq!(tree.id, child);
    assert!(tree.children.is_empty());
}

#[test]
fn test_info_failure_is_kept_on_node() {
    let fx = Fixture::new();
    let hidden = fx.dataport("hidden", 1..=1);
    let target = hidden.clone();
    let rpc = Tamper {
        inner: Arc::clone(&fx.store),
        fail: move |c: &Command| match c {
            Command::Info { rid, .. } if rid.rid() == Some(&target) => Some("restricted"),
            _ => None,
        },
    };
    let executor = Executor::new(Deferred::new(rpc));

    let (tree, visited) = build_and_visit(&executor, &fx.auth, TreeOptions::default());

    assert_eq!(tree.children[0].info, NodeInfo::Failed("restricted".into()));
    assert!(tree.children[0].info.value().is_none());
    assert!(tree.info.value().is_some());
    assert_eq!(visited.len(), 2);
}

#[test]
fn test_listing_failure_leaves_node_childless() {
    let fx = Fixture::new();
    let child = fx
        .store
        .create(&fx.root, ResourceType::Client, "child")
        .unwrap();
    fx.store
        .create(&child, ResourceType::Dataport, "unseen")
        .unwrap();
    let target = child.clone();
    let rpc = Tamper {
        inner: Arc::clone(&fx.store),
        fail: move |c: &Command| match c {
            Command::Listing { rid, .. } if rid.rid() == Some(&target) => Some("restricted"),
            _ => None,
        },
    };
    let executor = Executor::new(Deferred::new(rpc));

    let (tree, _) = build_and_visit(&executor, &fx.auth, TreeOptions::default());

    let node = tree.find(&child).unwrap();
    assert!(node.children.is_empty());
    assert_eq!(node.listing_error.as_deref(), Some("restricted"));
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_failed_root_lookup_aborts() {
    let fx = Fixture::new();
    let executor = fx.executor();

    let err = TreeBuilder::new(&executor, &Auth::cik("nobody"), TreeOptions::default())
        .build(|rid, _| Ok(rid.clone()), |_| {})
        .unwrap_err();

    assert!(matches!(err, Error::Command { .. }));
}

#[test]
fn test_transport_failure_aborts() {
    let fx = Fixture::new();
    fx.dataport("a", 1..=1);
    let executor = fx.executor();
    fx.store.fail_on_call(2);

    let err = TreeBuilder::new(&executor, &fx.auth, TreeOptions::default())
        .build(|rid, _| Ok(rid.clone()), |_| {})
        .unwrap_err();

    assert!(err.is_transport());
}

#[test]
fn test_node_id_hook_renames_nodes() {
    let fx = Fixture::new();
    let port = fx.dataport("a", 1..=1);
    let executor = fx.executor();
    let renamed = ResourceId::parse(&"f".repeat(40)).unwrap();
    let mut parents = Vec::new();

    let tree = TreeBuilder::new(&executor, &fx.auth, TreeOptions::default())
        .build(
            |rid, info| {
                if rid == &fx.root {
                    assert_eq!(info.value().unwrap()["basic"]["type"], json!("client"));
                    Ok(renamed.clone())
                } else {
                    Ok(rid.clone())
                }
            },
            |node| parents.push(node.parent.cloned()),
        )
        .unwrap();

    assert_eq!(tree.id, renamed);
    assert_eq!(tree.children[0].id, port);
    assert_eq!(parents, vec![None, Some(renamed)]);
}

#[test]
fn test_node_id_hook_error_aborts() {
    let fx = Fixture::new();
    let port = fx.dataport("a", 1..=1);
    let executor = fx.executor();
    let mut visits = 0;

    let err = TreeBuilder::new(&executor, &fx.auth, TreeOptions::default())
        .build(
            |rid, _| {
                if rid == &port {
                    Err(Error::invalid_input("rejected"))
                } else {
                    Ok(rid.clone())
                }
            },
            |_| visits += 1,
        )
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput { .. }));
    assert_eq!(visits, 1);
}

#[test]
fn test_listing_types_limit_children() {
    let fx = Fixture::new();
    fx.store
        .create(&fx.root, ResourceType::Client, "child")
        .unwrap();
    fx.dataport("port", 1..=1);
    let executor = fx.executor();
    let options = TreeOptions {
        types: vec![ResourceType::Dataport],
        ..TreeOptions::default()
    };

    let (tree, _) = build_and_visit(&executor, &fx.auth, options);

    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].kind, ResourceType::Dataport);
}
