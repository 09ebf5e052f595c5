//! Breadth-first resource tree builder.
//!
//! Materializes the whole hierarchy below an auth context with one batched
//! round trip per tree generation (more only when a generation is larger
//! than the batch size), rather than one round trip per node.
//!
//! Nodes live in an arena while the tree is built; a node refers to its
//! parent by arena index only. Once every generation is resolved the arena
//! is folded into an owned [`TreeNode`] hierarchy.

use exo_core::{Auth, InfoOptions, ListingOptions, ResourceId, ResourceSelector, ResourceType};
use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::{dispatch, CommandSet, DEFAULT_BATCH_SIZE};
use crate::{Command, Error, Executor, Response, Result, Transport};

/// What the builder asks about each node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeOptions {
    /// Options for every `info` command
    pub info: InfoOptions,
    /// Options for every `listing` command
    pub listing: ListingOptions,
    /// Child types to list, in the order children are kept
    pub types: Vec<ResourceType>,
    /// Nodes per round trip
    pub batch_size: usize,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            info: InfoOptions::default(),
            listing: ListingOptions::default(),
            types: ResourceType::ALL.to_vec(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Metadata of a node, or the status its info command failed with.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeInfo {
    /// Info object returned by the server
    Resolved(Value),
    /// The info command failed
    Failed(String),
}

impl NodeInfo {
    /// The info object, if it was resolved.
    pub fn value(&self) -> Option<&Value> {
        match self {
            NodeInfo::Resolved(v) => Some(v),
            NodeInfo::Failed(_) => None,
        }
    }
}

/// A resolved resource and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Id after the caller's id hook
    pub id: ResourceId,
    /// Resource kind
    pub kind: ResourceType,
    /// Metadata
    pub info: NodeInfo,
    /// Children in listing order
    pub children: Vec<TreeNode>,
    /// Status of a failed listing; `children` is empty when set
    pub listing_error: Option<String>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including this one.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// Always false; a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Depth-first search for a node by id.
    pub fn find(&self, id: &ResourceId) -> Option<&TreeNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// A node handed to the visit hook, after its info and listing resolved.
#[derive(Debug)]
pub struct NodeVisit<'n> {
    /// Id after the caller's id hook
    pub id: &'n ResourceId,
    /// Resource kind
    pub kind: ResourceType,
    /// Metadata
    pub info: &'n NodeInfo,
    /// Rids of the node's children, in listing order
    pub children: Vec<&'n ResourceId>,
    /// Status of a failed listing
    pub listing_error: Option<&'n str>,
    /// Generation number; the root is level 0
    pub level: usize,
    /// Id of the parent, `None` for the root
    pub parent: Option<&'n ResourceId>,
}

struct ArenaNode {
    /// Rid used to address the node; unknown only for the root
    rid: Option<ResourceId>,
    /// Rid after the caller's hook
    id: Option<ResourceId>,
    kind: ResourceType,
    info: Option<NodeInfo>,
    listing_error: Option<String>,
    children: Vec<usize>,
    parent: Option<usize>,
}

impl ArenaNode {
    fn placeholder(rid: Option<ResourceId>, kind: ResourceType, parent: Option<usize>) -> Self {
        Self {
            rid,
            id: None,
            kind,
            info: None,
            listing_error: None,
            children: Vec::new(),
            parent,
        }
    }
}

/// Positions of each command inside a node's command set.
#[derive(Debug, Clone, Copy)]
struct NodePlan {
    index: usize,
    lookup_at: Option<usize>,
    listing_at: Option<usize>,
}

/// Builds the resource tree of one auth context.
pub struct TreeBuilder<'a, T> {
    executor: &'a Executor<T>,
    auth: &'a Auth,
    options: TreeOptions,
}

impl<'a, T: Transport> TreeBuilder<'a, T> {
    /// Prepare a build.
    pub fn new(executor: &'a Executor<T>, auth: &'a Auth, options: TreeOptions) -> Self {
        Self {
            executor,
            auth,
            options,
        }
    }

    /// Build the whole tree.
    ///
    /// `node_id` receives each node's rid and info and returns the id stored
    /// in the tree; returning an error aborts the build. `visit` is called
    /// once per node, generation by generation, after the node's info and
    /// listing are known and before its children are fetched.
    pub fn build<F, V>(&self, mut node_id: F, mut visit: V) -> Result<TreeNode>
    where
        F: FnMut(&ResourceId, &NodeInfo) -> Result<ResourceId>,
        V: FnMut(&NodeVisit<'_>),
    {
        let mut arena = vec![ArenaNode::placeholder(None, ResourceType::Client, None)];
        let mut generation = vec![0usize];
        let mut level = 0usize;

        while !generation.is_empty() {
            debug!(
                target: "exo::tree",
                level,
                nodes = generation.len(),
                "Resolving generation"
            );

            let sets: Vec<CommandSet<NodePlan>> = generation
                .iter()
                .map(|&index| self.command_set(&arena[index], index))
                .collect();

            let mut next = Vec::new();
            for completed in dispatch(self.executor, self.auth, sets, self.options.batch_size) {
                let completed = completed?;
                self.resolve(
                    &mut arena,
                    completed.context,
                    completed.responses,
                    &mut node_id,
                )?;
                next.extend(arena[completed.context.index].children.iter().copied());
            }

            for &index in &generation {
                let node = &arena[index];
                if let (Some(id), Some(info)) = (node.id.as_ref(), node.info.as_ref()) {
                    let children = node
                        .children
                        .iter()
                        .filter_map(|&c| arena[c].rid.as_ref())
                        .collect();
                    let parent = node.parent.and_then(|p| arena[p].id.as_ref());
                    visit(&NodeVisit {
                        id,
                        kind: node.kind,
                        info,
                        children,
                        listing_error: node.listing_error.as_deref(),
                        level,
                        parent,
                    });
                }
            }

            generation = next;
            level += 1;
        }

        assemble(arena)
    }

    fn command_set(&self, node: &ArenaNode, index: usize) -> CommandSet<NodePlan> {
        let selector = match &node.rid {
            Some(rid) => ResourceSelector::Rid(rid.clone()),
            None => ResourceSelector::own(),
        };
        let mut commands = vec![Command::info(selector.clone(), self.options.info.clone())];
        let mut plan = NodePlan {
            index,
            lookup_at: None,
            listing_at: None,
        };
        if node.rid.is_none() {
            plan.lookup_at = Some(commands.len());
            commands.push(Command::lookup_self());
        }
        if node.kind.is_container() {
            plan.listing_at = Some(commands.len());
            commands.push(Command::listing(
                self.options.types.clone(),
                self.options.listing.clone(),
                selector,
            ));
        }
        CommandSet::new(commands, plan)
    }

    fn resolve<F>(
        &self,
        arena: &mut Vec<ArenaNode>,
        plan: NodePlan,
        responses: Vec<Response>,
        node_id: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&ResourceId, &NodeInfo) -> Result<ResourceId>,
    {
        let info = match responses.first() {
            Some(Response::Ok(v)) => NodeInfo::Resolved(v.clone()),
            Some(Response::Failed(status)) => {
                warn!(target: "exo::tree", status = %status, "Info failed");
                NodeInfo::Failed(status.clone())
            }
            None => return Err(Error::malformed("info", "missing response")),
        };

        if let Some(at) = plan.lookup_at {
            let rid = match responses.get(at) {
                Some(Response::Ok(Value::String(s))) => ResourceId::parse(s)?,
                Some(Response::Ok(other)) => {
                    return Err(Error::malformed("lookup", format!("not a rid: {}", other)))
                }
                Some(Response::Failed(status)) => {
                    return Err(Error::Command {
                        command: Box::new(Command::lookup_self()),
                        result: Value::String(status.clone()),
                    })
                }
                None => return Err(Error::malformed("lookup", "missing response")),
            };
            arena[plan.index].rid = Some(rid);
        }

        let rid = arena[plan.index]
            .rid
            .clone()
            .ok_or_else(|| Error::malformed("lookup", "root rid unresolved"))?;
        arena[plan.index].id = Some(node_id(&rid, &info)?);
        arena[plan.index].info = Some(info);

        if let Some(at) = plan.listing_at {
            match responses.get(at) {
                Some(Response::Ok(listing)) => {
                    for (kind, child) in parse_listing(listing, &self.options.types)? {
                        let child_index = arena.len();
                        arena.push(ArenaNode::placeholder(Some(child), kind, Some(plan.index)));
                        arena[plan.index].children.push(child_index);
                    }
                }
                Some(Response::Failed(status)) => {
                    warn!(target: "exo::tree", rid = %rid, status = %status, "Listing failed");
                    arena[plan.index].listing_error = Some(status.clone());
                }
                None => return Err(Error::malformed("listing", "missing response")),
            }
        }
        Ok(())
    }
}

/// Flatten a listing result into `(type, rid)` pairs in type order.
pub(crate) fn parse_listing(
    listing: &Value,
    types: &[ResourceType],
) -> Result<Vec<(ResourceType, ResourceId)>> {
    let object = listing
        .as_object()
        .ok_or_else(|| Error::malformed("listing", "expected an object keyed by type"))?;
    let mut out = Vec::new();
    for kind in types {
        let Some(rids) = object.get(kind.as_str()) else {
            continue;
        };
        let rids = rids
            .as_array()
            .ok_or_else(|| Error::malformed("listing", format!("{} is not a list", kind)))?;
        for rid in rids {
            let rid = rid
                .as_str()
                .ok_or_else(|| Error::malformed("listing", "rid is not a string"))?;
            out.push((*kind, ResourceId::parse(rid)?));
        }
    }
    Ok(out)
}

/// Fold the arena into owned nodes.
///
/// Children are always pushed after their parent, so walking indices from
/// the back finishes every child before its parent needs it.
fn assemble(arena: Vec<ArenaNode>) -> Result<TreeNode> {
    let mut built: Vec<Option<TreeNode>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);

    for (index, node) in arena.into_iter().enumerate().rev() {
        let children = node
            .children
            .iter()
            .map(|&c| {
                built[c]
                    .take()
                    .ok_or_else(|| Error::malformed("listing", "child resolved out of order"))
            })
            .collect::<Result<Vec<_>>>()?;
        let (Some(id), Some(info)) = (node.id, node.info) else {
            return Err(Error::malformed("info", "node left unresolved"));
        };
        built[index] = Some(TreeNode {
            id,
            kind: node.kind,
            info,
            children,
            listing_error: node.listing_error,
        });
    }

    built
        .into_iter()
        .next()
        .flatten()
        .ok_or_else(|| Error::malformed("info", "empty tree"))
}
