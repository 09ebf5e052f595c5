//! In-memory remote store.
//!
//! [`MemoryStore`] implements [`Rpc`] over a resource hierarchy held in
//! process memory. It answers the same procedures the engine issues against
//! a real server (read, write, record, flush, info, listing, lookup, drop) with the
//! same status codes, records every call it receives, and can be told to
//! fail a given call at the transport level.
//!
//! # Example
//!
//! ```ignore
//! use exo_executor::{Client, Deferred, MemoryStore};
//! use exo_core::{Auth, Point, ResourceType};
//!
//! let store = MemoryStore::new();
//! let (root, cik) = store.create_root("device");
//! let temp = store.create(&root, ResourceType::Dataport, "temp")?;
//! store.record(&temp, vec![Point::new(1, 20.5), Point::new(2, 21.0)])?;
//!
//! let client = Client::new(Deferred::new(store));
//! let auth = Auth::cik(cik);
//! ```

use std::collections::{BTreeMap, HashMap};

use exo_core::{
    Auth, InfoOptions, Point, ReadOptions, ResourceId, ResourceSelector, ResourceType, SortOrder,
    Timestamp,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crate::{CallRecord, Command, Error, LookupKind, Result, Rpc};

/// Status for malformed or dangling arguments.
pub const STATUS_INVALID: &str = "invalid";
/// Status for resources outside the caller's hierarchy.
pub const STATUS_RESTRICTED: &str = "restricted";
/// Status for an unknown key.
pub const STATUS_AUTH: &str = "auth";

struct StoredResource {
    kind: ResourceType,
    name: String,
    parent: Option<ResourceId>,
    children: Vec<ResourceId>,
    aliases: BTreeMap<String, ResourceId>,
    key: Option<String>,
    points: BTreeMap<Timestamp, Value>,
}

#[derive(Default)]
struct StoreState {
    resources: HashMap<ResourceId, StoredResource>,
    keys: HashMap<String, ResourceId>,
    shares: HashMap<String, ResourceId>,
    next_id: u64,
    calls: u64,
    fail_on_call: Option<u64>,
    log: Vec<Vec<Command>>,
}

/// Resource hierarchy held in memory, answering remote procedures.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

type Outcome = std::result::Result<Value, &'static str>;

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a top-level client. Returns its rid and key.
    pub fn create_root(&self, name: &str) -> (ResourceId, String) {
        let mut state = self.state.lock();
        let rid = state.allocate_rid();
        let key = state.allocate_key();
        state.keys.insert(key.clone(), rid.clone());
        state.resources.insert(
            rid.clone(),
            StoredResource::new(ResourceType::Client, name, None, Some(key.clone())),
        );
        (rid, key)
    }

    /// Create a child resource. Clients get their own key.
    pub fn create(
        &self,
        parent: &ResourceId,
        kind: ResourceType,
        name: &str,
    ) -> Result<ResourceId> {
        let mut state = self.state.lock();
        if !state
            .resources
            .get(parent)
            .is_some_and(|p| p.kind.is_container())
        {
            return Err(Error::invalid_input(format!("{} is not a client", parent)));
        }
        let rid = state.allocate_rid();
        let key = if kind.is_container() {
            let key = state.allocate_key();
            state.keys.insert(key.clone(), rid.clone());
            Some(key)
        } else {
            None
        };
        state.resources.insert(
            rid.clone(),
            StoredResource::new(kind, name, Some(parent.clone()), key),
        );
        if let Some(p) = state.resources.get_mut(parent) {
            p.children.push(rid.clone());
        }
        Ok(rid)
    }

    /// Key of a client.
    pub fn key_of(&self, rid: &ResourceId) -> Option<String> {
        self.state.lock().resources.get(rid).and_then(|r| r.key.clone())
    }

    /// Give `rid` an alias under its parent client.
    pub fn map(&self, rid: &ResourceId, alias: &str) -> Result<()> {
        let mut state = self.state.lock();
        let parent = state
            .resources
            .get(rid)
            .and_then(|r| r.parent.clone())
            .ok_or_else(|| Error::invalid_input(format!("{} has no parent", rid)))?;
        if let Some(p) = state.resources.get_mut(&parent) {
            p.aliases.insert(alias.to_string(), rid.clone());
        }
        Ok(())
    }

    /// Issue a share code that resolves to `rid`.
    pub fn share(&self, rid: &ResourceId) -> Result<String> {
        let mut state = self.state.lock();
        if !state.resources.contains_key(rid) {
            return Err(Error::invalid_input(format!("{} does not exist", rid)));
        }
        state.next_id += 1;
        let code = format!("s{:039x}", state.next_id);
        state.shares.insert(code.clone(), rid.clone());
        Ok(code)
    }

    /// Store points on a dataport or datarule.
    pub fn record(&self, rid: &ResourceId, points: impl IntoIterator<Item = Point>) -> Result<()> {
        let mut state = self.state.lock();
        let resource = state
            .resources
            .get_mut(rid)
            .filter(|r| r.kind.is_readable())
            .ok_or_else(|| Error::invalid_input(format!("{} is not readable", rid)))?;
        for p in points {
            resource.points.insert(p.timestamp, p.value);
        }
        Ok(())
    }

    /// Number of points stored on a resource.
    pub fn point_count(&self, rid: &ResourceId) -> usize {
        self.state
            .lock()
            .resources
            .get(rid)
            .map_or(0, |r| r.points.len())
    }

    /// Whether a resource exists.
    pub fn contains(&self, rid: &ResourceId) -> bool {
        self.state.lock().resources.contains_key(rid)
    }

    /// Make the `n`-th call (1-based, counting every call ever made) fail
    /// at the transport level.
    pub fn fail_on_call(&self, n: u64) {
        self.state.lock().fail_on_call = Some(n);
    }

    /// Number of calls received.
    pub fn calls(&self) -> u64 {
        self.state.lock().calls
    }

    /// Commands of every call received, in order.
    pub fn call_log(&self) -> Vec<Vec<Command>> {
        self.state.lock().log.clone()
    }
}

impl Rpc for MemoryStore {
    fn call(&self, auth: &Auth, commands: &[Command]) -> Result<Vec<CallRecord>> {
        let mut state = self.state.lock();
        state.calls += 1;
        state.log.push(commands.to_vec());
        if state.fail_on_call == Some(state.calls) {
            return Err(Error::transport("connection reset by peer"));
        }

        let caller = state.caller(auth);
        Ok(commands
            .iter()
            .map(|command| {
                let outcome = match &caller {
                    Some(caller) => state.apply(caller, command),
                    None => Err(STATUS_AUTH),
                };
                match outcome {
                    Ok(result) => CallRecord::ok(command.clone(), result),
                    Err(status) => CallRecord::failed(command.clone(), status),
                }
            })
            .collect())
    }
}

impl StoredResource {
    fn new(
        kind: ResourceType,
        name: &str,
        parent: Option<ResourceId>,
        key: Option<String>,
    ) -> Self {
        Self {
            kind,
            name: name.to_string(),
            parent,
            children: Vec::new(),
            aliases: BTreeMap::new(),
            key,
            points: BTreeMap::new(),
        }
    }
}

impl StoreState {
    fn allocate_rid(&mut self) -> ResourceId {
        self.next_id += 1;
        ResourceId::from_index(self.next_id)
    }

    fn allocate_key(&mut self) -> String {
        self.next_id += 1;
        format!("c{:039x}", self.next_id)
    }

    fn caller(&self, auth: &Auth) -> Option<ResourceId> {
        let owner = self.keys.get(&auth.cik)?;
        match &auth.client_id {
            Some(client) if self.is_within(owner, client) => Some(client.clone()),
            Some(_) => None,
            None => Some(owner.clone()),
        }
    }

    /// Whether `rid` is `ancestor` or below it.
    fn is_within(&self, ancestor: &ResourceId, rid: &ResourceId) -> bool {
        let mut current = Some(rid);
        while let Some(r) = current {
            if r == ancestor {
                return true;
            }
            current = self.resources.get(r).and_then(|res| res.parent.as_ref());
        }
        false
    }

    fn resolve(
        &self,
        caller: &ResourceId,
        selector: &ResourceSelector,
    ) -> std::result::Result<ResourceId, &'static str> {
        match selector {
            ResourceSelector::Alias { alias } if alias.is_empty() => Ok(caller.clone()),
            ResourceSelector::Alias { alias } => self
                .resources
                .get(caller)
                .and_then(|c| c.aliases.get(alias))
                .cloned()
                .ok_or(STATUS_INVALID),
            ResourceSelector::Rid(rid) => {
                if !self.resources.contains_key(rid) {
                    Err(STATUS_INVALID)
                } else if self.is_within(caller, rid) {
                    Ok(rid.clone())
                } else {
                    Err(STATUS_RESTRICTED)
                }
            }
        }
    }

    fn apply(&mut self, caller: &ResourceId, command: &Command) -> Outcome {
        match command {
            Command::Read { rid, options } => {
                let rid = self.resolve(caller, rid)?;
                self.read(&rid, options)
            }
            Command::Write { rid, value } => {
                let rid = self.resolve(caller, rid)?;
                let resource = self.readable_mut(&rid)?;
                let t = resource.points.keys().next_back().map_or(1, |t| t + 1);
                resource.points.insert(t, value.clone());
                Ok(Value::Null)
            }
            Command::Record { rid, entries } => {
                let rid = self.resolve(caller, rid)?;
                let resource = self.readable_mut(&rid)?;
                for p in entries {
                    resource.points.insert(p.timestamp, p.value.clone());
                }
                Ok(Value::Null)
            }
            Command::Flush {
                rid,
                newerthan,
                olderthan,
            } => {
                let rid = self.resolve(caller, rid)?;
                let resource = self.readable_mut(&rid)?;
                resource.points.retain(|t, _| {
                    let newer = newerthan.map_or(true, |n| *t > n);
                    let older = olderthan.map_or(true, |o| *t < o);
                    !(newer && older)
                });
                Ok(Value::Null)
            }
            Command::Info { rid, options } => {
                let rid = self.resolve(caller, rid)?;
                Ok(self.info(&rid, options))
            }
            Command::Listing { types, rid, .. } => {
                let rid = self.resolve(caller, rid)?;
                let resource = self.resources.get(&rid).ok_or(STATUS_INVALID)?;
                if !resource.kind.is_container() {
                    return Err(STATUS_INVALID);
                }
                let mut listing = Map::new();
                for kind in types {
                    let rids: Vec<Value> = resource
                        .children
                        .iter()
                        .filter(|c| self.resources.get(*c).is_some_and(|r| r.kind == *kind))
                        .map(|c| json!(c.as_str()))
                        .collect();
                    listing.insert(kind.as_str().to_string(), Value::Array(rids));
                }
                Ok(Value::Object(listing))
            }
            Command::Lookup { kind, key } => match kind {
                LookupKind::Aliased if key.is_empty() => Ok(json!(caller.as_str())),
                LookupKind::Aliased | LookupKind::Alias => {
                    let rid = self.resolve(caller, &ResourceSelector::alias(key.clone()))?;
                    Ok(json!(rid.as_str()))
                }
                LookupKind::Owner => {
                    let rid = ResourceId::parse(key).map_err(|_| STATUS_INVALID)?;
                    let rid = self.resolve(caller, &ResourceSelector::Rid(rid))?;
                    let parent = self
                        .resources
                        .get(&rid)
                        .and_then(|r| r.parent.clone())
                        .ok_or(STATUS_RESTRICTED)?;
                    Ok(json!(parent.as_str()))
                }
                LookupKind::Shared => self
                    .shares
                    .get(key)
                    .filter(|rid| self.resources.contains_key(*rid))
                    .map(|rid| json!(rid.as_str()))
                    .ok_or(STATUS_INVALID),
            },
            Command::Drop { rid } => {
                let rid = self.resolve(caller, &ResourceSelector::Rid(rid.clone()))?;
                if &rid == caller {
                    return Err(STATUS_RESTRICTED);
                }
                self.remove_subtree(&rid);
                Ok(Value::Null)
            }
        }
    }

    fn readable_mut(
        &mut self,
        rid: &ResourceId,
    ) -> std::result::Result<&mut StoredResource, &'static str> {
        self.resources
            .get_mut(rid)
            .filter(|r| r.kind.is_readable())
            .ok_or(STATUS_INVALID)
    }

    fn read(&self, rid: &ResourceId, options: &ReadOptions) -> Outcome {
        let resource = self
            .resources
            .get(rid)
            .filter(|r| r.kind.is_readable())
            .ok_or(STATUS_INVALID)?;
        let start = options.starttime.unwrap_or(Timestamp::MIN);
        let end = options.endtime.unwrap_or(Timestamp::MAX);
        if start > end {
            return Ok(Value::Array(Vec::new()));
        }
        let limit = usize::try_from(options.limit).unwrap_or(usize::MAX);
        let window = resource.points.range(start..=end);
        let points: Vec<Value> = match options.sort {
            SortOrder::Asc => window.take(limit).map(|(t, v)| json!([t, v])).collect(),
            SortOrder::Desc => window.rev().take(limit).map(|(t, v)| json!([t, v])).collect(),
        };
        Ok(Value::Array(points))
    }

    fn info(&self, rid: &ResourceId, options: &InfoOptions) -> Value {
        let Some(resource) = self.resources.get(rid) else {
            return Value::Null;
        };
        let mut aliases = Map::new();
        for (alias, target) in &resource.aliases {
            let entry = aliases
                .entry(target.as_str().to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = entry {
                list.push(json!(alias));
            }
        }

        let mut info = Map::new();
        info.insert(
            "basic".to_string(),
            json!({"type": resource.kind.as_str(), "status": "activated"}),
        );
        info.insert("description".to_string(), json!({"name": resource.name}));
        info.insert("aliases".to_string(), Value::Object(aliases));
        info.insert(
            "counts".to_string(),
            json!({"children": resource.children.len(), "points": resource.points.len()}),
        );
        if let Some(key) = &resource.key {
            info.insert("key".to_string(), json!(key));
        }

        if !options.is_empty() {
            info.retain(|k, _| options.includes(k));
        }
        Value::Object(info)
    }

    fn remove_subtree(&mut self, rid: &ResourceId) {
        if let Some(parent) = self.resources.get(rid).and_then(|r| r.parent.clone()) {
            if let Some(p) = self.resources.get_mut(&parent) {
                p.children.retain(|c| c != rid);
                p.aliases.retain(|_, target| target != rid);
            }
        }
        let mut stack = vec![rid.clone()];
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.resources.remove(&current) {
                if let Some(key) = removed.key {
                    self.keys.remove(&key);
                }
                stack.extend(removed.children);
            }
        }
    }
}
