//! The consistent hashing ring for Atoll
//!
//! This determines on what nodes keys live and moves only the keys whose
//! owner actually changed when the node set changes.

use tracing::{event, instrument, Level};

use super::conf::Conf;
use super::errors::RingError;
use super::hash;
use super::index::RingIndex;
use super::ledger::KeyLedger;

/// A consistent hashing ring mapping keys onto nodes
///
/// Each node is placed on the ring as a fixed number of virtual nodes so
/// that adding or removing a node only moves a bounded slice of the key
/// space. The ring is single writer: callers must serialize mutations.
#[derive(Clone, Debug)]
pub struct Ring {
    /// The ordered index from ring position to owning node
    index: RingIndex,
    /// The keys currently owned by each node
    ledger: KeyLedger,
    /// How many virtual nodes to place per node
    virtual_nodes: usize,
}

impl Ring {
    /// Build a new empty ring
    ///
    /// # Arguments
    ///
    /// * `virtual_nodes` - How many virtual nodes to place per node, at least 1
    #[must_use]
    pub fn new(virtual_nodes: usize) -> Self {
        Ring {
            index: RingIndex::default(),
            ledger: KeyLedger::default(),
            virtual_nodes,
        }
    }

    /// Build a new empty ring from a config
    ///
    /// # Arguments
    ///
    /// * `conf` - The Atoll config to pull ring settings from
    #[must_use]
    pub fn from_conf(conf: &Conf) -> Self {
        Ring::new(conf.ring.virtual_nodes)
    }

    /// Add a node to the ring and migrate the keys it now owns
    ///
    /// Re-adding an already known node just re-inserts its ring slots and
    /// leaves its key collection untouched.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to add
    #[instrument(name = "Ring::add_node", skip(self))]
    pub fn add_node(&mut self, node: &str) {
        // register this node without clearing any keys it already has
        self.ledger.register(node);
        // place this nodes virtual nodes onto the ring
        for replica in 0..self.virtual_nodes {
            // hash this virtual nodes name onto the ring
            let position = hash::vnode_position(node, replica);
            // colliding slots are silently overwritten
            self.index.insert(position, node);
            // log where this virtual node landed
            event!(Level::DEBUG, replica, position, msg = "added virtual node");
        }
        // move any keys this node carved out of other nodes territory
        self.migrate_on_add(node);
    }

    /// Remove a node from the ring and migrate its keys elsewhere
    ///
    /// Removing an unknown node is a no-op. Removing the last node while it
    /// still holds keys drops them and reports [`RingError::KeyLoss`] with
    /// the dropped keys so the caller can resubmit them later.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to remove
    #[instrument(name = "Ring::remove_node", skip(self), err(Debug))]
    pub fn remove_node(&mut self, node: &str) -> Result<(), RingError> {
        // clear this nodes virtual nodes off the ring
        for replica in 0..self.virtual_nodes {
            // recompute the same positions we inserted at
            let position = hash::vnode_position(node, replica);
            self.index.remove(position);
            // log which virtual node we cleared
            event!(Level::DEBUG, replica, position, msg = "removed virtual node");
        }
        // hand this nodes keys to their new owners
        self.migrate_on_remove(node)
    }

    /// Assign a key to the node that owns its ring position
    ///
    /// This is the only way new keys enter the ledger.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to assign
    pub fn assign_key(&mut self, key: &str) -> Result<String, RingError> {
        // find the node that owns this keys position
        let owner = self.index.owner_of(hash::position(key))?.to_owned();
        // record this key under its owner
        self.ledger.append(&owner, key.to_owned());
        // log where this key was assigned
        event!(Level::INFO, key, owner = owner.as_str(), msg = "assigned key");
        Ok(owner)
    }

    /// Get the node that currently owns a key
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up
    pub fn owner_of(&self, key: &str) -> Result<&str, RingError> {
        self.index.owner_of(hash::position(key))
    }

    /// Get a read only view of the keys assigned to a node
    ///
    /// # Arguments
    ///
    /// * `node` - The node to get keys for
    pub fn keys_of(&self, node: &str) -> &[String] {
        self.ledger.keys_of(node)
    }

    /// Get the registered node names in sorted order
    #[must_use]
    pub fn nodes(&self) -> Vec<&str> {
        // sort the names so callers get stable output
        let mut nodes: Vec<&str> = self.ledger.nodes().collect();
        nodes.sort_unstable();
        nodes
    }

    /// The number of nodes registered in the ledger
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ledger.node_count()
    }

    /// The number of virtual node slots on the ring
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.index.len()
    }

    /// The total number of keys assigned across all nodes
    #[must_use]
    pub fn total_keys(&self) -> usize {
        self.ledger.total_keys()
    }

    /// Move keys a newly added node now owns into its collection
    ///
    /// For each of the new nodes slots we find the node that owned that
    /// slots range before insertion and re-check each of its keys against
    /// the updated ring. The per key re-check matters because a node can
    /// own several non adjacent ranges.
    ///
    /// # Arguments
    ///
    /// * `node` - The node that was just added
    fn migrate_on_add(&mut self, node: &str) {
        // walk this nodes virtual nodes in replica order
        for replica in 0..self.virtual_nodes {
            // recompute where this virtual node landed
            let position = hash::vnode_position(node, replica);
            // find the node that owned this slots range before insertion
            let prev = match self.index.successor_skipping(position, node) {
                Some(prev) => prev.to_owned(),
                // the new node is alone on the ring so nothing can move
                None => continue,
            };
            // take the previous owners keys so we can re-check each one
            let keys = match self.ledger.take(&prev) {
                Some(keys) => keys,
                None => continue,
            };
            // the keys the previous owner gets to keep
            let mut kept = Vec::with_capacity(keys.len());
            for key in keys {
                // recompute this keys owner against the updated ring
                let owner = match self.index.owner_of(hash::position(&key)) {
                    Ok(owner) => owner,
                    // the ring cannot be empty mid migration
                    Err(_) => {
                        kept.push(key);
                        continue;
                    }
                };
                // only move keys the new node actually owns now
                if owner == node {
                    // log this keys move
                    event!(
                        Level::INFO,
                        key = key.as_str(),
                        from = prev.as_str(),
                        to = node,
                        msg = "migrated key"
                    );
                    self.ledger.append(node, key);
                } else {
                    kept.push(key);
                }
            }
            // give the previous owner back the keys it kept
            self.ledger.restore(&prev, kept);
        }
    }

    /// Hand a removed nodes keys to whichever nodes now own them
    ///
    /// Each key is reassigned to whatever the shrunken ring says its owner
    /// is now. When the removal emptied the ring the keys are dropped and
    /// reported back to the caller.
    ///
    /// # Arguments
    ///
    /// * `node` - The node that was just removed
    fn migrate_on_remove(&mut self, node: &str) -> Result<(), RingError> {
        // pull this nodes entire key collection out of the ledger
        let keys = match self.ledger.take(node) {
            Some(keys) => keys,
            // this node was never registered so theres nothing to move
            None => return Ok(()),
        };
        // removing the last node leaves these keys with no destination
        if self.index.is_empty() && !keys.is_empty() {
            // log how many keys we are dropping
            event!(Level::WARN, node, lost = keys.len(), msg = "dropped keys");
            return Err(RingError::KeyLoss {
                node: node.to_owned(),
                keys,
            });
        }
        for key in keys {
            // recompute this keys owner against the shrunken ring
            let owner = self.index.owner_of(hash::position(&key))?.to_owned();
            // log this keys move
            event!(
                Level::INFO,
                key = key.as_str(),
                from = node,
                to = owner.as_str(),
                msg = "migrated key"
            );
            // record this key under its new owner
            self.ledger.append(&owner, key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Build a ring with 3 virtual nodes per node and some servers added
    fn ring_with(servers: &[&str]) -> Ring {
        let mut ring = Ring::new(3);
        for server in servers {
            ring.add_node(server);
        }
        ring
    }

    #[test]
    fn empty_ring_rejects_lookups() {
        let mut ring = Ring::new(3);
        assert_eq!(ring.owner_of("Key1"), Err(RingError::Empty));
        assert_eq!(ring.assign_key("Key1"), Err(RingError::Empty));
        // a failed assignment must not leave anything in the ledger
        assert_eq!(ring.total_keys(), 0);
    }

    #[test]
    fn a_single_node_owns_every_key() {
        let mut ring = ring_with(&["Server1"]);
        // wrap around means no position is unassigned
        for key in ["Key1", "Key2", "a", "z", "", "some-much-longer-key"] {
            assert_eq!(ring.owner_of(key), Ok("Server1"));
            assert_eq!(ring.assign_key(key).unwrap(), "Server1");
        }
        assert_eq!(ring.keys_of("Server1").len(), 6);
    }

    #[test]
    fn lookups_are_deterministic() {
        let ring = ring_with(&["Server1", "Server2", "Server3"]);
        for key in ["Key1", "Key2", "Key3", "Key4", "Key5"] {
            let first = ring.owner_of(key).unwrap().to_owned();
            // repeated lookups with no mutation never change their answer
            for _ in 0..10 {
                assert_eq!(ring.owner_of(key), Ok(first.as_str()));
            }
        }
    }

    #[test]
    fn re_adding_a_node_is_idempotent() {
        let mut ring = ring_with(&["Server1", "Server2"]);
        ring.assign_key("Key1").unwrap();
        ring.assign_key("Key2").unwrap();
        let slots = ring.slot_count();
        let total = ring.total_keys();
        // re-adding re-inserts the same slots and keeps existing keys
        ring.add_node("Server1");
        assert_eq!(ring.slot_count(), slots);
        assert_eq!(ring.total_keys(), total);
        assert_eq!(ring.node_count(), 2);
    }

    #[test]
    fn removing_unknown_nodes_is_a_noop() {
        let mut ring = ring_with(&["Server1"]);
        ring.assign_key("Key1").unwrap();
        assert_eq!(ring.remove_node("Server9"), Ok(()));
        // nothing moved or vanished
        assert_eq!(ring.node_count(), 1);
        assert_eq!(ring.total_keys(), 1);
        // removing twice is just as safe
        assert_eq!(ring.remove_node("Server9"), Ok(()));
    }

    #[test]
    fn adding_a_node_moves_only_the_keys_it_owns() {
        let mut ring = ring_with(&["Server1", "Server2", "Server3"]);
        for key in ["Key1", "Key2", "Key3", "Key4", "Key5"] {
            ring.assign_key(key).unwrap();
        }
        // with md5 placement Server1 holds Key1, Key4 and Key5 here
        assert_eq!(ring.owner_of("Key1"), Ok("Server1"));
        assert_eq!(ring.owner_of("Key2"), Ok("Server2"));
        assert_eq!(ring.owner_of("Key3"), Ok("Server3"));
        // Server5s virtual nodes land so that it takes over Server1s keys
        ring.add_node("Server5");
        for key in ["Key1", "Key4", "Key5"] {
            assert_eq!(ring.owner_of(key), Ok("Server5"));
            assert!(ring.keys_of("Server5").contains(&key.to_owned()));
        }
        // keys owned by unrelated nodes were never touched
        assert_eq!(ring.owner_of("Key2"), Ok("Server2"));
        assert_eq!(ring.keys_of("Server2"), ["Key2".to_owned()]);
        assert_eq!(ring.owner_of("Key3"), Ok("Server3"));
        assert_eq!(ring.keys_of("Server3"), ["Key3".to_owned()]);
        // no keys were duplicated or dropped
        assert_eq!(ring.total_keys(), 5);
    }

    #[test]
    fn the_ledger_always_matches_the_index() {
        // after any membership change every key sits in the collection of
        // whatever node the index currently maps it to
        let mut ring = ring_with(&["Server1", "Server2", "Server3"]);
        for key in ["Key1", "Key2", "Key3", "Key4", "Key5"] {
            ring.assign_key(key).unwrap();
        }
        let checks = |ring: &Ring| {
            for node in ring.nodes() {
                for key in ring.keys_of(node) {
                    assert_eq!(ring.owner_of(key), Ok(node));
                }
            }
        };
        checks(&ring);
        ring.add_node("Server4");
        checks(&ring);
        ring.add_node("Server5");
        checks(&ring);
        ring.remove_node("Server2").unwrap();
        checks(&ring);
    }

    #[test]
    fn membership_changes_conserve_keys() {
        let mut ring = ring_with(&["Server1", "Server2", "Server3"]);
        for key in ["Key1", "Key2", "Key3", "Key4", "Key5"] {
            ring.assign_key(key).unwrap();
        }
        assert_eq!(ring.total_keys(), 5);
        ring.add_node("Server4");
        assert_eq!(ring.total_keys(), 5);
        ring.remove_node("Server1").unwrap();
        assert_eq!(ring.total_keys(), 5);
        ring.remove_node("Server4").unwrap();
        assert_eq!(ring.total_keys(), 5);
    }

    #[test]
    fn removed_nodes_give_up_all_their_keys() {
        let mut ring = ring_with(&["Server1", "Server2", "Server3"]);
        for key in ["Key1", "Key2", "Key3", "Key4", "Key5"] {
            ring.assign_key(key).unwrap();
        }
        // remember which keys Server1 held
        let former: Vec<String> = ring.keys_of("Server1").to_vec();
        assert!(!former.is_empty());
        ring.remove_node("Server1").unwrap();
        assert!(ring.keys_of("Server1").is_empty());
        // every former key now maps to a surviving node that holds it
        for key in &former {
            let owner = ring.owner_of(key).unwrap().to_owned();
            assert_ne!(owner, "Server1");
            assert!(ring.keys_of(&owner).contains(key));
        }
    }

    #[test]
    fn removing_the_last_node_reports_lost_keys() {
        let mut ring = ring_with(&["Server1"]);
        ring.assign_key("Key1").unwrap();
        ring.assign_key("Key2").unwrap();
        // the keys have nowhere to go so they are dropped and reported
        match ring.remove_node("Server1") {
            Err(RingError::KeyLoss { node, keys }) => {
                assert_eq!(node, "Server1");
                assert_eq!(keys, vec!["Key1".to_owned(), "Key2".to_owned()]);
            }
            other => panic!("expected key loss, got {other:?}"),
        }
        // the ring is fully empty afterwards
        assert_eq!(ring.slot_count(), 0);
        assert_eq!(ring.total_keys(), 0);
        assert_eq!(ring.owner_of("Key1"), Err(RingError::Empty));
        // the condition is recoverable by adding a node and resubmitting
        ring.add_node("Server2");
        assert_eq!(ring.assign_key("Key1").unwrap(), "Server2");
    }

    #[test]
    fn removing_the_last_empty_node_loses_nothing() {
        let mut ring = ring_with(&["Server1"]);
        // no keys were ever assigned so removal is clean
        assert_eq!(ring.remove_node("Server1"), Ok(()));
        assert_eq!(ring.node_count(), 0);
    }

    #[test]
    fn end_to_end_scenario() {
        // the literal demo scenario: 3 servers, 5 keys, add one, remove one
        let mut ring = Ring::new(3);
        ring.add_node("Server1");
        ring.add_node("Server2");
        ring.add_node("Server3");
        let keys = ["Key1", "Key2", "Key3", "Key4", "Key5"];
        // record where each key first lands
        let mut recorded = HashMap::with_capacity(keys.len());
        for key in keys {
            let owner = ring.assign_key(key).unwrap();
            recorded.insert(key, owner);
        }
        // add a fourth server
        ring.add_node("Server4");
        for key in keys {
            let owner = ring.owner_of(key).unwrap().to_owned();
            // the ledger location always matches the rings answer
            assert!(ring.keys_of(&owner).contains(&key.to_owned()));
            // keys whose owner did not change still match their record
            if owner != "Server4" {
                assert_eq!(&owner, recorded.get(key).unwrap());
            }
        }
        // remove a server and check its keys found new homes
        let former: Vec<String> = ring.keys_of("Server2").to_vec();
        ring.remove_node("Server2").unwrap();
        assert!(ring.keys_of("Server2").is_empty());
        for key in &former {
            let owner = ring.owner_of(key).unwrap().to_owned();
            assert!(ring.keys_of(&owner).contains(key));
        }
        assert_eq!(ring.total_keys(), 5);
    }

    #[test]
    fn rings_are_built_from_conf() {
        let conf = Conf::default();
        let ring = Ring::from_conf(&conf);
        assert_eq!(ring.slot_count(), 0);
        assert_eq!(ring.node_count(), 0);
    }
}
