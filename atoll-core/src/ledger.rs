//! Tracks which keys currently live on which node

use std::collections::HashMap;

/// Tracks which keys currently live on which node
///
/// Every assigned key appears in exactly one nodes collection. The ledger
/// only stores ownership, never key contents.
#[derive(Default, Clone, Debug)]
pub struct KeyLedger {
    /// The keys owned by each node in assignment order
    owned: HashMap<String, Vec<String>>,
}

impl KeyLedger {
    /// Register a node with an empty key collection if its not yet known
    ///
    /// Re-registering an already known node leaves its keys untouched.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to register
    pub fn register(&mut self, node: &str) {
        self.owned.entry(node.to_owned()).or_default();
    }

    /// Append a key to a nodes collection
    ///
    /// # Arguments
    ///
    /// * `node` - The node that owns this key
    /// * `key` - The key to record
    pub fn append(&mut self, node: &str, key: String) {
        self.owned.entry(node.to_owned()).or_default().push(key);
    }

    /// Take a nodes entire key collection out of the ledger
    ///
    /// # Arguments
    ///
    /// * `node` - The node whose keys should be taken
    pub fn take(&mut self, node: &str) -> Option<Vec<String>> {
        self.owned.remove(node)
    }

    /// Put a key collection back under a node
    ///
    /// # Arguments
    ///
    /// * `node` - The node to restore keys under
    /// * `keys` - The keys to restore
    pub fn restore(&mut self, node: &str, keys: Vec<String>) {
        self.owned.insert(node.to_owned(), keys);
    }

    /// Get a read only view of a nodes keys
    ///
    /// Unknown nodes just have no keys.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to get keys for
    pub fn keys_of(&self, node: &str) -> &[String] {
        self.owned.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether this node is registered in the ledger
    ///
    /// # Arguments
    ///
    /// * `node` - The node to look for
    pub fn contains(&self, node: &str) -> bool {
        self.owned.contains_key(node)
    }

    /// Step over the registered node names
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.owned.keys().map(String::as_str)
    }

    /// The number of registered nodes
    pub fn node_count(&self) -> usize {
        self.owned.len()
    }

    /// The total number of keys across all nodes
    pub fn total_keys(&self) -> usize {
        self.owned.values().map(Vec::len).sum()
    }
}
