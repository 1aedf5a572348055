//! Any errors that can be encountered when using Atoll

/// Any errors that can be encountered when using Atoll
#[derive(Debug)]
pub enum AtollError {
    /// An error from the ring itself
    Ring(RingError),
    /// An config parsing error
    Config(config::ConfigError),
}

impl From<RingError> for AtollError {
    /// Convert this error to our error type
    ///
    /// # Arguments
    ///
    /// * `error` - The error to convert
    fn from(error: RingError) -> Self {
        AtollError::Ring(error)
    }
}

impl From<config::ConfigError> for AtollError {
    /// Convert this error to our error type
    ///
    /// # Arguments
    ///
    /// * `error` - The error to convert
    fn from(error: config::ConfigError) -> Self {
        AtollError::Config(error)
    }
}

/// The errors specific to ring operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// A lookup was attempted while no nodes are on the ring
    ///
    /// The caller can add a node and retry.
    Empty,
    /// Removing the last node left keys with no destination
    ///
    /// The keys were dropped from the ledger and are listed here so the
    /// caller can resubmit them once a node exists again.
    KeyLoss {
        /// The node whose removal dropped these keys
        node: String,
        /// The keys that no longer have an owner
        keys: Vec<String>,
    },
}
