//! A consistent hashing ring that only moves the keys it must
//!
//! Atoll maps a dynamic set of keys onto a dynamic set of nodes. Adding or
//! removing a node only migrates the bounded slice of keys whose owner
//! actually changed, never the whole key space.

pub mod conf;
pub mod errors;
pub mod hash;
pub mod index;
pub mod ledger;
pub mod ring;
pub mod trace;

pub use conf::Conf;
pub use errors::{AtollError, RingError};
pub use ring::Ring;
