//! Weighted consistent hash ring.
//!
//! Maps arbitrary keys onto a changing set of named, weighted nodes so that
//! a membership change only remaps a small share of keys. Sharding layers,
//! cache routers and load balancers use it to pick a backend per request.
//!
//! Each node of weight `w` occupies `160 * w` virtual points on a 32-bit
//! ring, at `hash(name*weight-index)`, plus an anchor at `hash(name)`. A key
//! belongs to the node at the first point at or after `hash(key)`, wrapping
//! past the top of the ring.
//!
//! [`Ring`] is the single-threaded structure; [`ConsistentHash`] wraps it
//! in a reader-writer lock for shared use. Whether the sorted point list is
//! rebuilt on every change or only on `prepare` is fixed by [`Maintenance`].

mod config;
mod error;
mod hash;
mod node;
mod ring;
mod shared;

pub use config::{Maintenance, RingConfig};
pub use error::RingError;
pub use hash::{MAX_WEIGHT, PointHash, REPLICATION_BASE, point_label};
pub use node::Node;
pub use ring::{Reassignment, Ring};
pub use shared::ConsistentHash;
