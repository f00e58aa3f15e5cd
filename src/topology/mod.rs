//! Topology source layer: on-disk shapes + validated in-memory paths.
//!
//! Two formats describe the same thing:
//! - JSON (`*.json`): `{ "paths": [ { "nodes": [..], "channels": [..] } ] }`
//! - listing lines (anything else): `fwd,rev:nodeA/nodeB`, one per line
//!
//! Both are parsed into [`RawTopology`] and validated by the same code, so the
//! invariants hold regardless of where the paths came from.

pub mod channel;
pub mod lines;
pub mod source;

pub use channel::ChannelId;
pub use lines::parse_listing;
pub use source::{RawPath, RawTopology, RfPath};
