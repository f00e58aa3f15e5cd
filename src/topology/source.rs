//! Topology source (paths.json) lists every RF path of the experiment.
//!
//! JSON shape:
//! {
//!   "paths": [
//!     {
//!       "nodes": ["nuc1", "nuc2"],   // node labels, order encodes direction
//!       "channels": [2, 33]          // [nodes[0] -> nodes[1], nodes[1] -> nodes[0]]
//!     },
//!     ...
//!   ]
//! }
//!
//! Order inside an entry is taken as-is: the first channel is the forward
//! direction by convention of whoever wrote the file. Nothing here assumes a
//! numeric relationship between the two channel ids.

use crate::topology::ChannelId;

use anyhow::bail;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTopology {
    #[serde(default)]
    pub paths: Vec<RawPath>,
}

/// Raw path shape as it appears in the source file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPath {
    #[serde(default)]
    pub nodes: Vec<String>,

    #[serde(default)]
    pub channels: Vec<ChannelId>,

    /// 1-based line number when the entry came from the listing format.
    #[serde(skip)]
    pub line: Option<usize>,
}

/// Validated RF path: two distinct nodes, two distinct channels.
///
/// `channels[0]` attenuates `nodes[0] -> nodes[1]`, `channels[1]` the reverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfPath {
    pub nodes: [String; 2],
    pub channels: [ChannelId; 2],
}

impl RfPath {
    pub fn low_channel(&self) -> ChannelId {
        self.channels[0].min(self.channels[1])
    }

    pub fn high_channel(&self) -> ChannelId {
        self.channels[0].max(self.channels[1])
    }

    /// Unordered node pair used as the path identity.
    pub fn pair_key(&self) -> (String, String) {
        pair_key(&self.nodes[0], &self.nodes[1])
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl RawPath {
    fn location(&self, index: usize) -> String {
        match self.line {
            Some(line) => format!("line {}", line),
            None => format!("path #{}", index + 1),
        }
    }
}

impl RawTopology {
    /// Check every entry and return the paths in source order.
    ///
    /// Phases:
    /// 1) Per-entry shape (two labels, two channels, labels usable in listings).
    /// 2) Cross-entry uniqueness (each channel and each node pair owned once).
    pub fn validate_and_build(&self, origin: &str) -> anyhow::Result<Vec<RfPath>> {
        let mut out: Vec<RfPath> = Vec::with_capacity(self.paths.len());
        let mut channel_owner: BTreeMap<ChannelId, String> = BTreeMap::new();
        let mut pairs: BTreeSet<(String, String)> = BTreeSet::new();

        for (index, raw) in self.paths.iter().enumerate() {
            let at = raw.location(index);

            // Phase 1: entry shape.
            let [a, b] = match raw.nodes.as_slice() {
                [a, b] => [a.trim().to_string(), b.trim().to_string()],
                other => bail!(
                    "{} {}: expected exactly 2 nodes, found {}",
                    origin,
                    at,
                    other.len()
                ),
            };
            let [fwd, rev] = match raw.channels.as_slice() {
                [fwd, rev] => [*fwd, *rev],
                other => bail!(
                    "{} {}: path {}/{} maps to {} channels, expected exactly 2",
                    origin,
                    at,
                    a,
                    b,
                    other.len()
                ),
            };
            for label in [&a, &b] {
                validate_label(label).map_err(|why| {
                    anyhow::anyhow!("{} {}: bad node label {:?}: {}", origin, at, label, why)
                })?;
            }
            if a == b {
                bail!("{} {}: path connects node {} to itself", origin, at, a);
            }
            if fwd == rev {
                bail!(
                    "{} {}: path {}/{} uses channel {} for both directions",
                    origin,
                    at,
                    a,
                    b,
                    fwd
                );
            }

            // Phase 2: uniqueness across entries.
            for ch in [fwd, rev] {
                let owner = format!("{}/{}", a, b);
                if let Some(prev) = channel_owner.insert(ch, owner.clone()) {
                    bail!(
                        "{} {}: channel {} appears in both {} and {}",
                        origin,
                        at,
                        ch,
                        prev,
                        owner
                    );
                }
            }
            let path = RfPath {
                nodes: [a, b],
                channels: [fwd, rev],
            };
            if !pairs.insert(path.pair_key()) {
                bail!(
                    "{} {}: duplicate path between {} and {}",
                    origin,
                    at,
                    path.nodes[0],
                    path.nodes[1]
                );
            }

            out.push(path);
        }

        Ok(out)
    }
}

/// Labels are printed as `a/b` after a `:` in listings, so the separators and
/// whitespace must not appear inside them.
fn validate_label(label: &str) -> Result<(), &'static str> {
    if label.is_empty() {
        return Err("empty");
    }
    if label
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | ',' | ':'))
    {
        return Err("must not contain whitespace, '/', ',' or ':'");
    }
    Ok(())
}
