//! Attenuator registry: node pair <-> channel pair mapping for one invocation.
//!
//! Built once from the topology source and never mutated. Listing order is
//! ascending by each path's lower channel id, so `atten -l` is reproducible.

use crate::error::{AttenError, Result};
use crate::topology::{self, ChannelId, RawTopology, RfPath};

use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A channel confirmed to exist, with the path and direction it attenuates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRef<'a> {
    pub id: ChannelId,
    pub path: &'a RfPath,
    /// 0 when the channel carries `nodes[0] -> nodes[1]`, 1 for the reverse.
    pub direction: usize,
}

impl ChannelRef<'_> {
    pub fn from_node(&self) -> &str {
        &self.path.nodes[self.direction]
    }

    pub fn to_node(&self) -> &str {
        &self.path.nodes[1 - self.direction]
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    /// Sorted by lower channel id.
    paths: Vec<RfPath>,
    by_channel: BTreeMap<ChannelId, (usize, usize)>,
}

impl Registry {
    /// Read and validate the topology source at `path`.
    ///
    /// `*.json` files are parsed as JSON, anything else as listing lines.
    pub fn load(path: &Path) -> Result<Self> {
        let origin = path.display().to_string();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read topology source {}", origin))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let raw: RawTopology = if is_json {
            serde_json::from_str(&text).with_context(|| format!("parse topology {}", origin))?
        } else {
            topology::parse_listing(&text, &origin)?
        };

        let registry = Self::from_source(&raw, &origin)?;
        info!(
            source = %origin,
            paths = registry.len(),
            "loaded attenuator registry"
        );
        Ok(registry)
    }

    pub fn from_source(raw: &RawTopology, origin: &str) -> Result<Self> {
        let mut paths = raw.validate_and_build(origin)?;
        paths.sort_by_key(RfPath::low_channel);

        let mut by_channel = BTreeMap::new();
        for (index, path) in paths.iter().enumerate() {
            for (direction, ch) in path.channels.iter().enumerate() {
                by_channel.insert(*ch, (index, direction));
            }
        }

        Ok(Self { paths, by_channel })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Every known path, ascending by lower channel id.
    pub fn list_paths(&self) -> &[RfPath] {
        &self.paths
    }

    /// Confirm `id` belongs to a path before any hardware is touched.
    pub fn resolve_channel(&self, id: ChannelId) -> Result<ChannelRef<'_>> {
        let (index, direction) = *self
            .by_channel
            .get(&id)
            .ok_or(AttenError::UnknownChannel(id.get()))?;
        let found = ChannelRef {
            id,
            path: &self.paths[index],
            direction,
        };
        debug!(
            channel = %id,
            from = found.from_node(),
            to = found.to_node(),
            "resolved channel"
        );
        Ok(found)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    pub(crate) fn handover_registry() -> Registry {
        let raw: RawTopology = serde_json::from_str(
            r#"{"paths": [
                {"nodes": ["nuc1", "nuc4"], "channels": [4, 35]},
                {"nodes": ["nuc1", "nuc2"], "channels": [2, 33]}
            ]}"#,
        )
        .unwrap();
        Registry::from_source(&raw, "paths.json").unwrap()
    }

    #[test]
    fn lists_by_ascending_low_channel() {
        let registry = handover_registry();
        let lows: Vec<u32> = registry
            .list_paths()
            .iter()
            .map(|p| p.low_channel().get())
            .collect();
        assert_eq!(lows, vec![2, 4]);
        for path in registry.list_paths() {
            assert!(path.low_channel() < path.high_channel());
        }
    }

    #[test]
    fn listed_channels_resolve_and_others_do_not() {
        let registry = handover_registry();
        for path in registry.list_paths() {
            for ch in path.channels {
                assert_eq!(registry.resolve_channel(ch).unwrap().id, ch);
            }
        }
        for id in [0, 3, 34, 999] {
            let err = registry.resolve_channel(ChannelId(id)).unwrap_err();
            assert!(matches!(err, AttenError::UnknownChannel(n) if n == id));
        }
    }

    #[test]
    fn resolve_reports_direction_in_source_order() {
        let registry = handover_registry();
        let fwd = registry.resolve_channel(ChannelId(4)).unwrap();
        assert_eq!((fwd.from_node(), fwd.to_node()), ("nuc1", "nuc4"));
        let rev = registry.resolve_channel(ChannelId(35)).unwrap();
        assert_eq!((rev.from_node(), rev.to_node()), ("nuc4", "nuc1"));
        assert_eq!(rev.direction, 1);
    }

    #[test]
    fn preserves_reverse_first_order() {
        let raw: RawTopology = serde_json::from_str(
            r#"{"paths": [{"nodes": ["ue", "enb1"], "channels": [40, 10]}]}"#,
        )
        .unwrap();
        let registry = Registry::from_source(&raw, "paths.json").unwrap();
        let path = &registry.list_paths()[0];
        assert_eq!(path.channels, [ChannelId(40), ChannelId(10)]);
        let ch = registry.resolve_channel(ChannelId(40)).unwrap();
        assert_eq!((ch.from_node(), ch.to_node()), ("ue", "enb1"));
    }

    #[test]
    fn loads_both_formats_from_disk_identically() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("paths.json");
        std::fs::write(
            &json_path,
            r#"{"paths": [
                {"nodes": ["nuc1", "nuc2"], "channels": [2, 33]},
                {"nodes": ["nuc1", "nuc4"], "channels": [4, 35]}
            ]}"#,
        )
        .unwrap();

        let txt_path = dir.path().join("paths.txt");
        let mut f = std::fs::File::create(&txt_path).unwrap();
        writeln!(f, "4,35:nuc1/nuc4").unwrap();
        writeln!(f, "2,33:nuc1/nuc2").unwrap();

        let from_json = Registry::load(&json_path).unwrap();
        let from_txt = Registry::load(&txt_path).unwrap();
        assert_eq!(from_json.list_paths(), from_txt.list_paths());
    }

    #[test]
    fn load_failures_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("nope.json");
        let err = Registry::load(&missing).unwrap_err();
        assert!(matches!(err, AttenError::Config(ref m) if m.contains("nope.json")));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"paths\": [").unwrap();
        assert!(matches!(
            Registry::load(&broken).unwrap_err(),
            AttenError::Config(_)
        ));

        let shared = dir.path().join("shared.txt");
        std::fs::write(&shared, "2,33:nuc1/nuc2\n4,2:nuc1/nuc4\n").unwrap();
        let err = Registry::load(&shared).unwrap_err();
        assert!(matches!(err, AttenError::Config(ref m) if m.contains("channel 2")));
    }

    #[test]
    fn loading_is_deterministic() {
        let first = handover_registry();
        let second = handover_registry();
        assert_eq!(first.list_paths(), second.list_paths());
    }
}
