//! Text rendering for the CLI: help text and path listings.

use crate::topology::RfPath;

use std::fmt::Write as _;

/// Help text printed by `atten -h`.
pub const USAGE: &str = "\
usage:
    atten -h
        show this help message
    atten -l
        list the attenuator paths under control of this experiment; each
        path is described by a line like:
            10,11:node123/node456
        indicating that attenuator IDs 10 and 11 affect the path between
        node123 and node456
    atten <id> <val>
        set the attenuation over path <id> to <val> dB
";

/// Render one path as `idLow,idHigh:nodeA/nodeB`.
///
/// Node labels keep the order recorded in the topology source; only the ids
/// are put in ascending order. A path whose forward channel is the higher id
/// (`35,4:nuc1/nuc4` in a listing source) therefore prints as `4,35:nuc1/nuc4`,
/// and reading that line back as a listing source swaps its direction. Copy a
/// topology with the original source file, not with `atten -l` output.
pub fn format_path(path: &RfPath) -> String {
    format!(
        "{},{}:{}/{}",
        path.low_channel(),
        path.high_channel(),
        path.nodes[0],
        path.nodes[1]
    )
}

/// One line per path, each terminated by `\n`. Empty input renders as "".
pub fn render_listing(paths: &[RfPath]) -> String {
    let mut out = String::new();
    for path in paths {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", format_path(path));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::handover_registry;
    use crate::topology::ChannelId;
    use pretty_assertions::assert_eq;

    #[test]
    fn handover_listing_matches_operator_instructions() {
        let registry = handover_registry();
        assert_eq!(
            render_listing(registry.list_paths()),
            "2,33:nuc1/nuc2\n4,35:nuc1/nuc4\n"
        );
    }

    #[test]
    fn ids_ascend_but_nodes_keep_source_order() {
        let path = RfPath {
            nodes: ["enb2".to_string(), "ue".to_string()],
            channels: [ChannelId(35), ChannelId(4)],
        };
        assert_eq!(format_path(&path), "4,35:enb2/ue");
    }

    #[test]
    fn reverse_first_listing_does_not_round_trip() {
        let source = crate::topology::parse_listing("35,4:nuc1/nuc4\n", "paths.txt").unwrap();
        let paths = source.validate_and_build("paths.txt").unwrap();
        assert_eq!(paths[0].channels, [ChannelId(35), ChannelId(4)]);

        let printed = render_listing(&paths);
        assert_eq!(printed, "4,35:nuc1/nuc4\n");

        let reread = crate::topology::parse_listing(&printed, "listing").unwrap();
        let reread = reread.validate_and_build("listing").unwrap();
        assert_eq!(reread[0].nodes, paths[0].nodes);
        assert_eq!(reread[0].channels, [ChannelId(4), ChannelId(35)]);
    }

    #[test]
    fn empty_registry_renders_nothing() {
        assert_eq!(render_listing(&[]), "");
    }

    #[test]
    fn usage_lists_all_three_forms() {
        for form in ["atten -h", "atten -l", "atten <id> <val>"] {
            assert!(USAGE.contains(form), "missing {}", form);
        }
    }
}
