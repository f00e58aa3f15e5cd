//! Parsing for the listing-format topology source.

use crate::topology::{ChannelId, RawPath, RawTopology};

use anyhow::{Context, bail};
use regex::Regex;

/// Parse a listing-format topology source into raw paths.
///
/// Expected syntax, one path per line (the same shape `atten -l` prints):
/// fwd,rev:nodeA/nodeB
///
/// Example:
/// 2,33:nuc1/nuc2
///
/// Blank lines and lines starting with `#` are skipped. Structural checks
/// (uniqueness, distinct channels) happen later in `validate_and_build`.
///
/// The first id is always the forward direction. `atten -l` prints ids in
/// ascending order instead, so its output only round-trips for paths whose
/// forward channel is the lower id.
pub fn parse_listing(text: &str, origin: &str) -> anyhow::Result<RawTopology> {
    // Capture:
    // 1) forward channel id
    // 2) reverse channel id
    // 3) first node label
    // 4) second node label
    const LISTING_LINE_RE: &str = r#"^\s*(\d+)\s*,\s*(\d+)\s*:\s*([^/\s]+)/([^/\s]+)\s*$"#;
    let re = Regex::new(LISTING_LINE_RE)?;

    let mut paths = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some(caps) = re.captures(trimmed) else {
            bail!(
                "{} line {}: cannot parse {:?} (expected fwd,rev:nodeA/nodeB)",
                origin,
                lno,
                trimmed
            );
        };

        let fwd: ChannelId = caps[1]
            .parse()
            .with_context(|| format!("{} line {}: bad channel id {}", origin, lno, &caps[1]))?;
        let rev: ChannelId = caps[2]
            .parse()
            .with_context(|| format!("{} line {}: bad channel id {}", origin, lno, &caps[2]))?;

        paths.push(RawPath {
            nodes: vec![caps[3].to_string(), caps[4].to_string()],
            channels: vec![fwd, rev],
            line: Some(lno),
        });
    }

    Ok(RawTopology { paths })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_lines_with_comments() {
        let text = "# rf paths\n2,33:nuc1/nuc2\n\n 4, 35 : nuc1/nuc4 \n";
        let raw = parse_listing(text, "paths.txt").unwrap();
        assert_eq!(raw.paths.len(), 2);
        assert_eq!(raw.paths[0].nodes, vec!["nuc1", "nuc2"]);
        assert_eq!(raw.paths[0].channels, vec![ChannelId(2), ChannelId(33)]);
        assert_eq!(raw.paths[0].line, Some(2));
        assert_eq!(raw.paths[1].channels, vec![ChannelId(4), ChannelId(35)]);
        assert_eq!(raw.paths[1].line, Some(4));
    }

    #[test]
    fn reports_line_number_of_garbage() {
        let err = parse_listing("2,33:nuc1/nuc2\n2;33 nuc1 nuc2\n", "paths.txt")
            .unwrap_err()
            .to_string();
        assert!(err.contains("paths.txt line 2"), "{}", err);
    }

    #[test]
    fn rejects_missing_reverse_channel() {
        assert!(parse_listing("2:nuc1/nuc2\n", "paths.txt").is_err());
    }

    #[test]
    fn oversized_channel_id_is_an_error() {
        let err = parse_listing("99999999999,3:a/b\n", "paths.txt")
            .unwrap_err()
            .to_string();
        assert!(err.contains("bad channel id"), "{}", err);
    }

    #[test]
    fn duplicates_are_caught_by_validation() {
        let raw = parse_listing("2,33:nuc1/nuc2\n4,33:nuc1/nuc4\n", "paths.txt").unwrap();
        let err = raw.validate_and_build("paths.txt").unwrap_err().to_string();
        assert!(err.contains("line 3") || err.contains("line 2"), "{}", err);
        assert!(err.contains("channel 33"), "{}", err);
    }
}
