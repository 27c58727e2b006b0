//! Display collector.
//!
//! `xrandr --verbose` prints each monitor's EDID as hex, spread over several
//! indented lines after an `EDID:` marker. The scanner joins those lines and
//! emits one [`Display`] per complete block.

use tracing::{debug, trace};

use crate::collector::traits::DisplayCollector;
use crate::model::{Display, EDID_BLOCK_LEN};
use crate::source::command::CommandRunner;
use crate::source::parse::hex_to_bytes;

const XRANDR_COMMAND: &str = "xrandr --verbose";

/// Line marker that starts an EDID hex block.
const EDID_MARKER: &str = "EDID";

/// Hex characters needed before an accumulated block is decoded.
const EDID_HEX_LEN: usize = EDID_BLOCK_LEN * 2;

/// Extracts EDID blocks from `xrandr --verbose` output.
///
/// A line containing `EDID` starts a fresh accumulator (discarding any
/// unfinished one). Following lines are trimmed and appended; once at least
/// 256 hex characters are collected the block is decoded and emitted if it
/// yields at least 128 bytes. Either way the scanner goes back to looking
/// for the next marker. A block still short at end of input is dropped.
pub fn parse_xrandr_edids(lines: &[String]) -> Vec<Display> {
    let mut displays = Vec::new();
    let mut accumulator: Option<String> = None;

    for line in lines {
        if line.contains(EDID_MARKER) {
            accumulator = Some(String::new());
            continue;
        }
        let Some(hex) = accumulator.as_mut() else {
            continue;
        };
        hex.push_str(line.trim());
        if hex.len() < EDID_HEX_LEN {
            continue;
        }
        trace!(edid = %hex, "parsed EDID");
        let edid = hex_to_bytes(hex);
        if edid.len() >= EDID_BLOCK_LEN {
            displays.push(Display::new(edid));
        } else {
            debug!(len = edid.len(), "discarding malformed EDID block");
        }
        accumulator = None;
    }

    displays
}

/// Reads displays from xrandr.
pub struct XrandrDisplayCollector<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> XrandrDisplayCollector<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> DisplayCollector for XrandrDisplayCollector<R> {
    fn displays(&self) -> Vec<Display> {
        let lines = self.runner.run_command(XRANDR_COMMAND);
        let displays = parse_xrandr_edids(&lines);
        debug!(count = displays.len(), "found displays");
        displays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::display::tests::sample_edid;
    use crate::source::mock::MockCommandRunner;

    /// Splits a block's hex into xrandr-style indented lines of 32 digits.
    fn xrandr_hex_lines(edid: &[u8]) -> Vec<String> {
        let hex: String = edid.iter().map(|b| format!("{:02x}", b)).collect();
        hex.as_bytes()
            .chunks(32)
            .map(|chunk| format!("\t\t{}", String::from_utf8_lossy(chunk)))
            .collect()
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_display() {
        let mut output = lines(&[
            "Screen 0: minimum 8 x 8, current 1920 x 1080, maximum 32767 x 32767",
            "DP-1 connected primary 1920x1080+0+0 (0x46) normal (normal left inverted right x axis y axis) 527mm x 296mm",
            "\tEDID: ",
        ]);
        output.extend(xrandr_hex_lines(&sample_edid()));
        output.extend(lines(&["\tBroadcast RGB: Automatic", "  1920x1080 (0x46) 148.500MHz +HSync +VSync *current +preferred"]));

        let displays = parse_xrandr_edids(&output);
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].edid(), sample_edid().as_slice());
    }

    #[test]
    fn test_exactly_256_hex_chars() {
        let mut output = lines(&["EDID:"]);
        output.push("00ffffffffffff00".to_string() + &"0".repeat(240));
        let displays = parse_xrandr_edids(&output);
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].edid().len(), 128);
    }

    #[test]
    fn test_255_hex_chars_is_dropped() {
        let mut output = lines(&["EDID:"]);
        output.push("00ffffffffffff00".to_string() + &"0".repeat(239));
        assert!(parse_xrandr_edids(&output).is_empty());
    }

    #[test]
    fn test_two_displays() {
        let mut output = lines(&["HDMI-1 connected", "\tEDID:"]);
        output.extend(xrandr_hex_lines(&sample_edid()));
        output.extend(lines(&["DP-2 connected", "\tEDID:"]));
        output.extend(xrandr_hex_lines(&sample_edid()));
        assert_eq!(parse_xrandr_edids(&output).len(), 2);
    }

    #[test]
    fn test_new_marker_restarts_block() {
        let mut output = lines(&["\tEDID:", "\t\t00ffffffffffff00", "\tEDID:"]);
        output.extend(xrandr_hex_lines(&sample_edid()));
        let displays = parse_xrandr_edids(&output);
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].edid(), sample_edid().as_slice());
    }

    #[test]
    fn test_non_hex_block_is_dropped() {
        let mut output = lines(&["EDID:"]);
        output.push("zz".repeat(128));
        assert!(parse_xrandr_edids(&output).is_empty());
    }

    #[test]
    fn test_lines_without_marker_are_ignored() {
        let output = lines(&["00ffffffffffff00".repeat(16).as_str()]);
        assert!(parse_xrandr_edids(&output).is_empty());
    }

    #[test]
    fn test_collector_without_xrandr() {
        let collector = XrandrDisplayCollector::new(MockCommandRunner::new());
        assert!(collector.displays().is_empty());
    }

    #[test]
    fn test_collector() {
        let mut stdout = String::from("DP-1 connected\n\tEDID:\n");
        for line in xrandr_hex_lines(&sample_edid()) {
            stdout.push_str(&line);
            stdout.push('\n');
        }
        let runner = MockCommandRunner::new().with_output("xrandr --verbose", &stdout);
        let displays = XrandrDisplayCollector::new(runner).displays();
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].edid_info().map(|i| i.manufacturer_id), Some("DEL".to_string()));
    }
}
