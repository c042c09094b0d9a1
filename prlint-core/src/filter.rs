//! Restricts analyzer findings to the lines a change actually touched.

use crate::patch::LineMapping;
use crate::types::Finding;

/// Filters `findings` down to those worth commenting on.
///
/// A finding survives when its confidence is at least `threshold` (strict
/// cut below, equal passes) *and* its line appears in `mapping`, i.e. the
/// change added that line. Survivors come back in input order, paired with
/// the resolved diff position. No deduplication happens here: with no
/// memory across invocations, the same logical problem can be reported
/// once per invocation.
pub fn filter_findings(
    findings: Vec<Finding>,
    mapping: &LineMapping,
    threshold: f64,
) -> Vec<(Finding, usize)> {
    findings
        .into_iter()
        .filter(|f| f.confidence >= threshold)
        .filter_map(|f| mapping.position_of(f.line).map(|pos| (f, pos)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::compute_line_mapping;

    fn finding(line: u32, confidence: f64, message: &str) -> Finding {
        Finding { line, confidence, message: message.to_owned() }
    }

    fn mapping() -> LineMapping {
        // Adds lines 2 and 4 at positions 2 and 5.
        compute_line_mapping("@@ -1,3 +1,5 @@\n a\n+b\n c\n-d\n+e\n f").unwrap()
    }

    #[test]
    fn drops_below_threshold_keeps_equal() {
        let found = filter_findings(
            vec![finding(2, 0.79, "low"), finding(2, 0.8, "equal"), finding(4, 0.95, "high")],
            &mapping(),
            0.8,
        );
        let messages: Vec<&str> = found.iter().map(|(f, _)| f.message.as_str()).collect();
        assert_eq!(messages, ["equal", "high"], "threshold is a strict lower cut");
    }

    #[test]
    fn drops_lines_outside_the_mapping() {
        let found = filter_findings(
            vec![finding(1, 0.9, "context line"), finding(2, 0.9, "added line")],
            &mapping(),
            0.8,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0.line, 2);
        assert_eq!(found[0].1, 2, "paired with the resolved diff position");
    }

    #[test]
    fn preserves_input_order() {
        let found = filter_findings(
            vec![finding(4, 0.9, "second hunk"), finding(2, 0.9, "first hunk")],
            &mapping(),
            0.8,
        );
        let lines: Vec<u32> = found.iter().map(|(f, _)| f.line).collect();
        assert_eq!(lines, [4, 2], "no reordering by line or position");
    }

    #[test]
    fn empty_inputs_yield_nothing() {
        assert!(filter_findings(Vec::new(), &mapping(), 0.8).is_empty());
        assert!(filter_findings(
            vec![finding(2, 0.9, "x")],
            &compute_line_mapping("").unwrap(),
            0.8
        )
        .is_empty());
    }
}
