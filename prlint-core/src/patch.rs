//! Diff position mapper.
//!
//! The commenting API does not address comments by file line number: it
//! wants the *diff position*, a zero-based offset into the file's patch
//! blob counted over every physical line, hunk headers included. This
//! module scans a single file's unified-diff text once and records, for
//! every line the change *added*, where that line sits in the blob.
//!
//! Context and removed lines are deliberately absent from the mapping —
//! they are not commentable in a review of this change.

use std::collections::BTreeMap;

use thiserror::Error;

/// A malformed patch blob. Scoped to one file; the caller gets no partial
/// mapping and must skip that file, not the invocation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The patch text is non-empty but does not open with an `@@` hunk
    /// header, so there is no new-file start to count lines from.
    #[error("patch does not begin with a hunk header: {0:?}")]
    MissingHunkHeader(String),
    /// A hunk header was recognized but its new-file start value is absent
    /// or non-numeric.
    #[error("malformed hunk header: {0:?}")]
    MalformedHunkHeader(String),
}

/// Mapping from new-file line number to diff position for one file's patch.
///
/// Iteration order is line order, and because additions are recorded in
/// scan order the positions are strictly increasing. Used for membership
/// and position lookup only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineMapping {
    entries: BTreeMap<u32, usize>,
}

impl LineMapping {
    /// Returns the diff position for `line`, or `None` if the change did
    /// not add that line.
    pub fn position_of(&self, line: u32) -> Option<usize> {
        self.entries.get(&line).copied()
    }

    /// Number of added (commentable) lines in the patch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the patch added no lines at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(line, position)` pairs in ascending line order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.entries.iter().map(|(&l, &p)| (l, p))
    }
}

/// Scans one file's unified-diff text into a [`LineMapping`].
///
/// Two counters drive the scan: the current line number in the *new* file,
/// seeded by each hunk header's `+<start>` value, and the position, which
/// advances on every physical line of the blob regardless of kind.
///
/// - hunk header — reseeds the line counter; maps nothing itself
/// - addition (`+`, but not `++`) — records `line → position`, then
///   advances the line counter
/// - removal (`-`) — advances neither counter's line tracking
/// - anything else, blank lines included — context; advances the line
///   counter only
///
/// An empty (or whitespace-only) patch yields an empty mapping.
///
/// # Errors
///
/// Returns [`PatchError::MissingHunkHeader`] when a non-empty patch does
/// not open with a hunk header, and [`PatchError::MalformedHunkHeader`]
/// when a header's new-file start cannot be parsed. Both are hard errors:
/// a mapping built from a mis-seeded line counter would attach comments to
/// the wrong lines, which is worse than no comments.
pub fn compute_line_mapping(patch_text: &str) -> Result<LineMapping, PatchError> {
    let mut entries = BTreeMap::new();
    if patch_text.trim().is_empty() {
        return Ok(LineMapping { entries });
    }

    // Line number in the new (post-change) file; valid only after the
    // first hunk header has been seen.
    let mut line_number: u32 = 0;
    let mut seen_header = false;

    for (position, text) in patch_text.lines().enumerate() {
        if text.starts_with("@@") {
            line_number = parse_new_start(text)?;
            seen_header = true;
        } else if !seen_header {
            return Err(PatchError::MissingHunkHeader(text.to_owned()));
        } else if text.starts_with('+') && !text.starts_with("++") {
            entries.insert(line_number, position);
            line_number += 1;
        } else if !text.starts_with('-') {
            line_number += 1;
        }
        // position is simply the enumerate index: every physical line
        // counts, headers and removals included.
    }

    Ok(LineMapping { entries })
}

/// Parses the new-file start (the number after `+`) out of a hunk header
/// like `@@ -114,6 +114,7 @@ func convertToNQuad(...) {`.
///
/// Only the header body between the two `@@` delimiters is searched, so a
/// `+` in the trailing section heading cannot be mistaken for the range.
fn parse_new_start(header: &str) -> Result<u32, PatchError> {
    let malformed = || PatchError::MalformedHunkHeader(header.to_owned());

    let body = &header[2..];
    let body = &body[..body.find("@@").unwrap_or(body.len())];
    let after_plus = &body[body.find('+').ok_or_else(malformed)? + 1..];

    let digits: &str = after_plus
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    if digits.is_empty() {
        return Err(malformed());
    }
    digits.parse::<u32>().map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two-hunk patch from a real dgraph pull request; the expected
    // positions (117 → 4, 182 → 13) are the golden values the commenting
    // API accepted for it.
    const DGRAPH_PATCH: &str = "\
@@ -114,6 +114,7 @@ func convertToNQuad(ctx context.Context, mutation string) ([]rdf.NQuad, error) {
 	var nquads []rdf.NQuad
 	r := strings.NewReader(mutation)
 	scanner := bufio.NewScanner(r)
+	x.Trace(ctx, \"Converting to NQuad\")

 	// Scanning the mutation string, one line at a time.
 	for scanner.Scan() {
@@ -178,21 +179,11 @@ func convertToEdges(ctx context.Context, nquads []rdf.NQuad) (mutationResult, er
 }

 func applyMutations(ctx context.Context, m worker.Mutations) error {
-	left, err := worker.MutateOverNetwork(ctx, m)
+	err := worker.MutateOverNetwork(ctx, m)
 	if err != nil {
 		x.TraceError(ctx, x.Wrapf(err, \"Error while MutateOverNetwork\"))
 		return err
 	}";

    #[test]
    fn maps_only_added_lines_in_two_hunk_patch() {
        let mapping = compute_line_mapping(DGRAPH_PATCH).unwrap();
        assert_eq!(mapping.len(), 2, "exactly the two added lines map");
        assert_eq!(mapping.position_of(117), Some(4));
        assert_eq!(mapping.position_of(182), Some(13));
        // Context and removed lines never appear.
        assert_eq!(mapping.position_of(114), None);
        assert_eq!(mapping.position_of(181), None);
    }

    #[test]
    fn positions_strictly_increase_in_scan_order() {
        let mapping = compute_line_mapping(DGRAPH_PATCH).unwrap();
        let positions: Vec<usize> = mapping.iter().map(|(_, p)| p).collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "positions must strictly increase: {positions:?}"
        );
    }

    #[test]
    fn creation_hunk_maps_every_addition() {
        let patch = "\
@@ -0,0 +1,9 @@
+package dummy
+
+type ErrID struct {
+	a int
+}
+
+type errId struct {
+	b int
+}";
        let mapping = compute_line_mapping(patch).unwrap();
        assert_eq!(mapping.len(), 9, "one entry per added line");
        for (i, (line, position)) in mapping.iter().enumerate() {
            assert_eq!(line as usize, i + 1, "lines start at 1");
            assert_eq!(position, i + 1, "positions start after the header");
        }
    }

    #[test]
    fn added_blank_line_is_an_addition() {
        let patch = "@@ -1,2 +1,3 @@\n context\n+\n context";
        let mapping = compute_line_mapping(patch).unwrap();
        assert_eq!(mapping.position_of(2), Some(2));
    }

    #[test]
    fn empty_patch_yields_empty_mapping() {
        assert!(compute_line_mapping("").unwrap().is_empty());
        assert!(compute_line_mapping("\n").unwrap().is_empty());
    }

    #[test]
    fn patch_without_leading_header_is_rejected() {
        let err = compute_line_mapping("+added line\n context").unwrap_err();
        assert!(matches!(err, PatchError::MissingHunkHeader(_)));
    }

    #[test]
    fn non_numeric_new_start_is_rejected() {
        let err = compute_line_mapping("@@ -1,2 +x,3 @@\n+line").unwrap_err();
        assert!(matches!(err, PatchError::MalformedHunkHeader(_)));
    }

    #[test]
    fn header_without_new_range_is_rejected() {
        let err = compute_line_mapping("@@ garbage @@\n+line").unwrap_err();
        assert!(matches!(err, PatchError::MalformedHunkHeader(_)));
    }

    #[test]
    fn plus_in_section_heading_is_not_the_range() {
        // The trailer after the closing @@ may contain anything, including
        // a '+'; only the header body is searched for the new-file start.
        let patch = "@@ -5,2 +7,3 @@ fn add(a: i32) -> i32 { a + 1 }\n context\n+added\n context";
        let mapping = compute_line_mapping(patch).unwrap();
        assert_eq!(mapping.position_of(8), Some(2));
    }

    #[test]
    fn removals_advance_neither_counter() {
        let patch = "\
@@ -10,4 +10,3 @@
 keep
-drop me
-drop me too
+replacement
 keep";
        let mapping = compute_line_mapping(patch).unwrap();
        assert_eq!(mapping.len(), 1);
        // line 10 is context, so the replacement lands on line 11 and sits
        // at position 4 of the blob (header, keep, two removals before it).
        assert_eq!(mapping.position_of(11), Some(4));
    }
}
