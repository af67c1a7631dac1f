//! Splitting test documents into addressable case segments.

use crate::domain::model::{TestDocument, TestSegment};

/// Literal that terminates a test-case query inside a test file.
pub const CASE_DELIMITER: &str = "----";

/// Ordered segments of one scanned document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMap {
    segments: Vec<TestSegment>,
}

impl SegmentMap {
    /// Number of case segments; the whole-file segment 0 is not counted.
    pub fn case_count(&self) -> usize {
        self.segments.len() - 1
    }

    /// All segments in document order, the whole-file segment first.
    pub fn segments(&self) -> &[TestSegment] {
        &self.segments
    }

    /// Look up a segment by index; 0 addresses the whole file.
    pub fn get(&self, index: usize) -> Option<&TestSegment> {
        self.segments.get(index)
    }
}

/// Scans document text for case delimiters.
///
/// The scan is pure and cheap enough to re-run on every request, so segment
/// indices always reflect the document as it is right now.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentScanner;

impl SegmentScanner {
    pub fn new() -> Self {
        Self
    }

    /// Produce the segment map for `document`.
    ///
    /// Segment 0 runs every case and is anchored to the first line even when
    /// the document contains no delimiter at all. Each delimiter occurrence
    /// after that contributes one case segment; occurrences do not overlap,
    /// so a run of eight dashes counts as two.
    pub fn scan(&self, document: &TestDocument) -> SegmentMap {
        let text = document.text.as_str();
        let mut segments = vec![TestSegment {
            index: 0,
            start: 0,
            end: text.find('\n').unwrap_or(text.len()),
        }];

        let mut cursor = 0;
        while let Some(found) = text[cursor..].find(CASE_DELIMITER) {
            let offset = cursor + found;
            let (start, end) = line_bounds(text, offset);
            segments.push(TestSegment {
                index: segments.len(),
                start,
                end,
            });
            cursor = offset + CASE_DELIMITER.len();
        }

        SegmentMap { segments }
    }
}

/// Human-readable listing of a document's segments, one row per segment.
pub fn render_overview(document: &TestDocument, map: &SegmentMap) -> String {
    let name = document
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("<document>");
    let count = map.case_count();
    let noun = if count == 1 { "case" } else { "cases" };

    let mut out = format!("{name}: {count} {noun}\n");
    for segment in map.segments() {
        let line = line_number(&document.text, segment.start);
        let text = document.text[segment.start..segment.end].trim();
        let label = match segment.index {
            0 => "all".to_string(),
            index => index.to_string(),
        };
        let row = format!("{label:>4}  line {line}  {text}");
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

/// Byte offsets of the line containing `offset`, end exclusive.
fn line_bounds(text: &str, offset: usize) -> (usize, usize) {
    let start = text[..offset].rfind('\n').map(|pos| pos + 1).unwrap_or(0);
    let end = text[offset..]
        .find('\n')
        .map(|pos| offset + pos)
        .unwrap_or(text.len());
    (start, end)
}

/// 1-based line number of the byte at `offset`.
fn line_number(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|byte| *byte == b'\n').count() + 1
}
