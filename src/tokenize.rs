//! Serial token parsing and local duplicate detection.
//!
//! Both entry points are pure functions: [`tokenize_serials`] turns a raw
//! pasted block into an ordered token sequence, and [`scan_duplicates`]
//! reports within-input repeats while producing a first-occurrence working
//! set. Deduplication is deliberately separate from tokenization so callers
//! can report the raw entered count before the working set shrinks.

use std::collections::HashSet;

/// Splits raw multi-line text into trimmed, non-empty serial tokens.
///
/// Lines that are empty after trimming are dropped; relative order of the
/// remaining lines is preserved and duplicates are retained. CRLF line
/// endings are tolerated: `lines` strips the trailing `\r` itself.
pub fn tokenize_serials(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of scanning a token sequence for repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateScan {
    /// Distinct values that appear more than once, in first-seen order.
    pub duplicates: Vec<String>,
    /// First-occurrence deduplication of the input, order preserving.
    pub unique: Vec<String>,
}

impl DuplicateScan {
    /// True when the input contained no repeated values.
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Finds tokens repeated within a single input block.
///
/// Single pass with a seen-set; `unique` is a subsequence of the input by
/// first occurrence.
pub fn scan_duplicates(serials: &[String]) -> DuplicateScan {
    let mut seen: HashSet<&str> = HashSet::with_capacity(serials.len());
    let mut flagged: HashSet<&str> = HashSet::new();
    let mut duplicates = Vec::new();
    let mut unique = Vec::new();

    for serial in serials {
        if seen.insert(serial.as_str()) {
            unique.push(serial.clone());
        } else if flagged.insert(serial.as_str()) {
            duplicates.push(serial.clone());
        }
    }

    DuplicateScan { duplicates, unique }
}
