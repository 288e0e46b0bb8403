//! Annotation scanner over unified diff text.
//!
//! The scanner walks a unified diff and reports every added line whose
//! content carries the annotation marker at a comment position. Removed
//! and context lines never produce candidates, so annotations that merely
//! moved are not re-detected. Deduplication against the store happens in
//! the commit workflow, not here.
//!
//! Recognized comment introducers: `//`, `#`, `;`, `--`, `*`, `/*` and
//! `<!--`. The marker token itself is configurable (default `TODO`) and
//! matched case-sensitively, followed by `:` or a word boundary. Trailing
//! `*/` or `-->` closers are stripped from the captured text.

use anyhow::Context;
use regex::Regex;

use crate::error::{Result, SnagError};

/// A newly discovered annotation: where it is and what it says
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub file: String,
    pub line: u32,
    pub text: String,
}

/// Scan result: candidates from every file that parsed, plus one
/// `DiffParse` failure per file that did not.
///
/// A file that fails to parse contributes no candidates at all, but other
/// files in the same diff are unaffected.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: Vec<Candidate>,
    pub failures: Vec<SnagError>,
}

/// Diff scanner configured with a marker token
pub struct Scanner {
    marker: Regex,
    hunk_header: Regex,
}

impl Scanner {
    /// Build a scanner for the given marker token, e.g. "TODO"
    pub fn new(marker: &str) -> Result<Self> {
        let escaped = regex::escape(marker);
        let marker = Regex::new(&format!(
            r"^.*?(?://+|#|;+|--|/\*+|\*|<!--)\s*{escaped}(?::|\b)\s*(.*?)\s*(?:\*/|-->)?\s*$"
        ))
        .context("invalid annotation marker")?;

        let hunk_header = Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@")
            .context("hunk header pattern")?;

        Ok(Self {
            marker,
            hunk_header,
        })
    }

    /// Extract the annotation text from one source line, if it carries
    /// the marker
    pub fn annotation_text<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.marker
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Scan a unified diff and report every added annotation line.
    ///
    /// Line numbers follow the new-file counter embedded in each hunk
    /// header: the counter starts at the hunk's `+c` value and increments
    /// for every context or added line.
    pub fn scan(&self, diff: &str) -> ScanReport {
        let mut report = ScanReport::default();
        let mut file = FileState::default();

        for line in diff.lines() {
            if line.starts_with("diff ") {
                file.flush(&mut report);
                continue;
            }

            if !file.in_hunk {
                if let Some(rest) = line.strip_prefix("+++ ") {
                    file.flush(&mut report);
                    file.begin(rest);
                    continue;
                }
                if line.starts_with("--- ") {
                    continue;
                }
            }

            if line.starts_with("@@") {
                file.begin_hunk(line, &self.hunk_header, &mut report);
                continue;
            }

            file.hunk_line(line, self);
        }

        file.flush(&mut report);
        report
    }
}

/// Per-file scanning state, reset at each file header
#[derive(Debug, Default)]
struct FileState {
    name: Option<String>,
    failed: bool,
    candidates: Vec<Candidate>,
    in_hunk: bool,
    new_line: u32,
    old_remaining: u64,
    new_remaining: u64,
}

impl FileState {
    /// Commit this file's candidates to the report and reset
    fn flush(&mut self, report: &mut ScanReport) {
        if !self.failed {
            report.candidates.append(&mut self.candidates);
        }
        *self = Self::default();
    }

    /// Start a new file section from the `+++` header remainder
    fn begin(&mut self, header_rest: &str) {
        let name = header_rest
            .strip_prefix("b/")
            .unwrap_or(header_rest)
            .trim_end();
        // +++ /dev/null marks a deletion: nothing can be added there
        if name != "/dev/null" {
            self.name = Some(name.to_string());
        }
    }

    /// Parse a hunk header, or mark the whole file failed
    fn begin_hunk(&mut self, line: &str, pattern: &Regex, report: &mut ScanReport) {
        if self.failed {
            return;
        }
        let Some(name) = self.name.clone() else {
            report
                .failures
                .push(SnagError::diff_parse("(unknown)", "hunk before file header"));
            self.failed = true;
            return;
        };

        match parse_hunk_header(line, pattern) {
            Some((new_start, old_count, new_count)) => {
                self.in_hunk = true;
                self.new_line = new_start;
                self.old_remaining = old_count;
                self.new_remaining = new_count;
            }
            None => {
                // No partial results for a file that fails to parse
                self.candidates.clear();
                self.failed = true;
                self.in_hunk = false;
                report.failures.push(SnagError::diff_parse(
                    name,
                    format!("malformed hunk header: {line}"),
                ));
            }
        }
    }

    /// Account for one line of hunk content
    fn hunk_line(&mut self, line: &str, scanner: &Scanner) {
        if !self.in_hunk || self.failed {
            return;
        }

        match line.as_bytes().first() {
            Some(b'+') => {
                if let Some(name) = &self.name {
                    if let Some(text) = scanner.annotation_text(&line[1..]) {
                        self.candidates.push(Candidate {
                            file: name.clone(),
                            line: self.new_line,
                            text: text.to_string(),
                        });
                    }
                }
                self.new_line += 1;
                self.new_remaining = self.new_remaining.saturating_sub(1);
            }
            Some(b'-') => {
                self.old_remaining = self.old_remaining.saturating_sub(1);
            }
            Some(b' ') | None => {
                self.new_line += 1;
                self.old_remaining = self.old_remaining.saturating_sub(1);
                self.new_remaining = self.new_remaining.saturating_sub(1);
            }
            // "\ No newline at end of file" and anything else
            _ => return,
        }

        if self.old_remaining == 0 && self.new_remaining == 0 {
            self.in_hunk = false;
        }
    }
}

/// Parse `@@ -a,b +c,d @@`, returning (c, b, d); omitted counts mean 1
fn parse_hunk_header(line: &str, pattern: &Regex) -> Option<(u32, u64, u64)> {
    let caps = pattern.captures(line)?;
    let new_start: u32 = caps.get(3)?.as_str().parse().ok()?;
    let old_count: u64 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    let new_count: u64 = match caps.get(4) {
        Some(m) => m.as_str().parse().ok()?,
        None => 1,
    };
    Some((new_start, old_count, new_count))
}
