// this_file: crates/mathlabel-segment/src/lib.rs

//! Cutting label source into text and math segments.
//!
//! A line always starts with a text segment and then alternates, so
//! `\(x\)` becomes `["", x, ""]`. Empty segments are kept on purpose: the
//! layout engine walks segments and their measured boxes side by side and
//! relies on that one-to-one alignment.

use mathlabel_core::{
    types::{Notation, Segment},
    MathOpts,
};
use unicode_bidi::BidiInfo;

/// Turn every `\r\n` and lone `\r` into `\n`
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Whether a line reads right to left, judged by its first strong character
pub fn is_rtl(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let bidi = BidiInfo::new(text, None);
    bidi.paragraphs
        .first()
        .map(|paragraph| paragraph.level.is_rtl())
        .unwrap_or(false)
}

/// Delimiter-aware segmenter for one notation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathSegmenter {
    opts: MathOpts,
}

impl MathSegmenter {
    pub fn new(opts: MathOpts) -> Self {
        Self { opts }
    }

    pub fn opts(&self) -> MathOpts {
        self.opts
    }

    /// Split normalized source into lines of segments
    pub fn segment(&self, text: &str) -> Vec<Vec<Segment>> {
        self.consume_math_newlines(text)
            .split('\n')
            .map(|line| self.segment_line(line))
            .collect()
    }

    /// Split one line, which must not contain a newline
    pub fn segment_line(&self, line: &str) -> Vec<Segment> {
        if self.opts.math_only {
            return vec![Segment::math(line)];
        }
        split_delimited(line, self.opts.notation)
    }

    /// Normalize newlines, then let math run across them
    ///
    /// Newlines inside a math span become spaces so a span typed over
    /// several lines stays one segment. In math-only mode the whole input
    /// is math: the LaTeX-like notation joins it into one line while the
    /// compact notation keeps its lines.
    pub fn consume_math_newlines(&self, text: &str) -> String {
        let text = normalize_newlines(text);
        if self.opts.math_only {
            return match self.opts.notation {
                Notation::Tex => text.replace('\n', " "),
                Notation::AsciiMath => text,
            };
        }
        if !text.contains('\n') {
            return text;
        }

        let notation = self.opts.notation;
        split_delimited(&text, notation)
            .into_iter()
            .map(|mut segment| {
                if segment.is_math() && segment.content.contains('\n') {
                    segment.content = segment.content.replace('\n', " ");
                }
                segment.source(notation)
            })
            .collect()
    }

    /// Rebuild one line of source from its segments
    pub fn join_line(&self, segments: &[Segment]) -> String {
        if self.opts.math_only {
            return segments.iter().map(|s| s.content.as_str()).collect();
        }
        join_segments(segments, self.opts.notation)
    }

    /// Rebuild the whole source from lines of segments
    pub fn join(&self, lines: &[Vec<Segment>]) -> String {
        lines
            .iter()
            .map(|line| self.join_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Concatenate segments, putting delimiters back around math
pub fn join_segments(segments: &[Segment], notation: Notation) -> String {
    segments.iter().map(|s| s.source(notation)).collect()
}

fn split_delimited(text: &str, notation: Notation) -> Vec<Segment> {
    let start = notation.start_delimiter();
    let end = notation.end_delimiter();
    let mut segments = Vec::new();
    let mut rest = text;

    loop {
        let Some(open) = rest.find(start) else {
            segments.push(Segment::text(rest));
            return segments;
        };
        segments.push(Segment::text(&rest[..open]));
        rest = &rest[open + start.len()..];

        match rest.find(end) {
            Some(close) => {
                segments.push(Segment::math(&rest[..close]));
                rest = &rest[close + end.len()..];
            },
            None => {
                log::trace!("unterminated math span runs to end of line");
                segments.push(Segment::unterminated_math(rest));
                return segments;
            },
        }
    }
}
