//! Re-flowing label source to a width
//!
//! Wrapping edits the source: the result is new text whose lines, once
//! segmented again, are the wrapped lines. Math is placed whole. A math
//! span wider than the limit gets a line of its own rather than being cut.

use icu_segmenter::GraphemeClusterSegmenter;

use mathlabel_core::{types::SegmentKind, LabelStyle};
use mathlabel_segment::{normalize_newlines, MathSegmenter};

use crate::LayoutEngine;

impl LayoutEngine {
    /// Wrap `text` so every line fits `max_width` where possible
    pub fn wrap(&self, text: &str, style: &LabelStyle, max_width: f32) -> String {
        let ready = self.typesetter().is_loaded();
        self.wrap_with(text, style, max_width, ready)
    }

    /// Word-wrap `text` as literal text, one source line at a time
    pub fn wrap_plain_text(&self, text: &str, style: &LabelStyle, max_width: f32) -> String {
        let fonts = self.fonts();
        let width_of = |s: &str| fonts.advance(s, style.font_size);
        normalize_newlines(text)
            .split('\n')
            .flat_map(|line| wrap_plain(line, max_width, width_of))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn wrap_with(&self, text: &str, style: &LabelStyle, max_width: f32, ready: bool) -> String {
        let segmenter = MathSegmenter::new(style.opts);
        let source = segmenter.consume_math_newlines(text);
        if style.opts.math_only {
            // Math-only input has no places to break
            return source;
        }

        let mut out: Vec<String> = Vec::new();
        for line in source.split('\n') {
            self.wrap_line(line, &segmenter, style, max_width, ready, &mut out);
        }
        out.join("\n")
    }

    fn wrap_line(
        &self,
        line: &str,
        segmenter: &MathSegmenter,
        style: &LabelStyle,
        max_width: f32,
        ready: bool,
        out: &mut Vec<String>,
    ) {
        let notation = style.opts.notation;
        let font_size = style.font_size;
        let fonts = self.fonts();
        let width_of = |s: &str| fonts.advance(s, font_size);
        let space = width_of(" ");

        let first_out = out.len();
        let mut current = String::new();
        let mut cur_width = 0.0f32;

        let segments = segmenter.segment_line(line);
        for (index, segment) in segments.iter().filter(|s| !s.is_empty()).enumerate() {
            match segment.kind {
                SegmentKind::Math => {
                    let item = segment.source(notation);
                    let width = self.segment_box(segment, style, ready).metrics.width;
                    if width > max_width {
                        if !current.is_empty() {
                            out.push(std::mem::take(&mut current));
                        }
                        out.push(item);
                        cur_width = 0.0;
                    } else if cur_width + width > max_width {
                        if !current.is_empty() {
                            out.push(std::mem::take(&mut current));
                        }
                        current = item;
                        cur_width = width;
                    } else {
                        current.push_str(&item);
                        cur_width += width;
                    }
                },
                SegmentKind::Text => {
                    let starts_wrapped_line =
                        current.is_empty() && (index > 0 || out.len() > first_out);
                    let item = if starts_wrapped_line {
                        segment.content.trim_start()
                    } else {
                        segment.content.as_str()
                    };

                    let words: Vec<&str> = item.split(' ').collect();
                    let mut taken = 0;
                    while taken < words.len() {
                        let word_width = width_of(words[taken]);
                        if cur_width + word_width > max_width {
                            break;
                        }
                        current.push_str(words[taken]);
                        cur_width += word_width;
                        taken += 1;
                        if taken < words.len() {
                            if cur_width + space > max_width {
                                break;
                            }
                            current.push(' ');
                            cur_width += space;
                        }
                    }

                    let rest = words[taken..].join(" ");
                    let rest = rest.trim_start();
                    if rest.is_empty() {
                        continue;
                    }
                    if !current.is_empty() {
                        if current.ends_with(' ') {
                            current.pop();
                        }
                        out.push(std::mem::take(&mut current));
                    }
                    let mut wrapped = wrap_plain(rest, max_width, width_of);
                    current = wrapped.pop().unwrap_or_default();
                    cur_width = width_of(&current);
                    out.extend(wrapped);
                },
            }
        }

        // A source line always yields at least one line; a break left
        // behind by trailing oversized math does not
        if !current.is_empty() || out.len() == first_out {
            out.push(current);
        }
    }
}

/// Greedy word wrap of plain text
///
/// Breaks at spaces; a word wider than `max_width` on its own is broken
/// between grapheme clusters. Always returns at least one line.
pub fn wrap_plain(text: &str, max_width: f32, width_of: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if width_of(&candidate) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if width_of(word) <= max_width {
            current = word.to_string();
            continue;
        }

        let breaks: Vec<usize> = GraphemeClusterSegmenter::new().segment_str(word).collect();
        for pair in breaks.windows(2) {
            let grapheme = &word[pair[0]..pair[1]];
            let mut extended = current.clone();
            extended.push_str(grapheme);
            if current.is_empty() || width_of(&extended) <= max_width {
                current = extended;
            } else {
                lines.push(std::mem::replace(&mut current, grapheme.to_string()));
            }
        }
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn plain_wrap_breaks_at_spaces() {
        assert_eq!(wrap_plain("aa bb cc", 5.0, chars), vec!["aa bb", "cc"]);
    }

    #[test]
    fn plain_wrap_breaks_long_words() {
        assert_eq!(wrap_plain("abcdefg", 3.0, chars), vec!["abc", "def", "g"]);
        assert_eq!(wrap_plain("x abcd", 3.0, chars), vec!["x", "abc", "d"]);
    }

    #[test]
    fn plain_wrap_keeps_clusters_whole() {
        let lines = wrap_plain("e\u{301}e\u{301}e\u{301}", 2.0, chars);
        assert_eq!(lines, vec!["e\u{301}", "e\u{301}", "e\u{301}"]);
    }

    #[test]
    fn plain_wrap_of_empty_is_one_empty_line() {
        assert_eq!(wrap_plain("", 3.0, chars), vec![String::new()]);
    }
}
