//! Line breaking under a column budget.
//!
//! Breaks prefer an embedded newline, then the last whitespace boundary that
//! fits. A word is only split when it cannot fit on a line of its own.

use crate::width::{char_width, display_width};

/// Where to break a string so the first part fits a column budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cut {
    /// Printed width of `text[..index]`.
    pub width: usize,
    /// Byte index where the printed part ends.
    pub index: usize,
    /// Byte index where the remainder starts. Differs from `index` only when
    /// the break consumed a newline.
    pub resume: usize,
}

impl Cut {
    fn at(text: &str, index: usize) -> Self {
        Self {
            width: display_width(&text[..index]),
            index,
            resume: index,
        }
    }
}

/// Find where to cut `text` so that its first line fits in `budget` columns.
///
/// For non-empty input `resume` is always greater than zero, and so is `index`
/// unless the text starts with a newline. Callers that keep cutting the
/// remainder always make progress.
pub fn find_cut(text: &str, budget: usize) -> Cut {
    if let Some(nl) = text.find('\n') {
        let width = display_width(&text[..nl]);
        if width <= budget {
            return Cut {
                width,
                index: nl,
                resume: nl + 1,
            };
        }
    }

    let width = display_width(text);
    if width <= budget {
        return Cut {
            width,
            index: text.len(),
            resume: text.len(),
        };
    }

    word_boundary_cut(text, budget)
}

fn word_boundary_cut(text: &str, budget: usize) -> Cut {
    let mut end = 0;
    for (i, (start, word)) in words(text).enumerate() {
        let word_end = start + word.len();
        if display_width(&text[..word_end]) > budget {
            if i == 0 {
                return mid_word_cut(text, budget);
            }
            return Cut::at(text, end);
        }
        end = word_end;
    }
    if end == 0 {
        // Only whitespace fits the budget.
        return mid_word_cut(text, budget);
    }
    Cut::at(text, end)
}

/// Cut inside the first word at the last character that still fits.
///
/// A lone character wider than the budget is taken anyway.
fn mid_word_cut(text: &str, budget: usize) -> Cut {
    let mut width = 0;
    for (idx, c) in text.char_indices() {
        let w = char_width(c);
        if width + w > budget {
            if idx == 0 {
                let len = c.len_utf8();
                return Cut {
                    width: w,
                    index: len,
                    resume: len,
                };
            }
            return Cut {
                width,
                index: idx,
                resume: idx,
            };
        }
        width += w;
    }
    Cut {
        width,
        index: text.len(),
        resume: text.len(),
    }
}

fn words(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let base = text.as_ptr() as usize;
    text.split_whitespace()
        .map(move |word| (word.as_ptr() as usize - base, word))
}

/// Wrap `text` into lines no wider than `width` columns.
///
/// Embedded newlines are kept as paragraph breaks; blank paragraphs become
/// empty lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut rest = paragraph.trim();
        if rest.is_empty() {
            lines.push(String::new());
            continue;
        }
        while !rest.is_empty() {
            let cut = find_cut(rest, width);
            lines.push(rest[..cut.index].trim_end().to_string());
            rest = rest[cut.resume..].trim_start();
        }
    }
    lines
}
