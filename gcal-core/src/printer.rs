//! Output sink for rendered text.
//!
//! Renderers never build escape sequences themselves. They hand text plus a
//! [`ColorKey`] to a [`Printer`], which resolves it through its [`Theme`].

use std::io::{self, Write};

use crate::theme::{ColorKey, Glyph, Theme};

/// A run of text in a single color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub color: ColorKey,
}

/// One output line made of colored spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<Span>,
}

impl StyledLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A line holding a single span.
    pub fn single(text: impl Into<String>, color: ColorKey) -> Self {
        let mut line = Self::new();
        line.push(text, color);
        line
    }

    pub fn push(&mut self, text: impl Into<String>, color: ColorKey) {
        self.spans.push(Span {
            text: text.into(),
            color,
        });
    }
}

/// Writes colored text and border glyphs to any [`Write`] target.
pub struct Printer<W: Write> {
    out: W,
    theme: Theme,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Write `text` in `color`.
    pub fn msg(&mut self, text: &str, color: ColorKey) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let painted = self.theme.paint(text, color);
        self.out.write_all(painted.as_bytes())
    }

    /// Write a single border glyph in `color`.
    pub fn art(&mut self, glyph: Glyph, color: ColorKey) -> io::Result<()> {
        let text = self.theme.glyph(glyph);
        self.msg(text, color)
    }

    pub fn newline(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n")
    }

    /// Write every span of `line` followed by a newline.
    pub fn line(&mut self, line: &StyledLine) -> io::Result<()> {
        for span in &line.spans {
            self.msg(&span.text, span.color)?;
        }
        self.newline()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Printer<Vec<u8>> {
    /// Printer that collects output in memory.
    pub fn buffer(theme: Theme) -> Self {
        Self::new(Vec::new(), theme)
    }

    /// Collected output as a string.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.out).into_owned()
    }
}
