//! Color names and border glyphs.
//!
//! Renderers tag text with a [`ColorKey`] and ask for border pieces by
//! [`Glyph`]; a [`Theme`] turns both into what the terminal (or Conky) expects.

use std::fmt;
use std::str::FromStr;

use owo_colors::{AnsiColors, OwoColorize};
use serde::{Deserialize, Serialize};

/// Semantic color names understood by every theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    #[default]
    Default,
    Black,
    BrightBlack,
    Red,
    BrightRed,
    Green,
    BrightGreen,
    Yellow,
    BrightYellow,
    Blue,
    BrightBlue,
    Magenta,
    BrightMagenta,
    Cyan,
    BrightCyan,
    White,
    BrightWhite,
}

impl ColorKey {
    pub const ALL: [ColorKey; 17] = [
        ColorKey::Default,
        ColorKey::Black,
        ColorKey::BrightBlack,
        ColorKey::Red,
        ColorKey::BrightRed,
        ColorKey::Green,
        ColorKey::BrightGreen,
        ColorKey::Yellow,
        ColorKey::BrightYellow,
        ColorKey::Blue,
        ColorKey::BrightBlue,
        ColorKey::Magenta,
        ColorKey::BrightMagenta,
        ColorKey::Cyan,
        ColorKey::BrightCyan,
        ColorKey::White,
        ColorKey::BrightWhite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorKey::Default => "default",
            ColorKey::Black => "black",
            ColorKey::BrightBlack => "brightblack",
            ColorKey::Red => "red",
            ColorKey::BrightRed => "brightred",
            ColorKey::Green => "green",
            ColorKey::BrightGreen => "brightgreen",
            ColorKey::Yellow => "yellow",
            ColorKey::BrightYellow => "brightyellow",
            ColorKey::Blue => "blue",
            ColorKey::BrightBlue => "brightblue",
            ColorKey::Magenta => "magenta",
            ColorKey::BrightMagenta => "brightmagenta",
            ColorKey::Cyan => "cyan",
            ColorKey::BrightCyan => "brightcyan",
            ColorKey::White => "white",
            ColorKey::BrightWhite => "brightwhite",
        }
    }

    fn ansi(&self) -> Option<AnsiColors> {
        let color = match self {
            ColorKey::Default => return None,
            ColorKey::Black => AnsiColors::Black,
            ColorKey::BrightBlack => AnsiColors::BrightBlack,
            ColorKey::Red => AnsiColors::Red,
            ColorKey::BrightRed => AnsiColors::BrightRed,
            ColorKey::Green => AnsiColors::Green,
            ColorKey::BrightGreen => AnsiColors::BrightGreen,
            ColorKey::Yellow => AnsiColors::Yellow,
            ColorKey::BrightYellow => AnsiColors::BrightYellow,
            ColorKey::Blue => AnsiColors::Blue,
            ColorKey::BrightBlue => AnsiColors::BrightBlue,
            ColorKey::Magenta => AnsiColors::Magenta,
            ColorKey::BrightMagenta => AnsiColors::BrightMagenta,
            ColorKey::Cyan => AnsiColors::Cyan,
            ColorKey::BrightCyan => AnsiColors::BrightCyan,
            ColorKey::White => AnsiColors::White,
            ColorKey::BrightWhite => AnsiColors::BrightWhite,
        };
        Some(color)
    }

    /// Conky has no bright variants; they fall back to the base color.
    fn conky_name(&self) -> Option<&'static str> {
        let name = match self {
            ColorKey::Default => return None,
            ColorKey::Black | ColorKey::BrightBlack => "black",
            ColorKey::Red | ColorKey::BrightRed => "red",
            ColorKey::Green | ColorKey::BrightGreen => "green",
            ColorKey::Yellow | ColorKey::BrightYellow => "yellow",
            ColorKey::Blue | ColorKey::BrightBlue => "blue",
            ColorKey::Magenta | ColorKey::BrightMagenta => "magenta",
            ColorKey::Cyan | ColorKey::BrightCyan => "cyan",
            ColorKey::White | ColorKey::BrightWhite => "white",
        };
        Some(name)
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ColorKey::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = ColorKey::ALL.iter().map(|c| c.as_str()).collect();
                format!("unknown color: {} (valid: {})", s, valid.join(", "))
            })
    }
}

/// Border pieces used to draw tables and boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// Horizontal line.
    Hrz,
    /// Vertical line.
    Vrt,
    /// Upper left corner.
    Ulc,
    /// Upper right corner.
    Urc,
    /// Lower left corner.
    Llc,
    /// Lower right corner.
    Lrc,
    /// Left tee.
    Lte,
    /// Right tee.
    Rte,
    /// Upper (downward) tee.
    Ute,
    /// Bottom (upward) tee.
    Bte,
    /// Cross.
    Crs,
}

/// How border glyphs are drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtStyle {
    /// VT100 line-drawing character set.
    Fancy,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Plain `-`, `|` and `+`.
    Ascii,
}

impl ArtStyle {
    pub fn glyph(&self, glyph: Glyph) -> &'static str {
        match self {
            ArtStyle::Fancy => match glyph {
                Glyph::Hrz => "\x1b(0\x71\x1b(B",
                Glyph::Vrt => "\x1b(0\x78\x1b(B",
                Glyph::Lrc => "\x1b(0\x6a\x1b(B",
                Glyph::Urc => "\x1b(0\x6b\x1b(B",
                Glyph::Ulc => "\x1b(0\x6c\x1b(B",
                Glyph::Llc => "\x1b(0\x6d\x1b(B",
                Glyph::Crs => "\x1b(0\x6e\x1b(B",
                Glyph::Lte => "\x1b(0\x74\x1b(B",
                Glyph::Rte => "\x1b(0\x75\x1b(B",
                Glyph::Bte => "\x1b(0\x76\x1b(B",
                Glyph::Ute => "\x1b(0\x77\x1b(B",
            },
            ArtStyle::Unicode => match glyph {
                Glyph::Hrz => "\u{2500}",
                Glyph::Vrt => "\u{2502}",
                Glyph::Lrc => "\u{2518}",
                Glyph::Urc => "\u{2510}",
                Glyph::Ulc => "\u{250c}",
                Glyph::Llc => "\u{2514}",
                Glyph::Crs => "\u{253c}",
                Glyph::Lte => "\u{251c}",
                Glyph::Rte => "\u{2524}",
                Glyph::Bte => "\u{2534}",
                Glyph::Ute => "\u{252c}",
            },
            ArtStyle::Ascii => match glyph {
                Glyph::Hrz => "-",
                Glyph::Vrt => "|",
                _ => "+",
            },
        }
    }
}

impl fmt::Display for ArtStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtStyle::Fancy => write!(f, "fancy"),
            ArtStyle::Unicode => write!(f, "unicode"),
            ArtStyle::Ascii => write!(f, "ascii"),
        }
    }
}

impl FromStr for ArtStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fancy" => Ok(ArtStyle::Fancy),
            "unicode" => Ok(ArtStyle::Unicode),
            "ascii" => Ok(ArtStyle::Ascii),
            _ => Err(format!(
                "unknown art style: {} (valid: fancy, unicode, ascii)",
                s
            )),
        }
    }
}

/// Color encoding written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// ANSI escape sequences.
    Ansi,
    /// Conky `${color name}` markup.
    Conky,
    /// No color at all.
    Off,
}

/// Resolves color keys and glyphs for one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub mode: ColorMode,
    pub art: ArtStyle,
}

impl Theme {
    pub fn new(mode: ColorMode, art: ArtStyle) -> Self {
        Self { mode, art }
    }

    /// Uncolored ASCII output, used for pipes and tests.
    pub fn plain() -> Self {
        Self::new(ColorMode::Off, ArtStyle::Ascii)
    }

    pub fn glyph(&self, glyph: Glyph) -> &'static str {
        self.art.glyph(glyph)
    }

    /// Wrap `text` in the encoding for `color`.
    pub fn paint(&self, text: &str, color: ColorKey) -> String {
        match self.mode {
            ColorMode::Off => text.to_string(),
            ColorMode::Ansi => match color.ansi() {
                Some(ansi) => text.color(ansi).to_string(),
                None => text.to_string(),
            },
            ColorMode::Conky => match color.conky_name() {
                Some(name) => format!("${{color {}}}{}${{color}}", name, text),
                None => text.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_key_roundtrip_names() {
        for key in ColorKey::ALL {
            assert_eq!(key.as_str().parse::<ColorKey>().unwrap(), key);
        }
        assert_eq!("BrightRed".parse::<ColorKey>().unwrap(), ColorKey::BrightRed);
        assert!("purple".parse::<ColorKey>().is_err());
    }

    #[test]
    fn test_ansi_paint() {
        let theme = Theme::new(ColorMode::Ansi, ArtStyle::Unicode);
        assert_eq!(theme.paint("x", ColorKey::Red), "\x1b[31mx\x1b[39m");
        assert_eq!(theme.paint("x", ColorKey::BrightRed), "\x1b[91mx\x1b[39m");
        assert_eq!(theme.paint("x", ColorKey::Default), "x");
    }

    #[test]
    fn test_conky_paint() {
        let theme = Theme::new(ColorMode::Conky, ArtStyle::Ascii);
        assert_eq!(theme.paint("x", ColorKey::BrightCyan), "${color cyan}x${color}");
        assert_eq!(theme.paint("x", ColorKey::Default), "x");
    }

    #[test]
    fn test_plain_paint() {
        assert_eq!(Theme::plain().paint("x", ColorKey::Yellow), "x");
    }

    #[test]
    fn test_glyph_styles() {
        assert_eq!(ArtStyle::Ascii.glyph(Glyph::Hrz), "-");
        assert_eq!(ArtStyle::Ascii.glyph(Glyph::Vrt), "|");
        assert_eq!(ArtStyle::Ascii.glyph(Glyph::Crs), "+");
        assert_eq!(ArtStyle::Unicode.glyph(Glyph::Ulc), "┌");
        assert_eq!(ArtStyle::Unicode.glyph(Glyph::Crs), "┼");
        assert_eq!(ArtStyle::Fancy.glyph(Glyph::Hrz), "\x1b(0q\x1b(B");
    }

    #[test]
    fn test_art_style_from_str() {
        assert_eq!("Fancy".parse::<ArtStyle>().unwrap(), ArtStyle::Fancy);
        assert!("round".parse::<ArtStyle>().is_err());
    }
}
