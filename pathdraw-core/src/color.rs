//! # Colors
//!
//! Paints as the host UI hands them to us: CSS-ish strings. They are parsed once at the mutation
//! boundary, so everything past [`Paint`] is well-formed.

/// An 8-bit, non-premultiplied sRGB color with alpha.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}
impl Color {
    pub const BLACK: Self = Self::opaque(0, 0, 0);
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
    #[must_use]
    pub const fn as_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
    /// `#rrggbb`, ignoring alpha. See [`Self::opacity`].
    #[must_use]
    pub fn hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
    /// Alpha as a `[0, 1]` float.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

/// What a path's fill or stroke is painted with.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Paint {
    None,
    Color(Color),
}
impl Paint {
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        match self {
            Self::None => None,
            // Fully transparent is as good as nothing for every consumer.
            Self::Color(color) if color.a == 0 => None,
            Self::Color(color) => Some(*color),
        }
    }
}
impl From<Color> for Paint {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}
impl std::fmt::Display for Paint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Color(color) if color.a == 255 => f.write_str(&color.hex_rgb()),
            Self::Color(color) => write!(
                f,
                "rgba({},{},{},{})",
                color.r,
                color.g,
                color.b,
                color.opacity()
            ),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("empty color")]
    Empty,
    #[error("malformed hex color {0:?}")]
    BadHex(String),
    #[error("malformed functional color {0:?}")]
    BadFunction(String),
    #[error("unknown color name {0:?}")]
    UnknownName(String),
}

/// The CSS names that show up in practice. Not the full CSS table.
const NAMED: &[(&str, Color)] = &[
    ("black", Color::opaque(0, 0, 0)),
    ("white", Color::opaque(255, 255, 255)),
    ("red", Color::opaque(255, 0, 0)),
    ("green", Color::opaque(0, 128, 0)),
    ("lime", Color::opaque(0, 255, 0)),
    ("blue", Color::opaque(0, 0, 255)),
    ("yellow", Color::opaque(255, 255, 0)),
    ("cyan", Color::opaque(0, 255, 255)),
    ("aqua", Color::opaque(0, 255, 255)),
    ("magenta", Color::opaque(255, 0, 255)),
    ("fuchsia", Color::opaque(255, 0, 255)),
    ("orange", Color::opaque(255, 165, 0)),
    ("purple", Color::opaque(128, 0, 128)),
    ("pink", Color::opaque(255, 192, 203)),
    ("brown", Color::opaque(165, 42, 42)),
    ("gray", Color::opaque(128, 128, 128)),
    ("grey", Color::opaque(128, 128, 128)),
    ("silver", Color::opaque(192, 192, 192)),
    ("navy", Color::opaque(0, 0, 128)),
    ("teal", Color::opaque(0, 128, 128)),
    ("maroon", Color::opaque(128, 0, 0)),
    ("olive", Color::opaque(128, 128, 0)),
];

impl std::str::FromStr for Paint {
    type Err = ColorParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColorParseError::Empty);
        }
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "none" => return Ok(Self::None),
            "transparent" => return Ok(Self::Color(Color { a: 0, ..Color::BLACK })),
            _ => (),
        }
        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).map(Self::Color);
        }
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            return parse_rgb_function(args).map(Self::Color);
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| Self::Color(*color))
            .ok_or(ColorParseError::UnknownName(s.to_owned()))
    }
}

fn parse_hex(hex: &str) -> Result<Color, ColorParseError> {
    let bad = || ColorParseError::BadHex(hex.to_owned());
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let nibble = |idx: usize| u8::from_str_radix(&hex[idx..=idx], 16).map_err(|_| bad());
    let byte = |idx: usize| u8::from_str_radix(&hex[idx..idx + 2], 16).map_err(|_| bad());
    // Short forms repeat each nibble: #f80 == #ff8800
    match hex.len() {
        3 | 4 => {
            let expand = |idx| nibble(idx).map(|n| n * 17);
            Ok(Color {
                r: expand(0)?,
                g: expand(1)?,
                b: expand(2)?,
                a: if hex.len() == 4 { expand(3)? } else { 255 },
            })
        }
        6 | 8 => Ok(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if hex.len() == 8 { byte(6)? } else { 255 },
        }),
        _ => Err(bad()),
    }
}

fn parse_rgb_function(args: &str) -> Result<Color, ColorParseError> {
    let bad = || ColorParseError::BadFunction(args.to_owned());
    let inner = args.strip_suffix(')').ok_or_else(bad)?;
    let parts: smallvec::SmallVec<[&str; 4]> = inner.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(bad());
    }
    let channel = |s: &str| -> Result<u8, ColorParseError> {
        let value: f32 = s.parse().map_err(|_| bad())?;
        if !value.is_finite() {
            return Err(bad());
        }
        Ok(az::saturating_cast(value.round().clamp(0.0, 255.0)))
    };
    let alpha = match parts.get(3) {
        None => 255,
        Some(s) => {
            let value: f32 = s.parse().map_err(|_| bad())?;
            if !value.is_finite() {
                return Err(bad());
            }
            az::saturating_cast((value.clamp(0.0, 1.0) * 255.0).round())
        }
    };
    Ok(Color {
        r: channel(parts[0])?,
        g: channel(parts[1])?,
        b: channel(parts[2])?,
        a: alpha,
    })
}
