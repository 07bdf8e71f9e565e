use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque 8-bit RGB colour. Serialised as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const GREY: Rgb = Rgb(153, 153, 153);
    pub const STROKE: Rgb = Rgb(51, 51, 51);

    /// Parse `#rrggbb`, `#rgb` or one of a handful of colour names.
    pub fn parse(s: &str) -> Option<Rgb> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Rgb(255, 0, 0)),
            "green" => Some(Rgb(0, 128, 0)),
            "blue" => Some(Rgb(0, 0, 255)),
            "black" => Some(Rgb::BLACK),
            "white" => Some(Rgb::WHITE),
            "grey" | "gray" => Some(Rgb::GREY),
            "gold" => Some(MEDAL[0]),
            "silver" => Some(MEDAL[1]),
            "bronze" => Some(MEDAL[2]),
            other => {
                let hex = other.strip_prefix('#')?;
                let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
                match hex.len() {
                    6 => Some(Rgb(byte(0)?, byte(2)?, byte(4)?)),
                    3 => {
                        let nibble = |i: usize| {
                            u8::from_str_radix(hex.get(i..i + 1)?, 16).ok().map(|n| n * 17)
                        };
                        Some(Rgb(nibble(0)?, nibble(1)?, nibble(2)?))
                    }
                    _ => None,
                }
            }
        }
    }

    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    /// Relative luminance in [0, 1], used to pick a readable label colour.
    pub fn luminance(self) -> f64 {
        (0.2126 * self.0 as f64 + 0.7152 * self.1 as f64 + 0.0722 * self.2 as f64) / 255.0
    }

    pub fn contrasting_text(self) -> Rgb {
        if self.luminance() > 0.55 {
            Rgb::BLACK
        } else {
            Rgb::WHITE
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> String {
        c.to_string()
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Rgb::parse(&s).ok_or_else(|| format!("invalid colour '{}'", s))
    }
}

const fn hex(v: u32) -> Rgb {
    Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

const CATEGORY10: [Rgb; 10] = [
    hex(0x1f77b4),
    hex(0xff7f0e),
    hex(0x2ca02c),
    hex(0xd62728),
    hex(0x9467bd),
    hex(0x8c564b),
    hex(0xe377c2),
    hex(0x7f7f7f),
    hex(0xbcbd22),
    hex(0x17becf),
];

const YL_OR_RD: [Rgb; 9] = [
    hex(0xffffcc),
    hex(0xffeda0),
    hex(0xfed976),
    hex(0xfeb24c),
    hex(0xfd8d3c),
    hex(0xfc4e2a),
    hex(0xe31a1c),
    hex(0xbd0026),
    hex(0x800026),
];

const VIRIDIS: [Rgb; 10] = [
    hex(0x440154),
    hex(0x482878),
    hex(0x3e4989),
    hex(0x31688e),
    hex(0x26828e),
    hex(0x1f9e89),
    hex(0x35b779),
    hex(0x6ece58),
    hex(0xb5de2b),
    hex(0xfde725),
];

const BLUES: [Rgb; 9] = [
    hex(0xf7fbff),
    hex(0xdeebf7),
    hex(0xc6dbef),
    hex(0x9ecae1),
    hex(0x6baed6),
    hex(0x4292c6),
    hex(0x2171b5),
    hex(0x08519c),
    hex(0x08306b),
];

/// Gold, silver, bronze.
pub const MEDAL: [Rgb; 3] = [hex(0xffd700), hex(0xc0c0c0), hex(0xcd7f32)];

/// Named colour ramps. Sequential palettes are ordered light-to-dark (or dark-to-light for
/// viridis) so interpolation is monotonic in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Palette {
    #[default]
    Category10,
    #[serde(alias = "ylorrd")]
    YlOrRd,
    Viridis,
    Blues,
    Medal,
}

impl Palette {
    pub fn stops(self) -> &'static [Rgb] {
        match self {
            Palette::Category10 => &CATEGORY10,
            Palette::YlOrRd => &YL_OR_RD,
            Palette::Viridis => &VIRIDIS,
            Palette::Blues => &BLUES,
            Palette::Medal => &MEDAL,
        }
    }

    /// Cycle through the palette for the i-th category.
    pub fn categorical(self, index: usize) -> Rgb {
        let stops = self.stops();
        stops[index % stops.len()]
    }

    /// Piecewise-linear interpolation over the stops; `t` is clamped to [0, 1].
    pub fn interpolate(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        if stops.len() == 1 {
            return stops[0];
        }
        let pos = t * (stops.len() - 1) as f64;
        let lower = (pos.floor() as usize).min(stops.len() - 2);
        stops[lower].lerp(stops[lower + 1], pos - lower as f64)
    }
}
