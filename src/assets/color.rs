use crate::foundation::core::Rgba8;
use serde::{Deserialize, Serialize};

/// Color as written in configuration files.
///
/// Accepts `"#RRGGBB"`, `"#RRGGBBAA"`, `{ "r": .., "g": .., "b": .., "a"?: .. }` with 0..=255
/// channels, or `[r, g, b]` / `[r, g, b, a]`. Always serializes back as a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDef(pub Rgba8);

impl ColorDef {
    /// Parse a hex color string.
    pub fn parse(s: &str) -> Result<Self, String> {
        parse_hex(s).map(Self)
    }

    /// The parsed color.
    pub fn rgba8(self) -> Rgba8 {
        self.0
    }
}

impl From<Rgba8> for ColorDef {
    fn from(c: Rgba8) -> Self {
        Self(c)
    }
}

impl Serialize for ColorDef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let c = self.0;
        let s = if c.a == 255 {
            format!("#{:02X}{:02X}{:02X}", c.r, c.g, c.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", c.r, c.g, c.b, c.a)
        };
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for ColorDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "opaque")]
                a: u8,
            },
            Arr(Vec<u8>),
        }

        fn opaque() -> u8 {
            255
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map(Self).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self(Rgba8 { r, g, b, a })),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] => Ok(Self(Rgba8::opaque(*r, *g, *b))),
                [r, g, b, a] => Ok(Self(Rgba8 {
                    r: *r,
                    g: *g,
                    b: *b,
                    a: *a,
                })),
                _ => Err(serde::de::Error::custom(
                    "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn parse_hex(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }

    match s.len() {
        6 => Ok(Rgba8::opaque(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Rgba8 {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}
