//! # Cell Module
//!
//! Attributes of a single world cell. A cell only stores its color; the
//! behavioral [`CellRole`] is always computed from that color so the two can
//! never disagree.

use std::fmt;

use serde_json::Value;

/// Largest value representable in 24-bit RGB.
pub const MAX_RGB: u32 = 0xFF_FFFF;

/// Sentinel color that marks a signal cell.
pub const SIGNAL_COLOR: CellColor = CellColor(0xFF_0000);

/// Sentinel color that marks a logic-gate cell.
pub const LOGIC_GATE_COLOR: CellColor = CellColor(0x00_00FF);

/// A 24-bit RGB color, `0xRRGGBB`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellColor(u32);

impl CellColor {
    /// Pure white, also the fallback for unusable wire colors.
    pub const WHITE: CellColor = CellColor(MAX_RGB);

    /// Wraps a raw RGB value, rejecting anything wider than 24 bits.
    pub const fn new(rgb: u32) -> Option<Self> {
        if rgb > MAX_RGB {
            None
        } else {
            Some(CellColor(rgb))
        }
    }

    /// The raw `0xRRGGBB` value.
    pub const fn rgb(&self) -> u32 {
        self.0
    }

    /// Interprets a wire color: an unsigned decimal integer in `0..=0xFFFFFF`,
    /// sent either as a JSON number or as a numeric string.
    ///
    /// Returns `None` for negatives, fractions, out-of-range values and
    /// non-numeric text.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let raw = match value {
            Value::Number(number) => number.as_u64()?,
            Value::String(text) => text.trim().parse::<u64>().ok()?,
            _ => return None,
        };
        u32::try_from(raw).ok().and_then(CellColor::new)
    }

    /// Like [`CellColor::from_wire`], substituting `fallback` for rejected values.
    pub fn from_wire_or(value: &Value, fallback: CellColor) -> Self {
        Self::from_wire(value).unwrap_or_else(|| {
            log::warn!("Rejected wire color {value}, using {fallback}");
            fallback
        })
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex_str(text: &str) -> Option<Self> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().and_then(CellColor::new)
    }
}

/// Prints `#rrggbb`.
impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// The behavioral category of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CellRole {
    /// An ordinary building block.
    Plain,
    /// A cell that carries a signal.
    Signal,
    /// A cell that acts as a logic gate.
    LogicGate,
}

impl CellRole {
    /// Classifies a color. Only the two sentinel colors map to a non-plain role.
    pub fn of(color: CellColor) -> Self {
        match color {
            SIGNAL_COLOR => CellRole::Signal,
            LOGIC_GATE_COLOR => CellRole::LogicGate,
            _ => CellRole::Plain,
        }
    }
}

/// A cell stored in the world replica.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    color: CellColor,
}

impl Cell {
    /// Creates a cell; its role follows from the color.
    pub fn new(color: CellColor) -> Self {
        Cell { color }
    }

    /// The cell color.
    pub fn color(&self) -> CellColor {
        self.color
    }

    /// Behavioral role derived from the color.
    pub fn role(&self) -> CellRole {
        CellRole::of(self.color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        assert_eq!(CellColor::from_wire(&json!(16777215)), Some(CellColor::WHITE));
        assert_eq!(CellColor::from_wire(&json!("255")), CellColor::new(255));
        assert_eq!(CellColor::from_wire(&json!(0)), CellColor::new(0));
    }

    #[test]
    fn rejects_unusable_wire_colors() {
        let values = [
            json!(-1),
            json!(16777216),
            json!(1.5),
            json!("red"),
            json!(null),
            json!([1]),
        ];
        for value in values {
            assert_eq!(CellColor::from_wire(&value), None, "{value} accepted");
        }
        assert_eq!(CellColor::from_wire_or(&json!("red"), CellColor::WHITE), CellColor::WHITE);
    }

    #[test]
    fn hex_round_trip() {
        let color = CellColor::from_hex_str("#00ff7f").unwrap();
        assert_eq!(color.rgb(), 0x00FF7F);
        assert_eq!(color.to_string(), "#00ff7f");
        assert_eq!(CellColor::from_hex_str("fff"), None);
    }

    #[test]
    fn role_follows_color() {
        assert_eq!(Cell::new(SIGNAL_COLOR).role(), CellRole::Signal);
        assert_eq!(Cell::new(LOGIC_GATE_COLOR).role(), CellRole::LogicGate);
        assert_eq!(Cell::new(CellColor::WHITE).role(), CellRole::Plain);
    }
}
