use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoEnumIterator};

use super::ColorRef;

/// The fixed nine-entry note palette. Discriminants are the palette indices.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    FromRepr,
)]
#[repr(u8)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum PaletteColor {
    Yellow = 0,
    Green = 1,
    Pink = 2,
    Purple = 3,
    Blue = 4,
    Gray = 5,
    Charcoal = 6,
    Black = 7,
    White = 8,
}

pub const PALETTE_LEN: usize = 9;

impl PaletteColor {
    pub fn from_index(index: u8) -> Option<Self> {
        Self::from_repr(index)
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn color(self) -> ColorRef {
        match self {
            PaletteColor::Yellow => ColorRef::from_rgb(230, 185, 5),
            PaletteColor::Green => ColorRef::from_rgb(111, 210, 98),
            PaletteColor::Pink => ColorRef::from_rgb(234, 134, 194),
            PaletteColor::Purple => ColorRef::from_rgb(199, 142, 255),
            PaletteColor::Blue => ColorRef::from_rgb(90, 182, 231),
            PaletteColor::Gray => ColorRef::from_rgb(170, 170, 170),
            PaletteColor::Charcoal => ColorRef::from_rgb(69, 69, 69),
            PaletteColor::Black => ColorRef::from_rgb(0, 0, 0),
            PaletteColor::White => ColorRef::from_rgb(255, 255, 255),
        }
    }

    /// Palette entry whose color is exactly `color`, if any.
    pub fn matching(color: ColorRef) -> Option<Self> {
        Self::iter().find(|entry| entry.color() == color)
    }
}
