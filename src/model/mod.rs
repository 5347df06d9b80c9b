use std::fmt;

mod font;
mod palette;

pub use font::{FontDescriptor, FontStyle, FACE_NAME_LEN};
pub use palette::{PaletteColor, PALETTE_LEN};

/// Coordinate meaning "let the window system place the note".
pub const USE_DEFAULT_POSITION: i32 = i32::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A note of the given size at a system-chosen position.
    pub fn auto_placed(width: i32, height: i32) -> Self {
        Self::new(USE_DEFAULT_POSITION, USE_DEFAULT_POSITION, width, height)
    }

    pub fn is_auto_placed(&self) -> bool {
        self.x == USE_DEFAULT_POSITION || self.y == USE_DEFAULT_POSITION
    }
}

/// Packed `0x00BBGGRR` color value as stored on disk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ColorRef(u32);

impl ColorRef {
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(r as u32 | (g as u32) << 8 | (b as u32) << 16)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn r(self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8 & 0xff) as u8
    }

    pub const fn b(self) -> u8 {
        (self.0 >> 16 & 0xff) as u8
    }
}

impl fmt::Display for ColorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r(), self.g(), self.b())
    }
}

impl fmt::Debug for ColorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ColorRef({self})")
    }
}

impl From<PaletteColor> for ColorRef {
    fn from(color: PaletteColor) -> Self {
        color.color()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorPair {
    pub background: ColorRef,
    pub text: ColorRef,
}

impl ColorPair {
    pub fn new(background: impl Into<ColorRef>, text: impl Into<ColorRef>) -> Self {
        Self {
            background: background.into(),
            text: text.into(),
        }
    }
}

/// Empty buffers are stored as `None`.
pub fn normalize_text(text: Vec<u8>) -> Option<Vec<u8>> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// The persisted part of a note: everything except its live resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteContent {
    pub geometry: Geometry,
    pub font: FontDescriptor,
    pub colors: ColorPair,
    pub text: Option<Vec<u8>>,
}

impl NoteContent {
    pub fn view(&self) -> NoteView<'_> {
        NoteView {
            geometry: self.geometry,
            font: &self.font,
            colors: self.colors,
            text: self.text.as_deref(),
        }
    }
}

/// Borrowed view of a note's persisted fields, as consumed by the encoder.
#[derive(Debug, Clone, Copy)]
pub struct NoteView<'a> {
    pub geometry: Geometry,
    pub font: &'a FontDescriptor,
    pub colors: ColorPair,
    pub text: Option<&'a [u8]>,
}

/// Request for a new note; unset fields fall back to registry defaults.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub text: Option<Vec<u8>>,
    pub geometry: Option<Geometry>,
    pub font: Option<FontDescriptor>,
    pub colors: Option<ColorPair>,
}

impl NewNote {
    pub fn with_text(text: impl Into<Vec<u8>>) -> Self {
        Self {
            text: normalize_text(text.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_ref_packs_rgb_little_endian() {
        let color = ColorRef::from_rgb(0x12, 0x34, 0x56);
        assert_eq!(color.raw(), 0x0056_3412);
        assert_eq!((color.r(), color.g(), color.b()), (0x12, 0x34, 0x56));
        assert_eq!(color.to_string(), "#123456");
    }

    #[test]
    fn empty_text_normalizes_to_none() {
        assert_eq!(normalize_text(Vec::new()), None);
        assert_eq!(NewNote::with_text("").text, None);
        assert_eq!(NewNote::with_text("hi").text.as_deref(), Some(&b"hi"[..]));
    }
}
