use std::borrow::Cow;
use std::fmt;

use bitflags::bitflags;

/// Bytes reserved for the face name, terminator included.
pub const FACE_NAME_LEN: usize = 32;

pub const WEIGHT_DONT_CARE: i32 = 0;
pub const DEFAULT_CHARSET: u8 = 1;
pub const ANTIALIASED_QUALITY: u8 = 4;

const POINTS_PER_INCH: u64 = 72;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        const ITALIC = 0b001;
        const UNDERLINE = 0b010;
        const STRIKE_OUT = 0b100;
    }
}

/// Fixed-size platform font specification stored with every note.
///
/// A `height` of zero means the size has not been resolved against the
/// display yet; see [`FontDescriptor::resolve_height`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontDescriptor {
    pub height: i32,
    pub width: i32,
    pub escapement: i32,
    pub orientation: i32,
    pub weight: i32,
    pub style: FontStyle,
    pub charset: u8,
    pub out_precision: u8,
    pub clip_precision: u8,
    pub quality: u8,
    pub pitch_and_family: u8,
    pub face: [u8; FACE_NAME_LEN],
}

impl FontDescriptor {
    /// Unsized descriptor for `face`, truncated to fit the face buffer.
    pub fn with_face(face: &str) -> Self {
        let mut descriptor = Self {
            height: 0,
            width: 0,
            escapement: 0,
            orientation: 0,
            weight: WEIGHT_DONT_CARE,
            style: FontStyle::empty(),
            charset: DEFAULT_CHARSET,
            out_precision: 0,
            clip_precision: 0,
            quality: ANTIALIASED_QUALITY,
            pitch_and_family: 0,
            face: [0; FACE_NAME_LEN],
        };
        descriptor.set_face_name(face);
        descriptor
    }

    pub fn face_name(&self) -> Cow<'_, str> {
        let end = self
            .face
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FACE_NAME_LEN);
        String::from_utf8_lossy(&self.face[..end])
    }

    /// Stores `name`, cutting it on a char boundary so a terminator always fits.
    pub fn set_face_name(&mut self, name: &str) {
        let mut end = name.len().min(FACE_NAME_LEN - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        self.face = [0; FACE_NAME_LEN];
        self.face[..end].copy_from_slice(&name.as_bytes()[..end]);
    }

    pub fn is_resolved(&self) -> bool {
        self.height != 0
    }

    /// Fills in a character height for `point_size` at `dpi` when none is set.
    /// Negative heights select by character height rather than cell height.
    pub fn resolve_height(&mut self, point_size: u32, dpi: u32) {
        if self.is_resolved() {
            return;
        }
        let scaled = (u64::from(point_size) * u64::from(dpi) + POINTS_PER_INCH / 2) / POINTS_PER_INCH;
        let scaled = i32::try_from(scaled).unwrap_or(i32::MAX);
        self.height = -scaled.max(1);
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self::with_face("")
    }
}

impl fmt::Debug for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontDescriptor")
            .field("face", &self.face_name())
            .field("height", &self.height)
            .field("width", &self.width)
            .field("weight", &self.weight)
            .field("style", &self.style)
            .field("charset", &self.charset)
            .field("quality", &self.quality)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_name_is_truncated_to_leave_terminator() {
        let long = "A".repeat(40);
        let descriptor = FontDescriptor::with_face(&long);
        assert_eq!(descriptor.face_name().len(), FACE_NAME_LEN - 1);
        assert_eq!(descriptor.face[FACE_NAME_LEN - 1], 0);
    }

    #[test]
    fn face_name_truncation_respects_char_boundaries() {
        let name = format!("{}é", "x".repeat(30));
        let descriptor = FontDescriptor::with_face(&name);
        assert_eq!(descriptor.face_name(), "x".repeat(30));
    }

    #[test]
    fn resolve_height_rounds_like_the_platform() {
        let mut at_96 = FontDescriptor::with_face("Calibri");
        at_96.resolve_height(16, 96);
        assert_eq!(at_96.height, -21);

        let mut at_120 = FontDescriptor::with_face("Calibri");
        at_120.resolve_height(16, 120);
        assert_eq!(at_120.height, -27);
    }

    #[test]
    fn resolve_height_keeps_existing_size() {
        let mut descriptor = FontDescriptor::with_face("Consolas");
        descriptor.height = -13;
        descriptor.resolve_height(16, 144);
        assert_eq!(descriptor.height, -13);
    }
}
