use std::io::{self, Write};

use thiserror::Error;

use crate::model::{
    ColorPair, ColorRef, FontDescriptor, FontStyle, Geometry, NoteContent, NoteView,
    FACE_NAME_LEN,
};
use crate::registry::Defaults;

pub const MAGIC: [u8; 4] = *b"STKY";
pub const FORMAT_VERSION: u32 = 1;
pub const FONT_DESCRIPTOR_LEN: usize = 5 * 4 + 8 + FACE_NAME_LEN;
const RECORD_FIXED_LEN: usize = 4 + 4 * 4 + FONT_DESCRIPTOR_LEN + 2 * 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatVersion {
    /// Unversioned files that start directly with the note count.
    Legacy,
    Versioned(u32),
}

/// A short read while decoding. Everything parsed before `offset` is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("data truncated at byte {offset}: parsed {parsed} of {declared} notes")]
pub struct TruncatedData {
    pub offset: usize,
    pub parsed: usize,
    pub declared: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported data format version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub format: FormatVersion,
    pub defaults: Defaults,
    pub notes: Vec<NoteContent>,
    pub declared: u32,
    pub truncated: Option<TruncatedData>,
}

pub fn encode<'a, W, I>(out: &mut W, defaults: &Defaults, notes: I) -> io::Result<()>
where
    W: Write,
    I: ExactSizeIterator<Item = NoteView<'a>>,
{
    let count = u32::try_from(notes.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many notes to store"))?;

    out.write_all(&MAGIC)?;
    out.write_all(&FORMAT_VERSION.to_le_bytes())?;
    out.write_all(&count.to_le_bytes())?;
    write_font(out, &defaults.font)?;
    write_colors(out, defaults.colors)?;

    for note in notes {
        let text = note.text.unwrap_or_default();
        let len = u32::try_from(text.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "note text too long"))?;
        out.write_all(&len.to_le_bytes())?;
        for value in [
            note.geometry.x,
            note.geometry.y,
            note.geometry.width,
            note.geometry.height,
        ] {
            out.write_all(&value.to_le_bytes())?;
        }
        write_font(out, note.font)?;
        write_colors(out, note.colors)?;
        out.write_all(text)?;
    }
    Ok(())
}

fn write_font<W: Write>(out: &mut W, font: &FontDescriptor) -> io::Result<()> {
    for value in [
        font.height,
        font.width,
        font.escapement,
        font.orientation,
        font.weight,
    ] {
        out.write_all(&value.to_le_bytes())?;
    }
    out.write_all(&[
        u8::from(font.style.contains(FontStyle::ITALIC)),
        u8::from(font.style.contains(FontStyle::UNDERLINE)),
        u8::from(font.style.contains(FontStyle::STRIKE_OUT)),
        font.charset,
        font.out_precision,
        font.clip_precision,
        font.quality,
        font.pitch_and_family,
    ])?;
    out.write_all(&font.face)
}

fn write_colors<W: Write>(out: &mut W, colors: ColorPair) -> io::Result<()> {
    out.write_all(&colors.background.raw().to_le_bytes())?;
    out.write_all(&colors.text.raw().to_le_bytes())
}

/// Decodes a whole data file. Header fields that could not be read keep the
/// values from `fallback`; a short record ends decoding without error.
pub fn decode(bytes: &[u8], fallback: &Defaults) -> Result<Decoded, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let mut decoded = Decoded {
        format: FormatVersion::Legacy,
        defaults: fallback.clone(),
        notes: Vec::new(),
        declared: 0,
        truncated: None,
    };

    if bytes.starts_with(&MAGIC) {
        reader.pos = MAGIC.len();
        let Some(version) = reader.u32() else {
            decoded.truncated = Some(reader.truncated(0, 0));
            return Ok(decoded);
        };
        if version == 0 || version > FORMAT_VERSION {
            return Err(DecodeError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }
        decoded.format = FormatVersion::Versioned(version);
    }

    if read_header(&mut reader, &mut decoded).is_none() {
        decoded.truncated = Some(reader.truncated(0, decoded.declared));
        return Ok(decoded);
    }

    let capacity = (decoded.declared as usize).min(reader.remaining() / RECORD_FIXED_LEN);
    decoded.notes.reserve(capacity);
    for _ in 0..decoded.declared {
        let start = reader.pos;
        match read_note(&mut reader) {
            Some(note) => decoded.notes.push(note),
            None => {
                decoded.truncated = Some(TruncatedData {
                    offset: start,
                    parsed: decoded.notes.len(),
                    declared: decoded.declared,
                });
                break;
            }
        }
    }
    Ok(decoded)
}

fn read_header(reader: &mut ByteReader<'_>, decoded: &mut Decoded) -> Option<()> {
    decoded.declared = reader.u32()?;
    decoded.defaults.font = reader.font()?;
    decoded.defaults.colors.background = reader.color()?;
    decoded.defaults.colors.text = reader.color()?;
    Some(())
}

fn read_note(reader: &mut ByteReader<'_>) -> Option<NoteContent> {
    let len = reader.u32()? as usize;
    let geometry = Geometry::new(reader.i32()?, reader.i32()?, reader.i32()?, reader.i32()?);
    let font = reader.font()?;
    let colors = ColorPair {
        background: reader.color()?,
        text: reader.color()?,
    };
    let raw = reader.take(len)?;
    let text = if raw.is_empty() {
        None
    } else {
        // one spare byte, as the edit control expects a terminator
        let mut text = Vec::with_capacity(len + 1);
        text.extend_from_slice(raw);
        Some(text)
    };
    Some(NoteContent {
        geometry,
        font,
        colors,
        text,
    })
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn truncated(&self, parsed: usize, declared: u32) -> TruncatedData {
        TruncatedData {
            offset: self.pos,
            parsed,
            declared,
        }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Some(slice)
    }

    fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }

    fn u8(&mut self) -> Option<u8> {
        self.array::<1>().map(|[b]| b)
    }

    fn u32(&mut self) -> Option<u32> {
        self.array().map(u32::from_le_bytes)
    }

    fn i32(&mut self) -> Option<i32> {
        self.array().map(i32::from_le_bytes)
    }

    fn color(&mut self) -> Option<ColorRef> {
        self.u32().map(ColorRef::from_raw)
    }

    fn font(&mut self) -> Option<FontDescriptor> {
        let mut font = FontDescriptor::default();
        font.height = self.i32()?;
        font.width = self.i32()?;
        font.escapement = self.i32()?;
        font.orientation = self.i32()?;
        font.weight = self.i32()?;
        let mut style = FontStyle::empty();
        for flag in [FontStyle::ITALIC, FontStyle::UNDERLINE, FontStyle::STRIKE_OUT] {
            style.set(flag, self.u8()? != 0);
        }
        font.style = style;
        font.charset = self.u8()?;
        font.out_precision = self.u8()?;
        font.clip_precision = self.u8()?;
        font.quality = self.u8()?;
        font.pitch_and_family = self.u8()?;
        font.face = self.array()?;
        Some(font)
    }
}
