use thiserror::Error;

use crate::model::{
    normalize_text, ColorPair, FontDescriptor, Geometry, NewNote, NoteContent, NoteView,
    PaletteColor,
};
use crate::surface::{FontObject, RenderedFont, SurfaceHost, SurfaceId};

pub const DEFAULT_NOTE_WIDTH: i32 = 300;
pub const DEFAULT_NOTE_HEIGHT: i32 = 300;
pub const DEFAULT_POINT_SIZE: u32 = 16;
pub const DEFAULT_FONT_FACE: &str = "Calibri";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("could not grow note registry to {requested} notes")]
    Allocation { requested: usize },
    #[error("no note at index {index} (registry holds {len})")]
    NoSuchNote { index: usize, len: usize },
    #[error("{0} is already bound to another note")]
    DuplicateSurface(SurfaceId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub font: FontDescriptor,
    pub colors: ColorPair,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            font: FontDescriptor::with_face(DEFAULT_FONT_FACE),
            colors: ColorPair::new(PaletteColor::Yellow, PaletteColor::White),
        }
    }
}

/// Non-persisted sizing used for new notes and for resolving the default font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteLayout {
    pub width: i32,
    pub height: i32,
    pub point_size: u32,
}

impl Default for NoteLayout {
    fn default() -> Self {
        Self {
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
            point_size: DEFAULT_POINT_SIZE,
        }
    }
}

#[derive(Debug)]
pub struct NoteFont {
    descriptor: FontDescriptor,
    rendered: Option<RenderedFont>,
}

impl NoteFont {
    fn acquire<H: SurfaceHost + ?Sized>(host: &mut H, descriptor: FontDescriptor) -> Self {
        let rendered = host.create_font(&descriptor);
        Self {
            descriptor,
            rendered,
        }
    }

    pub fn descriptor(&self) -> &FontDescriptor {
        &self.descriptor
    }

    pub fn rendered(&self) -> Option<&dyn FontObject> {
        self.rendered.as_deref()
    }

    /// Swaps in `descriptor`, releasing the current object before the new one
    /// is created.
    pub fn replace<H: SurfaceHost + ?Sized>(&mut self, host: &mut H, descriptor: FontDescriptor) {
        self.release();
        self.descriptor = descriptor;
        self.rendered = host.create_font(&descriptor);
    }

    pub fn release(&mut self) {
        self.rendered = None;
    }
}

#[derive(Debug)]
pub struct NoteRecord {
    surface: Option<SurfaceId>,
    pub geometry: Geometry,
    font: NoteFont,
    pub colors: ColorPair,
    text: Option<Vec<u8>>,
}

impl NoteRecord {
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    pub fn font(&self) -> &NoteFont {
        &self.font
    }

    pub fn font_mut(&mut self) -> &mut NoteFont {
        &mut self.font
    }

    pub fn text(&self) -> Option<&[u8]> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: Vec<u8>) {
        self.text = normalize_text(text);
    }

    pub fn view(&self) -> NoteView<'_> {
        NoteView {
            geometry: self.geometry,
            font: &self.font.descriptor,
            colors: self.colors,
            text: self.text.as_deref(),
        }
    }

    pub fn content(&self) -> NoteContent {
        NoteContent {
            geometry: self.geometry,
            font: self.font.descriptor,
            colors: self.colors,
            text: self.text.clone(),
        }
    }

    fn into_content(self) -> NoteContent {
        NoteContent {
            geometry: self.geometry,
            font: self.font.descriptor,
            colors: self.colors,
            text: self.text,
        }
    }
}

#[derive(Debug, Default)]
pub struct NoteRegistry {
    records: Vec<NoteRecord>,
    defaults: Defaults,
    layout: NoteLayout,
    last_active: Option<usize>,
}

impl NoteRegistry {
    pub fn new(defaults: Defaults, layout: NoteLayout) -> Self {
        Self {
            records: Vec::new(),
            defaults,
            layout,
            last_active: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NoteRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NoteRecord> {
        self.records.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NoteRecord> {
        self.records.iter()
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut Defaults {
        &mut self.defaults
    }

    pub fn layout(&self) -> NoteLayout {
        self.layout
    }

    /// The default font, sized for `dpi` the first time it is requested.
    pub fn default_font(&mut self, dpi: u32) -> FontDescriptor {
        self.defaults
            .font
            .resolve_height(self.layout.point_size, dpi);
        self.defaults.font
    }

    pub fn last_active(&self) -> Option<usize> {
        self.last_active
    }

    /// Marks `index` as last-active; out-of-range indices are ignored.
    pub fn set_last_active(&mut self, index: usize) {
        if index < self.records.len() {
            self.last_active = Some(index);
        }
    }

    pub fn clear_last_active(&mut self) {
        self.last_active = None;
    }

    pub fn find_by_surface(&self, surface: SurfaceId) -> Option<usize> {
        self.records
            .iter()
            .position(|record| record.surface == Some(surface))
    }

    /// Adds a note interactively: it takes focus and becomes last-active.
    pub fn create<H: SurfaceHost + ?Sized>(
        &mut self,
        host: &mut H,
        note: NewNote,
    ) -> Result<usize, RegistryError> {
        let content = NoteContent {
            geometry: note.geometry.unwrap_or_else(|| {
                Geometry::auto_placed(self.layout.width, self.layout.height)
            }),
            font: match note.font {
                Some(font) => font,
                None => self.default_font(host.display_dpi()),
            },
            colors: note.colors.unwrap_or(self.defaults.colors),
            text: note.text.and_then(normalize_text),
        };
        let index = self.insert(host, content, true)?;
        self.last_active = Some(index);
        Ok(index)
    }

    pub fn restore<H: SurfaceHost + ?Sized>(
        &mut self,
        host: &mut H,
        content: NoteContent,
    ) -> Result<usize, RegistryError> {
        self.insert(host, content, false)
    }

    fn insert<H: SurfaceHost + ?Sized>(
        &mut self,
        host: &mut H,
        content: NoteContent,
        focus: bool,
    ) -> Result<usize, RegistryError> {
        self.records
            .try_reserve(1)
            .map_err(|_| RegistryError::Allocation {
                requested: self.records.len().saturating_add(1),
            })?;

        let font = NoteFont::acquire(host, content.font);
        let surface = host.create_surface(
            content.geometry,
            font.rendered(),
            content.text.as_deref(),
            focus,
        );
        match surface {
            Some(id) if self.find_by_surface(id).is_some() => {
                host.destroy_surface(id);
                return Err(RegistryError::DuplicateSurface(id));
            }
            Some(_) => {}
            None => tracing::warn!("window system refused to create a note surface"),
        }

        self.records.push(NoteRecord {
            surface,
            geometry: content.geometry,
            font,
            colors: content.colors,
            text: content.text,
        });
        Ok(self.records.len() - 1)
    }

    pub fn delete<H: SurfaceHost + ?Sized>(
        &mut self,
        host: &mut H,
        index: usize,
    ) -> Result<NoteContent, RegistryError> {
        if index >= self.records.len() {
            return Err(RegistryError::NoSuchNote {
                index,
                len: self.records.len(),
            });
        }
        let mut record = self.records.remove(index);
        if let Some(surface) = record.surface.take() {
            host.destroy_surface(surface);
        }
        record.font.release();
        self.last_active = None;
        Ok(record.into_content())
    }
}
