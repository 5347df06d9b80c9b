use std::fmt;

use crate::model::{FontDescriptor, Geometry, PaletteColor};

mod headless;

pub use headless::{HeadlessHost, HeadlessSurface, HostCall};

/// Opaque handle of a live note surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// A renderable font derived from a [`FontDescriptor`]. Dropping it releases
/// the platform resource.
pub trait FontObject: fmt::Debug {
    fn descriptor(&self) -> &FontDescriptor;
}

pub type RenderedFont = Box<dyn FontObject>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTarget {
    Background,
    Text,
}

pub trait SurfaceHost {
    /// Creates and shows a surface. `None` when the window system refused.
    fn create_surface(
        &mut self,
        geometry: Geometry,
        font: Option<&dyn FontObject>,
        text: Option<&[u8]>,
        focus: bool,
    ) -> Option<SurfaceId>;

    fn destroy_surface(&mut self, surface: SurfaceId);

    /// Current outer rectangle of the surface in screen coordinates.
    fn surface_rect(&self, surface: SurfaceId) -> Option<Geometry>;

    /// Visible text of the surface's edit control.
    fn surface_text(&self, surface: SurfaceId) -> Option<Vec<u8>>;

    fn create_font(&mut self, descriptor: &FontDescriptor) -> Option<RenderedFont>;

    fn set_surface_font(&mut self, surface: SurfaceId, font: &dyn FontObject);

    fn prompt_yes_no(&mut self, question: &str) -> bool;

    /// Interactive font picker seeded with `current`; `None` on cancel.
    fn pick_font(&mut self, current: &FontDescriptor) -> Option<FontDescriptor>;

    fn pick_color(&mut self, target: ColorTarget) -> Option<PaletteColor>;

    fn focus_surface(&mut self, surface: SurfaceId);

    fn raise_surface(&mut self, surface: SurfaceId);

    fn request_redraw(&mut self, surface: SurfaceId);

    /// Vertical pixels per logical inch of the primary display.
    fn display_dpi(&self) -> u32;
}
