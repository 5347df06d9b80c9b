use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use super::{ColorTarget, FontObject, RenderedFont, SurfaceHost, SurfaceId};
use crate::model::{FontDescriptor, Geometry, PaletteColor};

const STANDARD_DPI: u32 = 96;

/// Side effects requested from a [`HeadlessHost`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Created(SurfaceId),
    Destroyed(SurfaceId),
    FontApplied(SurfaceId),
    Focused(SurfaceId),
    Raised(SurfaceId),
    Redrawn(SurfaceId),
    Prompted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessSurface {
    pub geometry: Geometry,
    pub text: Vec<u8>,
    pub font: Option<FontDescriptor>,
}

/// In-memory surface host. Backs the command-line tool and drives the core
/// in tests: user interaction is simulated by editing surfaces directly and
/// queueing answers for prompts and pickers.
#[derive(Debug)]
pub struct HeadlessHost {
    next_id: u64,
    dpi: u32,
    surfaces: BTreeMap<SurfaceId, HeadlessSurface>,
    live_fonts: Rc<Cell<usize>>,
    prompt_answers: VecDeque<bool>,
    default_answer: bool,
    font_choices: VecDeque<Option<FontDescriptor>>,
    color_choices: VecDeque<Option<PaletteColor>>,
    calls: Vec<HostCall>,
}

#[derive(Debug)]
struct HeadlessFont {
    descriptor: FontDescriptor,
    live: Rc<Cell<usize>>,
}

impl FontObject for HeadlessFont {
    fn descriptor(&self) -> &FontDescriptor {
        &self.descriptor
    }
}

impl Drop for HeadlessFont {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::with_dpi(STANDARD_DPI)
    }
}

impl HeadlessHost {
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            next_id: 1,
            dpi,
            surfaces: BTreeMap::new(),
            live_fonts: Rc::new(Cell::new(0)),
            prompt_answers: VecDeque::new(),
            default_answer: false,
            font_choices: VecDeque::new(),
            color_choices: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    pub fn surface(&self, surface: SurfaceId) -> Option<&HeadlessSurface> {
        self.surfaces.get(&surface)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Number of font objects handed out and not yet released.
    pub fn live_fonts(&self) -> usize {
        self.live_fonts.get()
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Simulates the user typing into a surface. Returns false for unknown surfaces.
    pub fn type_text(&mut self, surface: SurfaceId, text: impl Into<Vec<u8>>) -> bool {
        match self.surfaces.get_mut(&surface) {
            Some(entry) => {
                entry.text = text.into();
                true
            }
            None => false,
        }
    }

    /// Simulates the user dragging or resizing a surface.
    pub fn move_surface(&mut self, surface: SurfaceId, geometry: Geometry) -> bool {
        match self.surfaces.get_mut(&surface) {
            Some(entry) => {
                entry.geometry = geometry;
                true
            }
            None => false,
        }
    }

    pub fn queue_prompt_answer(&mut self, answer: bool) {
        self.prompt_answers.push_back(answer);
    }

    /// Answer used once queued answers run out.
    pub fn set_default_answer(&mut self, answer: bool) {
        self.default_answer = answer;
    }

    pub fn queue_font_choice(&mut self, choice: Option<FontDescriptor>) {
        self.font_choices.push_back(choice);
    }

    pub fn queue_color_choice(&mut self, choice: Option<PaletteColor>) {
        self.color_choices.push_back(choice);
    }
}

impl SurfaceHost for HeadlessHost {
    fn create_surface(
        &mut self,
        geometry: Geometry,
        font: Option<&dyn FontObject>,
        text: Option<&[u8]>,
        focus: bool,
    ) -> Option<SurfaceId> {
        let id = SurfaceId::new(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(
            id,
            HeadlessSurface {
                geometry,
                text: text.map(<[u8]>::to_vec).unwrap_or_default(),
                font: font.map(|font| *font.descriptor()),
            },
        );
        self.calls.push(HostCall::Created(id));
        if focus {
            self.calls.push(HostCall::Focused(id));
        }
        Some(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        if self.surfaces.remove(&surface).is_some() {
            self.calls.push(HostCall::Destroyed(surface));
        }
    }

    fn surface_rect(&self, surface: SurfaceId) -> Option<Geometry> {
        self.surfaces.get(&surface).map(|entry| entry.geometry)
    }

    fn surface_text(&self, surface: SurfaceId) -> Option<Vec<u8>> {
        self.surfaces.get(&surface).map(|entry| entry.text.clone())
    }

    fn create_font(&mut self, descriptor: &FontDescriptor) -> Option<RenderedFont> {
        self.live_fonts.set(self.live_fonts.get() + 1);
        Some(Box::new(HeadlessFont {
            descriptor: *descriptor,
            live: Rc::clone(&self.live_fonts),
        }))
    }

    fn set_surface_font(&mut self, surface: SurfaceId, font: &dyn FontObject) {
        if let Some(entry) = self.surfaces.get_mut(&surface) {
            entry.font = Some(*font.descriptor());
            self.calls.push(HostCall::FontApplied(surface));
        }
    }

    fn prompt_yes_no(&mut self, question: &str) -> bool {
        self.calls.push(HostCall::Prompted(question.to_owned()));
        self.prompt_answers
            .pop_front()
            .unwrap_or(self.default_answer)
    }

    fn pick_font(&mut self, _current: &FontDescriptor) -> Option<FontDescriptor> {
        self.font_choices.pop_front().flatten()
    }

    fn pick_color(&mut self, _target: ColorTarget) -> Option<PaletteColor> {
        self.color_choices.pop_front().flatten()
    }

    fn focus_surface(&mut self, surface: SurfaceId) {
        self.calls.push(HostCall::Focused(surface));
    }

    fn raise_surface(&mut self, surface: SurfaceId) {
        self.calls.push(HostCall::Raised(surface));
    }

    fn request_redraw(&mut self, surface: SurfaceId) {
        self.calls.push(HostCall::Redrawn(surface));
    }

    fn display_dpi(&self) -> u32 {
        self.dpi
    }
}
