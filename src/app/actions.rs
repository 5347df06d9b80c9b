use anyhow::Result;

use super::StickyApp;
use crate::model::{NewNote, PaletteColor};
use crate::surface::{ColorTarget, SurfaceHost};

/// Entries of the tray icon's menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    NewNote,
    ShowAll,
    ChangeFont,
    TextColor,
    BackgroundColor,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Created {
        index: usize,
    },
    Raised {
        count: usize,
    },
    FontChanged {
        index: usize,
    },
    ColorChanged {
        target: ColorTarget,
        color: PaletteColor,
        index: Option<usize>,
    },
    /// The action needs a last-active note and there is none.
    NoActiveNote,
    Cancelled,
    QuitRequested,
}

impl<H: SurfaceHost> StickyApp<H> {
    pub fn perform(&mut self, action: TrayAction) -> Result<ActionOutcome> {
        match action {
            TrayAction::NewNote => {
                let index = self.new_note(NewNote::default())?;
                Ok(ActionOutcome::Created { index })
            }
            TrayAction::ShowAll => Ok(self.show_all()),
            TrayAction::ChangeFont => Ok(self.change_font()),
            TrayAction::TextColor => Ok(self.pick_palette_color(ColorTarget::Text)),
            TrayAction::BackgroundColor => Ok(self.pick_palette_color(ColorTarget::Background)),
            TrayAction::Quit => {
                self.quit_requested = true;
                Ok(ActionOutcome::QuitRequested)
            }
        }
    }

    fn show_all(&mut self) -> ActionOutcome {
        let mut count = 0;
        for surface in self.registry.iter().filter_map(|record| record.surface()) {
            self.host.raise_surface(surface);
            count += 1;
        }
        ActionOutcome::Raised { count }
    }

    /// Lets the user restyle the last-active note. The chosen font also
    /// becomes the default for notes created later.
    fn change_font(&mut self) -> ActionOutcome {
        let Some(index) = self.registry.last_active() else {
            return ActionOutcome::NoActiveNote;
        };
        let Some(record) = self.registry.get_mut(index) else {
            return ActionOutcome::NoActiveNote;
        };
        let current = *record.font().descriptor();
        let Some(chosen) = self.host.pick_font(&current) else {
            return ActionOutcome::Cancelled;
        };

        record.font_mut().replace(&mut self.host, chosen);
        if let Some(surface) = record.surface() {
            if let Some(font) = record.font().rendered() {
                self.host.set_surface_font(surface, font);
            }
            // the picker steals focus from the note
            self.host.focus_surface(surface);
        }
        self.registry.defaults_mut().font = chosen;
        ActionOutcome::FontChanged { index }
    }

    fn pick_palette_color(&mut self, target: ColorTarget) -> ActionOutcome {
        match self.host.pick_color(target) {
            Some(color) => self.apply_palette_color(target, color),
            None => ActionOutcome::Cancelled,
        }
    }

    /// Makes `color` the default for `target` and recolors the last-active
    /// note, if there is one.
    pub fn apply_palette_color(&mut self, target: ColorTarget, color: PaletteColor) -> ActionOutcome {
        let value = color.color();
        let defaults = &mut self.registry.defaults_mut().colors;
        match target {
            ColorTarget::Background => defaults.background = value,
            ColorTarget::Text => defaults.text = value,
        }

        let index = self.registry.last_active();
        if let Some(record) = index.and_then(|i| self.registry.get_mut(i)) {
            match target {
                ColorTarget::Background => record.colors.background = value,
                ColorTarget::Text => record.colors.text = value,
            }
            if let Some(surface) = record.surface() {
                self.host.request_redraw(surface);
            }
        }
        ActionOutcome::ColorChanged {
            target,
            color,
            index,
        }
    }
}
