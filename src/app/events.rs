use super::StickyApp;
use crate::journaling::CheckpointReason;
use crate::surface::{SurfaceHost, SurfaceId};

const DELETE_QUESTION: &str = "Are you sure you wish to delete this note?";

/// Notifications the windowing layer sends about a note surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    TextChanged(SurfaceId),
    /// Moved or resized.
    Moved(SurfaceId),
    Activated(SurfaceId),
    Deactivated(SurfaceId),
    CloseRequested(SurfaceId),
    Destroyed(SurfaceId),
}

impl SurfaceEvent {
    pub fn surface(&self) -> SurfaceId {
        match *self {
            SurfaceEvent::TextChanged(id)
            | SurfaceEvent::Moved(id)
            | SurfaceEvent::Activated(id)
            | SurfaceEvent::Deactivated(id)
            | SurfaceEvent::CloseRequested(id)
            | SurfaceEvent::Destroyed(id) => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// No note owns the surface, or the host could not answer a query.
    Ignored,
    TextUpdated { index: usize },
    GeometryUpdated { index: usize },
    Activated { index: usize },
    Checkpointed { notes: usize },
    CheckpointSkipped,
    CheckpointFailed,
    Deleted { index: usize },
    DeleteCancelled { index: usize },
    FontReleased { index: usize },
}

impl<H: SurfaceHost> StickyApp<H> {
    /// Applies one surface event to the registry.
    pub fn handle_event(&mut self, event: SurfaceEvent) -> EventOutcome {
        let surface = event.surface();
        let Some(index) = self.registry.find_by_surface(surface) else {
            tracing::debug!(?event, "event for unknown surface ignored");
            return EventOutcome::Ignored;
        };

        match event {
            SurfaceEvent::TextChanged(_) => {
                let Some(text) = self.host.surface_text(surface) else {
                    return EventOutcome::Ignored;
                };
                if let Some(record) = self.registry.get_mut(index) {
                    record.set_text(text);
                }
                EventOutcome::TextUpdated { index }
            }
            SurfaceEvent::Moved(_) => {
                let Some(rect) = self.host.surface_rect(surface) else {
                    return EventOutcome::Ignored;
                };
                if let Some(record) = self.registry.get_mut(index) {
                    record.geometry = rect;
                }
                EventOutcome::GeometryUpdated { index }
            }
            SurfaceEvent::Activated(_) => {
                self.registry.set_last_active(index);
                EventOutcome::Activated { index }
            }
            SurfaceEvent::Deactivated(_) => {
                if !self.checkpoints.wants(CheckpointReason::Deactivated) {
                    return EventOutcome::CheckpointSkipped;
                }
                match self.checkpoint(CheckpointReason::Deactivated) {
                    Ok(notes) => EventOutcome::Checkpointed { notes },
                    Err(err) => {
                        tracing::error!(error = %err, "checkpoint after deactivation failed");
                        EventOutcome::CheckpointFailed
                    }
                }
            }
            SurfaceEvent::CloseRequested(_) => {
                if !self.host.prompt_yes_no(DELETE_QUESTION) {
                    return EventOutcome::DeleteCancelled { index };
                }
                match self.registry.delete(&mut self.host, index) {
                    Ok(_) => EventOutcome::Deleted { index },
                    Err(err) => {
                        tracing::warn!(error = %err, "note vanished before it could be deleted");
                        EventOutcome::Ignored
                    }
                }
            }
            SurfaceEvent::Destroyed(_) => {
                if let Some(record) = self.registry.get_mut(index) {
                    record.font_mut().release();
                }
                EventOutcome::FontReleased { index }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::start_app;
    use crate::journaling::CheckpointStatus;
    use crate::model::{Geometry, NewNote};
    use crate::storage::LoadOutcome;
    use crate::surface::HostCall;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn surface_of(app: &StickyApp<crate::surface::HeadlessHost>, index: usize) -> SurfaceId {
        app.registry()
            .get(index)
            .and_then(|record| record.surface())
            .expect("note has a surface")
    }

    #[test]
    fn text_and_geometry_follow_the_surface() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.new_note(NewNote::default())?;
        let surface = surface_of(&app, 0);

        app.host_mut().type_text(surface, "typed here");
        assert_eq!(
            app.handle_event(SurfaceEvent::TextChanged(surface)),
            EventOutcome::TextUpdated { index: 0 }
        );
        assert_eq!(app.registry().get(0).and_then(|r| r.text()), Some(&b"typed here"[..]));

        app.host_mut().type_text(surface, "");
        app.handle_event(SurfaceEvent::TextChanged(surface));
        assert_eq!(app.registry().get(0).and_then(|r| r.text()), None);

        let moved = Geometry::new(100, 200, 320, 240);
        app.host_mut().move_surface(surface, moved);
        assert_eq!(
            app.handle_event(SurfaceEvent::Moved(surface)),
            EventOutcome::GeometryUpdated { index: 0 }
        );
        assert_eq!(app.registry().get(0).map(|r| r.geometry), Some(moved));
        Ok(())
    }

    #[test]
    fn activation_tracks_last_active_note() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.new_note(NewNote::with_text("a"))?;
        app.new_note(NewNote::with_text("b"))?;
        assert_eq!(app.registry().last_active(), Some(1));

        let first = surface_of(&app, 0);
        assert_eq!(
            app.handle_event(SurfaceEvent::Activated(first)),
            EventOutcome::Activated { index: 0 }
        );
        assert_eq!(app.registry().last_active(), Some(0));
        Ok(())
    }

    #[test]
    fn deactivation_writes_a_checkpoint() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.new_note(NewNote::with_text("persist me"))?;
        let surface = surface_of(&app, 0);

        assert_eq!(
            app.handle_event(SurfaceEvent::Deactivated(surface)),
            EventOutcome::Checkpointed { notes: 1 }
        );
        assert_matches!(app.checkpoint_status(), CheckpointStatus::Saved { notes: 1, .. });
        let defaults = app.registry().defaults().clone();
        assert_matches!(
            app.store().load(&defaults)?,
            LoadOutcome::Loaded(state) if state.notes[0].text.as_deref() == Some(&b"persist me"[..])
        );
        Ok(())
    }

    #[test]
    fn declined_close_leaves_note_untouched() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.new_note(NewNote::with_text("keep"))?;
        let surface = surface_of(&app, 0);
        app.host_mut().queue_prompt_answer(false);

        assert_eq!(
            app.handle_event(SurfaceEvent::CloseRequested(surface)),
            EventOutcome::DeleteCancelled { index: 0 }
        );
        assert_eq!(app.registry().len(), 1);
        assert_eq!(app.registry().last_active(), Some(0));
        assert!(app.host().surface(surface).is_some());
        Ok(())
    }

    #[test]
    fn confirmed_close_deletes_with_compaction() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        for text in ["zero", "one", "two"] {
            app.new_note(NewNote::with_text(text))?;
        }
        let middle = surface_of(&app, 1);
        let last = surface_of(&app, 2);
        app.handle_event(SurfaceEvent::Activated(middle));
        app.host_mut().clear_calls();
        app.host_mut().queue_prompt_answer(true);

        assert_eq!(
            app.handle_event(SurfaceEvent::CloseRequested(middle)),
            EventOutcome::Deleted { index: 1 }
        );
        assert_eq!(app.registry().len(), 2);
        assert_eq!(app.registry().find_by_surface(last), Some(1));
        assert_eq!(app.registry().last_active(), None);
        assert_eq!(
            app.host().calls(),
            &[
                HostCall::Prompted(DELETE_QUESTION.to_owned()),
                HostCall::Destroyed(middle)
            ]
        );
        assert_eq!(app.host().live_fonts(), 2);

        // The host reports the teardown afterwards; the handle is stale by then.
        assert_eq!(
            app.handle_event(SurfaceEvent::Destroyed(middle)),
            EventOutcome::Ignored
        );
        Ok(())
    }

    #[test]
    fn destroyed_surface_releases_font() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.new_note(NewNote::default())?;
        let surface = surface_of(&app, 0);
        assert_eq!(app.host().live_fonts(), 1);

        assert_eq!(
            app.handle_event(SurfaceEvent::Destroyed(surface)),
            EventOutcome::FontReleased { index: 0 }
        );
        assert_eq!(app.host().live_fonts(), 0);
        assert_eq!(app.registry().len(), 1);
        Ok(())
    }

    #[test]
    fn unknown_surfaces_are_ignored() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.new_note(NewNote::with_text("only"))?;
        let stranger = SurfaceId::new(4242);

        for event in [
            SurfaceEvent::TextChanged(stranger),
            SurfaceEvent::Moved(stranger),
            SurfaceEvent::Activated(stranger),
            SurfaceEvent::Deactivated(stranger),
            SurfaceEvent::CloseRequested(stranger),
            SurfaceEvent::Destroyed(stranger),
        ] {
            assert_eq!(app.handle_event(event), EventOutcome::Ignored);
        }
        assert_eq!(app.registry().len(), 1);
        assert_eq!(app.checkpoint_status(), &CheckpointStatus::Never);
        assert!(!app
            .host()
            .calls()
            .iter()
            .any(|call| matches!(call, HostCall::Prompted(_))));
        Ok(())
    }
}
