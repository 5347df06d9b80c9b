use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::journaling::{CheckpointReason, CheckpointStatus, Checkpointer};
use crate::model::{NewNote, NoteContent};
use crate::registry::NoteRegistry;
use crate::storage::{DataStore, LoadOutcome, StorageError};
use crate::surface::SurfaceHost;

mod actions;
mod events;

pub use actions::{ActionOutcome, TrayAction};
pub use events::{EventOutcome, SurfaceEvent};

pub struct StickyApp<H: SurfaceHost> {
    config: Arc<AppConfig>,
    host: H,
    registry: NoteRegistry,
    checkpoints: Checkpointer,
    quit_requested: bool,
}

pub struct ShutdownReport<H> {
    pub host: H,
    pub saved: Result<usize, StorageError>,
}

impl<H: SurfaceHost> StickyApp<H> {
    /// An existing file that cannot be read stops startup so it is never
    /// overwritten.
    pub fn start(config: Arc<AppConfig>, store: DataStore, mut host: H) -> Result<Self> {
        let fallback = config.note.defaults();
        let outcome = store
            .load(&fallback)
            .with_context(|| format!("loading notes from {}", store.path().display()))?;

        let mut registry = NoteRegistry::new(fallback, config.note.layout());
        match outcome {
            LoadOutcome::Missing => {
                tracing::info!(path = %store.path().display(), "no data file yet, starting empty");
            }
            LoadOutcome::Loaded(state) => {
                if let Some(short) = &state.truncated {
                    tracing::warn!(%short, "data file damaged, keeping the notes read before it");
                }
                *registry.defaults_mut() = state.defaults;
                let total = state.notes.len();
                for content in state.notes {
                    registry
                        .restore(&mut host, content)
                        .context("restoring saved note")?;
                }
                tracing::info!(notes = total, format = ?state.format, "notes restored");
            }
        }

        let checkpoints = Checkpointer::new(store, &config.storage);
        Ok(Self {
            config,
            host,
            registry,
            checkpoints,
            quit_requested: false,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &NoteRegistry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &DataStore {
        self.checkpoints.store()
    }

    pub fn checkpoint_status(&self) -> &CheckpointStatus {
        self.checkpoints.status()
    }

    pub fn should_quit(&self) -> bool {
        self.quit_requested
    }

    pub fn new_note(&mut self, note: NewNote) -> Result<usize> {
        let index = self
            .registry
            .create(&mut self.host, note)
            .context("creating note")?;
        tracing::debug!(index, "note created");
        Ok(index)
    }

    pub fn delete_note(&mut self, index: usize) -> Result<NoteContent> {
        let removed = self
            .registry
            .delete(&mut self.host, index)
            .with_context(|| format!("deleting note #{index}"))?;
        tracing::debug!(index, "note deleted");
        Ok(removed)
    }

    pub fn checkpoint(&mut self, reason: CheckpointReason) -> Result<usize, StorageError> {
        self.checkpoints.run(&self.registry, reason)
    }

    /// Final checkpoint, then every record and its resources are released.
    pub fn shutdown(self) -> ShutdownReport<H> {
        let Self {
            host,
            registry,
            mut checkpoints,
            ..
        } = self;
        let saved = checkpoints.run(&registry, CheckpointReason::Shutdown);
        if let Err(err) = &saved {
            tracing::error!(error = %err, "final checkpoint failed");
        }
        drop(registry);
        ShutdownReport { host, saved }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColorPair, Geometry, PaletteColor};
    use crate::storage::codec;
    use crate::surface::HeadlessHost;
    use std::fs;
    use tempfile::TempDir;

    pub(super) fn start_app(temp: &TempDir) -> Result<StickyApp<HeadlessHost>> {
        let mut config = AppConfig::default();
        config.storage.data_file = temp.path().join("stickies.data");
        let store = DataStore::new(config.storage.data_file.clone());
        StickyApp::start(Arc::new(config), store, HeadlessHost::default())
    }

    #[test]
    fn first_start_is_empty_with_configured_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let app = start_app(&temp)?;
        assert!(app.registry().is_empty());
        assert_eq!(
            app.registry().defaults().colors,
            ColorPair::new(PaletteColor::Yellow, PaletteColor::White)
        );
        assert_eq!(app.checkpoint_status(), &CheckpointStatus::Never);
        assert!(!app.store().path().exists());
        Ok(())
    }

    #[test]
    fn shutdown_persists_and_restart_restores_surfaces() -> Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.new_note(NewNote::with_text("Buy milk"))?;
        app.new_note(NewNote {
            geometry: Some(Geometry::new(40, 50, 220, 180)),
            ..NewNote::with_text("Call Bob")
        })?;

        let report = app.shutdown();
        assert_eq!(report.saved?, 2);
        assert_eq!(report.host.live_fonts(), 0);

        let app = start_app(&temp)?;
        assert_eq!(app.registry().len(), 2);
        assert_eq!(app.host().surface_count(), 2);
        assert_eq!(app.registry().last_active(), None);
        let second = app.registry().get(1).expect("second note");
        assert_eq!(second.text(), Some(&b"Call Bob"[..]));
        assert_eq!(second.geometry, Geometry::new(40, 50, 220, 180));
        let surface = second.surface().expect("surface");
        assert_eq!(
            app.host().surface(surface).map(|s| s.text.clone()),
            Some(b"Call Bob".to_vec())
        );
        Ok(())
    }

    #[test]
    fn stored_defaults_override_config() -> Result<()> {
        let temp = TempDir::new()?;
        let mut app = start_app(&temp)?;
        app.registry.defaults_mut().colors =
            ColorPair::new(PaletteColor::Green, PaletteColor::Black);
        app.shutdown().saved?;

        let app = start_app(&temp)?;
        assert_eq!(
            app.registry().defaults().colors,
            ColorPair::new(PaletteColor::Green, PaletteColor::Black)
        );
        Ok(())
    }

    #[test]
    fn unsupported_version_refuses_to_start() -> Result<()> {
        let temp = TempDir::new()?;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&codec::MAGIC);
        bytes.extend_from_slice(&(codec::FORMAT_VERSION + 7).to_le_bytes());
        fs::write(temp.path().join("stickies.data"), &bytes)?;

        assert!(start_app(&temp).is_err());
        assert_eq!(fs::read(temp.path().join("stickies.data"))?, bytes);
        Ok(())
    }
}
