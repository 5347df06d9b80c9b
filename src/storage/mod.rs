use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::StorageOptions;
use crate::model::{NoteContent, NoteView};
use crate::registry::{Defaults, NoteRegistry};

pub mod codec;

pub use codec::{DecodeError, FormatVersion, TruncatedData};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("reading data file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("writing data file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("decoding data file {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedState {
    pub format: FormatVersion,
    pub defaults: Defaults,
    pub notes: Vec<NoteContent>,
    /// Set when the file ended early; `notes` holds what was parsed before.
    pub truncated: Option<TruncatedData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No data file yet, the normal first-run state.
    Missing,
    Loaded(LoadedState),
}

/// Location of the notes data file.
#[derive(Debug, Clone)]
pub struct DataStore {
    path: Arc<PathBuf>,
}

pub fn init(options: &StorageOptions) -> Result<DataStore> {
    let path = options.data_file.clone();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    Ok(DataStore::new(path))
}

impl DataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the data file. Unread header fields fall back to `fallback`.
    pub fn load(&self, fallback: &Defaults) -> Result<LoadOutcome, StorageError> {
        let bytes = match fs::read(&*self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LoadOutcome::Missing),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.to_path_buf(),
                    source,
                })
            }
        };
        let decoded = codec::decode(&bytes, fallback).map_err(|source| StorageError::Decode {
            path: self.path.to_path_buf(),
            source,
        })?;
        Ok(LoadOutcome::Loaded(LoadedState {
            format: decoded.format,
            defaults: decoded.defaults,
            notes: decoded.notes,
            truncated: decoded.truncated,
        }))
    }

    /// Rewrites the whole file from the registry. Returns the number of notes
    /// written. A failed write is not rolled back.
    pub fn save(&self, registry: &NoteRegistry) -> Result<usize, StorageError> {
        self.save_views(registry.defaults(), registry.iter().map(|record| record.view()))
    }

    pub fn save_contents(
        &self,
        defaults: &Defaults,
        notes: &[NoteContent],
    ) -> Result<usize, StorageError> {
        self.save_views(defaults, notes.iter().map(NoteContent::view))
    }

    fn save_views<'a, I>(&self, defaults: &Defaults, notes: I) -> Result<usize, StorageError>
    where
        I: ExactSizeIterator<Item = NoteView<'a>>,
    {
        let count = notes.len();
        let write_err = |source| StorageError::Write {
            path: self.path.to_path_buf(),
            source,
        };
        let file = File::create(&*self.path).map_err(write_err)?;
        let mut out = BufWriter::new(file);
        codec::encode(&mut out, defaults, notes).map_err(write_err)?;
        out.flush().map_err(write_err)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColorPair, FontDescriptor, Geometry, NewNote, PaletteColor};
    use crate::registry::NoteLayout;
    use crate::surface::HeadlessHost;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> DataStore {
        DataStore::new(temp.path().join("stickies.exe.data"))
    }

    fn loaded(outcome: LoadOutcome) -> LoadedState {
        match outcome {
            LoadOutcome::Loaded(state) => state,
            LoadOutcome::Missing => panic!("expected a loaded data file"),
        }
    }

    #[test]
    fn missing_file_is_not_an_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        assert_eq!(store.load(&Defaults::default())?, LoadOutcome::Missing);
        Ok(())
    }

    #[test]
    fn unreadable_file_is_an_io_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        // A directory exists at the path but cannot be read as a file.
        let store = DataStore::new(temp.path());
        assert_matches!(
            store.load(&Defaults::default()),
            Err(StorageError::Read { .. })
        );
        Ok(())
    }

    #[test]
    fn unwritable_target_is_a_write_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = DataStore::new(temp.path().join("missing-dir").join("notes.data"));
        assert_matches!(
            store.save_contents(&Defaults::default(), &[]),
            Err(StorageError::Write { .. })
        );
        Ok(())
    }

    #[test]
    fn registry_round_trips_through_disk() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        let mut host = HeadlessHost::default();
        let mut registry = NoteRegistry::default();
        registry.create(&mut host, NewNote::with_text("first"))?;
        registry.create(
            &mut host,
            NewNote {
                text: Some(vec![0xff, 0x00, b'x']),
                geometry: Some(Geometry::new(5, -5, 120, 90)),
                font: Some(FontDescriptor::with_face("Courier New")),
                colors: Some(ColorPair::new(PaletteColor::Blue, PaletteColor::White)),
            },
        )?;
        registry.create(&mut host, NewNote::default())?;

        assert_eq!(store.save(&registry)?, 3);
        let state = loaded(store.load(&Defaults::default())?);

        let expected: Vec<NoteContent> = registry.iter().map(|record| record.content()).collect();
        assert_eq!(state.notes, expected);
        assert_eq!(&state.defaults, registry.defaults());
        assert_eq!(state.format, FormatVersion::Versioned(codec::FORMAT_VERSION));
        assert_eq!(state.truncated, None);
        Ok(())
    }

    #[test]
    fn save_truncates_previous_contents() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        let defaults = Defaults::default();
        let note = NoteContent {
            geometry: Geometry::auto_placed(300, 300),
            font: defaults.font,
            colors: defaults.colors,
            text: Some(b"a fairly long note body".to_vec()),
        };
        store.save_contents(&defaults, &[note.clone(), note])?;
        store.save_contents(&defaults, &[])?;

        let state = loaded(store.load(&defaults)?);
        assert!(state.notes.is_empty());
        assert_eq!(state.truncated, None);
        Ok(())
    }

    #[test]
    fn truncated_file_loads_leading_notes() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        let defaults = Defaults::default();
        let notes: Vec<NoteContent> = ["Buy milk", "Call Bob"]
            .iter()
            .map(|text| NoteContent {
                geometry: Geometry::auto_placed(300, 300),
                font: defaults.font,
                colors: defaults.colors,
                text: Some(text.as_bytes().to_vec()),
            })
            .collect();
        store.save_contents(&defaults, &notes)?;

        let full = fs::read(store.path())?;
        fs::write(store.path(), &full[..full.len() - 3])?;

        let state = loaded(store.load(&defaults)?);
        assert_eq!(state.notes, notes[..1]);
        assert_matches!(state.truncated, Some(TruncatedData { parsed: 1, declared: 2, .. }));
        Ok(())
    }

    #[test]
    fn two_note_scenario_survives_reload() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        let mut host = HeadlessHost::default();
        let mut registry = NoteRegistry::default();
        registry.create(&mut host, NewNote::with_text("Buy milk"))?;
        registry.create(&mut host, NewNote::with_text("Call Bob"))?;
        store.save(&registry)?;

        let state = loaded(store.load(&Defaults::default())?);
        let mut fresh_host = HeadlessHost::default();
        let mut fresh = NoteRegistry::new(state.defaults, NoteLayout::default());
        for content in state.notes {
            fresh.restore(&mut fresh_host, content)?;
        }

        assert_eq!(fresh.len(), 2);
        let layout = NoteLayout::default();
        for (record, text) in fresh.iter().zip(["Buy milk", "Call Bob"]) {
            assert_eq!(record.text(), Some(text.as_bytes()));
            assert_eq!(
                record.geometry,
                Geometry::auto_placed(layout.width, layout.height)
            );
            assert_eq!(record.colors, Defaults::default().colors);
        }
        Ok(())
    }
}
