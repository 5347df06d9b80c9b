use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use crate::app::StickyApp;
use crate::config::AppConfig;
use crate::model::{ColorPair, ColorRef, FontDescriptor, FontStyle, Geometry, NewNote, PaletteColor};
use crate::registry::{NoteRecord, NoteRegistry};
use crate::storage::DataStore;
use crate::surface::HeadlessHost;

const PREVIEW_GRAPHEMES: usize = 60;

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Note text. If omitted, reads from stdin.
    #[arg()]
    pub text: Option<String>,
    /// Left edge in screen coordinates (placed by the system if omitted)
    #[arg(long, allow_hyphen_values = true)]
    pub x: Option<i32>,
    /// Top edge in screen coordinates
    #[arg(long, allow_hyphen_values = true)]
    pub y: Option<i32>,
    #[arg(long)]
    pub width: Option<i32>,
    #[arg(long)]
    pub height: Option<i32>,
    /// Palette color name (yellow, green, pink, purple, blue, gray, charcoal, black, white)
    #[arg(long)]
    pub background: Option<PaletteColor>,
    /// Palette color name for the text
    #[arg(long)]
    pub text_color: Option<PaletteColor>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Position of the note as shown by `list`
    pub index: usize,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn start(config: Arc<AppConfig>, store: DataStore) -> Result<StickyApp<HeadlessHost>> {
    StickyApp::start(config, store, HeadlessHost::default())
}

pub fn list_notes(config: Arc<AppConfig>, store: DataStore) -> Result<()> {
    let app = start(config, store)?;
    print!("{}", format_note_list(app.registry()));
    Ok(())
}

pub fn new_note(config: Arc<AppConfig>, store: DataStore, args: NewArgs) -> Result<()> {
    let text = match args.text.clone() {
        Some(text) => Some(text),
        None => read_stdin()?,
    };
    let mut app = start(config, store)?;
    let note = build_new_note(app.registry(), &args, text);
    let index = app.new_note(note)?;
    app.shutdown().saved.context("saving notes")?;
    println!("Created note #{index}");
    Ok(())
}

pub fn delete_note(config: Arc<AppConfig>, store: DataStore, args: DeleteArgs) -> Result<()> {
    let mut app = start(config, store)?;
    let Some(record) = app.registry().get(args.index) else {
        bail!(
            "note #{} not found ({} stored)",
            args.index,
            app.registry().len()
        );
    };
    if !args.yes {
        let answer = prompt(&format!(
            "Delete note #{} ({})? [y/N]",
            args.index,
            preview(record)
        ))?;
        if !answer.trim().to_ascii_lowercase().starts_with('y') {
            println!("Kept note #{}", args.index);
            return Ok(());
        }
    }
    app.delete_note(args.index)?;
    app.shutdown().saved.context("saving notes")?;
    println!("Deleted note #{}", args.index);
    Ok(())
}

pub fn export_notes(config: Arc<AppConfig>, store: DataStore, args: ExportArgs) -> Result<()> {
    let app = start(config, store)?;
    let json = render_export(&app)?;
    match args.output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("writing export {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn build_new_note(registry: &NoteRegistry, args: &NewArgs, text: Option<String>) -> NewNote {
    let layout = registry.layout();
    let geometry = if args.x.is_some() || args.y.is_some() || args.width.is_some() || args.height.is_some() {
        let base = Geometry::auto_placed(layout.width, layout.height);
        Some(Geometry::new(
            args.x.unwrap_or(base.x),
            args.y.unwrap_or(base.y),
            args.width.unwrap_or(base.width),
            args.height.unwrap_or(base.height),
        ))
    } else {
        None
    };
    let colors = if args.background.is_some() || args.text_color.is_some() {
        let base = registry.defaults().colors;
        Some(ColorPair {
            background: args.background.map_or(base.background, ColorRef::from),
            text: args.text_color.map_or(base.text, ColorRef::from),
        })
    } else {
        None
    };
    NewNote {
        geometry,
        colors,
        ..NewNote::with_text(text.unwrap_or_default())
    }
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

pub fn format_note_list(registry: &NoteRegistry) -> String {
    if registry.is_empty() {
        return "No notes.\n".to_string();
    }
    let mut out = String::new();
    for (index, record) in registry.iter().enumerate() {
        let g = record.geometry;
        let position = if g.is_auto_placed() {
            "auto".to_string()
        } else {
            format!("{},{}", g.x, g.y)
        };
        let _ = writeln!(
            &mut out,
            "#{index}  {}x{} @ {position}  {} on {}",
            g.width,
            g.height,
            color_label(record.colors.background),
            color_label(record.colors.text)
        );
        let _ = writeln!(&mut out, "    {}", preview(record));
        out.push('\n');
    }
    out
}

fn color_label(color: ColorRef) -> String {
    PaletteColor::matching(color)
        .map(|entry| entry.to_string())
        .unwrap_or_else(|| color.to_string())
}

/// First non-blank line of the note, cut to a fixed number of graphemes.
fn preview(record: &NoteRecord) -> String {
    let Some(text) = record.text() else {
        return "(empty)".to_string();
    };
    let text = String::from_utf8_lossy(text);
    let Some(line) = text.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return "(blank)".to_string();
    };
    let mut graphemes = line.graphemes(true);
    let mut shown: String = graphemes.by_ref().take(PREVIEW_GRAPHEMES).collect();
    if graphemes.next().is_some() {
        shown.push('…');
    }
    shown
}

#[derive(Serialize)]
struct ExportDocument {
    data_file: String,
    defaults: ExportDefaults,
    notes: Vec<ExportNote>,
}

#[derive(Serialize)]
struct ExportDefaults {
    font: ExportFont,
    background: String,
    text_color: String,
}

#[derive(Serialize)]
struct ExportFont {
    face: String,
    height: i32,
    weight: i32,
    italic: bool,
    underline: bool,
    strike_out: bool,
}

#[derive(Serialize)]
struct ExportNote {
    index: usize,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    font: ExportFont,
    background: String,
    text_color: String,
    text: Option<String>,
}

impl From<&FontDescriptor> for ExportFont {
    fn from(font: &FontDescriptor) -> Self {
        Self {
            face: font.face_name().into_owned(),
            height: font.height,
            weight: font.weight,
            italic: font.style.contains(FontStyle::ITALIC),
            underline: font.style.contains(FontStyle::UNDERLINE),
            strike_out: font.style.contains(FontStyle::STRIKE_OUT),
        }
    }
}

fn render_export(app: &StickyApp<HeadlessHost>) -> Result<String> {
    let registry = app.registry();
    let defaults = registry.defaults();
    let document = ExportDocument {
        data_file: app.store().path().display().to_string(),
        defaults: ExportDefaults {
            font: ExportFont::from(&defaults.font),
            background: defaults.colors.background.to_string(),
            text_color: defaults.colors.text.to_string(),
        },
        notes: registry
            .iter()
            .enumerate()
            .map(|(index, record)| ExportNote {
                index,
                x: record.geometry.x,
                y: record.geometry.y,
                width: record.geometry.width,
                height: record.geometry.height,
                font: ExportFont::from(record.font().descriptor()),
                background: record.colors.background.to_string(),
                text_color: record.colors.text.to_string(),
                text: record
                    .text()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&document).context("serialising export")
}
