use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use collection::{
    materialize_list, materialize_object, Action, Editor, EditorConfig, ImageBatchParams,
    ListEntry, MediaRef, ObjectEntry, Outcome, Position,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pix-collection")]
#[command(about = "Headless replay and inspection of collection widget state")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted sequence of user actions through an editor
    Replay {
        /// Script file path
        #[arg(short, long)]
        script: PathBuf,

        /// Editor configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print what the backend node outputs for stored editor rows
    Materialize {
        /// Shape of the output
        #[arg(long, value_enum, default_value = "list")]
        kind: MaterializeKind,

        /// File holding the stored rows
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MaterializeKind {
    List,
    Object,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WidgetKind {
    ImageBatch,
    VideoList,
    JsonList,
    JsonObject,
}

#[derive(Debug, Deserialize)]
struct Script {
    widget: WidgetKind,
    /// Initial storage text, as the host would restore it.
    #[serde(default)]
    storage: Option<String>,
    #[serde(default)]
    actions: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct ReplayReport {
    storage: String,
    params: Value,
    len: usize,
    selected: Vec<Position>,
    can_undo: bool,
    can_redo: bool,
    /// When the newest restore point was recorded (RFC 3339).
    last_restore_point: Option<String>,
    applied: usize,
    rejected: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Replay {
            script,
            config,
            output,
        } => replay_command(script, config, output),
        Commands::Materialize { kind, file } => materialize_command(kind, file),
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = EditorConfig::from_json(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn replay_command(
    script_path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let text = std::fs::read_to_string(&script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let script: Script = serde_json::from_str(&text)
        .with_context(|| format!("invalid script {}", script_path.display()))?;

    info!(
        "Replaying {} actions on a {:?} editor (history cap {})",
        script.actions.len(),
        script.widget,
        config.effective_history_cap()
    );

    let report = match script.widget {
        WidgetKind::ImageBatch => replay::<MediaRef, ImageBatchParams>(script, &config)?,
        WidgetKind::VideoList => replay::<MediaRef, ()>(script, &config)?,
        WidgetKind::JsonList => replay::<ListEntry, ()>(script, &config)?,
        WidgetKind::JsonObject => replay::<ObjectEntry, ()>(script, &config)?,
    };

    info!(
        "Replay finished: {} items, {} selected, {} applied, {} rejected",
        report.len,
        report.selected.len(),
        report.applied,
        report.rejected
    );

    let rendered = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Report written to {:?}", path);
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn replay<T, P>(script: Script, config: &EditorConfig) -> Result<ReplayReport>
where
    T: Clone + Serialize + DeserializeOwned,
    P: Clone + Default + Serialize + DeserializeOwned,
{
    let mut editor: Editor<T, P> = Editor::new(config);
    if let Some(storage) = script.storage.as_deref() {
        editor.load_storage(storage);
    }

    let mut applied = 0;
    let mut rejected = 0;
    for (index, raw) in script.actions.into_iter().enumerate() {
        let action: Action<T, P> = serde_json::from_value(raw)
            .with_context(|| format!("action #{index} is malformed"))?;
        let name = action.name();
        match editor.dispatch(action) {
            Outcome::Applied => applied += 1,
            Outcome::Unchanged => {}
            Outcome::Rejected(reason) => {
                rejected += 1;
                warn!("Action #{} ({}) rejected: {}", index, name, reason);
            }
        }
    }

    Ok(ReplayReport {
        storage: editor.to_storage()?,
        params: serde_json::to_value(editor.params())?,
        len: editor.len(),
        selected: editor.selection().positions(),
        can_undo: editor.can_undo(),
        can_redo: editor.can_redo(),
        last_restore_point: editor
            .history()
            .undo_entries()
            .last()
            .map(|entry| entry.recorded_at().to_rfc3339()),
        applied,
        rejected,
    })
}

/// Stored rows may be the array itself or the storage widget's string value.
fn parse_stored_rows(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        other => Some(other),
    }
}

fn materialize_command(kind: MaterializeKind, file: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let stored = parse_stored_rows(&text);

    let output = match kind {
        MaterializeKind::List => {
            let values = stored.as_ref().and_then(materialize_list).unwrap_or_else(|| {
                warn!("Malformed rows in {:?}, emitting an empty list", file);
                Vec::new()
            });
            Value::Array(values)
        }
        MaterializeKind::Object => {
            let fields = stored.as_ref().and_then(materialize_object).unwrap_or_else(|| {
                warn!("Malformed rows in {:?}, emitting an empty object", file);
                serde_json::Map::new()
            });
            Value::Object(fields)
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
