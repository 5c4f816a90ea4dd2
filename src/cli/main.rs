use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dataroom::core::telemetry::logging::init_logging;
use dataroom::services::fs::folders::FolderNode;
use dataroom::services::fs::listing::{EntrySummary, SortKey};
use dataroom::{Entry, EntryId, FileSystem, StoreConfig};
use std::path::{Path, PathBuf};
use time::macros::format_description;

#[derive(Parser)]
#[command(name = "dataroom", version, about = "Virtual file and folder store")]
struct Cli {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Database directory, overrides config and DATAROOM_DATA_DIR
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Keep the store in memory for this invocation only
    #[arg(long, global = true)]
    ephemeral: bool,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a folder
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Store a local file in the virtual tree
    Upload {
        path: PathBuf,
        #[arg(long)]
        parent: Option<String>,
        /// Name to store under, defaults to the file name
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        mime: Option<String>,
    },
    /// Rename an entry
    Rename { id: String, name: String },
    /// Move an entry into another folder, or to the root without --to
    Mv {
        id: String,
        #[arg(long)]
        to: Option<String>,
    },
    /// Delete an entry; folders are deleted with everything inside
    Rm { id: String },
    /// List a folder, the root by default
    Ls {
        folder: Option<String>,
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
    },
    /// Show the folder hierarchy
    Tree,
    /// Show the breadcrumb path of a folder
    Path { folder: String },
    /// Remove every entry
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Size,
    Modified,
    Type,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Name => SortKey::Name,
            SortArg::Size => SortKey::Size,
            SortArg::Modified => SortKey::Modified,
            SortArg::Type => SortKey::Type,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = StoreConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    config.ephemeral |= cli.ephemeral;

    let fs = FileSystem::open(config)
        .await
        .context("failed to open the entry store")?;
    run(&fs, cli.command, cli.json).await
}

async fn run(fs: &FileSystem, command: Command, json: bool) -> Result<()> {
    match command {
        Command::Mkdir { name, parent } => {
            let parent = parent.map(EntryId::from);
            let folder = fs.create_folder(parent.as_ref(), &name).await?;
            print_entry(&folder, json)?;
        }
        Command::Upload {
            path,
            parent,
            name,
            mime,
        } => {
            let content = tokio::fs::read(&path)
                .await
                .with_context(|| format!("cannot read {}", path.display()))?;
            let name = match name {
                Some(name) => name,
                None => file_name(&path)?,
            };
            let mime = mime.unwrap_or_else(|| guess_mime(&name).to_string());
            let parent = parent.map(EntryId::from);
            let file = fs.upload_file(parent.as_ref(), &name, content, &mime).await?;
            print_entry(&file, json)?;
        }
        Command::Rename { id, name } => {
            let entry = fs.rename(&EntryId::from(id), &name).await?;
            print_entry(&entry, json)?;
        }
        Command::Mv { id, to } => {
            let to = to.map(EntryId::from);
            let entry = fs.move_entry(&EntryId::from(id), to.as_ref()).await?;
            print_entry(&entry, json)?;
        }
        Command::Rm { id } => {
            let removed = fs.delete(&EntryId::from(id)).await?;
            if json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("removed {removed} entries");
            }
        }
        Command::Ls { folder, sort, desc } => {
            let folder = folder.map(EntryId::from);
            let entries = fs.list(folder.as_ref(), sort.into(), !desc).await?;
            if json {
                let summaries: Vec<EntrySummary> = entries.iter().map(EntrySummary::from).collect();
                println!("{}", serde_json::to_string_pretty(&summaries)?);
            } else {
                for entry in &entries {
                    println!("{}", format_row(entry));
                }
            }
        }
        Command::Tree => {
            let tree = fs.folder_tree().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print_tree(&tree);
            }
        }
        Command::Path { folder } => {
            let crumbs = fs.breadcrumbs(Some(&EntryId::from(folder))).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&crumbs)?);
            } else {
                let names: Vec<_> = crumbs.iter().map(|c| c.name.as_str()).collect();
                println!("/{}", names.join("/"));
            }
        }
        Command::Clear => {
            fs.clear_all().await?;
            if !json {
                println!("store cleared");
            }
        }
    }
    Ok(())
}

fn print_entry(entry: &Entry, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&EntrySummary::from(entry))?);
    } else {
        println!("{}", format_row(entry));
    }
    Ok(())
}

fn format_row(entry: &Entry) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    let modified = entry
        .modified_at
        .to_datetime()
        .and_then(|dt| dt.format(&format).ok())
        .unwrap_or_else(|| "-".to_string());
    let kind = if entry.is_folder() { "d" } else { "-" };
    format!(
        "{kind} {:>10} {modified}  {}  [{}]",
        entry.size(),
        entry.name,
        entry.id
    )
}

fn print_tree(nodes: &[FolderNode]) {
    let mut stack: Vec<(&FolderNode, usize)> = nodes.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        println!("{}{}  [{}]", "  ".repeat(depth), node.name, node.id);
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

fn guess_mime(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
