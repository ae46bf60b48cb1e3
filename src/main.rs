use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tms::config::TmsConfig;
use tms::db::Database;
use tms::export::FileType;
use tms::Tms;

#[derive(Parser)]
#[command(name = "tms")]
#[command(about = "Manual test case management")]
struct Cli {
    /// Database file (overrides TMS_DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Print a folder with all of its subfolders
    Tree {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        root: i64,
    },
    /// Export a folder tree with its test cases
    Export {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        root: i64,
        /// Output format (defaults to TMS_EXPORT_FORMAT, then csv)
        #[arg(long, value_enum)]
        format: Option<FileType>,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a folder, its subfolders and every test case under them
    DeleteFolder {
        #[arg(long)]
        project: i64,
        #[arg(long)]
        folder: i64,
    },
}

/// Logs go to stderr so exports written to stdout stay clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tms=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = TmsConfig::from_env()?;
    let db = Database::open(cli.database.unwrap_or(config.database_path))?;
    let applied = db.migrate()?;
    let tms = Tms::new(db);

    match cli.command {
        Commands::Migrate => {
            tracing::info!(applied, "Database schema is up to date");
        }
        Commands::Tree { project, root } => {
            let tree = tms.folder_tree(project, root)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            if cli.json {
                serde_json::to_writer_pretty(&mut out, &tree)?;
                writeln!(out)?;
            } else {
                out.write_all(tms::export::render_tree(&tree).as_bytes())?;
            }
        }
        Commands::Export {
            project,
            root,
            format,
            output,
        } => {
            let format = format.unwrap_or(config.export_format);
            // The output file is created only after the export succeeds.
            let buf = tms.export(project, root, format)?;
            match output {
                Some(path) => {
                    let mut file = BufWriter::new(File::create(&path)?);
                    file.write_all(&buf)?;
                    file.flush()?;
                    tracing::info!(path = %path.display(), "Export written");
                }
                None => {
                    std::io::stdout().lock().write_all(&buf)?;
                }
            }
        }
        Commands::DeleteFolder { project, folder } => {
            tms.transaction(|| tms.folders.delete(project, folder))?;
            if cli.json {
                println!("{}", serde_json::json!({ "deleted": folder }));
            } else {
                println!("Deleted folder {}", folder);
            }
        }
    }

    Ok(())
}
