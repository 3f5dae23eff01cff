//! Relink CLI - repair missing-file references in a Photos library

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relink::config::{self, RelinkConfig};
use relink::importer::PhotosImporter;
use relink::repair::{self, RepairOptions};
use relink::report::RepairReport;
use relink::reconcile;
use relink::sidecar::{FileSystem, LocalFs};
use relink::storage::{self, CatalogStats, CatalogStore};
use relink::ui::{self, Icons, TableBuilder};
use relink::volume::{CachedProbe, DiskutilProbe};
use relink::{PathResolver, ResumeState};

/// Exit status when the import budget ran out before every group was submitted
const EXIT_STOPPED_AT_LIMIT: u8 = 2;

#[derive(Parser)]
#[command(name = "relink")]
#[command(version)]
#[command(about = "Repair missing-file references in a Photos library")]
#[command(long_about = r#"
Relink repairs referenced (not copied) originals that Photos reports as
missing after they moved to another volume:
  1. Re-import the originals into a scratch library to get fresh bookmarks
  2. Copy those bookmarks back into the real library's catalog
  3. Point resources at volume rows that match the mounted volumes

Quit Photos before `rewrite` or `reconcile`. During `import`, Photos must
have the scratch library open.

Example usage:
  relink scan ~/Pictures/Photos\ Library.photoslibrary
  relink import ~/Pictures/Photos\ Library.photoslibrary --scratch ~/Pictures/Scratch.photoslibrary
  relink rewrite ~/Pictures/Photos\ Library.photoslibrary --scratch ~/Pictures/Scratch.photoslibrary
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./relink.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every bookmark in a library and show where it points
    Scan {
        /// Path to the .photoslibrary
        library: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Import the library's referenced files into a scratch library
    Import {
        /// Path to the .photoslibrary to repair
        library: PathBuf,

        /// Scratch .photoslibrary, open in Photos while importing
        #[arg(short, long)]
        scratch: Option<PathBuf>,

        /// Groups per import batch
        #[arg(long)]
        group_size: Option<usize>,

        /// Batches to submit before stopping
        #[arg(long)]
        max_imports: Option<usize>,

        /// Batches between long pauses
        #[arg(long)]
        imports_before_pausing: Option<usize>,

        /// Leave .AAE sidecars in place while importing
        #[arg(long)]
        no_move_aae: bool,
    },

    /// Copy fresh bookmarks from the scratch library and fix volume links
    Rewrite {
        /// Path to the .photoslibrary to repair
        library: PathBuf,

        /// Scratch .photoslibrary holding the fresh bookmarks
        #[arg(short, long)]
        scratch: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Point resources at volume rows matching the mounted volumes
    Reconcile {
        /// Path to the .photoslibrary
        library: PathBuf,
    },

    /// Write a relink.toml with default settings
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[derive(Serialize)]
struct ScanEntry<'a> {
    primary_key: i64,
    path: &'a str,
    exists: bool,
}

#[derive(Serialize)]
struct ScanOutput<'a> {
    targets: Vec<ScanEntry<'a>>,
    report: &'a RepairReport,
    stats: CatalogStats,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let loaded = config::load_config(Some(config_path.as_path()))
        .with_context(|| format!("failed to read {}", config_path.display()))?
        .unwrap_or_default();

    match cli.command {
        Commands::Scan { library, format } => run_scan(&library, format),
        Commands::Import {
            library,
            scratch,
            group_size,
            max_imports,
            imports_before_pausing,
            no_move_aae,
        } => {
            let mut options = RepairOptions::default();
            loaded.apply(&mut options);
            if let Some(group_size) = group_size {
                options.group_size = group_size;
            }
            if let Some(max_imports) = max_imports {
                options.max_imports = max_imports;
            }
            if let Some(imports_before_pausing) = imports_before_pausing {
                options.imports_before_pausing = imports_before_pausing;
            }
            if no_move_aae {
                options.move_aae = false;
            }
            let scratch = scratch_library(scratch, &loaded)?;
            run_import(&library, &scratch, &options)
        }
        Commands::Rewrite {
            library,
            scratch,
            format,
        } => {
            let scratch = scratch_library(scratch, &loaded)?;
            run_rewrite(&library, &scratch, format)
        }
        Commands::Reconcile { library } => run_reconcile(&library),
        Commands::Init { force } => {
            config::write_config(&config_path, &RelinkConfig::with_defaults(), force)?;
            ui::success(&format!("Wrote {}", config_path.display()));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn scratch_library(flag: Option<PathBuf>, loaded: &RelinkConfig) -> anyhow::Result<PathBuf> {
    flag.or_else(|| loaded.scratch_library.clone())
        .context("no scratch library given (use --scratch or set scratch_library in relink.toml)")
}

fn open_catalog(library: &Path, writable: bool) -> anyhow::Result<CatalogStore> {
    let path = storage::catalog_path(library);
    let store = if writable {
        CatalogStore::open(&path)
    } else {
        CatalogStore::open_read_only(&path)
    };
    store.with_context(|| format!("failed to open catalog {}", path.display()))
}

fn resolver() -> PathResolver<CachedProbe<DiskutilProbe>> {
    PathResolver::new(CachedProbe::new(DiskutilProbe))
}

fn run_scan(library: &Path, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let store = open_catalog(library, false)?;
    let resolver = resolver();
    let mut report = RepairReport::new();
    let targets = repair::collect_targets(&store, &resolver, &mut report)?;
    let stats = store.stats()?;

    let entries: Vec<ScanEntry> = targets
        .iter()
        .map(|t| ScanEntry {
            primary_key: t.primary_key,
            path: &t.path,
            exists: LocalFs.exists(Path::new(&t.path)),
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let output = ScanOutput {
                targets: entries,
                report: &report,
                stats,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            ui::header(&format!("Scanning {}", library.display()));
            for entry in &entries {
                ui::path_status(entry.path, entry.exists);
            }
            let missing = entries.iter().filter(|e| !e.exists).count();

            ui::section(&format!("{} Summary", Icons::STATS));
            let mut table = TableBuilder::new();
            table.add_row("Bookmarks", stats.bookmarks);
            table.add_row("With bookmark data", stats.bookmarks_with_data);
            table.add_row("Volumes", stats.volumes);
            table.add_row("Resolved", entries.len());
            table.add_row("Not on disk", missing);
            table.add_row("Unresolvable", report.skipped.len());
            println!("{}", table.build());
            print_not_repaired(&report);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_import(library: &Path, scratch: &Path, options: &RepairOptions) -> anyhow::Result<ExitCode> {
    let store = open_catalog(library, false)?;
    let scratch_store = open_catalog(scratch, false)?;
    let resolver = resolver();

    ui::header(&format!("Importing into {}", scratch.display()));
    ui::info("Library", &library.display().to_string());
    ui::info("Batch size", &format!("{} groups", options.group_size));

    let mut report = RepairReport::new();
    let targets = repair::collect_targets(&store, &resolver, &mut report)?;
    let resume = ResumeState::compute(&scratch_store, &resolver)?;
    drop(scratch_store);

    let bar = ui::BatchBar::new("Importing");
    let mut importer = PhotosImporter::new();
    let summary = repair::run_imports(
        &targets,
        &resume,
        &mut importer,
        &LocalFs,
        options,
        &mut report,
        &mut |done: usize, total: usize| bar.update(done, total),
    );
    let summary = match summary {
        Ok(summary) => summary,
        Err(e) => {
            bar.abandon();
            ui::error(&e.to_string());
            return Err(e.into());
        }
    };
    bar.finish(summary.batches_submitted);

    ui::section(&format!("{} Import", Icons::STATS));
    let mut table = TableBuilder::new();
    table.add_row("Resolved records", report.resolved);
    table.add_row("Groups pending", summary.groups_pending);
    table.add_row("Batches submitted", summary.batches_submitted);
    table.add_row("Files submitted", summary.files_submitted);
    table.add_row("Already imported", summary.files_reused);
    table.add_row("Missing on disk", summary.files_missing);
    table.add_row("Sidecars moved", summary.sidecars_moved);
    println!("{}", table.build());
    print_not_repaired(&report);

    if summary.stopped_at_limit {
        ui::warn(&format!(
            "Stopped after {} imports; run again to continue",
            summary.batches_submitted
        ));
        return Ok(ExitCode::from(EXIT_STOPPED_AT_LIMIT));
    }
    ui::success("Import complete");
    Ok(ExitCode::SUCCESS)
}

fn run_rewrite(library: &Path, scratch: &Path, format: OutputFormat) -> anyhow::Result<ExitCode> {
    let mut store = open_catalog(library, true)?;
    let scratch_store = open_catalog(scratch, false)?;
    let resolver = resolver();
    let mut report = RepairReport::new();

    repair::finalize(&mut store, &scratch_store, &resolver, &LocalFs, &mut report)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            ui::header(&format!("Rewrote {}", library.display()));
            let mut table = TableBuilder::new();
            if let Some(rewrite) = &report.rewrite {
                table.add_row("Bookmarks updated", rewrite.updated);
                table.add_row("Without fresh bookmark", rewrite.unmatched);
            }
            if let Some(reconciled) = &report.reconcile {
                add_reconcile_rows(&mut table, reconciled);
            }
            println!("{}", table.build());
            print_not_repaired(&report);
            if report.is_complete() {
                ui::success("Every bookmark repaired");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_reconcile(library: &Path) -> anyhow::Result<ExitCode> {
    let mut store = open_catalog(library, true)?;
    let resolver = resolver();
    let summary = store.with_transaction(|store| reconcile::reconcile(store, resolver.probe()))?;

    ui::header(&format!("Reconciled volumes in {}", library.display()));
    let mut table = TableBuilder::new();
    add_reconcile_rows(&mut table, &summary);
    println!("{}", table.build());
    Ok(ExitCode::SUCCESS)
}

fn add_reconcile_rows(table: &mut TableBuilder, summary: &reconcile::ReconcileSummary) {
    table.add_row("Resources checked", summary.checked);
    table.add_row("Resources repointed", summary.repointed);
    table.add_row("Volumes created", summary.volumes_created);
    table.add_row("Volumes not mounted", summary.unverified);
    table.add_row("Dangling volume links", summary.dangling);
}

fn print_not_repaired(report: &RepairReport) {
    let skipped = report.not_repaired();
    if skipped.is_empty() {
        return;
    }
    ui::section(&format!("{} Not repaired ({})", Icons::WARN, skipped.len()));
    for record in skipped {
        ui::not_repaired(record);
    }
}
