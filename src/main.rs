use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parcel_notice::inspect::DocumentReport;
use parcel_notice::{
    generate_letters, tidy_directory, write_info_files, Enricher, Extractor, HttpAddressLookup,
    PdfTextSource, Settings,
};

#[derive(Parser)]
#[command(name = "parcel-notice")]
#[command(about = "Registry extracts to owner notification letters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract holder rows from the registry PDFs of each source directory
    Extract {
        /// Source directory (repeatable); defaults to the configured ones
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,

        /// Where aggregated_output.csv goes; defaults to dir_etapas
        #[arg(long)]
        aggregate_to: Option<PathBuf>,
    },
    /// Fill declared residence columns of a table, in place
    Enrich {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Generate one letter per addressable recipient
    Letters,
    /// Tidy generated letters and append the signature
    Tidy,
    /// Write project info files from a semicolon-delimited listing
    InfoFiles {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        output: PathBuf,
    },
    /// Print the structure of a .docx; defaults to the letter template
    Inspect {
        docx: Option<PathBuf>,

        /// Dump as JSON, style descriptors included
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let settings = Settings::load();

    let level = settings
        .as_ref()
        .ok()
        .and_then(|s| s.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let settings = settings?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { dirs, aggregate_to } => run_extract(&settings, dirs, aggregate_to),
        Commands::Enrich { input } => run_enrich(&settings, input),
        Commands::Letters => run_letters(&settings),
        Commands::Tidy => run_tidy(&settings),
        Commands::InfoFiles { input, output } => run_info_files(&input, &output),
        Commands::Inspect { docx, json } => run_inspect(&settings, docx, json),
    }
}

fn run_extract(settings: &Settings, dirs: Vec<PathBuf>, aggregate_to: Option<PathBuf>) -> Result<()> {
    let dirs = if dirs.is_empty() { settings.source_dirs.clone() } else { dirs };
    if dirs.is_empty() {
        bail!("No source directories: pass --dir or set DIR_ELEKTRINE_1, DIR_ELEKTRINE_2, ...");
    }
    let stage_dir = aggregate_to.or_else(|| settings.dir_etapas.clone());

    println!("📂 Extracting registry records from {} directories", dirs.len());
    let extractor = Extractor::new(PdfTextSource::new());
    let summary = extractor.run(&dirs, stage_dir.as_deref())?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for report in &summary.directories {
        match &report.output {
            Some(output) => println!(
                "✓ {}: {} documents, {} rows ({} duplicates removed) → {}",
                report.dir.display(),
                report.documents,
                report.unique_rows,
                report.extracted_rows - report.unique_rows,
                output.display()
            ),
            None => println!("⚠️  {}: no PDF files", report.dir.display()),
        }
        if report.skipped > 0 {
            println!("   {} unreadable documents skipped", report.skipped);
        }
    }
    for missing in &summary.missing_dirs {
        println!("⚠️  {}: directory not found", missing.display());
    }
    for (dir, error) in &summary.failed_dirs {
        println!("❌ {}: {}", dir.display(), error);
    }

    println!(
        "\n✅ {} documents, {} rows",
        summary.total_documents(),
        summary.total_rows()
    );
    if let Some(aggregated) = &summary.aggregated {
        println!("📊 Aggregated table: {}", aggregated.display());
    }

    Ok(())
}

fn run_enrich(settings: &Settings, input: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| settings.enrichment_input());
    let cookie = settings.require_rc_cookie()?;

    let lookup = HttpAddressLookup::new(&settings.lookup_url, &settings.lookup_purpose, cookie)?;
    let enricher = Enricher::new(lookup).with_delay(settings.lookup_delay());

    println!("🏠 Looking up declared residences for {}", input.display());
    let summary = enricher.enrich_file(&input)?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Rows processed: {}", summary.rows);
    println!("✓ Lookups: {} (cache hits: {})", summary.lookups, summary.cache_hits);
    println!("✅ Addresses found: {}", summary.found);

    Ok(())
}

fn run_letters(settings: &Settings) -> Result<()> {
    let stage_dir = settings.require_dir_etapas()?;
    let template = settings.require_template_file_name()?;

    println!("✉️  Generating letters in {}", stage_dir.display());
    let summary = generate_letters(
        stage_dir,
        template,
        &settings.etapas_output_file_name,
        settings.sender_email(),
    )?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Recipients: {}", summary.groups);
    println!("✓ Skipped (no declared address): {}", summary.skipped.len());
    println!("✅ Letters written: {} → {}", summary.letters.len(), summary.out_dir.display());

    Ok(())
}

fn run_tidy(settings: &Settings) -> Result<()> {
    let dir = settings.require_dir_sutvarkymas()?;

    println!("🧹 Tidying letters in {}", dir.display());
    let summary = tidy_directory(dir, settings.dir_parasas.as_deref())?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Tidied: {}", summary.tidied.len());
    for (path, error) in &summary.failed {
        println!("❌ {}: {}", path.display(), error);
    }

    Ok(())
}

fn run_info_files(input: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let written = write_info_files(input, output)?;
    info!(count = written.len(), "Project info files written");
    println!("✅ {} project info files written to {}", written.len(), output.display());
    Ok(())
}

fn run_inspect(settings: &Settings, docx: Option<PathBuf>, json: bool) -> Result<()> {
    let path = match docx {
        Some(path) => path,
        None => settings
            .require_dir_etapas()?
            .join(settings.require_template_file_name()?),
    };

    let report = DocumentReport::open(&path)?;
    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}\nDOCUMENT: {}\n{}\n", "=".repeat(50), path.display(), "=".repeat(50));
        print!("{}", report.render());
    }

    Ok(())
}
