use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use importer::sources::grid::ColumnRole;
use importer::sources::{GridMapping, GridTemplate};
use importer::{
    CanonicalFile, CanonicalValidator, Confirm, Contest, ContestImporter, ContestSource,
    GridSource, ImportReport, TerminalConfirm,
};
use std::path::{Path, PathBuf};
use storage::Database;
use storage::repository::{ContestRepository, SchoolRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "contest-import")]
#[command(about = "Imports olympiad and contest results into the results database", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,

    /// Answer every confirmation with yes
    #[arg(long, global = true)]
    yes: bool,

    /// Roll back every import after doing it
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one contest in the canonical JSON format
    Contest {
        file: PathBuf,

        #[arg(long)]
        validate_only: bool,
    },
    /// Import every canonical JSON file in a directory
    BulkImport {
        #[arg(long, default_value = "./imports")]
        directory: PathBuf,

        #[arg(long)]
        validate_only: bool,
    },
    /// Build a contest from a CSV grid and import it
    Grid(GridArgs),
    /// Register another name for an existing school
    Alias { alias: String, canonical: String },
    /// Print the stored results of a contest
    Summary {
        year: i64,
        #[arg(value_name = "TYPE")]
        contest_type: String,
        subject: String,
    },
}

#[derive(Args)]
struct GridArgs {
    csv: PathBuf,

    #[arg(long)]
    year: i32,

    #[arg(long)]
    subject: String,

    #[arg(long = "type")]
    contest_type: String,

    /// Contest name, `{year}` placeholders allowed
    #[arg(long)]
    name: String,

    /// Subcontest name, `{group}` placeholders allowed
    #[arg(long, default_value = "{group}")]
    subcontest_name: String,

    /// `<name>,<min class>,<max class>`
    #[arg(long)]
    class_range: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, value_name = "HEADER")]
    placement_column: Option<String>,

    #[arg(long, value_name = "HEADER")]
    name_column: Option<String>,

    #[arg(long, value_name = "HEADER")]
    first_name_column: Option<String>,

    #[arg(long, value_name = "HEADER")]
    last_name_column: Option<String>,

    #[arg(long, value_name = "HEADER")]
    class_column: Option<String>,

    #[arg(long, value_name = "HEADER")]
    school_column: Option<String>,

    #[arg(long, value_name = "HEADER")]
    instructors_column: Option<String>,

    #[arg(long, value_name = "HEADER")]
    total_column: Option<String>,

    /// Only use the columns named above, do not guess from headers
    #[arg(long)]
    no_infer: bool,

    /// One subcontest per class; use $CLASS in subcontest name, class range and description
    #[arg(long)]
    split_by_class: bool,

    /// Move the first word of each name to the end
    #[arg(long)]
    reverse_names: bool,

    /// Compute placements from the total column
    #[arg(long)]
    generate_placements: bool,

    #[arg(long)]
    validate_only: bool,
}

impl GridArgs {
    fn mapping(&self) -> GridMapping {
        let template = GridTemplate {
            year: self.year,
            subject: self.subject.clone(),
            contest_type: self.contest_type.clone(),
            name: self.name.clone(),
            subcontest_name: self.subcontest_name.clone(),
            class_range: self.class_range.clone(),
            description: self.description.clone(),
        };

        let columns = [
            (ColumnRole::Placement, &self.placement_column),
            (ColumnRole::Name, &self.name_column),
            (ColumnRole::FirstName, &self.first_name_column),
            (ColumnRole::LastName, &self.last_name_column),
            (ColumnRole::Class, &self.class_column),
            (ColumnRole::School, &self.school_column),
            (ColumnRole::Instructors, &self.instructors_column),
            (ColumnRole::Total, &self.total_column),
        ];

        columns
            .into_iter()
            .filter_map(|(role, header)| header.as_ref().map(|h| (role, h.clone())))
            .fold(GridMapping::new(template), |mapping, (role, header)| {
                mapping.column(role, header)
            })
            .infer_columns(!self.no_infer)
            .split_by_class(self.split_by_class)
            .reverse_names(self.reverse_names)
            .generate_placements(self.generate_placements)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "contest_import={},importer={},storage={}",
                log_level, log_level, log_level
            )
            .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let yes = cli.yes;
    let confirm = move |message: &str| yes || TerminalConfirm.confirm(message);

    match cli.command {
        Commands::Contest {
            file,
            validate_only,
        } => {
            let contest = load_validated(&CanonicalFile::new(&file), &file).await?;
            if !validate_only {
                let db = connect(&cli.database_url).await?;
                let mut importer = ContestImporter::new(db, confirm);
                let report = importer.import_contest(&contest, cli.dry_run).await?;
                print_report(&report);
                importer.into_database().close().await?;
            }
        }
        Commands::BulkImport {
            directory,
            validate_only,
        } => {
            handle_bulk_import(
                &directory,
                validate_only,
                cli.dry_run,
                &cli.database_url,
                confirm,
            )
            .await?;
        }
        Commands::Grid(args) => {
            let source = GridSource::new(&args.csv, args.mapping());
            let contest = load_validated(&source, &args.csv).await?;
            if !args.validate_only {
                let db = connect(&cli.database_url).await?;
                let mut importer = ContestImporter::new(db, confirm);
                let report = importer.import_contest(&contest, cli.dry_run).await?;
                print_report(&report);
                importer.into_database().close().await?;
            }
        }
        Commands::Alias { alias, canonical } => {
            let mut db = connect(&cli.database_url).await?;
            let row = SchoolRepository::new(db.connection())
                .add_alias(&alias, &canonical)
                .await
                .with_context(|| format!("Could not add alias '{}' for '{}'", alias, canonical))?;
            tracing::info!("Alias '{}' now points to school {}", row.name, row.correct);
            db.close().await?;
        }
        Commands::Summary {
            year,
            contest_type,
            subject,
        } => {
            let mut db = connect(&cli.database_url).await?;
            print_summary(&mut db, year, &contest_type, &subject).await?;
            db.close().await?;
        }
    }

    Ok(())
}

async fn connect(database_url: &str) -> Result<Database> {
    tracing::info!("Connecting to database...");
    let mut db = Database::new(database_url)
        .await
        .with_context(|| format!("Could not open database '{}'", database_url))?;
    db.run_migrations().await.context("Schema migration failed")?;
    Ok(db)
}

async fn load_validated(source: &dyn ContestSource, path: &Path) -> Result<Contest> {
    tracing::info!("Loading {} from: {}", source.name(), path.display());
    let contest = source
        .load()
        .await
        .with_context(|| format!("Could not load {}", path.display()))?;

    tracing::info!(
        "Loaded contest: {} {} {} ({} subcontests)",
        contest.year,
        contest.contest_type,
        contest.subject,
        contest.subcontests.len()
    );

    tracing::info!("Validating contest...");
    let report = CanonicalValidator::validate(&contest)?;
    report.log_warnings();
    tracing::info!("✓ Validation successful!");

    Ok(contest)
}

async fn handle_bulk_import<C: Confirm>(
    directory: &Path,
    validate_only: bool,
    dry_run: bool,
    database_url: &str,
    confirm: C,
) -> Result<()> {
    tracing::info!(
        "Scanning directory for canonical JSON files: {}",
        directory.display()
    );

    let mut json_files = Vec::new();
    let mut entries = tokio::fs::read_dir(directory).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_dir() {
            let mut sub_entries = tokio::fs::read_dir(&path).await?;
            while let Some(sub_entry) = sub_entries.next_entry().await? {
                let sub_path = sub_entry.path();
                if sub_path.extension().is_some_and(|ext| ext == "json") {
                    json_files.push(sub_path);
                }
            }
        } else if path.extension().is_some_and(|ext| ext == "json") {
            json_files.push(path);
        }
    }

    if json_files.is_empty() {
        tracing::warn!("No JSON files found in {}", directory.display());
        return Ok(());
    }

    json_files.sort();
    tracing::info!("Found {} canonical JSON file(s)", json_files.len());

    let mut importer = if validate_only {
        None
    } else {
        Some(ContestImporter::new(connect(database_url).await?, confirm))
    };

    let mut success_count = 0;
    let mut error_count = 0;

    for (idx, file_path) in json_files.iter().enumerate() {
        tracing::info!(
            "[{}/{}] Processing: {}",
            idx + 1,
            json_files.len(),
            file_path.display()
        );

        let outcome = match load_validated(&CanonicalFile::new(file_path), file_path).await {
            Ok(contest) => match importer.as_mut() {
                Some(importer) => importer
                    .import_contest(&contest, dry_run)
                    .await
                    .map(|report| print_report(&report))
                    .map_err(anyhow::Error::from),
                None => Ok(()),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                success_count += 1;
                tracing::info!("  ✓ Success");
            }
            Err(e) => {
                error_count += 1;
                tracing::error!("  ✗ Error: {:#}", e);
            }
        }
    }

    tracing::info!(
        "Summary: {} succeeded, {} failed",
        success_count,
        error_count
    );

    if let Some(importer) = importer {
        importer.into_database().close().await?;
    }

    if error_count > 0 {
        bail!("{} file(s) failed to import", error_count);
    }

    Ok(())
}

fn print_report(report: &ImportReport) {
    let verb = if report.dry_run { "Would import" } else { "Imported" };
    tracing::info!(
        "{} {} subcontest(s), {} contestant(s), {} field(s), {} mentor link(s) into contest {}{}",
        verb,
        report.subcontests.len(),
        report.contestants(),
        report.fields(),
        report.mentors(),
        report.contest_id,
        if report.contest_reused { " (existing)" } else { "" }
    );
    tracing::debug!(
        "{} selects, {} inserts, {} batch inserts, {} cache hits",
        report.stats.selects,
        report.stats.inserts,
        report.stats.batch_statements,
        report.stats.cache_hits
    );
}

async fn print_summary(db: &mut Database, year: i64, contest_type: &str, subject: &str) -> Result<()> {
    let mut repo = ContestRepository::new(db.connection());
    let contest = repo
        .find_by_identity(year, contest_type, subject)
        .await
        .with_context(|| format!("No contest {} {} {}", year, contest_type, subject))?;

    println!("{} (id {}, added {})", contest.name, contest.id, contest.created_at);
    for subcontest in repo.subcontests(contest.id).await? {
        let columns: Vec<String> = repo
            .columns(subcontest.id)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        println!();
        println!("  {} [{}]", subcontest.name, columns.join(", "));

        for result in repo.results(subcontest.id).await? {
            let entries: Vec<String> = repo
                .entries(result.contestant_id)
                .await?
                .into_iter()
                .map(|(_, entry)| entry.unwrap_or_else(|| "-".to_string()))
                .collect();
            println!(
                "  {:>4} {:<30} {:>3} {:<40} {}",
                result.placement,
                result.person_name,
                result
                    .class_level
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
                result.school_name.unwrap_or_default(),
                entries.join(" ")
            );
        }
    }

    Ok(())
}
