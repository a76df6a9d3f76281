use std::{collections::HashSet, fs::File, path::PathBuf, sync::Arc};

use clap::Parser;
use sinta::{
    Category, Credentials, ErrorKind, PortalConfig, PortalSession, SessionManager, SintaCore,
    authors::load_author_list,
};
use time::{OffsetDateTime, macros::format_description};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter, layer::SubscriberExt as _, util::SubscriberInitExt};

use crate::sink::CsvSink;

mod sink;

#[derive(Parser, Debug)]
#[command(
    name = "sinta",
    about = "Harvest lecturers' research output from the SINTA portal into CSV files.",
    version
)]
struct SintaOptions {
    /// The output directory. Defaults to `output-<ddmmyyyy>`.
    #[arg(short = 'o', long = "out")]
    out_dir: Option<PathBuf>,

    /// File with one SINTA author id per line.
    #[arg(short = 'a', long = "authors", default_value = "dosen.txt")]
    authors: PathBuf,

    /// Where the session cookies are kept between runs.
    #[arg(long = "session-file")]
    session_file: Option<PathBuf>,

    /// Portal root, for mirrors or testing.
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// Ignore any saved session and log in again.
    #[arg(long = "force-login")]
    force_login: bool,

    /// The number of retries for establishing the session on network errors.
    #[arg(short = 'r', long = "retry", default_value_t = 0)]
    retry_count: u32,

    /// The categories to fetch. By default, all categories are fetched.
    #[arg(short = 'i', long, value_delimiter = ',')]
    include: Vec<String>,
    #[arg(short = 'e', long, value_delimiter = ',')]
    /// The categories to skip.
    exclude: Vec<String>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    setup_tracing()?;

    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let options = SintaOptions::parse();

    if !options.include.is_empty() && !options.exclude.is_empty() {
        eyre::bail!("You cannot use both --include and --exclude options at the same time.");
    }
    let categories = select_categories(&options.include, &options.exclude)?;

    let authors = load_author_list(&options.authors)?;
    if authors.is_empty() {
        eyre::bail!("No author ids in {}", options.authors.display());
    }

    let mut config = match options.base_url.as_deref() {
        Some(url) => PortalConfig::with_base_url(url)?,
        None => PortalConfig::default(),
    };
    if let Some(path) = options.session_file {
        config = config.session_file(path);
    }

    let mut manager = SessionManager::new(config, Credentials::from_env())
        .force_refresh(options.force_login);
    let session = initialize_with_retry(&mut manager, options.retry_count).await?;

    let out_dir = match options.out_dir {
        Some(dir) => dir,
        None => default_out_dir()?,
    };
    let mut sink = CsvSink::new(&out_dir);
    let mut core = SintaCore::new(&session, manager.config(), &authors);
    let summary = core.run(&categories, &mut sink).await?;

    for category in &summary.categories {
        tracing::info!(
            category = %category.category,
            records = category.records,
            skipped = category.skipped,
            failed_units = category.failed_units,
            "Summary"
        );
    }
    tracing::info!(
        total = summary.total_records(),
        files = sink.written().len(),
        out_dir = %out_dir.display(),
        "Run finished"
    );
    Ok(())
}

/// Categories to run, in canonical order.
fn select_categories(include: &[String], exclude: &[String]) -> eyre::Result<Vec<Category>> {
    let parse = |names: &[String]| -> eyre::Result<HashSet<Category>> {
        names
            .iter()
            .map(|name| name.parse::<Category>().map_err(eyre::Report::from))
            .collect()
    };
    let include = parse(include)?;
    let exclude = parse(exclude)?;
    Ok(Category::ALL
        .into_iter()
        .filter(|c| include.is_empty() || include.contains(c))
        .filter(|c| !exclude.contains(c))
        .collect())
}

/// Only transport errors are retried; the core itself never retries.
async fn initialize_with_retry(
    manager: &mut SessionManager,
    retry_count: u32,
) -> eyre::Result<PortalSession> {
    let mut attempt = 0;
    loop {
        match manager.initialize().await {
            Ok(session) => return Ok(session),
            Err(e) if e.kind() == ErrorKind::Transport && attempt < retry_count => {
                attempt += 1;
                tracing::warn!(attempt, retry_count, error = %e, "Session setup failed, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn default_out_dir() -> eyre::Result<PathBuf> {
    let today = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    Ok(PathBuf::from(out_dir_name(today)?))
}

fn out_dir_name(date: OffsetDateTime) -> eyre::Result<String> {
    let stamp = date.format(format_description!("[day][month][year]"))?;
    Ok(format!("output-{stamp}"))
}

fn setup_tracing() -> eyre::Result<()> {
    std::fs::create_dir_all("reports")?;
    let stdout_log = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .with_level(true)
        .with_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    let extraction_report_file = File::create("reports/extraction_report.json")
        .map_err(|e| eyre::eyre!("Failed to create log file: {e}"))?;
    let extraction_report_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_span_list(false)
        .with_writer(Arc::new(extraction_report_file))
        .with_filter(filter::filter_fn(|metadata| {
            metadata.target() == "extraction_failure"
        }));

    let error_report_file = File::create("reports/error_report.json")
        .map_err(|e| eyre::eyre!("Failed to create error log file: {e}"))?;
    let error_report_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(Arc::new(error_report_file))
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(extraction_report_layer)
        .with(error_report_layer)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn all_categories_by_default() {
        assert_eq!(select_categories(&[], &[]).unwrap(), Category::ALL);
    }

    #[test]
    fn include_keeps_canonical_order() {
        let selected = select_categories(&names(&["wos", "buku"]), &[]).unwrap();
        assert_eq!(selected, [Category::Books, Category::Wos]);
    }

    #[test]
    fn exclude_removes_categories() {
        let selected = select_categories(&[], &names(&["profile", "ppm"])).unwrap();
        assert_eq!(selected.len(), 6);
        assert!(!selected.contains(&Category::Profile));
        assert!(!selected.contains(&Category::Services));
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(select_categories(&names(&["patents"]), &[]).is_err());
    }

    #[test]
    fn output_directory_is_day_month_year() {
        let name = out_dir_name(datetime!(2025-03-07 10:00 UTC)).unwrap();
        assert_eq!(name, "output-07032025");
    }
}
