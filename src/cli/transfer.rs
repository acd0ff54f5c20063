//! Backup commands - `export`, `import` and `init`.

use crate::{
    cli::CliContext,
    core::{
        calendar,
        history::{self, ImportReport},
    },
    errors::Result,
};
use chrono::{DateTime, TimeZone};
use clap::Args;
use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

/// File name pattern for exports when no path is given.
const EXPORT_FILE_FORMAT: &str = "history_%Y%m%d_%H%M%S.txt";

/// Arguments for `export`.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output file (defaults to `history_<timestamp>.txt` in the current directory)
    pub path: Option<PathBuf>,

    /// Print to stdout instead of writing a file
    #[arg(long, conflicts_with = "path")]
    pub stdout: bool,

    /// Start the file with a `META|tariff|date` line so `import` restores the tariff setting
    #[arg(long)]
    pub with_metadata: bool,
}

/// Arguments for `import`.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// File previously written by `export`
    pub path: PathBuf,
}

/// Arguments for `init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Restore the history from this backup instead of starting empty
    #[arg(long)]
    pub from: Option<PathBuf>,
}

/// `history_<timestamp>.txt` for the given moment.
fn export_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: Display,
{
    PathBuf::from(now.format(EXPORT_FILE_FORMAT).to_string())
}

/// Writes the history, without metadata, to `dir/history_<timestamp>.txt`.
///
/// Returns `None` when the history is empty and nothing was written.
pub async fn write_backup<Tz: TimeZone>(
    ctx: &CliContext,
    dir: &Path,
    now: &DateTime<Tz>,
) -> Result<Option<PathBuf>>
where
    Tz::Offset: Display,
{
    let text = history::export_history(&ctx.database, &now.timezone(), false, now.date_naive())
        .await?;
    if text.is_empty() {
        return Ok(None);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(now));
    std::fs::write(&path, format!("{text}\n"))?;
    tracing::info!("Wrote backup to {}", path.display());
    Ok(Some(path))
}

/// Writes the whole history as text.
pub async fn export<Tz: TimeZone>(
    ctx: &CliContext,
    args: ExportArgs,
    now: &DateTime<Tz>,
) -> Result<String>
where
    Tz::Offset: Display,
{
    let text = history::export_history(
        &ctx.database,
        &now.timezone(),
        args.with_metadata,
        now.date_naive(),
    )
    .await?;

    if args.stdout {
        return Ok(text);
    }

    let path = args.path.unwrap_or_else(|| export_file_name(now));
    std::fs::write(&path, format!("{text}\n"))?;
    tracing::info!("Exported history to {}", path.display());

    let readings = history::list(&ctx.database).await?;
    Ok(format!(
        "✅ Exported to {}\n{}",
        path.display(),
        history::export_summary(&readings)
    ))
}

/// Replaces the history with a backup file.
pub async fn import<Tz: TimeZone>(
    ctx: &CliContext,
    args: ImportArgs,
    now: &DateTime<Tz>,
) -> Result<String> {
    let text = std::fs::read_to_string(&args.path)?;
    let report =
        history::import_history(&ctx.database, &text, &now.timezone(), &ctx.config.address)
            .await?;
    Ok(format_report(&report))
}

/// First-run setup: restore a backup or store the default tariff.
pub async fn init<Tz: TimeZone>(ctx: &CliContext, args: InitArgs, now: &DateTime<Tz>) -> Result<String>
where
    Tz::Offset: Display,
{
    if history::has_data(&ctx.database).await? {
        return Ok(
            "The history already has readings; use `import` to replace it.".to_string(),
        );
    }

    if let Some(path) = args.from {
        return import(ctx, ImportArgs { path }, now).await;
    }

    history::start_fresh(&ctx.database, now.date_naive()).await?;
    Ok(format!(
        "✅ Starting fresh with tariff {} from {}.\n\
         Record the first reading with `meter-buddy add <current> --previous <value>`.",
        crate::core::settings::DEFAULT_TARIFF,
        now.date_naive().format(calendar::DAY_FORMAT)
    ))
}

fn format_report(report: &ImportReport) -> String {
    let mut out = format!("✅ Imported {} readings", report.imported);
    if report.skipped > 0 {
        out.push_str(&format!(" ({} malformed lines skipped)", report.skipped));
    }
    out.push_str(&format!(
        "\nTariff {} since {}",
        report.tariff,
        report.tariff_date.format(calendar::DAY_FORMAT)
    ));
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        config::app::AppConfig,
        core::{settings, store},
        errors::Error,
        test_utils::*,
    };
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap()
    }

    async fn context() -> Result<CliContext> {
        Ok(CliContext::new(setup_test_db().await?, AppConfig::default()))
    }

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("meter-buddy-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn test_export_to_stdout() -> Result<()> {
        let ctx = context().await?;
        insert_reading_on(&ctx.database, 2026, 2, 15, 150.0, 6.84).await?;

        let args = ExportArgs {
            path: None,
            stdout: true,
            with_metadata: false,
        };
        let out = export(&ctx, args, &now()).await?;
        assert_eq!(out, "15.02.2026 1150 150 6.84 1026.00");
        Ok(())
    }

    #[tokio::test]
    async fn test_export_then_import_into_fresh_database() -> Result<()> {
        let ctx = context().await?;
        insert_reading_on(&ctx.database, 2026, 1, 15, 120.0, 6.84).await?;
        insert_reading_on(&ctx.database, 2026, 2, 15, 150.0, 6.84).await?;
        settings::set_tariff(&ctx.database, "6.84").await?;

        let path = temp_file("roundtrip.txt");
        let args = ExportArgs {
            path: Some(path.clone()),
            stdout: false,
            with_metadata: true,
        };
        let out = export(&ctx, args, &now()).await?;
        assert!(out.contains("Records: 2"));

        let fresh = context().await?;
        let out = import(&fresh, ImportArgs { path: path.clone() }, &now()).await?;
        assert!(out.starts_with("✅ Imported 2 readings"));
        assert!(out.contains("Tariff 6.84 since 15.01.2026"));
        assert_eq!(store::count(&fresh.database).await?, 2);

        std::fs::remove_file(&path)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_write_backup() -> Result<()> {
        let ctx = context().await?;
        let dir = temp_file("backup-dir");

        assert!(write_backup(&ctx, &dir, &now()).await?.is_none());
        assert!(!dir.exists());

        insert_reading_on(&ctx.database, 2026, 2, 15, 150.0, 6.84).await?;
        let path = write_backup(&ctx, &dir, &now()).await?.unwrap();
        assert_eq!(path, dir.join("history_20260320_120000.txt"));
        assert_eq!(
            std::fs::read_to_string(&path)?,
            "15.02.2026 1150 150 6.84 1026.00\n"
        );

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    #[tokio::test]
    async fn test_import_missing_file_is_io_error() -> Result<()> {
        let ctx = context().await?;
        let args = ImportArgs {
            path: temp_file("does-not-exist.txt"),
        };
        assert!(matches!(import(&ctx, args, &now()).await, Err(Error::Io(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_init_fresh_and_refuses_when_data_exists() -> Result<()> {
        let ctx = context().await?;
        settings::set_tariff(&ctx.database, "9.99").await?;

        let out = init(&ctx, InitArgs { from: None }, &now()).await?;
        assert!(out.contains("tariff 6.84 from 20.03.2026"));
        assert_eq!(settings::tariff(&ctx.database).await?, "6.84");

        insert_reading_on(&ctx.database, 2026, 2, 15, 150.0, 6.84).await?;
        let out = init(&ctx, InitArgs { from: None }, &now()).await?;
        assert!(out.contains("already has readings"));
        Ok(())
    }

    #[test]
    fn test_format_report() {
        let report = ImportReport {
            imported: 3,
            skipped: 1,
            tariff: "6.95".to_string(),
            tariff_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 25).unwrap(),
        };
        assert_eq!(
            format_report(&report),
            "✅ Imported 3 readings (1 malformed lines skipped)\nTariff 6.95 since 25.01.2026"
        );
    }
}
