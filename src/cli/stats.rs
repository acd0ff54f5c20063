//! Statistics command - `stats`.

use crate::{
    cli::CliContext,
    core::{
        calendar,
        history::{self, Overview},
        period::Period,
    },
    errors::Result,
};
use chrono::{DateTime, TimeZone};
use clap::Args;
use std::fmt::{Display, Write};

/// Widest bar in the consumption chart, in characters.
const CHART_WIDTH: usize = 30;

/// Arguments for `stats`.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Period to summarize: 3m, 6m, 12m, last-year or all
    #[arg(long, short, default_value_t = Period::Last6Months)]
    pub period: Period,
}

/// Shows totals, the monthly chart, a forecast and the tariff timeline.
pub async fn stats<Tz: TimeZone>(
    ctx: &CliContext,
    args: StatsArgs,
    now: &DateTime<Tz>,
) -> Result<String>
where
    Tz::Offset: Display,
{
    let view = history::overview(&ctx.database, args.period, now, ctx.config.locale).await?;
    if view.readings.is_empty() {
        return Ok(format!("No readings for period {}.", args.period));
    }
    Ok(render(&view, &now.timezone()))
}

fn render<Tz: TimeZone>(view: &Overview, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let stats = &view.stats;
    let mut out = format!("📊 Statistics ({}, {} readings)\n", view.period, view.readings.len());

    let _ = writeln!(out, "Total paid:        {:.2}", stats.total_paid);
    let _ = writeln!(out, "Total consumption: {:.1}", stats.total_consumption);
    let _ = writeln!(out, "Average:           {:.1}", stats.average_consumption);
    let _ = writeln!(
        out,
        "Min / max:         {:.1} / {:.1}",
        stats.min_consumption, stats.max_consumption
    );

    out.push_str("\nConsumption by reading (* above average)\n");
    for point in &stats.monthly {
        let _ = writeln!(
            out,
            "{:<4} {:<width$} {:.1}{}",
            point.month,
            bar(point.consumption, stats.max_consumption),
            point.consumption,
            if point.is_above_average { " *" } else { "" },
            width = CHART_WIDTH
        );
    }

    if let Some(forecast) = &view.forecast {
        let _ = writeln!(
            out,
            "\n🔮 Forecast for {} {}: {:.1} units, {:.2} to pay",
            forecast.next_month,
            forecast.year,
            forecast.expected_consumption,
            forecast.expected_amount
        );
    }

    if !view.tariff_history.is_empty() {
        out.push_str("\nTariff history\n");
        for change in &view.tariff_history {
            let _ = writeln!(
                out,
                "{:.2} since {}{}",
                change.tariff,
                calendar::format_day(change.effective_date, tz),
                if change.is_current { " (current)" } else { "" }
            );
        }
    }

    out.trim_end().to_string()
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let width = CHART_WIDTH as f64;
    let len = ((value / max) * width).round().clamp(1.0, width) as usize;
    "█".repeat(len)
}
