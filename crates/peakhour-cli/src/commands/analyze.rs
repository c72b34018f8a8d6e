//! Full analysis run: tables, charts, heatmap and summary.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::{error, info, warn};

use peakhour_core::export::{save_daily_peaks, save_hour_frequency};
use peakhour_core::{
    render_daily_peaks, render_heatmap, render_hour_frequency, Config, DailyPeak, HourFrequency,
    PeakAnalyzer, PeakSummary,
};

use super::source::RangeArgs;
use super::NoData;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub range: RangeArgs,
    /// Directory for CSV tables and chart files, defaults to output.directory
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Print the summary and tables as JSON
    #[arg(long)]
    pub json: bool,
    /// Skip the day x hour heatmap
    #[arg(long)]
    pub no_heatmap: bool,
    /// Exit with status 2 when the range holds no readings
    #[arg(long)]
    pub require_data: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a PeakSummary,
    daily_peaks: &'a [DailyPeak],
    hour_frequency: &'a [HourFrequency],
    saved: &'a [PathBuf],
}

/// Run one output step; log and record failures instead of aborting.
fn step<E: std::fmt::Display>(
    what: &str,
    path: &Path,
    result: Result<(), E>,
    saved: &mut Vec<PathBuf>,
) -> bool {
    match result {
        Ok(()) => {
            saved.push(path.to_path_buf());
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to write {what}");
            false
        }
    }
}

fn write_text(path: &Path, content: &str) -> std::io::Result<()> {
    std::fs::write(path, content)
}

pub fn run(args: AnalyzeArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (range, readings) = args.range.load(config)?;

    let analyzer = PeakAnalyzer::new()
        .with_evening_window(config.analysis.evening_start, config.analysis.evening_end);
    let analysis = analyzer.analyze(&readings, &range)?;
    let summary = analyzer.summarize(&analysis);

    if analysis.is_empty() {
        eprintln!(
            "No readings between {} and {}",
            range.start.format("%Y-%m-%d %H:%M:%S %:z"),
            range.end.format("%Y-%m-%d %H:%M:%S %:z")
        );
        if args.require_data {
            return Err(Box::new(NoData));
        }
        if args.json {
            let report = JsonReport {
                summary: &summary,
                daily_peaks: &[],
                hour_frequency: &[],
                saved: &[],
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        return Ok(());
    }

    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    std::fs::create_dir_all(&out_dir)?;

    let mut saved = Vec::new();
    let peaks_csv = out_dir.join(&config.output.peaks_csv);
    let freq_csv = out_dir.join(&config.output.frequency_csv);
    let tables_ok = step(
        "daily peak table",
        &peaks_csv,
        save_daily_peaks(&peaks_csv, &analysis.daily_peaks),
        &mut saved,
    ) & step(
        "frequency table",
        &freq_csv,
        save_hour_frequency(&freq_csv, &analysis.hour_frequency),
        &mut saved,
    );

    let peaks_chart = out_dir.join(&config.output.peaks_chart);
    step(
        "daily peak chart",
        &peaks_chart,
        write_text(&peaks_chart, &render_daily_peaks(&analysis.daily_peaks)),
        &mut saved,
    );
    let freq_chart = out_dir.join(&config.output.frequency_chart);
    step(
        "frequency chart",
        &freq_chart,
        write_text(&freq_chart, &render_hour_frequency(&analysis.hour_frequency)),
        &mut saved,
    );

    if config.output.heatmap && !args.no_heatmap {
        let heatmap_path = out_dir.join(&config.output.heatmap_chart);
        match render_heatmap(&analysis.buckets) {
            Ok(text) => {
                step("heatmap", &heatmap_path, write_text(&heatmap_path, &text), &mut saved);
            }
            Err(e) => warn!(error = %e, "skipping heatmap"),
        }
    }

    info!(files = saved.len(), dir = %out_dir.display(), "analysis outputs written");

    if args.json {
        let report = JsonReport {
            summary: &summary,
            daily_peaks: &analysis.daily_peaks,
            hour_frequency: &analysis.hour_frequency,
            saved: &saved,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Peak hour analysis");
        println!("{}", "=".repeat(50));
        for line in summary.lines() {
            println!("{line}");
        }
        println!("\nSaved:");
        for path in &saved {
            println!("  {}", path.display());
        }
    }

    if !tables_ok {
        error!("one or more tables could not be saved");
        return Err("failed to save analysis tables".into());
    }
    Ok(())
}
