//! Single-table commands printing to stdout.

use clap::{Args, Subcommand};

use peakhour_core::export::{write_daily_peaks, write_hour_buckets, write_hour_frequency};
use peakhour_core::{
    render_daily_peaks, render_heatmap, render_hour_frequency, Config, PeakAnalyzer, RenderError,
};

use super::source::{OutputFormat, RangeArgs};

#[derive(Args, Debug)]
pub struct TableArgs {
    #[command(flatten)]
    pub range: RangeArgs,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum ReportAction {
    /// Peak hour of each day
    Peaks(TableArgs),
    /// How often each hour was the daily peak
    Frequency(TableArgs),
    /// Every hourly total in the range
    Buckets(TableArgs),
    /// Day x hour heatmap of hourly totals
    Heatmap {
        #[command(flatten)]
        range: RangeArgs,
    },
}

pub fn run(action: ReportAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let analyzer = PeakAnalyzer::new()
        .with_evening_window(config.analysis.evening_start, config.analysis.evening_end);

    match action {
        ReportAction::Peaks(args) => {
            let (range, readings) = args.range.load(config)?;
            let analysis = analyzer.analyze(&readings, &range)?;
            match args.format {
                OutputFormat::Text => print!("{}", render_daily_peaks(&analysis.daily_peaks)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&analysis.daily_peaks)?)
                }
                OutputFormat::Csv => {
                    write_daily_peaks(std::io::stdout().lock(), &analysis.daily_peaks)?
                }
            }
        }
        ReportAction::Frequency(args) => {
            let (range, readings) = args.range.load(config)?;
            let analysis = analyzer.analyze(&readings, &range)?;
            match args.format {
                OutputFormat::Text => print!("{}", render_hour_frequency(&analysis.hour_frequency)),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&analysis.hour_frequency)?)
                }
                OutputFormat::Csv => {
                    write_hour_frequency(std::io::stdout().lock(), &analysis.hour_frequency)?
                }
            }
        }
        ReportAction::Buckets(args) => {
            let (range, readings) = args.range.load(config)?;
            let analysis = analyzer.analyze(&readings, &range)?;
            match args.format {
                OutputFormat::Text | OutputFormat::Csv => {
                    write_hour_buckets(std::io::stdout().lock(), &analysis.buckets)?
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&analysis.buckets)?)
                }
            }
        }
        ReportAction::Heatmap { range } => {
            let (range, readings) = range.load(config)?;
            let analysis = analyzer.analyze(&readings, &range)?;
            match render_heatmap(&analysis.buckets) {
                Ok(text) => print!("{text}"),
                Err(RenderError::EmptyGrid) => println!("No hourly totals in range."),
            }
        }
    }
    Ok(())
}
