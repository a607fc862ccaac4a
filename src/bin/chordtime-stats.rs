//! Summarize accumulated experiment results

use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chordtime::analysis::{self, DEFAULT_NOVICES};
use chordtime::charting::PerformanceChart;
use chordtime::logging;
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};

/// descriptive statistics and plots for chordtime results
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// results file written by chordtime
    #[clap(default_value = "data.csv")]
    input: PathBuf,

    /// participant counted as a novice, repeat for several (defaults to the built-in list)
    #[clap(long = "novice")]
    novices: Vec<String>,

    /// where to write the text summary
    #[clap(short = 's', long, default_value = "statistics_summary.txt")]
    summary: PathBuf,

    /// show the per-participant performance chart in the terminal
    #[clap(long)]
    plot: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    logging::init_default();

    let novices = if args.novices.is_empty() {
        DEFAULT_NOVICES.iter().map(|s| s.to_string()).collect()
    } else {
        args.novices.clone()
    };

    let rows = analysis::load(&args.input)?;
    info!("loaded {} rows from {}", rows.len(), args.input.display());
    let result = analysis::analyze(&rows, &novices)?;

    let text = format!(
        "Generated {} from {}\n\n{}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        args.input.display(),
        result.summary_text()
    );
    fs::write(&args.summary, text)?;
    println!("Summary saved to {}", args.summary.display());

    if args.plot {
        show_plot(&analysis::performance_series(&rows))?;
    }

    Ok(())
}

/// Draw the chart until any key is pressed
fn show_plot(series: &[(String, Vec<(f64, f64)>)]) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = (|| -> Result<(), Box<dyn Error>> {
        loop {
            terminal.draw(|f| f.render_widget(PerformanceChart::new(series), f.area()))?;
            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(_) = event::read()? {
                    return Ok(());
                }
            }
        }
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}
