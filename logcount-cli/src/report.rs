use colored::Colorize;
use logcount::{FilterDocument, RunResult, RunStatus};
use std::path::Path;
use std::time::Duration;

/// Rounds to milliseconds so humantime prints "1s 250ms" rather than nanoseconds
fn short_duration(d: Duration) -> humantime::FormattedDuration {
    humantime::format_duration(Duration::from_millis(d.as_millis() as u64))
}

/// Prints the per-filter table followed by a one-line summary
pub fn print_counts(file: &Path, result: &RunResult) {
    let width = result
        .patterns
        .iter()
        .map(|p| p.chars().count())
        .max()
        .unwrap_or(0)
        .max("Filter".len());

    println!("{}", file.display().to_string().blue());
    println!("{:<width$}  {:>12}", "Filter".bold(), "Count".bold(), width = width);
    for pc in result.pattern_counts() {
        let count = if pc.count > 0 {
            pc.count.to_string().green()
        } else {
            pc.count.to_string().normal()
        };
        println!("{:<width$}  {:>12}", pc.pattern, count, width = width);
    }
    println!(
        "\n{} matches. Analysed {} lines ({} bytes) in {}",
        result.total_matches(),
        result.stats.lines_consumed,
        result.stats.bytes_consumed,
        short_duration(result.stats.duration)
    );
}

/// Prints the result as pretty JSON
pub fn print_json(file: &Path, result: &RunResult) -> serde_json::Result<()> {
    let value = serde_json::json!({
        "file": file.display().to_string(),
        "status": result.status,
        "reason": result.reason,
        "filters": result.pattern_counts().collect::<Vec<_>>(),
        "total_matches": result.total_matches(),
        "stats": result.stats,
        "elapsed": short_duration(result.stats.duration).to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Reports a run that did not complete on stderr
pub fn print_unfinished(result: &RunResult) {
    let reason = result.reason.as_deref().unwrap_or("unknown reason");
    match result.status {
        RunStatus::Cancelled => eprintln!("{}", reason.yellow()),
        _ => eprintln!("{} {}", "error:".red().bold(), reason),
    }
}

pub fn print_filter_list(path: &Path, doc: &FilterDocument) {
    if doc.filters.is_empty() {
        println!("No filters in {}", path.display());
        return;
    }
    println!("{}", path.display().to_string().blue());
    for (i, pattern) in doc.filters.iter().enumerate() {
        println!("{:>4}: {}", i.to_string().green(), pattern);
    }
}
