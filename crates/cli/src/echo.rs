use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Graded".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Rewrite web pages for language learners\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 1000.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 10_000.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print extraction details summary
pub fn print_extraction_details(extracted: &graded_core::ExtractedText) {
    let source = match &extracted.source {
        graded_core::ContentSource::Selector(selector) => selector.clone(),
        graded_core::ContentSource::Body => "page body".to_string(),
    };

    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Extraction Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Source:".dimmed(), source.bright_white());
    eprintln!("  {} {}", "Characters:".dimmed(), extracted.char_len().to_string().bright_white());
    if extracted.truncated {
        eprintln!("  {} {}", "Truncated:".dimmed(), "Yes".bright_yellow());
    }
    eprintln!();
}

/// Print rewrite details summary
pub fn print_rewrite_details(outcome: &graded_core::RewriteOutcome) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Rewrite Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!(
        "  {} {} → {}",
        "Length:".dimmed(),
        outcome.original_length.to_string().bright_white(),
        outcome.new_length.to_string().bright_white()
    );
    eprintln!(
        "  {} {} rewritten, {} kept",
        "Chunks:".dimmed(),
        outcome.rewritten_chunks.to_string().bright_white(),
        outcome.fallback_chunks.to_string().bright_white()
    );
    eprintln!(
        "  {} {} updated, {} skipped\n",
        "Elements:".dimmed(),
        outcome.report.updated.to_string().bright_white(),
        outcome.report.skipped.to_string().bright_white()
    );
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
