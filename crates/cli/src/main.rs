mod echo;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use graded_core::client::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use graded_core::{
    CefrLevel, ChunkConfig, ClientConfig, Command, DirectorySink, DownloadSink, ExportFormat, ExtractConfig, FetchConfig,
    GradedError, HtmlPage, MemorySink, PageDom, Response, Session, SessionConfig, chunk_text, extract_main_text,
    fetch_file, fetch_stdin, fetch_url,
};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rewrite or summarize web pages for a CEFR reading level
#[derive(Parser, Debug)]
#[command(name = "graded")]
#[command(author = "Graded Contributors")]
#[command(version)]
#[command(about = "Rewrite or summarize web pages for a CEFR reading level", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite a page's text for a level and write the resulting HTML
    Rewrite {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        credentials: CredentialArgs,
        #[command(flatten)]
        service: ServiceArgs,
        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Summarize a page for a level and save the summary document
    Summarize {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        credentials: CredentialArgs,
        #[command(flatten)]
        service: ServiceArgs,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Print the main text of a page as it would be sent for rewriting
    Extract {
        #[command(flatten)]
        page: PageArgs,
        /// Show chunk boundaries
        #[arg(long)]
        chunks: bool,
        /// Output file (default: stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Answer JSON commands read from stdin, one per line, with one JSON response per line
    Host {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        service: ServiceArgs,
        #[command(flatten)]
        export: ExportArgs,
        /// Write the final page HTML here when stdin closes
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PageArgs {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "60", value_name = "SECS")]
    timeout: u64,
}

#[derive(Args, Debug)]
struct CredentialArgs {
    /// Target CEFR level (A1, A2, B1, B2, C1, C2)
    #[arg(short, long, default_value = "B1", value_name = "LEVEL")]
    level: CefrLevel,

    /// API key for the completion service (falls back to OPENAI_API_KEY)
    #[arg(long, env = "GRADED_API_KEY", hide_env_values = true, value_name = "KEY")]
    api_key: Option<String>,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Model identifier
    #[arg(long, default_value = DEFAULT_MODEL, value_name = "MODEL")]
    model: String,

    /// Chat-completions endpoint URL
    #[arg(long, default_value = DEFAULT_ENDPOINT, value_name = "URL")]
    endpoint: String,

    /// Maximum chunk requests in flight
    #[arg(long, default_value = "4", value_name = "NUM")]
    concurrency: usize,

    /// Fade delay before each page swap, in milliseconds
    #[arg(long, default_value = "300", value_name = "MS")]
    fade_ms: u64,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Directory for summary files (default: the user's download directory)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Save summaries with a .pdf name and application/pdf type
    #[arg(long)]
    legacy_pdf: bool,
}

impl ExportArgs {
    fn sink(&self) -> DirectorySink {
        match &self.out_dir {
            Some(dir) => DirectorySink::new(dir),
            None => DirectorySink::downloads(),
        }
    }

    fn format(&self) -> ExportFormat {
        if self.legacy_pdf { ExportFormat::LegacyPdf } else { ExportFormat::Html }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "graded=debug,graded_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn session_config(page: &PageArgs, service: &ServiceArgs, format: ExportFormat) -> SessionConfig {
    SessionConfig::builder()
        .endpoint(&service.endpoint)
        .model(&service.model)
        .timeout(page.timeout)
        .max_concurrent_requests(service.concurrency)
        .fade_duration(Duration::from_millis(service.fade_ms))
        .export_format(format)
        .build()
}

fn resolve_api_key(credentials: &CredentialArgs) -> anyhow::Result<String> {
    credentials
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .filter(|key| !key.trim().is_empty())
        .context("No API key: pass --api-key or set GRADED_API_KEY or OPENAI_API_KEY")
}

/// Load the page HTML and the URL it came from.
async fn load_page(page: &PageArgs, verbose: bool) -> anyhow::Result<(String, Option<String>)> {
    let input = page.input.as_str();

    let (html, url) = if input == "-" {
        if verbose {
            echo::print_step(1, 3, "Reading from stdin");
        }
        (fetch_stdin().context("Failed to read from stdin")?, None)
    } else if input.starts_with("http://") || input.starts_with("https://") {
        if verbose {
            echo::print_step(1, 3, &format!("Fetching from {}", input.bright_white().underline()));
        }
        let config = FetchConfig { timeout: page.timeout, ..Default::default() };
        let html = fetch_url(input, &config).await.context("Failed to fetch URL")?;
        (html, Some(input.to_string()))
    } else {
        if verbose {
            echo::print_step(1, 3, &format!("Reading from file {}", input.bright_white()));
        }
        let html = fetch_file(input).with_context(|| format!("Failed to read file: {}", input))?;
        let url = fs::canonicalize(input).ok().and_then(|p| Url::from_file_path(p).ok()).map(String::from);
        (html, url)
    };

    if verbose {
        eprintln!("  {} {}\n", "Size:".dimmed(), echo::format_size(html.len()).bright_white());
    }

    Ok((html, url))
}

async fn open_page(page: &PageArgs, verbose: bool) -> anyhow::Result<HtmlPage> {
    let (html, url) = load_page(page, verbose).await?;
    let parsed = HtmlPage::parse(&html, url.as_deref()).context("Failed to parse HTML")?;

    if verbose && let Some(title) = parsed.title() {
        eprintln!("  {} {}\n", "Title:".dimmed(), title.bright_white());
    }

    Ok(parsed)
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print!("{}", content),
    }
    Ok(())
}

async fn run_rewrite(
    page: &PageArgs, credentials: &CredentialArgs, service: &ServiceArgs, output: Option<&Path>, verbose: bool,
) -> anyhow::Result<()> {
    let api_key = resolve_api_key(credentials)?;
    let started = Instant::now();
    let html = open_page(page, verbose).await?;

    if verbose {
        echo::print_step(2, 3, &format!("Rewriting for {}", credentials.level.to_string().bright_white()));
    }
    let config = session_config(page, service, ExportFormat::default());
    let mut session = Session::with_config(html, MemorySink::default(), config);
    let outcome = session
        .rewrite_page(&api_key, credentials.level)
        .await
        .context("Failed to rewrite page")?;

    if outcome.fallback_chunks > 0 {
        echo::print_warning(&format!(
            "{} of {} chunks kept their original text",
            outcome.fallback_chunks,
            outcome.fallback_chunks + outcome.rewritten_chunks
        ));
    }
    if verbose {
        echo::print_rewrite_details(&outcome);
        echo::print_step(3, 3, "Writing output");
        echo::print_timing("Total", started.elapsed());
    }

    write_output(output, &session.into_page().markup())
}

async fn run_summarize(
    page: &PageArgs, credentials: &CredentialArgs, service: &ServiceArgs, export: &ExportArgs, verbose: bool,
) -> anyhow::Result<()> {
    let api_key = resolve_api_key(credentials)?;
    let started = Instant::now();
    let html = open_page(page, verbose).await?;

    if verbose {
        echo::print_step(2, 3, &format!("Summarizing for {}", credentials.level.to_string().bright_white()));
    }
    let config = session_config(page, service, export.format());
    let mut session = Session::with_config(html, export.sink(), config);
    let outcome = session
        .summarize_page(&api_key, credentials.level)
        .await
        .context("Failed to summarize page")?;

    if verbose {
        echo::print_step(3, 3, "Saving summary");
        echo::print_timing("Total", started.elapsed());
    }
    echo::print_success(&format!(
        "Summary ({} chars) saved to {}",
        outcome.summary_length,
        outcome.saved_to.bright_white()
    ));
    println!("{}", outcome.summary);
    Ok(())
}

async fn run_extract(page: &PageArgs, chunks: bool, output: Option<&Path>, verbose: bool) -> anyhow::Result<()> {
    let html = open_page(page, verbose).await?;

    if verbose {
        echo::print_step(2, 3, "Extracting main text");
    }
    let extracted = extract_main_text(&html.markup(), &ExtractConfig::default()).context("Failed to extract text")?;
    if extracted.text.trim().is_empty() {
        return Err(GradedError::NoContent.into());
    }
    if verbose {
        echo::print_extraction_details(&extracted);
        echo::print_step(3, 3, "Writing output");
    }

    let text = if chunks {
        chunk_text(&extracted.text, &ChunkConfig::default())
            .map(|chunk| {
                let tag = if chunk.needs_processing() { "" } else { " (kept)" };
                format!("[{}]{} {}\n", chunk.index, tag, chunk.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        format!("{}\n", extracted.text)
    };

    write_output(output, &text)
}

async fn run_host(
    page: &PageArgs, service: &ServiceArgs, export: &ExportArgs, output: Option<&Path>, verbose: bool,
) -> anyhow::Result<()> {
    if page.input == "-" {
        anyhow::bail!("host mode reads commands from stdin; pass the page as a file or URL");
    }
    let html = open_page(page, verbose).await?;
    let session = Session::with_config(html, export.sink(), session_config(page, service, export.format()));
    serve(session, output, verbose).await
}

/// Answer commands from stdin until it closes.
async fn serve<S: DownloadSink>(
    mut session: Session<HtmlPage, ClientConfig, S>, output: Option<&Path>, verbose: bool,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await.context("Failed to read message")? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match Command::from_json(&line) {
            Ok(command) => session.handle(command).await,
            Err(e) => Response::failure(format!("Invalid message: {}", e)),
        };
        handled += 1;

        let mut reply = response.to_json();
        reply.push('\n');
        stdout.write_all(reply.as_bytes()).await.context("Failed to write response")?;
        stdout.flush().await.context("Failed to write response")?;
    }

    if verbose {
        echo::print_info(&format!("Handled {} messages", handled));
    }
    if let Some(path) = output {
        write_output(Some(path), &session.into_page().markup())?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let result = match &cli.command {
        Commands::Rewrite { page, credentials, service, output } => {
            run_rewrite(page, credentials, service, output.as_deref(), cli.verbose).await
        }
        Commands::Summarize { page, credentials, service, export } => {
            run_summarize(page, credentials, service, export, cli.verbose).await
        }
        Commands::Extract { page, chunks, output } => run_extract(page, *chunks, output.as_deref(), cli.verbose).await,
        Commands::Host { page, service, export, output } => {
            run_host(page, service, export, output.as_deref(), cli.verbose).await
        }
    };

    if let Err(err) = result {
        echo::print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}
