//! CLI binary for edgequake-pdf2cards.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, prints the deck, and optionally runs a terminal quiz.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2cards::{
    generate, inspect, write_deck, Feedback, GenerationConfig, GenerationOutput,
    GenerationProgressCallback, PageSelection, ProgressCallback, QuizSession,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar with one log line per finished chunk.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_chunks: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} chunks  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        self.bar.set_length(total_chunks as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Generating");
    }

    fn on_chunk_start(&self, chunk_num: usize, _total: usize) {
        self.bar.set_message(format!("chunk {chunk_num}"));
    }

    fn on_chunk_complete(&self, chunk_num: usize, total: usize, cards: usize) {
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            green("✓"),
            chunk_num,
            total,
            dim(&format!("{cards} cards"))
        ));
        self.bar.inc(1);
    }

    fn on_chunk_error(&self, chunk_num: usize, total: usize, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Chunk {:>3}/{:<3}  {}",
            red("✗"),
            chunk_num,
            total,
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_generation_complete(&self, produced: usize, requested: usize) {
        self.bar.finish_and_clear();
        if produced >= requested {
            eprintln!("{} {} flashcards generated", green("✔"), bold(&produced.to_string()));
        } else {
            eprintln!(
                "{} {}/{} flashcards generated",
                cyan("⚠"),
                bold(&produced.to_string()),
                requested
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Five cards to stdout
  pdf2cards lecture.pdf

  # Twenty cards, saved as JSON
  pdf2cards -n 20 lecture.pdf -o deck.json

  # Larger windows, first ten pages only
  pdf2cards --chunk-size 4 --overlap 1 --pages 1-10 book.pdf

  # Quiz yourself in the terminal
  pdf2cards --quiz lecture.pdf

  # Inspect PDF metadata (no API key needed)
  pdf2cards --inspect-only lecture.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
"#;

/// Generate multiple-choice flashcards from PDF files and URLs using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2cards",
    version,
    about = "Generate multiple-choice flashcards from PDF files and URLs using LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Number of flashcards to generate.
    #[arg(short = 'n', long, env = "PDF2CARDS_NUM_CARDS", default_value_t = 5)]
    num_cards: usize,

    /// Write the deck to this file (.json for JSON, otherwise text blocks).
    #[arg(short, long, env = "PDF2CARDS_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Pages per chunk.
    #[arg(long, env = "PDF2CARDS_CHUNK_SIZE", default_value_t = 3)]
    chunk_size: usize,

    /// Pages shared between consecutive chunks (must be < chunk size).
    #[arg(long, env = "PDF2CARDS_OVERLAP", default_value_t = 1)]
    overlap: usize,

    /// Number of concurrent LLM calls (1 = sequential).
    #[arg(short, long, env = "PDF2CARDS_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2CARDS_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2CARDS_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2CARDS_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2CARDS_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max LLM output tokens per chunk.
    #[arg(long, env = "PDF2CARDS_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Retries per chunk on LLM failure.
    #[arg(long, env = "PDF2CARDS_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-chunk LLM call timeout in seconds.
    #[arg(long, env = "PDF2CARDS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2CARDS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Exit with an error when fewer cards than requested were produced.
    #[arg(long, env = "PDF2CARDS_STRICT")]
    strict: bool,

    /// Print the full GenerationOutput as JSON instead of text blocks.
    #[arg(long, env = "PDF2CARDS_JSON")]
    json: bool,

    /// Quiz yourself on the generated deck in the terminal.
    #[arg(long, conflicts_with = "json")]
    quiz: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2CARDS_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no generation.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2CARDS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2CARDS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run generation ───────────────────────────────────────────────────
    let output = generate(&cli.input, &config)
        .await
        .context("Flashcard generation failed")?;

    if let Some(ref path) = cli.output {
        write_deck(&output, path)
            .await
            .with_context(|| format!("Failed to write deck to {}", path.display()))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.quiz {
        run_quiz(&output)?;
    } else if cli.output.is_none() {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{}", output.to_text()).context("Failed to write to stdout")?;
    }

    if !cli.quiet {
        print_summary(&output, cli.output.as_ref());
    }

    if cli.strict {
        output.into_result().context("Deck is short")?;
    }

    Ok(())
}

fn print_summary(output: &GenerationOutput, path: Option<&PathBuf>) {
    let stats = &output.stats;
    eprintln!(
        "{}  {}/{} cards  {} chunks  {}ms{}",
        if stats.shortfall() == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        stats.produced_cards,
        stats.requested_cards,
        stats.total_chunks,
        stats.total_duration_ms,
        path.map(|p| format!("  →  {}", bold(&p.display().to_string())))
            .unwrap_or_default(),
    );
    if stats.shortfall() > 0 {
        eprintln!(
            "   {} blocks skipped, {} chunks failed",
            dim(&stats.skipped_blocks.to_string()),
            dim(&stats.failed_chunks.to_string()),
        );
    }
    eprintln!(
        "   {} tokens in  /  {} tokens out",
        dim(&stats.total_input_tokens.to_string()),
        dim(&stats.total_output_tokens.to_string()),
    );
}

/// Ask every card on stdin, then print the score.
fn run_quiz(output: &GenerationOutput) -> Result<()> {
    if output.cards.is_empty() {
        eprintln!("{} No flashcards to quiz on", cyan("⚠"));
        return Ok(());
    }
    let mut quiz = QuizSession::new(&output.cards);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let total = quiz.cards().len();

    for (i, card) in quiz.cards().iter().enumerate() {
        println!("\n{} {}", bold(&format!("Flashcard {}/{}", i + 1, total)), card.question());
        for (letter, text) in card.options() {
            println!("  {}. {}", bold(&letter.to_string()), text);
        }

        loop {
            print!("Your answer: ");
            io::stdout().flush().context("Failed to flush stdout")?;
            let Some(line) = lines.next() else {
                anyhow::bail!("Quiz aborted: stdin closed");
            };
            let line = line.context("Failed to read answer")?;
            let Some(letter) = line.trim().chars().next() else {
                continue;
            };
            match quiz.answer(i, letter) {
                Ok(grade) if grade.is_correct() => {
                    println!("{}", green("Correct!"));
                    break;
                }
                Ok(grade) => {
                    println!(
                        "{} The answer is {}. {}",
                        red("Wrong."),
                        grade.correct,
                        card.answer_text()
                    );
                    break;
                }
                Err(e) => println!("{}", dim(&e.to_string())),
            }
        }
    }

    if let Some(feedback) = quiz.feedback() {
        let line = format!("{feedback}");
        println!(
            "\n{}  You scored {}/{} ({}%)",
            bold("Quiz complete!"),
            quiz.correct(),
            total,
            quiz.percentage()
        );
        match feedback {
            Feedback::Excellent | Feedback::Good => println!("{}", green(&line)),
            Feedback::Average => println!("{}", cyan(&line)),
            Feedback::NeedsWork => println!("{}", red(&line)),
        }
    }
    Ok(())
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .num_cards(cli.num_cards)
        .chunk_size(cli.chunk_size)
        .overlap(cli.overlap)
        .concurrency(cli.concurrency)
        .pages(parse_pages(&cli.pages)?)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    if s.contains(',') {
        let pages = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        if pages.contains(&0) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1");
        }
        return Ok(PageSelection::Set(pages));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_forms() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(parse_pages("1,3,5").unwrap(), PageSelection::Set(vec![1, 3, 5]));
        assert_eq!(parse_pages(" 7 ").unwrap(), PageSelection::Single(7));
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-2").is_err());
        assert!(parse_pages("1,x").is_err());
    }

    #[test]
    fn cli_parses_defaults() {
        let cli = Cli::try_parse_from(["pdf2cards", "notes.pdf"]).unwrap();
        assert_eq!(cli.num_cards, 5);
        assert_eq!((cli.chunk_size, cli.overlap), (3, 1));
        assert!(!cli.quiz);
    }
}
