use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;
use std::process;
use std::thread;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ggdl_common::manifest::{self, LexerConfig};
use ggdl_common::{Diagnostic, Position};
use ggdl_lexer::lexer::cursor::advance_over;
use ggdl_lexer::lexer::{self, ReaderSource};
use ggdl_lexer::{Token, TokenKind, Tokenizer};

/// GDL token stream tool.
///
/// Tokenizes a game description and prints its tokens.
#[derive(Parser, Debug)]
#[command(
    name = "ggdlc",
    version,
    about,
    long_about = "GDL token stream tool.\n\nTokenizes a .gdl/.kif game description and prints one token per line.\nLexical errors are reported as diagnostics.\n\nExamples:\n  ggdlc tictactoe.kif                  Print the token stream\n  ggdlc tictactoe.kif --json           Print tokens as JSON lines\n  ggdlc tictactoe.kif --check          Report lexical errors only"
)]
struct Cli {
    /// Input game description.
    input: PathBuf,

    /// Print tokens as JSON lines.
    #[arg(long)]
    json: bool,

    /// Report lexical errors without printing tokens.
    #[arg(long)]
    check: bool,

    /// Manifest to use instead of searching for ggdl.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leave comment tokens out of the output.
    #[arg(long = "skip-comments")]
    skip_comments: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    debug!(?config, "lexer configuration");

    let file = match File::open(&cli.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let file_name = cli
        .input
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    // === Tokenize ===
    // The producer scans on its own thread; tokens are printed as they arrive.
    let (mut tokenizer, receiver) =
        Tokenizer::with_config(ReaderSource::new(BufReader::new(file)), &config);
    let producer = thread::spawn(move || tokenizer.read_all());

    let skip_comments = cli.skip_comments || config.skip_comments;
    let mut unexpected = Vec::new();
    for token in receiver {
        if matches!(token.kind, TokenKind::Unexpected(_)) {
            unexpected.push(token.clone());
        }
        if cli.check || (skip_comments && matches!(token.kind, TokenKind::LineComment(_))) {
            continue;
        }
        print_token(&token, cli.json);
    }

    let outcome = match producer.join() {
        Ok(outcome) => outcome,
        Err(panic) => std::panic::resume_unwind(panic),
    };
    if let Err(e) = outcome {
        eprintln!("error: failed reading '{}': {}", cli.input.display(), e);
        process::exit(1);
    }

    // === Diagnostics ===
    let diags = lexer::diagnostics(&unexpected, &file_name);
    if !diags.is_empty() {
        let source = fs::read(&cli.input)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        for diag in diags.diagnostics() {
            print_diagnostic(diag, &source, &file_name);
        }
        process::exit(1);
    }

    if cli.check {
        println!("No lexical errors.");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// An explicit `--config` must load; otherwise a missing ggdl.toml means
/// defaults.
fn load_config(cli: &Cli) -> Result<LexerConfig, manifest::ManifestError> {
    if let Some(path) = &cli.config {
        return manifest::load_manifest(path).map(|m| m.lexer);
    }
    let abs_input = fs::canonicalize(&cli.input).unwrap_or_else(|_| cli.input.clone());
    match manifest::find_and_load_manifest(&abs_input) {
        Ok(m) => Ok(m.lexer),
        Err(manifest::ManifestError::NotFound(_)) => Ok(LexerConfig::default()),
        Err(e) => Err(e),
    }
}

fn print_token(token: &Token, json: bool) {
    if json {
        match serde_json::to_string(token) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("error: failed to serialize token: {}", e),
        }
        return;
    }
    if token.is_eof() {
        println!("{:>4}:{:<3} {}", "-", "-", token.type_str());
    } else {
        println!(
            "{:>4}:{:<3} {:<11} {:?}",
            token.line(),
            token.column(),
            token.type_str(),
            token.image(),
        );
    }
}

/// Character index of the text at `target`. With `on_token` set, zero-width
/// whitespace sharing the position is passed over so the index lands on the
/// token itself.
fn char_offset(source: &str, target: Position, on_token: bool) -> usize {
    let mut pos = Position::new(1, 1);
    let mut count = 0;
    for (index, c) in source.chars().enumerate() {
        if pos.same_place(target) && !(on_token && c.is_whitespace()) {
            return index;
        }
        pos = advance_over(pos, [c]);
        count = index + 1;
    }
    count
}

/// Renders one lexical error with its source line.
fn print_diagnostic(diag: &Diagnostic, source: &str, file_name: &str) {
    let start = char_offset(source, diag.span.start, true);
    let end = char_offset(source, diag.span.end, false).max(start + 1);

    let mut report = Report::build(ReportKind::Error, file_name, start)
        .with_message(&diag.message)
        .with_label(
            Label::new((file_name, start..end))
                .with_message(&diag.message)
                .with_color(Color::Red),
        );

    if let Some(ref suggestion) = diag.suggestion {
        report = report.with_help(suggestion);
    }

    if let Err(e) = report
        .finish()
        .eprint((file_name, Source::from(source)))
    {
        debug!(error = %e, "could not render diagnostic");
        eprintln!("{}", diag);
    }
}
