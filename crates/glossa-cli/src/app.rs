//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use glossa_ast::ParsedDocument;
use glossa_core::{
    list_providers, load_document, HtmlGenerator, HtmlParser, OutcomeStatus, SectionTranslator,
    Settings, SETTINGS_FILE,
};

/// Output format for documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderFormat {
    /// Regenerated HTML markup
    Html,
    /// Rich document (DOCX)
    Docx,
    /// The document tree as JSON
    Json,
}

impl RenderFormat {
    /// Guess the format from an output file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("docx") {
            Some(RenderFormat::Docx)
        } else if ext.eq_ignore_ascii_case("json") {
            Some(RenderFormat::Json)
        } else if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") {
            Some(RenderFormat::Html)
        } else {
            None
        }
    }

    /// Explicit choice, else the output extension, else the fallback
    fn resolve(explicit: Option<Self>, output: Option<&Path>, fallback: Self) -> Self {
        explicit
            .or_else(|| output.and_then(Self::from_path))
            .unwrap_or(fallback)
    }
}

/// Output format for the info report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InfoFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "glossa")]
#[command(author, version, about = "Translate styled grammar pages without losing their structure", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./glossa.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse markup into the JSON document tree
    Parse {
        /// Input HTML file
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Render a document as HTML or DOCX
    Render {
        /// Input HTML or JSON document
        input: PathBuf,

        /// Output file (defaults to stdout; required for DOCX)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (inferred from the output extension, else HTML)
        #[arg(short, long, value_enum)]
        format: Option<RenderFormat>,
    },

    /// Translate a document through the configured collaborator
    Translate {
        /// Input HTML or JSON document
        input: PathBuf,

        /// Output file (defaults to stdout; required for DOCX)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (inferred from the output extension, else HTML)
        #[arg(short, long, value_enum)]
        format: Option<RenderFormat>,

        /// Collaborator name, overriding the settings file
        #[arg(short, long)]
        provider: Option<String>,

        /// Translation file for the mapping collaborator
        #[arg(short, long)]
        mapping: Option<PathBuf>,

        /// Glossary file (TOML or JSON)
        #[arg(short, long)]
        glossary: Option<PathBuf>,

        /// Target language named in requests
        #[arg(short = 'l', long)]
        target_language: Option<String>,
    },

    /// Show version, collaborators and effective settings
    Info {
        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: InfoFormat,
    },
}

/// Overrides for the translation settings taken from the command line
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub provider: Option<String>,
    pub mapping: Option<PathBuf>,
    pub glossary: Option<PathBuf>,
    pub target_language: Option<String>,
}

impl TranslateOptions {
    fn apply(self, settings: &mut Settings) {
        let translation = &mut settings.translation;
        if let Some(provider) = self.provider {
            translation.provider = provider;
        }
        if let Some(mapping) = self.mapping {
            translation.mapping_file = Some(mapping);
        }
        if let Some(glossary) = self.glossary {
            translation.glossary = Some(glossary);
        }
        if let Some(language) = self.target_language {
            translation.target_language = language;
        }
    }
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse {
            input,
            output,
            pretty,
        } => parse_command(&input, output.as_deref(), pretty, &settings),
        Commands::Render {
            input,
            output,
            format,
        } => render_command(&input, output.as_deref(), format, &settings),
        Commands::Translate {
            input,
            output,
            format,
            provider,
            mapping,
            glossary,
            target_language,
        } => {
            let options = TranslateOptions {
                provider,
                mapping,
                glossary,
                target_language,
            };
            translate_command(&input, output.as_deref(), format, options, settings)
        }
        Commands::Info { format } => {
            let report = info_command(format, &settings)?;
            println!("{}", report);
            Ok(())
        }
    }
}

/// Install the stderr log subscriber
fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

/// `RUST_LOG` when set, otherwise INFO, or DEBUG with `--verbose`
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    match rust_log.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::new(directives),
        None if verbose => EnvFilter::new("debug"),
        None => EnvFilter::new("info"),
    }
}

/// Execute the parse command
pub fn parse_command(
    input: &Path,
    output: Option<&Path>,
    pretty: bool,
    settings: &Settings,
) -> Result<()> {
    let doc = read_document(input, settings)?;
    let json = if pretty {
        serde_json::to_string_pretty(&doc)
    } else {
        serde_json::to_string(&doc)
    }
    .context("Failed to serialize document tree")?;

    write_output(output, json.as_bytes())?;
    info!(
        nodes = doc.stats.total_nodes,
        segments = doc.stats.text_segments,
        "Parsed {}",
        input.display()
    );
    Ok(())
}

/// Execute the render command
pub fn render_command(
    input: &Path,
    output: Option<&Path>,
    format: Option<RenderFormat>,
    settings: &Settings,
) -> Result<()> {
    let format = RenderFormat::resolve(format, output, RenderFormat::Html);
    let doc = read_document(input, settings)?;
    let bytes = render_bytes(&doc, format, settings)?;
    write_output_for(format, output, &bytes)?;
    info!(format = ?format, bytes = bytes.len(), "Rendered {}", input.display());
    Ok(())
}

/// Execute the translate command
///
/// A failed translation writes nothing and returns an error; the input is
/// never replaced by partially processed output.
pub fn translate_command(
    input: &Path,
    output: Option<&Path>,
    format: Option<RenderFormat>,
    options: TranslateOptions,
    mut settings: Settings,
) -> Result<()> {
    let format = RenderFormat::resolve(format, output, RenderFormat::Html);
    if format == RenderFormat::Docx && output.is_none() {
        anyhow::bail!("DOCX output needs a file: pass --output <path>");
    }

    options.apply(&mut settings);
    let mut translator = SectionTranslator::from_config(&settings.translation)
        .context("Failed to set up the translation collaborator")?;

    let mut doc = read_document(input, &settings)?;
    let outcome = translator.translate_document(&mut doc);

    eprintln!(
        "{}: {} ({} applied, {} missing, {} attempt(s))",
        input.display(),
        outcome.status,
        outcome.applied,
        outcome.missing.len(),
        outcome.attempts
    );
    if !outcome.missing.is_empty() {
        warn!(missing = ?outcome.missing, "Collaborator left segments untranslated");
    }
    if let Some(tokens) = outcome.tokens_used {
        debug!(tokens, "Collaborator token usage");
    }

    if let OutcomeStatus::Failed { message } = &outcome.status {
        anyhow::bail!("Translation of {} failed: {}", input.display(), message);
    }

    let bytes = render_bytes(&doc, format, &settings)?;
    write_output_for(format, output, &bytes)
}

/// Build the info report
pub fn info_command(format: InfoFormat, settings: &Settings) -> Result<String> {
    let providers = list_providers();
    match format {
        InfoFormat::Json => {
            let report = serde_json::json!({
                "version": glossa_core::VERSION,
                "providers": providers,
                "settings": settings,
            });
            serde_json::to_string_pretty(&report).context("Failed to serialize info report")
        }
        InfoFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("glossa v{}\n\n", glossa_core::VERSION));
            out.push_str("Providers:\n");
            for provider in &providers {
                let marker = if provider.name == settings.translation.provider {
                    "*"
                } else {
                    " "
                };
                out.push_str(&format!(
                    "  {} {:<8} {}\n",
                    marker, provider.name, provider.description
                ));
            }
            out.push_str("\nSettings:\n");
            out.push_str(
                &settings
                    .to_toml_string()
                    .context("Failed to render settings")?,
            );
            Ok(out.trim_end().to_string())
        }
    }
}

fn read_document(input: &Path, settings: &Settings) -> Result<ParsedDocument> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    let parser = HtmlParser::with_config(settings.parser.clone());
    load_document(input, &parser)
        .with_context(|| format!("Failed to load document: {}", input.display()))
}

fn render_bytes(doc: &ParsedDocument, format: RenderFormat, settings: &Settings) -> Result<Vec<u8>> {
    match format {
        RenderFormat::Html => {
            let mut generator = HtmlGenerator::with_config(settings.generator.clone());
            Ok(generator.generate(doc).into_bytes())
        }
        RenderFormat::Json => serde_json::to_vec_pretty(doc).context("Failed to serialize document tree"),
        RenderFormat::Docx => glossa_ooxml::render_docx(doc).context("Failed to generate DOCX"),
    }
}

fn write_output_for(format: RenderFormat, output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    if format == RenderFormat::Docx && output.is_none() {
        anyhow::bail!("DOCX output needs a file: pass --output <path>");
    }
    write_output(output, bytes)
}

/// Write to the output file, or stdout when none is given
fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => fs::write(path, bytes)
            .with_context(|| format!("Failed to write output file: {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")
        }
    }
}

/// Load settings from a config file or use defaults
fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Settings::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        }
        None => Settings::load(Path::new(SETTINGS_FILE))
            .with_context(|| format!("Failed to load config: {}", SETTINGS_FILE)),
    }
}
