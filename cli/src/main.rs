//! pdfground CLI - PDF grounding content extraction tool

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfground::parser::{LopdfBackend, PdfBackend, TextExtractor};
use pdfground::{
    CleanupOptions, CleanupPreset, ExtractedContent, ExtractionConfig, ExtractionProfile,
    Extractor, SourceDocument, TextCleaner,
};

#[derive(Parser)]
#[command(name = "pdfground")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Extract grounding text and page images from PDFs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text (and page images when the text is sparse) from a PDF
    Extract {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        opts: ExtractArgs,
    },

    /// Download a PDF and extract it
    Fetch {
        /// Document URL
        #[arg(value_name = "URL")]
        url: String,

        #[command(flatten)]
        opts: ExtractArgs,
    },

    /// Show document information and the sparse-text verdict
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Settings profile
        #[arg(long, value_enum, default_value = "library")]
        profile: Profile,
    },

    /// Clean text from a file or stdin
    Clean {
        /// Input text file (stdin if not specified)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        /// Text cleanup preset
        #[arg(long, value_enum, default_value = "standard")]
        cleanup: CleanupLevel,

        /// Keep printable ASCII only
        #[arg(long)]
        ascii: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct ExtractArgs {
    /// Settings profile
    #[arg(long, value_enum, default_value = "library")]
    profile: Profile,

    /// JSON config file (overrides the profile)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print `{ text, images }` as JSON
    #[arg(long)]
    json: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// Write rendered pages as JPEG files into this directory
    #[arg(long, value_name = "DIR")]
    images_dir: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Maximum pages scanned for text
    #[arg(long)]
    max_pages: Option<u32>,

    /// Sparse-text threshold in characters
    #[arg(long)]
    min_text: Option<usize>,

    /// Render page images in parallel with text extraction
    #[arg(long)]
    speculative: bool,

    /// Wall-clock limit in seconds (0 disables)
    #[arg(long)]
    timeout: Option<u64>,
}

impl ExtractArgs {
    fn config(&self) -> Result<ExtractionConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ExtractionConfig::from_json_file(path)?,
            None => ExtractionConfig::from_profile(self.profile.into()),
        };
        if let Some(pages) = self.max_pages {
            config = config.with_max_pages_text(pages);
        }
        if let Some(min_text) = self.min_text {
            config = config.with_min_text_threshold(min_text);
        }
        if self.speculative {
            config = config.speculative();
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
        Ok(config.validated()?)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// Fresh uploads: smaller budgets, noise lines dropped
    Upload,
    /// Library books (default)
    Library,
    /// ASCII text, fixed 1.5x rendering, up to 5 pages
    Utility,
}

impl From<Profile> for ExtractionProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Upload => ExtractionProfile::Upload,
            Profile::Library => ExtractionProfile::Library,
            Profile::Utility => ExtractionProfile::Utility,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CleanupLevel {
    /// Control characters and whitespace only
    Minimal,
    /// Standard cleanup (default)
    Standard,
    /// Also drop page numbers and short header/footer lines
    Aggressive,
}

impl From<CleanupLevel> for CleanupPreset {
    fn from(level: CleanupLevel) -> Self {
        match level {
            CleanupLevel::Minimal => CleanupPreset::Minimal,
            CleanupLevel::Standard => CleanupPreset::Standard,
            CleanupLevel::Aggressive => CleanupPreset::Aggressive,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { input, opts } => cmd_extract(&input, &opts),
        Commands::Fetch { url, opts } => cmd_fetch(&url, &opts),
        Commands::Info { input, profile } => cmd_info(&input, profile),
        Commands::Clean {
            input,
            cleanup,
            ascii,
        } => cmd_clean(input.as_deref(), cleanup, ascii),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn cmd_extract(input: &Path, opts: &ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = Extractor::new(opts.config()?);
    log::debug!("Config: {:?}", extractor.config());
    let source = SourceDocument::from_path(input)?;

    let pb = spinner("Extracting...");
    let result = extractor.extract(source);
    pb.finish_and_clear();

    emit(&result?, opts)
}

fn cmd_fetch(url: &str, opts: &ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = Extractor::new(opts.config()?);
    log::debug!("Config: {:?}", extractor.config());
    let rt = tokio::runtime::Runtime::new()?;

    let pb = spinner("Downloading and extracting...");
    let result = rt.block_on(extractor.extract_url(url));
    pb.finish_and_clear();

    emit(&result?, opts)
}

fn emit(content: &ExtractedContent, opts: &ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &opts.images_dir {
        fs::create_dir_all(dir)?;
        for image in &content.images {
            let path = dir.join(format!("page-{:03}.jpg", image.page_number));
            fs::write(&path, BASE64.decode(image.base64_payload())?)?;
            eprintln!("{} {}", "Wrote".green(), path.display());
        }
    }

    let body = if opts.json || opts.compact {
        let grounding = content.grounding();
        if opts.compact {
            serde_json::to_string(&grounding)?
        } else {
            serde_json::to_string_pretty(&grounding)?
        }
    } else {
        content.text.clone()
    };

    if let Some(path) = &opts.output {
        fs::write(path, &body)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", body);
    }

    eprintln!(
        "{} {} chars from {}/{} pages, {} page images{}",
        "Done:".green().bold(),
        content.text_chars(),
        content.pages_scanned,
        content.total_pages,
        content.images.len(),
        if content.truncated { " (truncated)" } else { "" }
    );

    Ok(())
}

fn cmd_info(input: &Path, profile: Profile) -> Result<(), Box<dyn std::error::Error>> {
    let config = ExtractionConfig::from_profile(profile.into());
    let data = fs::read(input)?;
    let backend = LopdfBackend::load_bytes(&data)?;

    let raw = TextExtractor::from_config(&config).extract(&backend, None)?;
    let text = TextCleaner::new(config.cleanup.clone()).clean(&raw.text);
    let chars = text.trim().chars().count();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), backend.version());
    println!("{}: {}", "Size".bold(), data.len());
    println!("{}: {}", "Pages".bold(), backend.page_count());
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if backend.is_encrypted() { "Yes" } else { "No" }
    );

    println!();
    println!("{}", "Text Layer".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Pages scanned".bold(), raw.pages_scanned);
    if !raw.skipped_pages.is_empty() {
        let skipped: Vec<String> = raw.skipped_pages.iter().map(|p| p.to_string()).collect();
        println!("{}: {}", "Unreadable pages".bold(), skipped.join(", ").yellow());
    }
    println!("{}: {}", "Characters".bold(), chars);
    println!("{}: {}", "Words".bold(), text.split_whitespace().count());

    let verdict = if chars < config.min_text_threshold {
        format!("sparse (< {}), page images would be rendered", config.min_text_threshold)
            .yellow()
    } else {
        "sufficient".green()
    };
    println!("{}: {}", "Verdict".bold(), verdict);

    Ok(())
}

fn cmd_clean(
    input: Option<&Path>,
    cleanup: CleanupLevel,
    ascii: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut options = CleanupOptions::from_preset(cleanup.into());
    if ascii {
        options = options.ascii_only();
    }
    println!("{}", TextCleaner::new(options).clean(&text));
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfground".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF grounding content extraction tool");
    println!();
    println!("License: MIT");
}
