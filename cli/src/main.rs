//! pdfstruct CLI - PDF to structured Markdown

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfstruct::{
    analyze_source, convert_source_with_progress, ConvertOptions, ConvertResult, DocumentSource,
    ErrorMode, LayoutConfig, PageSelection, PdfSource, Strategy,
};

#[derive(Parser)]
#[command(name = "pdfstruct")]
#[command(version)]
#[command(about = "Convert PDF documents to structured Markdown", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    #[command(flatten)]
    markdown: MarkdownArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert PDF to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        args: MarkdownArgs,
    },

    /// Print the layout analysis as JSON
    Inspect {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Layout thresholds as a JSON file
        #[arg(long, value_name = "JSON", env = "PDFSTRUCT_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args, Default)]
struct MarkdownArgs {
    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Ignore the structure tree and always analyze layout
    #[arg(long)]
    heuristic: bool,

    /// Layout thresholds as a JSON file
    #[arg(long, value_name = "JSON", env = "PDFSTRUCT_CONFIG")]
    config: Option<PathBuf>,

    /// Fail on the first unreadable page instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Print conversion statistics to stderr
    #[arg(long)]
    stats: bool,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Markdown { input, args }) => cmd_markdown(&input, &args),
        Some(Commands::Inspect {
            input,
            output,
            compact,
            pages,
            config,
        }) => cmd_inspect(
            &input,
            output.as_deref(),
            compact,
            pages.as_deref(),
            config.as_deref(),
        ),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: convert if input is provided
            if let Some(input) = cli.input {
                cmd_markdown(&input, &cli.markdown)
            } else {
                println!("{}", "Usage: pdfstruct <FILE> [-o OUTPUT]".yellow());
                println!("       pdfstruct --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn page_selection(pages: Option<&str>) -> CliResult<PageSelection> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p)?),
        None => Ok(PageSelection::All),
    }
}

fn layout_config(path: Option<&Path>) -> CliResult<LayoutConfig> {
    match path {
        Some(path) => Ok(LayoutConfig::from_json_file(path)?),
        None => Ok(LayoutConfig::default()),
    }
}

fn build_options(args: &MarkdownArgs) -> CliResult<ConvertOptions> {
    let error_mode = if args.strict {
        ErrorMode::Strict
    } else {
        ErrorMode::Lenient
    };
    let strategy = if args.heuristic {
        Strategy::Heuristic
    } else {
        Strategy::Auto
    };

    Ok(ConvertOptions::new()
        .with_layout(layout_config(args.config.as_deref())?)
        .with_pages(page_selection(args.pages.as_deref())?)
        .with_error_mode(error_mode)
        .with_strategy(strategy))
}

fn progress_bar(len: u32) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

fn cmd_markdown(input: &Path, args: &MarkdownArgs) -> CliResult<()> {
    let options = build_options(args)?;
    let source = PdfSource::open(input)?;

    let pb = progress_bar(source.page_count());
    let result = convert_source_with_progress(&source, &options, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish_and_clear();
    let result = result?;

    if result.is_empty() {
        eprintln!(
            "{}",
            "No extractable text; the file may be scanned".yellow()
        );
    }

    if let Some(path) = args.output.as_deref() {
        fs::write(path, &result.markdown)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    } else if !result.is_empty() {
        println!("{}", result.markdown);
    }

    if args.stats {
        print_stats(&result);
    }

    Ok(())
}

fn print_stats(result: &ConvertResult) {
    let stats = &result.stats;
    eprintln!();
    eprintln!("{}", "Conversion Statistics".cyan().bold());
    eprintln!("{}", "─".repeat(40).dimmed());
    eprintln!("{}: {}", "Strategy".bold(), result.strategy);
    eprintln!(
        "{}: {} ({} with text)",
        "Pages".bold(),
        stats.pages,
        stats.pages_with_text
    );
    eprintln!("{}: {}", "Headings".bold(), stats.headings);
    eprintln!("{}: {}", "List items".bold(), stats.list_items);
    eprintln!("{}: {}", "Paragraphs".bold(), stats.paragraphs);
    if let Some(body) = stats.body_size {
        eprintln!("{}: {:.1}pt", "Body size".bold(), body);
    }
}

fn cmd_inspect(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    pages: Option<&str>,
    config: Option<&Path>,
) -> CliResult<()> {
    let options = ConvertOptions::new()
        .with_layout(layout_config(config)?)
        .with_pages(page_selection(pages)?)
        .lenient();
    let source = PdfSource::open(input)?;
    let analysis = analyze_source(&source, &options)?;

    let json = if compact {
        serde_json::to_string(&analysis)?
    } else {
        serde_json::to_string_pretty(&analysis)?
    };

    if let Some(path) = output {
        fs::write(path, &json)?;
        eprintln!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult<()> {
    let source = PdfSource::open(input)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), source.version());
    println!("{}: {}", "Pages".bold(), source.page_count());
    println!(
        "{}: {}",
        "Tagged".bold(),
        if source.is_tagged() { "Yes" } else { "No" }
    );

    match analyze_source(&source, &ConvertOptions::new().lenient()) {
        Ok(analysis) => {
            let counts = analysis.counts();
            println!();
            println!("{}", "Layout Statistics".cyan().bold());
            println!("{}", "─".repeat(40).dimmed());
            println!("{}: {:.1}pt", "Body size".bold(), analysis.stats.body_size);
            let sizes: Vec<String> = analysis
                .stats
                .heading_sizes
                .iter()
                .map(|s| format!("{:.1}pt", s))
                .collect();
            println!(
                "{}: {}",
                "Heading sizes".bold(),
                if sizes.is_empty() {
                    "none".to_string()
                } else {
                    sizes.join(", ")
                }
            );
            println!("{}: {}", "Headings".bold(), counts.headings);
            println!("{}: {}", "List items".bold(), counts.list_items);
            println!("{}: {}", "Paragraphs".bold(), counts.paragraphs);
        }
        Err(e) => log::warn!("Layout analysis failed: {}", e),
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfstruct".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF to structured Markdown converter");
}
