use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use file_sorter::{
    classify_file, watch_directory, CategoryRegistry, Config, ConflictPolicy, EnabledCategories,
    MoveResult, MoveStatus, OrganizeEvent, OrganizeOptions, OrganizeReport, Organizer,
    INSTRUCTIONS, INSTRUCTION_KEYWORDS, OTHERS, RESEARCH_KEYWORDS, RESEARCH_PAPERS,
};

const TICK_MS: u64 = 80;

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(":: {spinner} {msg:<16} ━{bar:30}━ {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_chars("▏▎▍▌▋▊▉█▉▋▌▍▎")
        .progress_chars("━━░")
}

#[derive(Parser)]
#[command(name = "file-sorter")]
#[command(version)]
#[command(about = "Sort a folder's files into category folders")]
struct Cli {
    #[arg(
        short,
        long,
        global = true,
        env = "FILE_SORTER_CONFIG",
        help = "Config file [default: <config dir>/file-sorter/config.json]"
    )]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More log output (-v info, -vv debug)")]
    verbose: u8,
    #[arg(short, long, global = true, help = "Only log errors")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default, Clone)]
struct CategoryArgs {
    #[arg(long = "only", value_name = "CATEGORY", help = "Enable only these categories")]
    only: Vec<String>,
    #[arg(long = "disable", value_name = "CATEGORY", help = "Disable a category")]
    disable: Vec<String>,
}

impl CategoryArgs {
    fn resolve(&self, config: &Config, registry: &CategoryRegistry) -> Result<EnabledCategories> {
        let base = if self.only.is_empty() {
            config.enabled_categories(registry)?
        } else {
            EnabledCategories::from_names(registry, &self.only)?
        };

        self.disable
            .iter()
            .try_fold(base, |enabled, name| enabled.disable(registry, name))
            .map_err(Into::into)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Move the files in a folder into category subfolders
    Organize {
        #[arg(help = "Folder to organize [default: from config]")]
        root: Option<PathBuf>,
        #[command(flatten)]
        categories: CategoryArgs,
        #[arg(long, help = "On name clash: rename (default) or skip")]
        conflict: Option<ConflictPolicy>,
        #[arg(short = 'n', long, help = "Show what would move without moving")]
        dry_run: bool,
        #[arg(long, help = "Print the run report as JSON")]
        json: bool,
    },
    /// Show which category a file would be sorted into
    Classify {
        #[arg(help = "File to classify")]
        file: PathBuf,
        #[command(flatten)]
        categories: CategoryArgs,
    },
    /// List categories, their extensions and whether they are enabled
    Categories {
        #[command(flatten)]
        categories: CategoryArgs,
    },
    /// Organize a folder, then keep organizing as files arrive
    Watch {
        #[arg(help = "Folder to watch [default: from config]")]
        root: Option<PathBuf>,
        #[command(flatten)]
        categories: CategoryArgs,
        #[arg(long, help = "On name clash: rename (default) or skip")]
        conflict: Option<ConflictPolicy>,
        #[arg(long, help = "Quiet period before a pass, in milliseconds")]
        debounce_ms: Option<u64>,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        #[arg(help = "Shell to generate for (bash, zsh, fish, powershell)")]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a config file with default values
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config_path = cli.config.clone().or_else(Config::default_path);
    let config = load_config(cli.config.as_deref(), config_path.as_deref())?;
    let registry = CategoryRegistry::builtin();

    match cli.command {
        Commands::Organize {
            root,
            categories,
            conflict,
            dry_run,
            json,
        } => {
            let enabled = categories.resolve(&config, &registry)?;
            let options = OrganizeOptions {
                conflict: conflict.unwrap_or(config.conflict),
                dry_run,
            };
            let root = root.unwrap_or_else(|| config.root.clone());
            cmd_organize(&root, registry, &enabled, options, json)
        }
        Commands::Classify { file, categories } => {
            let enabled = categories.resolve(&config, &registry)?;
            cmd_classify(&file, &registry, &enabled)
        }
        Commands::Categories { categories } => {
            let enabled = categories.resolve(&config, &registry)?;
            cmd_categories(&registry, &enabled);
            Ok(())
        }
        Commands::Watch {
            root,
            categories,
            conflict,
            debounce_ms,
        } => {
            let enabled = categories.resolve(&config, &registry)?;
            let options = OrganizeOptions {
                conflict: conflict.unwrap_or(config.conflict),
                dry_run: false,
            };
            let root = root.unwrap_or_else(|| config.root.clone());
            let debounce = Duration::from_millis(debounce_ms.unwrap_or(config.watch_debounce_ms));
            cmd_watch(&root, registry, &enabled, options, debounce)
        }
        Commands::Config { action } => cmd_config(action, &config, config_path.as_deref()),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "file-sorter", &mut io::stdout());
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// An explicitly named config must exist; the default location is optional.
fn load_config(explicit: Option<&Path>, resolved: Option<&Path>) -> Result<Config> {
    match (explicit, resolved) {
        (Some(path), _) => Config::load(path),
        (None, Some(path)) => Config::load_or_default(path),
        (None, None) => Ok(Config::default()),
    }
}

fn result_line(result: &MoveResult) -> String {
    match result.status() {
        MoveStatus::Moved { .. } => {
            format!("  [+] {} -> {}", result.file_name(), result.category())
        }
        MoveStatus::Planned { destination } => format!(
            "  [~] {} -> {}",
            result.file_name(),
            destination.display()
        ),
        MoveStatus::Failed { reason } => format!(
            "  [!] {} -> {}: {}",
            result.file_name(),
            result.category(),
            reason
        ),
    }
}

fn print_summary(report: &OrganizeReport) {
    println!("\nOrganization Complete!");
    for (category, count) in report.count_by_category() {
        println!("  {}: {}", category, count);
    }
    if report.failed_count() > 0 {
        println!("  failed: {}", report.failed_count());
    }
}

fn cmd_organize(
    root: &Path,
    registry: CategoryRegistry,
    enabled: &EnabledCategories,
    options: OrganizeOptions,
    json: bool,
) -> Result<()> {
    let organizer = Organizer::new(registry).with_options(options);

    let pb = if json {
        ProgressBar::hidden()
    } else {
        println!("Organizing {}", root.display());
        let pb = ProgressBar::new(0);
        pb.set_style(bar_style());
        pb.set_message("Sorting");
        pb.enable_steady_tick(Duration::from_millis(TICK_MS));
        pb
    };

    let report = organizer.organize_with_progress(root, enabled, |event| match event {
        OrganizeEvent::Scanned { files } => pb.set_length(files as u64),
        OrganizeEvent::Processed(result) => {
            pb.println(result_line(result));
            pb.inc(1);
        }
        OrganizeEvent::Complete(_) => pb.finish_and_clear(),
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.is_empty() {
        println!("Nothing to organize.");
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn cmd_classify(file: &Path, registry: &CategoryRegistry, enabled: &EnabledCategories) -> Result<()> {
    if !file.is_file() {
        anyhow::bail!("not a file: {}", file.display());
    }

    let result = classify_file(file, registry, enabled);

    println!("File: {}", file.display());
    println!("Category: {}", result.category);
    println!("Basis: {}", result.basis);

    Ok(())
}

fn cmd_categories(registry: &CategoryRegistry, enabled: &EnabledCategories) {
    let width = registry.names().map(str::len).max().unwrap_or(0).max(OTHERS.len());

    for category in registry.iter() {
        let mark = if enabled.contains(category.name()) { "x" } else { " " };
        let sniff = match category.name() {
            RESEARCH_PAPERS => format!("  (pdf content: {})", RESEARCH_KEYWORDS.join(", ")),
            INSTRUCTIONS => format!("  (docx/txt content: {})", INSTRUCTION_KEYWORDS.join(", ")),
            _ => String::new(),
        };
        println!(
            "  [{}] {:<width$}  {}{}",
            mark,
            category.name(),
            category.extensions().join(" "),
            sniff,
            width = width
        );
    }
    println!("  [x] {:<width$}  (everything else)", OTHERS, width = width);
}

fn cmd_watch(
    root: &Path,
    registry: CategoryRegistry,
    enabled: &EnabledCategories,
    options: OrganizeOptions,
    debounce: Duration,
) -> Result<()> {
    let organizer = Organizer::new(registry).with_options(options);

    println!("Watching: {}", root.display());
    println!("\nWaiting for new files... (Ctrl+C to stop)\n");

    watch_directory(&organizer, root, enabled, debounce, |report| {
        for result in &report.results {
            println!("{}", result_line(result));
        }
        println!(
            "Organization Complete! ({} moved, {} failed)",
            report.moved_count(),
            report.failed_count()
        );
    })
}

fn cmd_config(action: ConfigAction, config: &Config, path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = path.ok_or_else(|| anyhow::anyhow!("no config location; pass --config"))?;
            if path.exists() && !force {
                anyhow::bail!(
                    "config already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(path)?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Show => println!("{}", serde_json::to_string_pretty(config)?),
        ConfigAction::Path => match path {
            Some(p) => println!("{}", p.display()),
            None => println!("(no config location on this platform)"),
        },
    }
    Ok(())
}
