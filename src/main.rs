use anyhow::Result;
use clap::Parser;
use interwiki::config::{self, DumpPaths, RunConfig};
use interwiki::fetch::{self, DownloadPolicy, RemoteDump};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "interwiki")]
#[command(about = "Find Wikipedia articles with many interlanguage links")]
struct Cli {
    /// Only consider articles in this category or its subcategories
    category: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding the SQL dumps
    #[arg(long, default_value = ".")]
    dump_dir: PathBuf,

    /// Report file
    #[arg(short, long, default_value = config::DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Interlanguage links an article needs to be reported
    #[arg(long, default_value_t = config::DEFAULT_THRESHOLD,
          value_parser = clap::value_parser!(u32).range(1..))]
    threshold: u32,

    /// Subcategory levels to descend below the root category
    #[arg(long, default_value_t = config::DEFAULT_MAX_ITERATIONS)]
    iterations: u32,

    /// Wiki whose articles are counted
    #[arg(long, default_value = config::DEFAULT_PRIMARY_WIKI)]
    primary_wiki: String,

    /// Wiki whose titles and sizes are reported alongside
    #[arg(long, default_value = config::DEFAULT_SECOND_WIKI)]
    second_wiki: String,

    /// Language code of the second wiki in the langlinks table
    #[arg(long, default_value = config::DEFAULT_SECOND_LANG)]
    second_lang: String,

    /// Dump mirror to download missing files from
    #[arg(long, default_value = config::DEFAULT_MIRROR)]
    mirror: String,

    /// Download missing dumps without asking
    #[arg(short, long, conflicts_with = "no_download")]
    yes: bool,

    /// Fail instead of downloading missing dumps
    #[arg(long)]
    no_download: bool,

    /// Hide progress spinners
    #[arg(short, long)]
    quiet: bool,
}

fn remote_dumps(cli: &Cli, paths: &DumpPaths) -> Vec<RemoteDump> {
    let primary_root = config::dump_root_url(&cli.mirror, &cli.primary_wiki);
    let second_root = config::dump_root_url(&cli.mirror, &cli.second_wiki);
    [
        (&primary_root, &paths.category_links),
        (&primary_root, &paths.lang_links),
        (&primary_root, &paths.pages),
        (&second_root, &paths.second_pages),
    ]
    .into_iter()
    .map(|(root, path)| RemoteDump {
        root_url: root.clone(),
        path: path.clone(),
    })
    .collect()
}

fn run(cli: Cli) -> Result<()> {
    let dumps = DumpPaths::in_dir(&cli.dump_dir, &cli.primary_wiki, &cli.second_wiki);

    let policy = match (cli.yes, cli.no_download) {
        (true, _) => DownloadPolicy::Always,
        (_, true) => DownloadPolicy::Never,
        _ => DownloadPolicy::Ask,
    };
    fetch::ensure_dumps(&remote_dumps(&cli, &dumps), policy, fetch::ask_user)?;

    info!(dir = %cli.dump_dir.display(), "All dumps present");

    let config = RunConfig {
        root_category: cli.category,
        dumps,
        output: cli.output,
        threshold: cli.threshold,
        max_iterations: cli.iterations,
        second_lang: cli.second_lang,
        quiet: cli.quiet,
    };

    let summary = interwiki::pipeline::run(&config)?;
    summary.print();
    println!();
    println!("Done, titles saved in file '{}'.", config.output.display());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
