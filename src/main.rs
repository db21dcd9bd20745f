/*!
 * Command-line interface for treedump
 */

use std::fs;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use treedump::config::{Cli, Command, FindInTreeArgs, MakeTreeArgs, ParseTreeArgs};
use treedump::logging::init_logging;
use treedump::{
    find_directories, DuplicateAnalyzer, DuplicateKey, DumpReader, FindConfig, OutputFormat,
    ParseConfig, Reporter, ScanConfig, Scanner, TreeDumpError,
};

fn main() -> io::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    if let Some(shell) = cli.generate {
        clap_complete::generate(shell, &mut Cli::command(), "treedump", &mut io::stdout());
        return Ok(());
    }

    match cli.command {
        Some(Command::MakeTree(args)) => make_tree(&args, cli.quiet)?,
        Some(Command::ParseTree(args)) => parse_tree(&args)?,
        Some(Command::FindInTree(args)) => find_in_tree(&args)?,
        None => {
            return Err(TreeDumpError::InvalidArgument("no operation given".to_string()).into())
        }
    }

    Ok(())
}

fn make_tree(args: &MakeTreeArgs, quiet: bool) -> treedump::Result<()> {
    let config = ScanConfig::from_args(args)?;
    config.validate()?;

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix:.bold.cyan} {pos} entries {wide_msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress.set_prefix("Scanning");
        progress.enable_steady_tick(Duration::from_millis(100));
        progress
    };

    let start_time = Instant::now();
    let dump = Scanner::new(config, progress)?.scan()?;
    log::info!("Scan finished in {:.4?}", start_time.elapsed());

    let mut stdout = io::stdout().lock();
    match &args.output {
        Some(path) => {
            fs::write(path, &dump.text)?;
            log::info!("Dump written to {}", path.display());
        }
        None => writeln!(stdout, "{}", dump.text)?,
    }

    let reporter = Reporter::new(args.format);
    if args.duplicates {
        let counts = DuplicateAnalyzer::new(DuplicateKey::NameSize).parent_counts(&dump.files);
        let report = reporter.parent_counts(&counts)?;
        // a JSON report must not share stdout with the dump text
        if args.format == OutputFormat::Json && args.output.is_none() {
            eprintln!("{}", report);
        } else {
            writeln!(stdout, "{}", report)?;
        }
    }

    if !dump.failures.is_empty() {
        eprintln!("{}", reporter.failures(&dump.failures)?);
    }

    Ok(())
}

fn parse_tree(args: &ParseTreeArgs) -> treedump::Result<()> {
    let config = ParseConfig::from_args(args)?;
    config.validate()?;

    let dump = DumpReader::from_config(&config).read_file(&config.dump_path)?;
    let sets = DuplicateAnalyzer::new(config.key).parent_set_counts(&dump.entries);
    log::info!("Found {} distinct parent sets", sets.len());

    let report = Reporter::new(args.format).parent_sets(&sets)?;
    writeln!(io::stdout().lock(), "{}", report)?;
    Ok(())
}

fn find_in_tree(args: &FindInTreeArgs) -> treedump::Result<()> {
    let config = FindConfig::from_args(args)?;
    config.validate()?;

    let dump = DumpReader::from_config(&config.parse).read_file(&config.parse.dump_path)?;
    let mut stdout = io::stdout().lock();
    for path in find_directories(&dump.entries, &config.dir_names) {
        writeln!(stdout, "{}", path)?;
    }
    Ok(())
}
