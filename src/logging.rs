/*!
 * Logging setup for treedump
 *
 * Uses the `log` facade with an `env_logger` backend writing to stderr, so
 * the dump and reports on stdout stay clean. `RUST_LOG` takes precedence
 * over the command-line verbosity flags.
 */

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from the `-v` count and `-q` flag.
///
/// Must be called at most once per process.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        if verbose >= 1 {
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} [{}] {}",
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{level_style}{:<5}{level_style:#} {}", level, record.args())
        }
    });

    builder.init();
    log::debug!("Logging initialized at level: {:?}", log::max_level());
}

/// Map the verbosity flags to a level filter
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
