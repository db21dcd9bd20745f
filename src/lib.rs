/*!
 * treedump - Reversible text dumps of directory trees
 *
 * This library walks a directory tree into a flat, line-oriented dump that
 * records each entry's depth, type flags, size and timestamps, and reads such
 * dumps back to find duplicate files or locate directories without touching
 * the filesystem again.
 */

pub mod codec;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod finder;
pub mod logging;
pub mod path;
pub mod reader;
pub mod report;
pub mod scanner;
pub mod types;
pub mod utils;


// Re-export main components for easier access
pub use codec::{DumpHeader, LineCodec};
pub use config::{DuplicateKey, FindConfig, IndentStyle, OutputFormat, ParseConfig, ScanConfig, TimeZone};
pub use duplicates::{DuplicateAnalyzer, ParentCount, ParentSetCount};
pub use error::{Result, TreeDumpError};
pub use finder::find_directories;
pub use path::DumpPath;
pub use reader::{Dump, DumpReader};
pub use report::Reporter;
pub use scanner::{walk_tree, Scanner, TreeDump, TreeVisitor, Visit, VisitControl};
pub use types::{Attributes, Entry, TypeFlags};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
