/*!
 * Configuration handling for treedump
 */

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::error::{Result, TreeDumpError};
use crate::{bail, ensure};

/// Which identity is used to bucket re-parsed entries into duplicate groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicateKey {
    /// Name and size over every non-directory entry
    NameSize,
    /// Name, size and type flags over regular files only
    NameSizeType,
}

impl Default for DuplicateKey {
    fn default() -> Self {
        Self::NameSizeType
    }
}

/// Output format for duplicate reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, one record per line
    Plain,
    /// Console table
    Table,
    /// JSON document
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Plain
    }
}

/// Command-line arguments for treedump
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "treedump",
    version = env!("CARGO_PKG_VERSION"),
    about = "Dump a directory tree to text and analyze dumps for duplicates",
    long_about = "Serializes a directory tree into a line-oriented text dump that can later be re-parsed to find duplicate files or locate directories, without walking the filesystem again.",
    arg_required_else_help = true
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Option<Command>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[clap(short, long, global = true)]
    pub quiet: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// The three operations
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Walk a directory and print its tree dump
    #[clap(name = "maketree")]
    MakeTree(MakeTreeArgs),
    /// Re-parse a dump and report duplicate files by parent directories
    #[clap(name = "parsetree")]
    ParseTree(ParseTreeArgs),
    /// Re-parse a dump and list the full paths of directories with given names
    #[clap(name = "findintree")]
    FindInTree(FindInTreeArgs),
}

/// Indentation options shared by every operation
#[derive(ClapArgs, Debug, Clone)]
pub struct IndentArgs {
    /// Symbol repeated after each indentation bar
    #[clap(long, default_value = "_")]
    pub indent_symbol: String,

    /// Number of spaces and symbols in one indentation block
    #[clap(long, default_value = "2")]
    pub indent_size: usize,
}

/// Arguments for `maketree`
#[derive(ClapArgs, Debug, Clone)]
pub struct MakeTreeArgs {
    /// Directory to walk
    pub root_path: PathBuf,

    /// Comma-separated directory names whose contents are skipped
    #[clap(default_value = "")]
    pub excluded_dir_names: String,

    /// Time zone for timestamps: local, UTC or a fixed offset such as +03:00
    #[clap(default_value = "local")]
    pub timezone: String,

    /// Record complete paths instead of base names
    #[clap(long)]
    pub full_path: bool,

    /// Also report duplicate files right after the walk
    #[clap(long)]
    pub duplicates: bool,

    /// Visit directory entries sorted by file name
    #[clap(long)]
    pub sorted: bool,

    /// Write the dump to this file instead of stdout
    #[clap(long, short)]
    pub output: Option<PathBuf>,

    /// Format of the duplicate report
    #[clap(long, value_enum, default_value_t = OutputFormat::default())]
    pub format: OutputFormat,

    #[clap(flatten)]
    pub indent: IndentArgs,
}

/// Arguments for `parsetree`
#[derive(ClapArgs, Debug, Clone)]
pub struct ParseTreeArgs {
    /// Dump file to read
    pub dump_path: PathBuf,

    /// The dump was produced with --full-path
    #[clap(long)]
    pub full_path: bool,

    /// Path separator used in the dump (inferred when omitted)
    #[clap(long)]
    pub separator: Option<char>,

    /// Identity used to group duplicates
    #[clap(long, value_enum, default_value_t = DuplicateKey::default())]
    pub key: DuplicateKey,

    /// Format of the duplicate report
    #[clap(long, value_enum, default_value_t = OutputFormat::default())]
    pub format: OutputFormat,

    #[clap(flatten)]
    pub indent: IndentArgs,
}

/// Arguments for `findintree`
#[derive(ClapArgs, Debug, Clone)]
pub struct FindInTreeArgs {
    /// Dump file to read
    pub dump_path: PathBuf,

    /// Comma-separated directory names to look for
    #[clap(value_delimiter = ',', required = true)]
    pub dir_names: Vec<String>,

    /// The dump was produced with --full-path
    #[clap(long)]
    pub full_path: bool,

    /// Path separator used in the dump (inferred when omitted)
    #[clap(long)]
    pub separator: Option<char>,

    #[clap(flatten)]
    pub indent: IndentArgs,
}

/// Time zone used to render timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZone {
    /// The system's local zone
    Local,
    /// A fixed offset from UTC
    Fixed(FixedOffset),
}

impl TimeZone {
    /// UTC as a fixed zero offset
    pub fn utc() -> Self {
        Self::Fixed(Utc.fix())
    }
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::Local
    }
}

impl FromStr for TimeZone {
    type Err = TreeDumpError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(Self::utc());
        }

        let (sign, digits) = match trimmed.chars().next() {
            Some('+') => (1, &trimmed[1..]),
            Some('-') => (-1, &trimmed[1..]),
            _ => bail!(InvalidArgument, "unknown time zone {:?}", s),
        };

        let (hours, minutes) = match digits.split_once(':') {
            Some((h, m)) => (h, m),
            None if digits.len() == 4 && digits.is_ascii() => digits.split_at(2),
            None => (digits, "0"),
        };
        let parse = |part: &str| -> Result<i32> {
            ensure!(
                !part.is_empty() && part.len() <= 2 && part.chars().all(|c| c.is_ascii_digit()),
                InvalidArgument,
                "invalid time zone offset {:?}",
                s
            );
            part.parse::<i32>()
                .map_err(|_| TreeDumpError::InvalidArgument(format!("invalid time zone offset {:?}", s)))
        };
        let (hours, minutes) = (parse(hours)?, parse(minutes)?);
        ensure!(minutes < 60, InvalidArgument, "invalid time zone offset {:?}", s);

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Self::Fixed)
            .ok_or_else(|| TreeDumpError::InvalidArgument(format!("time zone offset out of range: {:?}", s)))
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// How nesting depth is rendered in front of entry names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentStyle {
    /// Symbol repeated `size` times after the bar
    pub symbol: String,
    /// Width of one block
    pub size: usize,
}

impl Default for IndentStyle {
    fn default() -> Self {
        Self {
            symbol: "_".to_string(),
            size: 2,
        }
    }
}

impl IndentStyle {
    /// Create and validate an indent style
    pub fn new(symbol: impl Into<String>, size: usize) -> Result<Self> {
        let style = Self {
            symbol: symbol.into(),
            size,
        };
        style.validate()?;
        Ok(style)
    }

    /// The symbol run that closes every block, e.g. `__`
    pub fn unit(&self) -> String {
        self.symbol.repeat(self.size)
    }

    /// One full indentation block, e.g. `  |__`
    pub fn block(&self) -> String {
        format!("{}|{}", " ".repeat(self.size), self.unit())
    }

    /// Validate the style
    pub fn validate(&self) -> Result<()> {
        ensure!(self.size >= 1, Config, "indent size must be at least 1");
        ensure!(!self.symbol.is_empty(), Config, "indent symbol must not be empty");
        ensure!(
            !self.symbol.contains([' ', '|', '\\']),
            Config,
            "indent symbol {:?} must not contain a space, '|' or '\\'",
            self.symbol
        );
        // `\n` and `\r` are escape codes in the name field
        ensure!(
            !self.symbol.contains(['n', 'r']),
            Config,
            "indent symbol {:?} must not contain 'n' or 'r'",
            self.symbol
        );
        Ok(())
    }
}

impl TryFrom<&IndentArgs> for IndentStyle {
    type Error = TreeDumpError;

    fn try_from(args: &IndentArgs) -> Result<Self> {
        IndentStyle::new(args.indent_symbol.clone(), args.indent_size)
    }
}

/// Configuration for one traversal
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Directory to walk
    pub root_path: PathBuf,
    /// Directory names whose contents are skipped
    pub excluded_dir_names: BTreeSet<String>,
    /// Zone used for timestamps
    pub timezone: TimeZone,
    /// Record complete paths instead of base names
    pub full_path: bool,
    /// Visit entries sorted by name
    pub sorted: bool,
    /// Indentation style
    pub indent: IndentStyle,
}

impl ScanConfig {
    /// Configuration with defaults for everything but the root
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            excluded_dir_names: BTreeSet::new(),
            timezone: TimeZone::default(),
            full_path: false,
            sorted: false,
            indent: IndentStyle::default(),
        }
    }

    /// Create configuration from command-line arguments
    pub fn from_args(args: &MakeTreeArgs) -> Result<Self> {
        Ok(Self {
            root_path: args.root_path.clone(),
            excluded_dir_names: args
                .excluded_dir_names
                .split(',')
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            timezone: args.timezone.parse()?,
            full_path: args.full_path,
            sorted: args.sorted,
            indent: IndentStyle::try_from(&args.indent)?,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.indent.validate()?;
        if !self.root_path.is_dir() {
            bail!(
                InvalidRoot,
                "{} does not exist or is not a directory",
                self.root_path.display()
            );
        }
        // the header carries the root verbatim on a single line
        ensure!(
            !self.root_path.to_string_lossy().contains(['\n', '\r']),
            InvalidRoot,
            "{:?} contains a line break",
            self.root_path
        );
        Ok(())
    }
}

/// Configuration for reading a dump back
#[derive(Clone, Debug)]
pub struct ParseConfig {
    /// Dump file to read
    pub dump_path: PathBuf,
    /// Lines carry complete paths
    pub full_path: bool,
    /// Separator override
    pub separator: Option<char>,
    /// Indentation style used when the dump was written
    pub indent: IndentStyle,
    /// Duplicate grouping key
    pub key: DuplicateKey,
}

impl ParseConfig {
    /// Create configuration from command-line arguments
    pub fn from_args(args: &ParseTreeArgs) -> Result<Self> {
        Ok(Self {
            dump_path: args.dump_path.clone(),
            full_path: args.full_path,
            separator: args.separator,
            indent: IndentStyle::try_from(&args.indent)?,
            key: args.key,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.indent.validate()?;
        ensure!(
            self.dump_path.is_file(),
            InvalidArgument,
            "dump file not found: {}",
            self.dump_path.display()
        );
        Ok(())
    }
}

/// Configuration for the directory finder
#[derive(Clone, Debug)]
pub struct FindConfig {
    /// How to read the dump
    pub parse: ParseConfig,
    /// Directory names to look for
    pub dir_names: HashSet<String>,
}

impl FindConfig {
    /// Create configuration from command-line arguments
    pub fn from_args(args: &FindInTreeArgs) -> Result<Self> {
        Ok(Self {
            parse: ParseConfig {
                dump_path: args.dump_path.clone(),
                full_path: args.full_path,
                separator: args.separator,
                indent: IndentStyle::try_from(&args.indent)?,
                key: DuplicateKey::default(),
            },
            dir_names: args
                .dir_names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.parse.validate()?;
        ensure!(
            !self.dir_names.is_empty(),
            InvalidArgument,
            "at least one directory name is required"
        );
        Ok(())
    }
}
