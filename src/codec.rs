/*!
 * Line codec for tree dumps
 *
 * Every visited node becomes one line:
 *
 * ```text
 *         3| __sub| /T@D-F+S-O-/S@42/C@...Z/M@...Z/A@...Z
 * ```
 *
 * The sequence number is right-aligned to 9 columns. Entries deeper than the
 * root's direct children are prefixed with `depth - 1` indentation blocks
 * (`{size spaces}|{symbol × size}`). The name field runs to the first
 * unescaped `|`; inside it `\`, `|`, newlines and a leading space or indent
 * symbol are backslash-escaped so any name survives a round trip. Five
 * `/`-separated tagged fields follow: type flags, size and three timestamps.
 *
 * Line 0 is a header naming the excluded directories and the traversal root.
 */

use std::collections::BTreeSet;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::IndentStyle;
use crate::error::{Result, TreeDumpError};
use crate::path::{infer_separator, DumpPath};
use crate::types::{Entry, TypeFlags};
use crate::utils::{format_name_list, parse_name_list};

const TYPE_TAG: &str = "T@";
const SIZE_TAG: &str = "S@";
const CREATED_TAG: &str = "C@";
const MODIFIED_TAG: &str = "M@";
const ACCESSED_TAG: &str = "A@";
const TAGGED_FIELD_COUNT: usize = 5;

static HEADER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\| Tree excluding: (\[.*?\]), root directory: (.*)$").unwrap()
});

/// Metadata carried by the header line of a dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpHeader {
    /// Directory names whose contents were skipped
    pub excluded_dir_names: BTreeSet<String>,
    /// Traversal root as written at encode time
    pub root: String,
}

impl DumpHeader {
    /// Create a header
    pub fn new(excluded_dir_names: BTreeSet<String>, root: impl Into<String>) -> Self {
        Self {
            excluded_dir_names,
            root: root.into(),
        }
    }

    /// Parse a header line, returning `None` when the line is not a header
    pub fn parse(line: &str) -> Option<Self> {
        HEADER_REGEX.captures(line).map(|caps| Self {
            excluded_dir_names: parse_name_list(&caps[1]),
            root: caps[2].to_string(),
        })
    }
}

/// Encodes entries to dump lines and decodes them back
#[derive(Debug, Clone)]
pub struct LineCodec {
    indent: IndentStyle,
    full_path: bool,
    separator: Option<char>,
}

impl LineCodec {
    /// Create a codec for basename or full-path dumps
    pub fn new(indent: IndentStyle, full_path: bool) -> Self {
        Self {
            indent,
            full_path,
            separator: None,
        }
    }

    /// Use a fixed separator when parsing full paths instead of inferring it
    pub fn with_separator(mut self, separator: Option<char>) -> Self {
        self.separator = separator;
        self
    }

    /// Whether lines carry complete paths
    pub fn full_path(&self) -> bool {
        self.full_path
    }

    /// Encode the header line, always sequence 0
    pub fn encode_header(&self, header: &DumpHeader) -> String {
        format!(
            "{:>9}| Tree excluding: {}, root directory: {}",
            0,
            format_name_list(&header.excluded_dir_names),
            header.root
        )
    }

    /// Encode one entry as a dump line
    pub fn encode_line(&self, entry: &Entry) -> String {
        let mut line = format!("{:>9}| ", entry.sequence);

        if entry.depth > 1 {
            line.push_str(&self.indent.block().repeat(entry.depth - 1));
        }

        let name = match (&entry.path, self.full_path) {
            (Some(path), true) => path.as_str(),
            _ => entry.name.as_str(),
        };
        line.push_str(&escape_name(name, &self.indent));

        // Writing into a String cannot fail
        let _ = write!(
            line,
            "| /{}{}/{}{}/{}{}/{}{}/{}{}",
            TYPE_TAG,
            entry.type_flags,
            SIZE_TAG,
            entry.size,
            CREATED_TAG,
            entry.created,
            MODIFIED_TAG,
            entry.modified,
            ACCESSED_TAG,
            entry.accessed
        );
        line
    }

    /// Decode one dump line back into an entry
    pub fn decode_line(&self, line: &str) -> Result<Entry> {
        let (sequence_text, rest) = line
            .split_once("| ")
            .ok_or_else(|| TreeDumpError::malformed("missing sequence delimiter", line))?;
        let sequence = sequence_text
            .trim()
            .parse::<u64>()
            .map_err(|_| TreeDumpError::malformed("sequence number is not numeric", line))?;

        let (depth, rest) = self.strip_indent(rest);
        let (field, rest) = split_name_field(rest)
            .ok_or_else(|| TreeDumpError::malformed("unterminated name field", line))?;
        if field.is_empty() {
            return Err(TreeDumpError::malformed("empty name field", line));
        }

        let tagged = rest
            .trim_start()
            .strip_prefix('/')
            .ok_or_else(|| TreeDumpError::malformed("missing tagged fields", line))?;
        let fields: Vec<&str> = tagged.split('/').collect();
        if fields.len() != TAGGED_FIELD_COUNT {
            return Err(TreeDumpError::malformed(
                format!(
                    "expected {} tagged fields, found {}",
                    TAGGED_FIELD_COUNT,
                    fields.len()
                ),
                line,
            ));
        }

        let type_flags = tag_value(fields[0], TYPE_TAG, line)?
            .parse::<TypeFlags>()
            .map_err(|reason| TreeDumpError::malformed(reason, line))?;
        let size = tag_value(fields[1], SIZE_TAG, line)?
            .parse::<u64>()
            .map_err(|_| TreeDumpError::malformed("size is not numeric", line))?;
        let created = tag_value(fields[2], CREATED_TAG, line)?.to_string();
        let modified = tag_value(fields[3], MODIFIED_TAG, line)?.to_string();
        let accessed = tag_value(fields[4], ACCESSED_TAG, line)?.to_string();

        let (name, path) = if self.full_path {
            let separator = self.separator.unwrap_or_else(|| infer_separator(&field));
            let path = DumpPath::parse_with(&field, separator)?;
            let name = path.file_name().unwrap_or(field.as_str()).to_string();
            (name, Some(path))
        } else {
            (field, None)
        };

        Ok(Entry {
            sequence,
            depth,
            name,
            type_flags,
            size,
            created,
            modified,
            accessed,
            path,
        })
    }

    /// Strip any run of indentation blocks, returning the depth they encode
    ///
    /// A block is optional spaces, an optional `|` and the symbol run, so both
    /// `  |__` and the compact `__` count as one level.
    fn strip_indent<'a>(&self, mut text: &'a str) -> (usize, &'a str) {
        let unit = self.indent.unit();
        let mut depth = 1;
        loop {
            let after_spaces = text.trim_start_matches(' ');
            let after_bar = after_spaces.strip_prefix('|').unwrap_or(after_spaces);
            match after_bar.strip_prefix(unit.as_str()) {
                Some(rest) => {
                    text = rest;
                    depth += 1;
                }
                None => break,
            }
        }
        (depth, text)
    }
}

/// Value of a tagged field, e.g. `42` for `S@42`
fn tag_value<'a>(field: &'a str, tag: &str, line: &str) -> Result<&'a str> {
    field
        .trim()
        .strip_prefix(tag)
        .ok_or_else(|| TreeDumpError::malformed(format!("expected field tagged {}", tag), line))
}

/// Escape a name so it cannot be confused with the line structure
fn escape_name(name: &str, indent: &IndentStyle) -> String {
    let mut escaped = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '|' => escaped.push_str("\\|"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            // would otherwise read as indentation
            c if i == 0 && (c == ' ' || indent.symbol.starts_with(c)) => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}

/// Read the escaped name up to the first unescaped `|`
///
/// Returns the unescaped name and the text after the bar.
fn split_name_field(text: &str) -> Option<(String, &str)> {
    let mut name = String::new();
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => name.push('\n'),
                Some((_, 'r')) => name.push('\r'),
                Some((_, escaped)) => name.push(escaped),
                None => name.push('\\'),
            },
            '|' => return Some((name, &text[i + 1..])),
            c => name.push(c),
        }
    }
    None
}
