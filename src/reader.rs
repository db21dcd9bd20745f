/*!
 * Reading tree dumps back into entries
 */

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::codec::{DumpHeader, LineCodec};
use crate::config::ParseConfig;
use crate::error::Result;
use crate::path::{infer_separator, DumpPath};
use crate::types::Entry;

/// A decoded dump
#[derive(Debug, Clone, Default)]
pub struct Dump {
    /// Header, when the first line is one
    pub header: Option<DumpHeader>,
    /// Entries in file order
    pub entries: Vec<Entry>,
}

/// Reads dump text produced by the scanner
pub struct DumpReader {
    codec: LineCodec,
    separator: Option<char>,
}

impl DumpReader {
    /// Create a reader
    pub fn new(codec: LineCodec) -> Self {
        Self {
            codec,
            separator: None,
        }
    }

    /// Create a reader from parse configuration
    pub fn from_config(config: &ParseConfig) -> Self {
        let codec = LineCodec::new(config.indent.clone(), config.full_path)
            .with_separator(config.separator);
        Self {
            codec,
            separator: config.separator,
        }
    }

    /// Read and decode a dump file
    pub fn read_file(&self, path: &Path) -> Result<Dump> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }
        log::debug!("Read {} lines from {}", lines.len(), path.display());
        self.parse_lines(lines.iter().map(String::as_str))
    }

    /// Decode dump text
    pub fn parse_str(&self, text: &str) -> Result<Dump> {
        self.parse_lines(text.lines())
    }

    /// Decode dump lines; the first line is always treated as the header
    pub fn parse_lines<'a, I>(&self, lines: I) -> Result<Dump>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = lines.into_iter();
        let header = match lines.next() {
            Some(first) => DumpHeader::parse(first),
            None => return Ok(Dump::default()),
        };
        if header.is_none() {
            log::warn!("First line is not a dump header, skipping it anyway");
        }

        let mut entries = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            entries.push(self.codec.decode_line(line)?);
        }

        if !self.codec.full_path() {
            self.rebuild_paths(header.as_ref(), &mut entries)?;
        }

        log::info!("Decoded {} entries", entries.len());
        Ok(Dump { header, entries })
    }

    /// Give basename entries their full paths using the decoded depths
    fn rebuild_paths(&self, header: Option<&DumpHeader>, entries: &mut [Entry]) -> Result<()> {
        let root = header
            .map(|h| h.root.as_str())
            .filter(|root| !root.is_empty());
        let separator = self
            .separator
            .unwrap_or_else(|| root.map(root_separator).unwrap_or('/'));
        let root = root.map(|text| DumpPath::parse_with(text, separator)).transpose()?;

        // ancestors[i] is the directory holding entries at depth i + 1
        let mut ancestors: Vec<Option<DumpPath>> = vec![root];
        for entry in entries.iter_mut() {
            ancestors.truncate(entry.depth.max(1));
            let path = match ancestors.last().cloned().flatten() {
                Some(parent) => parent.join(&entry.name)?,
                None => DumpPath::parse_with(&entry.name, separator)?,
            };
            if entry.is_dir() {
                ancestors.push(Some(path.clone()));
            }
            entry.path = Some(path);
        }
        Ok(())
    }
}

/// Separator a header root was written with
///
/// A root starting with `/` comes from a Unix walk, where `\` is an ordinary
/// name character, so only other roots are inferred from their text.
fn root_separator(root: &str) -> char {
    if root.starts_with('/') {
        '/'
    } else {
        infer_separator(root)
    }
}
