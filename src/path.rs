/*!
 * Lightweight path model for paths recovered from a dump
 *
 * A `DumpPath` is identified by its exact text. Nothing is normalized: `.`,
 * `..`, repeated or trailing separators all stay as written. The parent is
 * parsed on first access and cached, so a deep path does not build its whole
 * ancestor chain up front.
 */

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::MAIN_SEPARATOR;

use once_cell::sync::{Lazy, OnceCell};

use crate::error::{Result, TreeDumpError};

const DRIVE_MARKER: char = ':';

/// Path representing "no parent", the root separator on its own
pub static EMPTY: Lazy<DumpPath> = Lazy::new(|| DumpPath::root(MAIN_SEPARATOR));

/// A path parsed from dump text
#[derive(Clone)]
pub struct DumpPath {
    separator: char,
    raw: String,
    file_name: Option<String>,
    parent_text: Option<String>,
    parent: OnceCell<Option<Box<DumpPath>>>,
}

impl DumpPath {
    /// Parse `text`, inferring the separator: `\` if present, otherwise `/`
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, infer_separator(text))
    }

    /// Parse `text` using an explicit separator
    pub fn parse_with(text: &str, separator: char) -> Result<Self> {
        if text.is_empty() {
            return Err(TreeDumpError::InvalidPath(text.to_string()));
        }

        let segments: Vec<&str> = text.split(separator).collect();
        let (parent_text, file_name) = match segments.as_slice() {
            [] => return Err(TreeDumpError::InvalidPath(text.to_string())),
            // Bare drive root such as `C:`
            [single] if single.ends_with(DRIVE_MARKER) => (None, None),
            [single] => (None, Some(*single)),
            [drive, name] if drive.ends_with(DRIVE_MARKER) => (None, Some(*name)),
            [first, name] => ((!first.is_empty()).then_some(*first), Some(*name)),
            [.., name] => {
                let cut = text.len() - name.len() - separator.len_utf8();
                (Some(&text[..cut]), Some(*name))
            }
        };

        Ok(Self {
            separator,
            raw: text.to_string(),
            file_name: file_name.filter(|n| !n.is_empty()).map(str::to_string),
            parent_text: parent_text.map(str::to_string),
            parent: OnceCell::new(),
        })
    }

    /// The root path for a separator, which has neither parent nor file name
    pub fn root(separator: char) -> Self {
        Self {
            separator,
            raw: separator.to_string(),
            file_name: None,
            parent_text: None,
            parent: OnceCell::with_value(None),
        }
    }

    /// The separator this path was split on
    pub fn separator(&self) -> char {
        self.separator
    }

    /// The original text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Last segment, absent for roots and paths ending in a separator
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Parent path, parsed on first access
    pub fn parent(&self) -> Option<&DumpPath> {
        self.parent
            .get_or_init(|| {
                self.parent_text
                    .as_deref()
                    .and_then(|text| DumpPath::parse_with(text, self.separator).ok())
                    .map(Box::new)
            })
            .as_deref()
    }

    /// Append a segment using this path's separator
    pub fn join(&self, name: &str) -> Result<DumpPath> {
        let text = if self.raw.ends_with(self.separator) {
            format!("{}{}", self.raw, name)
        } else {
            format!("{}{}{}", self.raw, self.separator, name)
        };
        DumpPath::parse_with(&text, self.separator)
    }
}

/// `\` if the text contains one, otherwise `/`
pub fn infer_separator(text: &str) -> char {
    if text.contains('\\') {
        '\\'
    } else {
        '/'
    }
}

impl PartialEq for DumpPath {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for DumpPath {}

impl Hash for DumpPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for DumpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl fmt::Debug for DumpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DumpPath").field(&self.raw).finish()
    }
}
