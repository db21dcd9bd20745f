/*!
 * Core types and data structures for the treedump application
 */

use std::fmt;
use std::fs;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::path::DumpPath;

/// The four independent file type flags recorded for every entry
///
/// Rendered as `D?F?S?O?` where `?` is `+` for a set flag and `-` otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeFlags {
    /// Entry is a directory
    pub directory: bool,
    /// Entry is a regular file
    pub file: bool,
    /// Entry is a symbolic link
    pub symlink: bool,
    /// Entry is something else (device, socket, fifo)
    pub other: bool,
}

impl TypeFlags {
    /// Flags for a plain directory
    pub const DIRECTORY: TypeFlags = TypeFlags {
        directory: true,
        file: false,
        symlink: false,
        other: false,
    };

    /// Flags for a plain regular file
    pub const FILE: TypeFlags = TypeFlags {
        directory: false,
        file: true,
        symlink: false,
        other: false,
    };

    /// Flags for a symbolic link that is not followed
    pub const SYMLINK: TypeFlags = TypeFlags {
        directory: false,
        file: false,
        symlink: true,
        other: false,
    };

    /// Derive flags from a file type as reported without following links
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        let directory = file_type.is_dir();
        let file = file_type.is_file();
        let symlink = file_type.is_symlink();
        Self {
            directory,
            file,
            symlink,
            other: !directory && !file && !symlink,
        }
    }
}

impl fmt::Display for TypeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = |flag: bool| if flag { '+' } else { '-' };
        write!(
            f,
            "D{}F{}S{}O{}",
            sign(self.directory),
            sign(self.file),
            sign(self.symlink),
            sign(self.other)
        )
    }
}

impl FromStr for TypeFlags {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 8 {
            return Err(format!("type flags must be 8 characters, got {:?}", s));
        }

        let mut flags = [false; 4];
        for (i, letter) in ['D', 'F', 'S', 'O'].iter().enumerate() {
            if chars[i * 2] != *letter {
                return Err(format!("expected '{}' at position {} in {:?}", letter, i * 2, s));
            }
            flags[i] = match chars[i * 2 + 1] {
                '+' => true,
                '-' => false,
                c => return Err(format!("invalid flag marker '{}' in {:?}", c, s)),
            };
        }

        Ok(Self {
            directory: flags[0],
            file: flags[1],
            symlink: flags[2],
            other: flags[3],
        })
    }
}

/// Raw attributes of a visited filesystem node
#[derive(Debug, Clone)]
pub struct Attributes {
    /// File type flags
    pub type_flags: TypeFlags,
    /// Size in bytes as reported by the filesystem
    pub size: u64,
    /// Creation (birth) time
    pub created: SystemTime,
    /// Last modification time
    pub modified: SystemTime,
    /// Last access time
    pub accessed: SystemTime,
}

impl Attributes {
    /// Collect attributes from metadata obtained without following links
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(UNIX_EPOCH);
        Self {
            type_flags: TypeFlags::from_file_type(metadata.file_type()),
            size: metadata.len(),
            // Not every filesystem records a birth time
            created: metadata.created().unwrap_or(modified),
            modified,
            accessed: metadata.accessed().unwrap_or(modified),
        }
    }
}

/// One visited filesystem node, as written to or read from a dump line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Position in traversal order; the header line is 0
    pub sequence: u64,
    /// Number of path segments between the traversal root and this entry
    pub depth: usize,
    /// Base name of the entry
    pub name: String,
    /// File type flags
    pub type_flags: TypeFlags,
    /// Size in bytes, 0 for directories
    pub size: u64,
    /// Formatted creation time
    pub created: String,
    /// Formatted modification time
    pub modified: String,
    /// Formatted access time
    pub accessed: String,
    /// Full path, when known
    pub path: Option<DumpPath>,
}

impl Entry {
    /// Whether the entry is flagged as a directory
    pub fn is_dir(&self) -> bool {
        self.type_flags.directory
    }

    /// Whether the entry is flagged as a regular file
    pub fn is_file(&self) -> bool {
        self.type_flags.file
    }

    /// Text of the entry's immediate parent directory, if it has one
    pub fn parent_text(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|path| path.parent())
            .map(|parent| parent.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_flags_display() {
        assert_eq!(TypeFlags::DIRECTORY.to_string(), "D+F-S-O-");
        assert_eq!(TypeFlags::FILE.to_string(), "D-F+S-O-");
        assert_eq!(TypeFlags::SYMLINK.to_string(), "D-F-S+O-");
        let all = TypeFlags {
            directory: true,
            file: true,
            symlink: true,
            other: true,
        };
        assert_eq!(all.to_string(), "D+F+S+O+");
    }

    #[test]
    fn test_type_flags_parse() {
        assert_eq!("D+F-S-O-".parse::<TypeFlags>(), Ok(TypeFlags::DIRECTORY));
        assert_eq!("D-F+S-O-".parse::<TypeFlags>(), Ok(TypeFlags::FILE));
        assert!("D+F-S-".parse::<TypeFlags>().is_err());
        assert!("X+F-S-O-".parse::<TypeFlags>().is_err());
        assert!("D*F-S-O-".parse::<TypeFlags>().is_err());
    }

    #[test]
    fn test_type_flags_from_real_file_types() -> std::io::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let file_path = temp_dir.path().join("plain.txt");
        fs::write(&file_path, b"abc")?;

        let dir_flags = TypeFlags::from_file_type(fs::symlink_metadata(temp_dir.path())?.file_type());
        let file_flags = TypeFlags::from_file_type(fs::symlink_metadata(&file_path)?.file_type());
        assert_eq!(dir_flags, TypeFlags::DIRECTORY);
        assert_eq!(file_flags, TypeFlags::FILE);

        #[cfg(unix)]
        {
            let link_path = temp_dir.path().join("link.txt");
            std::os::unix::fs::symlink(&file_path, &link_path)?;
            let link_flags = TypeFlags::from_file_type(fs::symlink_metadata(&link_path)?.file_type());
            assert_eq!(link_flags, TypeFlags::SYMLINK);
        }

        Ok(())
    }
}
