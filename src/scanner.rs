/*!
 * Directory traversal and tree dump serialization
 */

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use indicatif::ProgressBar;
use walkdir::WalkDir;

use crate::codec::{DumpHeader, LineCodec};
use crate::config::ScanConfig;
use crate::error::{Result, TreeDumpError};
use crate::path::DumpPath;
use crate::types::{Attributes, Entry};
use crate::utils::format_timestamp;

/// What the walker should do after a directory has been pre-visited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitControl {
    /// Descend into the directory
    Continue,
    /// Do not visit anything below the directory
    SkipSubtree,
}

/// A node handed to a visitor
#[derive(Debug, Clone)]
pub struct Visit<'a> {
    /// Path of the node
    pub path: &'a Path,
    /// Segments between the traversal root and this node, 0 for the root
    pub depth: usize,
    /// Attributes read without following links
    pub attrs: Attributes,
}

/// Receives traversal events in pre-order
pub trait TreeVisitor {
    /// Called before a directory's contents are visited
    fn pre_visit_directory(&mut self, dir: &Visit<'_>) -> VisitControl;

    /// Called for every non-directory node
    fn visit_file(&mut self, file: &Visit<'_>);

    /// Called once all of a directory's contents have been visited
    fn post_visit_directory(&mut self, _dir: &Path) {}

    /// Called when a node or a directory listing could not be read
    fn visit_failed(&mut self, path: &Path, error: &io::Error);
}

/// Walk `root` depth-first, feeding every node to `visitor`
///
/// Symbolic links are reported as files and never followed.
pub fn walk_tree<V: TreeVisitor>(root: &Path, sorted: bool, visitor: &mut V) {
    let mut walker = WalkDir::new(root).follow_links(false);
    if sorted {
        walker = walker.sort_by_file_name();
    }

    let mut open_dirs: Vec<(usize, PathBuf)> = Vec::new();
    let mut iter = walker.into_iter();

    while let Some(next) = iter.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                let io_err = io::Error::from(err);
                visitor.visit_failed(&path, &io_err);
                continue;
            }
        };

        close_dirs(&mut open_dirs, entry.depth(), visitor);

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                visitor.visit_failed(entry.path(), &io::Error::from(err));
                continue;
            }
        };

        let visit = Visit {
            path: entry.path(),
            depth: entry.depth(),
            attrs: Attributes::from_metadata(&metadata),
        };

        if entry.file_type().is_dir() {
            match visitor.pre_visit_directory(&visit) {
                VisitControl::Continue => open_dirs.push((entry.depth(), entry.path().to_path_buf())),
                VisitControl::SkipSubtree => {
                    iter.skip_current_dir();
                    visitor.post_visit_directory(entry.path());
                }
            }
        } else {
            visitor.visit_file(&visit);
        }
    }

    close_dirs(&mut open_dirs, 0, visitor);
}

/// Post-visit every open directory at or below `depth`
fn close_dirs<V: TreeVisitor>(open_dirs: &mut Vec<(usize, PathBuf)>, depth: usize, visitor: &mut V) {
    while let Some((open_depth, _)) = open_dirs.last() {
        if *open_depth < depth {
            break;
        }
        if let Some((_, dir)) = open_dirs.pop() {
            visitor.post_visit_directory(&dir);
        }
    }
}

/// Result of one traversal
#[derive(Debug, Clone, Default)]
pub struct TreeDump {
    /// The dump text, header first, no trailing newline
    pub text: String,
    /// Paths that could not be visited, with the reason
    pub failures: BTreeMap<String, String>,
    /// Every non-directory entry, for in-memory duplicate analysis
    pub files: Vec<Entry>,
}

/// Serializes one traversal into a tree dump
pub struct Scanner {
    /// Scanner configuration
    config: ScanConfig,
    /// Progress bar
    progress: ProgressBar,
    codec: LineCodec,
    lines: Vec<String>,
    counter: u64,
    failures: BTreeMap<String, String>,
    files: Vec<Entry>,
}

impl Scanner {
    /// Create a new scanner, rejecting a root that is not a directory
    pub fn new(config: ScanConfig, progress: ProgressBar) -> Result<Self> {
        config.validate()?;
        let codec = LineCodec::new(config.indent.clone(), config.full_path);
        Ok(Self {
            config,
            progress,
            codec,
            lines: Vec::new(),
            counter: 0,
            failures: BTreeMap::new(),
            files: Vec::new(),
        })
    }

    /// Walk the configured root and return the dump
    pub fn scan(mut self) -> Result<TreeDump> {
        let root = self.config.root_path.clone();
        log::info!("Scanning {}", root.display());

        walk_tree(&root, self.config.sorted, &mut self);

        if self.lines.is_empty() {
            return Err(TreeDumpError::InvalidRoot(format!(
                "{} could not be read",
                root.display()
            )));
        }

        self.progress.finish_and_clear();
        log::info!(
            "Visited {} entries ({} files, {} failures)",
            self.counter.saturating_sub(1),
            self.files.len(),
            self.failures.len()
        );

        Ok(self.into_dump())
    }

    /// Finish the traversal and hand over the accumulated buffers
    pub fn into_dump(self) -> TreeDump {
        TreeDump {
            text: self.lines.join("\n"),
            failures: self.failures,
            files: self.files,
        }
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.counter;
        self.counter += 1;
        sequence
    }

    fn record_header(&mut self, root: &Path) {
        let sequence = self.next_sequence();
        debug_assert_eq!(sequence, 0);
        let header = DumpHeader::new(
            self.config.excluded_dir_names.clone(),
            root.to_string_lossy().to_string(),
        );
        self.lines.push(self.codec.encode_header(&header));
    }

    fn record_entry(&mut self, visit: &Visit<'_>) -> Entry {
        let zone = self.config.timezone;
        let name = visit
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| visit.path.to_string_lossy().to_string());
        let path = DumpPath::parse_with(&visit.path.to_string_lossy(), MAIN_SEPARATOR).ok();

        let entry = Entry {
            sequence: self.next_sequence(),
            depth: visit.depth,
            name,
            type_flags: visit.attrs.type_flags,
            size: if visit.attrs.type_flags.directory {
                0
            } else {
                visit.attrs.size
            },
            created: format_timestamp(visit.attrs.created, &zone),
            modified: format_timestamp(visit.attrs.modified, &zone),
            accessed: format_timestamp(visit.attrs.accessed, &zone),
            path,
        };

        log::trace!("{} {}", entry.sequence, visit.path.display());
        self.progress.inc(1);
        self.progress.set_message(entry.name.clone());
        self.lines.push(self.codec.encode_line(&entry));
        entry
    }
}

impl TreeVisitor for Scanner {
    fn pre_visit_directory(&mut self, dir: &Visit<'_>) -> VisitControl {
        if dir.depth == 0 {
            self.record_header(dir.path);
            return VisitControl::Continue;
        }

        self.record_entry(dir);

        let excluded = dir
            .path
            .file_name()
            .map(|name| self.config.excluded_dir_names.contains(name.to_string_lossy().as_ref()))
            .unwrap_or(false);
        if excluded {
            log::debug!("Skipping contents of excluded {}", dir.path.display());
            VisitControl::SkipSubtree
        } else {
            VisitControl::Continue
        }
    }

    fn visit_file(&mut self, file: &Visit<'_>) {
        let entry = self.record_entry(file);
        self.files.push(entry);
    }

    fn post_visit_directory(&mut self, dir: &Path) {
        log::trace!("Leaving {}", dir.display());
    }

    fn visit_failed(&mut self, path: &Path, error: &io::Error) {
        let path = path.to_string_lossy().to_string();
        let message = error.to_string();
        log::warn!(
            "{}",
            TreeDumpError::TraversalEntry {
                path: path.clone(),
                message: message.clone(),
            }
        );
        self.failures.insert(path, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeFlags;
    use std::time::UNIX_EPOCH;

    fn attrs(type_flags: TypeFlags, size: u64) -> Attributes {
        Attributes {
            type_flags,
            size,
            created: UNIX_EPOCH,
            modified: UNIX_EPOCH,
            accessed: UNIX_EPOCH,
        }
    }

    fn scanner(root: &Path) -> Result<Scanner> {
        let mut config = ScanConfig::new(root);
        config.timezone = crate::config::TimeZone::utc();
        config.excluded_dir_names.insert("node_modules".to_string());
        Scanner::new(config, ProgressBar::hidden())
    }

    #[test]
    fn test_synthetic_events() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let root = temp_dir.path();
        let mut scanner = scanner(root)?;

        let dir = root.join("a");
        let excluded = dir.join("node_modules");
        let file = dir.join("b.txt");

        assert_eq!(
            scanner.pre_visit_directory(&Visit { path: root, depth: 0, attrs: attrs(TypeFlags::DIRECTORY, 4096) }),
            VisitControl::Continue
        );
        assert_eq!(
            scanner.pre_visit_directory(&Visit { path: &dir, depth: 1, attrs: attrs(TypeFlags::DIRECTORY, 4096) }),
            VisitControl::Continue
        );
        assert_eq!(
            scanner.pre_visit_directory(&Visit { path: &excluded, depth: 2, attrs: attrs(TypeFlags::DIRECTORY, 4096) }),
            VisitControl::SkipSubtree
        );
        scanner.visit_file(&Visit { path: &file, depth: 2, attrs: attrs(TypeFlags::FILE, 12) });
        scanner.visit_failed(&dir.join("locked"), &io::Error::new(io::ErrorKind::PermissionDenied, "denied"));

        let dump = scanner.into_dump();
        let lines: Vec<&str> = dump.text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("        0| Tree excluding: [node_modules], root directory: "));
        assert_eq!(lines[1], "        1| a| /T@D+F-S-O-/S@0/C@1970-01-01T00:00:00Z/M@1970-01-01T00:00:00Z/A@1970-01-01T00:00:00Z");
        assert!(lines[2].starts_with("        2|   |__node_modules| /T@D+F-S-O-/S@0/"));
        assert!(lines[3].starts_with("        3|   |__b.txt| /T@D-F+S-O-/S@12/"));
        assert!(!dump.text.ends_with('\n'));

        assert_eq!(dump.files.len(), 1);
        assert_eq!(dump.files[0].name, "b.txt");
        assert_eq!(dump.failures.len(), 1);
        assert!(dump.failures.values().all(|msg| msg.contains("denied")));
        Ok(())
    }

    #[test]
    fn test_rejects_file_root() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let file = temp_dir.path().join("plain.txt");
        std::fs::write(&file, b"x")?;
        assert!(matches!(
            Scanner::new(ScanConfig::new(&file), ProgressBar::hidden()),
            Err(TreeDumpError::InvalidRoot(_))
        ));
        Ok(())
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TreeVisitor for Recorder {
        fn pre_visit_directory(&mut self, dir: &Visit<'_>) -> VisitControl {
            self.events.push(format!("pre {}", dir.depth));
            VisitControl::Continue
        }

        fn visit_file(&mut self, file: &Visit<'_>) {
            self.events.push(format!("file {}", file.depth));
        }

        fn post_visit_directory(&mut self, _dir: &Path) {
            self.events.push("post".to_string());
        }

        fn visit_failed(&mut self, _path: &Path, _error: &io::Error) {
            self.events.push("failed".to_string());
        }
    }

    #[test]
    fn test_walk_tree_event_order() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        std::fs::create_dir(temp_dir.path().join("a"))?;
        std::fs::write(temp_dir.path().join("a").join("x.txt"), b"x")?;
        std::fs::write(temp_dir.path().join("b.txt"), b"b")?;

        let mut recorder = Recorder::default();
        walk_tree(temp_dir.path(), true, &mut recorder);

        assert_eq!(
            recorder.events,
            vec!["pre 0", "pre 1", "file 2", "post", "file 1", "post"]
        );
        Ok(())
    }
}
