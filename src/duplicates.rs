/*!
 * Duplicate detection over dump entries
 *
 * Two reports exist:
 *
 * - **Parent counts**, computed right after a live traversal: files are
 *   grouped by name and size, and each member of a duplicate group adds one
 *   to the count of its immediate parent directory.
 * - **Parent sets**, computed from a re-parsed dump: each duplicate group
 *   contributes its set of distinct parent directories, and identical sets
 *   are counted together.
 *
 * A group is a duplicate group when it has at least two members. Both
 * rankings are by descending count with ties broken by the parent text, so
 * repeated runs over the same entries give identical output.
 */

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::config::DuplicateKey;
use crate::path::EMPTY;
use crate::types::{Entry, TypeFlags};

/// Identity used to bucket entries
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct GroupKey<'a> {
    name: &'a str,
    size: u64,
    type_flags: Option<TypeFlags>,
}

/// How many duplicate files live in one parent directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentCount {
    /// Parent directory
    pub parent: String,
    /// Number of duplicate files in it
    pub count: u64,
}

/// How many duplicate groups are spread over exactly this set of parents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentSetCount {
    /// Distinct parent directories, sorted
    pub parents: Vec<String>,
    /// Number of duplicate groups sharing this parent set
    pub count: u64,
}

/// Groups entries into duplicate groups under a key policy
pub struct DuplicateAnalyzer {
    key: DuplicateKey,
}

impl DuplicateAnalyzer {
    /// Create an analyzer using the given key
    pub fn new(key: DuplicateKey) -> Self {
        Self { key }
    }

    /// Groups with two or more members, in key order
    pub fn duplicate_groups<'a>(&self, entries: &'a [Entry]) -> Vec<Vec<&'a Entry>> {
        let mut groups: BTreeMap<GroupKey<'a>, Vec<&'a Entry>> = BTreeMap::new();
        for entry in entries.iter().filter(|e| self.is_candidate(e)) {
            groups.entry(self.key_for(entry)).or_default().push(entry);
        }

        groups
            .into_values()
            .filter(|members| members.len() > 1)
            .collect()
    }

    /// Count duplicate files per immediate parent directory
    pub fn parent_counts(&self, entries: &[Entry]) -> Vec<ParentCount> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for group in self.duplicate_groups(entries) {
            for entry in group {
                *counts.entry(parent_of(entry)).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<ParentCount> = counts
            .into_iter()
            .map(|(parent, count)| ParentCount { parent, count })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.parent.cmp(&b.parent)));
        ranked
    }

    /// Count duplicate groups per distinct set of parent directories
    pub fn parent_set_counts(&self, entries: &[Entry]) -> Vec<ParentSetCount> {
        let mut counts: BTreeMap<BTreeSet<String>, u64> = BTreeMap::new();
        for group in self.duplicate_groups(entries) {
            let parents: BTreeSet<String> = group.into_iter().map(parent_of).collect();
            *counts.entry(parents).or_insert(0) += 1;
        }

        let mut ranked: Vec<ParentSetCount> = counts
            .into_iter()
            .map(|(parents, count)| ParentSetCount {
                parents: parents.into_iter().collect(),
                count,
            })
            .collect();
        // stable sort keeps the set order for equal counts
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    fn is_candidate(&self, entry: &Entry) -> bool {
        match self.key {
            DuplicateKey::NameSize => !entry.is_dir(),
            DuplicateKey::NameSizeType => entry.is_file(),
        }
    }

    fn key_for<'a>(&self, entry: &'a Entry) -> GroupKey<'a> {
        GroupKey {
            name: &entry.name,
            size: entry.size,
            type_flags: match self.key {
                DuplicateKey::NameSize => None,
                DuplicateKey::NameSizeType => Some(entry.type_flags),
            },
        }
    }
}

/// Parent directory text, or the empty path when there is none
fn parent_of(entry: &Entry) -> String {
    entry
        .parent_text()
        .unwrap_or_else(|| EMPTY.as_str().to_string())
}
