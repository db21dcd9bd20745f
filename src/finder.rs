/*!
 * Locating directories by name in a decoded dump
 */

use std::collections::HashSet;

use crate::types::Entry;

/// Full paths of directories whose name is in `names`, in traversal order
///
/// Entries without a known path fall back to their bare name.
pub fn find_directories(entries: &[Entry], names: &HashSet<String>) -> Vec<String> {
    let mut matches: Vec<&Entry> = entries
        .iter()
        .filter(|entry| entry.is_dir() && names.contains(&entry.name))
        .collect();
    matches.sort_by_key(|entry| entry.sequence);

    matches
        .into_iter()
        .map(|entry| match &entry.path {
            Some(path) => path.to_string(),
            None => entry.name.clone(),
        })
        .collect()
}
