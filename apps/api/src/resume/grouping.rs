//! Grouping Codec: project groups nested inside a job title's content.
//!
//! A job title's content is an ordered sequence of [`Entry`] values. A `ProjectHeader`
//! opens a named group that runs until the next header or the end of the sequence;
//! bullets before the first header form the unnamed ("loose") group.
//!
//! The historical wire shape stored the same structure as a flat list of strings where
//! an element starting with [`PROJECT_SENTINEL`] opened a group. `entries_from_legacy`
//! and `entries_to_legacy` convert between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::resume::reorder::move_item;

/// Prefix marking a project header in the legacy flat-string encoding.
pub const PROJECT_SENTINEL: &str = "__PROJECT_NAME__:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    Bullet { text: String },
    ProjectHeader { name: String },
}

impl Entry {
    pub fn bullet(text: impl Into<String>) -> Self {
        Entry::Bullet { text: text.into() }
    }

    pub fn header(name: impl Into<String>) -> Self {
        Entry::ProjectHeader { name: name.into() }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Entry::ProjectHeader { .. })
    }

    pub fn header_name(&self) -> Option<&str> {
        match self {
            Entry::ProjectHeader { name } => Some(name),
            Entry::Bullet { .. } => None,
        }
    }

    pub fn bullet_text(&self) -> Option<&str> {
        match self {
            Entry::Bullet { text } => Some(text),
            Entry::ProjectHeader { .. } => None,
        }
    }
}

/// An owned project group: the unit `decode` produces and `encode` consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectGroup {
    pub name: Option<String>,
    pub bullets: Vec<String>,
}

/// Position of one group inside the flat content sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpan {
    pub name: Option<String>,
    pub header_index: Option<usize>,
    pub bullet_indices: Vec<usize>,
}

impl GroupSpan {
    /// First index past this group.
    fn end(&self) -> usize {
        self.bullet_indices
            .last()
            .copied()
            .or(self.header_index)
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

/// Scans the content once and reports every group with its indices.
///
/// The loose group is only reported when it holds at least one bullet.
pub fn group_spans(entries: &[Entry]) -> Vec<GroupSpan> {
    let mut spans: Vec<GroupSpan> = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match entry {
            Entry::ProjectHeader { name } => spans.push(GroupSpan {
                name: Some(name.clone()),
                header_index: Some(index),
                bullet_indices: Vec::new(),
            }),
            Entry::Bullet { .. } => match spans.last_mut() {
                Some(open) => open.bullet_indices.push(index),
                None => spans.push(GroupSpan {
                    name: None,
                    header_index: None,
                    bullet_indices: vec![index],
                }),
            },
        }
    }
    spans
}

pub fn decode(entries: &[Entry]) -> Vec<ProjectGroup> {
    group_spans(entries)
        .into_iter()
        .map(|span| ProjectGroup {
            name: span.name,
            bullets: span
                .bullet_indices
                .iter()
                .filter_map(|&i| entries[i].bullet_text().map(str::to_string))
                .collect(),
        })
        .collect()
}

pub fn encode(groups: &[ProjectGroup]) -> Vec<Entry> {
    let mut entries = Vec::new();
    for group in groups {
        if let Some(name) = &group.name {
            entries.push(Entry::header(name.clone()));
        }
        entries.extend(group.bullets.iter().cloned().map(Entry::bullet));
    }
    entries
}

/// Names of every named group, in order. Duplicates are reported once per occurrence.
pub fn group_names(entries: &[Entry]) -> Vec<&str> {
    entries.iter().filter_map(Entry::header_name).collect()
}

/// Appends a new named group holding one empty bullet.
pub fn add_project_group(entries: &mut Vec<Entry>, name: &str) {
    entries.push(Entry::header(name));
    entries.push(Entry::bullet(""));
}

/// Inserts an empty bullet at the end of the first group named `name`.
///
/// Returns the index of the new bullet, or `None` when no such group exists.
pub fn insert_bullet_into_group(entries: &mut Vec<Entry>, name: &str) -> Option<usize> {
    let boundary = group_spans(entries)
        .into_iter()
        .find(|span| span.name.as_deref() == Some(name))?
        .end();
    entries.insert(boundary, Entry::bullet(""));
    Some(boundary)
}

/// Removes every group named `name` (header and bullets) and prunes its technology entry.
///
/// Returns the number of entries removed.
pub fn delete_group(
    entries: &mut Vec<Entry>,
    technologies: &mut BTreeMap<String, Vec<String>>,
    name: &str,
) -> usize {
    let before = entries.len();
    let mut inside_target = false;
    entries.retain(|entry| {
        if let Some(header) = entry.header_name() {
            inside_target = header == name;
        }
        !inside_target
    });
    technologies.remove(name);
    before - entries.len()
}

/// Moves a whole named group from position `from` to position `to`.
///
/// Positions count named groups only; the loose group always stays in front so its
/// bullets never get absorbed by a header placed before them.
pub fn reorder_groups(entries: &mut Vec<Entry>, from: usize, to: usize) -> bool {
    let mut groups = decode(entries);
    let loose = match groups.first() {
        Some(first) if first.name.is_none() => Some(groups.remove(0)),
        _ => None,
    };
    if move_item(&mut groups, from, to).is_none() {
        return false;
    }
    if let Some(loose) = loose {
        groups.insert(0, loose);
    }
    *entries = encode(&groups);
    true
}

/// Renames every group called `old`, carrying its technology entry along.
pub fn rename_project_group(
    entries: &mut [Entry],
    technologies: &mut BTreeMap<String, Vec<String>>,
    old: &str,
    new: &str,
) -> bool {
    let mut renamed = false;
    for entry in entries.iter_mut() {
        if let Entry::ProjectHeader { name } = entry {
            if name == old {
                *name = new.to_string();
                renamed = true;
            }
        }
    }
    if renamed && old != new {
        if let Some(techs) = technologies.remove(old) {
            technologies.insert(new.to_string(), techs);
        }
    }
    renamed
}

/// Drops technology entries whose group no longer exists.
pub fn prune_technologies(entries: &[Entry], technologies: &mut BTreeMap<String, Vec<String>>) {
    let names = group_names(entries);
    technologies.retain(|key, _| names.contains(&key.as_str()));
}

pub fn entries_from_legacy(bullets: &[String]) -> Vec<Entry> {
    bullets
        .iter()
        .map(|b| match b.strip_prefix(PROJECT_SENTINEL) {
            Some(name) => Entry::header(name),
            None => Entry::bullet(b.clone()),
        })
        .collect()
}

pub fn entries_to_legacy(entries: &[Entry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| match e {
            Entry::Bullet { text } => text.clone(),
            Entry::ProjectHeader { name } => format!("{PROJECT_SENTINEL}{name}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(items: &[&str]) -> Vec<Entry> {
        entries_from_legacy(&items.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    fn named(name: &str, bullets: &[&str]) -> ProjectGroup {
        ProjectGroup {
            name: Some(name.to_string()),
            bullets: bullets.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_decode_two_projects() {
        let entries = legacy(&[
            "__PROJECT_NAME__:Alpha",
            "did X",
            "did Y",
            "__PROJECT_NAME__:Beta",
            "did Z",
        ]);
        let groups = decode(&entries);
        assert_eq!(
            groups,
            vec![named("Alpha", &["did X", "did Y"]), named("Beta", &["did Z"])]
        );
    }

    #[test]
    fn test_delete_alpha_leaves_beta() {
        let mut entries = legacy(&[
            "__PROJECT_NAME__:Alpha",
            "did X",
            "did Y",
            "__PROJECT_NAME__:Beta",
            "did Z",
        ]);
        let mut techs = BTreeMap::from([
            ("Alpha".to_string(), vec!["Rust".to_string()]),
            ("Beta".to_string(), vec!["Go".to_string()]),
        ]);
        assert_eq!(delete_group(&mut entries, &mut techs, "Alpha"), 3);
        assert_eq!(
            entries_to_legacy(&entries),
            vec!["__PROJECT_NAME__:Beta".to_string(), "did Z".to_string()]
        );
        assert!(!techs.contains_key("Alpha"));
        assert!(techs.contains_key("Beta"));
    }

    #[test]
    fn test_loose_bullets_before_first_header() {
        let entries = legacy(&["loose 1", "loose 2", "__PROJECT_NAME__:P", "p1"]);
        let spans = group_spans(&entries);
        assert_eq!(spans[0].name, None);
        assert_eq!(spans[0].bullet_indices, vec![0, 1]);
        assert_eq!(spans[1].header_index, Some(2));
        assert_eq!(spans[1].bullet_indices, vec![3]);
    }

    #[test]
    fn test_round_trip_groups() {
        let groups = vec![
            ProjectGroup {
                name: None,
                bullets: vec!["intro".to_string()],
            },
            named("A", &["a1", ""]),
            named("B", &[]),
        ];
        assert_eq!(decode(&encode(&groups)), groups);
    }

    #[test]
    fn test_round_trip_legacy_strings() {
        let raw: Vec<String> = ["x", "__PROJECT_NAME__:A", "a", "__PROJECT_NAME__:B"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let entries = entries_from_legacy(&raw);
        assert_eq!(entries_to_legacy(&encode(&decode(&entries))), raw);
    }

    #[test]
    fn test_insert_bullet_lands_before_next_header() {
        let mut entries = legacy(&["__PROJECT_NAME__:A", "a1", "__PROJECT_NAME__:B", "b1"]);
        assert_eq!(insert_bullet_into_group(&mut entries, "A"), Some(2));
        assert_eq!(
            entries_to_legacy(&entries),
            vec!["__PROJECT_NAME__:A", "a1", "", "__PROJECT_NAME__:B", "b1"]
        );
        assert_eq!(insert_bullet_into_group(&mut entries, "B"), Some(5));
        assert_eq!(insert_bullet_into_group(&mut entries, "missing"), None);
    }

    #[test]
    fn test_empty_bullets_survive_decode() {
        let entries = legacy(&["__PROJECT_NAME__:A", "", ""]);
        assert_eq!(decode(&entries), vec![named("A", &["", ""])]);
    }

    #[test]
    fn test_reorder_groups_keeps_loose_first() {
        let mut entries = legacy(&[
            "loose",
            "__PROJECT_NAME__:A",
            "a1",
            "__PROJECT_NAME__:B",
            "b1",
            "b2",
        ]);
        assert!(reorder_groups(&mut entries, 1, 0));
        assert_eq!(
            entries_to_legacy(&entries),
            vec!["loose", "__PROJECT_NAME__:B", "b1", "b2", "__PROJECT_NAME__:A", "a1"]
        );
        assert!(!reorder_groups(&mut entries, 5, 0));
    }

    #[test]
    fn test_duplicate_names_delete_together() {
        let mut entries = legacy(&["__PROJECT_NAME__:A", "1", "__PROJECT_NAME__:A", "2"]);
        let mut techs = BTreeMap::new();
        assert_eq!(delete_group(&mut entries, &mut techs, "A"), 4);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_rename_moves_technologies() {
        let mut entries = legacy(&["__PROJECT_NAME__:Old", "x"]);
        let mut techs = BTreeMap::from([("Old".to_string(), vec!["Rust".to_string()])]);
        assert!(rename_project_group(&mut entries, &mut techs, "Old", "New"));
        assert_eq!(group_names(&entries), vec!["New"]);
        assert_eq!(techs.get("New"), Some(&vec!["Rust".to_string()]));
        assert!(!techs.contains_key("Old"));
    }

    #[test]
    fn test_prune_stale_technologies() {
        let entries = legacy(&["__PROJECT_NAME__:Keep", "x"]);
        let mut techs = BTreeMap::from([
            ("Keep".to_string(), vec![]),
            ("Gone".to_string(), vec!["C".to_string()]),
        ]);
        prune_technologies(&entries, &mut techs);
        assert_eq!(techs.keys().collect::<Vec<_>>(), vec!["Keep"]);
    }
}
