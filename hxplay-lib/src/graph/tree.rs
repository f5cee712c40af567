//! Flattened link tree of an entry, for display.

use std::collections::HashSet;

use super::{Cuuid, EntryData, ResourceGraph};

/// One row of a link tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeRow {
    pub depth: usize,
    pub cuuid: Cuuid,
    /// Event name for events, hex id otherwise.
    pub label: String,
    /// Language tag of a localized link, `--` otherwise.
    pub info: String,
    /// Class name, or `<missing>` / `<cycle>` for unresolvable links.
    pub class: String,
}

/// Walk the links below `root`, depth first, in link order.
///
/// Links that do not resolve are emitted as `<missing>` leaves; an entry
/// already on the current path is emitted as a `<cycle>` leaf and not
/// descended into.
pub fn walk(graph: &dyn ResourceGraph, root: Cuuid) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let mut path = HashSet::new();
    visit(graph, root, 0, "--".to_string(), &mut path, &mut rows);
    rows
}

fn visit(
    graph: &dyn ResourceGraph,
    id: Cuuid,
    depth: usize,
    info: String,
    path: &mut HashSet<Cuuid>,
    rows: &mut Vec<TreeRow>,
) {
    let Some(entry) = graph.find(id) else {
        rows.push(TreeRow {
            depth,
            cuuid: id,
            label: id.to_string(),
            info,
            class: "<missing>".to_string(),
        });
        return;
    };

    if !path.insert(id) {
        rows.push(TreeRow {
            depth,
            cuuid: id,
            label: id.to_string(),
            info,
            class: "<cycle>".to_string(),
        });
        return;
    }

    rows.push(TreeRow {
        depth,
        cuuid: id,
        label: entry
            .event_name()
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string()),
        info,
        class: entry.data.class_name().to_string(),
    });

    let children: Vec<(Cuuid, String)> = match &entry.data {
        EntryData::Event(event) => vec![(event.link, "--".to_string())],
        EntryData::Wave(wave) => std::iter::once((wave.default, "--".to_string()))
            .chain(
                wave.links
                    .iter()
                    .map(|link| (link.link, link.language.to_string())),
            )
            .collect(),
        EntryData::Program(program) => program
            .links
            .iter()
            .map(|link| (*link, "--".to_string()))
            .collect(),
        EntryData::File(_) | EntryData::Other { .. } => Vec::new(),
    };

    for (child, child_info) in children {
        visit(graph, child, depth + 1, child_info, path, rows);
    }

    path.remove(&id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        Entry, EventRecord, Language, LocalizedLink, MemoryGraph, ProgramRecord, WaveRecord,
    };

    fn other(id: u64) -> Entry {
        Entry::new(
            Cuuid(id),
            EntryData::Other {
                name: "WaveFileIdObj".to_string(),
            },
        )
    }

    #[test]
    fn tree_lists_localized_links_with_language() {
        let mut graph = MemoryGraph::new();
        graph.insert(Entry::new(
            Cuuid(1),
            EntryData::Event(EventRecord {
                name: "Play_Voice".to_string(),
                link: Cuuid(2),
            }),
        ));
        graph.insert(Entry::new(
            Cuuid(2),
            EntryData::Wave(WaveRecord {
                default: Cuuid(3),
                links: vec![LocalizedLink {
                    link: Cuuid(4),
                    language: Language::De,
                }],
            }),
        ));
        graph.insert(other(3));
        graph.insert(other(4));

        let rows = walk(&graph, Cuuid(1));
        let summary: Vec<(usize, &str, &str)> = rows
            .iter()
            .map(|row| (row.depth, row.label.as_str(), row.info.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0, "Play_Voice", "--"),
                (1, "0000000000000002", "--"),
                (2, "0000000000000003", "--"),
                (2, "0000000000000004", "DE"),
            ]
        );
    }

    #[test]
    fn tree_terminates_on_cycles_and_marks_missing() {
        let mut graph = MemoryGraph::new();
        graph.insert(Entry::new(
            Cuuid(1),
            EntryData::Program(ProgramRecord {
                links: vec![Cuuid(1), Cuuid(9)],
            }),
        ));

        let rows = walk(&graph, Cuuid(1));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].class, "<cycle>");
        assert_eq!(rows[2].class, "<missing>");
    }
}
