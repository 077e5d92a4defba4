//! core-keymap: per-mode key mapping table.
//!
//! Each mode owns an ordered set of `lhs -> rhs` mappings keyed by canonical
//! notation, compiled into a prefix trie for lookup. Resolution follows the
//! usual longest-match rule: a complete mapping that is also a strict prefix of
//! a longer one is reported as `ambiguous` so the caller can wait for more
//! input (or a timeout) before committing.

use bitflags::bitflags;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, trace};

pub mod notation;

pub use notation::{KeyToken, ModMask, NamedKey, parse_keys, render_keys};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MapModes: u8 {
        const NORMAL = 1 << 0;
        const VISUAL = 1 << 1;
        const SELECT = 1 << 2;
        const OP_PENDING = 1 << 3;
        const INSERT = 1 << 4;
        const CMDLINE = 1 << 5;
        const LANG = 1 << 6;
        /// Modes covered by a bare `:map`.
        const NVO = Self::NORMAL.bits() | Self::VISUAL.bits() | Self::SELECT.bits() | Self::OP_PENDING.bits();
        /// `:map!`
        const INSERT_CMDLINE = Self::INSERT.bits() | Self::CMDLINE.bits();
    }
}

impl MapModes {
    /// Single-character mode column used in mapping listings.
    pub fn label(self) -> &'static str {
        if self == MapModes::NVO {
            return " ";
        }
        if self == MapModes::INSERT_CMDLINE {
            return "!";
        }
        if self == MapModes::VISUAL | MapModes::SELECT {
            return "v";
        }
        const LABELS: &[(MapModes, &str)] = &[
            (MapModes::NORMAL, "n"),
            (MapModes::VISUAL, "x"),
            (MapModes::SELECT, "s"),
            (MapModes::OP_PENDING, "o"),
            (MapModes::INSERT, "i"),
            (MapModes::CMDLINE, "c"),
            (MapModes::LANG, "l"),
        ];
        LABELS
            .iter()
            .find(|(m, _)| *m == self)
            .map(|(_, l)| *l)
            .unwrap_or("*")
    }
}

const MODE_COUNT: usize = 7;

fn mode_slots(modes: MapModes) -> impl Iterator<Item = usize> {
    (0..MODE_COUNT).filter(move |i| modes.bits() & (1 << i) != 0)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeymapError {
    #[error("No such mapping")]
    NoMapping,
    #[error("Argument required")]
    EmptyLhs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub lhs: Vec<KeyToken>,
    pub rhs: String,
    pub noremap: bool,
}

/// One row of a mapping listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    pub modes: MapModes,
    pub lhs: String,
    pub rhs: String,
    pub noremap: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched {
        consumed: usize,
        rhs: String,
        noremap: bool,
        ambiguous: bool,
    },
    /// Strict prefix of one or more mappings.
    NeedMore,
    NoMatch,
}

#[derive(Debug, Clone)]
struct Edge {
    key: KeyToken,
    next: usize,
}

#[derive(Debug, Clone, Default)]
struct Node {
    terminal: Option<usize>,
    edges: SmallVec<[Edge; 4]>,
}

#[derive(Debug, Clone)]
struct MappingTrie {
    nodes: Vec<Node>,
    mappings: Vec<Mapping>,
}

impl MappingTrie {
    fn build(mappings: Vec<Mapping>) -> Self {
        let mut trie = MappingTrie {
            nodes: vec![Node::default()],
            mappings,
        };
        for (idx, m) in trie.mappings.iter().enumerate() {
            let mut cur = 0usize;
            for key in &m.lhs {
                cur = match trie.nodes[cur].edges.iter().find(|e| e.key == *key) {
                    Some(e) => e.next,
                    None => {
                        let new_idx = trie.nodes.len();
                        trie.nodes.push(Node::default());
                        trie.nodes[cur].edges.push(Edge {
                            key: key.clone(),
                            next: new_idx,
                        });
                        new_idx
                    }
                };
            }
            trie.nodes[cur].terminal = Some(idx);
        }
        trie
    }

    fn resolve(&self, input: &[KeyToken]) -> Resolution {
        let mut node_idx = 0usize;
        let mut last_terminal: Option<(usize, usize)> = None;
        let mut consumed_all = true;
        for (i, key) in input.iter().enumerate() {
            match self.nodes[node_idx].edges.iter().find(|e| e.key == *key) {
                Some(edge) => {
                    node_idx = edge.next;
                    trace!(target: "keymap", step = i, key = %key, node = node_idx, "advance");
                    if let Some(mi) = self.nodes[node_idx].terminal {
                        last_terminal = Some((i + 1, mi));
                    }
                }
                None => {
                    consumed_all = false;
                    break;
                }
            }
        }
        match last_terminal {
            Some((consumed, mi)) => {
                let at_end = consumed == input.len();
                let m = &self.mappings[mi];
                Resolution::Matched {
                    consumed,
                    rhs: m.rhs.clone(),
                    noremap: m.noremap,
                    ambiguous: at_end && !self.nodes[node_idx].edges.is_empty(),
                }
            }
            None if consumed_all && node_idx != 0 => Resolution::NeedMore,
            None => Resolution::NoMatch,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ModeMap {
    by_lhs: BTreeMap<String, Mapping>,
    trie: Option<MappingTrie>,
}

impl ModeMap {
    fn trie(&mut self) -> &MappingTrie {
        self.trie
            .get_or_insert_with(|| MappingTrie::build(self.by_lhs.values().cloned().collect()))
    }
}

/// Key mapping table for every mode.
#[derive(Debug, Clone, Default)]
pub struct KeyMapTable {
    modes: [ModeMap; MODE_COUNT],
}

impl KeyMapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(
        &mut self,
        modes: MapModes,
        lhs: &str,
        rhs: &str,
        noremap: bool,
    ) -> Result<(), KeymapError> {
        let keys = parse_keys(lhs);
        if keys.is_empty() {
            return Err(KeymapError::EmptyLhs);
        }
        let key = render_keys(&keys);
        for slot in mode_slots(modes) {
            let mm = &mut self.modes[slot];
            mm.by_lhs.insert(
                key.clone(),
                Mapping {
                    lhs: keys.clone(),
                    rhs: rhs.to_string(),
                    noremap,
                },
            );
            mm.trie = None;
        }
        debug!(target: "keymap", modes = modes.bits(), lhs = %key, noremap, "map");
        Ok(())
    }

    /// Remove `lhs` from every mode in `modes`. Fails if no mode had it.
    pub fn unmap(&mut self, modes: MapModes, lhs: &str) -> Result<(), KeymapError> {
        let key = render_keys(&parse_keys(lhs));
        let mut removed = false;
        for slot in mode_slots(modes) {
            let mm = &mut self.modes[slot];
            if mm.by_lhs.remove(&key).is_some() {
                mm.trie = None;
                removed = true;
            }
        }
        debug!(target: "keymap", modes = modes.bits(), lhs = %key, removed, "unmap");
        if removed {
            Ok(())
        } else {
            Err(KeymapError::NoMapping)
        }
    }

    pub fn clear(&mut self, modes: MapModes) {
        for slot in mode_slots(modes) {
            self.modes[slot] = ModeMap::default();
        }
        debug!(target: "keymap", modes = modes.bits(), "clear");
    }

    /// Look up the mapping for a pending key sequence in a single mode.
    pub fn resolve(&mut self, mode: MapModes, input: &[KeyToken]) -> Resolution {
        match mode_slots(mode).next() {
            Some(slot) => self.modes[slot].trie().resolve(input),
            None => Resolution::NoMatch,
        }
    }

    /// Mappings of `modes`, optionally restricted to lhs starting with
    /// `prefix`. Identical mappings present in several modes are merged.
    pub fn entries(&self, modes: MapModes, prefix: Option<&str>) -> Vec<MapEntry> {
        let prefix = prefix.map(|p| render_keys(&parse_keys(p)));
        let mut merged: BTreeMap<(String, String, bool), MapModes> = BTreeMap::new();
        for slot in mode_slots(modes) {
            let bit = MapModes::from_bits_truncate(1 << slot);
            for (lhs, m) in &self.modes[slot].by_lhs {
                if prefix.as_deref().is_some_and(|p| !lhs.starts_with(p)) {
                    continue;
                }
                *merged
                    .entry((lhs.clone(), m.rhs.clone(), m.noremap))
                    .or_insert(MapModes::empty()) |= bit;
            }
        }
        merged
            .into_iter()
            .map(|((lhs, rhs, noremap), modes)| MapEntry {
                modes,
                lhs,
                rhs,
                noremap,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.iter().all(|m| m.by_lhs.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn map_and_resolve() {
        let mut t = KeyMapTable::new();
        t.map(MapModes::NORMAL, "gx", ":q<CR>", false).unwrap();
        assert_eq!(
            t.resolve(MapModes::NORMAL, &parse_keys("gx")),
            Resolution::Matched {
                consumed: 2,
                rhs: ":q<CR>".into(),
                noremap: false,
                ambiguous: false
            }
        );
        assert_eq!(
            t.resolve(MapModes::NORMAL, &parse_keys("g")),
            Resolution::NeedMore
        );
        assert_eq!(
            t.resolve(MapModes::INSERT, &parse_keys("gx")),
            Resolution::NoMatch
        );
    }

    #[test]
    fn prefix_mapping_is_ambiguous() {
        let mut t = KeyMapTable::new();
        t.map(MapModes::NORMAL, "a", "x", true).unwrap();
        t.map(MapModes::NORMAL, "ab", "y", true).unwrap();
        match t.resolve(MapModes::NORMAL, &parse_keys("a")) {
            Resolution::Matched { ambiguous, .. } => assert!(ambiguous),
            other => panic!("unexpected {other:?}"),
        }
        match t.resolve(MapModes::NORMAL, &parse_keys("ac")) {
            Resolution::Matched {
                consumed,
                ambiguous,
                ..
            } => {
                assert_eq!(consumed, 1);
                assert!(!ambiguous);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unmap_missing_reports_error() {
        let mut t = KeyMapTable::new();
        assert_eq!(t.unmap(MapModes::NVO, "zz"), Err(KeymapError::NoMapping));
        t.map(MapModes::NVO, "zz", "dd", false).unwrap();
        t.unmap(MapModes::NORMAL, "zz").unwrap();
        assert_eq!(t.entries(MapModes::NVO, None).len(), 1);
        assert_eq!(
            t.resolve(MapModes::NORMAL, &parse_keys("zz")),
            Resolution::NoMatch
        );
    }

    #[test]
    fn entries_merge_modes() {
        let mut t = KeyMapTable::new();
        t.map(MapModes::NVO, "<c-a>", "gg", false).unwrap();
        t.map(MapModes::INSERT, "jk", "<Esc>", true).unwrap();
        let all = t.entries(MapModes::all(), None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].lhs, "<C-a>");
        assert_eq!(all[0].modes.label(), " ");
        assert_eq!(all[1].modes.label(), "i");
        assert_eq!(t.entries(MapModes::all(), Some("j")).len(), 1);
    }

    #[test]
    fn clear_modes() {
        let mut t = KeyMapTable::new();
        t.map(MapModes::INSERT_CMDLINE, "x", "y", false).unwrap();
        t.clear(MapModes::INSERT);
        assert_eq!(t.entries(MapModes::CMDLINE, None).len(), 1);
        t.clear(MapModes::CMDLINE);
        assert!(t.is_empty());
    }

    #[test]
    fn empty_lhs_rejected() {
        let mut t = KeyMapTable::new();
        assert_eq!(t.map(MapModes::NORMAL, "", "x", false), Err(KeymapError::EmptyLhs));
    }
}
