//! Check selection.
//!
//! Decides whether a catalogue entry runs, given the level, include and
//! exclude filters of a run. Stages are applied in order:
//!
//! 1. Level: a non-zero level filter drops checks of any other level.
//! 2. Include: when the include set is non-empty, a check must be listed,
//!    be an ancestor of a listed id, or be a descendant of one. The include
//!    stage only rejects when no level filter is set.
//! 3. Exclude: a listed id and all its descendants are dropped. Exclusion
//!    always wins over inclusion.

use std::collections::BTreeSet;

use crate::engine::id;

/// Resolved level/include/exclude filters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// 0 = no filter, otherwise 1 or 2
    pub level_filter: u8,
    pub include: BTreeSet<String>,
    pub exclude: BTreeSet<String>,
}

impl SelectionCriteria {
    pub fn new<I, E>(level_filter: u8, include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        SelectionCriteria {
            level_filter,
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    /// Collapse the requested levels into a single filter. Asking for none
    /// or for both levels means no filter.
    pub fn level_from(levels: &[u8]) -> u8 {
        let distinct: BTreeSet<u8> = levels.iter().copied().filter(|l| *l != 0).collect();
        match distinct.len() {
            1 => distinct.into_iter().next().unwrap_or(0),
            _ => 0,
        }
    }

    /// Split space-delimited id lists (commas accepted too) into a set.
    pub fn parse_id_list(raw: &[String]) -> BTreeSet<String> {
        raw.iter()
            .flat_map(|entry| entry.split(|c: char| c.is_whitespace() || c == ','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Applies a [`SelectionCriteria`] to individual catalogue entries.
#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
    criteria: &'a SelectionCriteria,
}

impl<'a> Selector<'a> {
    pub fn new(criteria: &'a SelectionCriteria) -> Self {
        Selector { criteria }
    }

    /// Whether the check `check_id` at `level` should be dispatched.
    pub fn is_included(&self, check_id: &str, level: u8) -> bool {
        let criteria = self.criteria;

        if criteria.level_filter != 0 && level != criteria.level_filter {
            return false;
        }

        if !criteria.include.is_empty() && criteria.level_filter == 0 {
            let listed = criteria.include.iter().any(|wanted| {
                wanted == check_id
                    || id::is_ancestor(check_id, wanted)
                    || id::is_ancestor(wanted, check_id)
            });
            if !listed {
                return false;
            }
        }

        !criteria
            .exclude
            .iter()
            .any(|unwanted| unwanted == check_id || id::is_ancestor(unwanted, check_id))
    }
}
