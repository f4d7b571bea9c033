//! Four-tier parameter resolution.
//!
//! Precedence from highest to lowest: custom overrides, task-tier entries,
//! other-tier entries (Functional, Correction, Model, System), standard
//! sections. Every key is emitted under exactly one group: a lower tier drops
//! the keys claimed by any higher tier instead of being overwritten later.
//! `SYSTEM` is never emitted by a group; the formatter writes it first.

use super::resolver::SelectionResolution;
use crate::common::tables::{SYSTEM_SECTION, StandardCatalogue, normalize_section_name};
use crate::domain::{
    DocumentGroup, GroupSource, ParameterSet, SYSTEM_KEY, SYSTEM_VALUE, StandardSection,
    TaskCategory,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub groups: Vec<DocumentGroup>,
    /// SYSTEM plus every emitted line. Equals a re-parse of the rendered text.
    pub effective: ParameterSet,
    /// Key lines across all groups, excluding the synthetic SYSTEM line.
    pub total_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomOverrides {
    pub params: ParameterSet,
    /// Blank keys plus any attempt to override the reserved SYSTEM key.
    pub dropped_keys: usize,
}

/// Trims keys and values. Blank keys are dropped; later duplicates win.
pub fn normalize_custom_overrides(raw: &[(String, String)]) -> CustomOverrides {
    let mut overrides = CustomOverrides::default();
    for (key, value) in raw {
        if key.trim() == SYSTEM_KEY {
            debug!("ignoring custom override of the reserved SYSTEM key");
            overrides.dropped_keys += 1;
            continue;
        }
        if !overrides.params.insert(key, value) {
            debug!(value = value.as_str(), "dropping custom override with a blank key");
            overrides.dropped_keys += 1;
        }
    }
    overrides
}

/// Selected sections in ascending name order, without `system`. Unknown names
/// are returned separately.
pub fn select_standard_sections<'a>(
    catalogue: &'a StandardCatalogue,
    names: &BTreeSet<String>,
) -> (Vec<&'a StandardSection>, Vec<String>) {
    let mut selected = BTreeMap::new();
    let mut unresolved = Vec::new();

    for name in names {
        let normalized = normalize_section_name(name);
        if normalized.is_empty() || normalized == SYSTEM_SECTION {
            continue;
        }
        match catalogue.get(&normalized) {
            Some(section) => {
                selected.insert(normalized, section);
            }
            None => unresolved.push(name.clone()),
        }
    }

    (selected.into_values().collect(), unresolved)
}

pub fn merge_parameters(
    selection: &SelectionResolution,
    standard_sections: &[&StandardSection],
    custom: &ParameterSet,
) -> MergeOutcome {
    let custom_keys: HashSet<&str> = custom.keys().collect();
    let tier_entries = selection.combined().collect::<Vec<_>>();
    let owners = key_owners(
        tier_entries
            .iter()
            .map(|entry| (entry.category, entry.selection_index, &entry.params)),
    );

    let mut groups = Vec::new();

    for section in standard_sections {
        if section.name == SYSTEM_SECTION {
            continue;
        }
        let params = section.params.filtered(|key| {
            key != SYSTEM_KEY && !custom_keys.contains(key) && !owners.contains_key(key)
        });
        push_group(
            &mut groups,
            GroupSource::Standard {
                section: section.name.clone(),
            },
            params,
        );
    }

    for (index, entry) in tier_entries.iter().enumerate() {
        let params = entry.params.filtered(|key| {
            key != SYSTEM_KEY
                && !custom_keys.contains(key)
                && owners.get(key).copied() == Some(index)
        });
        push_group(
            &mut groups,
            GroupSource::Selection {
                display_name: entry.display_name.clone(),
                category: entry.category,
            },
            params,
        );
    }

    push_group(
        &mut groups,
        GroupSource::Custom,
        custom.filtered(|key| key != SYSTEM_KEY),
    );

    let mut effective = ParameterSet::new();
    effective.insert(SYSTEM_KEY, SYSTEM_VALUE);
    for group in &groups {
        effective.extend_from(&group.params);
    }
    let total_count = groups.iter().map(|group| group.params.len()).sum();

    debug!(
        groups = groups.len(),
        total_count, "merged parameter groups"
    );

    MergeOutcome {
        groups,
        effective,
        total_count,
    }
}

fn push_group(groups: &mut Vec<DocumentGroup>, source: GroupSource, params: ParameterSet) {
    if !params.is_empty() {
        groups.push(DocumentGroup { source, params });
    }
}

/// For every key, the index of the tier entry that emits it: highest category
/// rank first, then the later selection.
fn key_owners<'a>(
    entries: impl Iterator<Item = (TaskCategory, usize, &'a ParameterSet)>,
) -> HashMap<&'a str, usize> {
    let mut best: HashMap<&'a str, (TaskCategory, usize, usize)> = HashMap::new();
    for (index, (category, selection_index, params)) in entries.enumerate() {
        for key in params.keys() {
            let candidate = (category, selection_index, index);
            best.entry(key)
                .and_modify(|current| {
                    if (candidate.0, candidate.1) > (current.0, current.1) {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }
    }
    best.into_iter()
        .map(|(key, (_, _, index))| (key, index))
        .collect()
}
