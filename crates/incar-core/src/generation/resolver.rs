use crate::domain::{ParameterSet, SelectionTier, TaskCategory};
use crate::registry::TaskRegistry;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierEntry {
    pub display_name: String,
    pub category: TaskCategory,
    pub params: ParameterSet,
    /// Position of the first selection that produced this entry.
    pub selection_index: usize,
}

/// Display-name keyed entries in first-selection order. Re-selecting a name
/// overwrites the stored params in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TierGroups {
    entries: Vec<TierEntry>,
}

impl TierGroups {
    fn upsert(&mut self, entry: TierEntry) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.display_name == entry.display_name)
        {
            Some(existing) => {
                existing.category = entry.category;
                existing.params = entry.params;
            }
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[TierEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.display_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionResolution {
    pub task_tier: TierGroups,
    pub other_tier: TierGroups,
    /// Registry display names of every hit, in selection order, duplicates kept.
    pub resolved_names: Vec<String>,
    pub unresolved_names: Vec<String>,
}

impl SelectionResolution {
    /// Other-tier entries first, then task-tier entries.
    pub fn combined(&self) -> impl Iterator<Item = &TierEntry> {
        self.other_tier
            .entries()
            .iter()
            .chain(self.task_tier.entries().iter())
    }
}

/// Looks each name up in the registry. Misses are skipped and reported in
/// `unresolved_names`; blank names are ignored entirely.
pub fn resolve_selections<S: AsRef<str>>(
    registry: &TaskRegistry,
    names: &[S],
) -> SelectionResolution {
    let mut resolution = SelectionResolution::default();

    for (selection_index, name) in names.iter().enumerate() {
        let name = name.as_ref();
        if name.trim().is_empty() {
            continue;
        }

        let Some(entry) = registry.lookup(name) else {
            warn!(selection = name, "skipping unresolved task selection");
            resolution.unresolved_names.push(name.to_string());
            continue;
        };

        resolution.resolved_names.push(entry.display_name.clone());
        let tier_entry = TierEntry {
            display_name: entry.display_name.clone(),
            category: entry.category,
            params: entry.params.clone(),
            selection_index,
        };
        match entry.category.tier() {
            SelectionTier::Task => resolution.task_tier.upsert(tier_entry),
            SelectionTier::Other => resolution.other_tier.upsert(tier_entry),
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::resolve_selections;
    use crate::common::tables::{CategoryConfig, TaskPresetTable};
    use crate::domain::TaskCategory;
    use crate::registry::TaskRegistry;

    fn registry() -> TaskRegistry {
        let presets = TaskPresetTable::from_json_str(
            r#"{
                "d_cal_static": {"ISTART": 1, "NSW": 0},
                "d_cal_relax": {"IBRION": 2, "NSW": 200}
            }"#,
            "tasks.json",
        )
        .expect("presets should parse");
        let categories = CategoryConfig::from_json_str(
            r#"{
                "Functional": {"PBE": {"params": {"GGA": "PE"}}},
                "System": {"NCORE": {"params": {"NCORE": 4}}}
            }"#,
            "task_config.json",
        )
        .expect("categories should parse");
        TaskRegistry::from_sources(&presets, &categories).expect("registry should build")
    }

    #[test]
    fn selections_split_into_task_and_other_tiers() {
        let resolution = resolve_selections(&registry(), &["Static", "pbe", "NCORE", "relax"]);

        assert_eq!(resolution.task_tier.names().collect::<Vec<_>>(), ["Static", "Relax"]);
        assert_eq!(resolution.other_tier.names().collect::<Vec<_>>(), ["PBE", "NCORE"]);
        assert_eq!(resolution.resolved_names, ["Static", "PBE", "NCORE", "Relax"]);
        assert!(resolution.unresolved_names.is_empty());
        assert_eq!(
            resolution.other_tier.entries()[0].category,
            TaskCategory::Functional
        );
    }

    #[test]
    fn unresolved_names_are_skipped_not_fatal() {
        let resolution = resolve_selections(&registry(), &["Stale Task", "Static", "", "  "]);

        assert_eq!(resolution.task_tier.len(), 1);
        assert!(resolution.other_tier.is_empty());
        assert_eq!(resolution.unresolved_names, ["Stale Task"]);
        assert_eq!(resolution.resolved_names, ["Static"]);
    }

    #[test]
    fn duplicate_selections_are_idempotent() {
        let resolution = resolve_selections(&registry(), &["Static", "STATIC", "static"]);

        assert_eq!(resolution.task_tier.len(), 1);
        assert_eq!(resolution.task_tier.entries()[0].params.get("ISTART"), Some("1"));
        assert_eq!(resolution.task_tier.entries()[0].selection_index, 0);
    }

    #[test]
    fn combined_iteration_puts_other_tier_first() {
        let resolution = resolve_selections(&registry(), &["Static", "PBE"]);
        let names = resolution
            .combined()
            .map(|entry| entry.display_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["PBE", "Static"]);
    }
}
