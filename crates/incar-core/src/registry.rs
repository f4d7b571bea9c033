//! Task registry assembled once at startup from the built-in preset table and
//! the external category configuration. Immutable afterwards.

use crate::common::tables::{CategoryConfig, TaskPresetTable};
use crate::domain::{TableResult, TaskCategory, TaskEntry, capitalize, title_case_words};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

const TASK_ID_PREFIX: &str = "d_cal_";

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    entries: BTreeMap<String, TaskEntry>,
    /// Lower-cased display name -> task id.
    display_index: HashMap<String, String>,
}

impl TaskRegistry {
    /// Built-in presets are registered under category `Tasks`. Categorized entries
    /// replace a built-in entry with the same id and win display-name lookups.
    pub fn from_sources(
        presets: &TaskPresetTable,
        categories: &CategoryConfig,
    ) -> TableResult<Self> {
        let mut registry = Self::default();

        for (id, params) in presets.iter() {
            registry.register(TaskEntry::new(
                id,
                display_name_for_task_id(id),
                TaskCategory::Tasks,
                params.clone(),
            ));
        }

        for categorized in categories.entries() {
            let entry = TaskEntry::new(
                categorized.display_name.clone(),
                categorized.display_name.clone(),
                categorized.category,
                categorized.params.clone(),
            );
            if let Some(shadowed) = registry.register(entry) {
                debug!(
                    task_id = %shadowed.id,
                    category = %categorized.category,
                    "category configuration replaces built-in task"
                );
            }
        }

        if categories.is_empty() {
            warn!("task category configuration is empty; only built-in tasks are available");
        }

        info!(
            entries = registry.entries.len(),
            presets = presets.len(),
            categorized = categories.entries().len(),
            "task registry constructed"
        );
        Ok(registry)
    }

    fn register(&mut self, entry: TaskEntry) -> Option<TaskEntry> {
        let display_key = entry.display_name.to_lowercase();
        if let Some(previous_id) = self.display_index.get(&display_key)
            && previous_id != &entry.id
        {
            debug!(
                display_name = %entry.display_name,
                shadowed_id = %previous_id,
                task_id = %entry.id,
                "display name now resolves to a categorized entry"
            );
        }
        self.display_index.insert(display_key.clone(), entry.id.clone());

        let replaced = self.entries.insert(entry.id.clone(), entry);
        if let Some(previous) = &replaced {
            let stale_key = previous.display_name.to_lowercase();
            if stale_key != display_key
                && self.display_index.get(&stale_key) == Some(&previous.id)
            {
                self.display_index.remove(&stale_key);
            }
        }
        replaced
    }

    /// Case-insensitive exact match on the display name.
    pub fn lookup(&self, display_name: &str) -> Option<&TaskEntry> {
        let key = display_name.trim().to_lowercase();
        self.display_index
            .get(&key)
            .and_then(|id| self.entries.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&TaskEntry> {
        self.entries.get(id)
    }

    /// Ascending by task id.
    pub fn all_entries(&self) -> impl Iterator<Item = &TaskEntry> {
        self.entries.values()
    }

    /// Categories in display order, each with its entries sorted by display name.
    /// Built-in entries hidden behind a categorized display name are omitted.
    pub fn entries_by_category(&self) -> Vec<(TaskCategory, Vec<&TaskEntry>)> {
        TaskCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let mut entries = self
                    .entries
                    .values()
                    .filter(|entry| entry.category == category && self.is_reachable(entry))
                    .collect::<Vec<_>>();
                if entries.is_empty() {
                    return None;
                }
                entries.sort_by(|a, b| a.display_name.cmp(&b.display_name));
                Some((category, entries))
            })
            .collect()
    }

    fn is_reachable(&self, entry: &TaskEntry) -> bool {
        self.display_index
            .get(&entry.display_name.to_lowercase())
            .is_some_and(|id| *id == entry.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Display name for a built-in task id: `d_cal_band_structure` -> `Band Structure`,
/// `d_cal_vdwD3bj` -> `vdW-D3-BJ`, `d_cal_mltrain` -> `ML-Train`. Other `vdw`
/// ids keep their stem as is.
pub fn display_name_for_task_id(id: &str) -> String {
    let stem = id.strip_prefix(TASK_ID_PREFIX).unwrap_or(id);
    let lowered = stem.to_ascii_lowercase();

    if lowered.contains("vdw") {
        if stem.contains("bj") {
            return "vdW-D3-BJ".to_string();
        }
        if stem.contains("zero") {
            return "vdW-D3-Zero".to_string();
        }
        return stem.to_string();
    } else if let Some(position) = lowered.find("ml") {
        return format!("ML-{}", capitalize(&stem[position + 2..]));
    }

    title_case_words(stem)
}
