//! Read-only lookup tables: standard sections, task presets and the category
//! configuration. Built-in copies are compiled in from `data/`; every table can
//! be replaced by a JSON file at startup.

use crate::common::elements::ElementTables;
use crate::domain::{IncarError, ParameterSet, StandardSection, TableResult, TaskCategory};
use crate::registry::TaskRegistry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const BUILTIN_STANDARD_TABLE: &str = include_str!("../../data/standard.json");
const BUILTIN_TASK_TABLE: &str = include_str!("../../data/tasks.json");
const BUILTIN_CATEGORY_CONFIG: &str = include_str!("../../data/task_config.json");
const BUILTIN_ELEMENT_TABLE: &str = include_str!("../../data/elements.json");

const SECTION_PREFIX: &str = "d_";
/// Never rendered; the synthetic SYSTEM line replaces it.
pub const SYSTEM_SECTION: &str = "system";

/// Optional file overrides for each table. `None` selects the built-in table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSources {
    pub standard: Option<PathBuf>,
    pub tasks: Option<PathBuf>,
    pub categories: Option<PathBuf>,
    pub elements: Option<PathBuf>,
}

/// Everything a generation request reads. Built once, shared by reference.
#[derive(Debug, Clone)]
pub struct ParameterTables {
    pub standard: StandardCatalogue,
    pub registry: TaskRegistry,
    pub elements: ElementTables,
}

impl ParameterTables {
    pub fn builtin() -> TableResult<Self> {
        Self::load(&TableSources::default())
    }

    pub fn load(sources: &TableSources) -> TableResult<Self> {
        let standard = load_table(
            sources.standard.as_deref(),
            BUILTIN_STANDARD_TABLE,
            "built-in standard table",
            StandardCatalogue::from_json_str,
        )?;
        let presets = load_table(
            sources.tasks.as_deref(),
            BUILTIN_TASK_TABLE,
            "built-in task table",
            TaskPresetTable::from_json_str,
        )?;
        let categories = load_table(
            sources.categories.as_deref(),
            BUILTIN_CATEGORY_CONFIG,
            "built-in task configuration",
            CategoryConfig::from_json_str,
        )?;
        let elements = load_table(
            sources.elements.as_deref(),
            BUILTIN_ELEMENT_TABLE,
            "built-in element table",
            ElementTables::from_json_str,
        )?;

        Ok(Self {
            standard,
            registry: TaskRegistry::from_sources(&presets, &categories)?,
            elements,
        })
    }
}

fn load_table<T>(
    path: Option<&Path>,
    builtin: &str,
    builtin_origin: &str,
    parse: fn(&str, &str) -> TableResult<T>,
) -> TableResult<T> {
    match path {
        Some(path) => parse(&read_table(path)?, &path.display().to_string()),
        None => parse(builtin, builtin_origin),
    }
}

fn read_table(path: &Path) -> TableResult<String> {
    fs::read_to_string(path).map_err(|source| {
        IncarError::io_system(
            "IO.TABLE_READ",
            format!("failed to read table '{}': {}", path.display(), source),
        )
    })
}

fn parse_failure(placeholder: &'static str, origin: &str, source: serde_json::Error) -> IncarError {
    IncarError::malformed_table(
        placeholder,
        format!("failed to parse {}: {}", origin, source),
    )
}

/// `d_ncore` and `NCORE` both name the `ncore` section.
pub fn normalize_section_name(name: &str) -> String {
    let trimmed = name.trim().to_ascii_lowercase();
    trimmed
        .strip_prefix(SECTION_PREFIX)
        .map(str::to_string)
        .unwrap_or(trimmed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardCatalogue {
    sections: BTreeMap<String, StandardSection>,
}

impl StandardCatalogue {
    pub fn from_json_str(source: &str, origin: &str) -> TableResult<Self> {
        let raw: BTreeMap<String, ParameterSet> = serde_json::from_str(source)
            .map_err(|error| parse_failure("TABLE.STANDARD_PARSE", origin, error))?;
        Self::from_sections(raw, origin)
    }

    pub fn from_sections(
        raw: impl IntoIterator<Item = (String, ParameterSet)>,
        origin: &str,
    ) -> TableResult<Self> {
        let mut sections = BTreeMap::new();
        for (name, params) in raw {
            let name = normalize_section_name(&name);
            if name.is_empty() {
                return Err(IncarError::malformed_table(
                    "TABLE.STANDARD_SECTION",
                    format!("{} contains a section with an empty name", origin),
                ));
            }
            sections.insert(name.clone(), StandardSection { name, params });
        }

        if sections.is_empty() {
            return Err(IncarError::malformed_table(
                "TABLE.EMPTY_STANDARD",
                format!("{} does not define any standard sections", origin),
            ));
        }
        Ok(Self { sections })
    }

    pub fn get(&self, name: &str) -> Option<&StandardSection> {
        self.sections.get(&normalize_section_name(name))
    }

    /// Ascending by normalized name.
    pub fn sections(&self) -> impl Iterator<Item = &StandardSection> {
        self.sections.values()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Code-derived presets keyed by task id (`d_cal_static`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPresetTable {
    presets: BTreeMap<String, ParameterSet>,
}

impl TaskPresetTable {
    pub fn from_json_str(source: &str, origin: &str) -> TableResult<Self> {
        let presets: BTreeMap<String, ParameterSet> = serde_json::from_str(source)
            .map_err(|error| parse_failure("TABLE.TASK_PARSE", origin, error))?;
        Self::from_presets(presets, origin)
    }

    pub fn from_presets(
        presets: impl IntoIterator<Item = (String, ParameterSet)>,
        origin: &str,
    ) -> TableResult<Self> {
        let presets = presets
            .into_iter()
            .map(|(id, params)| (id.trim().to_string(), params))
            .collect::<BTreeMap<_, _>>();
        if presets.is_empty() {
            return Err(IncarError::malformed_table(
                "TABLE.EMPTY_TASKS",
                format!("{} does not define any task presets", origin),
            ));
        }
        if presets.contains_key("") {
            return Err(IncarError::malformed_table(
                "TABLE.TASK_ID",
                format!("{} contains a task preset with an empty id", origin),
            ));
        }
        Ok(Self { presets })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterSet)> {
        self.presets.iter().map(|(id, params)| (id.as_str(), params))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizedTask {
    pub category: TaskCategory,
    pub display_name: String,
    pub params: ParameterSet,
}

#[derive(Debug, Deserialize)]
struct CategoryEntryBody {
    params: ParameterSet,
}

/// Externally configured entries, each explicitly tagged with a category.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryConfig {
    entries: Vec<CategorizedTask>,
}

impl CategoryConfig {
    pub fn from_json_str(source: &str, origin: &str) -> TableResult<Self> {
        let raw: BTreeMap<String, BTreeMap<String, CategoryEntryBody>> =
            serde_json::from_str(source)
                .map_err(|error| parse_failure("TABLE.CATEGORY_PARSE", origin, error))?;

        let mut entries = Vec::new();
        for (category_name, tasks) in raw {
            let category = TaskCategory::from_name(&category_name)?;
            for (display_name, body) in tasks {
                let display_name = display_name.trim().to_string();
                if display_name.is_empty() {
                    return Err(IncarError::malformed_table(
                        "TABLE.CATEGORY_ENTRY",
                        format!(
                            "{} has an entry with an empty name in category {}",
                            origin, category
                        ),
                    ));
                }
                entries.push(CategorizedTask {
                    category,
                    display_name,
                    params: body.params,
                });
            }
        }

        entries.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CategorizedTask] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CategoryConfig, ParameterTables, StandardCatalogue, TableSources, TaskPresetTable,
        normalize_section_name,
    };
    use crate::domain::TaskCategory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn builtin_tables_load() {
        let tables = ParameterTables::builtin().expect("built-in tables should load");
        assert!(tables.standard.get("ncore").is_some());
        assert!(tables.standard.get("d_lapack").is_some());
        assert!(tables.registry.lookup("static").is_some());
        assert!(tables.elements.hubbard_u("Fe").is_some());
    }

    #[test]
    fn section_names_drop_prefix_and_case() {
        assert_eq!(normalize_section_name("d_ncore"), "ncore");
        assert_eq!(normalize_section_name(" WRITE "), "write");
        assert_eq!(normalize_section_name("lapack"), "lapack");
    }

    #[test]
    fn empty_standard_table_is_rejected() {
        let error = StandardCatalogue::from_json_str("{}", "standard.json")
            .expect_err("empty catalogue must not load");
        assert_eq!(error.placeholder(), "TABLE.EMPTY_STANDARD");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn empty_task_table_is_rejected() {
        let error = TaskPresetTable::from_json_str("{}", "tasks.json")
            .expect_err("empty preset table must not load");
        assert_eq!(error.placeholder(), "TABLE.EMPTY_TASKS");
    }

    #[test]
    fn category_entry_without_params_is_rejected() {
        let error = CategoryConfig::from_json_str(
            r#"{"Functional": {"PBE": {"GGA": "PE"}}}"#,
            "task_config.json",
        )
        .expect_err("entries must carry params");
        assert_eq!(error.placeholder(), "TABLE.CATEGORY_PARSE");
        assert!(error.message().contains("task_config.json"));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let error = CategoryConfig::from_json_str(
            r#"{"Extras": {"Foo": {"params": {"A": 1}}}}"#,
            "task_config.json",
        )
        .expect_err("unknown category must not load");
        assert_eq!(error.placeholder(), "TABLE.CATEGORY_NAME");
    }

    #[test]
    fn category_entries_are_ordered_by_category_then_name() {
        let config = CategoryConfig::from_json_str(
            r#"{
                "Tasks": {"Static": {"params": {"NSW": 0}}},
                "Functional": {"SCAN": {"params": {"METAGGA": "SCAN"}}, "PBE": {"params": {"GGA": "PE"}}}
            }"#,
            "task_config.json",
        )
        .expect("config should parse");
        let names = config
            .entries()
            .iter()
            .map(|entry| (entry.category, entry.display_name.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            [
                (TaskCategory::Functional, "PBE"),
                (TaskCategory::Functional, "SCAN"),
                (TaskCategory::Tasks, "Static"),
            ]
        );
    }

    #[test]
    fn table_files_override_builtin_tables() {
        let temp = TempDir::new().expect("tempdir should be created");
        let standard_path = temp.path().join("standard.json");
        fs::write(&standard_path, r#"{"d_ncore": {"NCORE": 8}}"#)
            .expect("standard table should be written");

        let tables = ParameterTables::load(&TableSources {
            standard: Some(standard_path),
            ..TableSources::default()
        })
        .expect("tables should load");

        assert_eq!(tables.standard.len(), 1);
        assert_eq!(
            tables
                .standard
                .get("ncore")
                .and_then(|section| section.params.get("NCORE")),
            Some("8")
        );
    }

    #[test]
    fn missing_table_file_is_an_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = ParameterTables::load(&TableSources {
            tasks: Some(temp.path().join("missing.json")),
            ..TableSources::default()
        })
        .expect_err("missing file must fail");
        assert_eq!(error.placeholder(), "IO.TABLE_READ");
        assert_eq!(error.exit_code(), 3);
    }
}
