pub mod errors;

pub use errors::{IncarError, IncarErrorCategory, IncarResult, ParserResult, TableResult};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

/// Key of the synthetic first line of every generated document.
pub const SYSTEM_KEY: &str = "SYSTEM";
pub const SYSTEM_VALUE: &str = "Generated By Q_robot";
/// Fixed file name of the downloadable artifact.
pub const INCAR_FILE_NAME: &str = "INCAR";

/// Unique-keyed parameter mapping. Keys and values are trimmed on insert and
/// iteration is always in lexicographic key order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ParameterSet {
    entries: BTreeMap<String, String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` and stores nothing when the trimmed key is empty.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> bool {
        let key = key.as_ref().trim();
        if key.is_empty() {
            return false;
        }
        self.entries
            .insert(key.to_string(), value.as_ref().trim().to_string());
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key.trim()).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Later values overwrite earlier ones.
    pub fn extend_from(&mut self, other: &ParameterSet) {
        for (key, value) in other.iter() {
            self.entries.insert(key.to_string(), value.to_string());
        }
    }

    /// Keeps only the entries whose key passes `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(&str) -> bool) -> ParameterSet {
        ParameterSet {
            entries: self
                .entries
                .iter()
                .filter(|(key, _)| keep(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterSet
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = ParameterSet::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl<'de> Deserialize<'de> for ParameterSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut set = ParameterSet::new();
        for (key, value) in raw {
            let text = render_scalar(&value).ok_or_else(|| {
                D::Error::custom(format!(
                    "parameter '{}' must be a string, number or boolean, got {}",
                    key, value
                ))
            })?;
            if !set.insert(&key, text) {
                return Err(D::Error::custom("parameter key must not be empty"));
            }
        }
        Ok(set)
    }
}

/// Textual rendering of a scalar table value. Booleans follow the `True`/`False`
/// spelling of the preset tables.
pub fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskCategory {
    Functional,
    Correction,
    Model,
    System,
    Tasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionTier {
    /// Entries of the `Tasks` category.
    Task,
    /// Functional, Correction, Model and System entries.
    Other,
}

impl TaskCategory {
    /// Display order, which is also precedence order for shared keys.
    pub const ALL: [TaskCategory; 5] = [
        Self::Functional,
        Self::Correction,
        Self::Model,
        Self::System,
        Self::Tasks,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Functional => "Functional",
            Self::Correction => "Correction",
            Self::Model => "Model",
            Self::System => "System",
            Self::Tasks => "Tasks",
        }
    }

    pub const fn tier(self) -> SelectionTier {
        match self {
            Self::Tasks => SelectionTier::Task,
            Self::Functional | Self::Correction | Self::Model | Self::System => {
                SelectionTier::Other
            }
        }
    }

    pub fn from_name(name: &str) -> TableResult<Self> {
        let normalized = name.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| {
                IncarError::malformed_table(
                    "TABLE.CATEGORY_NAME",
                    format!(
                        "unknown task category '{}'; expected one of Functional, Correction, Model, System, Tasks",
                        normalized
                    ),
                )
            })
    }
}

impl Display for TaskCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEntry {
    pub id: String,
    pub display_name: String,
    pub category: TaskCategory,
    pub params: ParameterSet,
}

impl TaskEntry {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        category: TaskCategory,
        params: ParameterSet,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category,
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandardSection {
    pub name: String,
    pub params: ParameterSet,
}

/// Per-call input. Deserializes from the request body shape
/// `{ "tasks": [..], "custom_params": {..}, "include_sections": {..} }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct GenerationRequest {
    #[serde(rename = "tasks", default)]
    pub selected_task_names: Vec<String>,
    #[serde(
        rename = "include_sections",
        default,
        deserialize_with = "deserialize_section_selection"
    )]
    pub selected_standard_sections: BTreeSet<String>,
    /// Raw overrides as submitted; blank keys are dropped during merge.
    #[serde(
        rename = "custom_params",
        default,
        deserialize_with = "deserialize_raw_overrides"
    )]
    pub custom_overrides: Vec<(String, String)>,
}

impl GenerationRequest {
    pub fn with_task(mut self, name: impl Into<String>) -> Self {
        self.selected_task_names.push(name.into());
        self
    }

    pub fn with_section(mut self, name: impl Into<String>) -> Self {
        self.selected_standard_sections.insert(name.into());
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_overrides.push((key.into(), value.into()));
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SectionSelection {
    Flags(BTreeMap<String, bool>),
    Names(Vec<String>),
}

fn deserialize_section_selection<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match SectionSelection::deserialize(deserializer)? {
        SectionSelection::Flags(flags) => flags
            .into_iter()
            .filter_map(|(name, include)| include.then_some(name))
            .collect(),
        SectionSelection::Names(names) => names.into_iter().collect(),
    })
}

fn deserialize_raw_overrides<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            render_scalar(&value)
                .map(|text| (key.clone(), text))
                .ok_or_else(|| {
                    D::Error::custom(format!(
                        "custom parameter '{}' must be a string, number or boolean",
                        key
                    ))
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSource {
    Standard { section: String },
    Selection {
        display_name: String,
        category: TaskCategory,
    },
    Custom,
}

/// One provenance group of the rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentGroup {
    pub source: GroupSource,
    pub params: ParameterSet,
}

impl DocumentGroup {
    pub fn header(&self) -> String {
        match &self.source {
            GroupSource::Standard { section } => {
                format!("# Standard Parameters - {}", title_case_words(section))
            }
            GroupSource::Selection { display_name, .. } => format!("# Task: {}", display_name),
            GroupSource::Custom => "# Custom Parameters".to_string(),
        }
    }
}

/// Side channel for lenient resolution; never changes the document text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResolutionDiagnostics {
    pub unresolved_tasks: Vec<String>,
    pub unresolved_sections: Vec<String>,
    pub dropped_custom_keys: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDocument {
    #[serde(rename = "incar_content")]
    pub content: String,
    #[serde(rename = "params")]
    pub effective: ParameterSet,
    #[serde(rename = "param_count")]
    pub total_count: usize,
    pub resolved_tasks: Vec<String>,
    #[serde(flatten)]
    pub diagnostics: ResolutionDiagnostics,
}

/// Underscores become spaces and every letter that follows a non-letter is
/// upper-cased, the rest lower-cased: `band_structure` -> `Band Structure`,
/// `dos_2d` -> `Dos 2D`.
pub fn title_case_words(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if previous_is_letter {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            titled.push(c);
            previous_is_letter = false;
        }
    }
    titled
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DocumentGroup, GenerationRequest, GroupSource, ParameterSet, SelectionTier, TaskCategory,
        title_case_words,
    };

    #[test]
    fn parameter_set_trims_and_drops_blank_keys() {
        let mut set = ParameterSet::new();
        assert!(set.insert("  ENCUT ", " 520 "));
        assert!(!set.insert("   ", "1"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("ENCUT"), Some("520"));
        assert!(set.contains_key(" ENCUT"));
    }

    #[test]
    fn parameter_set_iterates_in_lexicographic_order() {
        let set: ParameterSet = [("NSW", "0"), ("ISTART", "1"), ("EDIFF", "1E-6")]
            .into_iter()
            .collect();
        let keys = set.keys().collect::<Vec<_>>();
        assert_eq!(keys, ["EDIFF", "ISTART", "NSW"]);
    }

    #[test]
    fn parameter_set_deserializes_scalars_to_text() {
        let set: ParameterSet =
            serde_json::from_str(r#"{"ISTART": 1, "SIGMA": 0.05, "LWAVE": false, "PREC": " Accurate "}"#)
                .expect("scalar table should parse");
        assert_eq!(set.get("ISTART"), Some("1"));
        assert_eq!(set.get("SIGMA"), Some("0.05"));
        assert_eq!(set.get("LWAVE"), Some("False"));
        assert_eq!(set.get("PREC"), Some("Accurate"));
    }

    #[test]
    fn parameter_set_rejects_structured_values() {
        let error = serde_json::from_str::<ParameterSet>(r#"{"MAGMOM": [1, 2]}"#)
            .expect_err("arrays are not scalar parameter values");
        assert!(error.to_string().contains("MAGMOM"));
    }

    #[test]
    fn category_names_resolve_case_insensitively_and_reject_unknown() {
        assert_eq!(
            TaskCategory::from_name("model").expect("known category"),
            TaskCategory::Model
        );
        let error = TaskCategory::from_name("Extras").expect_err("unknown category");
        assert_eq!(error.placeholder(), "TABLE.CATEGORY_NAME");
    }

    #[test]
    fn category_tiers_and_precedence_follow_display_order() {
        assert_eq!(TaskCategory::Tasks.tier(), SelectionTier::Task);
        assert_eq!(TaskCategory::System.tier(), SelectionTier::Other);
        assert!(TaskCategory::Functional < TaskCategory::Correction);
        assert!(TaskCategory::System < TaskCategory::Tasks);
    }

    #[test]
    fn request_body_accepts_section_flags_and_scalar_overrides() {
        let request: GenerationRequest = serde_json::from_str(
            r#"{
                "tasks": ["Static", "PBE"],
                "include_sections": {"ncore": true, "write": false},
                "custom_params": {"NSW": "5", "ENCUT": 520}
            }"#,
        )
        .expect("request body should parse");

        assert_eq!(request.selected_task_names, ["Static", "PBE"]);
        assert_eq!(
            request.selected_standard_sections.iter().collect::<Vec<_>>(),
            ["ncore"]
        );
        assert_eq!(
            request.custom_overrides,
            [
                ("ENCUT".to_string(), "520".to_string()),
                ("NSW".to_string(), "5".to_string())
            ]
        );
    }

    #[test]
    fn request_body_accepts_section_name_list() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"include_sections": ["lapack", "ncore"]}"#)
                .expect("section list should parse");
        assert_eq!(request.selected_standard_sections.len(), 2);
        assert!(request.selected_task_names.is_empty());
        assert!(request.custom_overrides.is_empty());
    }

    #[test]
    fn group_headers_name_their_source() {
        let standard = DocumentGroup {
            source: GroupSource::Standard {
                section: "electronic_steps".to_string(),
            },
            params: ParameterSet::new(),
        };
        let task = DocumentGroup {
            source: GroupSource::Selection {
                display_name: "Static".to_string(),
                category: TaskCategory::Tasks,
            },
            params: ParameterSet::new(),
        };
        let functional = DocumentGroup {
            source: GroupSource::Selection {
                display_name: "PBE".to_string(),
                category: TaskCategory::Functional,
            },
            params: ParameterSet::new(),
        };

        assert_eq!(
            standard.header(),
            "# Standard Parameters - Electronic Steps"
        );
        assert_eq!(task.header(), "# Task: Static");
        assert_eq!(functional.header(), "# Task: PBE");
    }

    #[test]
    fn title_case_handles_underscores_and_mixed_case() {
        assert_eq!(title_case_words("ncore"), "Ncore");
        assert_eq!(title_case_words("band_STRUCTURE"), "Band Structure");
        assert_eq!(title_case_words("dos_2d"), "Dos 2D");
        assert_eq!(title_case_words("charge-density"), "Charge-Density");
    }
}
