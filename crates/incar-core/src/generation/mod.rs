//! Request-to-document pipeline over the loaded tables.

pub mod merge;
pub mod resolver;

pub use merge::{
    CustomOverrides, MergeOutcome, merge_parameters, normalize_custom_overrides,
    select_standard_sections,
};
pub use resolver::{SelectionResolution, TierEntry, TierGroups, resolve_selections};

use crate::common::tables::ParameterTables;
use crate::domain::{GenerationRequest, ResolutionDiagnostics, ResolvedDocument};
use crate::incar::render_document;
use tracing::{debug, warn};

/// Resolves, merges and renders one request. Unknown task or section names and
/// blank custom keys are reported in the diagnostics instead of failing.
pub fn generate_document(tables: &ParameterTables, request: &GenerationRequest) -> ResolvedDocument {
    let custom = normalize_custom_overrides(&request.custom_overrides);
    let (sections, unresolved_sections) =
        select_standard_sections(&tables.standard, &request.selected_standard_sections);
    for section in &unresolved_sections {
        warn!(section = section.as_str(), "skipping unknown standard section");
    }

    let selection = resolve_selections(&tables.registry, &request.selected_task_names);
    let outcome = merge_parameters(&selection, &sections, &custom.params);
    let content = render_document(&outcome.groups);

    debug!(
        tasks = selection.resolved_names.len(),
        sections = sections.len(),
        custom = custom.params.len(),
        total_count = outcome.total_count,
        "generated INCAR document"
    );

    ResolvedDocument {
        content,
        effective: outcome.effective,
        total_count: outcome.total_count,
        resolved_tasks: selection.resolved_names,
        diagnostics: ResolutionDiagnostics {
            unresolved_tasks: selection.unresolved_names,
            unresolved_sections,
            dropped_custom_keys: custom.dropped_keys,
        },
    }
}
