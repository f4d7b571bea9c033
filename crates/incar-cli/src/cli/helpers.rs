use super::{CliError, GlobalArgs};
use anyhow::Context;
use incar_core::common::tables::{ParameterTables, TableSources};
use incar_core::domain::{GenerationRequest, IncarError, ParameterSet};
use incar_core::structure::{PoscarSpecies, locate_poscar, read_poscar_file};
use std::fs;
use std::path::{Path, PathBuf};

const TASK_CONFIG_ENV: &str = "INCAR_TASK_CONFIG";

pub(super) fn table_sources(global: &GlobalArgs) -> TableSources {
    let categories = global.task_config.clone().or_else(|| {
        std::env::var_os(TASK_CONFIG_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    });
    TableSources {
        standard: global.standard_table.clone(),
        tasks: global.task_table.clone(),
        categories,
        elements: global.element_table.clone(),
    }
}

pub(super) fn load_tables(global: &GlobalArgs) -> Result<ParameterTables, CliError> {
    ParameterTables::load(&table_sources(global)).map_err(CliError::Compute)
}

/// Request body file, or an empty request when no path is given.
pub(super) fn load_request(path: Option<&Path>) -> Result<GenerationRequest, CliError> {
    let Some(path) = path else {
        return Ok(GenerationRequest::default());
    };
    let content = fs::read_to_string(path).map_err(|source| {
        CliError::Compute(IncarError::io_system(
            "IO.REQUEST_READ",
            format!("failed to read request file '{}': {}", path.display(), source),
        ))
    })?;
    serde_json::from_str(&content).map_err(|source| {
        CliError::Compute(IncarError::input_validation(
            "INPUT.REQUEST_JSON",
            format!("invalid request file '{}': {}", path.display(), source),
        ))
    })
}

/// `KEY=VALUE`; split on the first `=`.
pub(super) fn parse_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

/// The explicit path, else the first POSCAR found from the working directory.
pub(super) fn resolve_poscar(explicit: Option<PathBuf>) -> Result<PoscarSpecies, CliError> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let working_dir = std::env::current_dir().map_err(|source| {
                CliError::Compute(IncarError::io_system(
                    "IO.CLI_CURRENT_DIR",
                    format!("failed to read current working directory: {}", source),
                ))
            })?;
            locate_poscar(&working_dir).ok_or_else(|| {
                CliError::Compute(IncarError::input_validation(
                    "INPUT.POSCAR_MISSING",
                    format!(
                        "no POSCAR found in '{}' or its two parent directories",
                        working_dir.display()
                    ),
                ))
            })?
        }
    };
    read_poscar_file(&path).map_err(CliError::Compute)
}

pub(super) fn print_parameter_lines<'a>(lines: impl IntoIterator<Item = (&'a str, &'a str)>) {
    for (key, value) in lines {
        println!("{}", incar_core::incar::format_line(key, value));
    }
}

pub(super) fn print_parameter_set(params: &ParameterSet) {
    print_parameter_lines(params.iter());
}

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?;
    println!("{}", rendered);
    Ok(())
}
