use super::CliError;
use super::helpers::*;
use incar_core::common::elements::{
    LDAUJ_KEY, LDAUL_KEY, LDAUU_KEY, MAGMOM_KEY, count_elements, dft_u_parameters, magmom,
};
use incar_core::common::tables::ParameterTables;
use incar_core::domain::{DocumentGroup, GroupSource, IncarError};
use incar_core::generation::generate_document;
use incar_core::incar::write_incar_artifact;
use incar_core::structure::{IMAGES_KEY, count_neb_images};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Offered as System selections, so left out of the standard listing.
const SYSTEM_SELECTION_SECTIONS: [&str; 3] = ["lapack", "ncore", "write"];

#[derive(clap::Args)]
pub(super) struct GenerateArgs {
    /// Task to include, by display name (repeatable)
    #[arg(long = "task", value_name = "NAME")]
    tasks: Vec<String>,

    /// Standard section to include (repeatable)
    #[arg(long = "section", value_name = "NAME")]
    sections: Vec<String>,

    /// Custom parameter override (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    overrides: Vec<(String, String)>,

    /// Request body JSON; command-line selections are appended to it
    #[arg(long, value_name = "FILE")]
    request: Option<PathBuf>,

    /// Also write the document to DIR/INCAR
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Print the JSON response instead of the document
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ListingArgs {
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct TaskParamsArgs {
    /// Task display name
    #[arg(value_name = "NAME")]
    name: String,

    /// Print JSON instead of INCAR lines
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct PoscarArgs {
    /// POSCAR path; searched from the working directory when omitted
    #[arg(long)]
    poscar: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct NebImagesArgs {
    /// Directory holding the 00, 01, ... image folders
    #[arg(value_name = "DIR", default_value = ".")]
    dir: PathBuf,
}

#[derive(Serialize)]
struct CategoryListing<'a> {
    category: &'a str,
    tasks: Vec<&'a str>,
}

pub(super) fn run_generate_command(
    tables: &ParameterTables,
    args: GenerateArgs,
) -> Result<i32, CliError> {
    let mut request = load_request(args.request.as_deref())?;
    request.selected_task_names.extend(args.tasks);
    request.selected_standard_sections.extend(args.sections);
    request.custom_overrides.extend(args.overrides);

    let document = generate_document(tables, &request);

    if let Some(dir) = &args.output {
        let path = write_incar_artifact(dir, &document.content)?;
        info!(path = %path.display(), "wrote INCAR");
    }

    if args.json {
        print_json(&document)?;
    } else {
        println!("{}", document.content);
    }
    Ok(0)
}

pub(super) fn run_categories_command(
    tables: &ParameterTables,
    args: ListingArgs,
) -> Result<i32, CliError> {
    let listing = tables.registry.entries_by_category();

    if args.json {
        let listing = listing
            .iter()
            .map(|(category, entries)| CategoryListing {
                category: category.as_str(),
                tasks: entries
                    .iter()
                    .map(|entry| entry.display_name.as_str())
                    .collect(),
            })
            .collect::<Vec<_>>();
        print_json(&listing)?;
        return Ok(0);
    }

    for (category, entries) in listing {
        println!("{}:", category);
        for entry in entries {
            println!("  {}", entry.display_name);
        }
    }
    Ok(0)
}

pub(super) fn run_task_params_command(
    tables: &ParameterTables,
    args: TaskParamsArgs,
) -> Result<i32, CliError> {
    let Some(entry) = tables.registry.lookup(&args.name) else {
        return Err(CliError::Compute(IncarError::input_validation(
            "INPUT.TASK_NAME",
            format!("Invalid task: {}", args.name),
        )));
    };

    if args.json {
        print_json(&entry.params)?;
    } else {
        print_parameter_set(&entry.params);
    }
    Ok(0)
}

pub(super) fn run_standard_command(
    tables: &ParameterTables,
    args: ListingArgs,
) -> Result<i32, CliError> {
    let listed = || {
        tables
            .standard
            .sections()
            .filter(|section| !SYSTEM_SELECTION_SECTIONS.contains(&section.name.as_str()))
    };

    if args.json {
        let sections = listed()
            .map(|section| (section.name.as_str(), &section.params))
            .collect::<BTreeMap<_, _>>();
        print_json(&sections)?;
        return Ok(0);
    }

    let mut first = true;
    for section in listed() {
        if !first {
            println!();
        }
        first = false;
        let group = DocumentGroup {
            source: GroupSource::Standard {
                section: section.name.clone(),
            },
            params: section.params.clone(),
        };
        println!("{}", group.header());
        print_parameter_set(&section.params);
    }
    Ok(0)
}

pub(super) fn run_dftu_command(tables: &ParameterTables, args: PoscarArgs) -> Result<i32, CliError> {
    let species = resolve_poscar(args.poscar)?;
    let parameters = dft_u_parameters(&tables.elements, &species.expanded_symbols());
    print_parameter_lines([
        (LDAUL_KEY, parameters.ldaul.as_str()),
        (LDAUU_KEY, parameters.ldauu.as_str()),
        (LDAUJ_KEY, parameters.ldauj.as_str()),
    ]);
    Ok(0)
}

pub(super) fn run_magmom_command(
    tables: &ParameterTables,
    args: PoscarArgs,
) -> Result<i32, CliError> {
    let species = resolve_poscar(args.poscar)?;
    let counts = count_elements(&species.expanded_symbols());
    let value = magmom(&tables.elements, &counts);
    print_parameter_lines([(MAGMOM_KEY, value.as_str())]);
    Ok(0)
}

pub(super) fn run_neb_images_command(args: NebImagesArgs) -> Result<i32, CliError> {
    let images = count_neb_images(&args.dir)?.to_string();
    print_parameter_lines([(IMAGES_KEY, images.as_str())]);
    Ok(0)
}
