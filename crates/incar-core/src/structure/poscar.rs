use crate::common::elements::canonical_symbol;
use crate::domain::{IncarError, IncarResult, ParserResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const POSCAR_FILE_NAME: &str = "POSCAR";

const SPECIES_LINE_INDEX: usize = 5;
const COUNTS_LINE_INDEX: usize = 6;
const SEARCH_PREFIXES: [&str; 3] = ["", "..", "../.."];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoscarSpecies {
    /// Symbol and atom count per species, in file order.
    pub species: Vec<(String, usize)>,
    pub total_atoms: usize,
}

impl PoscarSpecies {
    /// Each symbol repeated by its count, the form the element helpers take.
    pub fn expanded_symbols(&self) -> Vec<String> {
        self.species
            .iter()
            .flat_map(|(symbol, count)| std::iter::repeat_n(symbol.clone(), *count))
            .collect()
    }
}

/// Reads the species (line 6) and count (line 7) lines of a VASP5 POSCAR.
pub fn read_poscar_species(source: &str) -> ParserResult<PoscarSpecies> {
    let lines = source.lines().collect::<Vec<_>>();
    let (Some(species_line), Some(counts_line)) = (
        lines.get(SPECIES_LINE_INDEX),
        lines.get(COUNTS_LINE_INDEX),
    ) else {
        return Err(species_error(format!(
            "POSCAR has {} lines; expected species and counts on lines {} and {}",
            lines.len(),
            SPECIES_LINE_INDEX + 1,
            COUNTS_LINE_INDEX + 1
        )));
    };

    let symbols = species_line.split_whitespace().collect::<Vec<_>>();
    if symbols.is_empty() {
        return Err(species_error("POSCAR species line is empty"));
    }
    if symbols
        .iter()
        .any(|symbol| !symbol.chars().all(|c| c.is_ascii_alphabetic()))
    {
        return Err(species_error(format!(
            "line {} is not an element symbol line: '{}' (VASP4 files are not supported)",
            SPECIES_LINE_INDEX + 1,
            species_line.trim()
        )));
    }

    let counts = counts_line
        .split_whitespace()
        .map(|token| match token.parse::<usize>() {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(species_error(format!(
                "invalid atom count '{}' on line {}",
                token,
                COUNTS_LINE_INDEX + 1
            ))),
        })
        .collect::<ParserResult<Vec<_>>>()?;

    if counts.len() != symbols.len() {
        return Err(species_error(format!(
            "{} element symbols but {} atom counts",
            symbols.len(),
            counts.len()
        )));
    }

    let species = symbols
        .into_iter()
        .map(canonical_symbol)
        .zip(counts)
        .collect::<Vec<_>>();
    let total_atoms = species.iter().map(|(_, count)| count).sum();
    Ok(PoscarSpecies {
        species,
        total_atoms,
    })
}

pub fn read_poscar_file(path: &Path) -> IncarResult<PoscarSpecies> {
    let source = fs::read_to_string(path).map_err(|source| {
        IncarError::io_system(
            "IO.POSCAR_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    read_poscar_species(&source)
}

/// First of `POSCAR`, `../POSCAR`, `../../POSCAR` that exists under `dir`.
pub fn locate_poscar(dir: &Path) -> Option<PathBuf> {
    SEARCH_PREFIXES
        .iter()
        .map(|prefix| dir.join(prefix).join(POSCAR_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn species_error(message: impl Into<String>) -> IncarError {
    IncarError::input_validation("INPUT.POSCAR_SPECIES", message)
}
