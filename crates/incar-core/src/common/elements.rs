//! Per-element property tables (Hubbard U, Hubbard J, initial magnetic moment)
//! and the INCAR lines derived from them for a list of species.

use crate::domain::{IncarError, ParameterSet, TableResult};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const LDAUL_KEY: &str = "LDAUL";
pub const LDAUU_KEY: &str = "LDAUU";
pub const LDAUJ_KEY: &str = "LDAUJ";
pub const MAGMOM_KEY: &str = "MAGMOM";

const LDAUL_APPLIED: i32 = 2;
const LDAUL_DISABLED: i32 = -1;
const DEFAULT_MAGNETIC_MOMENT: f64 = 0.0;
const LIST_SEPARATOR: &str = "  ";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ElementTables {
    #[serde(default)]
    hubbard_u: BTreeMap<String, f64>,
    #[serde(default)]
    hubbard_j: BTreeMap<String, f64>,
    #[serde(default)]
    magnetic_moment: BTreeMap<String, f64>,
}

impl ElementTables {
    pub fn from_json_str(source: &str, origin: &str) -> TableResult<Self> {
        let raw: ElementTables = serde_json::from_str(source).map_err(|error| {
            IncarError::malformed_table(
                "TABLE.ELEMENT_PARSE",
                format!("failed to parse {}: {}", origin, error),
            )
        })?;
        Ok(Self {
            hubbard_u: canonical_keys(raw.hubbard_u),
            hubbard_j: canonical_keys(raw.hubbard_j),
            magnetic_moment: canonical_keys(raw.magnetic_moment),
        })
    }

    pub fn hubbard_u(&self, symbol: &str) -> Option<f64> {
        self.hubbard_u.get(&canonical_symbol(symbol)).copied()
    }

    pub fn hubbard_j(&self, symbol: &str) -> Option<f64> {
        self.hubbard_j.get(&canonical_symbol(symbol)).copied()
    }

    pub fn magnetic_moment(&self, symbol: &str) -> Option<f64> {
        self.magnetic_moment.get(&canonical_symbol(symbol)).copied()
    }
}

fn canonical_keys(table: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    table
        .into_iter()
        .map(|(symbol, value)| (canonical_symbol(&symbol), value))
        .collect()
}

/// ` fe ` -> `Fe`.
pub fn canonical_symbol(symbol: &str) -> String {
    crate::domain::capitalize(symbol.trim())
}

/// Species with their multiplicity, in order of first appearance.
pub fn count_elements<S: AsRef<str>>(symbols: &[S]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for symbol in symbols {
        let symbol = canonical_symbol(symbol.as_ref());
        if symbol.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(known, _)| *known == symbol) {
            Some((_, count)) => *count += 1,
            None => counts.push((symbol, 1)),
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DftUParameters {
    pub ldaul: String,
    pub ldauu: String,
    pub ldauj: String,
}

impl DftUParameters {
    pub fn to_parameter_set(&self) -> ParameterSet {
        [
            (LDAUL_KEY, self.ldaul.as_str()),
            (LDAUU_KEY, self.ldauu.as_str()),
            (LDAUJ_KEY, self.ldauj.as_str()),
        ]
        .into_iter()
        .collect()
    }
}

/// One LDAUL/LDAUU/LDAUJ column per unique species. Species without a U value
/// get `-1 0 0`.
pub fn dft_u_parameters<S: AsRef<str>>(tables: &ElementTables, symbols: &[S]) -> DftUParameters {
    let mut ldaul = Vec::new();
    let mut ldauu = Vec::new();
    let mut ldauj = Vec::new();

    for (symbol, _) in count_elements(symbols) {
        match tables.hubbard_u(&symbol) {
            Some(u) => {
                ldaul.push(LDAUL_APPLIED.to_string());
                ldauu.push(format_table_number(u));
                ldauj.push(
                    tables
                        .hubbard_j(&symbol)
                        .map_or_else(|| "0".to_string(), format_table_number),
                );
            }
            None => {
                ldaul.push(LDAUL_DISABLED.to_string());
                ldauu.push("0".to_string());
                ldauj.push("0".to_string());
            }
        }
    }

    DftUParameters {
        ldaul: ldaul.join(LIST_SEPARATOR),
        ldauu: ldauu.join(LIST_SEPARATOR),
        ldauj: ldauj.join(LIST_SEPARATOR),
    }
}

/// `count*moment` per species, e.g. `2*5.0  3*0.0`.
pub fn magmom(tables: &ElementTables, counts: &[(String, usize)]) -> String {
    counts
        .iter()
        .map(|(symbol, count)| {
            let moment = tables
                .magnetic_moment(symbol)
                .unwrap_or(DEFAULT_MAGNETIC_MOMENT);
            format!("{}*{}", count, format_table_number(moment))
        })
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Integral values keep one decimal (`5.0`), others use the shortest
/// round-trip form (`3.32`).
pub fn format_table_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1.0e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
