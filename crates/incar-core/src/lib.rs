//! Core of the INCAR generator: lookup tables, task registry, selection
//! resolution, parameter merging and document rendering.

pub mod common;
pub mod domain;
pub mod generation;
pub mod incar;
pub mod registry;
pub mod structure;

pub use common::tables::{ParameterTables, TableSources};
pub use domain::{GenerationRequest, IncarError, IncarErrorCategory, IncarResult, ResolvedDocument};
pub use generation::generate_document;
