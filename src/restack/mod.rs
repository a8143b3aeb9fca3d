//! Consolidation of per-timestep raw files into one array per variable and year.

pub mod accumulation;
pub mod plain;
pub mod wind;

use crate::{catalog::Catalog, io::RawReader, io::Workers, parameters::VariableTable};

/// Determines which restacker processes a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableClass {
    /// Reported cumulatively since the last reinitialization
    Accumulation,
    /// Grid-relative wind component
    Wind,
    Plain,
}

impl VariableClass {
    pub fn of(variable: &str, table: &VariableTable) -> Self {
        if table.accumulation.iter().any(|v| v == variable) {
            VariableClass::Accumulation
        } else if table.wind.iter().any(|v| v == variable) {
            VariableClass::Wind
        } else {
            VariableClass::Plain
        }
    }
}

/// Shared inputs of every restacker
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub catalog: &'a Catalog,
    pub reader: &'a dyn RawReader,
    pub workers: &'a Workers,
}
