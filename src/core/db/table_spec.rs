/// Table metadata driving one editor tab.
use super::ident::Ident;
use crate::core::{CrudError, Result};
use std::collections::HashSet;

/// An editable column and the label shown next to its input.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: Ident,
    pub label: String,
}

/// Immutable description of one editable table.
///
/// The primary key is displayed in the grid but never edited, so it is
/// never part of `columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    title: String,
    name: Ident,
    primary_key: Ident,
    columns: Vec<ColumnSpec>,
}

impl TableSpec {
    /// Builds a spec, rejecting an empty column list, a primary key listed
    /// as an editable column, and duplicate columns.
    pub fn new(
        title: impl Into<String>,
        name: impl Into<Ident>,
        primary_key: impl Into<Ident>,
        columns: Vec<(String, String)>,
    ) -> Result<Self> {
        let name = name.into();
        let primary_key = primary_key.into();

        if columns.is_empty() {
            return Err(CrudError::Config(format!(
                "table '{}' declares no editable columns",
                name
            )));
        }

        let mut seen = HashSet::new();
        let mut specs = Vec::with_capacity(columns.len());
        for (column, label) in columns {
            if column == primary_key.as_str() {
                return Err(CrudError::Config(format!(
                    "table '{}': primary key '{}' cannot be an editable column",
                    name, primary_key
                )));
            }
            if !seen.insert(column.clone()) {
                return Err(CrudError::Config(format!(
                    "table '{}': column '{}' is declared twice",
                    name, column
                )));
            }
            specs.push(ColumnSpec {
                name: Ident::new(column),
                label,
            });
        }

        Ok(TableSpec {
            title: title.into(),
            name,
            primary_key,
            columns: specs,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn primary_key(&self) -> &Ident {
        &self.primary_key
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Primary key followed by the declared columns, as shown in the grid.
    pub fn headers(&self) -> Vec<String> {
        std::iter::once(self.primary_key.to_string())
            .chain(self.columns.iter().map(|c| c.name.to_string()))
            .collect()
    }
}
