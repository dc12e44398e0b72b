//! Labelled overlap tables and named collections of them

use crate::error::*;
use ndarray::{Array2, ArrayView1};
use std::collections::{BTreeMap, HashMap};

/// Cell value marking axonal (presynaptic) arborization in an anatomical column
pub const AXONAL: f64 = 2.0;
/// Cell value marking dendritic (postsynaptic) arborization in an anatomical column
pub const DENDRITIC: f64 = 1.0;

/// A matrix indexed by unit labels on both axes.
///
/// Region tables have population units as rows and anatomical columns as
/// columns. Pathway tables have presynaptic units as rows and postsynaptic
/// units as columns, with a non-zero cell for every connected pair.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapTable {
    name: String,
    rows: Vec<String>,
    columns: Vec<String>,
    row_index: HashMap<String, usize>,
    column_index: HashMap<String, usize>,
    data: Array2<f64>,
}

impl OverlapTable {
    /// Create a table, checking that `data` is `rows x columns`
    pub fn new(
        name: impl Into<String>,
        rows: Vec<String>,
        columns: Vec<String>,
        data: Array2<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let (r, c) = data.dim();
        if r != rows.len() || c != columns.len() {
            return Err(ConnectomeError::ShapeMismatch {
                table: name,
                expected_rows: rows.len(),
                expected_cols: columns.len(),
                rows: r,
                cols: c,
            });
        }
        Ok(Self::from_parts(name, rows, columns, data))
    }

    /// Create a table whose cell `(r, c)` is `f(r, c)`
    pub fn from_fn<F>(name: impl Into<String>, rows: Vec<String>, columns: Vec<String>, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        let data = Array2::from_shape_fn((rows.len(), columns.len()), |(r, c)| f(r, c));
        Self::from_parts(name.into(), rows, columns, data)
    }

    fn from_parts(name: String, rows: Vec<String>, columns: Vec<String>, data: Array2<f64>) -> Self {
        let row_index = rows.iter().enumerate().map(|(i, l)| (l.clone(), i)).collect();
        let column_index = columns.iter().enumerate().map(|(i, l)| (l.clone(), i)).collect();
        Self {
            name,
            rows,
            columns,
            row_index,
            column_index,
            data,
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row labels
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Column labels
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Raw data
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Position of a row label
    pub fn row_position(&self, unit: &str) -> Result<usize> {
        self.row_index
            .get(unit)
            .copied()
            .ok_or_else(|| ConnectomeError::unit_not_found(&self.name, unit))
    }

    /// Position of a column label
    pub fn column_position(&self, label: &str) -> Result<usize> {
        self.column_index
            .get(label)
            .copied()
            .ok_or_else(|| ConnectomeError::unit_not_found(&self.name, label))
    }

    /// Row of one unit
    pub fn row(&self, unit: &str) -> Result<ArrayView1<'_, f64>> {
        Ok(self.data.row(self.row_position(unit)?))
    }

    /// Column of one label
    pub fn column(&self, label: &str) -> Result<ArrayView1<'_, f64>> {
        Ok(self.data.column(self.column_position(label)?))
    }

    /// Cell at `(row, column)`
    pub fn get(&self, row: &str, column: &str) -> Result<f64> {
        Ok(self.data[[self.row_position(row)?, self.column_position(column)?]])
    }

    /// Row labels whose value in `column` equals `value`
    pub fn rows_where(&self, column: &str, value: f64) -> Result<Vec<&str>> {
        let col = self.column(column)?;
        Ok(self
            .rows
            .iter()
            .zip(col.iter())
            .filter(|&(_, &v)| v == value)
            .map(|(label, _)| label.as_str())
            .collect())
    }

    /// Every `(row, column)` pair with a non-zero cell, row by row
    pub fn nonzero_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.data
            .indexed_iter()
            .filter(|&(_, &v)| v != 0.0)
            .map(move |((r, c), _)| (self.rows[r].as_str(), self.columns[c].as_str()))
    }
}

/// Named collection of overlap tables
#[derive(Debug, Clone, Default)]
pub struct Atlas {
    tables: BTreeMap<String, OverlapTable>,
}

impl Atlas {
    /// Create an empty atlas
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table under its own name
    pub fn insert(&mut self, table: OverlapTable) {
        self.tables.insert(table.name().to_string(), table);
    }

    /// Add a table, builder style
    pub fn with_table(mut self, table: OverlapTable) -> Self {
        self.insert(table);
        self
    }

    /// Look up a table by name
    pub fn get(&self, name: &str) -> Result<&OverlapTable> {
        self.tables
            .get(name)
            .ok_or_else(|| ConnectomeError::table_not_found(name))
    }

    /// Table names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the atlas has no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// `prefix0 .. prefix{count-1}`
pub fn unit_labels(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}{}", prefix, i)).collect()
}
