//! Columnar table and the record-to-column builder.

use crate::error::{Error, Result};
use crate::record::Record;
use crate::schema::{Field, Schema};
use crate::value::{DataType, Scalar};

/// An in-memory columnar table.
///
/// Invariant: `columns.len() == schema.len()` and every column holds the
/// same number of rows. Cell values conform to their field's type, with
/// `Null` permitted only in nullable columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    columns: Vec<Vec<Scalar>>,
}

impl Table {
    pub fn new(schema: Schema, columns: Vec<Vec<Scalar>>) -> Result<Self> {
        if schema.len() != columns.len() {
            return Err(Error::SchemaMismatch(format!(
                "schema has {} fields but {} columns were provided",
                schema.len(),
                columns.len()
            )));
        }
        if let Some(first) = columns.first() {
            let rows = first.len();
            for (i, col) in columns.iter().enumerate() {
                if col.len() != rows {
                    return Err(Error::SchemaMismatch(format!(
                        "column \"{}\" has {} rows, expected {}",
                        schema.fields()[i].name,
                        col.len(),
                        rows
                    )));
                }
            }
        }
        Ok(Table { schema, columns })
    }

    pub fn empty(schema: Schema) -> Self {
        let columns = vec![Vec::new(); schema.len()];
        Table { schema, columns }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&[Scalar]> {
        self.schema
            .index_of(name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn column_at(&self, index: usize) -> &[Scalar] {
        &self.columns[index]
    }

    /// Append another table's rows below this one's. Schemas must match
    /// exactly; this is how scanned batches are concatenated.
    pub fn vstack(&mut self, other: Table) -> Result<()> {
        if self.schema != other.schema {
            return Err(Error::SchemaMismatch(
                "cannot vstack tables with different schemas".into(),
            ));
        }
        for (dst, src) in self.columns.iter_mut().zip(other.columns) {
            dst.extend(src);
        }
        Ok(())
    }
}

/// Builds a table by appending records against a fixed schema.
///
/// Missing keys append null. Keys not in the schema are dropped by
/// default; in strict mode they fail with `SchemaMismatch`.
#[derive(Debug)]
pub struct TableBuilder {
    schema: Schema,
    strict: bool,
    columns: Vec<Vec<Scalar>>,
}

impl TableBuilder {
    pub fn new(schema: Schema, strict: bool) -> Self {
        let columns = vec![Vec::new(); schema.len()];
        TableBuilder {
            schema,
            strict,
            columns,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn append_record(&mut self, record: &Record) -> Result<()> {
        let mut row: Vec<Option<Scalar>> = vec![None; self.schema.len()];

        for (name, value) in record.iter() {
            match self.schema.index_of(name) {
                Some(i) => {
                    row[i] = Some(cast(value, &self.schema.fields()[i])?);
                }
                None if self.strict => {
                    return Err(Error::SchemaMismatch(format!(
                        "field \"{}\" is not in the schema",
                        name
                    )));
                }
                None => {} // relaxed mode: drop the value
            }
        }

        // Validate the whole row before touching any column, so a failed
        // append never leaves the columns at unequal lengths.
        for (i, cell) in row.iter().enumerate() {
            let field = &self.schema.fields()[i];
            if cell.is_none() && !field.nullable {
                return Err(Error::SchemaMismatch(format!(
                    "missing value for non-nullable field \"{}\"",
                    field.name
                )));
            }
        }

        for (i, cell) in row.into_iter().enumerate() {
            self.columns[i].push(cell.unwrap_or(Scalar::Null));
        }

        Ok(())
    }

    pub fn finish(self) -> Table {
        Table {
            schema: self.schema,
            columns: self.columns,
        }
    }
}

/// Cast a record value into a column's type, following the widening
/// lattice: exact matches pass, anything casts into a string column by
/// its JSON lexical form, everything else is a mismatch.
fn cast(value: &Scalar, field: &Field) -> Result<Scalar> {
    match value {
        Scalar::Null => {
            if field.nullable {
                Ok(Scalar::Null)
            } else {
                Err(Error::SchemaMismatch(format!(
                    "null value in non-nullable field \"{}\"",
                    field.name
                )))
            }
        }
        v if v.dtype() == field.dtype => Ok(v.clone()),
        v if field.dtype == DataType::String => Ok(Scalar::String(v.lexical_form())),
        v => Err(Error::SchemaMismatch(format!(
            "field \"{}\": cannot store {} value in {} column",
            field.name,
            v.dtype().as_str(),
            field.dtype.as_str()
        ))),
    }
}
