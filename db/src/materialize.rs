//! Result cursor to [`Row`] conversion.

use std::sync::Arc;

use dynamic_db_core::{RowShape, Value};

use crate::error::{DynamicDbError, Result};
use crate::executor::RowSink;
use crate::row::{Row, RowType};
use crate::row_cache::{RowTypeCache, RowTypeKey};

/// A [`RowSink`] that resolves the cursor's row type on `begin` and
/// materializes every row against it.
///
/// Columns are bound to fields by name. The binding must be one-to-one: a
/// column without a field, or a field without a column, is a
/// [`DynamicDbError::FieldMapping`]. Each value is converted to its field's
/// kind with [`Value::coerce`]; values that cannot be, and nulls in
/// non-nullable fields, are mapping errors too.
pub struct RowMaterializer<'a> {
    cache: &'a RowTypeCache,
    connection_identity: &'a str,
    key: RowTypeKey<'a>,
    bound: Option<Binding>,
    rows: Vec<Row>,
}

struct Binding {
    row_type: Arc<RowType>,
    /// Field position of each cursor column.
    fields: Vec<usize>,
    columns: Vec<String>,
}

impl<'a> RowMaterializer<'a> {
    pub fn new(
        cache: &'a RowTypeCache,
        connection_identity: &'a str,
        key: RowTypeKey<'a>,
    ) -> Self {
        Self {
            cache,
            connection_identity,
            key,
            bound: None,
            rows: Vec::new(),
        }
    }

    /// The materialized rows, in cursor order.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl RowSink for RowMaterializer<'_> {
    fn begin(&mut self, shape: &RowShape) -> Result<()> {
        let row_type = self
            .cache
            .get_or_create(self.connection_identity, self.key, shape)?;

        let mut fields = Vec::with_capacity(shape.len());
        for column in &shape.columns {
            let position = row_type.position(&column.name).ok_or_else(|| {
                DynamicDbError::field_mapping(
                    row_type.name(),
                    &column.name,
                    "no field has this name",
                )
            })?;
            if fields.contains(&position) {
                return Err(DynamicDbError::field_mapping(
                    row_type.name(),
                    &column.name,
                    "the result names this column more than once",
                ));
            }
            fields.push(position);
        }
        if let Some(missing) = row_type
            .fields()
            .iter()
            .find(|field| !shape.names().any(|name| name == field.name))
        {
            return Err(DynamicDbError::field_mapping(
                row_type.name(),
                &missing.name,
                "the result has no column for this field",
            ));
        }

        self.bound = Some(Binding {
            row_type,
            fields,
            columns: shape.names().map(str::to_string).collect(),
        });
        Ok(())
    }

    fn row(&mut self, values: Vec<Value>) -> Result<()> {
        let Some(binding) = self.bound.as_ref() else {
            return Err(DynamicDbError::field_mapping(
                "(unbound)",
                "*",
                "a row arrived before the result shape",
            ));
        };
        let row_type = &binding.row_type;
        if values.len() != binding.fields.len() {
            return Err(DynamicDbError::field_mapping(
                row_type.name(),
                "*",
                format!(
                    "row has {} values for {} columns",
                    values.len(),
                    binding.fields.len()
                ),
            ));
        }

        let mut slots = vec![Value::Null; row_type.len()];
        for ((value, &position), column) in values
            .into_iter()
            .zip(&binding.fields)
            .zip(&binding.columns)
        {
            let field = &row_type.fields()[position];
            if value.is_null() {
                if !field.nullable {
                    return Err(DynamicDbError::field_mapping(
                        row_type.name(),
                        column,
                        "null value in a non-nullable field",
                    ));
                }
                continue;
            }
            let found = value.kind();
            slots[position] = value.coerce(field.kind).ok_or_else(|| {
                DynamicDbError::kind_mismatch(
                    row_type.name(),
                    column,
                    field.kind,
                    found.unwrap_or(field.kind),
                )
            })?;
        }

        self.rows.push(Row::new(Arc::clone(row_type), slots));
        Ok(())
    }
}
