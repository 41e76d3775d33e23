//! Bulk loading through array bindings.
//!
//! A batch is loaded by (re)creating the destination table from the record's
//! column definitions and then running one `INSERT ... VALUES (?, ...)` per
//! chunk, where every placeholder is bound to the chunk's column of values.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::{BindingKind, BindingValue, SnowflakeConnector, SnowflakeError, SnowflakeResult};

/// Column definition used to create the destination table and to type its binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub kind: BindingKind,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: &'static str, kind: BindingKind) -> Self {
        Column {
            name,
            sql_type,
            kind,
        }
    }
}

pub trait SnowflakeInsert {
    fn columns() -> &'static [Column];
    /// One value per entry of [columns](Self::columns), in the same order.
    fn insert_values(&self) -> Vec<BindingValue>;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Drop and recreate the table before loading
    #[default]
    Replace,
    /// Create the table only if it is missing
    Append,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertBatch {
    columns: &'static [Column],
    rows: Vec<Vec<BindingValue>>,
}

impl InsertBatch {
    pub fn from_records<T: SnowflakeInsert>(records: &[T]) -> Self {
        InsertBatch {
            columns: T::columns(),
            rows: records.iter().map(SnowflakeInsert::insert_values).collect(),
        }
    }

    pub fn columns(&self) -> &'static [Column] {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn create_table_sql(&self, table: &str, mode: LoadMode) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| format!("{} {}", column.name, column.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        match mode {
            LoadMode::Replace => format!("CREATE OR REPLACE TABLE {table} ({columns})"),
            LoadMode::Append => format!("CREATE TABLE IF NOT EXISTS {table} ({columns})"),
        }
    }

    pub fn insert_sql(&self, table: &str) -> String {
        let names = self
            .columns
            .iter()
            .map(|column| column.name)
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!("INSERT INTO {table} ({names}) VALUES ({placeholders})")
    }

    /// Transposes `rows` into one array of wire values per column.
    fn column_arrays(&self, rows: &[Vec<BindingValue>]) -> Vec<(BindingKind, Vec<Option<String>>)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let values = rows
                    .iter()
                    .map(|row| row.get(i).and_then(BindingValue::to_wire))
                    .collect();
                (column.kind, values)
            })
            .collect()
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertSummary {
    pub success: bool,
    pub chunks: usize,
    pub rows: usize,
}

pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl SnowflakeConnector {
    /// Creates `table` if needed and inserts every row of `batch`, `chunk_size` rows per statement.
    pub async fn insert_batch(
        &self,
        table: &str,
        batch: &InsertBatch,
        mode: LoadMode,
        chunk_size: NonZeroUsize,
    ) -> SnowflakeResult<InsertSummary> {
        if !is_valid_identifier(table) {
            return Err(SnowflakeError::InvalidIdentifier(table.to_owned()));
        }
        self.sql(batch.create_table_sql(table, mode)).select().await?;

        let insert = batch.insert_sql(table);
        let mut chunks = 0;
        let mut rows = 0;
        for chunk in batch.rows.chunks(chunk_size.get()) {
            let query = batch
                .column_arrays(chunk)
                .into_iter()
                .fold(self.sql(insert.as_str()), |query, (kind, values)| {
                    query.add_array_binding(kind, values)
                });
            let result = query.manipulate().await?;
            chunks += 1;
            rows += result.stats.rows_inserted;
            tracing::debug!(table, chunk = chunks, rows = chunk.len(), "inserted chunk");
        }
        Ok(InsertSummary {
            success: rows == batch.len(),
            chunks,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Payment {
        id: u32,
        note: Option<&'static str>,
    }

    impl SnowflakeInsert for Payment {
        fn columns() -> &'static [Column] {
            const COLUMNS: &[Column] = &[
                Column::new("id", "INTEGER", BindingKind::Fixed),
                Column::new("note", "VARCHAR(20)", BindingKind::Text),
            ];
            COLUMNS
        }

        fn insert_values(&self) -> Vec<BindingValue> {
            vec![self.id.into(), self.note.into()]
        }
    }

    fn batch() -> InsertBatch {
        InsertBatch::from_records(&[
            Payment { id: 1, note: Some("rent") },
            Payment { id: 2, note: None },
            Payment { id: 3, note: Some("coffee") },
        ])
    }

    #[test]
    fn statements() {
        let batch = batch();
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.create_table_sql("payments", LoadMode::Replace),
            "CREATE OR REPLACE TABLE payments (id INTEGER, note VARCHAR(20))"
        );
        assert_eq!(
            batch.create_table_sql("payments", LoadMode::Append),
            "CREATE TABLE IF NOT EXISTS payments (id INTEGER, note VARCHAR(20))"
        );
        assert_eq!(
            batch.insert_sql("payments"),
            "INSERT INTO payments (id, note) VALUES (?, ?)"
        );
    }

    #[test]
    fn transposes_rows_into_column_arrays() {
        let batch = batch();
        let arrays = batch.column_arrays(&batch.rows[1..]);
        assert_eq!(
            arrays,
            vec![
                (BindingKind::Fixed, vec![Some("2".to_owned()), Some("3".to_owned())]),
                (BindingKind::Text, vec![None, Some("coffee".to_owned())]),
            ]
        );
    }

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("transactions"));
        assert!(is_valid_identifier("_stage$1"));
        assert!(!is_valid_identifier("1st"));
        assert!(!is_valid_identifier("customers; DROP TABLE accounts"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn load_mode_wire_names() -> Result<(), anyhow::Error> {
        assert_eq!(serde_json::to_value(LoadMode::Replace)?, "replace");
        assert_eq!(serde_json::from_value::<LoadMode>("append".into())?, LoadMode::Append);
        Ok(())
    }
}
