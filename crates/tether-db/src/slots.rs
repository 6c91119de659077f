use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use sqlx::{Encode, PgPool, Postgres, Type};
use tether_core::FilesError;
use tether_files::{FileSlot, FileSlots, SlotColumns};

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

const DEFAULT_KEY_COLUMN: &str = "id";
const DEFAULT_UPDATED_AT_COLUMN: &str = "updated_at";

/// Double-quote a table or column name after checking it is a plain identifier.
///
/// `schema.table` is accepted and each part is quoted separately.
pub fn quote_identifier(name: &str) -> Result<String, FilesError> {
    let parts = name
        .split('.')
        .map(|part| {
            if IDENTIFIER_RE.is_match(part) {
                Ok(format!("\"{}\"", part))
            } else {
                Err(FilesError::InvalidColumn(format!(
                    "'{}' is not a valid SQL identifier",
                    name
                )))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(parts.join("."))
}

/// Repository writing slot columns back to their table
///
/// One `UPDATE` per save. The slot columns must already exist; schema
/// management is left to the host application's migrations.
#[derive(Clone)]
pub struct SlotColumnsRepository {
    pool: PgPool,
    key_column: String,
    updated_at_column: String,
}

impl SlotColumnsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            updated_at_column: DEFAULT_UPDATED_AT_COLUMN.to_string(),
        }
    }

    pub fn with_key_column(mut self, column: impl Into<String>) -> Self {
        self.key_column = column.into();
        self
    }

    pub fn with_updated_at_column(mut self, column: impl Into<String>) -> Self {
        self.updated_at_column = column.into();
        self
    }

    /// `UPDATE` statement writing the given slots; `$1` is the row key
    pub fn update_sql(&self, table: &str, columns: &[&SlotColumns]) -> Result<String, FilesError> {
        let mut assignments = Vec::with_capacity(columns.len() * 3 + 1);
        let mut placeholder = 2;
        for slot_columns in columns {
            for column in slot_columns.names() {
                assignments.push(format!("{} = ${}", quote_identifier(column)?, placeholder));
                placeholder += 1;
            }
        }
        let updated_at = quote_identifier(&self.updated_at_column)?;
        assignments.push(format!("{} = NOW()", updated_at));

        Ok(format!(
            "UPDATE {} SET {} WHERE {} = $1 RETURNING {}",
            quote_identifier(table)?,
            assignments.join(", "),
            quote_identifier(&self.key_column)?,
            updated_at
        ))
    }

    /// `SELECT` statement reading one slot; `$1` is the row key
    pub fn select_sql(&self, table: &str, columns: &SlotColumns) -> Result<String, FilesError> {
        let names = columns
            .names()
            .iter()
            .map(|column| quote_identifier(column))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!(
            "SELECT {} FROM {} WHERE {} = $1",
            names.join(", "),
            quote_identifier(table)?,
            quote_identifier(&self.key_column)?
        ))
    }

    /// Write one slot and return the row's new `updated_at`
    #[tracing::instrument(skip(self, key, slot), fields(db.table = %table, db.operation = "update", column = %columns.presence))]
    pub async fn save_slot<K>(
        &self,
        table: &str,
        key: K,
        columns: &SlotColumns,
        slot: &FileSlot,
    ) -> Result<DateTime<Utc>, FilesError>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send,
    {
        self.update(table, key, vec![(columns, slot)]).await
    }

    /// Write every slot of a record in one statement
    #[tracing::instrument(skip(self, key, slots), fields(db.table = %table, db.operation = "update", slots = slots.len()))]
    pub async fn save_slots<K>(
        &self,
        table: &str,
        key: K,
        slots: &FileSlots,
    ) -> Result<DateTime<Utc>, FilesError>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send,
    {
        self.update(table, key, slots.iter().collect()).await
    }

    async fn update<K>(
        &self,
        table: &str,
        key: K,
        entries: Vec<(&SlotColumns, &FileSlot)>,
    ) -> Result<DateTime<Utc>, FilesError>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send,
    {
        let columns: Vec<&SlotColumns> = entries.iter().map(|(columns, _)| *columns).collect();
        let sql = self.update_sql(table, &columns)?;

        let mut query = sqlx::query_scalar::<Postgres, DateTime<Utc>>(&sql).bind(key);
        for (_, slot) in &entries {
            query = query
                .bind(slot.present)
                .bind(slot.filename.as_deref())
                .bind(slot.mime.as_deref());
        }

        query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FilesError::Persistence(format!("No row to update in {}", table)))
    }

    /// Read one slot back; `None` when the row does not exist
    #[tracing::instrument(skip(self, key), fields(db.table = %table, db.operation = "select", column = %columns.presence))]
    pub async fn load_slot<K>(
        &self,
        table: &str,
        key: K,
        columns: &SlotColumns,
    ) -> Result<Option<FileSlot>, FilesError>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send,
    {
        let sql = self.select_sql(table, columns)?;

        let row = sqlx::query_as::<Postgres, (Option<bool>, Option<String>, Option<String>)>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(present, filename, mime)| FileSlot {
            present: present.unwrap_or(false),
            filename,
            mime,
        }))
    }
}
