//! Per-record slot metadata.
//!
//! A slot is the file attached to one column of a record. It is persisted as
//! three sibling columns: the presence flag `{column}`, `{column}_filename`
//! and `{column}_mime`. [`SlotColumns`] names those three columns and
//! [`FileSlot`] carries their values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::locale::LocaleColumnResolver;

/// Values of a slot's three columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSlot {
    pub present: bool,
    pub filename: Option<String>,
    pub mime: Option<String>,
}

impl FileSlot {
    /// A slot holding a stored file
    pub fn stored(filename: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            present: true,
            filename: Some(filename.into()),
            mime: Some(mime.into()),
        }
    }

    /// Reset to the empty state
    pub fn clear(&mut self) {
        self.present = false;
        self.filename = None;
        self.mime = None;
    }

    /// Text after the last `.` of the filename, if any
    pub fn extension(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Physical column names of one slot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotColumns {
    pub presence: String,
    pub filename: String,
    pub mime: String,
}

impl SlotColumns {
    /// Column names for `column` without any locale convention
    pub fn plain(column: &str) -> Self {
        Self {
            presence: column.to_string(),
            filename: format!("{}_filename", column),
            mime: format!("{}_mime", column),
        }
    }

    /// Resolve the column names for `column`, applying the record's locale
    /// convention when it has one
    pub fn resolve(column: &str, resolver: Option<&dyn LocaleColumnResolver>) -> Self {
        resolver
            .and_then(|resolver| resolver.resolve_slot_columns(column))
            .unwrap_or_else(|| Self::plain(column))
    }

    pub fn names(&self) -> [&str; 3] {
        [
            self.presence.as_str(),
            self.filename.as_str(),
            self.mime.as_str(),
        ]
    }
}

/// Ordered set of slots on a record, keyed by presence column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSlots {
    entries: BTreeMap<String, (SlotColumns, FileSlot)>,
}

impl FileSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slot under plain column names
    pub fn with_slot(mut self, column: &str, slot: FileSlot) -> Self {
        self.insert(SlotColumns::plain(column), slot);
        self
    }

    pub fn insert(&mut self, columns: SlotColumns, slot: FileSlot) {
        self.entries
            .insert(columns.presence.clone(), (columns, slot));
    }

    pub fn get(&self, columns: &SlotColumns) -> Option<&FileSlot> {
        self.entries.get(&columns.presence).map(|(_, slot)| slot)
    }

    /// Mutable access to a slot, creating it empty when missing
    pub fn get_mut(&mut self, columns: &SlotColumns) -> &mut FileSlot {
        let (_, slot) = self
            .entries
            .entry(columns.presence.clone())
            .or_insert_with(|| (columns.clone(), FileSlot::default()));
        slot
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotColumns, &FileSlot)> {
        self.entries.values().map(|(columns, slot)| (columns, slot))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
