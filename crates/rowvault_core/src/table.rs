//! Table operations over encrypted flat files.
//!
//! A table is one file of encrypted lines in insertion order. Reads stream
//! and decode every line; `update` and `delete` decode the whole file first
//! and then rewrite it in place, so a decode failure aborts before anything
//! is written. Conditions are an exact-equality conjunction over column
//! values; empty conditions match every row.

use crate::codec::{decode_row, encode_row};
use crate::engine::Connection;
use crate::error::{StoreError, StoreResult};
use crate::keyvault::RowKey;
use crate::row::Row;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

/// A handle to one table of a connected database.
///
/// Obtained from [`Connection::table`]; every operation checks that the
/// connection is still the active one before touching the file.
#[derive(Debug)]
pub struct Table<'conn> {
    conn: &'conn Connection,
    name: String,
    path: PathBuf,
}

impl<'conn> Table<'conn> {
    pub(crate) fn new(conn: &'conn Connection, name: &str) -> Self {
        Self {
            conn,
            name: name.to_string(),
            path: conn.table_path(name),
        }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends one row, creating the table file on first reference.
    pub fn insert(&self, row: &Row) -> StoreResult<()> {
        self.conn.ensure_active()?;
        let key = self.conn.row_key()?;
        let line = encode_row(row, &key)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Returns, in file order, every row whose columns match all of
    /// `conditions`. Does not mutate the file.
    pub fn search(&self, conditions: &Row) -> StoreResult<Vec<Row>> {
        self.conn.ensure_active()?;
        let key = self.conn.row_key()?;

        let file = self.open_existing()?;
        let mut rows = Vec::new();
        for line in BufReader::new(file).lines() {
            let row = decode_row(&line?, &key)?;
            if matches(&row, conditions) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Merges `updates` into every row matching `conditions`, overwriting
    /// existing columns and adding new ones, then rewrites the whole file
    /// in original order. Returns the changed rows as stored.
    pub fn update(&self, conditions: &Row, updates: &Row) -> StoreResult<Vec<Row>> {
        self.conn.ensure_active()?;
        let key = self.conn.row_key()?;

        let mut rows = self.load_rows(&key)?;
        let mut changed = Vec::new();
        for row in &mut rows {
            if matches(row, conditions) {
                for (column, value) in updates {
                    row.insert(column.clone(), value.clone());
                }
                changed.push(row.clone());
            }
        }

        self.rewrite(&rows, &key)?;
        Ok(changed)
    }

    /// Removes every row matching `conditions`, rewriting the survivors in
    /// their original relative order. Returns the removed rows.
    pub fn delete(&self, conditions: &Row) -> StoreResult<Vec<Row>> {
        self.conn.ensure_active()?;
        let key = self.conn.row_key()?;

        let mut kept = Vec::new();
        let mut removed = Vec::new();
        for row in self.load_rows(&key)? {
            if matches(&row, conditions) {
                removed.push(row);
            } else {
                kept.push(row);
            }
        }

        self.rewrite(&kept, &key)?;
        Ok(removed)
    }

    /// Opens the table file, mapping absence to [`StoreError::NotFound`].
    fn open_existing(&self) -> StoreResult<File> {
        if !self.path.exists() {
            return Err(StoreError::not_found(format!(
                "{}/{}",
                self.conn.database(),
                self.name
            )));
        }
        Ok(File::open(&self.path)?)
    }

    /// Decodes the entire file up front, so corruption aborts the caller
    /// before any write happens.
    fn load_rows(&self, key: &RowKey) -> StoreResult<Vec<Row>> {
        let file = self.open_existing()?;
        let mut rows = Vec::new();
        for line in BufReader::new(file).lines() {
            rows.push(decode_row(&line?, key)?);
        }
        Ok(rows)
    }

    /// Re-encodes every row and rewrites the file in place.
    ///
    /// A crash mid-rewrite can truncate the tail; the next decode surfaces
    /// that as a corrupt record. Writing to a temporary file and renaming
    /// over the original would bound that window.
    fn rewrite(&self, rows: &[Row], key: &RowKey) -> StoreResult<()> {
        let mut lines = String::new();
        for row in rows {
            lines.push_str(&encode_row(row, key)?);
            lines.push('\n');
        }

        let mut file = File::create(&self.path)?;
        file.write_all(lines.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// True iff every `(column, expected)` pair in `conditions` matches `row`
/// by equality.
fn matches(row: &Row, conditions: &Row) -> bool {
    conditions
        .iter()
        .all(|(column, expected)| row.get(column) == Some(expected))
}
