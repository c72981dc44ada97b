//! The table catalog.
//!
//! Maps table ids and names to open [`HeapFile`]s, their schemas, and an
//! optional primary-key field. Tables arrive either programmatically via
//! [`Catalog::add_table`] or from a schema text file via
//! [`Catalog::load_schema`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::common::{Error, Result, TableId};
use crate::storage::HeapFile;
use crate::tuple::{FieldDef, FieldType, Schema};

/// Directory of the tables one [`Database`](crate::Database) knows about.
///
/// Shared freely behind an `Arc`; registration and lookup take a read-write
/// lock internally, and after startup the catalog is effectively read-only.
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

#[derive(Default)]
struct CatalogInner {
    tables: HashMap<TableId, TableEntry>,
    by_name: HashMap<String, TableId>,
}

struct TableEntry {
    file: Arc<HeapFile>,
    name: String,
    primary_key: Option<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            inner: RwLock::new(CatalogInner::default()),
        }
    }

    /// Register a table under `name`.
    ///
    /// A repeated name (or id) replaces the earlier registration; the last
    /// table added wins.
    pub fn add_table(&self, file: Arc<HeapFile>, name: impl Into<String>, primary_key: Option<String>) {
        let name = name.into();
        let id = file.table_id();
        debug!(table = %name, %id, "registered table");

        let mut inner = self.inner.write();
        inner.by_name.insert(name.clone(), id);
        inner.tables.insert(
            id,
            TableEntry {
                file,
                name,
                primary_key,
            },
        );
    }

    /// The heap file backing table `id`.
    pub fn table(&self, id: TableId) -> Result<Arc<HeapFile>> {
        self.inner
            .read()
            .tables
            .get(&id)
            .map(|e| Arc::clone(&e.file))
            .ok_or_else(|| Error::not_found(format!("{}", id)))
    }

    /// The schema of table `id`.
    pub fn schema(&self, id: TableId) -> Result<Arc<Schema>> {
        Ok(Arc::clone(self.table(id)?.schema()))
    }

    /// The primary-key field name of table `id`, if it declared one.
    pub fn primary_key(&self, id: TableId) -> Result<Option<String>> {
        self.inner
            .read()
            .tables
            .get(&id)
            .map(|e| e.primary_key.clone())
            .ok_or_else(|| Error::not_found(format!("{}", id)))
    }

    /// The registered name of table `id`.
    pub fn table_name(&self, id: TableId) -> Result<String> {
        self.inner
            .read()
            .tables
            .get(&id)
            .map(|e| e.name.clone())
            .ok_or_else(|| Error::not_found(format!("{}", id)))
    }

    /// The id registered under `name`.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.inner
            .read()
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::not_found(format!("table '{}'", name)))
    }

    /// Ids of every registered table, in no particular order.
    pub fn table_ids(&self) -> Vec<TableId> {
        self.inner.read().tables.keys().copied().collect()
    }

    /// Load table definitions from a schema text file.
    ///
    /// One line per table: `name (field type [pk], ...)` with
    /// `type ∈ {int, string}` and at most one `pk` annotation. Each table's
    /// data lives next to the schema file as `<name>.dat`, created empty if
    /// missing. Blank lines are skipped; the first malformed line aborts the
    /// whole load with [`Error::Catalog`].
    pub fn load_schema(&self, catalog_path: impl AsRef<Path>) -> Result<()> {
        let catalog_path = catalog_path.as_ref();
        let base = catalog_path.parent().unwrap_or_else(|| Path::new("."));
        let text = std::fs::read_to_string(catalog_path)?;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, schema, primary_key) = parse_table_line(line)?;
            let file = HeapFile::open(base.join(format!("{}.dat", name)), Arc::new(schema))?;
            self.add_table(Arc::new(file), name, primary_key);
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn malformed(line: &str) -> Error {
    Error::Catalog(format!("expected `name (field type [pk], ...)`, got: {}", line))
}

fn parse_table_line(line: &str) -> Result<(String, Schema, Option<String>)> {
    let (name, rest) = line.split_once('(').ok_or_else(|| malformed(line))?;
    let name = name.trim();
    let body = rest
        .trim_end()
        .strip_suffix(')')
        .ok_or_else(|| malformed(line))?;
    if name.is_empty() {
        return Err(malformed(line));
    }

    let mut fields = Vec::new();
    let mut primary_key = None;
    for item in body.split(',') {
        let mut tokens = item.split_whitespace();
        let field_name = tokens.next().ok_or_else(|| malformed(line))?;
        let type_name = tokens.next().ok_or_else(|| malformed(line))?;
        let ty = FieldType::parse(type_name).ok_or_else(|| {
            Error::Catalog(format!("unknown type '{}' in: {}", type_name, line))
        })?;
        match tokens.next() {
            None => {}
            Some("pk") => {
                if primary_key.is_some() {
                    return Err(Error::Catalog(format!(
                        "more than one pk annotation in: {}",
                        line
                    )));
                }
                primary_key = Some(field_name.to_string());
            }
            Some(other) => {
                return Err(Error::Catalog(format!(
                    "unexpected token '{}' in: {}",
                    other, line
                )));
            }
        }
        if tokens.next().is_some() {
            return Err(malformed(line));
        }
        fields.push(FieldDef::named(ty, field_name));
    }

    Ok((name.to_string(), Schema::new(fields), primary_key))
}
