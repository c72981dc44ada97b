//! Sequential scan operator.

use std::sync::Arc;

use crate::common::{Result, TableId};
use crate::db::Database;
use crate::exec::Operator;
use crate::storage::HeapScan;
use crate::tuple::{Schema, Tuple};

/// Full-table scan yielding tuples in page order, slot order within a page.
///
/// The output schema is the table's schema with every field name qualified
/// by a caller-supplied alias (`alias.field`), so two scans of the same
/// table stay distinguishable above a join. Unnamed fields stay unnamed.
pub struct SeqScan {
    scan: HeapScan,
    schema: Arc<Schema>,
}

impl SeqScan {
    /// Build a scan of `table` under `alias`.
    ///
    /// # Errors
    /// `NotFound` if the table is not in the catalog.
    pub fn new(db: &Database, table: TableId, alias: &str) -> Result<Self> {
        let file = db.catalog().table(table)?;
        let schema = Arc::new(file.schema().qualified(alias));
        let scan = file.scan(Arc::clone(db.cache()));
        Ok(Self { scan, schema })
    }
}

impl Operator for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.scan.open()
    }

    fn has_next(&mut self) -> Result<bool> {
        self.scan.has_next()
    }

    fn next(&mut self) -> Result<Tuple> {
        // Reattach the tuple under the qualified schema, keeping its record
        // id so a downstream Delete can still locate the owning slot.
        let tuple = self.scan.next()?;
        let rid = tuple.rid();
        let mut out = Tuple::new(Arc::clone(&self.schema), tuple.fields().to_vec())?;
        out.set_rid(rid);
        Ok(out)
    }

    fn rewind(&mut self) -> Result<()> {
        self.scan.rewind()
    }

    fn close(&mut self) {
        self.scan.close();
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Error, TransactionId};
    use crate::storage::HeapFile;
    use crate::tuple::{Field, FieldDef, FieldType};
    use tempfile::tempdir;

    fn setup(dir: &tempfile::TempDir, values: &[i64]) -> (Database, TableId) {
        let db = Database::new();
        let schema = Arc::new(Schema::new(vec![FieldDef::named(FieldType::Int, "v")]));
        let file = Arc::new(HeapFile::open(dir.path().join("t.dat"), Arc::clone(&schema)).unwrap());
        let tid = file.table_id();
        db.catalog().add_table(file, "t", None);

        let tx = TransactionId::new();
        for &v in values {
            let tuple = Tuple::new(Arc::clone(&schema), vec![Field::Int(v)]).unwrap();
            db.cache().insert_tuple(tx, tid, tuple).unwrap();
        }
        (db, tid)
    }

    fn collect_ints(scan: &mut SeqScan) -> Vec<i64> {
        let mut out = Vec::new();
        while scan.has_next().unwrap() {
            match scan.next().unwrap().fields()[0] {
                Field::Int(v) => out.push(v),
                ref other => panic!("unexpected field {:?}", other),
            }
        }
        out
    }

    #[test]
    fn test_scan_yields_rows_in_insert_order() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[3, 1, 4, 1, 5]);

        let mut scan = SeqScan::new(&db, tid, "t").unwrap();
        scan.open().unwrap();
        assert_eq!(collect_ints(&mut scan), vec![3, 1, 4, 1, 5]);
    }

    #[test]
    fn test_schema_is_alias_qualified() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[1]);

        let scan = SeqScan::new(&db, tid, "orders").unwrap();
        assert_eq!(scan.schema().field_name(0), Some("orders.v"));
    }

    #[test]
    fn test_unnamed_fields_stay_unnamed() {
        let dir = tempdir().unwrap();
        let db = Database::new();
        let schema = Arc::new(Schema::unnamed(vec![FieldType::Int]));
        let file = Arc::new(HeapFile::open(dir.path().join("u.dat"), schema).unwrap());
        let tid = file.table_id();
        db.catalog().add_table(file, "u", None);

        let scan = SeqScan::new(&db, tid, "u").unwrap();
        assert_eq!(scan.schema().field_name(0), None);
    }

    #[test]
    fn test_tuples_carry_qualified_schema_and_rid() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[7]);

        let mut scan = SeqScan::new(&db, tid, "t").unwrap();
        scan.open().unwrap();
        let tuple = scan.next().unwrap();
        assert_eq!(tuple.schema().field_name(0), Some("t.v"));
        assert!(tuple.rid().is_some());
    }

    #[test]
    fn test_methods_while_closed_fail() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[1]);

        let mut scan = SeqScan::new(&db, tid, "t").unwrap();
        assert!(matches!(scan.has_next(), Err(Error::InvalidState(_))));
        assert!(matches!(scan.next(), Err(Error::InvalidState(_))));
        assert!(matches!(scan.rewind(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_next_past_end_is_not_found() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[1]);

        let mut scan = SeqScan::new(&db, tid, "t").unwrap();
        scan.open().unwrap();
        scan.next().unwrap();
        assert!(matches!(scan.next(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_rewind_replays_the_sequence() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[2, 4, 6]);

        let mut scan = SeqScan::new(&db, tid, "t").unwrap();
        scan.open().unwrap();
        let first = collect_ints(&mut scan);
        scan.rewind().unwrap();
        let second = collect_ints(&mut scan);
        assert_eq!(first, second);
    }

    #[test]
    fn test_scan_of_empty_table_is_empty() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[]);

        let mut scan = SeqScan::new(&db, tid, "t").unwrap();
        scan.open().unwrap();
        assert!(!scan.has_next().unwrap());
    }

    #[test]
    fn test_close_then_reopen_restarts() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[9, 8]);

        let mut scan = SeqScan::new(&db, tid, "t").unwrap();
        scan.open().unwrap();
        scan.next().unwrap();
        scan.close();
        assert!(matches!(scan.has_next(), Err(Error::InvalidState(_))));

        scan.open().unwrap();
        assert_eq!(collect_ints(&mut scan), vec![9, 8]);
    }
}
