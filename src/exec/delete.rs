//! Delete operator.

use std::sync::Arc;

use tracing::warn;

use crate::cache::PageCache;
use crate::common::{Error, Result, TransactionId};
use crate::db::Database;
use crate::exec::Operator;
use crate::tuple::{Field, FieldDef, FieldType, Schema, Tuple};

/// Drains its child, deleting each tuple from the table its record id
/// names, then produces a single summary tuple with the applied count.
///
/// Tuples without a record id, or whose slot has already been cleared, are
/// logged and skipped.
pub struct Delete<C> {
    tx: TransactionId,
    child: C,
    cache: Arc<PageCache>,
    schema: Arc<Schema>,
    opened: bool,
    emitted: bool,
}

impl<C: Operator> Delete<C> {
    pub fn new(tx: TransactionId, child: C, db: &Database) -> Self {
        Self {
            tx,
            child,
            cache: Arc::clone(db.cache()),
            schema: Arc::new(Schema::new(vec![FieldDef::named(
                FieldType::Int,
                "deleted_count",
            )])),
            opened: false,
            emitted: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.opened {
            Ok(())
        } else {
            Err(Error::invalid_state("delete operator is not open"))
        }
    }
}

impl<C: Operator> Operator for Delete<C> {
    fn open(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        self.child.open()?;
        self.opened = true;
        self.emitted = false;
        Ok(())
    }

    fn has_next(&mut self) -> Result<bool> {
        self.check_open()?;
        Ok(!self.emitted)
    }

    fn next(&mut self) -> Result<Tuple> {
        self.check_open()?;
        if self.emitted {
            return Err(Error::not_found("delete summary already produced"));
        }

        let mut applied: i64 = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            match self.cache.delete_tuple(self.tx, &tuple) {
                Ok(()) => applied += 1,
                Err(err) => warn!(%err, "skipping row that failed to delete"),
            }
        }

        self.emitted = true;
        Tuple::new(Arc::clone(&self.schema), vec![Field::Int(applied)])
    }

    fn rewind(&mut self) -> Result<()> {
        self.check_open()?;
        self.child.rewind()?;
        self.emitted = false;
        Ok(())
    }

    fn close(&mut self) {
        self.child.close();
        self.opened = false;
        self.emitted = false;
    }

    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableId;
    use crate::exec::SeqScan;
    use crate::storage::HeapFile;
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

    fn row_count(db: &Database, table: TableId) -> usize {
        let mut scan = SeqScan::new(db, table, "x").unwrap();
        scan.open().unwrap();
        let mut n = 0;
        while scan.has_next().unwrap() {
            scan.next().unwrap();
            n += 1;
        }
        n
    }

    #[test]
    fn test_delete_empties_table() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[1, 2, 3]);

        let child = SeqScan::new(&db, tid, "t").unwrap();
        let mut delete = Delete::new(TransactionId::new(), child, &db);
        delete.open().unwrap();

        let summary = delete.next().unwrap();
        assert_eq!(summary.fields(), &[Field::Int(3)]);
        assert_eq!(row_count(&db, tid), 0);
    }

    #[test]
    fn test_summary_is_single_shot() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[4]);

        let child = SeqScan::new(&db, tid, "t").unwrap();
        let mut delete = Delete::new(TransactionId::new(), child, &db);
        delete.open().unwrap();

        delete.next().unwrap();
        assert!(!delete.has_next().unwrap());
        assert!(matches!(delete.next(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_rewind_sees_the_emptied_table() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[1, 2]);

        let child = SeqScan::new(&db, tid, "t").unwrap();
        let mut delete = Delete::new(TransactionId::new(), child, &db);
        delete.open().unwrap();

        assert_eq!(delete.next().unwrap().fields(), &[Field::Int(2)]);
        delete.rewind().unwrap();
        // Everything is already gone, so the second pass applies nothing.
        assert_eq!(delete.next().unwrap().fields(), &[Field::Int(0)]);
    }

    #[test]
    fn test_stale_rows_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[1, 2, 3]);

        // Open this scan first so it snapshots the page's rows...
        let mut stale_child = SeqScan::new(&db, tid, "t").unwrap();
        stale_child.open().unwrap();

        // ...then empty the table behind its back.
        let fresh_child = SeqScan::new(&db, tid, "t").unwrap();
        let mut first = Delete::new(TransactionId::new(), fresh_child, &db);
        first.open().unwrap();
        assert_eq!(first.next().unwrap().fields(), &[Field::Int(3)]);

        // The stale snapshot's record ids now point at cleared slots; each
        // row fails individually and the summary reports zero applied.
        let mut second = Delete::new(TransactionId::new(), stale_child, &db);
        second.open().unwrap();
        assert_eq!(second.next().unwrap().fields(), &[Field::Int(0)]);
    }

    #[test]
    fn test_methods_while_closed_fail() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[1]);

        let child = SeqScan::new(&db, tid, "t").unwrap();
        let mut delete = Delete::new(TransactionId::new(), child, &db);
        assert!(matches!(delete.has_next(), Err(Error::InvalidState(_))));
        assert!(matches!(delete.next(), Err(Error::InvalidState(_))));
        assert!(matches!(delete.rewind(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_summary_schema_is_one_int_column() {
        let dir = tempdir().unwrap();
        let (db, tid) = setup(&dir, &[]);

        let child = SeqScan::new(&db, tid, "t").unwrap();
        let delete = Delete::new(TransactionId::new(), child, &db);
        assert_eq!(delete.schema().len(), 1);
        assert_eq!(delete.schema().field_name(0), Some("deleted_count"));
    }
}
