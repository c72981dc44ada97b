//! Insert operator.

use std::sync::Arc;

use tracing::warn;

use crate::cache::PageCache;
use crate::common::{Error, Result, TableId, TransactionId};
use crate::db::Database;
use crate::exec::Operator;
use crate::tuple::{Field, FieldDef, FieldType, Schema, Tuple};

/// Drains its child into a target table and produces a single summary tuple
/// holding the number of rows applied.
///
/// A row that fails to apply is logged and skipped; the summary counts only
/// the rows that landed. After the summary, the operator is exhausted until
/// rewound.
pub struct Insert<C> {
    tx: TransactionId,
    child: C,
    table: TableId,
    cache: Arc<PageCache>,
    schema: Arc<Schema>,
    opened: bool,
    emitted: bool,
}

impl<C: Operator> Insert<C> {
    /// Build an insert of `child`'s output into `table`.
    ///
    /// # Errors
    /// `NotFound` if the table is unknown; `InvalidState` if the child's
    /// schema does not match the table's (positional type equality).
    pub fn new(tx: TransactionId, child: C, db: &Database, table: TableId) -> Result<Self> {
        let table_schema = db.catalog().schema(table)?;
        if **child.schema() != *table_schema {
            return Err(Error::invalid_state(format!(
                "child schema {} does not match table schema {}",
                child.schema(),
                table_schema
            )));
        }

        Ok(Self {
            tx,
            child,
            table,
            cache: Arc::clone(db.cache()),
            schema: Arc::new(Schema::new(vec![FieldDef::named(
                FieldType::Int,
                "inserted_count",
            )])),
            opened: false,
            emitted: false,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.opened {
            Ok(())
        } else {
            Err(Error::invalid_state("insert operator is not open"))
        }
    }
}

impl<C: Operator> Operator for Insert<C> {
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
            return Err(Error::not_found("insert summary already produced"));
        }

        let mut applied: i64 = 0;
        while self.child.has_next()? {
            let tuple = self.child.next()?;
            match self.cache.insert_tuple(self.tx, self.table, tuple) {
                Ok(()) => applied += 1,
                Err(err) => warn!(table = %self.table, %err, "skipping row that failed to insert"),
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
    use crate::exec::SeqScan;
    use crate::storage::HeapFile;
    use tempfile::tempdir;

    /// Two tables sharing one int-column schema: `src` pre-populated with
    /// `values`, `dst` empty.
    fn setup(dir: &tempfile::TempDir, values: &[i64]) -> (Database, TableId, TableId) {
        let db = Database::new();
        let schema = Arc::new(Schema::new(vec![FieldDef::named(FieldType::Int, "v")]));

        let src = Arc::new(HeapFile::open(dir.path().join("src.dat"), Arc::clone(&schema)).unwrap());
        let dst = Arc::new(HeapFile::open(dir.path().join("dst.dat"), Arc::clone(&schema)).unwrap());
        let (src_id, dst_id) = (src.table_id(), dst.table_id());
        db.catalog().add_table(src, "src", None);
        db.catalog().add_table(dst, "dst", None);

        let tx = TransactionId::new();
        for &v in values {
            let tuple = Tuple::new(Arc::clone(&schema), vec![Field::Int(v)]).unwrap();
            db.cache().insert_tuple(tx, src_id, tuple).unwrap();
        }
        (db, src_id, dst_id)
    }

    fn table_values(db: &Database, table: TableId) -> Vec<i64> {
        let mut scan = SeqScan::new(db, table, "x").unwrap();
        scan.open().unwrap();
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
    fn test_insert_reports_applied_count() {
        let dir = tempdir().unwrap();
        let (db, src, dst) = setup(&dir, &[1, 2, 3]);

        let child = SeqScan::new(&db, src, "s").unwrap();
        let mut insert = Insert::new(TransactionId::new(), child, &db, dst).unwrap();
        insert.open().unwrap();

        let summary = insert.next().unwrap();
        assert_eq!(summary.fields(), &[Field::Int(3)]);
        assert_eq!(table_values(&db, dst), vec![1, 2, 3]);
    }

    #[test]
    fn test_summary_is_single_shot() {
        let dir = tempdir().unwrap();
        let (db, src, dst) = setup(&dir, &[5]);

        let child = SeqScan::new(&db, src, "s").unwrap();
        let mut insert = Insert::new(TransactionId::new(), child, &db, dst).unwrap();
        insert.open().unwrap();

        insert.next().unwrap();
        assert!(!insert.has_next().unwrap());
        assert!(matches!(insert.next(), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_rewind_rearms_the_summary() {
        let dir = tempdir().unwrap();
        let (db, src, dst) = setup(&dir, &[1, 2]);

        let child = SeqScan::new(&db, src, "s").unwrap();
        let mut insert = Insert::new(TransactionId::new(), child, &db, dst).unwrap();
        insert.open().unwrap();

        assert_eq!(insert.next().unwrap().fields(), &[Field::Int(2)]);
        insert.rewind().unwrap();
        assert_eq!(insert.next().unwrap().fields(), &[Field::Int(2)]);

        // The child replayed, so the rows landed twice.
        assert_eq!(table_values(&db, dst), vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_schema_mismatch_rejected_at_construction() {
        let dir = tempdir().unwrap();
        let (db, src, _) = setup(&dir, &[1]);

        // A second table with a wider schema.
        let wide = Arc::new(
            Schema::new(vec![
                FieldDef::named(FieldType::Int, "id"),
                FieldDef::named(FieldType::Str, "name"),
            ]),
        );
        let other = Arc::new(HeapFile::open(dir.path().join("wide.dat"), wide).unwrap());
        let other_id = other.table_id();
        db.catalog().add_table(other, "wide", None);

        let child = SeqScan::new(&db, src, "s").unwrap();
        let result = Insert::new(TransactionId::new(), child, &db, other_id);
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_methods_while_closed_fail() {
        let dir = tempdir().unwrap();
        let (db, src, dst) = setup(&dir, &[1]);

        let child = SeqScan::new(&db, src, "s").unwrap();
        let mut insert = Insert::new(TransactionId::new(), child, &db, dst).unwrap();
        assert!(matches!(insert.has_next(), Err(Error::InvalidState(_))));
        assert!(matches!(insert.next(), Err(Error::InvalidState(_))));
        assert!(matches!(insert.rewind(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_summary_schema_is_one_int_column() {
        let dir = tempdir().unwrap();
        let (db, src, dst) = setup(&dir, &[]);

        let child = SeqScan::new(&db, src, "s").unwrap();
        let insert = Insert::new(TransactionId::new(), child, &db, dst).unwrap();
        assert_eq!(insert.schema().len(), 1);
        assert_eq!(insert.schema().field_type(0), Some(FieldType::Int));
        assert_eq!(insert.schema().field_name(0), Some("inserted_count"));
    }

    #[test]
    fn test_empty_child_reports_zero() {
        let dir = tempdir().unwrap();
        let (db, src, dst) = setup(&dir, &[]);

        let child = SeqScan::new(&db, src, "s").unwrap();
        let mut insert = Insert::new(TransactionId::new(), child, &db, dst).unwrap();
        insert.open().unwrap();
        assert_eq!(insert.next().unwrap().fields(), &[Field::Int(0)]);
    }
}
