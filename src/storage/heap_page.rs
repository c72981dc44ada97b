//! The slotted heap page format.
//!
//! A heap page is one fixed-size block of a table file, decoded into memory:
//! a presence bitmap followed by fixed-size tuple images.
//!
//! # On-disk layout
//! ```text
//! ┌──────────────────┬──────────┬──────────┬─────┬──────────┬─────────┐
//! │ bitmap           │ slot 0   │ slot 1   │ ... │ slot N-1 │ padding │
//! │ ceil(N/8) bytes  │ T bytes  │ T bytes  │     │ T bytes  │ zeros   │
//! └──────────────────┴──────────┴──────────┴─────┴──────────┴─────────┘
//! ```
//! where `T` is the schema's tuple image length and `N` is chosen so that
//! `N` slots plus `N` bitmap bits fill the block:
//! `N = (block_bits) / (T*8 + 1)`. Bit `i` of the bitmap (LSB-first within
//! each byte) says whether slot `i` holds a live tuple. An all-zero block is
//! therefore a valid, empty page.

use std::sync::Arc;

use crate::common::{Error, PageId, Result, TransactionId};
use crate::tuple::{RecordId, Schema, Tuple};

/// In-memory decoded page: slot array + dirty bookkeeping.
///
/// The page remembers the block length it was created with, so it always
/// re-encodes to exactly as many bytes as were read, even if the global page
/// size is reconfigured mid-run by a test.
#[derive(Debug)]
pub struct HeapPage {
    pid: PageId,
    schema: Arc<Schema>,
    block_len: usize,
    slots: Vec<Option<Tuple>>,
    dirtied_by: Option<TransactionId>,
}

/// Number of tuple slots a block of `block_len` bytes holds for `schema`.
///
/// Each slot costs its tuple image plus one bitmap bit. A zero-width schema
/// gets zero slots rather than a division blowup.
pub fn slots_per_page(schema: &Schema, block_len: usize) -> usize {
    let tuple_bits = schema.byte_len() * 8;
    if tuple_bits == 0 {
        return 0;
    }
    (block_len * 8) / (tuple_bits + 1)
}

fn bitmap_len(slot_count: usize) -> usize {
    slot_count.div_ceil(8)
}

impl HeapPage {
    /// A fresh page with every slot free.
    pub fn empty(pid: PageId, schema: Arc<Schema>, block_len: usize) -> Self {
        let n = slots_per_page(&schema, block_len);
        HeapPage {
            pid,
            schema,
            block_len,
            slots: vec![None; n],
            dirtied_by: None,
        }
    }

    /// Decode a raw block into a page.
    ///
    /// Fails with an I/O error if the block is shorter than its own layout
    /// claims or a live slot's image does not decode; a partially decoded
    /// page is never returned.
    pub fn decode(pid: PageId, schema: Arc<Schema>, block: &[u8]) -> Result<Self> {
        let n = slots_per_page(&schema, block.len());
        let header = bitmap_len(n);
        let tuple_len = schema.byte_len();
        let mut slots = Vec::with_capacity(n);
        for i in 0..n {
            let used = block[i / 8] >> (i % 8) & 1 == 1;
            if !used {
                slots.push(None);
                continue;
            }
            let start = header + i * tuple_len;
            let image = block.get(start..start + tuple_len).ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("{} truncated at slot {}", pid, i),
                )
            })?;
            let mut input = image;
            let mut tuple = Tuple::decode(&schema, &mut input)?;
            tuple.set_rid(Some(RecordId::new(pid, i)));
            slots.push(Some(tuple));
        }
        Ok(HeapPage {
            pid,
            schema,
            block_len: block.len(),
            slots,
            dirtied_by: None,
        })
    }

    /// Encode back to exactly the block length this page was created with.
    pub fn encode(&self) -> Vec<u8> {
        let header = bitmap_len(self.slots.len());
        let tuple_len = self.schema.byte_len();
        let mut block = vec![0u8; self.block_len];
        let mut body = Vec::with_capacity(tuple_len);
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(tuple) = slot {
                block[i / 8] |= 1 << (i % 8);
                body.clear();
                tuple.encode_into(&mut body);
                let start = header + i * tuple_len;
                block[start..start + tuple_len].copy_from_slice(&body);
            }
        }
        block
    }

    #[inline]
    pub fn pid(&self) -> PageId {
        self.pid
    }

    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Total slots, free or live.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Live tuples on this page.
    pub fn tuple_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn has_free_slot(&self) -> bool {
        self.slots.iter().any(|s| s.is_none())
    }

    /// Snapshot of the live tuples in slot order, record ids included.
    ///
    /// Scans copy these out so they never hold the page lock between
    /// `next()` calls.
    pub fn live_tuples(&self) -> Vec<Tuple> {
        self.slots.iter().flatten().cloned().collect()
    }

    /// Put a tuple into the first free slot, stamping its record id.
    ///
    /// The tuple must match this page's schema (positional type equality).
    pub fn insert(&mut self, mut tuple: Tuple) -> Result<RecordId> {
        if **tuple.schema() != *self.schema {
            return Err(Error::invalid_state(format!(
                "tuple schema {} does not match page schema {}",
                tuple.schema(),
                self.schema
            )));
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or_else(|| Error::invalid_state(format!("{} is full", self.pid)))?;
        let rid = RecordId::new(self.pid, slot);
        tuple.set_rid(Some(rid));
        self.slots[slot] = Some(tuple);
        Ok(rid)
    }

    /// Clear the slot named by `rid`.
    ///
    /// Fails with `NotFound` if the record id names another page, an
    /// out-of-range slot, or an already-free slot.
    pub fn delete(&mut self, rid: RecordId) -> Result<()> {
        if rid.page != self.pid {
            return Err(Error::not_found(format!("{} is not on {}", rid, self.pid)));
        }
        match self.slots.get_mut(rid.slot) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            _ => Err(Error::not_found(format!("no tuple at {}", rid))),
        }
    }

    /// Record `tx` as the writer that made this page diverge from disk.
    pub fn mark_dirty(&mut self, tx: TransactionId) {
        self.dirtied_by = Some(tx);
    }

    /// Forget dirtiness, after the page's bytes have reached disk.
    pub fn clear_dirty(&mut self) {
        self.dirtied_by = None;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirtied_by.is_some()
    }

    /// The transaction that last dirtied this page, while dirty.
    #[inline]
    pub fn dirtied_by(&self) -> Option<TransactionId> {
        self.dirtied_by
    }
}
