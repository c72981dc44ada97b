//! Equal-population histograms for selectivity estimation.
//!
//! An [`IntHistogram`] summarizes the distribution of one integer column in
//! a fixed number of buckets, so a cost-based optimizer can estimate what
//! fraction of rows a predicate such as `v > 42` keeps without scanning
//! the table. Space and update time are constant in the number of values
//! ingested.

use std::fmt;

/// Comparison operators whose selectivity a histogram can estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug)]
struct Bucket {
    min: i64,
    max: i64,
    height: u64,
}

impl Bucket {
    fn width(&self) -> i64 {
        self.max - self.min + 1
    }
}

/// Histogram over one integer column, with bucket widths chosen so each
/// bucket covers an as-equal-as-possible share of `[min, max]`.
///
/// # Bucket layout
/// ```text
/// new(4, 0, 9):
///   [0,1] [2,3] [4,6] [7,9]
///    └─ floor width ─┘└ ceiling width ┘
///        (2 each)        (3 each)
/// ```
/// Widths take at most two distinct sizes, floor first; the index where
/// the ceiling-width run starts is recorded at construction, which makes
/// bucket lookup a constant-time division instead of a scan.
#[derive(Debug)]
pub struct IntHistogram {
    min: i64,
    max: i64,
    floor_width: i64,
    ceil_width: i64,
    /// Index of the first ceiling-width bucket.
    transition: usize,
    buckets: Vec<Bucket>,
    total: u64,
}

impl IntHistogram {
    /// Create a histogram of at most `buckets` buckets over the inclusive
    /// range `[min, max]`.
    ///
    /// When the range holds fewer values than `buckets`, the bucket count
    /// is clamped to one bucket per value. The range width `max - min + 1`
    /// must fit in `i64`.
    ///
    /// # Panics
    /// Debug builds assert `buckets > 0` and `min <= max`.
    pub fn new(buckets: usize, min: i64, max: i64) -> Self {
        debug_assert!(buckets > 0, "need at least one bucket");
        debug_assert!(min <= max, "empty value range");

        let value_count = max - min + 1;
        let bucket_count = (buckets as i64).min(value_count);
        let floor_width = value_count / bucket_count;
        let ceil_width = (value_count + bucket_count - 1) / bucket_count;

        // Carve the range bucket by bucket, always giving the next bucket
        // `remaining values / remaining buckets`. Once the remainder
        // divides evenly the width steps up from floor to ceiling and
        // stays there; that index is the lookup transition.
        let mut bucket_list = Vec::with_capacity(bucket_count as usize);
        let mut remaining_values = value_count;
        let mut remaining_buckets = bucket_count;
        let mut transition = 0;
        let mut transition_found = false;
        let mut cursor = min;

        while remaining_buckets > 0 {
            if !transition_found && remaining_values % remaining_buckets == 0 {
                transition = bucket_list.len();
                transition_found = true;
            }

            let width = remaining_values / remaining_buckets;
            remaining_values -= width;
            remaining_buckets -= 1;

            bucket_list.push(Bucket {
                min: cursor,
                max: cursor + width - 1,
                height: 0,
            });
            cursor += width;
        }
        debug_assert_eq!(cursor, max + 1, "buckets must cover the whole range");

        Self {
            min,
            max,
            floor_width,
            ceil_width,
            transition,
            buckets: bucket_list,
            total: 0,
        }
    }

    /// Number of buckets after clamping.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of values ingested so far.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Record one observation of `v`.
    ///
    /// `v` must lie within `[min, max]`; debug builds assert this.
    pub fn add_value(&mut self, v: i64) {
        debug_assert!(
            (self.min..=self.max).contains(&v),
            "value outside histogram range"
        );
        let idx = self.bucket_index(v);
        self.buckets[idx].height += 1;
        self.total += 1;
    }

    /// Estimated fraction of ingested values satisfying `value op v`.
    ///
    /// An empty histogram carries no information and returns `f64::MAX` as
    /// a sentinel rather than dividing by zero.
    pub fn estimate_selectivity(&self, op: CmpOp, v: i64) -> f64 {
        if self.total == 0 {
            return f64::MAX;
        }

        match op {
            CmpOp::Eq => self.eq_selectivity(v),
            CmpOp::Ne => 1.0 - self.eq_selectivity(v),
            CmpOp::Gt => self.gt_selectivity(v),
            CmpOp::Ge => self.eq_selectivity(v) + self.gt_selectivity(v),
            CmpOp::Lt => 1.0 - (self.eq_selectivity(v) + self.gt_selectivity(v)),
            CmpOp::Le => 1.0 - self.gt_selectivity(v),
        }
    }

    /// Index of the bucket whose range contains `v`, in constant time.
    fn bucket_index(&self, v: i64) -> usize {
        let offset = v - self.min;
        let floor_span = self.floor_width * self.transition as i64;
        if offset < floor_span {
            (offset / self.floor_width) as usize
        } else {
            self.transition + ((offset - floor_span) / self.ceil_width) as usize
        }
    }

    fn eq_selectivity(&self, v: i64) -> f64 {
        if v < self.min || v > self.max {
            return 0.0;
        }
        let bucket = &self.buckets[self.bucket_index(v)];
        bucket.height as f64 / bucket.width() as f64 / self.total as f64
    }

    fn gt_selectivity(&self, v: i64) -> f64 {
        if v < self.min {
            return 1.0;
        }
        if v >= self.max {
            return 0.0;
        }

        let total = self.total as f64;
        let idx = self.bucket_index(v);
        let bucket = &self.buckets[idx];

        // The matched bucket contributes the share of its range above `v`,
        // every bucket after it contributes in full.
        let mut acc =
            (bucket.max - v) as f64 / bucket.width() as f64 * (bucket.height as f64 / total);
        for later in &self.buckets[idx + 1..] {
            acc += later.height as f64 / total;
        }
        acc
    }
}
