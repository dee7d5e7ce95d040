//! The migrated-row capability.

use crate::connpool::SqlArg;

/// A row that can be moved between the two stores.
///
/// `columns` and `args` describe the row's full insert shape in matching
/// order; the raw stores use them to rebuild the row on the other side
/// without knowing the concrete type. `compare_to` defaults to structural
/// equality and can be overridden when some columns are allowed to differ
/// between stores.
pub trait Entity: Clone + PartialEq + Send + Sync + Unpin + 'static {
    /// Table the rows live in, identical on both stores.
    const TABLE: &'static str;

    fn id(&self) -> i64;

    /// Monotonic update-time watermark driving incremental validation.
    fn utime(&self) -> i64;

    fn columns() -> &'static [&'static str];

    /// Bind values for [`columns`](Entity::columns), in the same order.
    fn args(&self) -> Vec<SqlArg>;

    fn compare_to(&self, other: &Self) -> bool {
        self == other
    }
}
