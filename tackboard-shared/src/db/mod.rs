/// Database access layer
///
/// Connection pool construction and schema migrations. The queries
/// themselves live behind the [`crate::store`] traits.

pub mod migrations;
pub mod pool;
