// Database module
// Relational storage for document/vector linkage rows.

pub mod sqlite;

pub use sqlite::*;
