//! Database repositories for data access layer
//
// Posts repository (schema provisioning + inserts)
pub mod posts;
//
// DDL statements
pub mod schema;
