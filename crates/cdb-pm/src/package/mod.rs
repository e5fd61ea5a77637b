// Registry records
//
// Packages and releases as decoded from the ContentDB API, plus the query
// filter used to list them.

mod package;
mod query;

pub use package::{Package, Release};
pub use query::Query;
