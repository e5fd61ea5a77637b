//! Remote package registry access.

mod contentdb;
mod traits;

pub use contentdb::ContentDbClient;
pub use traits::Registry;
