use async_trait::async_trait;

use crate::archive::PackageArchive;
use crate::error::Result;
use crate::package::{Package, Query, Release};

/// Read-only package registry
///
/// The installer only talks to the registry through this trait, so a local
/// or in-memory catalog can stand in for ContentDB.
#[async_trait]
pub trait Registry: Send + Sync {
    /// List packages matching `query`; `None` lists the whole catalog
    async fn list_packages(&self, query: Option<&Query>) -> Result<Vec<Package>>;

    /// Fetch the full record of one package
    async fn get_package(&self, author: &str, name: &str) -> Result<Package>;

    /// All releases of a package, newest first
    async fn list_releases(&self, author: &str, name: &str) -> Result<Vec<Release>>;

    /// A single release of a package
    async fn get_release(&self, author: &str, name: &str, release: u64) -> Result<Release>;

    /// Download the current release
    async fn download(&self, author: &str, name: &str) -> Result<PackageArchive>;

    /// Download a specific release
    async fn download_release(&self, author: &str, name: &str, release: u64) -> Result<PackageArchive>;

    /// Mods matching `term`, most relevant first
    async fn search(&self, term: &str) -> Result<Vec<Package>> {
        let query = Query::new(term)
            .with_type("mod")
            .sort_by("score")
            .order_by("desc");
        self.list_packages(Some(&query)).await
    }
}
