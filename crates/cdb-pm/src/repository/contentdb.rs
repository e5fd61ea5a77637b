use async_trait::async_trait;

use super::traits::Registry;
use crate::archive::PackageArchive;
use crate::error::{ContentDbError, Result};
use crate::http::{HttpClient, HttpClientConfig, HttpError};
use crate::package::{Package, Query, Release};

/// ContentDB HTTP API client
pub struct ContentDbClient {
    http: HttpClient,
}

impl ContentDbClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Ok(Self::new(HttpClient::with_config(config)?))
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    async fn fetch_archive(&self, path: &str) -> Result<PackageArchive> {
        let bytes = self.http.get_bytes(path).await?;
        log::trace!("Decoding archive of {} bytes", bytes.len());
        Ok(PackageArchive::new(bytes)?)
    }
}

#[async_trait]
impl Registry for ContentDbClient {
    async fn list_packages(&self, query: Option<&Query>) -> Result<Vec<Package>> {
        let pairs = query.map(Query::to_pairs).unwrap_or_default();
        Ok(self.http.get_json("/api/packages/", &pairs).await?)
    }

    async fn get_package(&self, author: &str, name: &str) -> Result<Package> {
        let result = self
            .http
            .get_json::<Package, &str, &str>(&package_path(author, name), &[])
            .await;

        not_found_as(result, || ContentDbError::PackageNotFound {
            name: format!("{}/{}", author, name),
        })
    }

    async fn list_releases(&self, author: &str, name: &str) -> Result<Vec<Release>> {
        let path = format!("{}/releases/", package_path(author, name));
        let result = self.http.get_json::<Vec<Release>, &str, &str>(&path, &[]).await;

        not_found_as(result, || ContentDbError::PackageNotFound {
            name: format!("{}/{}", author, name),
        })
    }

    async fn get_release(&self, author: &str, name: &str, release: u64) -> Result<Release> {
        let path = format!("{}/releases/{}", package_path(author, name), release);
        let result = self.http.get_json::<Release, &str, &str>(&path, &[]).await;

        not_found_as(result, || ContentDbError::ReleaseNotFound {
            name: format!("{}/{}", author, name),
            release: release.to_string(),
        })
    }

    async fn download(&self, author: &str, name: &str) -> Result<PackageArchive> {
        let path = format!(
            "/packages/{}/{}/download/",
            urlencoding::encode(author),
            urlencoding::encode(name)
        );

        match self.fetch_archive(&path).await {
            Err(ContentDbError::Http(HttpError::NotFound { .. })) => {
                Err(ContentDbError::PackageNotFound {
                    name: format!("{}/{}", author, name),
                })
            }
            other => other,
        }
    }

    async fn download_release(&self, author: &str, name: &str, release: u64) -> Result<PackageArchive> {
        let info = self.get_release(author, name, release).await?;
        if info.url.is_empty() {
            return Err(ContentDbError::ReleaseNotFound {
                name: format!("{}/{}", author, name),
                release: release.to_string(),
            });
        }

        // Release URLs are relative to the registry host
        self.fetch_archive(&info.url).await
    }
}

fn package_path(author: &str, name: &str) -> String {
    format!(
        "/api/packages/{}/{}",
        urlencoding::encode(author),
        urlencoding::encode(name)
    )
}

fn not_found_as<T>(
    result: std::result::Result<T, HttpError>,
    not_found: impl FnOnce() -> ContentDbError,
) -> Result<T> {
    match result {
        Err(HttpError::NotFound { .. }) => Err(not_found()),
        other => other.map_err(ContentDbError::from),
    }
}
