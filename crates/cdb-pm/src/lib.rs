pub mod archive;
pub mod config;
pub mod error;
pub mod http;
pub mod installer;
pub mod modconf;
pub mod package;
pub mod repository;

pub use archive::{ArchiveType, PackageArchive};
pub use config::Config;
pub use error::{ContentDbError, Result};
pub use http::{HttpClient, HttpClientConfig};
pub use installer::{InstallConfig, InstallReport, Installer, PackageSpec};
pub use modconf::ModConf;
pub use package::{Package, Query, Release};
pub use repository::{ContentDbClient, Registry};
