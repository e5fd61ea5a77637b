//! Package installation.
//!
//! Resolves identifiers against the registry, downloads and classifies the
//! archive, and unpacks it into the install root with its configuration
//! rewritten to record where it came from.

mod extract;
mod installer;
mod lookup;

pub use extract::{contained_path, extract_archive, ExtractSummary};
pub use installer::{
    install_archive, merge_package_metadata, InstallConfig, InstallReport, Installer, PackageSpec,
};
pub use lookup::lookup_mod;
