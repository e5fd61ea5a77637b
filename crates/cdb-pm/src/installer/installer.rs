use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use glob::Pattern;

use super::extract::extract_archive;
use crate::archive::{
    ArchiveError, ArchiveType, PackageArchive, INIT_LUA, MODPACK_CONF, MODPACK_TXT, MOD_CONF,
};
use crate::error::{ContentDbError, Result};
use crate::modconf::ModConf;
use crate::package::Package;
use crate::repository::Registry;

/// What the user asked to install: `name`, `author/name`, or either with an
/// `@release` pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub author: Option<String>,
    pub name: String,
    pub release: Option<u64>,
}

impl PackageSpec {
    pub fn parse(identifier: &str) -> Result<Self> {
        let invalid = || ContentDbError::InvalidIdentifier(identifier.to_string());
        let trimmed = identifier.trim();

        let (id, release) = match trimmed.split_once('@') {
            Some((id, release)) => {
                let release = release.parse::<u64>().map_err(|_| invalid())?;
                (id, Some(release))
            }
            None => (trimmed, None),
        };

        let (author, name) = match id.split_once('/') {
            Some((author, name)) => (Some(author), name),
            None => (None, id),
        };

        if author.is_some_and(|a| !is_plain_name(a)) || !is_plain_name(name) {
            return Err(invalid());
        }

        Ok(Self {
            author: author.map(str::to_string),
            name: name.to_string(),
            release,
        })
    }
}

impl FromStr for PackageSpec {
    type Err = ContentDbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(author) = &self.author {
            write!(f, "{}/", author)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(release) = self.release {
            write!(f, "@{}", release)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Directory packages are installed into, one subdirectory each
    pub install_root: PathBuf,
    /// Replace an existing destination instead of failing
    pub overwrite: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            install_root: PathBuf::from("mods"),
            overwrite: false,
        }
    }
}

/// Result of installing one package
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub package: Package,
    pub path: PathBuf,
    pub kind: ArchiveType,
    pub extracted: usize,
    /// Archive entries refused for escaping the destination
    pub skipped: Vec<String>,
}

pub struct Installer {
    registry: Arc<dyn Registry>,
    config: InstallConfig,
}

impl Installer {
    pub fn new(registry: Arc<dyn Registry>, config: InstallConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Resolve a package identifier to a registry package.
    ///
    /// Without an author the registry is searched and the most relevant
    /// result wins.
    pub async fn resolve(&self, spec: &PackageSpec) -> Result<Package> {
        if let Some(author) = &spec.author {
            return self.registry.get_package(author, &spec.name).await;
        }

        let found = self.registry.search(&spec.name).await?;
        log::debug!("Found {} packages for {}:", found.len(), spec.name);
        for pkg in &found {
            log::debug!("  - {} (release={})", pkg.id(), pkg.release_string());
        }

        found
            .into_iter()
            .next()
            .ok_or_else(|| ContentDbError::PackageNotFound { name: spec.name.clone() })
    }

    /// Install a single package by identifier
    pub async fn install_one(&self, identifier: &str) -> Result<InstallReport> {
        let spec = PackageSpec::parse(identifier)?;
        self.install_spec(&spec, &self.config.install_root, self.config.overwrite)
            .await
    }

    /// Install packages one after the other.
    ///
    /// A failure is logged and the batch moves on; every identifier gets its
    /// own result, in input order.
    pub async fn install_many<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> Vec<(String, Result<InstallReport>)> {
        let mut results = Vec::with_capacity(identifiers.len());

        for (i, identifier) in identifiers.iter().enumerate() {
            let identifier = identifier.as_ref();
            log::debug!("Installing {} ({}/{})", identifier, i + 1, identifiers.len());

            let result = self.install_one(identifier).await;
            if let Err(e) = &result {
                log::warn!("Unable to install {}: {}", identifier, e);
            }
            results.push((identifier.to_string(), result));
        }

        results
    }

    /// Reinstall the latest release of an installed package.
    ///
    /// The package is identified by the `author` and `name` recorded in its
    /// configuration, and replaced in place.
    pub async fn update_one(&self, directory: &Path) -> Result<InstallReport> {
        let conf = read_installed_conf(directory)?;

        let (author, name) = match (conf.author(), conf.name()) {
            (Some(author), Some(name)) => (author.to_string(), name.to_string()),
            _ => {
                return Err(ContentDbError::NotManaged {
                    path: directory.to_path_buf(),
                })
            }
        };

        let install_root = install_root_of(directory);

        log::info!(
            "Updating {}/{} (installed release {})",
            author,
            name,
            conf.release().unwrap_or("unknown")
        );

        let spec = PackageSpec {
            author: Some(author),
            name,
            release: None,
        };
        self.install_spec(&spec, &install_root, true).await
    }

    async fn install_spec(
        &self,
        spec: &PackageSpec,
        install_root: &Path,
        overwrite: bool,
    ) -> Result<InstallReport> {
        let mut package = self.resolve(spec).await?;

        let archive = match spec.release {
            Some(release) => {
                let archive = self
                    .registry
                    .download_release(&package.author, &package.name, release)
                    .await?;
                package.release = Some(release);
                archive
            }
            None => self.registry.download(&package.author, &package.name).await?,
        };

        install_archive(&package, &archive, install_root, overwrite)
    }
}

/// Install a downloaded archive as `<install_root>/<package name>`.
pub fn install_archive(
    package: &Package,
    archive: &PackageArchive,
    install_root: &Path,
    overwrite: bool,
) -> Result<InstallReport> {
    let kind = archive.kind();
    let conf_file = match kind.conf_file() {
        Some(conf_file) => conf_file,
        None => {
            return Err(ContentDbError::UnsupportedArchive {
                name: package.id(),
                kind,
            })
        }
    };

    let prefix = content_root(archive, kind).ok_or_else(|| ContentDbError::RootNotFound {
        name: package.id(),
    })?;
    log::debug!("{} is a {} rooted at '{}'", package.id(), kind, prefix);

    let conf_entry = format!("{}{}", prefix, conf_file);
    let mut conf = match archive.read_file(&format!("{}{}", Pattern::escape(&prefix), conf_file)) {
        Ok(bytes) => {
            log::debug!("{} found, using provided one", conf_entry);
            let text = String::from_utf8_lossy(&bytes);
            ModConf::parse(&text).map_err(|source| ContentDbError::ConfParse {
                path: format!("{}:{}", package.id(), conf_entry),
                source,
            })?
        }
        Err(ArchiveError::FileNotFound { .. }) => {
            log::debug!("{} not found, creating one", conf_entry);
            ModConf::new()
        }
        Err(e) => return Err(e.into()),
    };
    merge_package_metadata(&mut conf, package);

    if !is_plain_name(&package.name) {
        return Err(ContentDbError::InvalidIdentifier(package.name.clone()));
    }
    let dest = install_root.join(&package.name);

    if dest.exists() || dest.is_symlink() {
        if !overwrite {
            return Err(ContentDbError::DestinationExists { path: dest });
        }
        log::debug!("Removing previous install at {}", dest.display());
        if dest.is_dir() && !dest.is_symlink() {
            fs::remove_dir_all(&dest)?;
        } else {
            fs::remove_file(&dest)?;
        }
    }

    log::info!("Installing {} into {}", package.id(), dest.display());
    let summary = extract_archive(archive, &prefix, Some(&conf_entry), &dest)?;
    conf.save(&dest.join(conf_file))?;

    Ok(InstallReport {
        package: package.clone(),
        path: dest,
        kind,
        extracted: summary.extracted,
        skipped: summary.skipped,
    })
}

/// Record the registry identity of a package in its configuration.
///
/// `name`, `author` and `release` always reflect the registry; `title` and
/// `description` are only filled in when the package does not set them.
pub fn merge_package_metadata(conf: &mut ModConf, package: &Package) {
    conf.set("name", package.name.as_str());
    conf.set("author", package.author.as_str());
    conf.set("release", package.release_string());

    if !package.title.is_empty() {
        conf.set_if_absent("title", package.title.as_str());
    }
    if !package.short_description.is_empty() {
        conf.set_if_absent("description", package.short_description.as_str());
    }
}

/// Directory inside the archive holding the package's top level
fn content_root(archive: &PackageArchive, kind: ArchiveType) -> Option<String> {
    let markers: &[&str] = match kind {
        ArchiveType::Mod => &[INIT_LUA],
        ArchiveType::Modpack => &[MODPACK_CONF, MODPACK_TXT],
        _ => &[],
    };

    markers.iter().find_map(|marker| match archive.find_file(marker, 1) {
        (0, _) => None,
        (_, dir) => Some(dir),
    })
}

/// Directory holding an installed package; a bare relative name lives in `.`
fn install_root_of(directory: &Path) -> PathBuf {
    match directory.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn read_installed_conf(directory: &Path) -> Result<ModConf> {
    for conf_file in [MOD_CONF, MODPACK_CONF] {
        let path = directory.join(conf_file);
        if path.is_file() {
            return ModConf::load(&path);
        }
    }

    Err(ContentDbError::NotManaged {
        path: directory.to_path_buf(),
    })
}

/// A single, non-special path component
pub(crate) fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(|c: char| c == '/' || c == '\\')
}
