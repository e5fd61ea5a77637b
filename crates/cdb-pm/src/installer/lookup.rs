use std::path::{Path, PathBuf};

use super::installer::is_plain_name;
use crate::archive::MODPACK_CONF;
use crate::error::{ContentDbError, Result};

/// Find an installed mod by name.
///
/// Each game directory is checked for `mods/<name>` first. Only when no
/// directory has it are modpacks searched (`mods/*/modpack.conf` with a
/// `<name>` sibling).
pub fn lookup_mod<P: AsRef<Path>>(name: &str, game_dirs: &[P]) -> Result<PathBuf> {
    log::debug!("Searching for mod {}", name);

    if !is_plain_name(name) {
        return Err(ContentDbError::ModNotFound { name: name.to_string() });
    }

    for top in game_dirs {
        let candidate = top.as_ref().join("mods").join(name);
        log::trace!("Checking {}", candidate.display());
        if candidate.is_dir() {
            log::debug!("Found mod at {}", candidate.display());
            return Ok(candidate);
        }
    }

    for top in game_dirs {
        let mods = top.as_ref().join("mods");
        let pattern = format!(
            "{}/*/{}",
            glob::Pattern::escape(&mods.to_string_lossy()),
            MODPACK_CONF
        );
        log::trace!("Searching modpacks at {}", pattern);

        let entries = glob::glob(&pattern)
            .map_err(|e| ContentDbError::Config(format!("Invalid game directory {}: {}", mods.display(), e)))?;

        for modpack_conf in entries.flatten() {
            let Some(pack) = modpack_conf.parent() else {
                continue;
            };
            let candidate = pack.join(name);
            if candidate.is_dir() {
                log::debug!("Found mod at {}", candidate.display());
                return Ok(candidate);
            }
        }
    }

    log::debug!("Mod {} not found", name);
    Err(ContentDbError::ModNotFound { name: name.to_string() })
}
