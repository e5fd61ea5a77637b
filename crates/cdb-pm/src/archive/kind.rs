//! Heuristic archive classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::package_archive::PackageArchive;

/// What a package archive contains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    #[default]
    Invalid,
    Mod,
    Modpack,
    #[serde(rename = "txp")]
    TexturePack,
    Game,
}

impl ArchiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveType::Invalid => "INVALID",
            ArchiveType::Mod => "mod",
            ArchiveType::Modpack => "modpack",
            ArchiveType::TexturePack => "txp",
            ArchiveType::Game => "game",
        }
    }

    /// Whether the installer knows how to extract this kind
    pub fn is_installable(&self) -> bool {
        matches!(self, ArchiveType::Mod | ArchiveType::Modpack)
    }

    /// Name of the configuration file at the package root
    pub fn conf_file(&self) -> Option<&'static str> {
        match self {
            ArchiveType::Mod => Some(MOD_CONF),
            ArchiveType::Modpack => Some(MODPACK_CONF),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MODPACK_CONF: &str = "modpack.conf";
pub const MODPACK_TXT: &str = "modpack.txt";
pub const MOD_CONF: &str = "mod.conf";
pub const INIT_LUA: &str = "init.lua";

/// One classification rule: the archive holds exactly one `marker` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRule {
    pub marker: &'static str,
    pub kind: ArchiveType,
}

impl KindRule {
    /// Exactly one match, not "at least one": two `mod.conf` files mean the
    /// archive holds several packages and must not be installed as one.
    pub fn matches(&self, archive: &PackageArchive) -> bool {
        archive.find_file(self.marker, 2).0 == 1
    }
}

/// Rules in priority order. Bundle markers win over single-package markers.
pub const KIND_RULES: [KindRule; 4] = [
    KindRule { marker: MODPACK_CONF, kind: ArchiveType::Modpack },
    KindRule { marker: MODPACK_TXT, kind: ArchiveType::Modpack },
    KindRule { marker: MOD_CONF, kind: ArchiveType::Mod },
    KindRule { marker: INIT_LUA, kind: ArchiveType::Mod },
];

/// Evaluate [`KIND_RULES`] in order and stop at the first match.
pub fn classify(archive: &PackageArchive) -> ArchiveType {
    // TODO: detect texture packs (texture_pack.conf) and games (game.conf)
    KIND_RULES
        .iter()
        .find(|rule| rule.matches(archive))
        .map(|rule| rule.kind)
        .unwrap_or(ArchiveType::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::build_zip;

    fn archive(entries: &[(&str, &str)]) -> PackageArchive {
        PackageArchive::new(build_zip(entries)).unwrap()
    }

    #[test]
    fn test_default_is_invalid() {
        assert_eq!(ArchiveType::default(), ArchiveType::Invalid);
        assert!(!ArchiveType::default().is_installable());
    }

    #[test]
    fn test_single_mod_conf_is_mod() {
        let a = archive(&[
            ("sfinv/mod.conf", "name = sfinv"),
            ("sfinv/init.lua", ""),
        ]);
        assert_eq!(a.kind(), ArchiveType::Mod);
    }

    #[test]
    fn test_mod_without_mod_conf() {
        let a = archive(&[("telegram/init.lua", ""), ("telegram/README.md", "")]);
        assert_eq!(a.kind(), ArchiveType::Mod);
    }

    #[test]
    fn test_mod_at_archive_root() {
        let a = archive(&[("init.lua", ""), ("mod.conf", "name = respawn")]);
        assert_eq!(a.kind(), ArchiveType::Mod);
    }

    #[test]
    fn test_mod_with_nested_dirs_before_init() {
        let a = archive(&[("nested/dir/mymod/init.lua", "")]);
        assert_eq!(a.kind(), ArchiveType::Mod);
    }

    #[test]
    fn test_modpack_conf_wins_over_mods() {
        let a = archive(&[
            ("mesecons/modpack.conf", ""),
            ("mesecons/mesecons/mod.conf", ""),
            ("mesecons/mesecons/init.lua", ""),
            ("mesecons/mesecons_lamp/mod.conf", ""),
            ("mesecons/mesecons_lamp/init.lua", ""),
        ]);
        assert_eq!(a.kind(), ArchiveType::Modpack);
    }

    #[test]
    fn test_legacy_modpack_txt() {
        let a = archive(&[
            ("pack/modpack.txt", ""),
            ("pack/a/init.lua", ""),
            ("pack/b/init.lua", ""),
        ]);
        assert_eq!(a.kind(), ArchiveType::Modpack);
    }

    #[test]
    fn test_multiple_mod_conf_without_marker_is_invalid() {
        let a = archive(&[
            ("pack/a/mod.conf", ""),
            ("pack/a/init.lua", ""),
            ("pack/b/mod.conf", ""),
            ("pack/b/init.lua", ""),
        ]);
        assert_eq!(a.kind(), ArchiveType::Invalid);
    }

    #[test]
    fn test_empty_of_markers_is_invalid() {
        let a = archive(&[("textures/stone.png", "")]);
        assert_eq!(a.kind(), ArchiveType::Invalid);
    }

    #[test]
    fn test_rule_order() {
        let markers: Vec<&str> = KIND_RULES.iter().map(|r| r.marker).collect();
        assert_eq!(markers, vec!["modpack.conf", "modpack.txt", "mod.conf", "init.lua"]);
    }

    #[test]
    fn test_rule_matches_exactly_one() {
        let rule = KindRule { marker: MOD_CONF, kind: ArchiveType::Mod };
        assert!(rule.matches(&archive(&[("a/mod.conf", "")])));
        assert!(!rule.matches(&archive(&[("a/mod.conf", ""), ("b/mod.conf", "")])));
        assert!(!rule.matches(&archive(&[("a/init.lua", "")])));
    }

    #[test]
    fn test_archive_type_display() {
        assert_eq!(ArchiveType::Invalid.to_string(), "INVALID");
        assert_eq!(ArchiveType::Mod.to_string(), "mod");
        assert_eq!(ArchiveType::Modpack.to_string(), "modpack");
        assert_eq!(ArchiveType::TexturePack.to_string(), "txp");
        assert_eq!(ArchiveType::Game.to_string(), "game");
    }

    #[test]
    fn test_conf_file() {
        assert_eq!(ArchiveType::Mod.conf_file(), Some("mod.conf"));
        assert_eq!(ArchiveType::Modpack.conf_file(), Some("modpack.conf"));
        assert_eq!(ArchiveType::Game.conf_file(), None);
        assert!(!ArchiveType::Invalid.is_installable());
    }
}
