//! Package archive model.
//!
//! Wraps the bytes of a downloaded zip and answers the questions the
//! installer asks: what files are inside, where the package root is, and
//! what kind of content it is. Nothing here touches the filesystem.

mod kind;
mod package_archive;

pub use kind::{
    classify, ArchiveType, KindRule, INIT_LUA, KIND_RULES, MODPACK_CONF, MODPACK_TXT, MOD_CONF,
};
pub use package_archive::{ArchiveError, PackageArchive};

pub(crate) use package_archive::{clean_path, parent_dir};
