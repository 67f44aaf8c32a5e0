/// Asset file contracts: mesh, material, collision and texture lookup

mod binary;
pub mod mesh_file;
pub mod material_file;
pub mod collision_file;
pub mod texture_path;

pub use mesh_file::*;
pub use material_file::*;
pub use collision_file::*;
pub use texture_path::*;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// `<base>.<extension>`, keeping any dot already present in `base`
pub fn companion_path(base: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}
