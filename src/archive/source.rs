use crate::error::{PakError, Result};
use std::collections::BTreeMap;
use std::path::{Component, Path};
use walkdir::WalkDir;

/// Read every regular file below `root` into `(path, bytes)` pairs.
///
/// Keys are the file path relative to `root`, with `/` separators and a leading
/// `/` (`root/b/c.txt` becomes `/b/c.txt`). Symlinks are not followed.
pub fn read_entries(root: &Path) -> Result<BTreeMap<String, Vec<u8>>> {
    let mut entries = BTreeMap::new();

    for dir_entry in WalkDir::new(root).follow_links(false) {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type().is_file() {
            continue;
        }

        let relative = dir_entry.path().strip_prefix(root).map_err(|_| {
            PakError::PathError(format!(
                "{} is not below {}",
                dir_entry.path().display(),
                root.display()
            ))
        })?;
        let path = archive_path(relative)?;
        let data = std::fs::read(dir_entry.path())?;

        tracing::trace!(path = %path, size = data.len(), "read pak source file");
        entries.insert(path, data);
    }

    Ok(entries)
}

/// Join the normal components of a relative path as `/a/b/c`
fn archive_path(relative: &Path) -> Result<String> {
    let mut path = String::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    PakError::PathError(format!(
                        "non UTF-8 path: {}",
                        relative.display()
                    ))
                })?;
                path.push('/');
                path.push_str(name);
            }
            Component::CurDir => {}
            _ => {
                return Err(PakError::PathError(format!(
                    "unexpected path component in {}",
                    relative.display()
                )))
            }
        }
    }
    Ok(path)
}
