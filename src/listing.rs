use std::path::Path;

use glob::glob;
use log::warn;

use crate::error::{Result, StitchError};

/// Plain filenames in `directory` ending in `.<extension>`.
///
/// Matching is case-sensitive. With `sorted`, names come back in ascending
/// lexical order; otherwise in whatever order the filesystem yields them.
pub fn list_files_by_extension(directory: &Path, extension: &str, sorted: bool) -> Result<Vec<String>> {
    if !directory.is_dir() {
        return Err(StitchError::io(
            directory,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let dir_pattern = glob::Pattern::escape(&directory.to_string_lossy());
    let pattern = format!("{}/*.{}", dir_pattern, glob::Pattern::escape(extension));

    let mut names = Vec::new();
    for entry in glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                } else {
                    warn!("Skipping non UTF-8 filename {:?}", path);
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Bad path from glob: {:?}", e),
        }
    }

    if sorted {
        names.sort();
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_matching_files_sorted() {
        let dir = tempdir().unwrap();
        for name in ["b_f01.TIF", "a_f00.TIF", "notes.txt", "c.tif"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("sub.TIF")).unwrap();

        let names = list_files_by_extension(dir.path(), "TIF", true).unwrap();
        assert_eq!(names, vec!["a_f00.TIF".to_string(), "b_f01.TIF".to_string()]);
    }

    #[test]
    fn unsorted_listing_has_same_members() {
        let dir = tempdir().unwrap();
        for name in ["z.TIF", "m.TIF", "a.TIF"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let mut names = list_files_by_extension(dir.path(), "TIF", false).unwrap();
        names.sort();
        assert_eq!(names, vec!["a.TIF", "m.TIF", "z.TIF"]);
    }

    #[test]
    fn directory_with_glob_characters() {
        let dir = tempdir().unwrap();
        let plate_dir = dir.path().join("plate[1]");
        fs::create_dir(&plate_dir).unwrap();
        fs::write(plate_dir.join("x.TIF"), b"").unwrap();
        assert_eq!(list_files_by_extension(&plate_dir, "TIF", true).unwrap(), vec!["x.TIF"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(list_files_by_extension(&dir.path().join("absent"), "TIF", true).is_err());
    }
}
