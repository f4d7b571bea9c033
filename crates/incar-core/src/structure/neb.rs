use crate::domain::{IncarError, IncarResult};
use std::fs;
use std::path::Path;
use tracing::debug;

pub const IMAGES_KEY: &str = "IMAGES";

/// Number of intermediate images: two-digit image folders minus the two
/// endpoints, floored at zero.
pub fn count_neb_images(dir: &Path) -> IncarResult<usize> {
    let entries = fs::read_dir(dir).map_err(|source| {
        IncarError::io_system(
            "IO.NEB_DIR",
            format!("failed to read directory '{}': {}", dir.display(), source),
        )
    })?;

    let mut folders = 0usize;
    for entry in entries {
        let entry = entry.map_err(|source| {
            IncarError::io_system(
                "IO.NEB_DIR",
                format!("failed to list '{}': {}", dir.display(), source),
            )
        })?;
        let is_dir = entry.file_type().is_ok_and(|kind| kind.is_dir());
        if is_dir && is_image_folder_name(&entry.file_name().to_string_lossy()) {
            folders += 1;
        }
    }

    if folders == 0 {
        return Err(IncarError::input_validation(
            "INPUT.NEB_IMAGES",
            format!("no NEB image folders (00, 01, ...) in '{}'", dir.display()),
        ));
    }

    debug!(folders, directory = %dir.display(), "counted NEB image folders");
    Ok(folders.saturating_sub(2))
}

fn is_image_folder_name(name: &str) -> bool {
    name.len() == 2 && name.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::{count_neb_images, is_image_folder_name};
    use std::fs;
    use tempfile::TempDir;

    fn layout(folders: &[&str]) -> TempDir {
        let temp = TempDir::new().expect("tempdir should be created");
        for folder in folders {
            fs::create_dir(temp.path().join(folder)).expect("folder should be created");
        }
        temp
    }

    #[test]
    fn endpoints_are_excluded_from_image_count() {
        let temp = layout(&["00", "01", "02", "03", "04", "05", "06"]);
        assert_eq!(count_neb_images(temp.path()).expect("count should succeed"), 5);
    }

    #[test]
    fn non_image_entries_are_ignored() {
        let temp = layout(&["00", "01", "02", "1", "100", "ab", "logs"]);
        fs::write(temp.path().join("03"), "not a directory").expect("file should be written");
        assert_eq!(count_neb_images(temp.path()).expect("count should succeed"), 1);
    }

    #[test]
    fn single_folder_floors_at_zero() {
        let temp = layout(&["00"]);
        assert_eq!(count_neb_images(temp.path()).expect("count should succeed"), 0);
    }

    #[test]
    fn directory_without_image_folders_is_rejected() {
        let temp = layout(&["relax"]);
        let error = count_neb_images(temp.path()).expect_err("no image folders should fail");
        assert_eq!(error.placeholder(), "INPUT.NEB_IMAGES");
    }

    #[test]
    fn image_folder_names_are_exactly_two_digits() {
        assert!(is_image_folder_name("07"));
        assert!(!is_image_folder_name("7"));
        assert!(!is_image_folder_name("0a"));
    }
}
