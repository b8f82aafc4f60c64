//! Source discovery and submission order
//!
//! Files are ordered by the first run of digits in their name, compared as an
//! integer of any size (`program_2.c` < `program_10.c`). Names without digits
//! go last. Equal keys fall back to the filename, so the order never depends
//! on directory listing order.

use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, warn};

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// True if `filename` carries the recognized extension (`ext` without the dot).
pub fn has_source_extension(filename: &str, ext: &str) -> bool {
    Path::new(filename)
        .extension()
        .map(|e| e == ext)
        .unwrap_or(false)
}

/// First run of ASCII digits with leading zeros stripped ("007" -> "7", "000" -> "0").
pub fn numeric_key(filename: &str) -> Option<&str> {
    DIGITS.find(filename).map(|m| {
        let digits = m.as_str().trim_start_matches('0');
        if digits.is_empty() {
            "0"
        } else {
            digits
        }
    })
}

/// Submission order: numeric key ascending, keyless names last, then by name.
pub fn compare_filenames(a: &str, b: &str) -> Ordering {
    let by_key = match (numeric_key(a), numeric_key(b)) {
        // Normalized digit strings: longer is larger, same length compares lexically
        (Some(x), Some(y)) => x.len().cmp(&y.len()).then_with(|| x.cmp(y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_key.then_with(|| a.cmp(b))
}

/// Sort filenames into submission order.
pub fn sort_for_submission(files: &mut [String]) {
    files.sort_by(|a, b| compare_filenames(a, b));
}

/// List recognized source files in `dir` (non-recursive), in submission order.
pub fn discover_sources(dir: &Path, ext: &str) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|source| PipelineError::InputDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::InputDir {
            path: dir.to_path_buf(),
            source,
        })?;

        if !entry.path().is_file() {
            continue;
        }

        match entry.file_name().into_string() {
            Ok(name) if has_source_extension(&name, ext) => files.push(name),
            Ok(name) => debug!("Skipping {} (not a .{} file)", name, ext),
            Err(name) => warn!("Skipping non UTF-8 filename {:?}", name),
        }
    }

    sort_for_submission(&mut files);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_order_not_lexicographic() {
        let mut files = vec![
            "program_2.c".to_string(),
            "program_10.c".to_string(),
            "program_1.c".to_string(),
        ];
        sort_for_submission(&mut files);
        assert_eq!(files, vec!["program_1.c", "program_2.c", "program_10.c"]);
    }

    #[test]
    fn test_names_without_digits_sort_last() {
        let mut files = vec![
            "main.c".to_string(),
            "program_300.c".to_string(),
            "helper.c".to_string(),
            "program_4.c".to_string(),
        ];
        sort_for_submission(&mut files);
        assert_eq!(
            files,
            vec!["program_4.c", "program_300.c", "helper.c", "main.c"]
        );
    }

    #[test]
    fn test_first_digit_run_is_the_key() {
        assert_eq!(numeric_key("run12_v3.c"), Some("12"));
        assert_eq!(numeric_key("program_007.c"), Some("7"));
        assert_eq!(numeric_key("program_000.c"), Some("0"));
        assert_eq!(numeric_key("main.c"), None);
    }

    #[test]
    fn test_keys_larger_than_u64() {
        let huge = "program_123456789012345678901234567890.c";
        assert_eq!(compare_filenames("program_99.c", huge), Ordering::Less);
        assert_eq!(compare_filenames(huge, "main.c"), Ordering::Less);
    }

    #[test]
    fn test_equal_keys_fall_back_to_name() {
        assert_eq!(compare_filenames("b_1.c", "a_01.c"), Ordering::Greater);
        assert_eq!(compare_filenames("a_1.c", "a_1.c"), Ordering::Equal);
    }

    #[test]
    fn test_extension_matching() {
        assert!(has_source_extension("program_1.c", "c"));
        assert!(!has_source_extension("program_1.cpp", "c"));
        assert!(!has_source_extension("program_1.c.txt", "c"));
        assert!(!has_source_extension("program_1_-O0.exe", "c"));
        assert!(!has_source_extension("c", "c"));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["program_10.c", "program_2.c", "notes.txt", "program_1.c"] {
            std::fs::write(dir.path().join(name), "int main(){return 0;}\n").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested_5.c")).unwrap();

        let files = discover_sources(dir.path(), "c").unwrap();
        assert_eq!(files, vec!["program_1.c", "program_2.c", "program_10.c"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let err = discover_sources(Path::new("/nonexistent/random_c_programs"), "c").unwrap_err();
        assert!(matches!(err, PipelineError::InputDir { .. }));
    }
}
