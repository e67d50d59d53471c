use crate::error::ConfigurationError;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads a file with the class names into a vector so that the number ids
/// which come directly from the inference session can be given meaning.
///
/// The line index is the class id, so blank lines are kept as empty labels rather
/// than shifting every later id.
pub fn read_classes_txt_file(filepath: &Path) -> Result<Vec<String>, ConfigurationError> {
    read_trimmed_lines(filepath).map_err(|source| ConfigurationError::ReadFile {
        path: filepath.to_path_buf(),
        source,
    })
}

/// Reads the subset of labels a caller wants to keep. Order and blank lines carry
/// no meaning here.
pub fn read_classes_of_interest(filepath: &Path) -> Result<HashSet<String>, ConfigurationError> {
    let lines = read_trimmed_lines(filepath).map_err(|source| ConfigurationError::ReadFile {
        path: filepath.to_path_buf(),
        source,
    })?;
    Ok(lines.into_iter().filter(|line| !line.is_empty()).collect())
}

fn read_trimmed_lines(filepath: &Path) -> io::Result<Vec<String>> {
    BufReader::new(File::open(filepath)?)
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()))
        .collect()
}
