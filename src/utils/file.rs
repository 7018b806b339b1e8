//! File utilities for the ingest surface.
//!
//! Document byte-stream parsing (PDF, DOCX) is handled upstream; the CLI only
//! accepts already-extracted plain text, so these helpers just guard against
//! binary input and oversized files.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Calculate SHA-256 checksum of content.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Check if a file is likely a text file.
pub fn is_text_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        if is_binary_extension(&ext) {
            return false;
        }
        if is_text_extension(&ext) {
            return true;
        }
    }

    // No recognized extension: sniff the first bytes for null markers
    if let Ok(file) = fs::File::open(path) {
        let mut buffer = [0u8; 512];
        let mut reader = std::io::BufReader::new(file);
        if let Ok(n) = reader.read(&mut buffer) {
            if n == 0 {
                return true;
            }
            return !buffer[..n].contains(&0);
        }
    }

    false
}

/// Read file content with a size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    fs::read_to_string(path)
}

fn is_binary_extension(ext: &str) -> bool {
    matches!(
        ext,
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "png" | "jpg" | "jpeg" | "gif"
            | "zip" | "tar" | "gz" | "exe" | "dll" | "so" | "dylib" | "bin" | "dat"
    )
}

fn is_text_extension(ext: &str) -> bool {
    matches!(
        ext,
        "txt" | "md" | "markdown" | "rst" | "csv" | "json" | "yaml" | "yml" | "toml" | "xml"
            | "html" | "htm" | "log"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn checksum_is_sha256_hex() {
        let checksum = calculate_checksum("hello world");
        assert_eq!(checksum.len(), 64);
        assert_eq!(checksum, calculate_checksum("hello world"));
        assert_ne!(checksum, calculate_checksum("hello worlds"));
    }

    #[test]
    fn recognizes_extensions() {
        assert!(is_text_file(Path::new("report.txt")));
        assert!(is_text_file(Path::new("notes.md")));
        assert!(!is_text_file(Path::new("report.pdf")));
        assert!(!is_text_file(Path::new("scan.png")));
    }

    #[test]
    fn read_rejects_oversized_files() {
        let mut file = tempfile::NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "0123456789").unwrap();

        let err = read_file_content(file.path(), 5).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

        let content = read_file_content(file.path(), 1024).unwrap();
        assert_eq!(content, "0123456789");
    }
}
