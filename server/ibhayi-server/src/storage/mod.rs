//! Storage for uploaded prescription PDFs.
//!
//! Files land under the configured uploads directory with a UUID prefix so
//! two uploads of the same filename never collide.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

/// Build a collision-free stored filename from the client's original name.
///
/// Path components and unusual characters are stripped so the stored name is
/// always a single safe path segment.
pub fn stored_filename(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("prescription.pdf");

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}_{}", Uuid::new_v4(), sanitized)
}

/// Persist an uploaded PDF and return its path relative to the uploads root.
pub async fn save_prescription_pdf(
    upload_dir: &str,
    original_name: &str,
    bytes: &[u8],
) -> Result<String> {
    let filename = stored_filename(original_name);
    let dir = PathBuf::from(upload_dir);

    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;

    let path = dir.join(&filename);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write upload {}", path.display()))?;

    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_names_are_unique() {
        let a = stored_filename("script.pdf");
        let b = stored_filename("script.pdf");
        assert_ne!(a, b);
        assert!(a.ends_with("_script.pdf"));
    }

    #[test]
    fn stored_names_strip_path_components() {
        let name = stored_filename("../../etc/passwd");
        assert!(!name.contains('/'));
        assert!(name.ends_with("_passwd"));
    }

    #[test]
    fn stored_names_sanitize_odd_characters() {
        let name = stored_filename("dr smith's script (march).pdf");
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn save_writes_file_under_upload_dir() {
        let dir = std::env::temp_dir().join(format!("ibhayi-uploads-{}", Uuid::new_v4()));
        let dir_str = dir.to_string_lossy().to_string();

        let stored = save_prescription_pdf(&dir_str, "script.pdf", b"%PDF-1.4 test")
            .await
            .unwrap();
        let contents = tokio::fs::read(dir.join(&stored)).await.unwrap();
        assert_eq!(contents, b"%PDF-1.4 test");

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
