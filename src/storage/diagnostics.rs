//! Raw page dumps for offline inspection
//!
//! Pages classified as blocked, or that yielded no fields, are written to
//! `<dir>/<id>_<reason>.html`. Writing is best-effort: a failure is logged and
//! never changes the fetch outcome.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DiagnosticStore {
    dir: PathBuf,
}

impl DiagnosticStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the dump for an id and reason lands
    pub fn path_for(&self, id: u64, reason: &str) -> PathBuf {
        let reason: String = reason
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        self.dir.join(format!("{}_{}.html", id, reason))
    }

    /// Writes the page body, logging instead of failing
    pub async fn save(&self, id: u64, reason: &str, body: &str) {
        let path = self.path_for(id, reason);

        let result = async {
            tokio::fs::create_dir_all(&self.dir).await?;
            tokio::fs::write(&path, body).await
        }
        .await;

        match result {
            Ok(()) => tracing::debug!("Saved diagnostic page {}", path.display()),
            Err(e) => tracing::debug!("Could not save diagnostic page {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_sanitizes_reason() {
        let store = DiagnosticStore::new("debug");
        assert_eq!(
            store.path_for(12, "blocked page"),
            PathBuf::from("debug").join("12_blocked-page.html")
        );
    }

    #[tokio::test]
    async fn test_save_writes_body() {
        let dir = TempDir::new().unwrap();
        let store = DiagnosticStore::new(dir.path().join("pages"));

        store.save(5, "empty", "<html>nothing</html>").await;

        let written = std::fs::read_to_string(store.path_for(5, "empty")).unwrap();
        assert_eq!(written, "<html>nothing</html>");
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = DiagnosticStore::new(&blocker);
        store.save(1, "blocked", "body").await;
        assert!(!store.path_for(1, "blocked").exists());
    }
}
