//! Filesystem ledger store: one line-per-URL file per community

use async_trait::async_trait;
use img_harvest_domain::ledger::render_lines;
use img_harvest_domain::{Community, LedgerError, LedgerStore, LoadedLedger, UrlLedger};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Ledger files live under a data directory as `<community>_img_list.csv`
pub struct FsLedgerStore {
    data_dir: PathBuf,
    summary_path: PathBuf,
}

impl FsLedgerStore {
    pub fn new(data_dir: impl Into<PathBuf>, summary_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            summary_path: summary_path.into(),
        }
    }

    pub fn ledger_path(&self, community: &Community) -> PathBuf {
        self.data_dir
            .join(format!("{}_img_list.csv", community.as_str()))
    }

    /// Where `quarantine` moves an unreadable ledger
    pub fn corrupt_path(&self, community: &Community) -> PathBuf {
        self.data_dir
            .join(format!("{}_img_list.csv.corrupt", community.as_str()))
    }

    pub fn summary_path(&self) -> &Path {
        &self.summary_path
    }
}

#[async_trait]
impl LedgerStore for FsLedgerStore {
    async fn load(&self, community: &Community) -> LoadedLedger {
        let path = self.ledger_path(community);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return LoadedLedger::missing(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read ledger");
                return LoadedLedger::unreadable(e.to_string());
            }
        };

        match String::from_utf8(bytes) {
            Ok(content) => LoadedLedger::loaded(UrlLedger::parse(&content)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ledger is not valid UTF-8");
                LoadedLedger::unreadable(e.to_string())
            }
        }
    }

    async fn persist(&self, community: &Community, ledger: &UrlLedger) -> Result<(), LedgerError> {
        let path = self.ledger_path(community);
        write_replace(&path, &ledger.to_lines()).await?;
        tracing::debug!(path = %path.display(), entries = ledger.len(), "Wrote ledger");
        Ok(())
    }

    async fn quarantine(&self, community: &Community) -> Result<(), LedgerError> {
        let path = self.ledger_path(community);
        let corrupt = self.corrupt_path(community);
        match fs::rename(&path, &corrupt).await {
            Ok(()) => {
                tracing::warn!(from = %path.display(), to = %corrupt.display(), "Quarantined ledger");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_summary(&self, urls: &[String]) -> Result<(), LedgerError> {
        write_replace(&self.summary_path, &render_lines(urls)).await?;
        tracing::info!(path = %self.summary_path.display(), count = urls.len(), "Wrote run summary");
        Ok(())
    }
}

/// Write to a sibling temp file, then rename it over `path`
async fn write_replace(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Not a file path: {}", path.display()),
            )
        })?;
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let written = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        fs::rename(&tmp_path, path).await
    }
    .await;

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path).await;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn community(name: &str) -> Community {
        Community::new(name).unwrap()
    }

    fn store(dir: &TempDir) -> FsLedgerStore {
        FsLedgerStore::new(dir.path(), dir.path().join("new_img.csv"))
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let loaded = store(&dir).load(&community("Pixiv")).await;

        assert!(loaded.ledger.is_empty());
        assert_eq!(loaded.origin, img_harvest_domain::LedgerOrigin::Missing);
    }

    #[tokio::test]
    async fn test_load_tolerates_bom_comments_and_blanks() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Pixiv_img_list.csv"),
            "\u{feff}https://i.redd.it/a.jpg\r\n\r\n# kept by hand\r\nhttps://i.redd.it/b.png\r\n",
        )
        .unwrap();

        let loaded = store(&dir).load(&community("Pixiv")).await;

        assert_eq!(loaded.origin, img_harvest_domain::LedgerOrigin::Loaded);
        assert_eq!(
            loaded.ledger.to_vec(),
            vec!["https://i.redd.it/a.jpg", "https://i.redd.it/b.png"]
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_unreadable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Pixiv_img_list.csv"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        let loaded = store(&dir).load(&community("Pixiv")).await;

        assert!(loaded.ledger.is_empty());
        assert!(matches!(
            loaded.origin,
            img_harvest_domain::LedgerOrigin::Unreadable { .. }
        ));
    }

    #[tokio::test]
    async fn test_quarantine_keeps_unreadable_bytes() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut bytes = b"https://i.redd.it/a.jpg\nhttps://i.redd.it/b.jpg\n".to_vec();
        bytes.push(0xff);
        std::fs::write(dir.path().join("Pixiv_img_list.csv"), &bytes).unwrap();

        store.quarantine(&community("Pixiv")).await.unwrap();
        let ledger: UrlLedger = ["https://i.redd.it/c.jpg"].into_iter().collect();
        store.persist(&community("Pixiv"), &ledger).await.unwrap();

        assert_eq!(
            std::fs::read(store.corrupt_path(&community("Pixiv"))).unwrap(),
            bytes
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Pixiv_img_list.csv")).unwrap(),
            "https://i.redd.it/c.jpg\n"
        );
    }

    #[tokio::test]
    async fn test_quarantine_without_ledger_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        store(&dir).quarantine(&community("Pixiv")).await.unwrap();
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_persist_then_load_keeps_order() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let ledger: UrlLedger = ["u3", "u1", "u2"].into_iter().collect();

        store.persist(&community("Pixiv"), &ledger).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("Pixiv_img_list.csv")).unwrap();
        assert_eq!(content, "u3\nu1\nu2\n");
        assert_eq!(store.load(&community("Pixiv")).await.ledger, ledger);
    }

    #[tokio::test]
    async fn test_persist_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let ledger: UrlLedger = ["u1"].into_iter().collect();

        store.persist(&community("Pixiv"), &ledger).await.unwrap();
        store.persist(&community("Pixiv"), &ledger).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["Pixiv_img_list.csv"]);
    }

    #[tokio::test]
    async fn test_persist_creates_data_dir() {
        let dir = TempDir::new().unwrap();
        let nested = FsLedgerStore::new(dir.path().join("data/ledgers"), dir.path().join("s.csv"));
        let ledger: UrlLedger = ["u1"].into_iter().collect();

        nested.persist(&community("Pixiv"), &ledger).await.unwrap();

        assert!(dir.path().join("data/ledgers/Pixiv_img_list.csv").exists());
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = dir.path().join("Pixiv_img_list.csv");
        std::fs::write(&path, "old\n").unwrap();
        // A directory squatting on the temp path makes the write fail
        std::fs::create_dir(dir.path().join(".Pixiv_img_list.csv.tmp")).unwrap();

        let ledger: UrlLedger = ["new"].into_iter().collect();
        let result = store.persist(&community("Pixiv"), &ledger).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old\n");
    }

    #[tokio::test]
    async fn test_summary_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store
            .write_summary(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        store.write_summary(&["c".to_string()]).await.unwrap();

        let content = std::fs::read_to_string(store.summary_path()).unwrap();
        assert_eq!(content, "c\n");
    }
}
