//! [`FileStorage`]-related definitions.

use std::{
    ffi::OsStr,
    future::Future,
    io,
    path::{Path, PathBuf},
};

use service::domain::media;
use tokio::fs;
use tracerr::Traced;
use uuid::Uuid;

use crate::{AsError, Error};

/// Storage of uploaded media files.
pub trait FileStorage {
    /// Stores the provided `bytes` as a new file in the [`media::Namespace`].
    ///
    /// The `original_name` is used for its extension only, so stored files
    /// never collide.
    ///
    /// # Errors
    ///
    /// If the file cannot be written.
    fn store(
        &self,
        namespace: media::Namespace,
        original_name: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<media::Ref, Traced<io::Error>>> + Send;

    /// Removes the stored file, if it still exists.
    ///
    /// Failures are logged and otherwise ignored, as a leftover file doesn't
    /// affect anything.
    fn delete(&self, file: &media::Ref) -> impl Future<Output = ()> + Send;

    /// Returns the public URL of the stored file.
    fn url(&self, file: &media::Ref) -> String;
}

/// [`FileStorage`] on the local filesystem.
#[derive(Clone, Debug)]
pub struct Local {
    /// Directory the files are stored in.
    root: PathBuf,

    /// URL prefix the files are served under, always ending with `/`.
    url_prefix: String,
}

impl Local {
    /// Creates a new [`Local`] storage in the provided `root` directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let mut url_prefix = url_prefix.into();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }
        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Returns the directory the files are stored in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the URL prefix the files are served under.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Returns the filesystem path of the stored file.
    fn path(&self, file: &media::Ref) -> PathBuf {
        self.root.join(file.as_ref())
    }
}

/// Generates a new unique file name keeping a sane extension of the
/// `original` one.
fn file_name(original: &str) -> String {
    let id = Uuid::new_v4().simple();
    let ext = Path::new(original)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|e| {
            !e.is_empty()
                && e.len() <= 8
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        });
    match ext {
        Some(ext) => format!("{id}.{}", ext.to_ascii_lowercase()),
        None => id.to_string(),
    }
}

impl FileStorage for Local {
    async fn store(
        &self,
        namespace: media::Namespace,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<media::Ref, Traced<io::Error>> {
        let file = media::Ref::new(namespace, &file_name(original_name))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "invalid file name")
            })
            .map_err(tracerr::wrap!())?;
        let path = self.path(&file);

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await.map_err(tracerr::wrap!())?;
        }
        fs::write(&path, bytes).await.map_err(tracerr::wrap!())?;

        tracing::debug!(%file, size = bytes.len(), "stored media file");
        Ok(file)
    }

    async fn delete(&self, file: &media::Ref) {
        match fs::remove_file(self.path(file)).await {
            Ok(()) => tracing::debug!(%file, "deleted media file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(%file, "failed to delete media file: {e}");
            }
        }
    }

    fn url(&self, file: &media::Ref) -> String {
        format!("{}{file}", self.url_prefix)
    }
}

impl AsError for io::Error {
    fn try_as_error(&self) -> Option<Error> {
        None
    }
}

#[cfg(test)]
mod spec {
    use service::domain::media;

    use super::{file_name, FileStorage as _, Local};

    #[test]
    fn keeps_sane_extensions_only() {
        assert!(file_name("Photo.JPG").ends_with(".jpg"));
        assert!(!file_name("archive").contains('.'));
        assert!(!file_name("x.tar/../../sh").contains('/'));
        assert!(!file_name("weird.j p g").contains(' '));
        assert_ne!(file_name("a.png"), file_name("a.png"));
    }

    #[test]
    fn builds_urls_under_prefix() {
        let storage = Local::new("/tmp/unused", "/media");
        let file =
            media::Ref::new(media::Namespace::Agents, "mei.png").unwrap();

        assert_eq!(storage.url(&file), "/media/agents/mei.png");
    }

    #[tokio::test]
    async fn stores_and_deletes_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Local::new(dir.path(), "/media/");

        let file = storage
            .store(media::Namespace::Properties, "front.jpeg", b"jpeg")
            .await
            .unwrap();
        assert_eq!(file.namespace(), Some(media::Namespace::Properties));

        let path = dir.path().join(file.as_ref());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"jpeg");

        storage.delete(&file).await;
        assert!(!path.exists());

        // Already removed files are fine.
        storage.delete(&file).await;
    }
}
