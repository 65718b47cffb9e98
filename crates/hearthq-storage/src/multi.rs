//! Positional I/O fanned out across mirror roots.
//!
//! A [`MultiFile`] owns one descriptor per configured root for the
//! same logical file. Writes are duplicated to every mirror at the
//! same offset; reads are served from the first (primary) root.
//! Offsets are always explicit, so concurrent appends that reserved
//! disjoint extents never race on a shared cursor.
//!
//! All blocking file calls run on the blocking thread pool.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::PathBuf;
use std::sync::Arc;

use hearthq_core::{Error, Result};

#[derive(Clone)]
pub struct MultiFile {
    files: Arc<Vec<Arc<File>>>,
}

impl MultiFile {
    /// Open (creating if absent) the same relative file under every
    /// mirror, read+write.
    pub async fn open(paths: Vec<PathBuf>) -> Result<Self> {
        let files = tokio::task::spawn_blocking(move || -> io::Result<Vec<Arc<File>>> {
            paths
                .into_iter()
                .map(|path| {
                    OpenOptions::new()
                        .read(true)
                        .write(true)
                        .create(true)
                        .open(path)
                        .map(Arc::new)
                })
                .collect()
        })
        .await
        .map_err(io::Error::other)??;
        Ok(Self {
            files: Arc::new(files),
        })
    }

    /// The primary (first root) descriptor, used for reads.
    pub fn primary(&self) -> Arc<File> {
        self.files[0].clone()
    }

    /// Write the whole buffer at `offset` on every mirror. The buffer
    /// is handed back so callers can return it to the pool.
    pub async fn write_all_at(&self, buf: Vec<u8>, offset: u64) -> Result<Vec<u8>> {
        let files = self.files.clone();
        let buf = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            for file in files.iter() {
                file.write_all_at(&buf, offset).map_err(|e| {
                    if e.kind() == io::ErrorKind::WriteZero {
                        Error::ShortWrite
                    } else {
                        Error::Io(e)
                    }
                })?;
            }
            Ok(buf)
        })
        .await
        .map_err(|e| Error::Io(io::Error::other(e)))??;
        Ok(buf)
    }

    /// Current length of the primary file.
    pub async fn len(&self) -> Result<u64> {
        let file = self.primary();
        let meta = tokio::task::spawn_blocking(move || file.metadata())
            .await
            .map_err(io::Error::other)??;
        Ok(meta.len())
    }

    /// Truncate every mirror to `len`.
    pub async fn set_len(&self, len: u64) -> Result<()> {
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            for file in files.iter() {
                file.set_len(len)?;
            }
            Ok(())
        })
        .await
        .map_err(io::Error::other)??;
        Ok(())
    }

    /// Flush every mirror to stable storage. Best effort: all mirrors
    /// are attempted, the last error wins.
    pub async fn sync_all(&self) -> Result<()> {
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || {
            let mut result = Ok(());
            for file in files.iter() {
                if let Err(e) = file.sync_all() {
                    result = Err(e);
                }
            }
            result
        })
        .await
        .map_err(io::Error::other)??;
        Ok(())
    }
}

/// Read exactly `len` bytes at `offset` from a shared descriptor.
pub async fn read_exact_at(file: Arc<File>, len: usize, offset: u64) -> Result<Vec<u8>> {
    let buf = tokio::task::spawn_blocking(move || -> io::Result<Vec<u8>> {
        let mut buf = crate::pool::get(len);
        file.read_exact_at(&mut buf, offset)?;
        Ok(buf)
    })
    .await
    .map_err(io::Error::other)??;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_land_on_every_mirror() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let paths = vec![a.path().join("f.hrq"), b.path().join("f.hrq")];
        let mf = MultiFile::open(paths.clone()).await.unwrap();

        mf.write_all_at(b"hello".to_vec(), 0).await.unwrap();
        mf.write_all_at(b"world".to_vec(), 5).await.unwrap();

        for path in &paths {
            assert_eq!(std::fs::read(path).unwrap(), b"helloworld");
        }
    }

    #[tokio::test]
    async fn positional_writes_do_not_depend_on_order() {
        let dir = tempfile::tempdir().unwrap();
        let mf = MultiFile::open(vec![dir.path().join("f")]).await.unwrap();

        // Later extent written first, as concurrent producers would.
        mf.write_all_at(b"world".to_vec(), 5).await.unwrap();
        mf.write_all_at(b"hello".to_vec(), 0).await.unwrap();

        assert_eq!(std::fs::read(dir.path().join("f")).unwrap(), b"helloworld");
    }

    #[tokio::test]
    async fn read_exact_at_slices() {
        let dir = tempfile::tempdir().unwrap();
        let mf = MultiFile::open(vec![dir.path().join("f")]).await.unwrap();
        mf.write_all_at(b"abchello".to_vec(), 0).await.unwrap();

        let buf = read_exact_at(mf.primary(), 5, 3).await.unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[tokio::test]
    async fn len_and_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let mf = MultiFile::open(vec![dir.path().join("f")]).await.unwrap();
        mf.write_all_at(vec![0u8; 32], 0).await.unwrap();
        assert_eq!(mf.len().await.unwrap(), 32);

        mf.set_len(16).await.unwrap();
        assert_eq!(mf.len().await.unwrap(), 16);
    }
}
