//! Upload content: where the bytes come from and what the service needs to
//! know about them before transfer.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use crate::ContentHash;

/// The bytes to upload, either held in memory or read from a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// In-memory content.
    Buffer(Vec<u8>),
    /// Content streamed from a file on disk.
    File(PathBuf),
}

impl ContentSource {
    /// Open a streaming reader over the content.
    pub fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        match self {
            ContentSource::Buffer(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            ContentSource::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }

    /// Get the file path, if this is a file source.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ContentSource::File(path) => Some(path),
            ContentSource::Buffer(_) => None,
        }
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(bytes: Vec<u8>) -> Self {
        ContentSource::Buffer(bytes)
    }
}

impl From<&[u8]> for ContentSource {
    fn from(bytes: &[u8]) -> Self {
        ContentSource::Buffer(bytes.to_vec())
    }
}

impl From<PathBuf> for ContentSource {
    fn from(path: PathBuf) -> Self {
        ContentSource::File(path)
    }
}

impl From<&Path> for ContentSource {
    fn from(path: &Path) -> Self {
        ContentSource::File(path.to_path_buf())
    }
}

/// A single upload request.
///
/// ```
/// use rapidgator_upload::Upload;
///
/// let upload = Upload::buffer("notes.txt", b"hello".to_vec()).folder(42);
/// assert_eq!(upload.name(), "notes.txt");
/// assert_eq!(upload.folder_id(), Some(42));
/// ```
#[derive(Debug, Clone)]
pub struct Upload {
    name: String,
    source: ContentSource,
    folder_id: Option<u64>,
}

impl Upload {
    /// Create an upload from any content source.
    pub fn new(name: impl Into<String>, source: impl Into<ContentSource>) -> Self {
        Upload {
            name: name.into(),
            source: source.into(),
            folder_id: None,
        }
    }

    /// Upload in-memory bytes.
    pub fn buffer(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Upload::new(name, ContentSource::Buffer(bytes.into()))
    }

    /// Upload the file at `path`.
    ///
    /// `name` is the name the file gets on the service, independent of the
    /// local file name.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Upload::new(name, ContentSource::File(path.into()))
    }

    /// Put the file into a specific folder.
    pub fn folder(mut self, folder_id: u64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    pub fn folder_id(&self) -> Option<u64> {
        self.folder_id
    }

    pub(crate) fn into_parts(self) -> (String, ContentSource, Option<u64>) {
        (self.name, self.source, self.folder_id)
    }
}

/// Name, size and hash of some content, ready for the dedup probe.
#[derive(Debug, Clone)]
pub struct ContentDescriptor {
    name: String,
    size: u64,
    hash: ContentHash,
    source: ContentSource,
}

impl ContentDescriptor {
    /// Describe `source` under the logical `name`.
    ///
    /// Files are hashed by streaming, never loaded whole.
    pub fn describe(name: impl Into<String>, source: ContentSource) -> io::Result<Self> {
        let (hash, size) = match &source {
            ContentSource::Buffer(bytes) => {
                (ContentHash::from_content(bytes), bytes.len() as u64)
            }
            ContentSource::File(path) => {
                let file = File::open(path)?;
                if !file.metadata()?.is_file() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("{} is not a regular file", path.display()),
                    ));
                }
                ContentHash::from_reader(file)?
            }
        };

        Ok(ContentDescriptor {
            name: name.into(),
            size,
            hash,
            source,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn source(&self) -> &ContentSource {
        &self.source
    }

    /// Open a reader yielding exactly `size()` bytes.
    ///
    /// Fails if a file source changed length since it was described, since
    /// the transfer has already committed to that length.
    pub fn open(&self) -> io::Result<impl Read + Send + '_> {
        if let ContentSource::File(path) = &self.source {
            let current = std::fs::metadata(path)?.len();
            if current != self.size {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "{} changed size since it was hashed ({} -> {} bytes)",
                        path.display(),
                        self.size,
                        current
                    ),
                ));
            }
        }
        Ok(self.source.open()?.take(self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_describe_buffer() {
        let desc = ContentDescriptor::describe("a.txt", b"test".to_vec().into()).unwrap();
        assert_eq!(desc.name(), "a.txt");
        assert_eq!(desc.size(), 4);
        assert_eq!(desc.hash().to_hex(), "098f6bcd4621d373cade4e832627b4f6");
    }

    #[test]
    fn test_buffer_and_file_describe_identically() {
        let content: Vec<u8> = (0..100_000u32).map(|i| (i % 7) as u8).collect();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&content).unwrap();
        file.flush().unwrap();

        let from_buffer =
            ContentDescriptor::describe("same.bin", ContentSource::Buffer(content.clone()))
                .unwrap();
        let from_file =
            ContentDescriptor::describe("same.bin", file.path().into()).unwrap();

        assert_eq!(from_buffer.size(), from_file.size());
        assert_eq!(from_buffer.hash(), from_file.hash());
    }

    #[test]
    fn test_describe_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentDescriptor::describe("x", dir.path().join("nope").into()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_describe_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ContentDescriptor::describe("x", dir.path().into()).is_err());
    }

    #[test]
    fn test_open_reads_all_bytes() {
        let desc = ContentDescriptor::describe("a", b"hello world".to_vec().into()).unwrap();
        let mut out = Vec::new();
        desc.open().unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello world");
    }

    #[test]
    fn test_open_detects_changed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"short").unwrap();
        file.flush().unwrap();

        let desc = ContentDescriptor::describe("a", file.path().into()).unwrap();
        file.write_all(b" and now longer").unwrap();
        file.flush().unwrap();

        let err = desc.open().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_upload_builder() {
        let upload = Upload::file("remote.bin", "/tmp/local.bin").folder(7);
        assert_eq!(upload.name(), "remote.bin");
        assert_eq!(upload.source().path(), Some(Path::new("/tmp/local.bin")));
        assert_eq!(upload.folder_id(), Some(7));

        let upload = Upload::buffer("b", vec![1, 2, 3]);
        assert_eq!(upload.folder_id(), None);
        assert_eq!(upload.source(), &ContentSource::Buffer(vec![1, 2, 3]));
    }
}
