//! Record resource resolution.
//!
//! The core is agnostic to where record resources live; it asks a
//! [`RecordResolver`] for byte sources and sinks by record name and
//! resource kind. The default [`FileResolver`] maps a record onto flat
//! files in one directory: `<record>.hea`, `<record>.dat` and
//! `<record>.<annotator>`.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use crate::error::{RecordError, Result};

/// Readable, seekable byte stream backing a record resource
pub trait ByteSource: Read + Seek {}
impl<T: Read + Seek> ByteSource for T {}

/// Writable byte stream backing a record resource
pub trait ByteSink: Write {}
impl<T: Write> ByteSink for T {}

/// The resource classes a record is composed of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind<'a> {
    /// The signal header describing the channel set
    SignalHeader,
    /// The interleaved sample data
    SignalData,
    /// One named annotation set
    Annotations(&'a str),
}

/// Resolves a record name to the byte streams backing its resources
///
/// Implementations may be backed by the local filesystem, an archive or a
/// network store; the core never interprets paths itself.
pub trait RecordResolver {
    /// Opens an existing resource for reading
    fn source(&self, record: &str, kind: ResourceKind<'_>) -> Result<Box<dyn ByteSource>>;

    /// Creates (or truncates) a resource for writing
    fn sink(&self, record: &str, kind: ResourceKind<'_>) -> Result<Box<dyn ByteSink>>;
}

/// Filesystem-backed resolver rooted at a base directory
///
/// # Examples
///
/// ```rust
/// use biorec::{FileResolver, RecordResolver, ResourceKind};
///
/// let resolver = FileResolver::new("/tmp");
/// // missing records surface as RecordNotFound, not raw IO errors
/// assert!(resolver
///     .source("no_such_record", ResourceKind::SignalHeader)
///     .is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FileResolver {
    base: PathBuf,
}

impl FileResolver {
    pub fn new(base: impl AsRef<Path>) -> Self {
        FileResolver {
            base: base.as_ref().to_path_buf(),
        }
    }

    fn path(&self, record: &str, kind: ResourceKind<'_>) -> PathBuf {
        let file_name = match kind {
            ResourceKind::SignalHeader => format!("{}.hea", record),
            ResourceKind::SignalData => format!("{}.dat", record),
            ResourceKind::Annotations(annotator) => format!("{}.{}", record, annotator),
        };
        self.base.join(file_name)
    }

    fn not_found(record: &str, kind: ResourceKind<'_>) -> RecordError {
        match kind {
            ResourceKind::Annotations(annotator) => RecordError::AnnotatorNotFound {
                record: record.to_string(),
                annotator: annotator.to_string(),
            },
            _ => RecordError::RecordNotFound(record.to_string()),
        }
    }
}

impl Default for FileResolver {
    fn default() -> Self {
        FileResolver::new(".")
    }
}

impl RecordResolver for FileResolver {
    fn source(&self, record: &str, kind: ResourceKind<'_>) -> Result<Box<dyn ByteSource>> {
        let path = self.path(record, kind);
        match File::open(&path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Self::not_found(record, kind))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn sink(&self, record: &str, kind: ResourceKind<'_>) -> Result<Box<dyn ByteSink>> {
        let path = self.path(record, kind);
        let file = File::create(&path)?;
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_record_naming() {
        let resolver = FileResolver::new("/data");
        assert_eq!(
            resolver.path("100", ResourceKind::SignalHeader),
            PathBuf::from("/data/100.hea")
        );
        assert_eq!(
            resolver.path("100", ResourceKind::SignalData),
            PathBuf::from("/data/100.dat")
        );
        assert_eq!(
            resolver.path("100", ResourceKind::Annotations("atr")),
            PathBuf::from("/data/100.atr")
        );
    }

    #[test]
    fn missing_annotator_maps_to_annotator_not_found() {
        let resolver = FileResolver::new(".");
        let err = resolver
            .source("definitely_missing", ResourceKind::Annotations("atr"))
            .err()
            .unwrap();
        assert!(matches!(err, RecordError::AnnotatorNotFound { .. }));
    }
}
