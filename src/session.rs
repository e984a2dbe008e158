//! Record session: resolves a record name and hands out bound streams.

use std::io::Write;
use std::sync::Arc;

use tracing::debug;

use crate::annotations::AnnotationStream;
use crate::catalog::SignalCatalog;
use crate::codes::CodeTable;
use crate::error::{RecordError, Result};
use crate::resolve::{FileResolver, RecordResolver, ResourceKind};
use crate::sample::SampleStream;
use crate::types::{AnnotationSource, Signal, StreamMode};

/// An open record: the façade every stream is created through
///
/// A session resolves the record's resources once, owns the signal catalog
/// and the code table, and binds [`SampleStream`]s and
/// [`AnnotationStream`]s to them. Streams hold shared read-only handles to
/// the catalog, so they stay valid independently of the session; each
/// stream is closed on its own (explicitly or on drop) and `close` on the
/// session consumes it.
///
/// # Examples
///
/// ```rust
/// use biorec::{Annotation, AnnotationSource, RecordSession, SampleFrame, Signal, StreamMode};
///
/// let signal = Signal {
///     label: "MLII".to_string(),
///     gain: 200.0,
///     baseline: 0,
///     frequency: 360.0,
///     resolution: 11,
///     units: "mV".to_string(),
/// };
///
/// // create a record, write some frames and a beat annotation
/// let session = RecordSession::create("doc_session", 360.0, vec![signal])?;
/// let mut samples = session.open_signals(0, StreamMode::Write)?;
/// for i in 0..360 {
///     samples.write(&SampleFrame::new(vec![i]))?;
/// }
/// samples.close()?;
///
/// let mut beats = session.open_annotations(vec![AnnotationSource::write("atr")])?;
/// beats.write(&Annotation::new(180, 1))?;
/// beats.close()?;
/// session.close()?;
///
/// // reopen and read everything back
/// let session = RecordSession::open("doc_session")?;
/// let mut samples = session.open_signals(0, StreamMode::Read)?;
/// assert_eq!(samples.frames(), 360);
/// assert_eq!(samples.read()?.unwrap()[0], 0);
///
/// let mut beats = session.open_annotations(vec![AnnotationSource::read("atr")])?;
/// assert_eq!(beats.read()?.unwrap().time, 180);
/// session.close()?;
///
/// # for ext in ["hea", "dat", "atr"] {
/// #     std::fs::remove_file(format!("doc_session.{}", ext)).ok();
/// # }
/// # Ok::<(), biorec::RecordError>(())
/// ```
pub struct RecordSession {
    name: String,
    resolver: Arc<dyn RecordResolver>,
    table: Arc<CodeTable>,
    catalog: Arc<SignalCatalog>,
}

impl RecordSession {
    /// Opens an existing record through the default filesystem resolver
    pub fn open(name: &str) -> Result<Self> {
        Self::open_with(name, Arc::new(FileResolver::default()))
    }

    /// Opens an existing record through a caller-supplied resolver
    pub fn open_with(name: &str, resolver: Arc<dyn RecordResolver>) -> Result<Self> {
        let catalog = Arc::new(SignalCatalog::open(name, resolver.as_ref())?);
        debug!(record = name, signals = catalog.len(), "opened record session");
        Ok(RecordSession {
            name: name.to_string(),
            resolver,
            table: CodeTable::shared(),
            catalog,
        })
    }

    /// Creates a new record: writes its header and opens a session on it
    pub fn create(name: &str, frame_frequency: f64, signals: Vec<Signal>) -> Result<Self> {
        Self::create_with(name, frame_frequency, signals, Arc::new(FileResolver::default()))
    }

    /// Creates a new record through a caller-supplied resolver
    pub fn create_with(
        name: &str,
        frame_frequency: f64,
        signals: Vec<Signal>,
        resolver: Arc<dyn RecordResolver>,
    ) -> Result<Self> {
        let catalog = Arc::new(SignalCatalog::build(name, frame_frequency, signals)?);
        let mut sink = resolver.sink(name, ResourceKind::SignalHeader)?;
        sink.write_all(catalog.render().as_bytes())?;
        sink.flush()?;
        debug!(record = name, signals = catalog.len(), "created record");
        Ok(RecordSession {
            name: name.to_string(),
            resolver,
            table: CodeTable::shared(),
            catalog,
        })
    }

    /// Replaces the code table shared with annotation streams opened later
    pub fn set_code_table(&mut self, table: Arc<CodeTable>) {
        self.table = table;
    }

    pub fn code_table(&self) -> &CodeTable {
        &self.table
    }

    pub fn catalog(&self) -> &SignalCatalog {
        &self.catalog
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opens a sample stream bound to the first `requested` channels
    ///
    /// `requested == 0` means "all channels". Fails with `ChannelMismatch`
    /// if the request disagrees with what the record provides; write-mode
    /// streams must always cover the full channel set, otherwise the
    /// interleaved layout would be ambiguous.
    pub fn open_signals(&self, requested: usize, mode: StreamMode) -> Result<SampleStream> {
        let available = self.catalog.len();
        let channels = if requested == 0 { available } else { requested };
        if channels > available || (mode == StreamMode::Write && channels != available) {
            return Err(RecordError::ChannelMismatch {
                record: self.name.clone(),
                requested,
                available,
            });
        }
        match mode {
            StreamMode::Read => {
                let source = self.resolver.source(&self.name, ResourceKind::SignalData)?;
                SampleStream::open_read(Arc::clone(&self.catalog), channels, source)
            }
            StreamMode::Write => {
                let sink = self.resolver.sink(&self.name, ResourceKind::SignalData)?;
                SampleStream::open_write(Arc::clone(&self.catalog), channels, sink)
            }
        }
    }

    /// Opens an annotation stream over the given sources
    ///
    /// The source list is consumed; read sources merge into one
    /// time-ordered stream, write sources all receive every written event.
    pub fn open_annotations(&self, sources: Vec<AnnotationSource>) -> Result<AnnotationStream> {
        AnnotationStream::open(
            &self.name,
            sources,
            self.resolver.as_ref(),
            Arc::clone(&self.table),
        )
    }

    /// Ends the session
    ///
    /// Streams already handed out stay usable until they are closed
    /// themselves; they share the catalog, not the session.
    pub fn close(self) -> Result<()> {
        debug!(record = self.name, "closed record session");
        Ok(())
    }
}
