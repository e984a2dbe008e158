//! # biorec
//!
//! A library for reading and writing annotated physiological waveform
//! records: multi-channel sampled signals plus time-stamped, typed event
//! annotations, stored in per-record files and accessed through an
//! open/read-or-write/close protocol with time-based seeking.
//!
//! A record is backed by three resource kinds, resolved through a
//! pluggable [`RecordResolver`]: a text signal header, interleaved 16-bit
//! sample data, and any number of named annotation sets ("annotators").
//! Annotations use a compact delta-time encoding, so a full reference
//! annotation set for an hour-long recording is typically a few kilobytes.
//!
//! ## Reading a record
//!
//! ```rust
//! use biorec::{RecordSession, SampleFrame, Signal, StreamMode};
//!
//! # let signal = Signal {
//! #     label: "MLII".to_string(),
//! #     gain: 200.0,
//! #     baseline: 0,
//! #     frequency: 360.0,
//! #     resolution: 11,
//! #     units: "mV".to_string(),
//! # };
//! # let session = biorec::RecordSession::create("lib_doc_read", 360.0, vec![signal])?;
//! # let mut w = session.open_signals(0, StreamMode::Write)?;
//! # for i in 0..720 { w.write(&SampleFrame::new(vec![i]))?; }
//! # w.close()?;
//! # session.close()?;
//! let session = RecordSession::open("lib_doc_read")?;
//! println!("record has {} channels", session.catalog().len());
//!
//! let mut samples = session.open_signals(0, StreamMode::Read)?;
//! samples.seek(360)?; // one second in
//! while let Some(frame) = samples.read()? {
//!     let millivolts = session.catalog().describe(0)?.to_physical(frame[0]);
//!     # let _ = millivolts;
//!     # break;
//! }
//! samples.close()?;
//! session.close()?;
//! # std::fs::remove_file("lib_doc_read.hea").ok();
//! # std::fs::remove_file("lib_doc_read.dat").ok();
//! # Ok::<(), biorec::RecordError>(())
//! ```
//!
//! ## Copying annotations between annotators
//!
//! Read and write sources can be mixed in one stream; delta continuity is
//! tracked per source, so a filtered rewrite is a plain loop:
//!
//! ```rust
//! use biorec::{Annotation, AnnotationSource, RecordSession, Signal};
//!
//! # let signal = Signal {
//! #     label: "MLII".to_string(),
//! #     gain: 200.0,
//! #     baseline: 0,
//! #     frequency: 360.0,
//! #     resolution: 11,
//! #     units: "mV".to_string(),
//! # };
//! # let session = RecordSession::create("lib_doc_copy", 360.0, vec![signal])?;
//! # let mut w = session.open_annotations(vec![AnnotationSource::write("atr")])?;
//! # w.write(&Annotation::new(100, 1))?;
//! # w.write(&Annotation::new(300, 5))?;
//! # w.close()?;
//! let mut stream = session.open_annotations(vec![
//!     AnnotationSource::read("atr"),
//!     AnnotationSource::write("beats"),
//! ])?;
//!
//! while let Some(ann) = stream.read()? {
//!     // keep beats only, drop everything else
//!     if session.code_table().description(ann.code).is_some() {
//!         stream.write(&ann)?;
//!     }
//! }
//! stream.close()?;
//! session.close()?;
//! # for ext in ["hea", "atr", "beats"] {
//! #     std::fs::remove_file(format!("lib_doc_copy.{}", ext)).ok();
//! # }
//! # Ok::<(), biorec::RecordError>(())
//! ```
//!
//! ## Time bases
//!
//! Sample times are frame indices at the record's frame frequency;
//! annotation times are ticks at the same reference. A [`SampleStream`]
//! can be switched to any logical frequency: slower rates are served by
//! sample-and-hold (each channel's nearest native sample, never
//! interpolated).
//!
//! End of data is not an error: both stream types return `Ok(None)` at the
//! end, on every subsequent call.

pub mod annotations;
pub mod catalog;
pub mod codec;
pub mod codes;
pub mod error;
pub mod resolve;
pub mod sample;
pub mod session;
pub mod types;
pub mod utils;

// Re-export the main types for convenience
pub use annotations::AnnotationStream;
pub use catalog::SignalCatalog;
pub use codec::{AnnotationCodec, DeltaState};
pub use codes::{CodeTable, ACMAX, NORMAL, NOTE, RHYTHM};
pub use error::{RecordError, Result};
pub use resolve::{ByteSink, ByteSource, FileResolver, RecordResolver, ResourceKind};
pub use sample::SampleStream;
pub use session::RecordSession;
pub use types::{
    Annotation, AnnotationMode, AnnotationSource, SampleFrame, Signal, StreamMode,
};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
