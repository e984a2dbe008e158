use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Annotator '{annotator}' not found for record {record}")]
    AnnotatorNotFound { record: String, annotator: String },

    #[error("Signal index {index} out of range ({count} signals in record {record})")]
    SignalIndexOutOfRange {
        record: String,
        index: usize,
        count: usize,
    },

    #[error("Invalid header for record {record}: {detail}")]
    InvalidHeader { record: String, detail: String },

    #[error("Malformed annotation data in {annotator} near time {time}: {detail}")]
    Malformed {
        annotator: String,
        time: u64,
        detail: String,
    },

    #[error("Seek to time {target} is past the end of record {record} ({frames} frames)")]
    SeekOutOfRange {
        record: String,
        target: u64,
        frames: u64,
    },

    #[error("Record {record} has {available} channels, {requested} requested")]
    ChannelMismatch {
        record: String,
        requested: usize,
        available: usize,
    },

    #[error("Frame has {got} samples, stream is bound to {expected} channels (record {record})")]
    ChannelCountMismatch {
        record: String,
        got: usize,
        expected: usize,
    },

    #[error("Time {time} in {annotator} precedes previous annotation time {previous}")]
    TimeNotMonotonic {
        annotator: String,
        time: u64,
        previous: u64,
    },

    #[error("Unknown annotation code {0}")]
    UnknownCode(u8),

    #[error("Aux payload of {0} bytes exceeds the 255 byte limit")]
    AuxTooLong(usize),

    #[error("Logical frequency must be positive, got {0}")]
    InvalidFrequency(f64),

    #[error("Annotation stream for record {0} has no write-mode source")]
    NoWriteSource(String),

    #[error("Stream {stream} was not opened for {needed}")]
    ModeMismatch {
        stream: String,
        needed: &'static str,
    },

    #[error("Stream {0} is closed")]
    ClosedStream(String),

    #[error("Flush failed for {stream}: {source}")]
    FlushFailed {
        stream: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, RecordError>;
