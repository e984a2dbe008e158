//! Signal catalog: the channel set of a record.
//!
//! The catalog is parsed from the record's text header:
//!
//! ```text
//! # optional comment lines
//! <record> <nsig> <frame_frequency> <frames> [<hh:mm:ss> <dd/mm/yyyy>]
//! <label> <native_frequency> <gain> <baseline> <resolution_bits> <units>
//! ```
//!
//! `frames` may be 0, meaning the frame count is derived from the length of
//! the sample data. All header fields are single whitespace-separated
//! tokens.

use std::io::Read;

use chrono::{NaiveDate, NaiveTime};

use crate::error::{RecordError, Result};
use crate::resolve::{RecordResolver, ResourceKind};
use crate::types::Signal;
use crate::utils::{parse_i64_field, parse_positive_field, parse_u64_field};

/// Immutable description of a record's channels
///
/// Opened once per session and shared read-only with every sample stream
/// bound to the record.
#[derive(Debug, Clone)]
pub struct SignalCatalog {
    record: String,
    frame_frequency: f64,
    frames: u64,
    start_time: Option<NaiveTime>,
    start_date: Option<NaiveDate>,
    signals: Vec<Signal>,
}

impl SignalCatalog {
    /// Resolves and parses the signal header for a record
    pub fn open(record: &str, resolver: &dyn RecordResolver) -> Result<Self> {
        let mut source = resolver.source(record, ResourceKind::SignalHeader)?;
        let mut text = String::new();
        source
            .read_to_string(&mut text)
            .map_err(|_| invalid(record, "header is not valid UTF-8"))?;
        Self::parse(record, &text)
    }

    /// Builds an in-memory catalog for a record being created
    pub fn build(record: &str, frame_frequency: f64, signals: Vec<Signal>) -> Result<Self> {
        if !(frame_frequency.is_finite() && frame_frequency > 0.0) {
            return Err(RecordError::InvalidFrequency(frame_frequency));
        }
        if signals.is_empty() {
            return Err(invalid(record, "a record needs at least one signal"));
        }
        Ok(SignalCatalog {
            record: record.to_string(),
            frame_frequency,
            frames: 0,
            start_time: None,
            start_date: None,
            signals,
        })
    }

    pub(crate) fn parse(record: &str, text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));

        let first = lines
            .next()
            .ok_or_else(|| invalid(record, "empty header"))?;
        let fields: Vec<&str> = first.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(invalid(record, "record line needs at least 4 fields"));
        }

        let name = fields[0].to_string();
        let nsig = parse_u64_field(fields[1])
            .filter(|&n| n > 0)
            .ok_or_else(|| invalid(record, "bad signal count"))? as usize;
        let frame_frequency = parse_positive_field(fields[2])
            .ok_or_else(|| invalid(record, "bad frame frequency"))?;
        let frames =
            parse_u64_field(fields[3]).ok_or_else(|| invalid(record, "bad frame count"))?;

        let start_time = fields
            .get(4)
            .map(|s| {
                NaiveTime::parse_from_str(s, "%H:%M:%S")
                    .map_err(|_| invalid(record, "bad start time"))
            })
            .transpose()?;
        let start_date = fields
            .get(5)
            .map(|s| {
                NaiveDate::parse_from_str(s, "%d/%m/%Y")
                    .map_err(|_| invalid(record, "bad start date"))
            })
            .transpose()?;

        let mut signals = Vec::with_capacity(nsig);
        for line in lines.take(nsig) {
            signals.push(Self::parse_signal(record, line)?);
        }
        if signals.len() != nsig {
            return Err(invalid(
                record,
                &format!("expected {} signal lines, found {}", nsig, signals.len()),
            ));
        }

        Ok(SignalCatalog {
            record: name,
            frame_frequency,
            frames,
            start_time,
            start_date,
            signals,
        })
    }

    fn parse_signal(record: &str, line: &str) -> Result<Signal> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 6 {
            return Err(invalid(record, "signal line needs 6 fields"));
        }
        Ok(Signal {
            label: fields[0].to_string(),
            frequency: parse_positive_field(fields[1])
                .ok_or_else(|| invalid(record, "bad signal frequency"))?,
            gain: parse_positive_field(fields[2])
                .ok_or_else(|| invalid(record, "bad signal gain"))?,
            baseline: parse_i64_field(fields[3])
                .ok_or_else(|| invalid(record, "bad signal baseline"))?
                as i32,
            resolution: parse_u64_field(fields[4])
                .filter(|r| (1..=32).contains(r))
                .ok_or_else(|| invalid(record, "bad signal resolution"))? as u8,
            units: fields[5].to_string(),
        })
    }

    /// Renders the header text for this catalog
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {} {}",
            self.record,
            self.signals.len(),
            self.frame_frequency,
            self.frames
        ));
        if let (Some(time), Some(date)) = (self.start_time, self.start_date) {
            out.push_str(&format!(
                " {} {}",
                time.format("%H:%M:%S"),
                date.format("%d/%m/%Y")
            ));
        }
        out.push('\n');
        for signal in &self.signals {
            out.push_str(&format!(
                "{} {} {} {} {} {}\n",
                signal.label,
                signal.frequency,
                signal.gain,
                signal.baseline,
                signal.resolution,
                signal.units
            ));
        }
        out
    }

    /// The signal at `index`
    pub fn describe(&self, index: usize) -> Result<&Signal> {
        self.signals
            .get(index)
            .ok_or_else(|| RecordError::SignalIndexOutOfRange {
                record: self.record.clone(),
                index,
                count: self.signals.len(),
            })
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    /// The disk frame rate, equal to the fastest native channel frequency
    pub fn frame_frequency(&self) -> f64 {
        self.frame_frequency
    }

    /// Declared frame count; 0 means "derive from the data length"
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        self.start_time
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }
}

fn invalid(record: &str, detail: &str) -> RecordError {
    RecordError::InvalidHeader {
        record: record.to_string(),
        detail: detail.to_string(),
    }
}
