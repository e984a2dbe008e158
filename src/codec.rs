//! Annotation wire codec.
//!
//! The compact encoding is a sequence of 16-bit little-endian words. Each
//! annotation contributes one word holding its type code (high 6 bits) and
//! the tick delta from the previous annotation (low 10 bits), optionally
//! followed by modifier words:
//!
//! - `SKIP` (59): 32-bit tick increment (two LE words, high word first) for
//!   deltas too large for 10 bits; written before the annotation word.
//! - `NUM` (60): new running `num` value (persists across annotations).
//! - `SUB` (61): `subtype` of the current annotation only.
//! - `CHN` (62): new running `channel` value (persists).
//! - `AUX` (63): payload length in the low 8 bits, then the payload bytes,
//!   NUL-padded to word alignment.
//!
//! A zero word terminates the stream; physical end of data is an equally
//! valid terminator. Codes 50..=58 are unassigned and rejected.

use std::sync::Arc;

use crate::codes::CodeTable;
use crate::error::{RecordError, Result};
use crate::types::Annotation;

const CODE_SHIFT: u16 = 10;
const DATA_MASK: u16 = 0x03ff;
/// Longest interval representable in a single annotation word
const MAX_DELTA: u64 = DATA_MASK as u64;

const SKIP: u8 = 59;
const NUM: u8 = 60;
const SUB: u8 = 61;
const CHN: u8 = 62;
const AUX: u8 = 63;

/// Fixed-width alternate encoding: bytes per event
const FIXED_EVENT_LEN: usize = 16;
/// Fixed-width alternate encoding: aux bytes per event
const FIXED_AUX_LEN: usize = 6;
/// Fixed-width alternate encoding: block size padded on close
pub(crate) const FIXED_BLOCK_LEN: u64 = 1024;
/// Fixed-width alternate encoding: end-of-data filler byte
pub(crate) const FIXED_PAD: u8 = 0xff;

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

// 32-bit values are stored as two 16-bit LE words, high word first.
fn put_u32(out: &mut Vec<u8>, value: u32) {
    put_u16(out, (value >> 16) as u16);
    put_u16(out, value as u16);
}

fn get_u16(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

fn get_i32(buf: &[u8], pos: usize) -> i32 {
    let high = get_u16(buf, pos) as u32;
    let low = get_u16(buf, pos + 2) as u32;
    ((high << 16) | low) as i32
}

fn sign_extend_10(word: u16) -> i16 {
    (((word & DATA_MASK) << 6) as i16) >> 6
}

/// Delta continuity between consecutive annotations of one stream
///
/// The codec itself is stateless; the stream owns one `DeltaState` per
/// source and threads it through every encode/decode call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaState {
    /// Time of the previous annotation, in ticks
    pub time: u64,
    /// Running channel field
    pub channel: u8,
    /// Running num field
    pub num: i8,
}

impl DeltaState {
    /// Folds a just-written annotation into the running state
    pub fn advance(&mut self, ann: &Annotation) {
        self.time = ann.time;
        self.channel = ann.channel;
        self.num = ann.num;
    }
}

/// Encodes and decodes single annotations against a caller-owned
/// [`DeltaState`]
///
/// A codec is bound to a code table and an identity label (usually
/// `record/annotator`) that is reported in decode and ordering errors so
/// failures are locatable without re-scanning.
///
/// # Examples
///
/// ```rust
/// use biorec::{Annotation, AnnotationCodec, CodeTable, DeltaState};
///
/// let codec = AnnotationCodec::new(CodeTable::shared(), "100/atr");
/// let ann = Annotation::new(77, 1);
///
/// let mut state = DeltaState::default();
/// let bytes = codec.encode(&state, &ann)?;
/// state.advance(&ann);
///
/// let mut rd = DeltaState::default();
/// let (decoded, consumed) = codec.decode(&mut rd, &bytes, 0)?.unwrap();
/// assert_eq!(decoded, ann);
/// assert_eq!(consumed, bytes.len());
/// # Ok::<(), biorec::RecordError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AnnotationCodec {
    table: Arc<CodeTable>,
    label: String,
}

impl AnnotationCodec {
    pub fn new(table: Arc<CodeTable>, label: impl Into<String>) -> Self {
        AnnotationCodec {
            table,
            label: label.into(),
        }
    }

    /// The identity label reported in this codec's errors
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn table(&self) -> &CodeTable {
        &self.table
    }

    fn check(&self, state: &DeltaState, ann: &Annotation) -> Result<()> {
        if !self.table.is_valid(ann.code) {
            return Err(RecordError::UnknownCode(ann.code));
        }
        if ann.time < state.time {
            return Err(RecordError::TimeNotMonotonic {
                annotator: self.label.clone(),
                time: ann.time,
                previous: state.time,
            });
        }
        Ok(())
    }

    /// Encodes one annotation relative to the previous one
    ///
    /// Deterministic: the same `(state, annotation)` pair always yields the
    /// same bytes. Fails with `TimeNotMonotonic` if the annotation time
    /// precedes `state.time`, and with `UnknownCode`/`AuxTooLong` on field
    /// values the encoding cannot represent.
    pub fn encode(&self, state: &DeltaState, ann: &Annotation) -> Result<Vec<u8>> {
        self.check(state, ann)?;
        let mut out = Vec::with_capacity(8);

        let mut delta = ann.time - state.time;
        while delta > MAX_DELTA {
            // the remainder after the skip must still fit a data field
            let skip = (delta - MAX_DELTA).min(i32::MAX as u64);
            put_u16(&mut out, (SKIP as u16) << CODE_SHIFT);
            put_u32(&mut out, skip as u32);
            delta -= skip;
        }

        put_u16(
            &mut out,
            ((ann.code as u16) << CODE_SHIFT) | (delta as u16),
        );

        if ann.subtype != 0 {
            let data = (ann.subtype as i16 as u16) & DATA_MASK;
            put_u16(&mut out, ((SUB as u16) << CODE_SHIFT) | data);
        }
        if ann.channel != state.channel {
            put_u16(&mut out, ((CHN as u16) << CODE_SHIFT) | ann.channel as u16);
        }
        if ann.num != state.num {
            let data = (ann.num as i16 as u16) & DATA_MASK;
            put_u16(&mut out, ((NUM as u16) << CODE_SHIFT) | data);
        }
        if let Some(aux) = ann.aux.as_deref() {
            if aux.len() > u8::MAX as usize {
                return Err(RecordError::AuxTooLong(aux.len()));
            }
            // length 0 is representable and distinct from an absent payload
            put_u16(&mut out, ((AUX as u16) << CODE_SHIFT) | aux.len() as u16);
            out.extend_from_slice(aux);
            if aux.len() % 2 == 1 {
                out.push(0);
            }
        }
        Ok(out)
    }

    /// Decodes the next annotation from `buf` starting at `pos`
    ///
    /// Returns the annotation and the number of bytes consumed, or `None`
    /// at end of stream (terminator word or physical end of data). Updates
    /// `state` with the decoded time/channel/num continuity.
    pub fn decode(
        &self,
        state: &mut DeltaState,
        buf: &[u8],
        pos: usize,
    ) -> Result<Option<(Annotation, usize)>> {
        let start = pos;
        let mut pos = pos;

        let word = loop {
            if pos + 2 > buf.len() {
                return Ok(None);
            }
            let word = get_u16(buf, pos);
            if word == 0 {
                return Ok(None);
            }
            if (word >> CODE_SHIFT) as u8 == SKIP {
                if pos + 6 > buf.len() {
                    return Err(self.malformed(state.time, "truncated skip interval"));
                }
                let skip = get_i32(buf, pos + 2) as i64;
                let shifted = state.time as i64 + skip;
                if shifted < 0 {
                    return Err(self.malformed(state.time, "skip to negative time"));
                }
                state.time = shifted as u64;
                pos += 6;
                continue;
            }
            break word;
        };

        let code = (word >> CODE_SHIFT) as u8;
        if !self.table.is_valid(code) {
            return Err(self.malformed(
                state.time,
                &format!("unrecognized control code {}", code),
            ));
        }
        state.time += (word & DATA_MASK) as u64;
        pos += 2;

        let mut ann = Annotation {
            time: state.time,
            code,
            subtype: 0,
            channel: state.channel,
            num: state.num,
            aux: None,
        };

        while pos + 2 <= buf.len() {
            let word = get_u16(buf, pos);
            match (word >> CODE_SHIFT) as u8 {
                SUB => {
                    ann.subtype = sign_extend_10(word) as i8;
                    pos += 2;
                }
                CHN => {
                    state.channel = (word & DATA_MASK) as u8;
                    ann.channel = state.channel;
                    pos += 2;
                }
                NUM => {
                    state.num = sign_extend_10(word) as i8;
                    ann.num = state.num;
                    pos += 2;
                }
                AUX => {
                    let len = (word & 0xff) as usize;
                    // payload is padded to word alignment on disk
                    let stored = len + (len & 1);
                    if pos + 2 + stored > buf.len() {
                        return Err(self.malformed(state.time, "truncated aux payload"));
                    }
                    ann.aux = Some(buf[pos + 2..pos + 2 + len].to_vec());
                    pos += 2 + stored;
                }
                // SKIP belongs to the next annotation; real codes start it
                _ => break,
            }
        }

        Ok(Some((ann, pos - start)))
    }

    /// Encodes one annotation in the fixed-width alternate format
    ///
    /// Each event occupies 16 bytes: a NUL, a derived code byte (the first
    /// byte of the mnemonic), the 32-bit absolute time, a 16-bit serial
    /// number, subtype and code bytes, and 6 aux bytes (truncated or
    /// zero-padded).
    pub fn encode_fixed(
        &self,
        state: &DeltaState,
        seqno: u16,
        ann: &Annotation,
    ) -> Result<Vec<u8>> {
        self.check(state, ann)?;
        let mut out = Vec::with_capacity(FIXED_EVENT_LEN);
        out.push(0);
        out.push(self.table.mnemonic(ann.code)?.as_bytes()[0]);
        put_u32(&mut out, ann.time as u32);
        put_u16(&mut out, seqno);
        out.push(ann.subtype as u8);
        out.push(ann.code);
        let aux = ann.aux.as_deref().unwrap_or(&[]);
        for i in 0..FIXED_AUX_LEN {
            out.push(aux.get(i).copied().unwrap_or(0));
        }
        debug_assert_eq!(out.len(), FIXED_EVENT_LEN);
        Ok(out)
    }

    fn malformed(&self, time: u64, detail: &str) -> RecordError {
        RecordError::Malformed {
            annotator: self.label.clone(),
            time,
            detail: detail.to_string(),
        }
    }
}
