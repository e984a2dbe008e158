/// Describes one channel of a record
///
/// Signal metadata is fixed at record-open (or record-create) time and
/// never changes while a stream is bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Channel label, a single token (e.g. "MLII", "V5")
    pub label: String,
    /// ADC units per physical unit
    pub gain: f64,
    /// Sample value corresponding to 0 physical units
    pub baseline: i32,
    /// Native sampling frequency in Hz
    pub frequency: f64,
    /// ADC resolution in bits
    pub resolution: u8,
    /// Physical units label (e.g. "mV")
    pub units: String,
}

impl Signal {
    /// Converts a raw sample value to physical units
    ///
    /// # Examples
    ///
    /// ```rust
    /// use biorec::Signal;
    ///
    /// let signal = Signal {
    ///     label: "MLII".to_string(),
    ///     gain: 200.0,
    ///     baseline: 1024,
    ///     frequency: 360.0,
    ///     resolution: 11,
    ///     units: "mV".to_string(),
    /// };
    ///
    /// assert_eq!(signal.to_physical(1224), 1.0);
    /// assert_eq!(signal.to_adc(-0.5), 924);
    /// ```
    pub fn to_physical(&self, sample: i32) -> f64 {
        (sample - self.baseline) as f64 / self.gain
    }

    /// Converts a physical value to a raw sample value
    pub fn to_adc(&self, physical: f64) -> i32 {
        (physical * self.gain).round() as i32 + self.baseline
    }
}

/// One time instant's sample values across all bound channels
///
/// Values appear in catalog order; the length always equals the channel
/// count of the stream that produced the frame. Each read produces an
/// independently owned frame, so holding on to earlier frames is safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFrame {
    samples: Vec<i32>,
}

impl SampleFrame {
    pub fn new(samples: Vec<i32>) -> Self {
        SampleFrame { samples }
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<i32>> for SampleFrame {
    fn from(samples: Vec<i32>) -> Self {
        SampleFrame::new(samples)
    }
}

impl std::ops::Index<usize> for SampleFrame {
    type Output = i32;

    fn index(&self, index: usize) -> &i32 {
        &self.samples[index]
    }
}

/// A single timed event attached to a record
///
/// Times are absolute sample counts at the annotator's reference frequency
/// and must be non-decreasing within one stream. The `channel` and `num`
/// fields persist across annotations on the wire; `subtype` applies to a
/// single annotation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Absolute time in sample ticks
    pub time: u64,
    /// Type code from the code table (1..=49)
    pub code: u8,
    /// Small signed refinement of the type code
    pub subtype: i8,
    /// Channel index the event is scoped to
    pub channel: u8,
    /// Annotator-defined numeric field
    pub num: i8,
    /// Optional auxiliary payload, at most 255 bytes
    pub aux: Option<Vec<u8>>,
}

impl Annotation {
    /// Creates an annotation with all optional fields zeroed
    pub fn new(time: u64, code: u8) -> Self {
        Annotation {
            time,
            code,
            subtype: 0,
            channel: 0,
            num: 0,
            aux: None,
        }
    }

    /// Attaches an auxiliary payload
    pub fn with_aux(mut self, aux: impl Into<Vec<u8>>) -> Self {
        self.aux = Some(aux.into());
        self
    }

    /// The aux payload as text, if present and valid UTF-8
    pub fn aux_text(&self) -> Option<&str> {
        self.aux
            .as_deref()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

/// Open mode of an annotation source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationMode {
    /// Decode events from an existing annotator
    Read,
    /// Encode events with the compact delta encoding
    Write,
    /// Encode events with the fixed-width alternate encoding
    WriteFixed,
}

/// Names an annotator and how to open it
///
/// Constructed by the caller and consumed once by
/// [`RecordSession::open_annotations`](crate::RecordSession::open_annotations).
#[derive(Debug, Clone)]
pub struct AnnotationSource {
    pub name: String,
    pub mode: AnnotationMode,
}

impl AnnotationSource {
    pub fn read(name: impl Into<String>) -> Self {
        AnnotationSource {
            name: name.into(),
            mode: AnnotationMode::Read,
        }
    }

    pub fn write(name: impl Into<String>) -> Self {
        AnnotationSource {
            name: name.into(),
            mode: AnnotationMode::Write,
        }
    }

    pub fn write_fixed(name: impl Into<String>) -> Self {
        AnnotationSource {
            name: name.into(),
            mode: AnnotationMode::WriteFixed,
        }
    }
}

/// Direction of a sample stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    Read,
    Write,
}
