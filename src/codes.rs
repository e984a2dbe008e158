//! Annotation code table: type codes, mnemonics, descriptions.
//!
//! The table is an explicitly constructed value shared read-only between a
//! session and the codecs it creates; there is no process-wide table.

use std::sync::Arc;

use crate::error::{RecordError, Result};

/// Largest valid annotation type code
pub const ACMAX: u8 = 49;

/// Normal beat, the most common type code
pub const NORMAL: u8 = 1;

/// Comment annotation (aux carries the text)
pub const NOTE: u8 = 22;

/// Rhythm change (aux carries the rhythm label)
pub const RHYTHM: u8 = 28;

const MNEMONICS: [&str; ACMAX as usize + 1] = [
    " ", "N", "L", "R", "a", // 0 - 4
    "V", "F", "J", "A", "S", // 5 - 9
    "E", "j", "/", "Q", "~", // 10 - 14
    "[15]", "|", "[17]", "s", "T", // 15 - 19
    "*", "D", "\"", "=", "p", // 20 - 24
    "B", "^", "t", "+", "u", // 25 - 29
    "?", "!", "[", "]", "e", // 30 - 34
    "n", "@", "x", "f", "(", // 35 - 39
    ")", "r", "[42]", "[43]", "[44]", // 40 - 44
    "[45]", "[46]", "[47]", "[48]", "[49]", // 45 - 49
];

const DESCRIPTIONS: [Option<&str>; ACMAX as usize + 1] = [
    None,
    Some("Normal beat"),
    Some("Left bundle branch block beat"),
    Some("Right bundle branch block beat"),
    Some("Aberrated atrial premature beat"),
    Some("Premature ventricular contraction"),
    Some("Fusion of ventricular and normal beat"),
    Some("Nodal (junctional) premature beat"),
    Some("Atrial premature beat"),
    Some("Supraventricular premature or ectopic beat"),
    Some("Ventricular escape beat"),
    Some("Nodal (junctional) escape beat"),
    Some("Paced beat"),
    Some("Unclassifiable beat"),
    Some("Change in signal quality"),
    None,
    Some("Isolated QRS-like artifact"),
    None,
    Some("ST segment change"),
    Some("T-wave change"),
    Some("Systole"),
    Some("Diastole"),
    Some("Comment annotation"),
    Some("Measurement annotation"),
    Some("P-wave peak"),
    Some("Bundle branch block beat (unspecified)"),
    Some("(Non-captured) pacemaker artifact"),
    Some("T-wave peak"),
    Some("Rhythm change"),
    Some("U-wave peak"),
    Some("Beat not classified during learning"),
    Some("Ventricular flutter wave"),
    Some("Start of ventricular flutter/fibrillation"),
    Some("End of ventricular flutter/fibrillation"),
    Some("Atrial escape beat"),
    Some("Supraventricular escape beat"),
    Some("Link to external data (aux contains URL)"),
    Some("Non-conducted P-wave (blocked APC)"),
    Some("Fusion of paced and normal beat"),
    Some("Waveform onset"),
    Some("Waveform end"),
    Some("R-on-T premature ventricular contraction"),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

/// Immutable mapping from annotation type codes to mnemonics and
/// human-readable descriptions
///
/// Codes `42..=49` are reserved for user-defined types; their mnemonics
/// can be replaced before the table is shared.
///
/// # Examples
///
/// ```rust
/// use biorec::CodeTable;
///
/// let table = CodeTable::standard();
/// assert_eq!(table.mnemonic(1).unwrap(), "N");
/// assert_eq!(table.description(5), Some("Premature ventricular contraction"));
/// assert_eq!(table.code_for("V"), Some(5));
/// assert!(table.mnemonic(50).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CodeTable {
    mnemonics: Vec<String>,
    descriptions: Vec<Option<String>>,
}

impl CodeTable {
    /// The standard ECG annotation code table
    pub fn standard() -> Self {
        CodeTable {
            mnemonics: MNEMONICS.iter().map(|s| s.to_string()).collect(),
            descriptions: DESCRIPTIONS
                .iter()
                .map(|d| d.map(str::to_string))
                .collect(),
        }
    }

    /// Shared handle to the standard table
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::standard())
    }

    /// Mnemonic string for a type code
    pub fn mnemonic(&self, code: u8) -> Result<&str> {
        self.mnemonics
            .get(code as usize)
            .map(String::as_str)
            .ok_or(RecordError::UnknownCode(code))
    }

    /// Description for a type code, if one is defined
    pub fn description(&self, code: u8) -> Option<&str> {
        self.descriptions
            .get(code as usize)
            .and_then(|d| d.as_deref())
    }

    /// Reverse lookup: the type code for a mnemonic string
    pub fn code_for(&self, mnemonic: &str) -> Option<u8> {
        // code 0 is not a valid annotation type
        self.mnemonics[1..]
            .iter()
            .position(|m| m == mnemonic)
            .map(|i| (i + 1) as u8)
    }

    /// True if `code` can appear as an annotation type
    pub fn is_valid(&self, code: u8) -> bool {
        (1..=ACMAX).contains(&code)
    }

    /// Replaces the mnemonic for a code (user-defined types)
    pub fn set_mnemonic(&mut self, code: u8, mnemonic: impl Into<String>) -> Result<()> {
        if code > ACMAX {
            return Err(RecordError::UnknownCode(code));
        }
        self.mnemonics[code as usize] = mnemonic.into();
        Ok(())
    }

    /// Replaces the description for a code (user-defined types)
    pub fn set_description(&mut self, code: u8, description: impl Into<String>) -> Result<()> {
        if code > ACMAX {
            return Err(RecordError::UnknownCode(code));
        }
        self.descriptions[code as usize] = Some(description.into());
        Ok(())
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::standard()
    }
}
