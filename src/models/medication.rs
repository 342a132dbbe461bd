use serde::{Deserialize, Serialize};

/// One medication as extracted by the prescription parser.
///
/// Frequency and duration are kept as the parser's free text; the schedule
/// aggregator derives numbers from them when no explicit schedule was
/// supplied. Immutable once parsed — edits replace the whole list on the
/// owning prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default)]
    pub instructions: String,
}

impl ParsedMedication {
    pub fn new(name: &str, dosage: &str, frequency: &str, duration: &str) -> Self {
        Self {
            name: name.to_string(),
            dosage: dosage.to_string(),
            frequency: frequency.to_string(),
            duration: duration.to_string(),
            instructions: String::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.instructions = instructions.to_string();
        self
    }
}
