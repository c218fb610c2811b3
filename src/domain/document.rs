/// An uploaded document waiting to be translated.
///
/// Pairs the name the user supplied with the storage key that holds the
/// uploaded bytes. Extension and base name are derived on every call, so the
/// value never carries state that could drift from `original_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    original_name: String,
    temp_location: String,
}

impl Document {
    pub fn new(original_name: impl Into<String>, temp_location: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            temp_location: temp_location.into(),
        }
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Storage key of the uploaded bytes (upload area).
    pub fn temp_location(&self) -> &str {
        &self.temp_location
    }

    /// Text after the last `.`, or an empty string when the name has no dot.
    pub fn extension(&self) -> &str {
        self.original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("")
    }

    /// The name with its final `.extension` segment removed.
    pub fn base_name(&self) -> &str {
        self.original_name
            .rsplit_once('.')
            .map(|(base, _)| base)
            .unwrap_or(&self.original_name)
    }

    /// `translated_{base}_{timestamp}.{ext}`; the dot is dropped when there is no extension.
    pub fn output_filename(&self, timestamp: i64) -> String {
        let ext = self.extension();
        if ext.is_empty() {
            format!("translated_{}_{}", self.base_name(), timestamp)
        } else {
            format!("translated_{}_{}.{}", self.base_name(), timestamp, ext)
        }
    }
}
