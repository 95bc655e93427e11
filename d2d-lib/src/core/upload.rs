use crate::error::CureError;

/// Largest accepted assay spreadsheet.
pub const MAX_CSV_BYTES: usize = 500_000;
/// Largest accepted sequencing trace.
pub const MAX_AB1_BYTES: usize = 500 * 1024;
pub const MAX_GEL_BYTES: usize = 10 * 1024 * 1024;

/// A file received from the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        UploadedFile {
            file_name: file_name.to_string(),
            content_type: None,
            bytes,
        }
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
    }

    /**
     * Reject the file unless it carries the expected extension and fits the size limit
     *
     * # Arguments
     * @param extension: &str - Required extension, without the dot
     * @param max_bytes: usize - Size limit
     *
     * # Returns
     * @return Result<(), CureError> - Validation error describing the first violated rule
     */
    pub fn check(&self, extension: &str, max_bytes: usize) -> Result<(), CureError> {
        if self.extension().as_deref() != Some(extension) {
            return Err(CureError::Validation(format!(
                "{} is not a .{} file",
                self.file_name, extension
            )));
        }
        if self.bytes.is_empty() {
            return Err(CureError::Validation(format!("{} is empty", self.file_name)));
        }
        if self.bytes.len() > max_bytes {
            return Err(CureError::Validation(format!(
                "{} is {} bytes, the limit is {}",
                self.file_name,
                self.bytes.len(),
                max_bytes
            )));
        }
        Ok(())
    }
}
