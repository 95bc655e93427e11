use std::collections::HashMap;

use actix_multipart::Multipart;
use d2d_lib::core::upload::UploadedFile;
use d2d_lib::error::CureError;
use futures_util::StreamExt;

/// A multipart body split into its text fields and its files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub texts: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Result<&str, CureError> {
        self.texts
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CureError::Validation(format!("{} is required", name)))
    }

    pub fn optional_text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    pub fn number(&self, name: &str) -> Result<i32, CureError> {
        self.text(name)?
            .parse::<i32>()
            .map_err(|_| CureError::Validation(format!("{} must be a whole number", name)))
    }

    pub fn take_file(&mut self, name: &str) -> Result<UploadedFile, CureError> {
        self.files
            .remove(name)
            .ok_or_else(|| CureError::Validation(format!("Please choose a file for {}", name)))
    }
}

/**
 * Drain a multipart payload into memory
 *
 * # Arguments
 * @param payload: Multipart - The request body
 * @param max_bytes: usize - Largest accepted field; a bigger one fails the request
 *
 * # Returns
 * @return Result<MultipartForm, CureError> - Text fields and files keyed by field name
 */
pub async fn read_form(mut payload: Multipart, max_bytes: usize) -> Result<MultipartForm, CureError> {
    let mut form = MultipartForm::default();
    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| CureError::Validation(format!("Invalid multipart body: {}", e)))?;
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let file_name = disposition.get_filename().map(|f| f.to_string());
        let content_type = field.content_type().map(|m| m.to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| CureError::Validation(format!("Invalid multipart body: {}", e)))?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(CureError::Validation(format!(
                    "{} is larger than {} bytes",
                    file_name.as_deref().unwrap_or(&name),
                    max_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match file_name {
            Some(file_name) => {
                form.files.insert(
                    name,
                    UploadedFile {
                        file_name,
                        content_type,
                        bytes,
                    },
                );
            }
            None => {
                form.texts
                    .insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    }
    Ok(form)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const BOUNDARY: &str = "d2dboundary";

    /// A multipart body with the given text fields and one file field.
    pub(crate) fn body(texts: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, value) in texts {
            out.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        if let Some((name, file_name, content_type, bytes)) = file {
            out.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, name, file_name, content_type
                )
                .as_bytes(),
            );
            out.extend_from_slice(bytes);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        out
    }

    pub(crate) fn content_type() -> (&'static str, String) {
        ("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let form = MultipartForm::default();
        assert_eq!(
            form.text("user_name"),
            Err(CureError::Validation("user_name is required".into()))
        );
        assert_eq!(form.optional_text("version"), None);
    }

    #[test]
    fn numbers_must_be_whole() {
        let mut form = MultipartForm::default();
        form.texts.insert("id".into(), " 12 ".into());
        form.texts.insert("version".into(), "1.5".into());
        assert_eq!(form.number("id"), Ok(12));
        assert!(form.number("version").is_err());
    }
}
