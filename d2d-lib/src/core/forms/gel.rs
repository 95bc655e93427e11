use chrono::NaiveDate;

use crate::core::entry::Entry;
use crate::core::gel::{institution_prefix, GelImageName, GEL_EXTENSIONS, GEL_PREFIX};
use crate::core::upload::{UploadedFile, MAX_GEL_BYTES};
use crate::error::CureError;
use crate::external_services::object_store::ObjectStore;

/// How the user picked the gel image for an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum GelChoice {
    /// A file name (or key) already listed for the institution.
    Existing(String),
    Upload { file: UploadedFile, date: NaiveDate },
}

fn upload_extension(file: &UploadedFile) -> Option<String> {
    let from_type = file
        .content_type
        .as_deref()
        .and_then(|t| t.strip_prefix("image/"))
        .map(|subtype| subtype.to_ascii_lowercase());
    from_type
        .or_else(|| file.extension())
        .filter(|ext| GEL_EXTENSIONS.contains(&ext.as_str()))
}

/// Resolve the choice to the bare file name stored on the entry, uploading first if needed.
pub async fn resolve(
    objects: &dyn ObjectStore,
    user: &str,
    entry: &Entry,
    choice: GelChoice,
) -> Result<String, CureError> {
    match choice {
        GelChoice::Existing(name) => {
            let file_name = name.rsplit('/').next().unwrap_or(&name).to_string();
            let key = format!("{}/{}", GEL_PREFIX, file_name);
            let listed = objects.list(&institution_prefix(&entry.institution)).await?;
            if !listed.contains(&key) {
                return Err(CureError::Validation(format!(
                    "{} is not one of the gel images of {}",
                    file_name, entry.institution
                )));
            }
            Ok(file_name)
        }
        GelChoice::Upload { file, date } => {
            let extension = upload_extension(&file).ok_or_else(|| {
                CureError::Validation(format!(
                    "{} must be one of: {}",
                    file.file_name,
                    GEL_EXTENSIONS.join(", ")
                ))
            })?;
            if file.bytes.is_empty() || file.bytes.len() > MAX_GEL_BYTES {
                return Err(CureError::Validation(format!(
                    "{} must be between 1 and {} bytes",
                    file.file_name, MAX_GEL_BYTES
                )));
            }
            let name = GelImageName::new(&entry.institution, &entry.variant_name(), user, date, &extension);
            let content_type = file
                .content_type
                .clone()
                .unwrap_or_else(|| format!("image/{}", extension));
            objects.put(&name.key(), file.bytes, &content_type).await?;
            log::info!("Uploaded gel image {} for entry {}", name, entry.id);
            Ok(name.to_string())
        }
    }
}
