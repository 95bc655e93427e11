use std::fmt::Display;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::CureError;
use crate::external_services::object_store::{ObjectStore, SIGNED_URL_TTL};

pub const GEL_PREFIX: &str = "gel-images";
pub const GEL_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

const DATE_FORMAT: &str = "%m-%d-%y";

/// Gel image file names carry `{institution}-{variant}-{user}-{MM-DD-YY}.{ext}`.
/// Any component holding a hyphen of its own makes the name unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GelImageName {
    pub institution: String,
    pub variant: String,
    pub user_name: String,
    pub file_date: String,
    pub extension: String,
}

impl GelImageName {
    pub fn new(institution: &str, variant: &str, user_name: &str, date: NaiveDate, extension: &str) -> Self {
        GelImageName {
            institution: institution.to_string(),
            variant: variant.to_string(),
            user_name: user_name.to_string(),
            file_date: date.format(DATE_FORMAT).to_string(),
            extension: extension.to_ascii_lowercase(),
        }
    }

    pub fn parse(file_name: &str) -> Option<Self> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        let parts: Vec<&str> = stem.split('-').collect();
        match parts.as_slice() {
            [institution, variant, user_name, month, day, year]
                if parts.iter().all(|p| !p.is_empty()) =>
            {
                Some(GelImageName {
                    institution: institution.to_string(),
                    variant: variant.to_string(),
                    user_name: user_name.to_string(),
                    file_date: format!("{}-{}-{}", month, day, year),
                    extension: extension.to_string(),
                })
            }
            _ => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.file_date, DATE_FORMAT).ok()
    }

    pub fn key(&self) -> String {
        format!("{}/{}", GEL_PREFIX, self)
    }
}

impl Display for GelImageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}.{}",
            self.institution, self.variant, self.user_name, self.file_date, self.extension
        )
    }
}

/// Key prefix of one institution's images. The hyphen keeps "UC" from matching "UCDavis".
pub fn institution_prefix(institution: &str) -> String {
    format!("{}/{}-", GEL_PREFIX, institution)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GelImage {
    pub key: String,
    pub file_name: String,
    /// None when the name does not follow the naming convention.
    pub name: Option<GelImageName>,
    pub url: String,
}

/// Gel images previously uploaded by members of `institution`.
pub async fn list_gel_images(
    objects: &dyn ObjectStore,
    institution: &str,
) -> Result<Vec<GelImage>, CureError> {
    let keys = objects
        .list(&institution_prefix(institution))
        .await?;
    keys.into_iter()
        .map(|key| {
            let file_name = key.rsplit('/').next().unwrap_or(&key).to_string();
            let url = objects.signed_url(&key, SIGNED_URL_TTL)?;
            Ok(GelImage {
                name: GelImageName::parse(&file_name),
                file_name,
                key,
                url,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_services::object_store::MemoryStore;

    #[test]
    fn conventional_names_parse() {
        let name = GelImageName::parse("UCDavis-A123C-jdoe-01-15-24.png").unwrap();
        assert_eq!(name.institution, "UCDavis");
        assert_eq!(name.variant, "A123C");
        assert_eq!(name.user_name, "jdoe");
        assert_eq!(name.file_date, "01-15-24");
        assert_eq!(name.date(), NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(name.to_string(), "UCDavis-A123C-jdoe-01-15-24.png");
    }

    #[test]
    fn extra_hyphens_break_the_name() {
        assert_eq!(GelImageName::parse("UC-Davis-A123C-jdoe-01-15-24.png"), None);
        assert_eq!(GelImageName::parse("UCDavis-A123C-j-doe-01-15-24.png"), None);
        assert_eq!(GelImageName::parse("no_extension"), None);
    }

    #[test]
    fn new_formats_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let name = GelImageName::new("UCDavis", "WT", "asmith", date, "PNG");
        assert_eq!(name.key(), "gel-images/UCDavis-WT-asmith-03-07-24.png");
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_institution() {
        let objects = MemoryStore::default();
        for key in [
            "gel-images/UCDavis-A123C-jdoe-01-15-24.png",
            "gel-images/UCDavis-odd-name.png",
            "gel-images/Elsewhere-WT-asmith-02-01-24.jpg",
        ] {
            objects.put(key, vec![1], "image/png").await.unwrap();
        }
        let images = list_gel_images(&objects, "UCDavis").await.unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].file_name, "UCDavis-A123C-jdoe-01-15-24.png");
        assert!(images[0].name.is_some());
        assert!(images[1].name.is_none());
        assert!(images[0].url.contains("token="));
        assert!(list_gel_images(&objects, "UC").await.unwrap().is_empty());
    }
}
