/// Identifies the uploads of one entry. Object keys are built from these parts
/// and must stay stable, other tools read them back by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts<'a> {
    pub user: &'a str,
    pub enzyme: &'a str,
    pub variant: &'a str,
    pub entry_id: i32,
}

impl<'a> KeyParts<'a> {
    fn stem(&self) -> String {
        format!("{}-{}-{}-{}", self.user, self.enzyme, self.variant, self.entry_id)
    }

    pub fn kinetic_csv(&self) -> String {
        format!("kinetic_assays/raw/{}.csv", self.stem())
    }

    pub fn kinetic_plot(&self) -> String {
        format!("kinetic_assays/plots/{}.png", self.stem())
    }

    pub fn lineweaver_plot(&self) -> String {
        format!("temp/{}-LB.png", self.stem())
    }

    pub fn thermal_csv(&self) -> String {
        format!("temperature_assays/raw/{}-temp_assay.csv", self.stem())
    }

    pub fn thermal_plot(&self) -> String {
        format!("temperature_assays/plots/{}-temp_assay.png", self.stem())
    }

    pub fn sequencing(&self) -> String {
        format!("sequencing/{}.ab1", self.stem())
    }
}

/// Last path segment of a key. Raw data records store bare file names.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_storage_layout() {
        let parts = KeyParts {
            user: "jdoe",
            enzyme: "BglB",
            variant: "A123C",
            entry_id: 42,
        };
        assert_eq!(parts.kinetic_csv(), "kinetic_assays/raw/jdoe-BglB-A123C-42.csv");
        assert_eq!(parts.kinetic_plot(), "kinetic_assays/plots/jdoe-BglB-A123C-42.png");
        assert_eq!(parts.lineweaver_plot(), "temp/jdoe-BglB-A123C-42-LB.png");
        assert_eq!(
            parts.thermal_csv(),
            "temperature_assays/raw/jdoe-BglB-A123C-42-temp_assay.csv"
        );
        assert_eq!(
            parts.thermal_plot(),
            "temperature_assays/plots/jdoe-BglB-A123C-42-temp_assay.png"
        );
        assert_eq!(parts.sequencing(), "sequencing/jdoe-BglB-A123C-42.ab1");
        assert_eq!(file_name(&parts.kinetic_csv()), "jdoe-BglB-A123C-42.csv");
        assert_eq!(file_name("plain.csv"), "plain.csv");
    }
}
