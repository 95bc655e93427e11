use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::CureError;
use crate::helpers::parse_decimal;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosettaInput {
    pub wt_score: String,
    pub variant_score: String,
}

/// Result of a passed check: the delta to store plus advisory warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct RosettaCheck {
    pub delta: f64,
    pub warnings: Vec<String>,
}

impl RosettaInput {
    /**
     * Check the two Rosetta scores before anything is written
     *
     * # Arguments
     * @param settings: &Settings - Holds the expected WT score and the delta limit
     *
     * # Returns
     * @return Result<RosettaCheck, CureError> - The delta and warnings, or a Validation
     * error for unreadable numbers and deltas beyond the limit
     */
    pub fn check(&self, settings: &Settings) -> Result<RosettaCheck, CureError> {
        let wt = parse_decimal(&self.wt_score)
            .ok_or_else(|| CureError::Validation("Please enter a valid number for WT score".into()))?;
        let variant = parse_decimal(&self.variant_score).ok_or_else(|| {
            CureError::Validation("Please enter a valid number for Variant score".into())
        })?;

        let mut warnings = vec![];
        if wt != settings.expected_wt_rosetta_score {
            warnings.push(format!(
                "The expected score for the WT enzyme is {}. Please confirm and resubmit.",
                settings.expected_wt_rosetta_score
            ));
        }
        if wt == variant {
            warnings.push(
                "It is highly unlikely for both WT and Variant scores to be the same. Please confirm."
                    .to_string(),
            );
        }

        let delta = variant - wt;
        // exactly at the limit is accepted
        if delta < -settings.rosetta_delta_limit || delta > settings.rosetta_delta_limit {
            return Err(CureError::Validation(format!(
                "Variants rarely express if the change in score is greater than {}. Please review the values.",
                settings.rosetta_delta_limit
            )));
        }
        Ok(RosettaCheck { delta, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(wt: &str, variant: &str) -> RosettaInput {
        RosettaInput {
            wt_score: wt.into(),
            variant_score: variant.into(),
        }
    }

    #[test]
    fn expected_wild_type_passes_without_warnings() {
        let check = input("-1089.697", "-1080.0").check(&Settings::default()).unwrap();
        assert!((check.delta - 9.697).abs() < 1e-9);
        assert!(check.warnings.is_empty());
    }

    #[test]
    fn large_deltas_are_blocked() {
        let blocked = input("-1000", "-1080").check(&Settings::default());
        assert!(matches!(blocked, Err(CureError::Validation(_))));
        assert!(input("0", "20.5").check(&Settings::default()).is_err());
    }

    #[test]
    fn the_limit_itself_is_accepted() {
        let settings = Settings::default();
        assert_eq!(input("0", "20").check(&settings).unwrap().delta, 20.0);
        assert_eq!(input("0", "-20").check(&settings).unwrap().delta, -20.0);
    }

    #[test]
    fn advisory_warnings_do_not_block() {
        let check = input("-1000", "-1000").check(&Settings::default()).unwrap();
        assert_eq!(check.delta, 0.0);
        assert_eq!(check.warnings.len(), 2);
    }

    #[test]
    fn unreadable_scores_are_rejected() {
        assert!(input("abc", "-1080").check(&Settings::default()).is_err());
        assert!(input("-1089.697", "").check(&Settings::default()).is_err());
    }
}
