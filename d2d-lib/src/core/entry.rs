use async_trait::async_trait;
use d2d_database::database::characterization_data as entries_db;
use d2d_database::models::characterization_data::ActiveModel;
use d2d_database::types::YieldUnits;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use super::checklist::ChecklistItem;
use super::raw_data::{
    validate_own_reference, AssayKind, KineticRawData, KineticRawRecord, TempRawData,
    TempRawRecord,
};
use crate::config::Settings;
use crate::error::CureError;
use crate::helpers::round_to;

pub type Entry = d2d_database::models::characterization_data::Model;

/// Body of every entry mutation: the entry id, the version the caller read,
/// and the fields of exactly one checklist item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest<T> {
    pub id: i32,
    #[serde(default)]
    pub version: Option<i32>,
    #[serde(flatten)]
    pub fields: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosettaScore {
    #[serde(rename = "Rosetta_score")]
    pub rosetta_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OligoOrdered {
    pub oligo_ordered: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlasmidSequence {
    pub ab1_filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinInduced {
    pub expressed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionYield {
    pub yield_avg: f64,
    pub yield_units: YieldUnits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticConstants {
    pub raw_data_id: i32,
    pub kcat_avg: Option<f64>,
    #[serde(rename = "kcat_SD")]
    pub kcat_sd: Option<f64>,
    #[serde(rename = "KM_avg")]
    pub km_avg: Option<f64>,
    #[serde(rename = "KM_SD")]
    pub km_sd: Option<f64>,
    #[serde(rename = "kcat_over_KM")]
    pub kcat_over_km: Option<f64>,
    #[serde(rename = "kcat_over_KM_SD")]
    pub kcat_over_km_sd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildTypeKineticRef {
    #[serde(rename = "WT_raw_data_id")]
    pub wt_raw_data_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalConstants {
    pub temp_raw_data_id: i32,
    #[serde(rename = "T50")]
    pub t50: Option<f64>,
    #[serde(rename = "T50_SD")]
    pub t50_sd: Option<f64>,
    #[serde(rename = "T50_k")]
    pub t50_k: Option<f64>,
    #[serde(rename = "T50_k_SD")]
    pub t50_k_sd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildTypeThermoRef {
    #[serde(rename = "WT_temp_raw_data_id")]
    pub wt_temp_raw_data_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeltingPointValues {
    pub tm_mean: f64,
    pub tm_std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GelFilename {
    pub gel_filename: String,
}

/// A write to the columns of one checklist item. Nothing else on the entry
/// can be reached through a patch.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryPatch {
    ProteinModeled(RosettaScore),
    OligoOrdered(OligoOrdered),
    PlasmidVerified(PlasmidSequence),
    ProteinInduced(ProteinInduced),
    Expressed(ExpressionYield),
    KineticAssay(KineticConstants),
    WildTypeKinetic(WildTypeKineticRef),
    ThermoAssay(ThermalConstants),
    WildTypeThermo(WildTypeThermoRef),
    MeltingPoint(MeltingPointValues),
    Gel(GelFilename),
}

fn require_finite(name: &str, value: f64) -> Result<(), CureError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CureError::Validation(format!("{} must be a number", name)))
    }
}

fn require_reference(name: &str, id: i32) -> Result<(), CureError> {
    if id > 0 {
        Ok(())
    } else {
        Err(CureError::Validation(format!("{} must reference a raw data record", name)))
    }
}

impl EntryPatch {
    pub fn item(&self) -> ChecklistItem {
        match self {
            EntryPatch::ProteinModeled(_) => ChecklistItem::ProteinModeled,
            EntryPatch::OligoOrdered(_) => ChecklistItem::OligoOrdered,
            EntryPatch::PlasmidVerified(_) => ChecklistItem::PlasmidVerified,
            EntryPatch::ProteinInduced(_) => ChecklistItem::ProteinInduced,
            EntryPatch::Expressed(_) => ChecklistItem::Expressed,
            EntryPatch::KineticAssay(_) => ChecklistItem::KineticAssay,
            EntryPatch::WildTypeKinetic(_) => ChecklistItem::WildTypeKinetic,
            EntryPatch::ThermoAssay(_) => ChecklistItem::ThermoAssay,
            EntryPatch::WildTypeThermo(_) => ChecklistItem::WildTypeThermo,
            EntryPatch::MeltingPoint(_) => ChecklistItem::MeltingPoint,
            EntryPatch::Gel(_) => ChecklistItem::GelUploaded,
        }
    }

    /// Path of the mutation endpoint, relative to `/api`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            EntryPatch::ProteinModeled(_) => "updateCharacterizationDataRosettaScore",
            EntryPatch::OligoOrdered(_) => "updateCharacterizationDataOligoOrdered",
            EntryPatch::PlasmidVerified(_) => "updateCharacterizationDataPlasmidStuff",
            EntryPatch::ProteinInduced(_) => "updateCharacterizationDataExpressed",
            EntryPatch::Expressed(_) => "updateCharacterizationDataYieldAvg",
            EntryPatch::KineticAssay(_) => "updateCharacterizationDataKineticStuff",
            EntryPatch::WildTypeKinetic(_) => "updateCharacterizationDataWTRawDataId",
            EntryPatch::ThermoAssay(_) => "updateCharacterizationDataThermoStuff",
            EntryPatch::WildTypeThermo(_) => "updateCharacterizationDataWTTempRawDataId",
            EntryPatch::MeltingPoint(_) => "updateMeltingPointValues",
            EntryPatch::Gel(_) => "updateCharacterizationDataGelFilename",
        }
    }

    pub fn request_body(&self, id: i32, version: Option<i32>) -> serde_json::Result<serde_json::Value> {
        fn body<T: Serialize>(id: i32, version: Option<i32>, fields: &T) -> serde_json::Result<serde_json::Value> {
            serde_json::to_value(PatchRequest { id, version, fields })
        }
        match self {
            EntryPatch::ProteinModeled(f) => body(id, version, f),
            EntryPatch::OligoOrdered(f) => body(id, version, f),
            EntryPatch::PlasmidVerified(f) => body(id, version, f),
            EntryPatch::ProteinInduced(f) => body(id, version, f),
            EntryPatch::Expressed(f) => body(id, version, f),
            EntryPatch::KineticAssay(f) => body(id, version, f),
            EntryPatch::WildTypeKinetic(f) => body(id, version, f),
            EntryPatch::ThermoAssay(f) => body(id, version, f),
            EntryPatch::WildTypeThermo(f) => body(id, version, f),
            EntryPatch::MeltingPoint(f) => body(id, version, f),
            EntryPatch::Gel(f) => body(id, version, f),
        }
    }

    /// Checks that need no I/O.
    pub fn validate(&self) -> Result<(), CureError> {
        match self {
            EntryPatch::ProteinModeled(f) => require_finite("Rosetta_score", f.rosetta_score),
            EntryPatch::PlasmidVerified(f) => {
                if f.ab1_filename.trim().is_empty() {
                    return Err(CureError::Validation("ab1_filename is required".into()));
                }
                Ok(())
            }
            EntryPatch::Expressed(f) => require_finite("yield_avg", f.yield_avg),
            EntryPatch::KineticAssay(f) => {
                require_reference("raw_data_id", f.raw_data_id)?;
                match f.km_avg {
                    Some(km) => require_finite("KM_avg", km),
                    None => Err(CureError::Validation("KM_avg is required".into())),
                }
            }
            EntryPatch::WildTypeKinetic(f) => require_reference("WT_raw_data_id", f.wt_raw_data_id),
            EntryPatch::ThermoAssay(f) => {
                require_reference("temp_raw_data_id", f.temp_raw_data_id)?;
                match f.t50 {
                    Some(t50) => require_finite("T50", t50),
                    None => Err(CureError::Validation("T50 is required".into())),
                }
            }
            EntryPatch::WildTypeThermo(f) => {
                require_reference("WT_temp_raw_data_id", f.wt_temp_raw_data_id)
            }
            EntryPatch::MeltingPoint(f) => {
                require_finite("tm_mean", f.tm_mean)?;
                require_finite("tm_std_dev", f.tm_std_dev)
            }
            EntryPatch::Gel(f) => {
                if f.gel_filename.trim().is_empty() {
                    return Err(CureError::Validation("gel_filename is required".into()));
                }
                Ok(())
            }
            EntryPatch::OligoOrdered(_) | EntryPatch::ProteinInduced(_) => Ok(()),
        }
    }

    /// The owned columns of the item, everything else left NotSet.
    pub fn into_active_model(self) -> ActiveModel {
        match self {
            EntryPatch::ProteinModeled(f) => ActiveModel {
                rosetta_score: Set(Some(f.rosetta_score)),
                ..Default::default()
            },
            EntryPatch::OligoOrdered(f) => ActiveModel {
                oligo_ordered: Set(f.oligo_ordered),
                ..Default::default()
            },
            EntryPatch::PlasmidVerified(f) => ActiveModel {
                plasmid_verified: Set(true),
                ab1_filename: Set(Some(f.ab1_filename)),
                ..Default::default()
            },
            EntryPatch::ProteinInduced(f) => ActiveModel {
                expressed: Set(Some(f.expressed)),
                ..Default::default()
            },
            EntryPatch::Expressed(f) => ActiveModel {
                yield_avg: Set(Some(round_to(f.yield_avg, 2))),
                yield_units: Set(Some(f.yield_units)),
                ..Default::default()
            },
            EntryPatch::KineticAssay(f) => ActiveModel {
                raw_data_id: Set(f.raw_data_id),
                kcat_avg: Set(f.kcat_avg),
                kcat_sd: Set(f.kcat_sd),
                km_avg: Set(f.km_avg),
                km_sd: Set(f.km_sd),
                kcat_over_km: Set(f.kcat_over_km),
                kcat_over_km_sd: Set(f.kcat_over_km_sd),
                ..Default::default()
            },
            EntryPatch::WildTypeKinetic(f) => ActiveModel {
                wt_raw_data_id: Set(f.wt_raw_data_id),
                ..Default::default()
            },
            EntryPatch::ThermoAssay(f) => ActiveModel {
                temp_raw_data_id: Set(f.temp_raw_data_id),
                t50: Set(f.t50),
                t50_sd: Set(f.t50_sd),
                t50_k: Set(f.t50_k),
                t50_k_sd: Set(f.t50_k_sd),
                ..Default::default()
            },
            EntryPatch::WildTypeThermo(f) => ActiveModel {
                wt_temp_raw_data_id: Set(f.wt_temp_raw_data_id),
                ..Default::default()
            },
            EntryPatch::MeltingPoint(f) => ActiveModel {
                tm: Set(Some(f.tm_mean)),
                tm_sd: Set(Some(f.tm_std_dev)),
                ..Default::default()
            },
            EntryPatch::Gel(f) => ActiveModel {
                gel_filename: Set(Some(f.gel_filename)),
                ..Default::default()
            },
        }
    }
}

/**
 * Checks a patch arriving on its own must pass before it is applied. Patches
 * built by the sub-forms have been through the same rules already.
 *
 * # Arguments
 * @param store: &dyn EntryStore - Used to look up referenced raw records
 * @param settings: &Settings - Holds the Rosetta delta limit
 * @param id: i32 - The entry being patched
 * @param patch: &EntryPatch - The patch
 *
 * # Returns
 * @return Result<(), CureError> - A Validation error for out of range values
 * and for raw records that are missing or belong to another entry
 */
pub async fn check_patch(
    store: &dyn EntryStore,
    settings: &Settings,
    id: i32,
    patch: &EntryPatch,
) -> Result<(), CureError> {
    patch.validate()?;
    match patch {
        EntryPatch::ProteinModeled(f) if f.rosetta_score.abs() > settings.rosetta_delta_limit => {
            Err(CureError::Validation(format!(
                "Variants rarely express if the change in score is greater than {}. Please review the values.",
                settings.rosetta_delta_limit
            )))
        }
        EntryPatch::KineticAssay(f) => {
            validate_own_reference(store, id, AssayKind::Kinetic, f.raw_data_id).await
        }
        EntryPatch::ThermoAssay(f) => {
            validate_own_reference(store, id, AssayKind::Thermo, f.temp_raw_data_id).await
        }
        _ => Ok(()),
    }
}

/// Read and write access to entries and their raw assay records.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn get(&self, id: i32) -> Result<Entry, CureError>;

    /// Apply one item's patch and return the whole updated entry.
    async fn apply_patch(
        &self,
        id: i32,
        expected_version: Option<i32>,
        patch: EntryPatch,
    ) -> Result<Entry, CureError>;

    async fn save_kinetic_raw_data(&self, record: KineticRawRecord) -> Result<i32, CureError>;

    async fn save_temp_raw_data(&self, record: TempRawRecord) -> Result<i32, CureError>;

    async fn kinetic_raw_data(&self, id: i32) -> Result<KineticRawData, CureError>;

    async fn temp_raw_data(&self, id: i32) -> Result<TempRawData, CureError>;
}

/// Entry store backed by the database crate.
#[derive(Debug, Clone, Default)]
pub struct DatabaseEntryStore;

#[async_trait]
impl EntryStore for DatabaseEntryStore {
    async fn get(&self, id: i32) -> Result<Entry, CureError> {
        entries_db::get_entry(id)
            .await
            .map_err(|e| CureError::Fetch(e.to_string()))?
            .ok_or_else(|| CureError::NotFound(format!("Entry {} not found", id)))
    }

    async fn apply_patch(
        &self,
        id: i32,
        expected_version: Option<i32>,
        patch: EntryPatch,
    ) -> Result<Entry, CureError> {
        patch.validate()?;
        let current = self.get(id).await?;
        if current.curated && patch.item().is_measurement() {
            return Err(CureError::CuratedLocked(id));
        }
        if let Some(expected) = expected_version {
            if current.version != expected {
                return Err(CureError::Conflict {
                    expected,
                    actual: current.version,
                });
            }
        }

        let item = patch.item();
        let written = entries_db::update_entry_columns(id, expected_version, patch.into_active_model())
            .await
            .map_err(|e| CureError::Persistence(e.to_string()))?;
        if written == 0 {
            // lost a race against another writer between the read and the update
            let now = self.get(id).await?;
            return Err(CureError::Conflict {
                expected: expected_version.unwrap_or(current.version),
                actual: now.version,
            });
        }
        log::info!("Entry {} updated: {}", id, item);
        self.get(id).await
    }

    async fn save_kinetic_raw_data(&self, record: KineticRawRecord) -> Result<i32, CureError> {
        super::raw_data::save_kinetic_raw_data(record).await
    }

    async fn save_temp_raw_data(&self, record: TempRawRecord) -> Result<i32, CureError> {
        super::raw_data::save_temp_raw_data(record).await
    }

    async fn kinetic_raw_data(&self, id: i32) -> Result<KineticRawData, CureError> {
        super::raw_data::get_kinetic_raw_data(id).await
    }

    async fn temp_raw_data(&self, id: i32) -> Result<TempRawData, CureError> {
        super::raw_data::get_temp_raw_data(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raw_data::save_kinetic_raw_data;
    use crate::core::raw_data::tests::kinetic_record;
    use d2d_database::setup_test_environment;
    use serial_test::serial;

    async fn new_entry() -> Entry {
        entries_db::create_entry("jdoe", "UCDavis", "dr_pi", "A", 123, "C")
            .await
            .unwrap()
    }

    #[test]
    fn request_body_uses_wire_names() {
        let patch = EntryPatch::ProteinModeled(RosettaScore { rosetta_score: 9.697 });
        let body = patch.request_body(42, Some(3)).unwrap();
        assert_eq!(body["id"], 42);
        assert_eq!(body["version"], 3);
        assert_eq!(body["Rosetta_score"], 9.697);
        assert_eq!(patch.endpoint(), "updateCharacterizationDataRosettaScore");

        let parsed: PatchRequest<RosettaScore> = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.fields.rosetta_score, 9.697);
    }

    #[test]
    fn version_is_optional_on_the_wire() {
        let parsed: PatchRequest<MeltingPointValues> =
            serde_json::from_str(r#"{"id": 5, "tm_mean": 55.1, "tm_std_dev": 0.3}"#).unwrap();
        assert_eq!(parsed.version, None);
        assert_eq!(parsed.fields.tm_mean, 55.1);
    }

    #[test]
    fn validation_rejects_missing_references() {
        let patch = EntryPatch::WildTypeKinetic(WildTypeKineticRef { wt_raw_data_id: 0 });
        assert!(matches!(patch.validate(), Err(CureError::Validation(_))));
        let patch = EntryPatch::Expressed(ExpressionYield {
            yield_avg: f64::NAN,
            yield_units: YieldUnits::A280,
        });
        assert!(patch.validate().is_err());
    }

    fn kinetic_constants(raw_data_id: i32) -> EntryPatch {
        EntryPatch::KineticAssay(KineticConstants {
            raw_data_id,
            kcat_avg: Some(880.0),
            kcat_sd: Some(10.0),
            km_avg: Some(5.2),
            km_sd: Some(0.3),
            kcat_over_km: Some(169.2),
            kcat_over_km_sd: Some(5.0),
        })
    }

    #[tokio::test]
    async fn rosetta_patches_respect_the_delta_limit() {
        let store = DatabaseEntryStore;
        let settings = Settings::default();
        let too_far = EntryPatch::ProteinModeled(RosettaScore { rosetta_score: 80.0 });
        assert!(matches!(
            check_patch(&store, &settings, 1, &too_far).await,
            Err(CureError::Validation(_))
        ));
        let at_limit = EntryPatch::ProteinModeled(RosettaScore { rosetta_score: -20.0 });
        assert!(check_patch(&store, &settings, 1, &at_limit).await.is_ok());
    }

    #[tokio::test]
    #[serial]
    async fn assay_constants_must_reference_the_entrys_own_record() {
        setup_test_environment().await;
        let entry = new_entry().await;
        let other = entries_db::create_entry("asmith", "UCDavis", "dr_pi", "A", 123, "C")
            .await
            .unwrap();
        let store = DatabaseEntryStore;
        let settings = Settings::default();
        let own = save_kinetic_raw_data(kinetic_record(entry.id, "A123C")).await.unwrap();
        let foreign = save_kinetic_raw_data(kinetic_record(other.id, "A123C")).await.unwrap();

        assert!(check_patch(&store, &settings, entry.id, &kinetic_constants(own)).await.is_ok());
        assert!(matches!(
            check_patch(&store, &settings, entry.id, &kinetic_constants(foreign)).await,
            Err(CureError::Validation(_))
        ));
        assert!(matches!(
            check_patch(&store, &settings, entry.id, &kinetic_constants(9999)).await,
            Err(CureError::Validation(_))
        ));
        let missing_temp = EntryPatch::ThermoAssay(ThermalConstants {
            temp_raw_data_id: 9999,
            t50: Some(42.0),
            t50_sd: None,
            t50_k: None,
            t50_k_sd: None,
        });
        assert!(matches!(
            check_patch(&store, &settings, entry.id, &missing_temp).await,
            Err(CureError::Validation(_))
        ));
    }

    #[tokio::test]
    #[serial]
    async fn apply_patch_writes_only_the_item_columns() {
        setup_test_environment().await;
        let entry = new_entry().await;
        let store = DatabaseEntryStore;

        let updated = store
            .apply_patch(
                entry.id,
                Some(entry.version),
                EntryPatch::Expressed(ExpressionYield {
                    yield_avg: 1.23456,
                    yield_units: YieldUnits::MgPerMl,
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.yield_avg, Some(1.23));
        assert_eq!(updated.yield_units, Some(YieldUnits::MgPerMl));
        assert_eq!(updated.version, entry.version + 1);
        assert_eq!(updated.rosetta_score, None);
        assert_eq!(updated.expressed, None);
    }

    #[tokio::test]
    #[serial]
    async fn identical_submissions_leave_the_same_slice() {
        setup_test_environment().await;
        let entry = new_entry().await;
        let store = DatabaseEntryStore;
        let patch = EntryPatch::OligoOrdered(OligoOrdered { oligo_ordered: true });

        let first = store.apply_patch(entry.id, None, patch.clone()).await.unwrap();
        let second = store.apply_patch(entry.id, None, patch).await.unwrap();
        assert_eq!(first.oligo_ordered, second.oligo_ordered);
        assert_eq!(Entry { version: 0, ..first }, Entry { version: 0, ..second });
    }

    #[tokio::test]
    #[serial]
    async fn stale_version_is_a_conflict() {
        setup_test_environment().await;
        let entry = new_entry().await;
        let store = DatabaseEntryStore;

        store
            .apply_patch(
                entry.id,
                Some(0),
                EntryPatch::OligoOrdered(OligoOrdered { oligo_ordered: true }),
            )
            .await
            .unwrap();
        let result = store
            .apply_patch(
                entry.id,
                Some(0),
                EntryPatch::Gel(GelFilename {
                    gel_filename: "UCDavis-A123C-jdoe-01-15-24.png".into(),
                }),
            )
            .await;
        assert_eq!(result, Err(CureError::Conflict { expected: 0, actual: 1 }));
    }

    #[tokio::test]
    #[serial]
    async fn curated_entries_refuse_measurements() {
        setup_test_environment().await;
        let entry = new_entry().await;
        entries_db::update_entry_columns(
            entry.id,
            None,
            ActiveModel {
                curated: Set(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let store = DatabaseEntryStore;

        let locked = store
            .apply_patch(
                entry.id,
                None,
                EntryPatch::MeltingPoint(MeltingPointValues {
                    tm_mean: 55.0,
                    tm_std_dev: 0.2,
                }),
            )
            .await;
        assert_eq!(locked, Err(CureError::CuratedLocked(entry.id)));

        let allowed = store
            .apply_patch(
                entry.id,
                None,
                EntryPatch::Gel(GelFilename {
                    gel_filename: "UCDavis-A123C-jdoe-01-15-24.png".into(),
                }),
            )
            .await;
        assert!(allowed.is_ok());
    }

    #[tokio::test]
    #[serial]
    async fn unknown_entry_is_not_found() {
        setup_test_environment().await;
        let result = DatabaseEntryStore.get(999).await;
        assert!(matches!(result, Err(CureError::NotFound(_))));
    }
}
