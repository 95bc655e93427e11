use d2d_database::database::{
    characterization_data as entries_db, kinetic_raw_data as kinetic_db, temp_raw_data as temp_db,
};
use d2d_database::models::{kinetic_raw_data, temp_raw_data};
use d2d_database::types::{KineticSlopeUnits, TempSlopeUnits, YieldUnits};
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

use super::entry::{Entry, EntryStore};
use crate::error::CureError;

pub type KineticRawData = kinetic_raw_data::Model;
pub type TempRawData = temp_raw_data::Model;

/// Raw kinetic data as written by the save protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticRawRecord {
    pub parent_id: i32,
    pub user_name: String,
    pub variant: String,
    pub slope_units: Option<KineticSlopeUnits>,
    #[serde(rename = "yield")]
    pub yield_value: Option<f64>,
    pub yield_units: Option<YieldUnits>,
    pub dilution: Option<f64>,
    pub purification_date: Option<String>,
    pub assay_date: Option<String>,
    pub csv_filename: String,
    pub plot_filename: String,
    pub kcat: Option<f64>,
    #[serde(rename = "kcat_SD")]
    pub kcat_sd: Option<f64>,
    #[serde(rename = "KM")]
    pub km: Option<f64>,
    #[serde(rename = "KM_SD")]
    pub km_sd: Option<f64>,
    #[serde(rename = "kcat_over_KM")]
    pub kcat_over_km: Option<f64>,
    #[serde(rename = "kcat_over_KM_SD")]
    pub kcat_over_km_sd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempRawRecord {
    pub parent_id: i32,
    pub user_name: String,
    pub variant: String,
    pub slope_units: Option<TempSlopeUnits>,
    pub purification_date: Option<String>,
    pub assay_date: Option<String>,
    pub csv_filename: String,
    pub plot_filename: String,
    #[serde(rename = "T50")]
    pub t50: Option<f64>,
    #[serde(rename = "T50_SD")]
    pub t50_sd: Option<f64>,
    pub k: Option<f64>,
    #[serde(rename = "k_SD")]
    pub k_sd: Option<f64>,
}

pub async fn save_kinetic_raw_data(record: KineticRawRecord) -> Result<i32, CureError> {
    let fields = kinetic_raw_data::ActiveModel {
        user_name: Set(record.user_name),
        slope_units: Set(record.slope_units),
        yield_value: Set(record.yield_value),
        yield_units: Set(record.yield_units),
        dilution: Set(record.dilution),
        purification_date: Set(record.purification_date),
        assay_date: Set(record.assay_date),
        csv_filename: Set(Some(record.csv_filename)),
        plot_filename: Set(Some(record.plot_filename)),
        kcat: Set(record.kcat),
        kcat_sd: Set(record.kcat_sd),
        km: Set(record.km),
        km_sd: Set(record.km_sd),
        kcat_over_km: Set(record.kcat_over_km),
        kcat_over_km_sd: Set(record.kcat_over_km_sd),
        approved_by_student: Set(true),
        ..Default::default()
    };
    let saved = kinetic_db::upsert_kinetic_raw_data(record.parent_id, &record.variant, fields)
        .await
        .map_err(|e| CureError::Persistence(e.to_string()))?;
    Ok(saved.id)
}

pub async fn save_temp_raw_data(record: TempRawRecord) -> Result<i32, CureError> {
    let fields = temp_raw_data::ActiveModel {
        user_name: Set(record.user_name),
        variant: Set(record.variant),
        slope_units: Set(record.slope_units),
        purification_date: Set(record.purification_date),
        assay_date: Set(record.assay_date),
        csv_filename: Set(Some(record.csv_filename)),
        plot_filename: Set(Some(record.plot_filename)),
        t50: Set(record.t50),
        t50_sd: Set(record.t50_sd),
        k: Set(record.k),
        k_sd: Set(record.k_sd),
        approved_by_student: Set(true),
        ..Default::default()
    };
    let saved = temp_db::upsert_temp_raw_data(record.parent_id, fields)
        .await
        .map_err(|e| CureError::Persistence(e.to_string()))?;
    Ok(saved.id)
}

pub async fn get_kinetic_raw_data(id: i32) -> Result<KineticRawData, CureError> {
    kinetic_db::get_kinetic_raw_data(id)
        .await
        .map_err(|e| CureError::Fetch(e.to_string()))?
        .ok_or_else(|| CureError::NotFound(format!("Kinetic raw data {} not found", id)))
}

pub async fn get_kinetic_raw_data_by_parent(parent_id: i32) -> Result<KineticRawData, CureError> {
    kinetic_db::get_kinetic_raw_data_by_parent(parent_id)
        .await
        .map_err(|e| CureError::Fetch(e.to_string()))?
        .ok_or_else(|| CureError::NotFound(format!("No kinetic raw data for entry {}", parent_id)))
}

pub async fn get_temp_raw_data(id: i32) -> Result<TempRawData, CureError> {
    temp_db::get_temp_raw_data(id)
        .await
        .map_err(|e| CureError::Fetch(e.to_string()))?
        .ok_or_else(|| CureError::NotFound(format!("Temperature raw data {} not found", id)))
}

pub async fn get_temp_raw_data_by_parent(parent_id: i32) -> Result<TempRawData, CureError> {
    temp_db::get_temp_raw_data_by_parent(parent_id)
        .await
        .map_err(|e| CureError::Fetch(e.to_string()))?
        .ok_or_else(|| {
            CureError::NotFound(format!("No temperature raw data for entry {}", parent_id))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssayKind {
    Kinetic,
    Thermo,
}

/// A raw data record a variant may point at as its wild type reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildTypeCandidate {
    pub raw_data_id: i32,
    pub parent_id: i32,
    pub user_name: String,
    pub assay_date: Option<String>,
    pub plot_filename: Option<String>,
}

/**
 * List the wild type raw data records of an institution
 *
 * # Arguments
 * @param institution: &str - The institution of the entry being edited
 * @param kind: AssayKind - Kinetic or thermostability records
 *
 * # Returns
 * @return Result<Vec<WildTypeCandidate>, CureError> - The candidates, oldest first
 */
pub async fn wild_type_candidates(
    institution: &str,
    kind: AssayKind,
) -> Result<Vec<WildTypeCandidate>, CureError> {
    let parents: Vec<i32> = entries_db::get_wild_type_entries(institution)
        .await
        .map_err(|e| CureError::Fetch(e.to_string()))?
        .into_iter()
        .map(|entry| entry.id)
        .collect();

    let candidates = match kind {
        AssayKind::Kinetic => kinetic_db::get_kinetic_raw_data_for_parents(parents)
            .await
            .map_err(|e| CureError::Fetch(e.to_string()))?
            .into_iter()
            .map(|r| WildTypeCandidate {
                raw_data_id: r.id,
                parent_id: r.parent_id,
                user_name: r.user_name,
                assay_date: r.assay_date,
                plot_filename: r.plot_filename,
            })
            .collect(),
        AssayKind::Thermo => temp_db::get_temp_raw_data_for_parents(parents)
            .await
            .map_err(|e| CureError::Fetch(e.to_string()))?
            .into_iter()
            .map(|r| WildTypeCandidate {
                raw_data_id: r.id,
                parent_id: r.parent_id,
                user_name: r.user_name,
                assay_date: r.assay_date,
                plot_filename: r.plot_filename,
            })
            .collect(),
    };
    Ok(candidates)
}

/// A wild type reference must name a record whose parent entry is wild type
/// and belongs to the same institution as `entry`.
pub async fn validate_wild_type_reference(
    store: &dyn EntryStore,
    entry: &Entry,
    kind: AssayKind,
    raw_data_id: i32,
) -> Result<(), CureError> {
    let parent_id = match kind {
        AssayKind::Kinetic => store.kinetic_raw_data(raw_data_id).await?.parent_id,
        AssayKind::Thermo => store.temp_raw_data(raw_data_id).await?.parent_id,
    };
    let parent = store.get(parent_id).await?;
    if !parent.is_wild_type() {
        return Err(CureError::Validation(format!(
            "Raw data {} does not belong to a wild type entry",
            raw_data_id
        )));
    }
    if parent.institution != entry.institution {
        return Err(CureError::Validation(format!(
            "Wild type data must come from {}",
            entry.institution
        )));
    }
    Ok(())
}

/// Assay constants may only point at a raw record saved for the same entry.
pub async fn validate_own_reference(
    store: &dyn EntryStore,
    entry_id: i32,
    kind: AssayKind,
    raw_data_id: i32,
) -> Result<(), CureError> {
    let parent_id = match kind {
        AssayKind::Kinetic => store.kinetic_raw_data(raw_data_id).await.map(|raw| raw.parent_id),
        AssayKind::Thermo => store.temp_raw_data(raw_data_id).await.map(|raw| raw.parent_id),
    };
    match parent_id {
        Ok(parent_id) if parent_id == entry_id => Ok(()),
        Ok(parent_id) => Err(CureError::Validation(format!(
            "Raw data {} belongs to entry {}, not {}",
            raw_data_id, parent_id, entry_id
        ))),
        Err(CureError::NotFound(_)) => Err(CureError::Validation(format!(
            "Raw data {} does not exist",
            raw_data_id
        ))),
        Err(e) => Err(e),
    }
}
