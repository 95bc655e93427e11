use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::YieldUnits;

/// Wild type entries carry this residue in place of a mutation.
pub const WILD_TYPE_RESIDUE: &str = "X";

/**
 * One enzyme variant submission. Every checklist item owns a slice of these
 * columns, see `d2d_lib::core::entry::EntryPatch`.
 */
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "CharacterizationData")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub resid: String,
    pub resnum: i32,
    pub resmut: String,
    pub creator: String,
    pub institution: String,
    pub pi: String,
    pub teammate: Option<String>,
    pub teammate2: Option<String>,
    pub teammate3: Option<String>,
    pub comments: Option<String>,
    #[sea_orm(column_name = "Rosetta_score")]
    #[serde(rename = "Rosetta_score")]
    pub rosetta_score: Option<f64>,
    pub oligo_ordered: bool,
    pub plasmid_verified: bool,
    pub ab1_filename: Option<String>,
    pub expressed: Option<bool>,
    pub yield_avg: Option<f64>,
    pub yield_units: Option<YieldUnits>,
    pub raw_data_id: i32,
    pub kcat_avg: Option<f64>,
    #[sea_orm(column_name = "kcat_SD")]
    #[serde(rename = "kcat_SD")]
    pub kcat_sd: Option<f64>,
    #[sea_orm(column_name = "KM_avg")]
    #[serde(rename = "KM_avg")]
    pub km_avg: Option<f64>,
    #[sea_orm(column_name = "KM_SD")]
    #[serde(rename = "KM_SD")]
    pub km_sd: Option<f64>,
    #[sea_orm(column_name = "kcat_over_KM")]
    #[serde(rename = "kcat_over_KM")]
    pub kcat_over_km: Option<f64>,
    #[sea_orm(column_name = "kcat_over_KM_SD")]
    #[serde(rename = "kcat_over_KM_SD")]
    pub kcat_over_km_sd: Option<f64>,
    #[sea_orm(column_name = "WT_raw_data_id")]
    #[serde(rename = "WT_raw_data_id")]
    pub wt_raw_data_id: i32,
    pub temp_raw_data_id: i32,
    #[sea_orm(column_name = "T50")]
    #[serde(rename = "T50")]
    pub t50: Option<f64>,
    #[sea_orm(column_name = "T50_SD")]
    #[serde(rename = "T50_SD")]
    pub t50_sd: Option<f64>,
    #[sea_orm(column_name = "T50_k")]
    #[serde(rename = "T50_k")]
    pub t50_k: Option<f64>,
    #[sea_orm(column_name = "T50_k_SD")]
    #[serde(rename = "T50_k_SD")]
    pub t50_k_sd: Option<f64>,
    #[sea_orm(column_name = "WT_temp_raw_data_id")]
    #[serde(rename = "WT_temp_raw_data_id")]
    pub wt_temp_raw_data_id: i32,
    #[sea_orm(column_name = "Tm")]
    #[serde(rename = "Tm")]
    pub tm: Option<f64>,
    #[sea_orm(column_name = "Tm_SD")]
    #[serde(rename = "Tm_SD")]
    pub tm_sd: Option<f64>,
    pub gel_filename: Option<String>,
    pub submitted_for_curation: bool,
    pub approved_by_pi: bool,
    pub curated: bool,
    pub version: i32,
}

impl Model {
    pub fn is_wild_type(&self) -> bool {
        self.resid == WILD_TYPE_RESIDUE
    }

    /// Variant name as used in file names, e.g. `A123C`, or `WT`.
    pub fn variant_name(&self) -> String {
        if self.is_wild_type() {
            "WT".to_string()
        } else {
            format!("{}{}{}", self.resid, self.resnum, self.resmut)
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
