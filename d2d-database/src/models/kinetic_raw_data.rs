use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::{KineticSlopeUnits, YieldUnits};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "KineticRawData")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_id: i32,
    pub user_name: String,
    pub variant: String,
    pub slope_units: Option<KineticSlopeUnits>,
    #[sea_orm(column_name = "yield")]
    #[serde(rename = "yield")]
    pub yield_value: Option<f64>,
    pub yield_units: Option<YieldUnits>,
    pub dilution: Option<f64>,
    pub purification_date: Option<String>,
    pub assay_date: Option<String>,
    pub csv_filename: Option<String>,
    pub plot_filename: Option<String>,
    pub kcat: Option<f64>,
    #[sea_orm(column_name = "kcat_SD")]
    #[serde(rename = "kcat_SD")]
    pub kcat_sd: Option<f64>,
    #[sea_orm(column_name = "KM")]
    #[serde(rename = "KM")]
    pub km: Option<f64>,
    #[sea_orm(column_name = "KM_SD")]
    #[serde(rename = "KM_SD")]
    pub km_sd: Option<f64>,
    #[sea_orm(column_name = "kcat_over_KM")]
    #[serde(rename = "kcat_over_KM")]
    pub kcat_over_km: Option<f64>,
    #[sea_orm(column_name = "kcat_over_KM_SD")]
    #[serde(rename = "kcat_over_KM_SD")]
    pub kcat_over_km_sd: Option<f64>,
    pub approved_by_student: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
