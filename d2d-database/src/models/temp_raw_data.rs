use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::TempSlopeUnits;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "TempRawData")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub parent_id: i32,
    pub user_name: String,
    pub variant: String,
    pub slope_units: Option<TempSlopeUnits>,
    pub purification_date: Option<String>,
    pub assay_date: Option<String>,
    pub csv_filename: Option<String>,
    pub plot_filename: Option<String>,
    #[sea_orm(column_name = "T50")]
    #[serde(rename = "T50")]
    pub t50: Option<f64>,
    #[sea_orm(column_name = "T50_SD")]
    #[serde(rename = "T50_SD")]
    pub t50_sd: Option<f64>,
    pub k: Option<f64>,
    #[sea_orm(column_name = "k_SD")]
    #[serde(rename = "k_SD")]
    pub k_sd: Option<f64>,
    pub approved_by_student: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
