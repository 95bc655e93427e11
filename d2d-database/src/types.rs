use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub(super) struct DbConnectParams {
    password: String,
    dbname: String,
    engine: String,
    port: u16,
    host: String,
    username: String,
}

impl DbConnectParams {
    pub fn to_url(&self) -> String {
        format!(
            "{}://{}:{}@{}:{}/{}?{}",
            self.engine,
            self.username,
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.dbname,
            std::env::var("DB_OPTIONS").unwrap_or_default(),
        )
    }
}

/**
 * Units used for the expression yield. The stored values keep the spelling the
 * database has always used, the labels are what the assay template carries.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum YieldUnits {
    #[sea_orm(string_value = "A280_")]
    #[serde(rename = "A280_")]
    A280,
    #[sea_orm(string_value = "mg_mL_")]
    #[serde(rename = "mg_mL_")]
    MgPerMl,
    #[sea_orm(string_value = "mM_")]
    #[serde(rename = "mM_")]
    Millimolar,
    #[sea_orm(string_value = "M_")]
    #[serde(rename = "M_")]
    Molar,
}

impl YieldUnits {
    /**
     * Map the spelling found in a kinetic template cell
     *
     * # Arguments
     * @param label: &str - The raw cell value, e.g. "(mg/mL)"
     *
     * # Returns
     * @return Option<YieldUnits> - None when the label is not a known unit
     */
    pub fn from_template_label(label: &str) -> Option<Self> {
        match label.trim() {
            "A280*" => Some(YieldUnits::A280),
            "(mg/mL)" => Some(YieldUnits::MgPerMl),
            "(mM)" => Some(YieldUnits::Millimolar),
            "(M)" => Some(YieldUnits::Molar),
            _ => None,
        }
    }

    /// Human readable unit, as shown next to the yield value.
    pub fn display(&self) -> &'static str {
        match self {
            YieldUnits::A280 => "A280*",
            YieldUnits::MgPerMl => "mg/mL",
            YieldUnits::Millimolar => "mM",
            YieldUnits::Molar => "M",
        }
    }

    /// Accepts either the template label or the display form.
    pub fn parse_any(label: &str) -> Option<Self> {
        Self::from_template_label(label).or_else(|| match label.trim() {
            "mg/mL" | "mg_mL_" => Some(YieldUnits::MgPerMl),
            "mM" | "mM_" => Some(YieldUnits::Millimolar),
            "M" | "M_" => Some(YieldUnits::Molar),
            "A280_" => Some(YieldUnits::A280),
            _ => None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum KineticSlopeUnits {
    #[sea_orm(string_value = "min_1min_Kin")]
    #[serde(rename = "min_1min_Kin")]
    PerMinute,
    #[sea_orm(string_value = "s_1s_Kin")]
    #[serde(rename = "s_1s_Kin")]
    PerSecond,
    #[sea_orm(string_value = "min_3min_Kin")]
    #[serde(rename = "min_3min_Kin")]
    MilliPerMinute,
    #[sea_orm(string_value = "s_10s_Kin")]
    #[serde(rename = "s_10s_Kin")]
    MilliPerSecond,
}

impl KineticSlopeUnits {
    pub fn from_template_label(label: &str) -> Option<Self> {
        match label.trim() {
            "(1/min)" => Some(KineticSlopeUnits::PerMinute),
            "(1/s)" => Some(KineticSlopeUnits::PerSecond),
            "(10^-3/min)" => Some(KineticSlopeUnits::MilliPerMinute),
            "(10^-3/s)" => Some(KineticSlopeUnits::MilliPerSecond),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
pub enum TempSlopeUnits {
    #[sea_orm(string_value = "min_1min_Temp")]
    #[serde(rename = "min_1min_Temp")]
    PerMinute,
    #[sea_orm(string_value = "s_1s_Temp")]
    #[serde(rename = "s_1s_Temp")]
    PerSecond,
    #[sea_orm(string_value = "min_3min_Temp")]
    #[serde(rename = "min_3min_Temp")]
    MilliPerMinute,
    #[sea_orm(string_value = "s_3s_Temp")]
    #[serde(rename = "s_3s_Temp")]
    MilliPerSecond,
}

impl TempSlopeUnits {
    pub fn from_template_label(label: &str) -> Option<Self> {
        match label.trim() {
            "(1/min)" => Some(TempSlopeUnits::PerMinute),
            "(1/s)" => Some(TempSlopeUnits::PerSecond),
            "(10^-3/min)" => Some(TempSlopeUnits::MilliPerMinute),
            "(10^-3/s)" => Some(TempSlopeUnits::MilliPerSecond),
            _ => None,
        }
    }
}
