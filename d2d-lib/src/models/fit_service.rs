use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Michaelis-Menten fit of a kinetic assay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KineticFit {
    #[serde(deserialize_with = "number_or_string")]
    pub kcat: Option<f64>,
    #[serde(rename = "kcat_SD", deserialize_with = "number_or_string")]
    pub kcat_sd: Option<f64>,
    #[serde(rename = "KM", deserialize_with = "number_or_string")]
    pub km: Option<f64>,
    #[serde(rename = "KM_SD", deserialize_with = "number_or_string")]
    pub km_sd: Option<f64>,
    #[serde(rename = "kcat_over_KM", deserialize_with = "number_or_string")]
    pub kcat_over_km: Option<f64>,
    #[serde(rename = "kcat_over_KM_SD", deserialize_with = "number_or_string")]
    pub kcat_over_km_sd: Option<f64>,
    /// base64 PNG
    pub menten_plot: String,
    #[serde(default)]
    pub lineweaver_plot: Option<String>,
}

/// Sigmoid fit of a thermostability assay.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ThermalFit {
    #[serde(rename = "T50", deserialize_with = "number_or_string")]
    pub t50: Option<f64>,
    #[serde(rename = "T50_SD", deserialize_with = "number_or_string")]
    pub t50_sd: Option<f64>,
    #[serde(deserialize_with = "number_or_string")]
    pub k: Option<f64>,
    #[serde(rename = "k_SD", deserialize_with = "number_or_string")]
    pub k_sd: Option<f64>,
    /// base64 PNG
    pub image: String,
}

// The fit service sends floats, but "nan" strings and nulls show up when a fit diverges.
fn number_or_string<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let helper: Value = Deserialize::deserialize(de)?;

    match helper {
        Value::Number(n) => Ok(n.as_f64().filter(|v| v.is_finite())),
        Value::String(s) => Ok(s.trim().parse::<f64>().ok().filter(|v| v.is_finite())),
        _ => Ok(None),
    }
}
