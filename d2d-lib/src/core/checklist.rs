use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::entry::Entry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChecklistItem {
    ProteinModeled,
    OligoOrdered,
    PlasmidVerified,
    ProteinInduced,
    Expressed,
    KineticAssay,
    WildTypeKinetic,
    ThermoAssay,
    WildTypeThermo,
    MeltingPoint,
    GelUploaded,
}

impl ChecklistItem {
    /// Display order of the checklist.
    pub const ALL: [ChecklistItem; 11] = [
        ChecklistItem::ProteinModeled,
        ChecklistItem::OligoOrdered,
        ChecklistItem::PlasmidVerified,
        ChecklistItem::ProteinInduced,
        ChecklistItem::Expressed,
        ChecklistItem::KineticAssay,
        ChecklistItem::WildTypeKinetic,
        ChecklistItem::ThermoAssay,
        ChecklistItem::WildTypeThermo,
        ChecklistItem::MeltingPoint,
        ChecklistItem::GelUploaded,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChecklistItem::ProteinModeled => "Protein Modeled",
            ChecklistItem::OligoOrdered => "Oligonucleotide ordered",
            ChecklistItem::PlasmidVerified => "Plasmid sequence verified",
            ChecklistItem::ProteinInduced => "Protein induced",
            ChecklistItem::Expressed => "Expressed",
            ChecklistItem::KineticAssay => "Kinetic assay data uploaded",
            ChecklistItem::WildTypeKinetic => "Wild type kinetic data uploaded",
            ChecklistItem::ThermoAssay => "Thermostability assay data uploaded",
            ChecklistItem::WildTypeThermo => "Wild type thermostability assay data uploaded",
            ChecklistItem::MeltingPoint => "Melting point values uploaded",
            ChecklistItem::GelUploaded => "Gel uploaded",
        }
    }

    /// Items holding biological measurements. These are frozen once an entry is curated.
    pub fn is_measurement(&self) -> bool {
        matches!(
            self,
            ChecklistItem::ProteinInduced
                | ChecklistItem::Expressed
                | ChecklistItem::KineticAssay
                | ChecklistItem::WildTypeKinetic
                | ChecklistItem::ThermoAssay
                | ChecklistItem::WildTypeThermo
                | ChecklistItem::MeltingPoint
        )
    }
}

impl Display for ChecklistItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ChecklistItem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChecklistItem::ALL
            .iter()
            .find(|item| item.label() == s.trim())
            .copied()
            .ok_or_else(|| format!("Unknown checklist item: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Complete,
    Incomplete,
}

impl From<bool> for ItemStatus {
    fn from(done: bool) -> Self {
        if done {
            ItemStatus::Complete
        } else {
            ItemStatus::Incomplete
        }
    }
}

/// Status of one item. Reads only the columns that item owns.
pub fn status(item: ChecklistItem, entry: &Entry) -> ItemStatus {
    let done = match item {
        ChecklistItem::ProteinModeled => entry.rosetta_score.is_some(),
        ChecklistItem::OligoOrdered => entry.oligo_ordered,
        ChecklistItem::PlasmidVerified => entry.plasmid_verified,
        ChecklistItem::ProteinInduced => entry.expressed.is_some(),
        ChecklistItem::Expressed => entry.yield_avg.is_some(),
        ChecklistItem::KineticAssay => entry.km_avg.is_some() && entry.raw_data_id != 0,
        ChecklistItem::WildTypeKinetic => entry.wt_raw_data_id != 0,
        ChecklistItem::ThermoAssay => entry.t50.is_some() && entry.temp_raw_data_id != 0,
        ChecklistItem::WildTypeThermo => entry.wt_temp_raw_data_id != 0,
        ChecklistItem::MeltingPoint => entry.tm.is_some() && entry.tm_sd.is_some(),
        ChecklistItem::GelUploaded => entry.gel_filename.is_some(),
    };
    done.into()
}

fn plus_minus(value: Option<f64>, sd: Option<f64>, places: usize) -> Option<String> {
    let value = value?;
    Some(match sd {
        Some(sd) => format!("{:.*} ± {:.*}", places, value, places, sd),
        None => format!("{:.*}", places, value),
    })
}

/// Short summary shown next to a completed item.
pub fn additional_info(item: ChecklistItem, entry: &Entry) -> Option<String> {
    if status(item, entry) == ItemStatus::Incomplete {
        return None;
    }
    match item {
        ChecklistItem::ProteinModeled => entry.rosetta_score.map(|delta| format!("Δ {}", delta)),
        ChecklistItem::Expressed => {
            let units = entry.yield_units.map(|u| u.display()).unwrap_or_default();
            entry
                .yield_avg
                .map(|avg| format!("{} {}", avg, units).trim_end().to_string())
        }
        ChecklistItem::KineticAssay => {
            let km = plus_minus(entry.km_avg, entry.km_sd, 2)?;
            match plus_minus(entry.kcat_avg, entry.kcat_sd, 1) {
                Some(kcat) => Some(format!("KM {} mM; kcat {} min⁻¹", km, kcat)),
                None => Some(format!("KM {} mM", km)),
            }
        }
        ChecklistItem::ThermoAssay => {
            plus_minus(entry.t50, entry.t50_sd, 1).map(|t50| format!("{}°C", t50))
        }
        ChecklistItem::MeltingPoint => {
            plus_minus(entry.tm, entry.tm_sd, 1).map(|tm| format!("{}°C", tm))
        }
        ChecklistItem::GelUploaded => entry.gel_filename.clone(),
        ChecklistItem::PlasmidVerified => entry.ab1_filename.clone(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistRow {
    pub item: ChecklistItem,
    pub label: String,
    pub status: ItemStatus,
    pub additional_info: Option<String>,
}

pub fn checklist(entry: &Entry) -> Vec<ChecklistRow> {
    ChecklistItem::ALL
        .iter()
        .map(|item| ChecklistRow {
            item: *item,
            label: item.label().to_string(),
            status: status(*item, entry),
            additional_info: additional_info(*item, entry),
        })
        .collect()
}

pub fn all_complete(entry: &Entry) -> bool {
    ChecklistItem::ALL
        .iter()
        .all(|item| status(*item, entry) == ItemStatus::Complete)
}
