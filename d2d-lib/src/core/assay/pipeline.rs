use serde::Serialize;

use super::keys::{file_name, KeyParts};
use super::kinetic::KineticSheet;
use super::thermal::ThermalSheet;
use crate::base64::decode_image;
use crate::core::entry::{Entry, EntryPatch, KineticConstants, ThermalConstants};
use crate::core::forms::FormContext;
use crate::core::raw_data::{KineticRawData, KineticRawRecord, TempRawData, TempRawRecord};
use crate::error::CureError;
use crate::external_services::fit_service::CurveFitter;
use crate::external_services::object_store::ObjectStore;
use crate::models::fit_service::{KineticFit, ThermalFit};

const CSV: &str = "text/csv";
const PNG: &str = "image/png";

/// A fitted kinetic sheet held until the user saves it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KineticPreview {
    pub sheet: KineticSheet,
    pub fit: KineticFit,
    #[serde(skip)]
    pub csv: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThermalPreview {
    pub sheet: ThermalSheet,
    pub warnings: Vec<String>,
    pub fit: ThermalFit,
    #[serde(skip)]
    pub csv: Vec<u8>,
}

/// Serialize the (possibly edited) sheet and send it for fitting. Nothing is stored.
pub async fn preview_kinetic(
    fitter: &dyn CurveFitter,
    sheet: KineticSheet,
    variant: &str,
) -> Result<KineticPreview, CureError> {
    let csv = sheet.rebuild().to_csv()?;
    let fit = fitter.fit_kinetic(csv.clone(), variant).await?;
    Ok(KineticPreview { sheet, fit, csv })
}

pub async fn preview_thermal(
    fitter: &dyn CurveFitter,
    mut sheet: ThermalSheet,
    variant: &str,
    sanitize: bool,
) -> Result<ThermalPreview, CureError> {
    let warnings = if sanitize { sheet.sanitize() } else { vec![] };
    let csv = sheet.rebuild().to_csv()?;
    let fit = fitter.fit_thermal(csv.clone(), variant).await?;
    Ok(ThermalPreview {
        sheet,
        warnings,
        fit,
        csv,
    })
}

async fn put_plot(
    objects: &dyn ObjectStore,
    key: &str,
    encoded: &str,
) -> Result<(), CureError> {
    let bytes = decode_image(encoded)
        .ok_or_else(|| CureError::Upload(format!("plot for {} is not valid base64", key)))?;
    objects.put(key, bytes, PNG).await
}

/**
 * Store a kinetic preview and point the entry at it. The CSV and plots are
 * uploaded first, then the raw data record is written, then the entry.
 * Uploads that succeeded before a later failure are left in place.
 *
 * # Arguments
 * @param ctx: &FormContext - Stores and settings
 * @param user: &str - Name of the uploading user
 * @param entry: &Entry - The entry as last read
 * @param preview: &KineticPreview - The fit to save
 *
 * # Returns
 * @return Result<Entry, CureError> - The updated entry
 */
pub async fn save_kinetic(
    ctx: &FormContext<'_>,
    user: &str,
    entry: &Entry,
    preview: &KineticPreview,
) -> Result<Entry, CureError> {
    if preview.fit.km.is_none() {
        return Err(CureError::Validation(
            "The fit did not produce a KM value, nothing was saved".into(),
        ));
    }
    let variant = entry.variant_name();
    let parts = KeyParts {
        user,
        enzyme: &ctx.settings.enzyme_abbreviation,
        variant: &variant,
        entry_id: entry.id,
    };
    let csv_key = parts.kinetic_csv();
    let plot_key = parts.kinetic_plot();

    ctx.objects.put(&csv_key, preview.csv.clone(), CSV).await?;
    put_plot(ctx.objects, &plot_key, &preview.fit.menten_plot).await?;
    if let Some(lineweaver) = &preview.fit.lineweaver_plot {
        put_plot(ctx.objects, &parts.lineweaver_plot(), lineweaver).await?;
    }

    let metadata = &preview.sheet.metadata;
    let fit = &preview.fit;
    let raw_data_id = ctx
        .store
        .save_kinetic_raw_data(KineticRawRecord {
            parent_id: entry.id,
            user_name: user.to_string(),
            variant: variant.clone(),
            slope_units: metadata.slope_units,
            yield_value: entry.yield_avg,
            yield_units: metadata.yield_units.or(entry.yield_units),
            dilution: metadata.dilution,
            purification_date: metadata.purification_date.clone(),
            assay_date: metadata.assay_date.clone(),
            csv_filename: file_name(&csv_key).to_string(),
            plot_filename: file_name(&plot_key).to_string(),
            kcat: fit.kcat,
            kcat_sd: fit.kcat_sd,
            km: fit.km,
            km_sd: fit.km_sd,
            kcat_over_km: fit.kcat_over_km,
            kcat_over_km_sd: fit.kcat_over_km_sd,
        })
        .await?;
    log::info!("Saved kinetic raw data {} for entry {}", raw_data_id, entry.id);

    ctx.store
        .apply_patch(
            entry.id,
            Some(entry.version),
            EntryPatch::KineticAssay(KineticConstants {
                raw_data_id,
                kcat_avg: fit.kcat,
                kcat_sd: fit.kcat_sd,
                km_avg: fit.km,
                km_sd: fit.km_sd,
                kcat_over_km: fit.kcat_over_km,
                kcat_over_km_sd: fit.kcat_over_km_sd,
            }),
        )
        .await
}

pub async fn save_thermal(
    ctx: &FormContext<'_>,
    user: &str,
    entry: &Entry,
    preview: &ThermalPreview,
) -> Result<Entry, CureError> {
    if preview.fit.t50.is_none() {
        return Err(CureError::Validation(
            "The fit did not produce a T50 value, nothing was saved".into(),
        ));
    }
    let variant = entry.variant_name();
    let parts = KeyParts {
        user,
        enzyme: &ctx.settings.enzyme_abbreviation,
        variant: &variant,
        entry_id: entry.id,
    };
    let csv_key = parts.thermal_csv();
    let plot_key = parts.thermal_plot();

    ctx.objects.put(&csv_key, preview.csv.clone(), CSV).await?;
    put_plot(ctx.objects, &plot_key, &preview.fit.image).await?;

    let metadata = &preview.sheet.metadata;
    let fit = &preview.fit;
    let temp_raw_data_id = ctx
        .store
        .save_temp_raw_data(TempRawRecord {
            parent_id: entry.id,
            user_name: user.to_string(),
            variant: variant.clone(),
            slope_units: metadata.slope_units,
            purification_date: metadata.purification_date.clone(),
            assay_date: metadata.assay_date.clone(),
            csv_filename: file_name(&csv_key).to_string(),
            plot_filename: file_name(&plot_key).to_string(),
            t50: fit.t50,
            t50_sd: fit.t50_sd,
            k: fit.k,
            k_sd: fit.k_sd,
        })
        .await?;
    log::info!("Saved temperature raw data {} for entry {}", temp_raw_data_id, entry.id);

    ctx.store
        .apply_patch(
            entry.id,
            Some(entry.version),
            EntryPatch::ThermoAssay(ThermalConstants {
                temp_raw_data_id,
                t50: fit.t50,
                t50_sd: fit.t50_sd,
                t50_k: fit.k,
                t50_k_sd: fit.k_sd,
            }),
        )
        .await
}

/// Reopen the spreadsheet behind a saved kinetic record.
pub async fn load_kinetic_sheet(
    objects: &dyn ObjectStore,
    raw: &KineticRawData,
) -> Result<KineticSheet, CureError> {
    let name = raw
        .csv_filename
        .as_deref()
        .ok_or_else(|| CureError::NotFound(format!("Kinetic raw data {} has no CSV", raw.id)))?;
    let bytes = objects.get(&format!("kinetic_assays/raw/{}", name)).await?;
    KineticSheet::parse(&bytes)
}

pub async fn load_thermal_sheet(
    objects: &dyn ObjectStore,
    raw: &TempRawData,
) -> Result<ThermalSheet, CureError> {
    let name = raw.csv_filename.as_deref().ok_or_else(|| {
        CureError::NotFound(format!("Temperature raw data {} has no CSV", raw.id))
    })?;
    let bytes = objects
        .get(&format!("temperature_assays/raw/{}", name))
        .await?;
    ThermalSheet::parse(&bytes)
}
