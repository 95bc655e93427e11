use d2d_database::types::YieldUnits;
use serde::Serialize;

use self::gel::GelChoice;
use self::protein_modeled::RosettaInput;
use super::assay::keys::{file_name, KeyParts};
use super::assay::pipeline::{save_kinetic, save_thermal, KineticPreview, ThermalPreview};
use super::checklist::ChecklistItem;
use super::entry::{
    Entry, EntryPatch, EntryStore, ExpressionYield, GelFilename, MeltingPointValues, OligoOrdered,
    PlasmidSequence, ProteinInduced, RosettaScore, WildTypeKineticRef, WildTypeThermoRef,
};
use super::raw_data::{validate_wild_type_reference, AssayKind};
use super::upload::{UploadedFile, MAX_AB1_BYTES};
use crate::config::Settings;
use crate::error::CureError;
use crate::external_services::fit_service::CurveFitter;
use crate::external_services::object_store::ObjectStore;
use crate::helpers::{is_decimal_input, parse_decimal};

pub mod gel;
pub mod protein_modeled;

/// Everything a sub-form talks to.
pub struct FormContext<'a> {
    pub store: &'a dyn EntryStore,
    pub objects: &'a dyn ObjectStore,
    pub fitter: &'a dyn CurveFitter,
    pub settings: &'a Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormState {
    Editing,
    Submitting,
    Saved,
}

/// One submission per checklist item, carrying exactly what that sub-form collects.
#[derive(Debug, Clone, PartialEq)]
pub enum FormSubmission {
    ProteinModeled(RosettaInput),
    OligoOrdered(bool),
    PlasmidVerified(UploadedFile),
    ProteinInduced(bool),
    Expressed { yield_avg: String, yield_units: YieldUnits },
    KineticAssay(Box<KineticPreview>),
    WildTypeKinetic { raw_data_id: i32 },
    ThermoAssay(Box<ThermalPreview>),
    WildTypeThermo { raw_data_id: i32 },
    MeltingPoint { tm_mean: String, tm_std_dev: String },
    Gel(GelChoice),
}

impl FormSubmission {
    pub fn item(&self) -> ChecklistItem {
        match self {
            FormSubmission::ProteinModeled(_) => ChecklistItem::ProteinModeled,
            FormSubmission::OligoOrdered(_) => ChecklistItem::OligoOrdered,
            FormSubmission::PlasmidVerified(_) => ChecklistItem::PlasmidVerified,
            FormSubmission::ProteinInduced(_) => ChecklistItem::ProteinInduced,
            FormSubmission::Expressed { .. } => ChecklistItem::Expressed,
            FormSubmission::KineticAssay(_) => ChecklistItem::KineticAssay,
            FormSubmission::WildTypeKinetic { .. } => ChecklistItem::WildTypeKinetic,
            FormSubmission::ThermoAssay(_) => ChecklistItem::ThermoAssay,
            FormSubmission::WildTypeThermo { .. } => ChecklistItem::WildTypeThermo,
            FormSubmission::MeltingPoint { .. } => ChecklistItem::MeltingPoint,
            FormSubmission::Gel(_) => ChecklistItem::GelUploaded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormOutcome {
    pub entry: Entry,
    pub warnings: Vec<String>,
}

impl FormOutcome {
    fn saved(entry: Entry) -> Self {
        FormOutcome {
            entry,
            warnings: vec![],
        }
    }
}

fn melting_point_value(name: &str, value: &str) -> Result<f64, CureError> {
    if !is_decimal_input(value.trim()) {
        return Err(CureError::Validation(format!("{} must be a number", name)));
    }
    parse_decimal(value).ok_or_else(|| CureError::Validation(format!("{} is required", name)))
}

/**
 * Run one sub-form submission: validate locally, do any uploads, then write
 * the item's columns through the entry store
 *
 * # Arguments
 * @param ctx: &FormContext - Stores, fitter and settings
 * @param user: &str - Name of the submitting user, used in object keys
 * @param entry: &Entry - The entry as the sub-form last saw it
 * @param submission: FormSubmission - What the user entered
 *
 * # Returns
 * @return Result<FormOutcome, CureError> - The updated entry and any advisory warnings
 */
pub async fn submit(
    ctx: &FormContext<'_>,
    user: &str,
    entry: &Entry,
    submission: FormSubmission,
) -> Result<FormOutcome, CureError> {
    if entry.curated && submission.item().is_measurement() {
        return Err(CureError::CuratedLocked(entry.id));
    }
    let version = Some(entry.version);

    match submission {
        FormSubmission::ProteinModeled(input) => {
            let check = input.check(ctx.settings)?;
            let patch = EntryPatch::ProteinModeled(RosettaScore {
                rosetta_score: check.delta,
            });
            let updated = ctx.store.apply_patch(entry.id, version, patch).await?;
            Ok(FormOutcome {
                entry: updated,
                warnings: check.warnings,
            })
        }
        FormSubmission::OligoOrdered(oligo_ordered) => {
            let patch = EntryPatch::OligoOrdered(OligoOrdered { oligo_ordered });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
        FormSubmission::PlasmidVerified(file) => {
            file.check("ab1", MAX_AB1_BYTES)?;
            let variant = entry.variant_name();
            let key = KeyParts {
                user,
                enzyme: &ctx.settings.enzyme_abbreviation,
                variant: &variant,
                entry_id: entry.id,
            }
            .sequencing();
            ctx.objects
                .put(&key, file.bytes, "application/octet-stream")
                .await?;
            let patch = EntryPatch::PlasmidVerified(PlasmidSequence {
                ab1_filename: file_name(&key).to_string(),
            });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
        FormSubmission::ProteinInduced(expressed) => {
            let patch = EntryPatch::ProteinInduced(ProteinInduced { expressed });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
        FormSubmission::Expressed {
            yield_avg,
            yield_units,
        } => {
            let yield_avg = parse_decimal(&yield_avg).ok_or_else(|| {
                CureError::Validation("Please enter a valid number for the yield".into())
            })?;
            let patch = EntryPatch::Expressed(ExpressionYield {
                yield_avg,
                yield_units,
            });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
        FormSubmission::KineticAssay(preview) => {
            Ok(FormOutcome::saved(save_kinetic(ctx, user, entry, &preview).await?))
        }
        FormSubmission::WildTypeKinetic { raw_data_id } => {
            validate_wild_type_reference(ctx.store, entry, AssayKind::Kinetic, raw_data_id).await?;
            let patch = EntryPatch::WildTypeKinetic(WildTypeKineticRef {
                wt_raw_data_id: raw_data_id,
            });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
        FormSubmission::ThermoAssay(preview) => {
            let warnings = preview.warnings.clone();
            let updated = save_thermal(ctx, user, entry, &preview).await?;
            Ok(FormOutcome {
                entry: updated,
                warnings,
            })
        }
        FormSubmission::WildTypeThermo { raw_data_id } => {
            validate_wild_type_reference(ctx.store, entry, AssayKind::Thermo, raw_data_id).await?;
            let patch = EntryPatch::WildTypeThermo(WildTypeThermoRef {
                wt_temp_raw_data_id: raw_data_id,
            });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
        FormSubmission::MeltingPoint {
            tm_mean,
            tm_std_dev,
        } => {
            let patch = EntryPatch::MeltingPoint(MeltingPointValues {
                tm_mean: melting_point_value("Tm mean", &tm_mean)?,
                tm_std_dev: melting_point_value("Tm standard deviation", &tm_std_dev)?,
            });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
        FormSubmission::Gel(choice) => {
            let gel_filename = gel::resolve(ctx.objects, user, entry, choice).await?;
            let patch = EntryPatch::Gel(GelFilename { gel_filename });
            Ok(FormOutcome::saved(ctx.store.apply_patch(entry.id, version, patch).await?))
        }
    }
}

/// The state of one open sub-form. A failed submission drops back to
/// `Editing` so the same input can be sent again.
#[derive(Debug, Clone)]
pub struct FormSession {
    item: ChecklistItem,
    state: FormState,
    last_error: Option<String>,
}

impl FormSession {
    pub fn new(item: ChecklistItem) -> Self {
        FormSession {
            item,
            state: FormState::Editing,
            last_error: None,
        }
    }

    pub fn item(&self) -> ChecklistItem {
        self.item
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn submit(
        &mut self,
        ctx: &FormContext<'_>,
        user: &str,
        entry: &Entry,
        submission: FormSubmission,
    ) -> Result<FormOutcome, CureError> {
        if submission.item() != self.item {
            return Err(CureError::Validation(format!(
                "This form saves {}, not {}",
                self.item,
                submission.item()
            )));
        }
        self.state = FormState::Submitting;
        match submit(ctx, user, entry, submission).await {
            Ok(outcome) => {
                self.state = FormState::Saved;
                self.last_error = None;
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Saving {} for entry {} failed: {}", self.item, entry.id, e);
                self.state = FormState::Editing;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
