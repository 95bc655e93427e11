use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use d2d_lib::core::checklist::all_complete;
use d2d_lib::core::curation::{create_entry, CurationStatus, NewEntryInfo};
use d2d_lib::core::entry::{
    check_patch, EntryPatch, EntryStore, ExpressionYield, GelFilename, KineticConstants, MeltingPointValues,
    OligoOrdered, PatchRequest, PlasmidSequence, ProteinInduced, RosettaScore, ThermalConstants,
    WildTypeKineticRef, WildTypeThermoRef,
};
use d2d_lib::core::forms::gel::GelChoice;
use d2d_lib::core::forms::protein_modeled::RosettaInput;
use d2d_lib::core::forms::{submit, FormOutcome, FormSubmission};
use d2d_lib::core::upload::MAX_AB1_BYTES;
use d2d_lib::core::workflow::Workflow;
use d2d_lib::error::CureError;
use serde::{Deserialize, Serialize};

use super::error_response;
use super::multipart::read_form;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IdQuery {
    pub id: i32,
}

#[derive(Deserialize)]
pub struct ProteinModeledRequest {
    pub id: i32,
    pub version: Option<i32>,
    #[serde(flatten)]
    pub scores: RosettaInput,
}

#[derive(Deserialize)]
pub struct MeltingPointRequest {
    pub id: i32,
    pub version: Option<i32>,
    pub tm_mean: String,
    pub tm_std_dev: String,
}

#[derive(Serialize)]
struct ChecklistView {
    entry_id: i32,
    variant: String,
    status: &'static str,
    complete: bool,
    rows: Vec<d2d_lib::core::checklist::ChecklistRow>,
}

/**
 * Load the entry and run one sub-form submission against it
 *
 * # Arguments
 * @param state: &AppState - Shared stores and settings
 * @param id: i32 - Entry id
 * @param version: Option<i32> - Version the caller last saw; None skips the check
 * @param user: &str - Submitting user
 * @param submission: FormSubmission - The sub-form input
 *
 * # Returns
 * @return Result<FormOutcome, CureError> - The updated entry and any warnings
 */
pub(crate) async fn run_form(
    state: &AppState,
    id: i32,
    version: Option<i32>,
    user: &str,
    submission: FormSubmission,
) -> Result<FormOutcome, CureError> {
    let entry = state.store.get(id).await?;
    if let Some(expected) = version {
        if expected != entry.version {
            return Err(CureError::Conflict {
                expected,
                actual: entry.version,
            });
        }
    }
    submit(&state.form_context(), user, &entry, submission).await
}

async fn apply<T>(
    state: &AppState,
    request: PatchRequest<T>,
    into_patch: impl FnOnce(T) -> EntryPatch,
) -> HttpResponse {
    let patch = into_patch(request.fields);
    if let Err(e) = check_patch(&state.store, &state.settings, request.id, &patch).await {
        return error_response(e);
    }
    match state.store.apply_patch(request.id, request.version, patch).await {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => error_response(e),
    }
}

fn entry_of(result: Result<FormOutcome, CureError>) -> HttpResponse {
    match result {
        Ok(outcome) => HttpResponse::Ok().json(outcome.entry),
        Err(e) => error_response(e),
    }
}

fn outcome_of(result: Result<FormOutcome, CureError>) -> HttpResponse {
    match result {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => error_response(e),
    }
}

#[get("/getCharacterizationDataEntryFromID")]
pub async fn get_entry(state: web::Data<AppState>, query: web::Query<IdQuery>) -> impl Responder {
    match state.store.get(query.id).await {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => error_response(e),
    }
}

#[get("/checklist/{id}")]
pub async fn checklist(state: web::Data<AppState>, id: web::Path<i32>) -> impl Responder {
    let mut workflow = Workflow::new(state.store.clone(), id.into_inner());
    let (entry_id, variant, status, complete) = match workflow.load().await {
        Ok(entry) => (
            entry.id,
            entry.variant_name(),
            CurationStatus::of(entry).label(),
            all_complete(entry),
        ),
        Err(e) => return error_response(e),
    };
    HttpResponse::Ok().json(ChecklistView {
        entry_id,
        variant,
        status,
        complete,
        rows: workflow.rows(),
    })
}

#[post("/createNewCharacterizationDataEntry")]
pub async fn create(info: web::Json<NewEntryInfo>) -> impl Responder {
    match create_entry(info.into_inner()).await {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => error_response(e),
    }
}

#[post("/updateCharacterizationDataRosettaScore")]
pub async fn rosetta_score(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<RosettaScore>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::ProteinModeled).await
}

/// Check both Rosetta scores and store their delta, returning advisory warnings.
#[post("/submitProteinModeled")]
pub async fn protein_modeled(
    state: web::Data<AppState>,
    body: web::Json<ProteinModeledRequest>,
) -> impl Responder {
    let request = body.into_inner();
    outcome_of(
        run_form(
            &state,
            request.id,
            request.version,
            "",
            FormSubmission::ProteinModeled(request.scores),
        )
        .await,
    )
}

#[post("/updateCharacterizationDataOligoOrdered")]
pub async fn oligo_ordered(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<OligoOrdered>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::OligoOrdered).await
}

#[post("/updateCharacterizationDataPlasmidStuff")]
pub async fn plasmid(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<PlasmidSequence>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::PlasmidVerified).await
}

/// Multipart fields: `id`, optional `version`, `user_name` and the `file` (.ab1).
#[post("/uploadSequencingFile")]
pub async fn upload_sequencing_file(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let result = async {
        let mut form = read_form(payload, MAX_AB1_BYTES).await?;
        let file = form.take_file("file")?;
        let version = form.optional_text("version").map(|_| form.number("version")).transpose()?;
        run_form(
            &state,
            form.number("id")?,
            version,
            form.text("user_name")?,
            FormSubmission::PlasmidVerified(file),
        )
        .await
    }
    .await;
    entry_of(result)
}

#[post("/updateCharacterizationDataExpressed")]
pub async fn expressed(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<ProteinInduced>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::ProteinInduced).await
}

#[post("/updateCharacterizationDataYieldAvg")]
pub async fn yield_avg(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<ExpressionYield>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::Expressed).await
}

#[post("/updateCharacterizationDataKineticStuff")]
pub async fn kinetic_constants(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<KineticConstants>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::KineticAssay).await
}

#[post("/updateCharacterizationDataWTRawDataId")]
pub async fn wild_type_kinetic(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<WildTypeKineticRef>>,
) -> impl Responder {
    let request = body.into_inner();
    let submission = FormSubmission::WildTypeKinetic {
        raw_data_id: request.fields.wt_raw_data_id,
    };
    entry_of(run_form(&state, request.id, request.version, "", submission).await)
}

#[post("/updateCharacterizationDataThermoStuff")]
pub async fn thermal_constants(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<ThermalConstants>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::ThermoAssay).await
}

#[post("/updateCharacterizationDataWTTempRawDataId")]
pub async fn wild_type_thermo(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<WildTypeThermoRef>>,
) -> impl Responder {
    let request = body.into_inner();
    let submission = FormSubmission::WildTypeThermo {
        raw_data_id: request.fields.wt_temp_raw_data_id,
    };
    entry_of(run_form(&state, request.id, request.version, "", submission).await)
}

#[post("/updateMeltingPointValues")]
pub async fn melting_point(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<MeltingPointValues>>,
) -> impl Responder {
    apply(&state, body.into_inner(), EntryPatch::MeltingPoint).await
}

/// Melting point as typed by the user; both values must read as decimals.
#[post("/submitMeltingPoint")]
pub async fn melting_point_form(
    state: web::Data<AppState>,
    body: web::Json<MeltingPointRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let submission = FormSubmission::MeltingPoint {
        tm_mean: request.tm_mean,
        tm_std_dev: request.tm_std_dev,
    };
    outcome_of(run_form(&state, request.id, request.version, "", submission).await)
}

#[post("/updateCharacterizationDataGelFilename")]
pub async fn gel_filename(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<GelFilename>>,
) -> impl Responder {
    let request = body.into_inner();
    let submission = FormSubmission::Gel(GelChoice::Existing(request.fields.gel_filename));
    entry_of(run_form(&state, request.id, request.version, "", submission).await)
}
