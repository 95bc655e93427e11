use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use d2d_lib::core::assay::grid::AssayGrid;
use d2d_lib::core::assay::kinetic::KineticSheet;
use d2d_lib::core::assay::pipeline::{
    load_kinetic_sheet, load_thermal_sheet, preview_kinetic, preview_thermal, KineticPreview,
    ThermalPreview,
};
use d2d_lib::core::assay::thermal::ThermalSheet;
use d2d_lib::core::entry::EntryStore;
use d2d_lib::core::forms::{FormOutcome, FormSubmission};
use d2d_lib::core::raw_data::{
    self, get_kinetic_raw_data_by_parent, get_temp_raw_data_by_parent, AssayKind,
    KineticRawRecord, TempRawRecord,
};
use d2d_lib::core::upload::MAX_CSV_BYTES;
use d2d_lib::error::CureError;
use d2d_lib::models::fit_service::{KineticFit, ThermalFit};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::entry::run_form;
use super::error_response;
use super::multipart::read_form;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ParentQuery {
    pub parent_id: i32,
}

#[derive(Deserialize)]
pub struct RawDataQuery {
    pub id: i32,
}

#[derive(Deserialize)]
pub struct CandidateQuery {
    pub institution: String,
    pub kind: AssayKind,
}

#[derive(Deserialize)]
pub struct PreviewRequest {
    pub variant: String,
    pub grid: AssayGrid,
    /// Thermal only: zero negatives and blank outliers before fitting.
    #[serde(default)]
    pub sanitize: bool,
}

#[derive(Deserialize)]
pub struct SaveRequest<F> {
    pub id: i32,
    pub version: Option<i32>,
    pub user_name: String,
    pub grid: AssayGrid,
    pub fit: F,
    /// Thermal only: clean the grid again before it is stored.
    #[serde(default)]
    pub sanitize: bool,
}

#[derive(Serialize)]
struct UploadedThermalSheet {
    sheet: ThermalSheet,
    warnings: Vec<String>,
}

async fn read_csv(payload: Multipart) -> Result<Vec<u8>, CureError> {
    // one byte of slack so an oversized file reaches the size check below
    let mut form = read_form(payload, MAX_CSV_BYTES + 1).await?;
    let file = form.take_file("file")?;
    file.check("csv", MAX_CSV_BYTES)?;
    Ok(file.bytes)
}

fn respond<T: Serialize>(result: Result<T, CureError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(e),
    }
}

/// Parse an uploaded kinetic template. Nothing is fitted or stored.
#[post("/kineticAssay/upload")]
pub async fn kinetic_upload(payload: Multipart) -> impl Responder {
    let result = async {
        let bytes = read_csv(payload).await?;
        KineticSheet::parse(&bytes)
    }
    .await;
    respond(result)
}

/// Fit the (possibly edited) grid and return the plots for review.
#[post("/kineticAssay/preview")]
pub async fn kinetic_preview(
    state: web::Data<AppState>,
    body: web::Json<PreviewRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let result = async {
        let sheet = KineticSheet::from_grid(request.grid)?;
        preview_kinetic(state.fitter.as_ref(), sheet, &request.variant).await
    }
    .await;
    respond(result)
}

#[post("/kineticAssay/save")]
pub async fn kinetic_save(
    state: web::Data<AppState>,
    body: web::Json<SaveRequest<KineticFit>>,
) -> impl Responder {
    let request = body.into_inner();
    let result: Result<FormOutcome, CureError> = async {
        let sheet = KineticSheet::from_grid(request.grid)?;
        let csv = sheet.rebuild().to_csv()?;
        let preview = KineticPreview {
            sheet,
            fit: request.fit,
            csv,
        };
        run_form(
            &state,
            request.id,
            request.version,
            &request.user_name,
            FormSubmission::KineticAssay(Box::new(preview)),
        )
        .await
    }
    .await;
    respond(result)
}

/// Reopen the stored spreadsheet of a kinetic raw data record.
#[get("/kineticAssay/sheet")]
pub async fn kinetic_sheet(state: web::Data<AppState>, query: web::Query<RawDataQuery>) -> impl Responder {
    let result = async {
        let raw = state.store.kinetic_raw_data(query.id).await?;
        load_kinetic_sheet(state.objects.as_ref(), &raw).await
    }
    .await;
    respond(result)
}

/// Parse an uploaded temperature template and clean it up for review.
#[post("/thermoAssay/upload")]
pub async fn thermo_upload(payload: Multipart) -> impl Responder {
    let result = async {
        let bytes = read_csv(payload).await?;
        let mut sheet = ThermalSheet::parse(&bytes)?;
        let warnings = sheet.sanitize();
        Ok::<_, CureError>(UploadedThermalSheet { sheet, warnings })
    }
    .await;
    respond(result)
}

#[post("/thermoAssay/preview")]
pub async fn thermo_preview(
    state: web::Data<AppState>,
    body: web::Json<PreviewRequest>,
) -> impl Responder {
    let request = body.into_inner();
    let result = async {
        let sheet = ThermalSheet::from_grid(request.grid)?;
        preview_thermal(state.fitter.as_ref(), sheet, &request.variant, request.sanitize).await
    }
    .await;
    respond(result)
}

#[post("/thermoAssay/save")]
pub async fn thermo_save(
    state: web::Data<AppState>,
    body: web::Json<SaveRequest<ThermalFit>>,
) -> impl Responder {
    let request = body.into_inner();
    let result: Result<FormOutcome, CureError> = async {
        let mut sheet = ThermalSheet::from_grid(request.grid)?;
        let warnings = if request.sanitize { sheet.sanitize() } else { vec![] };
        let csv = sheet.rebuild().to_csv()?;
        let preview = ThermalPreview {
            sheet,
            warnings,
            fit: request.fit,
            csv,
        };
        run_form(
            &state,
            request.id,
            request.version,
            &request.user_name,
            FormSubmission::ThermoAssay(Box::new(preview)),
        )
        .await
    }
    .await;
    respond(result)
}

#[get("/thermoAssay/sheet")]
pub async fn thermo_sheet(state: web::Data<AppState>, query: web::Query<RawDataQuery>) -> impl Responder {
    let result = async {
        let raw = state.store.temp_raw_data(query.id).await?;
        load_thermal_sheet(state.objects.as_ref(), &raw).await
    }
    .await;
    respond(result)
}

#[get("/getKineticRawDataEntryData")]
pub async fn kinetic_raw_data_by_parent(query: web::Query<ParentQuery>) -> impl Responder {
    respond(get_kinetic_raw_data_by_parent(query.parent_id).await)
}

#[get("/getKineticRawDataEntryDataFromWTid")]
pub async fn kinetic_raw_data(query: web::Query<RawDataQuery>) -> impl Responder {
    respond(raw_data::get_kinetic_raw_data(query.id).await)
}

#[get("/getTempRawDataEntryData")]
pub async fn temp_raw_data_by_parent(query: web::Query<ParentQuery>) -> impl Responder {
    respond(get_temp_raw_data_by_parent(query.parent_id).await)
}

#[get("/getTempRawDataEntryDataFromWTid")]
pub async fn temp_raw_data(query: web::Query<RawDataQuery>) -> impl Responder {
    respond(raw_data::get_temp_raw_data(query.id).await)
}

#[post("/updateKineticRawData")]
pub async fn save_kinetic_raw_data(body: web::Json<KineticRawRecord>) -> impl Responder {
    match raw_data::save_kinetic_raw_data(body.into_inner()).await {
        Ok(id) => HttpResponse::Ok().json(json!({ "kineticRawDataId": id })),
        Err(e) => error_response(e),
    }
}

#[post("/updateTempRawData")]
pub async fn save_temp_raw_data(body: web::Json<TempRawRecord>) -> impl Responder {
    match raw_data::save_temp_raw_data(body.into_inner()).await {
        Ok(id) => HttpResponse::Ok().json(json!({ "tempRawDataId": id })),
        Err(e) => error_response(e),
    }
}

/// Raw data of wild type entries at an institution, offered as references.
#[get("/wildTypeCandidates")]
pub async fn wild_type_candidates(query: web::Query<CandidateQuery>) -> impl Responder {
    respond(raw_data::wild_type_candidates(&query.institution, query.kind).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::multipart::tests::{body, content_type};
    use crate::router::{configure, test_support};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use d2d_database::setup_test_environment;
    use d2d_lib::core::curation::{create_entry, NewEntryInfo};
    use serial_test::serial;

    fn kinetic_csv() -> String {
        let mut lines = vec![
            "BglB kinetic assay,,,,,,,,,".to_string(),
            ",,,,(1/min),,(mg/mL),,,".to_string(),
            ",,,,,,,100,01/10/24,01/15/24".to_string(),
            "[S] (mM),,rep1,rep2,rep3".to_string(),
        ];
        let substrate = ["75.00", "25.00", "8.33", "2.78", "0.93", "0.31", "0.10", "0.03"];
        for (i, s) in substrate.iter().enumerate() {
            let v = 0.8 - i as f64 * 0.1;
            lines.push(format!("{},{},{:.2},{:.2},{:.2}", (b'A' + i as u8) as char, s, v, v, v));
        }
        lines.join("\n")
    }

    fn new_entry() -> NewEntryInfo {
        NewEntryInfo {
            creator: "jdoe".into(),
            institution: "UCDavis".into(),
            pi: "dr_pi".into(),
            resid: "A".into(),
            resnum: 123,
            resmut: "C".into(),
        }
    }

    #[actix_rt::test]
    #[serial]
    async fn upload_preview_and_save_a_kinetic_assay() {
        setup_test_environment().await;
        let entry = create_entry(new_entry()).await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure),
        )
        .await;

        let csv = kinetic_csv();
        let req = test::TestRequest::post()
            .uri("/api/kineticAssay/upload")
            .insert_header(content_type())
            .set_payload(body(&[], Some(("file", "assay.csv", "text/csv", csv.as_bytes()))))
            .to_request();
        let sheet: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(sheet["metadata"]["dilution"], 100.0);
        assert_eq!(sheet["replicates"].as_array().unwrap().len(), 8);

        let req = test::TestRequest::post()
            .uri("/api/kineticAssay/preview")
            .set_json(serde_json::json!({"variant": "A123C", "grid": sheet["grid"]}))
            .to_request();
        let preview: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(preview["fit"]["KM"], 5.2);

        let req = test::TestRequest::post()
            .uri("/api/kineticAssay/save")
            .set_json(serde_json::json!({
                "id": entry.id,
                "version": entry.version,
                "user_name": "jdoe",
                "grid": sheet["grid"],
                "fit": preview["fit"],
            }))
            .to_request();
        let outcome: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let raw_data_id = outcome["entry"]["raw_data_id"].as_i64().unwrap();
        assert!(raw_data_id > 0);
        assert_eq!(outcome["entry"]["KM_avg"], 5.2);

        let req = test::TestRequest::get()
            .uri(&format!("/api/getKineticRawDataEntryData?parent_id={}", entry.id))
            .to_request();
        let raw: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(raw["id"], raw_data_id);

        let req = test::TestRequest::get()
            .uri(&format!("/api/kineticAssay/sheet?id={}", raw_data_id))
            .to_request();
        let reopened: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reopened["replicates"], sheet["replicates"]);
    }

    fn thermal_csv() -> String {
        let mut lines = vec![
            "BglB thermostability,,,,,,,".to_string(),
            ",,,,(1/min),,,".to_string(),
            ",Row,,,,,01/10/24,01/15/24".to_string(),
            "T (C),,rep1,rep2,rep3".to_string(),
            "50,A,-0.5,1.0,1.0".to_string(),
        ];
        let temperatures = ["48.3", "45.7", "42.4", "37.7", "33.6", "31.3", "30.0"];
        for (i, t) in temperatures.iter().enumerate() {
            lines.push(format!("{},{},0.8,0.82,0.81", t, (b'B' + i as u8) as char));
        }
        lines.join("\n")
    }

    #[actix_rt::test]
    #[serial]
    async fn saved_thermal_assays_keep_the_cleaned_values() {
        setup_test_environment().await;
        let entry = create_entry(new_entry()).await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure),
        )
        .await;

        let csv = thermal_csv();
        let req = test::TestRequest::post()
            .uri("/api/thermoAssay/upload")
            .insert_header(content_type())
            .set_payload(body(&[], Some(("file", "thermo.csv", "text/csv", csv.as_bytes()))))
            .to_request();
        let uploaded: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(uploaded["warnings"].as_array().unwrap().len(), 2);
        assert_eq!(uploaded["sheet"]["replicates"][0], serde_json::json!(["", "1.0", "1.0"]));
        assert_eq!(uploaded["sheet"]["grid"]["rows"][4][2], "");

        let req = test::TestRequest::post()
            .uri("/api/thermoAssay/preview")
            .set_json(serde_json::json!({
                "variant": "A123C",
                "grid": uploaded["sheet"]["grid"],
                "sanitize": true,
            }))
            .to_request();
        let preview: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(preview["fit"]["T50"], 39.6);

        let req = test::TestRequest::post()
            .uri("/api/thermoAssay/save")
            .set_json(serde_json::json!({
                "id": entry.id,
                "version": entry.version,
                "user_name": "jdoe",
                "grid": preview["sheet"]["grid"],
                "fit": preview["fit"],
            }))
            .to_request();
        let outcome: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let temp_raw_data_id = outcome["entry"]["temp_raw_data_id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/thermoAssay/sheet?id={}", temp_raw_data_id))
            .to_request();
        let reopened: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reopened["replicates"][0], serde_json::json!(["", "1.0", "1.0"]));
        assert_eq!(reopened["replicates"], uploaded["sheet"]["replicates"]);
    }

    #[actix_rt::test]
    #[serial]
    async fn thermal_save_can_clean_a_raw_grid() {
        setup_test_environment().await;
        let entry = create_entry(new_entry()).await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure),
        )
        .await;
        let grid = AssayGrid::parse(thermal_csv().as_bytes()).unwrap();
        let req = test::TestRequest::post()
            .uri("/api/thermoAssay/save")
            .set_json(serde_json::json!({
                "id": entry.id,
                "version": entry.version,
                "user_name": "jdoe",
                "grid": grid,
                "fit": {"T50": 39.6, "T50_SD": 0.2, "k": -0.8, "k_SD": 0.05, "image": test_support::PNG_BASE64},
                "sanitize": true,
            }))
            .to_request();
        let outcome: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let temp_raw_data_id = outcome["entry"]["temp_raw_data_id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/thermoAssay/sheet?id={}", temp_raw_data_id))
            .to_request();
        let reopened: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(reopened["replicates"][0], serde_json::json!(["", "1.0", "1.0"]));
    }

    #[actix_rt::test]
    #[serial]
    async fn non_csv_uploads_are_refused() {
        setup_test_environment().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/thermoAssay/upload")
            .insert_header(content_type())
            .set_payload(body(&[], Some(("file", "assay.xlsx", "application/octet-stream", &b"PK"[..]))))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    #[serial]
    async fn raw_data_records_can_be_written_and_read() {
        setup_test_environment().await;
        let entry = create_entry(new_entry()).await.unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure),
        )
        .await;
        let record = serde_json::json!({
            "parent_id": entry.id,
            "user_name": "jdoe",
            "variant": "A123C",
            "slope_units": null,
            "purification_date": null,
            "assay_date": "01/15/24",
            "csv_filename": "jdoe-BglB-A123C-1.csv",
            "plot_filename": "jdoe-BglB-A123C-1.png",
            "T50": 39.6,
            "T50_SD": 0.2,
            "k": -0.8,
            "k_SD": 0.05
        });
        let req = test::TestRequest::post()
            .uri("/api/updateTempRawData")
            .set_json(record)
            .to_request();
        let saved: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = saved["tempRawDataId"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/getTempRawDataEntryDataFromWTid?id={}", id))
            .to_request();
        let raw: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(raw["parent_id"], entry.id);

        let req = test::TestRequest::get()
            .uri("/api/getTempRawDataEntryDataFromWTid?id=9999")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
