use actix_web::{get, web, HttpResponse, Responder};
use d2d_lib::error::CureError;

pub mod assay;
pub mod curation;
pub mod entry;
pub mod gel;
pub mod multipart;
pub mod objects;

/// Return server health status
#[get("/health")]
pub async fn health() -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().body("OK"))
}

/// Turn a failed operation into its status code with the message as body.
pub fn error_response(e: CureError) -> HttpResponse {
    if e.status_code().is_server_error() {
        log::error!("{}", e);
    } else {
        log::warn!("{}", e);
    }
    HttpResponse::build(e.status_code()).body(e)
}

/// Every route of the service, shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(objects::download).service(
        web::scope("/api")
            .service(entry::get_entry)
            .service(entry::checklist)
            .service(entry::create)
            .service(entry::rosetta_score)
            .service(entry::protein_modeled)
            .service(entry::oligo_ordered)
            .service(entry::plasmid)
            .service(entry::upload_sequencing_file)
            .service(entry::expressed)
            .service(entry::yield_avg)
            .service(entry::kinetic_constants)
            .service(entry::wild_type_kinetic)
            .service(entry::thermal_constants)
            .service(entry::wild_type_thermo)
            .service(entry::melting_point)
            .service(entry::melting_point_form)
            .service(entry::gel_filename)
            .service(assay::kinetic_upload)
            .service(assay::kinetic_preview)
            .service(assay::kinetic_save)
            .service(assay::kinetic_sheet)
            .service(assay::thermo_upload)
            .service(assay::thermo_preview)
            .service(assay::thermo_save)
            .service(assay::thermo_sheet)
            .service(assay::kinetic_raw_data_by_parent)
            .service(assay::kinetic_raw_data)
            .service(assay::temp_raw_data_by_parent)
            .service(assay::temp_raw_data)
            .service(assay::save_kinetic_raw_data)
            .service(assay::save_temp_raw_data)
            .service(assay::wild_type_candidates)
            .service(gel::gel_images)
            .service(gel::upload_gel_image)
            .service(curation::submit)
            .service(curation::teammates)
            .service(curation::comment)
            .service(curation::submitted)
            .service(curation::curate)
            .service(curation::delete)
            .service(objects::signed_url),
    );
}


#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn health_returns_ok() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "OK");
    }

    #[::core::prelude::v1::test]
    fn client_errors_keep_their_status() {
        let response = error_response(CureError::Conflict { expected: 1, actual: 2 });
        assert_eq!(response.status(), actix_web::http::StatusCode::CONFLICT);
        let response = error_response(CureError::Persistence("db down".into()));
        assert_eq!(response.status(), actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
