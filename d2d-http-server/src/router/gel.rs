use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::NaiveDate;
use d2d_lib::core::forms::gel::GelChoice;
use d2d_lib::core::forms::FormSubmission;
use d2d_lib::core::gel::list_gel_images;
use d2d_lib::core::upload::MAX_GEL_BYTES;
use d2d_lib::error::CureError;
use serde::Deserialize;

use super::entry::run_form;
use super::error_response;
use super::multipart::read_form;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct InstitutionQuery {
    pub institution: String,
}

#[get("/gelImages")]
pub async fn gel_images(state: web::Data<AppState>, query: web::Query<InstitutionQuery>) -> impl Responder {
    match list_gel_images(state.objects.as_ref(), &query.institution).await {
        Ok(images) => HttpResponse::Ok().json(images),
        Err(e) => error_response(e),
    }
}

/// Multipart fields: `id`, optional `version`, `user_name`, `date` (YYYY-MM-DD) and the image `file`.
#[post("/uploadGelImage")]
pub async fn upload_gel_image(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let result = async {
        let mut form = read_form(payload, MAX_GEL_BYTES + 1).await?;
        let file = form.take_file("file")?;
        let date = NaiveDate::parse_from_str(form.text("date")?, "%Y-%m-%d")
            .map_err(|_| CureError::Validation("date must look like YYYY-MM-DD".into()))?;
        let version = form.optional_text("version").map(|_| form.number("version")).transpose()?;
        run_form(
            &state,
            form.number("id")?,
            version,
            form.text("user_name")?,
            FormSubmission::Gel(GelChoice::Upload { file, date }),
        )
        .await
    }
    .await;
    match result {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => error_response(e),
    }
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

    #[actix_rt::test]
    #[serial]
    async fn uploaded_gels_are_listed_for_the_institution() {
        setup_test_environment().await;
        let entry = create_entry(NewEntryInfo {
            creator: "jdoe".into(),
            institution: "UCDavis".into(),
            pi: "dr_pi".into(),
            resid: "A".into(),
            resnum: 123,
            resmut: "C".into(),
        })
        .await
        .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state()))
                .configure(configure),
        )
        .await;

        let id = entry.id.to_string();
        let req = test::TestRequest::post()
            .uri("/api/uploadGelImage")
            .insert_header(content_type())
            .set_payload(body(
                &[("id", id.as_str()), ("user_name", "jdoe"), ("date", "01/15/2024")],
                Some(("file", "gel.png", "image/png", &b"\x89PNG"[..])),
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/uploadGelImage")
            .insert_header(content_type())
            .set_payload(body(
                &[("id", id.as_str()), ("user_name", "jdoe"), ("date", "2024-01-15")],
                Some(("file", "gel.png", "image/png", &b"\x89PNG"[..])),
            ))
            .to_request();
        let outcome: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(outcome["entry"]["gel_filename"], "UCDavis-A123C-jdoe-01-15-24.png");

        let req = test::TestRequest::get()
            .uri("/api/gelImages?institution=UCDavis")
            .to_request();
        let images: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let images = images.as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["name"]["user_name"], "jdoe");
    }
}
