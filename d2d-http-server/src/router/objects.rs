use actix_web::{get, web, HttpResponse, Responder};
use d2d_lib::external_services::object_store::{LinkError, SIGNED_URL_TTL};
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

fn content_type_of(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "csv" => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Short lived download link for a stored object.
#[get("/signedUrl")]
pub async fn signed_url(state: web::Data<AppState>, query: web::Query<KeyQuery>) -> impl Responder {
    match state.objects.signed_url(&query.key, SIGNED_URL_TTL) {
        Ok(url) => HttpResponse::Ok().json(json!({ "url": url })),
        Err(e) => error_response(e),
    }
}

/// Serves the links handed out by `signed_url` until they expire.
#[get("/objects/{bucket}/{key:.*}")]
pub async fn download(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<TokenQuery>,
) -> impl Responder {
    let (bucket, key) = path.into_inner();
    let Some(token) = query.token.as_deref() else {
        return HttpResponse::Forbidden().body("This link is not signed");
    };
    match state.objects.verify_link(&bucket, &key, token) {
        Ok(()) => {}
        Err(LinkError::Expired) => return HttpResponse::Forbidden().body("This link has expired"),
        Err(LinkError::Invalid) => {
            log::warn!("Refused a download of {}/{} with a bad signature", bucket, key);
            return HttpResponse::Forbidden().body("This link is not valid");
        }
    }
    match state.objects.get(&key).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type(content_type_of(&key))
            .body(bytes),
        Err(e) => error_response(e),
    }
}
