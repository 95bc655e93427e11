use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use d2d_lib::core::curation::{
    self, delete_entries, submit_for_curation, submitted_entries, update_comment, update_teammates,
    CuratorRole, Teammates,
};
use d2d_lib::core::entry::PatchRequest;
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub id: i32,
    pub version: Option<i32>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub id: i32,
    pub version: Option<i32>,
    pub comments: Option<String>,
}

#[derive(Deserialize)]
pub struct PiQuery {
    pub pi: Option<String>,
}

#[derive(Deserialize)]
pub struct CurateRequest {
    pub ids: Vec<i32>,
    pub status: CuratorRole,
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<i32>,
}

#[post("/updateCharacterizationDataSubmitted")]
pub async fn submit(state: web::Data<AppState>, body: web::Json<SubmitRequest>) -> impl Responder {
    match submit_for_curation(&state.store, body.id, body.version).await {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => error_response(e),
    }
}

#[post("/updateCharacterizationDataTeammates")]
pub async fn teammates(
    state: web::Data<AppState>,
    body: web::Json<PatchRequest<Teammates>>,
) -> impl Responder {
    let request = body.into_inner();
    match update_teammates(&state.store, request.id, request.version, request.fields).await {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => error_response(e),
    }
}

#[post("/updateCharacterizationDataComment")]
pub async fn comment(state: web::Data<AppState>, body: web::Json<CommentRequest>) -> impl Responder {
    let request = body.into_inner();
    match update_comment(&state.store, request.id, request.version, request.comments).await {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => error_response(e),
    }
}

/// Entries waiting on a curator, narrowed to one PI when `pi` is given.
#[get("/curateData")]
pub async fn submitted(query: web::Query<PiQuery>) -> impl Responder {
    match submitted_entries(query.into_inner().pi).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => error_response(e),
    }
}

#[put("/curateData")]
pub async fn curate(body: web::Json<CurateRequest>) -> impl Responder {
    match curation::curate(&body.ids, body.status).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "updated": updated })),
        Err(e) => error_response(e),
    }
}

#[delete("/curateData")]
pub async fn delete(body: web::Json<DeleteRequest>) -> impl Responder {
    match delete_entries(&body.ids).await {
        Ok(deleted) => HttpResponse::Ok().json(json!({ "deleted": deleted })),
        Err(e) => error_response(e),
    }
}
