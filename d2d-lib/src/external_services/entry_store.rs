use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::Settings;
use crate::core::entry::{Entry, EntryPatch, EntryStore};
use crate::core::raw_data::{KineticRawData, KineticRawRecord, TempRawData, TempRawRecord};
use crate::error::CureError;

#[derive(Deserialize)]
struct KineticRawDataSaved {
    #[serde(rename = "kineticRawDataId")]
    kinetic_raw_data_id: i32,
}

#[derive(Deserialize)]
struct TempRawDataSaved {
    #[serde(rename = "tempRawDataId")]
    temp_raw_data_id: i32,
}

/// Entry store reached over the server's REST endpoints.
pub struct EntryStoreClient {
    base_url: String,
    client: reqwest::Client,
}

impl EntryStoreClient {
    pub fn new(base_url: &str, settings: &Settings) -> Result<Self, CureError> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| CureError::Fetch(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, i32)]) -> Result<T, CureError> {
        let url = self.url(endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| CureError::Fetch(format!("{} unreachable: {}", url, e)))?;
        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| CureError::Fetch(format!("unexpected response from {}: {}", url, e))),
            StatusCode::NOT_FOUND => Err(CureError::NotFound(
                response.text().await.unwrap_or_default(),
            )),
            status => Err(CureError::Fetch(format!(
                "{} returned {}: {}",
                url,
                status,
                response.text().await.unwrap_or_default()
            ))),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, Rejection> {
        let url = self.url(endpoint);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Rejection::Failed(CureError::Persistence(format!("{} unreachable: {}", url, e))))?;
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                Rejection::Failed(CureError::Persistence(format!(
                    "unexpected response from {}: {}",
                    url, e
                )))
            });
        }
        let message = response.text().await.unwrap_or_default();
        Err(Rejection::Status(status, message))
    }
}

/// A write the server answered with a non-2xx status, or that never got an answer.
enum Rejection {
    Status(StatusCode, String),
    Failed(CureError),
}

impl From<Rejection> for CureError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Failed(e) => e,
            Rejection::Status(StatusCode::BAD_REQUEST, message) => CureError::Validation(message),
            Rejection::Status(StatusCode::NOT_FOUND, message) => CureError::NotFound(message),
            Rejection::Status(status, message) => {
                CureError::Persistence(format!("server returned {}: {}", status, message))
            }
        }
    }
}

#[async_trait]
impl EntryStore for EntryStoreClient {
    async fn get(&self, id: i32) -> Result<Entry, CureError> {
        self.fetch("getCharacterizationDataEntryFromID", &[("id", id)]).await
    }

    async fn apply_patch(
        &self,
        id: i32,
        expected_version: Option<i32>,
        patch: EntryPatch,
    ) -> Result<Entry, CureError> {
        patch.validate()?;
        let body = patch
            .request_body(id, expected_version)
            .map_err(|e| CureError::Validation(e.to_string()))?;
        match self.send::<Entry>(patch.endpoint(), &body).await {
            Ok(entry) => Ok(entry),
            Err(Rejection::Status(StatusCode::CONFLICT, _)) => {
                let now = self.get(id).await?;
                Err(CureError::Conflict {
                    expected: expected_version.unwrap_or(now.version),
                    actual: now.version,
                })
            }
            Err(Rejection::Status(StatusCode::LOCKED, _)) => Err(CureError::CuratedLocked(id)),
            Err(rejection) => Err(rejection.into()),
        }
    }

    async fn save_kinetic_raw_data(&self, record: KineticRawRecord) -> Result<i32, CureError> {
        let body = serde_json::to_value(&record).map_err(|e| CureError::Validation(e.to_string()))?;
        let saved: KineticRawDataSaved = self.send("updateKineticRawData", &body).await?;
        Ok(saved.kinetic_raw_data_id)
    }

    async fn save_temp_raw_data(&self, record: TempRawRecord) -> Result<i32, CureError> {
        let body = serde_json::to_value(&record).map_err(|e| CureError::Validation(e.to_string()))?;
        let saved: TempRawDataSaved = self.send("updateTempRawData", &body).await?;
        Ok(saved.temp_raw_data_id)
    }

    async fn kinetic_raw_data(&self, id: i32) -> Result<KineticRawData, CureError> {
        self.fetch("getKineticRawDataEntryDataFromWTid", &[("id", id)]).await
    }

    async fn temp_raw_data(&self, id: i32) -> Result<TempRawData, CureError> {
        self.fetch("getTempRawDataEntryDataFromWTid", &[("id", id)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checklist::tests::blank_entry;
    use crate::core::entry::{OligoOrdered, PatchRequest};
    use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct IdQuery {
        id: i32,
    }

    #[get("/api/getCharacterizationDataEntryFromID")]
    async fn get_entry(query: web::Query<IdQuery>) -> impl Responder {
        if query.id == 42 {
            HttpResponse::Ok().json(Entry { version: 5, ..blank_entry() })
        } else {
            HttpResponse::NotFound().body("Entry not found")
        }
    }

    #[post("/api/updateCharacterizationDataOligoOrdered")]
    async fn oligo(body: web::Json<PatchRequest<OligoOrdered>>) -> impl Responder {
        if body.version != Some(5) {
            return HttpResponse::Conflict().body("ConflictError");
        }
        let mut entry = blank_entry();
        entry.oligo_ordered = body.fields.oligo_ordered;
        entry.version = 6;
        HttpResponse::Ok().json(entry)
    }

    #[actix_rt::test]
    async fn client_talks_to_the_rest_endpoints() {
        let server = HttpServer::new(|| App::new().service(get_entry).service(oligo))
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        let running = server.run();
        let server_handle = running.handle();
        actix_rt::spawn(running);

        let client = EntryStoreClient::new(&format!("http://{}", addr), &Settings::default()).unwrap();

        let entry = client.get(42).await.unwrap();
        assert_eq!(entry.version, 5);
        assert!(matches!(client.get(7).await, Err(CureError::NotFound(_))));

        let patch = EntryPatch::OligoOrdered(OligoOrdered { oligo_ordered: true });
        let updated = client.apply_patch(42, Some(5), patch.clone()).await.unwrap();
        assert!(updated.oligo_ordered);

        let stale = client.apply_patch(42, Some(4), patch).await;
        assert_eq!(stale, Err(CureError::Conflict { expected: 4, actual: 5 }));

        server_handle.stop(false).await;
    }
}
