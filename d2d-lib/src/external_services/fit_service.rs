use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::error::CureError;
use crate::models::fit_service::{KineticFit, ThermalFit};

/// Curve fitting of assay spreadsheets.
#[async_trait]
pub trait CurveFitter: Send + Sync {
    async fn fit_kinetic(&self, csv: Vec<u8>, variant: &str) -> Result<KineticFit, CureError>;

    async fn fit_thermal(&self, csv: Vec<u8>, variant: &str) -> Result<ThermalFit, CureError>;
}

pub struct FitServiceClient {
    base_url: String,
    client: reqwest::Client,
}

impl FitServiceClient {
    pub fn new(settings: &Settings) -> Result<Self, CureError> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .map_err(|e| CureError::FitService(e.to_string()))?;
        Ok(Self {
            base_url: settings.fit_service_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post_csv<T: DeserializeOwned>(
        &self,
        path: &str,
        csv: Vec<u8>,
        variant: &str,
    ) -> Result<T, CureError> {
        let url = format!("{}/{}", self.base_url, path);
        let file = Part::bytes(csv)
            .file_name(format!("{}.csv", variant))
            .mime_str("text/csv")
            .map_err(|e| CureError::FitService(e.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("variant-name", variant.to_string());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CureError::FitService(format!("{} unreachable: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CureError::FitService(format!("{} returned {}: {}", url, status, body)));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CureError::FitService(format!("unexpected response from {}: {}", url, e)))
    }
}

#[async_trait]
impl CurveFitter for FitServiceClient {
    async fn fit_kinetic(&self, csv: Vec<u8>, variant: &str) -> Result<KineticFit, CureError> {
        log::info!("Fitting kinetic assay for {}", variant);
        self.post_csv("plot_kinetic", csv, variant).await
    }

    async fn fit_thermal(&self, csv: Vec<u8>, variant: &str) -> Result<ThermalFit, CureError> {
        log::info!("Fitting thermostability assay for {}", variant);
        self.post_csv("plot_temperature", csv, variant).await
    }
}
