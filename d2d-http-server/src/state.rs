use d2d_lib::config::Settings;
use d2d_lib::core::entry::DatabaseEntryStore;
use d2d_lib::core::forms::FormContext;
use d2d_lib::error::CureError;
use d2d_lib::external_services::fit_service::{CurveFitter, FitServiceClient};
use d2d_lib::external_services::object_store::{LocalFsStore, ObjectStore};

/// Shared by every handler through `web::Data`.
pub struct AppState {
    pub store: DatabaseEntryStore,
    pub objects: Box<dyn ObjectStore>,
    pub fitter: Box<dyn CurveFitter>,
    pub settings: Settings,
}

impl AppState {
    pub fn from_settings(settings: Settings) -> Result<Self, CureError> {
        let fitter = FitServiceClient::new(&settings)?;
        Ok(AppState {
            store: DatabaseEntryStore,
            objects: Box::new(LocalFsStore::from_settings(&settings)),
            fitter: Box::new(fitter),
            settings,
        })
    }

    pub fn form_context(&self) -> FormContext<'_> {
        FormContext {
            store: &self.store,
            objects: self.objects.as_ref(),
            fitter: self.fitter.as_ref(),
            settings: &self.settings,
        }
    }
}
