pub mod fit_service;
