pub mod entry_store;
pub mod fit_service;
pub mod object_store;
