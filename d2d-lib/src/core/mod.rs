pub mod assay;
pub mod checklist;
pub mod curation;
pub mod entry;
pub mod forms;
pub mod gel;
pub mod raw_data;
pub mod upload;
pub mod workflow;
