pub mod characterization_data;
pub mod kinetic_raw_data;
pub mod temp_raw_data;
