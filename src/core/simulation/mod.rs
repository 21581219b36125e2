pub mod equal_air_temp;
pub mod lumped_model;
pub mod vdi_core;
