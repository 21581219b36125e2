pub mod material_properties;
pub mod simulation;
pub mod space_heat_demand;
pub mod units;
