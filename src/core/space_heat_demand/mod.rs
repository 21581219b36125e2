pub mod building;
pub mod building_element;
pub mod parallel_connection;
pub mod surface_conductance;
pub mod weight_factors;
pub mod zone;
