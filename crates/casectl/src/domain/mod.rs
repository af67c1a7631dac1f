pub mod collab;
pub mod errors;
pub mod model;
