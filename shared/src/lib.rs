pub mod error;
pub mod models;
pub mod validation;
pub mod device;

pub use error::ErrorResponse;
pub use models::*;
pub use validation::*;
pub use device::*;
