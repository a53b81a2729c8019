// Re-export all model types
pub use self::errors::*;
pub use self::pet::*;
pub use self::upload::*;
pub use self::validation::*;

mod errors;
mod pet;
mod upload;
mod validation;
