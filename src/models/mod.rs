// Re-export all model types
pub use self::errors::*;
pub use self::pet::*;
pub use self::validation::*;

mod errors;
mod pet;
mod validation;
