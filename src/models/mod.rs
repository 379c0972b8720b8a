// Re-export all model types
pub use self::drink::*;
pub use self::errors::*;
pub use self::responses::*;
pub use self::session::*;
pub use self::validation::*;

mod drink;
mod errors;
mod responses;
mod session;
mod validation;
