//! Domain values with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod ids;
pub mod text;
pub mod validation;

pub use ids::CategoryIds;
pub use text::{natural_key, Text, MAX_BODY_LEN, MAX_NAME_LEN, MAX_TITLE_LEN};
pub use validation::ValidationError;
