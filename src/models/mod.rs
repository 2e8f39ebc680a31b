pub mod analysis;
pub mod feedback;
pub mod prompt;
pub mod verdict;

pub use analysis::*;
pub use feedback::*;
pub use prompt::*;
pub use verdict::*;

use thiserror::Error;

/// A string that is not a member of a closed enum.
#[derive(Debug, Error)]
#[error("Invalid {field} value: {value}")]
pub struct InvalidEnumValue {
    pub field: &'static str,
    pub value: String,
}
