pub mod error;

pub use error::{CartgrabError, Result};
