pub mod errors;
pub mod progress;

pub use errors::*;
pub use progress::*;
