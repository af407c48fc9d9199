mod engine;
mod spill;
pub mod types;

pub use engine::MatteEngine;
pub use spill::SpillSuppression;
