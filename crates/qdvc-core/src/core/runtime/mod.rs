pub(crate) mod effects;
pub(crate) mod workers;

mod execute;

pub use execute::*;
