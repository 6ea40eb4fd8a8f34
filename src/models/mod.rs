pub mod market;
pub mod analysis;
pub mod delivery;

pub use market::*;
pub use analysis::*;
pub use delivery::*;
