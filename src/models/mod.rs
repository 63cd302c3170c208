pub mod market;
pub mod open_interest;
pub mod report;
pub mod status;

pub use market::*;
pub use open_interest::*;
pub use report::*;
pub use status::*;
