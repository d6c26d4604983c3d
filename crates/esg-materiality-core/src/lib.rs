pub mod aggregate;
pub mod assessment;
pub mod color;
pub mod rating;
pub mod scoring;
pub mod topic;

pub use aggregate::*;
pub use assessment::*;
pub use color::*;
pub use rating::*;
pub use scoring::*;
pub use topic::*;
