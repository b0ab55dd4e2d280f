pub mod joke;
pub mod rating;
pub mod vote;

pub use joke::*;
pub use rating::*;
pub use vote::*;
