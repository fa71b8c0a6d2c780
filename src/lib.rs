pub mod config;
pub use config::*;

pub mod domain;
pub use domain::*;

pub mod store;
pub use store::*;

pub mod reconcile;
pub use reconcile::*;

pub mod report;
pub use report::*;
