pub mod config;
pub mod fields;
pub mod record;

pub use config::*;
pub use fields::*;
pub use record::*;
