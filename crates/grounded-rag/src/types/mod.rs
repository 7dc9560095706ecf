//! Core data types

pub mod fragment;
pub mod query;
pub mod response;

pub use fragment::*;
pub use query::*;
pub use response::*;
