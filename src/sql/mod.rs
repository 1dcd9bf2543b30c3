//! Safe SQL generation: identifiers validated and quoted in one place, values as parameters.

pub mod builder;
pub mod ddl;
mod ident;
pub mod params;

pub use ident::*;
pub use params::*;
