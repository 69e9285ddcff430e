//! Dialect implementations
//!
//! Each dialect converts between its native tree and the IR. The OAS adapter also uses the
//! RAML reader and writer for the fragments it carries under `x-raml-` keys.

pub mod oas;
pub mod raml;

pub use oas::{Oas20, Oas30};
pub use raml::{Raml08, Raml10};
