//! Dialect identifiers shared by the engine
//!
//!     The engine itself never parses a dialect, but several components need to know which
//!     dialect they are speaking to: the type normalizer picks a native grammar, the annotation
//!     codec picks a key convention. Adapters live in the `apiconv-dialects` crate and carry one
//!     of these identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two dialect families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Resource/trait oriented (nested resource tree, reusable fragments).
    Raml,
    /// Path/schema oriented (flat path map, global catalogs).
    Oas,
}

/// A concrete dialect version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Raml08,
    Raml10,
    Oas20,
    Oas30,
}

impl DialectKind {
    pub const ALL: [DialectKind; 4] = [
        DialectKind::Raml08,
        DialectKind::Raml10,
        DialectKind::Oas20,
        DialectKind::Oas30,
    ];

    pub fn family(self) -> Family {
        match self {
            DialectKind::Raml08 | DialectKind::Raml10 => Family::Raml,
            DialectKind::Oas20 | DialectKind::Oas30 => Family::Oas,
        }
    }

    /// Registry name, also used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Raml08 => "raml08",
            DialectKind::Raml10 => "raml10",
            DialectKind::Oas20 => "oas20",
            DialectKind::Oas30 => "oas30",
        }
    }

    pub fn is_raml(self) -> bool {
        self.family() == Family::Raml
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace(['.', '-', '_', ' '], "");
        match normalized.as_str() {
            "raml08" => Ok(DialectKind::Raml08),
            "raml10" | "raml" => Ok(DialectKind::Raml10),
            "oas20" | "swagger" | "swagger20" => Ok(DialectKind::Oas20),
            "oas30" | "openapi" | "openapi30" => Ok(DialectKind::Oas30),
            _ => Err(format!("unknown dialect '{s}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loose_names() {
        assert_eq!("RAML 1.0".parse::<DialectKind>(), Ok(DialectKind::Raml10));
        assert_eq!("OAS-2.0".parse::<DialectKind>(), Ok(DialectKind::Oas20));
        assert_eq!("swagger".parse::<DialectKind>(), Ok(DialectKind::Oas20));
        assert!("wsdl".parse::<DialectKind>().is_err());
    }

    #[test]
    fn families() {
        assert_eq!(DialectKind::Raml08.family(), Family::Raml);
        assert_eq!(DialectKind::Oas30.family(), Family::Oas);
        assert_eq!(DialectKind::Oas30.to_string(), "oas30");
    }
}
