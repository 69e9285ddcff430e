//! Contains logic for mapping between the nested resource tree and the flat path map.

pub mod flat_to_nested;
pub mod nested_to_flat;
