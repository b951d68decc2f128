pub mod catalog;
pub mod layer;

pub use catalog::{RuleCatalog, RuleSource};
pub use layer::{LayerSpec, OverrideLayer, PatchEntry};
