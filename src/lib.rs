//! Resolve the effective lint rule set for a file from a base rule set,
//! plugin rule sets, ordered path-scoped overrides and an ignore list.
//!
//! Configuration is assembled once with [`assemble`] into an immutable
//! [`CompiledConfig`], which can then be queried from any number of threads.

pub mod cache;
pub mod cli;
pub mod compile;
pub mod config;
pub mod diagnostics;
pub mod glob;
pub mod ignore_list;
pub mod rules;
pub mod scan;

pub use cache::MemoizedConfig;
pub use compile::{assemble, Assembled, AssemblyInput, CompiledConfig, Resolution};
pub use config::{EffectiveConfig, RuleSetting, Severity};
pub use diagnostics::{AssemblyError, Warning};
pub use glob::{GlobError, GlobSelector};
pub use ignore_list::IgnoreList;
pub use rules::{LayerSpec, OverrideLayer, PatchEntry, RuleCatalog, RuleSource};
