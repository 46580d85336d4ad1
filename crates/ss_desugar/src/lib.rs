//! Desugaring engine that rewrites sharpsugar declarations into baseline C#.
//!
//! Three steps per declaration:
//! - [`recognize`]: which extension features are used, and where
//! - [`rules`]: one rule per feature fills its slots of a [`plan::Plan`]
//! - [`plan::Plan::assemble`]: builds the new declaration in canonical order
//!
//! The input tree is never modified. Failures are isolated per declaration.

pub mod desugar;
pub mod error;
pub mod options;
pub mod plan;
pub mod recognize;
pub mod rules;

pub use desugar::{
    desugar_declaration, desugar_unit, DeclOutcome, DeclReport, Desugared, Rewritten,
};
pub use error::TransformError;
pub use options::{DesugarOptions, NullGuardStyle};
pub use recognize::{recognize, Recognition};
