//! C#-shaped AST for sharpsugar.
//!
//! One tree type serves both grammars. Extension syntax shows up as data on
//! ordinary nodes rather than as separate node kinds:
//! - Capitalized primary parameters (property shorthand)
//! - Loose statements at the top of a class body (unnamed initializer)
//! - `singleton` on a declaration
//! - `[ThrowArgumentNullException]` / `name!!` on a parameter (null assertion)
//!
//! A tree is *baseline* when none of that data is present; see
//! [`Declaration::is_baseline`].

mod decl;
mod diag;
mod feature;
mod stmt;
mod types;

pub use decl::*;
pub use diag::*;
pub use feature::*;
pub use stmt::*;
pub use types::*;

pub use swc_common::{BytePos, Span, DUMMY_SP};

use serde::{Deserialize, Serialize};

/// Feature flags controlling which sharpsugar extensions are recognized.
///
/// A disabled extension is left alone by the recognizer, so its syntax reaches
/// the emitter untouched (and is rejected there if it is not baseline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsSyntax {
    pub property_shorthand: bool,
    pub unnamed_initializer: bool,
    pub singleton: bool,
    pub null_assertion: bool,
}

impl Default for SsSyntax {
    fn default() -> Self {
        Self {
            property_shorthand: true,
            unnamed_initializer: true,
            singleton: true,
            null_assertion: true,
        }
    }
}

impl SsSyntax {
    /// Every extension switched off.
    pub fn baseline() -> Self {
        Self {
            property_shorthand: false,
            unnamed_initializer: false,
            singleton: false,
            null_assertion: false,
        }
    }

    pub fn allows(&self, feature: Feature) -> bool {
        match feature {
            Feature::PropertyShorthand => self.property_shorthand,
            Feature::UnnamedInitializer => self.unnamed_initializer,
            Feature::SingletonMarker => self.singleton,
            Feature::NullAssertion => self.null_assertion,
            // Parameter lists are structural: they are always desugared.
            Feature::PrimaryConstructor => true,
        }
    }
}
