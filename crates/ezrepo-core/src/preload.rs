//! # Preload Path Resolver
//!
//! Discovers the nested collection relations of a model and turns a model's
//! declared preload requirements into an ordered list of steps.
//!
//! ## Discovery Walk
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Parent { Children: Vec<Box<ChldT1>> }                                  │
//! │     │                                                                   │
//! │     ├── "Children"                          ← emitted first (depth 0)   │
//! │     │      │                                                            │
//! │     │      ▼  recurse into ChldT1 (depth 1)                             │
//! │     │   ChldT1 { ChildrenT2: Vec<ChldT2> }                              │
//! │     │      ├── "Children.ChildrenT2"                                    │
//! │     │      │      │                                                     │
//! │     │      │      ▼  recurse into ChldT2 (depth 2)                      │
//! │     │      │   ChldT2 { ChildrenT3: Vec<Box<ChldT3>> }                  │
//! │     │      │      └── "Children.ChildrenT2.ChildrenT3"                  │
//! │     │      │             │                                              │
//! │     │      │             ▼  ChldT3 { Foo: String, NoPreloads (opt-out) }│
//! │     │      │                nothing further                             │
//! │                                                                         │
//! │  Result: ["Children", "Children.ChildrenT2",                            │
//! │           "Children.ChildrenT2.ChildrenT3"]                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parents always precede their children in the output, because preloading
//! a nested path requires its parent relation to be loaded already.
//!
//! ## Recursion Ceiling
//! A model whose collections lead back to itself has no finite path list.
//! Once the walk is deeper than [`MAX_RECURSION`] it panics: the model
//! definition is broken and a truncated list would silently under-load data.

use tracing::trace;

use crate::introspect::exported_fields;
use crate::schema::{Describe, TypeDesc};
use crate::MAX_RECURSION;

// =============================================================================
// Auto Preloads
// =============================================================================

/// Returns every preload path of `T` in depth-first, declaration order.
///
/// ## Panics
/// When the model's collection graph is deeper than [`MAX_RECURSION`].
///
/// ## Example
/// ```rust
/// use ezrepo_core::{auto_preloads, describe_record};
///
/// pub struct Post { pub images: Vec<Image>, pub videos: Vec<Video> }
/// pub struct Image { pub title: String }
/// pub struct Video { pub title: String }
///
/// describe_record! { Post { pub images: Vec<Image>, pub videos: Vec<Video> } }
/// describe_record! { Image { pub title: String } }
/// describe_record! { Video { pub title: String } }
///
/// assert_eq!(auto_preloads::<Post>(), vec!["images", "videos"]);
/// ```
pub fn auto_preloads<T: Describe + ?Sized>() -> Vec<String> {
    auto_preloads_for(&T::type_desc())
}

/// [`auto_preloads`] for the type of a value.
pub fn auto_preloads_of_val<T: Describe + ?Sized>(_model: &T) -> Vec<String> {
    auto_preloads::<T>()
}

/// [`auto_preloads`] for a descriptor built at runtime.
pub fn auto_preloads_for(ty: &TypeDesc) -> Vec<String> {
    collect_paths(ty, "", 0)
}

fn collect_paths(ty: &TypeDesc, prefix: &str, depth: u32) -> Vec<String> {
    if depth > MAX_RECURSION {
        panic!(
            "max recursion threshold of {} exceeded. Infinitely recursive preloads are not supported.",
            MAX_RECURSION
        );
    }

    let mut out = Vec::new();
    for field in exported_fields(ty) {
        if !field.ty.is_collection() {
            continue;
        }

        let path = format!("{}{}", prefix, field.name);
        trace!(path = %path, depth, kind = field.ty.kind_name(), "Discovered preload path");

        let nested = collect_paths(&field.ty, &format!("{}.", path), depth + 1);
        out.push(path);
        out.extend(nested);
    }
    out
}

// =============================================================================
// Preload Plan
// =============================================================================

/// How a model wants its relations preloaded.
///
/// `F` is the modifier type of the database layer (e.g. a function that adds
/// ordering to the relation query).
#[derive(Debug, Clone, PartialEq)]
pub enum PreloadSpec<F> {
    /// Discover paths with [`auto_preloads`].
    Auto,
    /// Exactly one relation, optionally modified.
    Single(String, Option<F>),
    /// Several relations. `modifiers` is either empty or has one entry per
    /// path; `None` entries mean "no modifier" for that path.
    Multi(Vec<String>, Vec<Option<F>>),
}

impl<F> Default for PreloadSpec<F> {
    fn default() -> Self {
        PreloadSpec::Auto
    }
}

/// One preload to apply, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadStep<F> {
    pub path: String,
    pub modifier: Option<F>,
}

impl<F> PreloadStep<F> {
    pub fn new(path: impl Into<String>) -> Self {
        PreloadStep {
            path: path.into(),
            modifier: None,
        }
    }

    /// Path segments, e.g. `["posts", "images"]` for `posts.images`.
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('.').collect()
    }
}

impl<F> PreloadSpec<F> {
    /// Expands the declaration into ordered steps. `auto` is only called for
    /// [`PreloadSpec::Auto`].
    ///
    /// ## Panics
    /// When a multi-preload declares a non-empty modifier list whose length
    /// differs from the path list. The declaration is constant per model, so
    /// every read of that model would be wrong.
    pub fn resolve(self, model: &str, auto: impl FnOnce() -> Vec<String>) -> Vec<PreloadStep<F>> {
        match self {
            PreloadSpec::Auto => auto().into_iter().map(PreloadStep::new).collect(),
            PreloadSpec::Single(path, modifier) => vec![PreloadStep { path, modifier }],
            PreloadSpec::Multi(paths, modifiers) if modifiers.is_empty() => {
                paths.into_iter().map(PreloadStep::new).collect()
            }
            PreloadSpec::Multi(paths, modifiers) => {
                if paths.len() != modifiers.len() {
                    panic!(
                        "LOGIC ERROR: model {} declares multi-preload but does not define consistent \
                         preload definition, length of modifiers must be either 0 or equal to length \
                         of preloaded relations, instead got len(relations) = {}, len(modifiers) = {}. \
                         A modifier is always allowed to be None for selective usage",
                        model,
                        paths.len(),
                        modifiers.len()
                    );
                }
                paths
                    .into_iter()
                    .zip(modifiers)
                    .map(|(path, modifier)| PreloadStep { path, modifier })
                    .collect()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
