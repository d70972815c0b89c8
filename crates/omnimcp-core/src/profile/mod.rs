//! Introspection-driven server profiling
//!
//! Everything here is a pure function over [`ToolDescriptor`]s: classify each
//! tool, guess the server's domain, scan for data sources and schema hints,
//! and fold it all into a [`ServerProfile`].

mod descriptor;
mod rules;
mod category;
mod domain;
mod profiler;

pub use descriptor::ToolDescriptor;
pub use rules::{KeywordRule, first_match};
pub use category::{ToolCategory, CATEGORY_RULES, classify_tool};
pub use domain::{Domain, DOMAIN_RULES, detect_domain};
pub use profiler::{
    build_profile, Capabilities, ServerConfiguration, ServerProfile, PROFILE_SIGNATURES,
};
