//! This crate provides the core translation logic between the two policy representations:
//! - XACML-style XML policies consumed by the policy evaluation engine
//! - The simplified editor JSON schema used by the policy authoring UI
//!
//! Both directions walk the same typed grammar ([`PolicyDocument`]), so a well-formed
//! document survives `decode(encode(..))` and `encode(decode(..))` unchanged.

mod api;
mod editor;
mod error;
pub mod model;
mod xml;

// Re-exports for a small, focused public API
pub use api::{
    decode, decode_with, editor_to_policy, encode, encode_with, policy_to_editor, read_source,
    TranslateOptions, write_destination,
};
pub use error::{Format, Result, Stage, TranslationError};
pub use model::{AttributeMatch, Condition, ConditionChildren, Policy, PolicyDocument, PolicySet, Rule};
