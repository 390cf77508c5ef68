//! Client validation descriptors.
//!
//! A declarative mapping resource registers which rule ids the client
//! understands, per value kind. The mapper turns a field's declared rules into
//! [`ValidationDef`](crate::model::ValidationDef)s with resolved messages.

pub mod mapper;
pub mod registry;
pub mod template;

pub use mapper::ValidationRuleMapper;
pub use registry::{
    ConstraintSpec, RuleMapping, RuleSpec, ValidationConfigDetails, ValidationRegistry,
    DEFAULT_RULES,
};
pub use template::MessageFormatter;
