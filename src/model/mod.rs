//! Model declarations and the definitions derived from them.

pub mod builder;
pub mod declaration;
pub mod registry;
pub mod types;
pub mod value_type;
pub mod yaml_loader;

pub use builder::{FieldDefinitionBuilder, ModelDefinitionBuilder};
pub use declaration::{
    ExtendableMarker, FieldDecl, LovDecl, LovKind, Model, ModelDecl, ModelMarker, ModelSpec,
    ValidationDecl,
};
pub use registry::ModelRegistry;
pub use types::{FieldDef, FieldType, LovDetails, LovOption, LovType, ModelDef, ValidationDef};
pub use value_type::{Primitive, RawType, ValueType};
pub use yaml_loader::{load_model, load_models, parse_model, validate_model};
