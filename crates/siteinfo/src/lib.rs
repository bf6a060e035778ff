//! SITEINFO: the per-site definition format and everything needed to get a
//! merged, validated list of definitions in front of the matcher.

pub mod errors;
pub mod loader;
pub mod merge;
pub mod model;
pub mod store;
pub mod validate;

pub use errors::{SiteInfoError, ValidationError};
pub use loader::{load_file, parse_str, parse_value, SourceFormat};
pub use merge::{merge_files, merge_sources, MergeReport, SourceFailure, SourceLoad};
pub use model::{CommandDef, ElementQuery, SiteDefinition, LOCAL_SOURCE};
pub use store::{DefinitionSnapshot, DefinitionStore, InMemoryDefinitionStore};
pub use validate::validate_siteinfo;
