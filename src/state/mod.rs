//! Terraform state model
//!
//! The state written by `terraform import` is read into [`TerraformState`],
//! whose attribute values are [`StateValue`]s. The [`patcher`] swaps
//! captured literals for references before configuration is generated.

pub mod patcher;
pub mod state_file;
pub mod value;

pub use patcher::{PatchOutcome, StatePatcher};
pub use state_file::{STATE_FILE_NAME, StateInstance, StateResource, TerraformState};
pub use value::{REFERENCE_KEY, StateValue};
