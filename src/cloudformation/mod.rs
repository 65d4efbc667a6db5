//! CloudFormation input model
//!
//! A stack arrives as a [`snapshot::StackSnapshot`]; [`CloudFormationStack`]
//! joins its template with the live resources and builds the dependency
//! graph the importers and the reference resolver work from.

pub mod dependency_graph;
pub mod intrinsic;
pub mod resource;
pub mod snapshot;
pub mod template;

pub use dependency_graph::{DependencyEdge, DependencyGraph, DependencyKind};
pub use intrinsic::{Intrinsic, SubPart};
pub use resource::{CloudFormationResource, CloudFormationStack};
pub use snapshot::StackSnapshot;
pub use template::Template;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{MigrationError, MigrationResult};

lazy_static! {
    static ref STACK_ARN: Regex =
        Regex::new(r"^arn:[\w\-]+:cloudformation:[\w\-]+:\d+:stack/(?<stackName>[\w\-]+)(/.*)?$")
            .expect("stack ARN pattern is valid");
}

/// Stack name from a nested stack's physical id
///
/// Anything that does not look like an ARN is taken to be the name itself.
pub fn stack_name_from_arn(value: &str) -> MigrationResult<String> {
    if !value.starts_with("arn:") {
        return Ok(value.to_string());
    }

    STACK_ARN
        .captures(value)
        .and_then(|captures| captures.name("stackName"))
        .map(|name| name.as_str().to_string())
        .ok_or_else(|| MigrationError::InvalidArn(value.to_string()))
}
