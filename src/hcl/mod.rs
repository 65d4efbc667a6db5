//! HCL generation
//!
//! A resource's imported state is walked against its schema into a flat
//! event stream ([`builder`]), cleaned up by the [`preprocessor`] and
//! written out by the [`emitter`]. Everything that is not a resource block
//! lives in [`declarations`].

pub mod builder;
pub mod declarations;
pub mod emitter;
pub mod event;
pub mod preprocessor;
pub mod queue;
pub mod syntax;

pub use builder::build_events;
pub use declarations::{InputVariable, ModuleDeclaration};
pub use emitter::emit_resource;
pub use event::{HclEvent, MappingKey};
pub use preprocessor::Preprocessor;
pub use queue::EventQueue;

use std::collections::BTreeMap;

use crate::error::MigrationResult;
use crate::schema::AwsSchema;
use crate::state::StateValue;

/// A rendered resource block and everything noticed while producing it
#[derive(Debug, Clone, Default)]
pub struct RenderedResource {
    pub hcl: String,
    pub warnings: Vec<String>,
}

/// Build, clean up and render one resource
pub fn render_resource(
    schema: &AwsSchema,
    resource_type: &str,
    name: &str,
    attributes: &BTreeMap<String, StateValue>,
) -> MigrationResult<RenderedResource> {
    let resource_schema = schema.resource_schema(resource_type)?;
    let traits = schema.traits(resource_type);

    let (events, mut warnings) = build_events(resource_type, name, attributes, resource_schema);
    let mut preprocessor = Preprocessor::new(
        EventQueue::new(events),
        &format!("{}.{}", resource_type, name),
        traits,
    );
    warnings.extend(preprocessor.process());

    Ok(RenderedResource {
        hcl: emit_resource(preprocessor.queue(), traits),
        warnings,
    })
}
