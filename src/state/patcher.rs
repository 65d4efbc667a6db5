use std::collections::BTreeMap;

use serde_json::Value;

use super::value::StateValue;
use crate::cloudformation::CloudFormationResource;
use crate::cloudformation::intrinsic::find_intrinsics;
use crate::reference::Reference;
use crate::resolver::{IntrinsicEvaluator, IntrinsicResolver};
use crate::schema::ResourceSchema;

/// Attributes never rewritten into references
const SKIPPED_ATTRIBUTES: &[&str] = &["id", "tags_all"];

/// Result of patching one resource's attributes
#[derive(Debug, Default)]
pub struct PatchOutcome {
    pub patched: usize,
    pub warnings: Vec<String>,
}

/// Rewrites captured literals into references
///
/// Each intrinsic in the template resource is evaluated to the value it had
/// when deployed and resolved to an expression. Any state attribute holding
/// exactly that value is replaced by the expression.
pub struct StatePatcher<'a> {
    resolver: &'a IntrinsicResolver<'a>,
    evaluator: &'a IntrinsicEvaluator<'a>,
}

struct Candidate {
    literal: Value,
    reference: Reference,
}

impl<'a> StatePatcher<'a> {
    pub fn new(resolver: &'a IntrinsicResolver<'a>, evaluator: &'a IntrinsicEvaluator<'a>) -> Self {
        Self {
            resolver,
            evaluator,
        }
    }

    pub fn patch(
        &self,
        resource: &CloudFormationResource,
        schema: &ResourceSchema,
        attributes: &mut BTreeMap<String, StateValue>,
    ) -> PatchOutcome {
        let mut outcome = PatchOutcome::default();
        let mut candidates = Vec::new();

        for (path, node) in find_intrinsics(resource.properties()) {
            let reference = match self.resolver.resolve(node) {
                Ok(Some(reference)) => reference,
                Ok(None) => continue,
                Err(e) => {
                    outcome.warnings.push(format!(
                        "Resource \"{}\" ({}), property {}: {}",
                        resource.logical_id, resource.resource_type, path, e
                    ));
                    continue;
                }
            };

            match self.evaluator.evaluate(node) {
                Some(literal) if is_matchable(&literal) => candidates.push(Candidate {
                    literal,
                    reference,
                }),
                _ => {}
            }
        }

        if candidates.is_empty() {
            return outcome;
        }

        for (name, value) in attributes.iter_mut() {
            if SKIPPED_ATTRIBUTES.contains(&name.as_str()) {
                continue;
            }

            if schema
                .attribute(name)
                .is_some_and(|attribute| attribute.is_computed_only())
            {
                continue;
            }

            outcome.patched += replace(value, &candidates);
        }

        outcome
    }
}

fn is_matchable(literal: &Value) -> bool {
    match literal {
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
        Value::Array(items) => !items.is_empty() && items.iter().all(is_matchable),
        _ => false,
    }
}

fn replace(value: &mut StateValue, candidates: &[Candidate]) -> usize {
    let matched = match &*value {
        StateValue::String(_) | StateValue::Number(_) => {
            let text = value.scalar_text();
            candidates.iter().find(|c| {
                crate::resolver::evaluator::scalar_text(&c.literal).is_some_and(|l| Some(l) == text)
            })
        }
        StateValue::List(_) => {
            let literal = value.to_literal();
            candidates
                .iter()
                .find(|c| c.literal.is_array() && Some(&c.literal) == literal.as_ref())
        }
        _ => None,
    };

    if let Some(candidate) = matched {
        *value = StateValue::Reference(candidate.reference.clone());
        return 1;
    }

    match value {
        StateValue::List(items) => items.iter_mut().map(|item| replace(item, candidates)).sum(),
        StateValue::Map(map) => map.values_mut().map(|item| replace(item, candidates)).sum(),
        _ => 0,
    }
}
