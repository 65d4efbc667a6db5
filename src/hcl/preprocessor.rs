use std::collections::BTreeSet;

use super::event::HclEvent;
use super::queue::EventQueue;
use crate::error::MigrationError;
use crate::schema::{AttributePath, ResourceTraits};
use crate::state::StateValue;

/// Strips attributes that must not, or need not, appear in configuration
///
/// Only keys in a configurable position are candidates for removal: resource
/// attributes and attributes of nested blocks. Map entries, fields of
/// attribute-mode objects and embedded JSON keys are values, not settings.
pub struct Preprocessor<'s> {
    queue: EventQueue<'s>,
    address: String,
    traits: &'static ResourceTraits,
    warnings: Vec<String>,
}

impl<'s> Preprocessor<'s> {
    pub fn new(queue: EventQueue<'s>, address: &str, traits: &'static ResourceTraits) -> Self {
        Self {
            queue,
            address: address.to_string(),
            traits,
            warnings: Vec::new(),
        }
    }

    pub fn queue(&self) -> &EventQueue<'s> {
        &self.queue
    }

    pub fn into_queue(self) -> EventQueue<'s> {
        self.queue
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Run every rule and return the warnings raised
    pub fn process(&mut self) -> Vec<String> {
        self.apply_default_values();
        self.remove_empty_optional_attributes();
        self.remove_computed_attributes();
        self.resolve_conflicts();
        self.check_exactly_one_of();

        self.warnings.clone()
    }

    fn is_configurable(&self, index: usize) -> bool {
        let Some(key) = self.queue.key_at(index) else {
            return false;
        };
        if key.embedded {
            return false;
        }

        match self.queue.parent_key(index) {
            None => true,
            Some(parent) => self
                .queue
                .key_at(parent)
                .is_some_and(|parent| parent.schema.is_block()),
        }
    }

    fn is_removable(&self, index: usize) -> bool {
        self.is_configurable(index)
            && self.queue.key_at(index).is_some_and(|key| {
                key.schema.optional && !key.schema.required && !self.traits.should_emit(&key.path)
            })
            && self.queue.is_empty_value(index)
    }

    fn consume(&mut self, index: usize) -> Option<AttributePath> {
        let path = self.queue.key_at(index)?.path.clone();
        self.queue.consume_key(index);
        Some(path)
    }

    /// Fill unset attributes that have a default for this resource type
    ///
    /// Only null and empty string values are replaced.
    pub fn apply_default_values(&mut self) -> Vec<AttributePath> {
        let mut applied = Vec::new();

        for index in self.queue.key_indices() {
            let Some(key) = self.queue.key_at(index) else {
                continue;
            };
            if key.embedded {
                continue;
            }
            let Some(default) = self.traits.default_value(&key.path) else {
                continue;
            };
            let unset = matches!(
                self.queue.events().get(index + 1),
                Some(HclEvent::ScalarValue(StateValue::Null))
            ) || matches!(
                self.queue.events().get(index + 1),
                Some(HclEvent::ScalarValue(StateValue::String(s))) if s.is_empty()
            );

            let path = key.path.clone();
            if unset && self.queue.replace_scalar(index, default) {
                applied.push(path);
            }
        }

        applied
    }

    /// Drop read-only attributes and `tags_all`
    pub fn remove_computed_attributes(&mut self) -> Vec<AttributePath> {
        let mut removed = Vec::new();
        let mut index = 0;

        while index < self.queue.len() {
            let remove = match self.queue.key_at(index) {
                Some(key) if !key.embedded => {
                    key.schema.is_computed_only()
                        || (key.name == "tags_all" && self.queue.parent_key(index).is_none())
                }
                _ => false,
            };

            if remove {
                removed.extend(self.consume(index));
            } else {
                index += 1;
            }
        }

        removed
    }

    /// Drop optional attributes without a meaningful value
    ///
    /// Innermost keys go first, so a block whose contents are all removed
    /// becomes empty and is removed on a later pass.
    pub fn remove_empty_optional_attributes(&mut self) -> Vec<AttributePath> {
        let mut removed = Vec::new();

        loop {
            let candidate = self
                .queue
                .key_indices()
                .into_iter()
                .rev()
                .find(|&index| self.is_removable(index));

            match candidate {
                Some(index) => removed.extend(self.consume(index)),
                None => break,
            }
        }

        removed
    }

    /// Settle mutually exclusive attributes
    ///
    /// An empty side is removed. When both sides hold values the resource's
    /// declared preference wins; without one both are kept and a warning is
    /// raised once per pair.
    pub fn resolve_conflicts(&mut self) -> Vec<AttributePath> {
        let mut removed = Vec::new();
        let mut reported: BTreeSet<(String, String)> = BTreeSet::new();

        'restart: loop {
            for index in self.queue.key_indices() {
                let conflicts = self.queue.conflicting_attributes(index);
                if conflicts.is_empty() {
                    continue;
                }

                if self.is_removable(index) {
                    removed.extend(self.consume(index));
                    continue 'restart;
                }

                if let Some(&other) = conflicts.iter().find(|&&other| self.is_removable(other)) {
                    removed.extend(self.consume(other));
                    continue 'restart;
                }

                let Some(path) = self.queue.key_at(index).map(|key| key.path.clone()) else {
                    continue;
                };

                for other in conflicts {
                    let Some(other_path) = self.queue.key_at(other).map(|key| key.path.clone()) else {
                        continue;
                    };

                    if let Some(preferred) = self.traits.preferred(path.as_str(), other_path.as_str()) {
                        let loser = if preferred == path.as_str() { other } else { index };
                        if self.is_configurable(loser) {
                            removed.extend(self.consume(loser));
                            continue 'restart;
                        }
                    }

                    let pair = if path.as_str() <= other_path.as_str() {
                        (path.to_string(), other_path.to_string())
                    } else {
                        (other_path.to_string(), path.to_string())
                    };

                    if reported.insert(pair.clone()) {
                        self.warnings.push(
                            MigrationError::Conflict {
                                resource: self.address.clone(),
                                attributes: vec![pair.0, pair.1],
                            }
                            .to_string(),
                        );
                    }
                }
            }

            break;
        }

        removed
    }

    /// Warn about `ExactlyOneOf` groups that do not have exactly one value
    pub fn check_exactly_one_of(&mut self) {
        let mut checked: BTreeSet<Vec<String>> = BTreeSet::new();

        for index in self.queue.key_indices() {
            let Some(key) = self.queue.key_at(index) else {
                continue;
            };
            if key.embedded || key.schema.exactly_one_of.is_empty() {
                continue;
            }

            let mut group = key.schema.exactly_one_of.clone();
            group.sort();
            if !checked.insert(group.clone()) {
                continue;
            }

            let set = group
                .iter()
                .filter_map(|name| self.queue.find_key_by_path(name))
                .filter(|&member| !self.queue.is_empty_value(member))
                .count();

            if set != 1 {
                self.warnings.push(format!(
                    "{}: exactly one of {} must be set, found {}",
                    self.address,
                    group.join(", "),
                    set
                ));
            }
        }
    }
}
