use std::collections::BTreeSet;

use super::event::{HclEvent, MappingKey};
use crate::schema::AttributePath;
use crate::state::StateValue;

/// The event stream of one resource with subtree-aware editing
#[derive(Debug, Clone, Default)]
pub struct EventQueue<'s> {
    events: Vec<HclEvent<'s>>,
}

impl<'s> EventQueue<'s> {
    pub fn new(events: Vec<HclEvent<'s>>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[HclEvent<'s>] {
        &self.events
    }

    pub fn into_events(self) -> Vec<HclEvent<'s>> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn key_at(&self, index: usize) -> Option<&MappingKey<'s>> {
        self.events.get(index).and_then(HclEvent::as_key)
    }

    /// Index of the first key with this path
    pub fn find(&self, path: &AttributePath) -> Option<usize> {
        self.events
            .iter()
            .position(|event| event.as_key().is_some_and(|key| &key.path == path))
    }

    pub fn find_key_by_path(&self, path: &str) -> Option<usize> {
        self.find(&AttributePath::new(path))
    }

    /// Indices of all keys, in document order
    pub fn key_indices(&self) -> Vec<usize> {
        self.events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.as_key().is_some())
            .map(|(i, _)| i)
            .collect()
    }

    /// Surviving keys, in document order
    pub fn keys(&self) -> Vec<&MappingKey<'s>> {
        self.events.iter().filter_map(HclEvent::as_key).collect()
    }

    /// Exclusive end of the value following the key at `index`
    pub fn value_end(&self, index: usize) -> usize {
        self.subtree_end(index + 1)
    }

    /// Exclusive end of the event subtree starting at `start`
    pub fn subtree_end(&self, start: usize) -> usize {
        let Some(first) = self.events.get(start) else {
            return start;
        };

        if !first.is_start() {
            return start + 1;
        }

        let mut depth = 0usize;
        for (offset, event) in self.events[start..].iter().enumerate() {
            if event.is_start() {
                depth += 1;
            } else if event.is_end() {
                depth -= 1;
                if depth == 0 {
                    return start + offset + 1;
                }
            }
        }

        self.events.len()
    }

    /// Remove a key and its whole value, returning the number of events removed
    pub fn consume_key(&mut self, index: usize) -> usize {
        if self.key_at(index).is_none() {
            return 0;
        }

        let end = self.value_end(index);
        self.events.drain(index..end).count()
    }

    /// Replace the scalar value of the key at `index`
    ///
    /// Returns `false`, leaving the queue untouched, when the value is a
    /// collection or a JSON document.
    pub fn replace_scalar(&mut self, index: usize, value: StateValue) -> bool {
        if self.key_at(index).is_none() {
            return false;
        }

        match self.events.get_mut(index + 1) {
            Some(HclEvent::ScalarValue(current)) => {
                *current = value;
                true
            }
            _ => false,
        }
    }

    /// Index of the key whose value encloses the key at `index`
    ///
    /// `None` for top-level attributes.
    pub fn parent_key(&self, index: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut inside = false;

        for i in (0..index).rev() {
            let event = &self.events[i];

            if event.is_end() {
                depth += 1;
            } else if event.is_start() {
                if matches!(event, HclEvent::ResourceStart { .. }) {
                    return None;
                }
                if depth == 0 {
                    inside = true;
                } else {
                    depth -= 1;
                }
            } else if inside && depth == 0 && event.as_key().is_some() {
                return Some(i);
            }
        }

        None
    }

    /// Keys enclosing the key at `index`, nearest first
    pub fn ancestor_keys(&self, index: usize) -> Vec<usize> {
        let mut ancestors = Vec::new();
        let mut current = index;

        while let Some(parent) = self.parent_key(current) {
            ancestors.push(parent);
            current = parent;
        }

        ancestors
    }

    /// Whether the value of the key at `index` carries no information
    ///
    /// Empty values are null, the empty string, `false` for a boolean
    /// without a schema default, and collections holding only empty values.
    /// Numbers, references and embedded JSON documents are never empty.
    pub fn is_empty_value(&self, index: usize) -> bool {
        let Some(key) = self.key_at(index) else {
            return false;
        };

        self.value_is_empty(index + 1, key.schema.has_default())
    }

    fn value_is_empty(&self, start: usize, has_default: bool) -> bool {
        let Some(event) = self.events.get(start) else {
            return false;
        };

        match event {
            HclEvent::ScalarValue(value) => match value {
                StateValue::Null => true,
                StateValue::String(s) => s.is_empty(),
                StateValue::Bool(b) => !b && !has_default,
                StateValue::List(items) => items.is_empty(),
                StateValue::Map(map) => map.is_empty(),
                StateValue::Number(_) | StateValue::Reference(_) => false,
            },
            HclEvent::SequenceStart | HclEvent::MappingStart => {
                let end = self.subtree_end(start) - 1;
                let mut i = start + 1;

                while i < end {
                    match &self.events[i] {
                        HclEvent::MappingKey(key) => {
                            if !self.value_is_empty(i + 1, key.schema.has_default()) {
                                return false;
                            }
                            i = self.value_end(i);
                        }
                        _ => {
                            if !self.value_is_empty(i, false) {
                                return false;
                            }
                            i = self.subtree_end(i);
                        }
                    }
                }

                true
            }
            _ => false,
        }
    }

    /// Keys mutually exclusive with the key at `index`
    ///
    /// A `ConflictsWith` declared on a block applies to everything inside it
    /// and a declared path covers everything below it. The relation is
    /// symmetric: `b` conflicts with `a` whenever `a` conflicts with `b`.
    pub fn conflicting_attributes(&self, index: usize) -> Vec<usize> {
        let Some(key) = self.key_at(index) else {
            return Vec::new();
        };
        if key.embedded {
            return Vec::new();
        }

        let declared = self.declared_conflicts(index);

        self.key_indices()
            .into_iter()
            .filter(|&other| other != index)
            .filter(|&other| {
                let Some(other_key) = self.key_at(other) else {
                    return false;
                };
                if other_key.embedded || other_key.path.overlaps(&key.path) {
                    return false;
                }

                declared.iter().any(|path| path.overlaps(&other_key.path))
                    || self
                        .declared_conflicts(other)
                        .iter()
                        .any(|path| path.overlaps(&key.path))
            })
            .collect()
    }

    fn declared_conflicts(&self, index: usize) -> Vec<AttributePath> {
        let names: BTreeSet<&str> = std::iter::once(index)
            .chain(self.ancestor_keys(index))
            .filter_map(|i| self.key_at(i))
            .flat_map(|key| key.schema.conflicts_with.iter().map(String::as_str))
            .collect();

        names.into_iter().map(AttributePath::new).collect()
    }

    /// Every start matched by the right end and every key followed by a value
    pub fn is_well_nested(&self) -> bool {
        let mut open: Vec<&HclEvent<'s>> = Vec::new();
        let mut expect_value = false;

        for event in &self.events {
            if expect_value && !(event.is_start() || matches!(event, HclEvent::ScalarValue(_))) {
                return false;
            }
            expect_value = false;

            if event.is_start() {
                open.push(event);
            } else if event.is_end() {
                match open.pop() {
                    Some(start) if start.closed_by(event) => {}
                    _ => return false,
                }
            } else if event.as_key().is_some() {
                expect_value = true;
            }
        }

        open.is_empty() && !expect_value
    }
}
