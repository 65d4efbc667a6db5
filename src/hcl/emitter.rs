use super::event::HclEvent;
use super::queue::EventQueue;
use super::syntax::{json_value, object_key, pad, quote};
use crate::schema::ResourceTraits;
use crate::state::StateValue;

/// Render one resource's event stream as a `resource` block
pub fn emit_resource(queue: &EventQueue<'_>, traits: &ResourceTraits) -> String {
    let emitter = Emitter { queue, traits };
    let events = queue.events();

    let Some(HclEvent::ResourceStart { resource_type, name }) = events.first() else {
        return String::new();
    };

    let mut hcl = format!("resource {} {} {{\n", quote(resource_type), quote(name));
    let end = queue.subtree_end(0).saturating_sub(1);
    emitter.body(&mut hcl, 1, end, 1, true);
    hcl.push_str("}\n");
    hcl
}

struct Emitter<'q, 's> {
    queue: &'q EventQueue<'s>,
    traits: &'q ResourceTraits,
}

impl Emitter<'_, '_> {
    fn event(&self, index: usize) -> Option<&HclEvent<'_>> {
        self.queue.events().get(index)
    }

    /// Keys and values between `start` and `end`, one attribute or block each
    fn body(&self, hcl: &mut String, start: usize, end: usize, indent: usize, top_level: bool) {
        let mut index = start;

        while index < end {
            let Some(key) = self.queue.key_at(index) else {
                index += 1;
                continue;
            };

            let value_end = self.queue.value_end(index);
            let block = !key.embedded
                && (key.schema.is_block() || (top_level && self.traits.renders_as_block(&key.name)));

            if block {
                self.block(hcl, &key.name, index + 1, indent);
            } else {
                hcl.push_str(&format!(
                    "{}{} = {}\n",
                    pad(indent),
                    object_key(&key.name),
                    self.expression(index + 1, indent)
                ));
            }

            index = value_end;
        }
    }

    fn block(&self, hcl: &mut String, name: &str, start: usize, indent: usize) {
        match self.event(start) {
            Some(HclEvent::SequenceStart) => {
                let end = self.queue.subtree_end(start) - 1;
                let mut element = start + 1;

                while element < end {
                    let element_end = self.queue.subtree_end(element);
                    match self.event(element) {
                        Some(HclEvent::MappingStart) => {
                            self.block_body(hcl, name, element, element_end, indent);
                        }
                        _ => hcl.push_str(&format!(
                            "{}{} = {}\n",
                            pad(indent),
                            name,
                            self.expression(element, indent)
                        )),
                    }
                    element = element_end;
                }
            }
            Some(HclEvent::MappingStart) => {
                let end = self.queue.subtree_end(start);
                self.block_body(hcl, name, start, end, indent);
            }
            _ => hcl.push_str(&format!(
                "{}{} = {}\n",
                pad(indent),
                name,
                self.expression(start, indent)
            )),
        }
    }

    fn block_body(&self, hcl: &mut String, name: &str, start: usize, end: usize, indent: usize) {
        hcl.push_str(&format!("{}{} {{\n", pad(indent), name));
        self.body(hcl, start + 1, end - 1, indent + 1, false);
        hcl.push_str(&format!("{}}}\n", pad(indent)));
    }

    /// The value subtree starting at `start` as an HCL expression
    fn expression(&self, start: usize, indent: usize) -> String {
        match self.event(start) {
            Some(HclEvent::ScalarValue(value)) => scalar(value, indent),
            Some(HclEvent::SequenceStart) => {
                let end = self.queue.subtree_end(start) - 1;
                let mut items = Vec::new();
                let mut index = start + 1;

                while index < end {
                    items.push(self.expression(index, indent + 1));
                    index = self.queue.subtree_end(index);
                }

                list(items, indent)
            }
            Some(HclEvent::MappingStart) => {
                let end = self.queue.subtree_end(start) - 1;
                let mut entries = Vec::new();
                let mut index = start + 1;

                while index < end {
                    match self.queue.key_at(index) {
                        Some(key) => {
                            entries.push(format!(
                                "{}{} = {}",
                                pad(indent + 1),
                                object_key(&key.name),
                                self.expression(index + 1, indent + 1)
                            ));
                            index = self.queue.value_end(index);
                        }
                        None => index += 1,
                    }
                }

                if entries.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{\n{}\n{}}}", entries.join("\n"), pad(indent))
                }
            }
            Some(HclEvent::JsonStart) => format!("jsonencode({})", self.expression(start + 1, indent)),
            _ => "null".to_string(),
        }
    }
}

fn scalar(value: &StateValue, indent: usize) -> String {
    match value {
        StateValue::Reference(reference) => reference.expression(),
        StateValue::List(items) => list(items.iter().map(|item| scalar(item, indent + 1)).collect(), indent),
        StateValue::Map(map) if map.is_empty() => "{}".to_string(),
        StateValue::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    format!("{}{} = {}", pad(indent + 1), object_key(key), scalar(item, indent + 1))
                })
                .collect();
            format!("{{\n{}\n{}}}", entries.join("\n"), pad(indent))
        }
        other => other
            .to_literal()
            .map(|literal| json_value(&literal, indent))
            .unwrap_or_else(|| "null".to_string()),
    }
}

/// Short scalar lists stay on one line
fn list(items: Vec<String>, indent: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }

    if items.iter().all(|item| !item.contains('\n')) {
        return format!("[{}]", items.join(", "));
    }

    let mut text = "[\n".to_string();
    for item in items {
        text.push_str(&format!("{}{},\n", pad(indent + 1), item));
    }
    text.push_str(&format!("{}]", pad(indent)));
    text
}
