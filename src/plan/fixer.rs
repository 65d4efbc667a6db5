use lazy_static::lazy_static;
use regex::Regex;

use super::diagnostic::{PlanError, PlanErrorKind};

lazy_static! {
    /// Leading bare word of a line, e.g. an unquoted map key
    static ref BARE_KEY: Regex =
        Regex::new(r#"^(\s*)([^"\s]\S*[^"\s])\s*"#).expect("bare key pattern is valid");
    static ref TTL_BLOCK: Regex = Regex::new(r"^\s*ttl\s+\{").expect("ttl pattern is valid");
    static ref BLOCK_END: Regex = Regex::new(r"^\s*\}\s*$").expect("block end pattern is valid");
}

/// A configuration file as editable lines
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLines {
    lines: Vec<String>,
}

impl ConfigLines {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    /// Line `number`, 1-based
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    fn set_line(&mut self, number: usize, text: String) {
        if let Some(line) = number.checked_sub(1).and_then(|i| self.lines.get_mut(i)) {
            *line = text;
        }
    }

    /// Remove lines `first..=last`, 1-based
    fn remove_lines(&mut self, first: usize, last: usize) -> bool {
        if first == 0 || first > last || last > self.lines.len() {
            return false;
        }
        self.lines.drain(first - 1..last);
        true
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Correct one plan error in place; returns whether anything changed
pub fn fix(lines: &mut ConfigLines, error: &PlanError) -> bool {
    match error.kind {
        PlanErrorKind::MissingAttributeSeparator => quote_bare_key(lines, error),
        PlanErrorKind::UnconfigurableAttribute | PlanErrorKind::InvalidOrUnknownKey => {
            remove_range(lines, error)
        }
        PlanErrorKind::MissingRequiredArgument => match error.resource_type() {
            Some("aws_dynamodb_table") => fix_dynamodb_table(lines, error),
            _ => false,
        },
        PlanErrorKind::Unrecognized => false,
    }
}

/// Map keys that are not identifiers must be quoted
fn quote_bare_key(lines: &mut ConfigLines, error: &PlanError) -> bool {
    let Some(number) = error.line() else {
        return false;
    };
    let Some(line) = lines.line(number) else {
        return false;
    };

    let Some(captures) = BARE_KEY.captures(line) else {
        return false;
    };
    let (Some(whole), Some(indent), Some(key)) = (captures.get(0), captures.get(1), captures.get(2))
    else {
        return false;
    };

    let fixed = format!(
        "{}\"{}\" {}",
        indent.as_str(),
        key.as_str(),
        &line[whole.end()..]
    );
    lines.set_line(number, fixed);
    true
}

/// Drop an attribute terraform refuses to accept
fn remove_range(lines: &mut ConfigLines, error: &PlanError) -> bool {
    match &error.diagnostic.range {
        Some(range) => lines.remove_lines(range.start.line, range.end.line),
        None => false,
    }
}

/// A `ttl` block cannot be written without `attribute_name`, even when
/// disabled, so an incomplete one is removed entirely
fn fix_dynamodb_table(lines: &mut ConfigLines, error: &PlanError) -> bool {
    let Some(snippet) = &error.diagnostic.snippet else {
        return false;
    };
    if !TTL_BLOCK.is_match(&snippet.code) {
        return false;
    }
    let Some(first) = error.line() else {
        return false;
    };

    let last = (first + 1..=lines.len()).find(|&number| {
        lines
            .line(number)
            .is_some_and(|line| BLOCK_END.is_match(line))
    });

    match last {
        Some(last) => lines.remove_lines(first, last),
        None => false,
    }
}
