use serde::Deserialize;

/// One line of `terraform plan -json` output
#[derive(Debug, Clone, Deserialize)]
struct PlanMessage {
    #[serde(rename = "@level")]
    level: String,
    #[serde(default)]
    diagnostic: Option<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Diagnostic {
    pub summary: String,
    /// Resource address, when terraform attributes the error to one
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub range: Option<Range>,
    #[serde(default)]
    pub snippet: Option<Snippet>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Range {
    /// Relative to the directory terraform ran in
    pub filename: String,
    pub start: Location,
    pub end: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    /// 1-based
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snippet {
    /// Header of the enclosing block, e.g. `resource "aws_s3_bucket" "Logs"`
    #[serde(default)]
    pub context: Option<String>,
    pub code: String,
}

/// The plan errors cfn2tf knows how to correct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanErrorKind {
    MissingAttributeSeparator,
    UnconfigurableAttribute,
    InvalidOrUnknownKey,
    MissingRequiredArgument,
    Unrecognized,
}

impl PlanErrorKind {
    fn from_summary(summary: &str) -> Self {
        match summary {
            "Missing attribute separator" => PlanErrorKind::MissingAttributeSeparator,
            "Value for unconfigurable attribute" => PlanErrorKind::UnconfigurableAttribute,
            "Invalid or unknown key" => PlanErrorKind::InvalidOrUnknownKey,
            "Missing required argument" => PlanErrorKind::MissingRequiredArgument,
            _ => PlanErrorKind::Unrecognized,
        }
    }
}

/// An error-level diagnostic from `terraform plan`
#[derive(Debug, Clone, PartialEq)]
pub struct PlanError {
    pub kind: PlanErrorKind,
    pub diagnostic: Diagnostic,
}

impl PlanError {
    /// First line of the offending range, 1-based
    pub fn line(&self) -> Option<usize> {
        self.diagnostic.range.as_ref().map(|range| range.start.line)
    }

    pub fn filename(&self) -> Option<&str> {
        self.diagnostic.range.as_ref().map(|range| range.filename.as_str())
    }

    /// Resource type named by the snippet's block header
    pub fn resource_type(&self) -> Option<&str> {
        let context = self.diagnostic.snippet.as_ref()?.context.as_deref()?;
        let rest = context.trim_start().strip_prefix("resource")?.trim_start();
        let rest = rest.strip_prefix('"')?;
        rest.split('"').next().filter(|t| !t.is_empty())
    }

    /// Identifies the error across plan runs
    pub fn fingerprint(&self) -> String {
        let snippet = self.diagnostic.snippet.as_ref();
        format!(
            "{}|{}|{}|{}",
            self.filename().unwrap_or_default(),
            self.line().unwrap_or_default(),
            self.diagnostic.summary,
            snippet.map(|s| s.code.as_str()).unwrap_or_default()
        )
    }

    /// One-line description for the export report
    pub fn describe(&self) -> String {
        let mut text = self.diagnostic.summary.clone();
        if let Some(address) = &self.diagnostic.address {
            text = format!("{} ({})", text, address);
        }
        if let (Some(file), Some(line)) = (self.filename(), self.line()) {
            text = format!("{} at {}:{}", text, file, line);
        }
        text
    }
}

/// Error diagnostics of a `terraform plan -json` run
///
/// Each line of output is one JSON object; anything else is ignored. Errors
/// come back bottom-up within each file so that lines can be edited without
/// shifting the errors still to be handled.
pub fn parse_plan_errors(lines: &[String]) -> Vec<PlanError> {
    let mut errors: Vec<PlanError> = lines
        .iter()
        .filter(|line| line.trim_start().starts_with('{'))
        .filter_map(|line| serde_json::from_str::<PlanMessage>(line).ok())
        .filter(|message| message.level == "error")
        .filter_map(|message| message.diagnostic)
        .map(|diagnostic| PlanError {
            kind: PlanErrorKind::from_summary(&diagnostic.summary),
            diagnostic,
        })
        .collect();

    errors.sort_by(|a, b| {
        a.filename()
            .cmp(&b.filename())
            .then_with(|| b.line().cmp(&a.line()))
    });
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_TTL_ATTRIBUTE: &str = r#"{"@level":"error","@message":"Error: Missing required argument","@module":"terraform.ui","diagnostic":{"severity":"error","summary":"Missing required argument","detail":"The argument \"attribute_name\" is required, but no definition was found.","range":{"filename":"main.tf","start":{"line":14,"column":7,"byte":310},"end":{"line":14,"column":7,"byte":310}},"snippet":{"context":"resource \"aws_dynamodb_table\" \"Orders\"","code":"  ttl {","start_line":14,"highlight_start_offset":6,"highlight_end_offset":6,"values":[]}},"type":"diagnostic"}"#;

    const UNCONFIGURABLE: &str = r#"{"@level":"error","@message":"Error: Value for unconfigurable attribute","diagnostic":{"severity":"error","summary":"Value for unconfigurable attribute","detail":"Can't configure a value for \"owner_id\": its value will be decided automatically based on the result of applying this configuration.","address":"aws_security_group.Web","range":{"filename":"main.tf","start":{"line":30,"column":3,"byte":700},"end":{"line":30,"column":28,"byte":725}},"snippet":{"context":"resource \"aws_security_group\" \"Web\"","code":"  owner_id = \"123456789012\"","start_line":30,"highlight_start_offset":2,"highlight_end_offset":27,"values":[]}},"type":"diagnostic"}"#;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_parse_errors_bottom_up() {
        let errors = parse_plan_errors(&lines(&[
            r#"{"@level":"info","@message":"Terraform 1.6.0","type":"version"}"#,
            MISSING_TTL_ATTRIBUTE,
            "not json at all",
            UNCONFIGURABLE,
        ]));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, PlanErrorKind::UnconfigurableAttribute);
        assert_eq!(errors[0].line(), Some(30));
        assert_eq!(errors[1].kind, PlanErrorKind::MissingRequiredArgument);
        assert_eq!(errors[1].resource_type(), Some("aws_dynamodb_table"));
    }

    #[test]
    fn test_describe_names_address_and_location() {
        let errors = parse_plan_errors(&lines(&[UNCONFIGURABLE]));

        assert_eq!(
            errors[0].describe(),
            "Value for unconfigurable attribute (aws_security_group.Web) at main.tf:30"
        );
    }

    #[test]
    fn test_unknown_summary_is_unrecognized() {
        let errors = parse_plan_errors(&lines(&[
            r#"{"@level":"error","@message":"Error: Unsupported argument","diagnostic":{"severity":"error","summary":"Unsupported argument","detail":""},"type":"diagnostic"}"#,
        ]));

        assert_eq!(errors[0].kind, PlanErrorKind::Unrecognized);
        assert_eq!(errors[0].line(), None);
        assert_eq!(errors[0].describe(), "Unsupported argument");
    }
}
