use std::fmt;

/// Error types for stack migration operations
#[derive(Debug)]
pub enum MigrationError {
    /// AWS resource type has no entry in the type map
    TypeNotMapped(String),

    /// Terraform resource type has no schema
    SchemaNotFound(String),

    /// Attribute path does not exist in a resource schema
    AttributeNotFound { path: String, message: String },

    /// Attribute path violates list/block nesting rules
    InvalidPath { path: String, message: String },

    /// Intrinsic function that can never be expressed in Terraform
    Intrinsic(String),

    /// Pseudo parameter without a Terraform equivalent
    PseudoParameter(String),

    /// Nested stack identifier is not a valid CloudFormation stack ARN
    InvalidArn(String),

    /// Terraform binary could not be located
    TerraformNotFound(String),

    /// Terraform command failed
    TerraformFailed {
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// Template and deployed stack disagree on the resource set
    ResourceCountMismatch {
        stack_name: String,
        missing_in_stack: Vec<String>,
        missing_in_template: Vec<String>,
    },

    /// Mutually exclusive attributes could not be settled
    Conflict {
        resource: String,
        attributes: Vec<String>,
    },

    /// Invalid input or parameter
    InvalidInput(String),

    /// Configuration file parsing error
    ConfigParse(String),

    /// Serialization error
    Serialization(String),

    /// General I/O error
    Io(std::io::Error),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::TypeNotMapped(aws_type) => write!(
                f,
                "Resource \"{}\": No corresponding Terraform resource found. If this is incorrect, please raise an issue.",
                aws_type
            ),
            MigrationError::SchemaNotFound(tf_type) => {
                write!(f, "Resource \"{}\" not found.", tf_type)
            }
            MigrationError::AttributeNotFound { path, message } => {
                write!(f, "Attribute \"{}\": {}", path, message)
            }
            MigrationError::InvalidPath { path, message } => {
                write!(f, "Invalid path \"{}\": {}", path, message)
            }
            MigrationError::Intrinsic(name) => {
                write!(f, "Intrinsic \"{}\" cannot be resolved.", name)
            }
            MigrationError::PseudoParameter(name) => write!(
                f,
                "Pseudo parameter \"{}\" cannot be referenced by terraform.",
                name
            ),
            MigrationError::InvalidArn(arn) => {
                write!(f, "Invalid CloudFormation stack ARN: {}", arn)
            }
            MigrationError::TerraformNotFound(binary) => {
                write!(f, "Cannot find terraform executable \"{}\"", binary)
            }
            MigrationError::TerraformFailed {
                command,
                message,
                exit_code,
            } => {
                write!(f, "terraform {} failed", command)?;

                if let Some(code) = exit_code {
                    write!(f, " (exit code {})", code)?;
                }

                write!(f, ": {}", message)
            }
            MigrationError::ResourceCountMismatch {
                stack_name,
                missing_in_stack,
                missing_in_template,
            } => {
                write!(
                    f,
                    "Stack \"{}\" does not match its template",
                    stack_name
                )?;

                if !missing_in_stack.is_empty() {
                    write!(f, "; not deployed: {}", missing_in_stack.join(", "))?;
                }

                if !missing_in_template.is_empty() {
                    write!(
                        f,
                        "; not in template: {}",
                        missing_in_template.join(", ")
                    )?;
                }

                Ok(())
            }
            MigrationError::Conflict {
                resource,
                attributes,
            } => write!(
                f,
                "{}: attributes {} are mutually exclusive",
                resource,
                attributes.join(", ")
            ),
            MigrationError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            MigrationError::ConfigParse(msg) => {
                write!(f, "Failed to parse configuration: {}", msg)
            }
            MigrationError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            MigrationError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        MigrationError::Io(err)
    }
}

impl From<serde_yaml::Error> for MigrationError {
    fn from(err: serde_yaml::Error) -> Self {
        MigrationError::ConfigParse(err.to_string())
    }
}

impl From<serde_json::Error> for MigrationError {
    fn from(err: serde_json::Error) -> Self {
        MigrationError::Serialization(err.to_string())
    }
}

/// Result type for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;
