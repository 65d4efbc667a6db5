//! Terraform AWS provider schema model
//!
//! The provider schema and the AWS → Terraform type table are generated
//! out-of-band and compiled into the binary. [`AwsSchema`] is built once at
//! start-up and passed by reference to the mapper, the state serializer and
//! the preprocessor; nothing in it changes afterwards.
//!
//! ```text
//! let schema = AwsSchema::embedded()?;
//! let instance = schema.resource_schema("AWS::EC2::Instance")?;
//! let credits = instance.attribute_by_path("credit_specification.*.cpu_credits")?;
//! ```

pub mod attribute_path;
pub mod aws_schema;
pub mod resource_schema;
pub mod traits;
pub mod value_schema;

pub use attribute_path::AttributePath;
pub use aws_schema::AwsSchema;
pub use resource_schema::ResourceSchema;
pub use traits::ResourceTraits;
pub use value_schema::{ConfigMode, Elem, ValueSchema, ValueType};
