//! Intrinsic function handling
//!
//! [`IntrinsicResolver`] produces the Terraform expression an intrinsic
//! stands for; [`IntrinsicEvaluator`] produces the value it had when the
//! stack was deployed. The state patcher needs both: the value tells it
//! which captured literal to replace, the expression what to replace it with.

pub mod evaluator;
pub mod reference_resolver;

pub use evaluator::IntrinsicEvaluator;
pub use reference_resolver::{IntrinsicResolver, export_data_name};
