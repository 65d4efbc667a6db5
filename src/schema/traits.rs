//! Per-resource-type behaviour the provider schema does not express
//!
//! - how CloudFormation `Fn::GetAtt` attribute names map to Terraform attributes
//! - which attribute wins when two mutually exclusive attributes both hold values
//! - attributes that must be written as blocks even though the schema says otherwise
//! - values to write when the deployed state leaves an attribute unset
//! - attributes written even when empty

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::AttributePath;
use crate::state::StateValue;

/// Value substituted for an unset attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    String(&'static str),
    Bool(bool),
}

impl From<DefaultValue> for StateValue {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::String(s) => StateValue::String(s.to_string()),
            DefaultValue::Bool(b) => StateValue::Bool(b),
        }
    }
}

/// Traits of one Terraform resource type
#[derive(Debug, Clone, Default)]
pub struct ResourceTraits {
    /// CloudFormation attribute name → Terraform attribute name
    pub attribute_map: &'static [(&'static str, &'static str)],
    /// Groups of conflicting attributes, most preferred first
    pub conflict_preferences: &'static [&'static [&'static str]],
    /// Attributes rendered as repeated blocks
    pub block_attributes: &'static [&'static str],
    /// Attribute pattern → value used when the state holds null or nothing
    pub default_values: &'static [(&'static str, DefaultValue)],
    /// Attribute patterns kept even when their value is empty
    pub required_attributes: &'static [&'static str],
}

impl ResourceTraits {
    const fn new(
        attribute_map: &'static [(&'static str, &'static str)],
        conflict_preferences: &'static [&'static [&'static str]],
        block_attributes: &'static [&'static str],
    ) -> Self {
        Self {
            attribute_map,
            conflict_preferences,
            block_attributes,
            default_values: &[],
            required_attributes: &[],
        }
    }

    fn with_defaults(mut self, default_values: &'static [(&'static str, DefaultValue)]) -> Self {
        self.default_values = default_values;
        self
    }

    fn with_required(mut self, required_attributes: &'static [&'static str]) -> Self {
        self.required_attributes = required_attributes;
        self
    }

    /// Terraform attribute for a `Fn::GetAtt` attribute name
    pub fn terraform_attribute(&self, cloudformation_attribute: &str) -> String {
        self.attribute_map
            .iter()
            .find(|(cfn, _)| *cfn == cloudformation_attribute)
            .map(|(_, tf)| tf.to_string())
            .unwrap_or_else(|| camel_to_snake(cloudformation_attribute))
    }

    /// Which of two conflicting attributes to keep, if a preference is declared
    pub fn preferred<'a>(&self, first: &'a str, second: &'a str) -> Option<&'a str> {
        self.conflict_preferences.iter().find_map(|group| {
            let first_rank = group.iter().position(|name| *name == first)?;
            let second_rank = group.iter().position(|name| *name == second)?;

            Some(if first_rank <= second_rank { first } else { second })
        })
    }

    pub fn renders_as_block(&self, attribute: &str) -> bool {
        self.block_attributes.contains(&attribute)
    }

    /// Value to write for `path` when the state leaves it unset
    pub fn default_value(&self, path: &AttributePath) -> Option<StateValue> {
        self.default_values
            .iter()
            .find(|(pattern, _)| matches_pattern(pattern, path))
            .map(|(_, value)| StateValue::from(*value))
    }

    /// Whether `path` is written even when its value is empty
    pub fn should_emit(&self, path: &AttributePath) -> bool {
        self.required_attributes
            .iter()
            .any(|pattern| matches_pattern(pattern, path))
            || self.default_value(path).is_some()
    }
}

/// Match a dotted pattern against a path; `*` stands for any one segment
fn matches_pattern(pattern: &str, path: &AttributePath) -> bool {
    let segments = path.segments();
    let parts = AttributePath::split(pattern);

    parts.len() == segments.len()
        && parts
            .iter()
            .zip(&segments)
            .all(|(part, segment)| part == "*" || part == segment)
}

lazy_static! {
    static ref RESOURCE_TRAITS: HashMap<&'static str, ResourceTraits> = build_traits();
    static ref DEFAULT_TRAITS: ResourceTraits = ResourceTraits::default();
}

/// Traits for a Terraform resource type; types without entries get empty traits
pub fn resource_traits(terraform_type: &str) -> &'static ResourceTraits {
    RESOURCE_TRAITS.get(terraform_type).unwrap_or(&*DEFAULT_TRAITS)
}

/// Convert a CloudFormation attribute name to Terraform style
///
/// Runs of capitals are kept together: `DNSName` → `dns_name`,
/// `Endpoint.Address` → `endpoint_address`.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.replace('.', "").chars().collect();
    let mut result = String::new();

    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let previous_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let previous_upper = i > 0 && chars[i - 1].is_uppercase();

            if i > 0 && (previous_lower || (previous_upper && next_lower)) {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(*c);
        }
    }

    result
}

fn build_traits() -> HashMap<&'static str, ResourceTraits> {
    let mut map = HashMap::new();

    map.insert(
        "aws_s3_bucket",
        ResourceTraits::new(
            &[
                ("DomainName", "bucket_domain_name"),
                ("RegionalDomainName", "bucket_regional_domain_name"),
                ("WebsiteURL", "website_endpoint"),
            ],
            &[&["grant", "acl"]],
            &[],
        )
        .with_defaults(&[
            ("acl", DefaultValue::String("private")),
            ("force_destroy", DefaultValue::Bool(false)),
        ]),
    );
    map.insert(
        "aws_s3_bucket_policy",
        ResourceTraits::new(&[], &[], &[]).with_required(&["policy"]),
    );
    map.insert(
        "aws_iam_role",
        ResourceTraits::new(&[("RoleId", "unique_id")], &[], &["inline_policy"]),
    );
    map.insert(
        "aws_instance",
        ResourceTraits::new(
            &[
                ("PrivateDnsName", "private_dns"),
                ("PrivateIp", "private_ip"),
                ("PublicDnsName", "public_dns"),
                ("PublicIp", "public_ip"),
            ],
            &[],
            &[],
        ),
    );
    map.insert(
        "aws_security_group",
        ResourceTraits::new(&[("GroupId", "id")], &[], &[]).with_required(&[
            "ingress.*.description",
            "ingress.*.ipv6_cidr_blocks",
            "ingress.*.prefix_list_ids",
            "ingress.*.security_groups",
            "egress.*.description",
            "egress.*.ipv6_cidr_blocks",
            "egress.*.prefix_list_ids",
            "egress.*.security_groups",
        ]),
    );
    map.insert(
        "aws_sqs_queue",
        ResourceTraits::new(&[("QueueName", "name"), ("QueueUrl", "url")], &[], &[]),
    );
    map.insert(
        "aws_sns_topic",
        ResourceTraits::new(&[("TopicName", "name")], &[], &[]),
    );
    map.insert(
        "aws_lb",
        ResourceTraits::new(
            &[
                ("DNSName", "dns_name"),
                ("LoadBalancerArn", "arn"),
                ("CanonicalHostedZoneID", "zone_id"),
                ("LoadBalancerFullName", "arn_suffix"),
            ],
            &[&["subnet_mapping", "subnets"]],
            &[],
        ),
    );
    map.insert(
        "aws_kms_key",
        ResourceTraits::new(&[("KeyId", "key_id")], &[], &[]),
    );
    map.insert(
        "aws_vpc",
        ResourceTraits::new(
            &[("DefaultSecurityGroup", "default_security_group_id")],
            &[],
            &[],
        ),
    );
    map.insert(
        "aws_route53_zone",
        ResourceTraits::new(&[("NameServers", "name_servers")], &[], &[]),
    );
    map.insert(
        "aws_dynamodb_table",
        ResourceTraits::new(&[("StreamArn", "stream_arn")], &[], &[]),
    );
    map.insert(
        "aws_api_gateway_rest_api",
        ResourceTraits::new(&[("RootResourceId", "root_resource_id")], &[], &[]),
    );

    map
}
