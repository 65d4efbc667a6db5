//! Test helpers: captured state fixtures and stack snapshot builders
//!
//! The EC2 instance and Auto Scaling group fixtures are the attribute maps
//! `terraform import` produces for those resources, with references already
//! patched in where the template used intrinsics.

#![cfg(test)]

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::cloudformation::StackSnapshot;
use crate::reference::Reference;
use crate::state::{REFERENCE_KEY, StateValue};

fn reference(reference: Reference) -> Value {
    json!({ (REFERENCE_KEY): reference })
}

fn state(document: Value) -> BTreeMap<String, StateValue> {
    serde_json::from_value(document).expect("fixture state is valid")
}

/// Imported `aws_instance.my_instance`
pub fn ec2_state() -> BTreeMap<String, StateValue> {
    state(json!({
        "ami": reference(Reference::variable("AmiId")),
        "arn": "arn:aws:ec2:eu-west-1:123456789012:instance/i-05c2ec6ce1d453b0c",
        "associate_public_ip_address": false,
        "availability_zone": "eu-west-1a",
        "capacity_reservation_specification": [
            {"capacity_reservation_preference": "open", "capacity_reservation_target": []}
        ],
        "cpu_core_count": 1,
        "cpu_threads_per_core": 2,
        "credit_specification": [{"cpu_credits": "unlimited"}],
        "disable_api_termination": false,
        "ebs_block_device": [
            {"device_name": "/dev/sdb", "volume_id": "vol-0f3c8a1e2b9d47a61"}
        ],
        "ebs_optimized": false,
        "enclave_options": [{"enabled": false}],
        "ephemeral_block_device": [],
        "get_password_data": false,
        "hibernation": false,
        "host_id": null,
        "iam_instance_profile": reference(Reference::direct("aws_iam_instance_profile.InstanceProfile")),
        "id": "i-05c2ec6ce1d453b0c",
        "instance_initiated_shutdown_behavior": "stop",
        "instance_state": "stopped",
        "instance_type": "t3.medium",
        "ipv6_address_count": 0,
        "ipv6_addresses": [],
        "key_name": reference(Reference::variable("KeyPair")),
        "launch_template": [],
        "metadata_options": [
            {"http_endpoint": "enabled", "http_put_response_hop_limit": 1, "http_tokens": "optional"}
        ],
        "monitoring": false,
        "network_interface": [],
        "outpost_arn": "",
        "placement_group": "",
        "placement_partition_number": null,
        "primary_network_interface_id": "eni-0986ec5de5cdd445e",
        "private_dns": "ip-10-96-0-24.eu-west-1.compute.internal",
        "private_ip": "10.96.0.24",
        "public_dns": "",
        "public_ip": "",
        "root_block_device": [{
            "delete_on_termination": true,
            "encrypted": false,
            "iops": 450,
            "kms_key_id": "",
            "tags": {},
            "throughput": 0,
            "volume_id": "vol-0b2b0d6c1139c5527",
            "volume_size": 150,
            "volume_type": "gp2"
        }],
        "secondary_private_ips": [],
        "security_groups": [],
        "source_dest_check": true,
        "subnet_id": reference(Reference::variable("SubnetId")),
        "tags": {"Name": "my_instance"},
        "tags_all": {"Name": "my_instance"},
        "tenancy": "default",
        "timeouts": {"create": null, "delete": null, "update": null},
        "user_data": null,
        "user_data_base64": null,
        "volume_tags": null,
        "vpc_security_group_ids": [
            reference(Reference::direct("aws_security_group.TorrentSecurityGroup"))
        ]
    }))
}

/// Imported `aws_autoscaling_group.InstanceASG`
pub fn asg_state() -> BTreeMap<String, StateValue> {
    state(json!({
        "arn": "arn:aws:autoscaling:eu-west-1:123456789012:autoScalingGroup:49adb3d5-bbcc-4012-8786-dd19806c1d35:autoScalingGroupName/test-asg-1I7FR7OX4Z10G",
        "availability_zones": ["eu-west-1a", "eu-west-1b"],
        "capacity_rebalance": false,
        "default_cooldown": 300,
        "desired_capacity": 1,
        "enabled_metrics": [],
        "force_delete": null,
        "force_delete_warm_pool": null,
        "health_check_grace_period": 0,
        "health_check_type": "EC2",
        "id": "test-asg-1I7FR7OX4Z10G",
        "initial_lifecycle_hook": [],
        "instance_refresh": [],
        "launch_configuration": reference(Reference::direct("aws_launch_configuration.InstanceLaunchConfig")),
        "launch_template": [],
        "load_balancers": [],
        "max_instance_lifetime": 0,
        "max_size": 1,
        "metrics_granularity": "1Minute",
        "min_elb_capacity": null,
        "min_size": 1,
        "mixed_instances_policy": [],
        "name": "test-asg-1I7FR7OX4Z10G",
        "name_prefix": "",
        "placement_group": "",
        "protect_from_scale_in": false,
        "service_linked_role_arn": "arn:aws:iam::123456789012:role/aws-service-role/autoscaling.amazonaws.com/AWSServiceRoleForAutoScaling",
        "suspended_processes": [],
        "tag": [
            {"key": "Name", "propagate_at_launch": true, "value": "NAT Instance"},
            {"key": "nat:routing:cidr", "propagate_at_launch": true, "value": "0.0.0.0/0"}
        ],
        "tags": null,
        "target_group_arns": [],
        "termination_policies": [],
        "timeouts": {"delete": null},
        "vpc_zone_identifier": ["subnet-0785b231fa30a41e0", "subnet-07fc084aea2e3dcee"],
        "wait_for_capacity_timeout": null,
        "wait_for_elb_capacity": null,
        "warm_pool": []
    }))
}

/// Builder for stack snapshots used by mapper and exporter tests
pub struct SnapshotBuilder {
    name: String,
    region: String,
    parameters: Vec<(String, String)>,
    template_parameters: serde_json::Map<String, Value>,
    resources: Vec<(String, String, String, Value)>,
    outputs: serde_json::Map<String, Value>,
    nested: Vec<(String, SnapshotBuilder)>,
}

impl SnapshotBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            region: "eu-west-1".to_string(),
            parameters: Vec::new(),
            template_parameters: serde_json::Map::new(),
            resources: Vec::new(),
            outputs: serde_json::Map::new(),
            nested: Vec::new(),
        }
    }

    /// Add a template parameter with its deployed value
    pub fn parameter(mut self, name: &str, parameter_type: &str, value: &str) -> Self {
        self.template_parameters
            .insert(name.to_string(), json!({"Type": parameter_type}));
        self.parameters.push((name.to_string(), value.to_string()));
        self
    }

    pub fn resource(mut self, logical_id: &str, resource_type: &str, physical_id: &str) -> Self {
        self.resources.push((
            logical_id.to_string(),
            resource_type.to_string(),
            physical_id.to_string(),
            Value::Null,
        ));
        self
    }

    pub fn resource_with_properties(
        mut self,
        logical_id: &str,
        resource_type: &str,
        physical_id: &str,
        properties: Value,
    ) -> Self {
        self.resources.push((
            logical_id.to_string(),
            resource_type.to_string(),
            physical_id.to_string(),
            properties,
        ));
        self
    }

    pub fn output(mut self, name: &str, value: Value) -> Self {
        self.outputs.insert(name.to_string(), json!({"Value": value}));
        self
    }

    /// Add a nested stack resource and the nested stack it points at
    pub fn nested_stack(mut self, logical_id: &str, child: SnapshotBuilder, parameters: Value) -> Self {
        let arn = format!(
            "arn:aws:cloudformation:{}:123456789012:stack/{}/6a1c2f70-8f0a-11eb-9a3c-0a5d4e7b2c11",
            self.region, child.name
        );
        let properties = json!({"TemplateURL": "https://example.com/child.json", "Parameters": parameters});
        self = self.resource_with_properties(logical_id, "AWS::CloudFormation::Stack", &arn, properties);
        self.nested.push((child.name.clone(), child));
        self
    }

    pub fn to_value(&self) -> Value {
        let mut template_resources = serde_json::Map::new();
        let mut live = Vec::new();

        for (logical_id, resource_type, physical_id, properties) in &self.resources {
            let mut resource = json!({"Type": resource_type});
            if !properties.is_null() {
                resource["Properties"] = properties.clone();
            }
            template_resources.insert(logical_id.clone(), resource);
            live.push(json!({
                "LogicalResourceId": logical_id,
                "PhysicalResourceId": physical_id,
                "ResourceType": resource_type
            }));
        }

        let nested: serde_json::Map<String, Value> = self
            .nested
            .iter()
            .map(|(name, child)| (name.clone(), child.to_value()))
            .collect();

        json!({
            "StackName": self.name,
            "StackId": format!("arn:aws:cloudformation:{}:123456789012:stack/{}/0f1e2d3c", self.region, self.name),
            "Region": self.region,
            "AccountId": "123456789012",
            "Parameters": self.parameters.iter().map(|(k, v)| json!({"ParameterKey": k, "ParameterValue": v})).collect::<Vec<_>>(),
            "Template": {
                "Parameters": self.template_parameters,
                "Resources": template_resources,
                "Outputs": self.outputs
            },
            "Resources": live,
            "NestedStacks": nested
        })
    }

    pub fn build(&self) -> StackSnapshot {
        serde_json::from_value(self.to_value()).expect("snapshot builder produces a valid snapshot")
    }
}
