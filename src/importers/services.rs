use super::{ImportContext, ImportIdStrategy};

const SCALABLE_TARGET: &str = "AWS::ApplicationAutoScaling::ScalableTarget";

/// `aws_route53_record`: `<zone>_<name>_<type>[_<set identifier>]`
///
/// The physical id of a record set is its name.
pub struct Route53RecordImporter;

impl ImportIdStrategy for Route53RecordImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let Some(zone) = ctx.property_text("HostedZoneId") else {
            warnings.push(format!(
                "Cannot determine Zone ID for resource \"{}\"",
                ctx.mapping.logical_id
            ));
            return None;
        };

        let Some(record_type) = ctx.property_text("Type") else {
            warnings.push(format!(
                "Cannot determine record type for resource \"{}\"",
                ctx.mapping.logical_id
            ));
            return None;
        };

        let mut id = format!("{}_{}_{}", zone, ctx.mapping.physical_id, record_type);
        if let Some(set_identifier) = ctx.property_text("SetIdentifier") {
            id.push('_');
            id.push_str(&set_identifier);
        }

        Some(id)
    }
}

/// `aws_ecs_service`: `<cluster>/<service>` out of the service ARN
pub struct EcsServiceImporter;

impl ImportIdStrategy for EcsServiceImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, _warnings: &mut Vec<String>) -> Option<String> {
        // arn:aws:ecs:<region>:<account>:service/<cluster>/<service>
        let parts: Vec<&str> = ctx.mapping.physical_id.split('/').skip(1).collect();

        if parts.len() >= 2 {
            return Some(parts.join("/"));
        }

        // Older ARNs leave the cluster out
        let service = parts
            .first()
            .copied()
            .unwrap_or(ctx.mapping.physical_id.as_str());
        let cluster = ctx
            .related_physical_id("AWS::ECS::Cluster", "Cluster")
            .unwrap_or_else(|| "default".to_string());

        Some(format!("{}/{}", cluster, service))
    }
}

/// `aws_lambda_permission`: `<function>/<statement id>`
pub struct LambdaPermissionImporter;

impl ImportIdStrategy for LambdaPermissionImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        match ctx.related_physical_id("AWS::Lambda::Function", "FunctionName") {
            Some(function) => Some(format!("{}/{}", function, ctx.mapping.physical_id)),
            None => {
                warnings.push(format!(
                    "Cannot determine the function of {}",
                    ctx.mapping.aws_address()
                ));
                None
            }
        }
    }
}

/// `aws_appautoscaling_target`: `<namespace>/<resource id>/<dimension>`
///
/// The physical id is `<resource id>|<dimension>|<namespace>`.
pub struct ScalableTargetImporter;

impl ImportIdStrategy for ScalableTargetImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        scalable_target(ctx, &ctx.mapping.physical_id, warnings)
    }
}

fn scalable_target(
    ctx: &ImportContext<'_>,
    physical_id: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    match physical_id.split('|').collect::<Vec<_>>().as_slice() {
        [resource_id, dimension, namespace] => {
            Some(format!("{}/{}/{}", namespace, resource_id, dimension))
        }
        _ => {
            warnings.push(format!(
                "Unexpected scalable target id \"{}\" for {}",
                physical_id,
                ctx.mapping.aws_address()
            ));
            None
        }
    }
}

/// `aws_appautoscaling_policy`: `<namespace>/<resource id>/<dimension>/<policy name>`
///
/// The target comes from `ScalingTargetId` when set, otherwise from the
/// policy's own `ServiceNamespace`, `ResourceId` and `ScalableDimension`.
pub struct ScalingPolicyImporter;

impl ImportIdStrategy for ScalingPolicyImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let target = match ctx.related_physical_id(SCALABLE_TARGET, "ScalingTargetId") {
            Some(target_id) => scalable_target(ctx, &target_id, warnings)?,
            None => {
                let namespace = ctx.require_property("ServiceNamespace", warnings)?;
                let resource_id = ctx.require_property("ResourceId", warnings)?;
                let dimension = ctx.require_property("ScalableDimension", warnings)?;
                format!("{}/{}/{}", namespace, resource_id, dimension)
            }
        };
        let name = ctx.require_property("PolicyName", warnings)?;

        Some(format!("{}/{}", target, name))
    }
}

/// `aws_db_option_group`: the physical id in lower case
pub struct DbOptionGroupImporter;

impl ImportIdStrategy for DbOptionGroupImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, _warnings: &mut Vec<String>) -> Option<String> {
        Some(ctx.mapping.physical_id.to_lowercase())
    }
}

/// `aws_lb_listener_certificate`: `<listener arn>_<certificate arn>`
///
/// Only the first certificate of the resource is imported.
pub struct ListenerCertificateImporter;

impl ImportIdStrategy for ListenerCertificateImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let listener = ctx.require_related(
            "AWS::ElasticLoadBalancingV2::Listener",
            "ListenerArn",
            warnings,
        )?;
        let certificate = ctx.require_property("Certificates.0.CertificateArn", warnings)?;

        Some(format!("{}_{}", listener, certificate))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::importers::testing::Fixture;
    use crate::test_helpers::SnapshotBuilder;

    #[test]
    fn test_route53_record_with_referenced_zone() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("dns")
                .parameter("ZoneId", "AWS::Route53::HostedZone::Id", "Z0123456789")
                .resource_with_properties(
                    "WwwRecord",
                    "AWS::Route53::RecordSet",
                    "www.example.com",
                    json!({
                        "HostedZoneId": {"Ref": "ZoneId"},
                        "Name": "www.example.com",
                        "Type": "CNAME",
                        "SetIdentifier": "blue"
                    }),
                ),
        );

        let (id, warnings) = fixture.import_id(&Route53RecordImporter, "WwwRecord");

        assert_eq!(id.as_deref(), Some("Z0123456789_www.example.com_CNAME_blue"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_route53_record_without_zone_is_skipped() {
        let fixture = Fixture::new(SnapshotBuilder::new("dns").resource_with_properties(
            "WwwRecord",
            "AWS::Route53::RecordSet",
            "www.example.com",
            json!({"HostedZoneName": "example.com.", "Type": "A"}),
        ));

        let (id, warnings) = fixture.import_id(&Route53RecordImporter, "WwwRecord");

        assert!(id.is_none());
        assert_eq!(warnings, vec!["Cannot determine Zone ID for resource \"WwwRecord\""]);
    }

    #[test]
    fn test_ecs_service() {
        let fixture = Fixture::new(SnapshotBuilder::new("ecs").resource(
            "Service",
            "AWS::ECS::Service",
            "arn:aws:ecs:eu-west-1:123456789012:service/prod-cluster/web",
        ));

        assert_eq!(
            fixture.import_id(&EcsServiceImporter, "Service").0.as_deref(),
            Some("prod-cluster/web")
        );
    }

    #[test]
    fn test_lambda_permission_from_graph_and_export() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("fn")
                .resource("Handler", "AWS::Lambda::Function", "fn-Handler-ABC")
                .resource_with_properties(
                    "Invoke",
                    "AWS::Lambda::Permission",
                    "fn-Invoke-XYZ",
                    json!({"FunctionName": {"Fn::GetAtt": ["Handler", "Arn"]}, "Action": "lambda:InvokeFunction"}),
                )
                .resource_with_properties(
                    "External",
                    "AWS::Lambda::Permission",
                    "fn-External-QRS",
                    json!({"FunctionName": "shared-handler", "Action": "lambda:InvokeFunction"}),
                ),
        );

        assert_eq!(
            fixture.import_id(&LambdaPermissionImporter, "Invoke").0.as_deref(),
            Some("fn-Handler-ABC/fn-Invoke-XYZ")
        );
        assert_eq!(
            fixture.import_id(&LambdaPermissionImporter, "External").0.as_deref(),
            Some("shared-handler/fn-External-QRS")
        );
    }

    #[test]
    fn test_scalable_target() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("scaling")
                .resource(
                    "Target",
                    "AWS::ApplicationAutoScaling::ScalableTarget",
                    "service/prod/web|ecs:service:DesiredCount|ecs",
                )
                .resource("Broken", "AWS::ApplicationAutoScaling::ScalableTarget", "nope"),
        );

        assert_eq!(
            fixture.import_id(&ScalableTargetImporter, "Target").0.as_deref(),
            Some("ecs/service/prod/web/ecs:service:DesiredCount")
        );

        let (id, warnings) = fixture.import_id(&ScalableTargetImporter, "Broken");
        assert!(id.is_none());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_scaling_policy() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("scaling")
                .resource(
                    "Target",
                    SCALABLE_TARGET,
                    "service/prod/web|ecs:service:DesiredCount|ecs",
                )
                .resource_with_properties(
                    "CpuPolicy",
                    "AWS::ApplicationAutoScaling::ScalingPolicy",
                    "arn:aws:autoscaling:eu-west-1:123456789012:scalingPolicy:1f2e:resource/ecs/service/prod/web:policyName/cpu",
                    json!({
                        "PolicyName": "cpu",
                        "PolicyType": "TargetTrackingScaling",
                        "ScalingTargetId": {"Ref": "Target"}
                    }),
                )
                .resource_with_properties(
                    "TablePolicy",
                    "AWS::ApplicationAutoScaling::ScalingPolicy",
                    "arn:aws:autoscaling:eu-west-1:123456789012:scalingPolicy:3c4d:resource/dynamodb/table/orders:policyName/reads",
                    json!({
                        "PolicyName": "reads",
                        "ServiceNamespace": "dynamodb",
                        "ResourceId": "table/orders",
                        "ScalableDimension": "dynamodb:table:ReadCapacityUnits"
                    }),
                ),
        );

        assert_eq!(
            fixture.import_id(&ScalingPolicyImporter, "CpuPolicy").0.as_deref(),
            Some("ecs/service/prod/web/ecs:service:DesiredCount/cpu")
        );
        assert_eq!(
            fixture.import_id(&ScalingPolicyImporter, "TablePolicy").0.as_deref(),
            Some("dynamodb/table/orders/dynamodb:table:ReadCapacityUnits/reads")
        );
    }

    #[test]
    fn test_scaling_policy_without_target_warns() {
        let fixture = Fixture::new(SnapshotBuilder::new("scaling").resource_with_properties(
            "Orphan",
            "AWS::ApplicationAutoScaling::ScalingPolicy",
            "arn:aws:autoscaling:eu-west-1:123456789012:scalingPolicy:5e6f:resource/ecs/x:policyName/p",
            json!({"PolicyName": "p", "ServiceNamespace": "ecs"}),
        ));

        let (id, warnings) = fixture.import_id(&ScalingPolicyImporter, "Orphan");

        assert!(id.is_none());
        assert_eq!(warnings, vec!["Cannot determine ResourceId for resource \"Orphan\""]);
    }

    #[test]
    fn test_db_option_group_is_lower_cased() {
        let fixture = Fixture::new(SnapshotBuilder::new("db").resource(
            "Options",
            "AWS::RDS::DBOptionGroup",
            "db-OptionGroup-1XYZ",
        ));

        assert_eq!(
            fixture.import_id(&DbOptionGroupImporter, "Options").0.as_deref(),
            Some("db-optiongroup-1xyz")
        );
    }

    #[test]
    fn test_listener_certificate() {
        let listener = "arn:aws:elasticloadbalancing:eu-west-1:123456789012:listener/app/web/50dc6c495c0c9188/f2f7dc8efc522ab2";
        let certificate = "arn:aws:acm:eu-west-1:123456789012:certificate/0f1e2d3c";
        let fixture = Fixture::new(
            SnapshotBuilder::new("lb")
                .resource("Listener", "AWS::ElasticLoadBalancingV2::Listener", listener)
                .resource_with_properties(
                    "ExtraCertificates",
                    "AWS::ElasticLoadBalancingV2::ListenerCertificate",
                    "lb-Extra-1",
                    json!({
                        "ListenerArn": {"Ref": "Listener"},
                        "Certificates": [{"CertificateArn": certificate}]
                    }),
                ),
        );

        assert_eq!(
            fixture.import_id(&ListenerCertificateImporter, "ExtraCertificates").0,
            Some(format!("{}_{}", listener, certificate))
        );
    }

    #[test]
    fn test_listener_certificate_without_certificates_warns() {
        let listener = "arn:aws:elasticloadbalancing:eu-west-1:123456789012:listener/app/web/50dc6c495c0c9188/f2f7dc8efc522ab2";
        let fixture = Fixture::new(
            SnapshotBuilder::new("lb")
                .resource("Listener", "AWS::ElasticLoadBalancingV2::Listener", listener)
                .resource_with_properties(
                    "ExtraCertificates",
                    "AWS::ElasticLoadBalancingV2::ListenerCertificate",
                    "lb-Extra-1",
                    json!({"ListenerArn": {"Ref": "Listener"}, "Certificates": []}),
                ),
        );

        let (id, warnings) = fixture.import_id(&ListenerCertificateImporter, "ExtraCertificates");

        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot determine Certificates.0.CertificateArn for resource \"ExtraCertificates\""]
        );
    }
}
