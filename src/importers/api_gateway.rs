use lazy_static::lazy_static;
use regex::Regex;

use super::{ImportContext, ImportIdStrategy};

const REST_API: &str = "AWS::ApiGateway::RestApi";
const HTTP_API: &str = "AWS::ApiGatewayV2::Api";

lazy_static! {
    static ref DOMAIN_NAME: Regex =
        Regex::new(r"(?i)^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
            .expect("valid domain name pattern");
}

fn rest_api_scoped(ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
    let api = ctx.require_related(REST_API, "RestApiId", warnings)?;
    Some(format!("{}/{}", api, ctx.mapping.physical_id))
}

/// `aws_api_gateway_resource`: `<rest api>/<resource id>`
pub struct ApiGatewayResourceImporter;

impl ImportIdStrategy for ApiGatewayResourceImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        rest_api_scoped(ctx, warnings)
    }
}

/// `aws_api_gateway_stage`: `<rest api>/<stage name>`
pub struct ApiGatewayStageImporter;

impl ImportIdStrategy for ApiGatewayStageImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        rest_api_scoped(ctx, warnings)
    }
}

/// `aws_api_gateway_method`: `<rest api>/<resource id>/<http method>`
pub struct ApiGatewayMethodImporter;

impl ImportIdStrategy for ApiGatewayMethodImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let api = ctx.require_related(REST_API, "RestApiId", warnings)?;
        let resource = ctx.require_related("AWS::ApiGateway::Resource", "ResourceId", warnings)?;
        let method = ctx.require_property("HttpMethod", warnings)?;

        Some(format!("{}/{}/{}", api, resource, method.to_uppercase()))
    }
}

/// `aws_api_gateway_base_path_mapping`: `<domain name>/<base path>`
///
/// The base path is empty for a mapping of the domain root.
pub struct ApiGatewayBasePathMappingImporter;

impl ImportIdStrategy for ApiGatewayBasePathMappingImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let domain =
            ctx.require_related("AWS::ApiGateway::DomainName", "DomainName", warnings)?;
        let base_path = ctx.property_text("BasePath").unwrap_or_default();

        Some(format!("{}/{}", domain, base_path))
    }
}

/// `aws_api_gateway_usage_plan_key`: `<usage plan>/<key>`
///
/// The physical id is `<key>:<usage plan>`.
pub struct ApiGatewayUsagePlanKeyImporter;

impl ImportIdStrategy for ApiGatewayUsagePlanKeyImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, _warnings: &mut Vec<String>) -> Option<String> {
        let parts: Vec<&str> = ctx.mapping.physical_id.split(':').rev().collect();
        Some(parts.join("/"))
    }
}

/// `aws_apigatewayv2_stage`: `<api>/<stage name>`
pub struct ApiGatewayV2StageImporter;

impl ImportIdStrategy for ApiGatewayV2StageImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        let api = ctx.require_related(HTTP_API, "ApiId", warnings)?;
        let stage = ctx.require_property("StageName", warnings)?;

        Some(format!("{}/{}", api, stage))
    }
}

/// `aws_apigatewayv2_api_mapping`: `<mapping id>/<domain name>`
///
/// A `Ref` to a domain name resource evaluates to the domain itself.
pub struct ApiGatewayV2ApiMappingImporter;

impl ImportIdStrategy for ApiGatewayV2ApiMappingImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        match ctx.property_text("DomainName") {
            Some(domain) if DOMAIN_NAME.is_match(&domain) => {
                Some(format!("{}/{}", ctx.mapping.physical_id, domain))
            }
            _ => {
                warnings.push(format!(
                    "Cannot resolve domain name for {}.",
                    ctx.mapping.aws_address()
                ));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::importers::testing::Fixture;
    use crate::test_helpers::SnapshotBuilder;

    fn rest_api() -> SnapshotBuilder {
        SnapshotBuilder::new("api")
            .resource("Api", REST_API, "a1b2c3")
            .resource_with_properties(
                "Users",
                "AWS::ApiGateway::Resource",
                "x9y8",
                json!({"RestApiId": {"Ref": "Api"}, "PathPart": "users"}),
            )
    }

    #[test]
    fn test_resource_and_stage() {
        let fixture = Fixture::new(rest_api().resource_with_properties(
            "Prod",
            "AWS::ApiGateway::Stage",
            "prod",
            json!({"RestApiId": {"Ref": "Api"}, "StageName": "prod"}),
        ));

        assert_eq!(
            fixture.import_id(&ApiGatewayResourceImporter, "Users").0.as_deref(),
            Some("a1b2c3/x9y8")
        );
        assert_eq!(
            fixture.import_id(&ApiGatewayStageImporter, "Prod").0.as_deref(),
            Some("a1b2c3/prod")
        );
    }

    #[test]
    fn test_stage_without_rest_api_warns() {
        let fixture = Fixture::new(SnapshotBuilder::new("api").resource_with_properties(
            "Prod",
            "AWS::ApiGateway::Stage",
            "prod",
            json!({"StageName": "prod"}),
        ));

        let (id, warnings) = fixture.import_id(&ApiGatewayStageImporter, "Prod");

        assert!(id.is_none());
        assert_eq!(warnings, vec!["Cannot determine RestApiId for resource \"Prod\""]);
    }

    #[test]
    fn test_method() {
        let fixture = Fixture::new(rest_api().resource_with_properties(
            "GetUsers",
            "AWS::ApiGateway::Method",
            "api-GetUs-1A",
            json!({
                "RestApiId": {"Ref": "Api"},
                "ResourceId": {"Ref": "Users"},
                "HttpMethod": "get",
                "AuthorizationType": "NONE"
            }),
        ));

        let (id, warnings) = fixture.import_id(&ApiGatewayMethodImporter, "GetUsers");

        assert_eq!(id.as_deref(), Some("a1b2c3/x9y8/GET"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_method_without_http_method_warns() {
        let fixture = Fixture::new(rest_api().resource_with_properties(
            "AnyUsers",
            "AWS::ApiGateway::Method",
            "api-AnyUs-1A",
            json!({"RestApiId": {"Ref": "Api"}, "ResourceId": {"Ref": "Users"}}),
        ));

        let (id, warnings) = fixture.import_id(&ApiGatewayMethodImporter, "AnyUsers");

        assert!(id.is_none());
        assert_eq!(warnings, vec!["Cannot determine HttpMethod for resource \"AnyUsers\""]);
    }

    #[test]
    fn test_base_path_mapping() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("api")
                .resource("Domain", "AWS::ApiGateway::DomainName", "api.example.com")
                .resource_with_properties(
                    "V1",
                    "AWS::ApiGateway::BasePathMapping",
                    "api-V1-2B",
                    json!({"DomainName": {"Ref": "Domain"}, "BasePath": "v1"}),
                )
                .resource_with_properties(
                    "Root",
                    "AWS::ApiGateway::BasePathMapping",
                    "api-Root-3C",
                    json!({"DomainName": {"Ref": "Domain"}}),
                ),
        );

        assert_eq!(
            fixture.import_id(&ApiGatewayBasePathMappingImporter, "V1").0.as_deref(),
            Some("api.example.com/v1")
        );
        assert_eq!(
            fixture.import_id(&ApiGatewayBasePathMappingImporter, "Root").0.as_deref(),
            Some("api.example.com/")
        );
    }

    #[test]
    fn test_usage_plan_key() {
        let fixture = Fixture::new(SnapshotBuilder::new("api").resource(
            "PlanKey",
            "AWS::ApiGateway::UsagePlanKey",
            "k3y1d:pl4n1d",
        ));

        assert_eq!(
            fixture.import_id(&ApiGatewayUsagePlanKeyImporter, "PlanKey").0.as_deref(),
            Some("pl4n1d/k3y1d")
        );
    }

    #[test]
    fn test_http_api_stage() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("http")
                .resource("HttpApi", HTTP_API, "h7t7p9")
                .resource_with_properties(
                    "Live",
                    "AWS::ApiGatewayV2::Stage",
                    "live",
                    json!({"ApiId": {"Ref": "HttpApi"}, "StageName": "live"}),
                ),
        );

        assert_eq!(
            fixture.import_id(&ApiGatewayV2StageImporter, "Live").0.as_deref(),
            Some("h7t7p9/live")
        );
    }

    #[test]
    fn test_api_mapping() {
        let fixture = Fixture::new(
            SnapshotBuilder::new("http")
                .resource("Domain", "AWS::ApiGatewayV2::DomainName", "api.example.com")
                .resource_with_properties(
                    "ByRef",
                    "AWS::ApiGatewayV2::ApiMapping",
                    "m4pp1ng",
                    json!({"DomainName": {"Ref": "Domain"}, "Stage": "live"}),
                )
                .resource_with_properties(
                    "Literal",
                    "AWS::ApiGatewayV2::ApiMapping",
                    "l1t3r4l",
                    json!({"DomainName": "shop.example.org", "Stage": "live"}),
                )
                .resource_with_properties(
                    "Broken",
                    "AWS::ApiGatewayV2::ApiMapping",
                    "br0k3n",
                    json!({"Stage": "live"}),
                ),
        );

        assert_eq!(
            fixture.import_id(&ApiGatewayV2ApiMappingImporter, "ByRef").0.as_deref(),
            Some("m4pp1ng/api.example.com")
        );
        assert_eq!(
            fixture.import_id(&ApiGatewayV2ApiMappingImporter, "Literal").0.as_deref(),
            Some("l1t3r4l/shop.example.org")
        );

        let (id, warnings) = fixture.import_id(&ApiGatewayV2ApiMappingImporter, "Broken");
        assert!(id.is_none());
        assert_eq!(
            warnings,
            vec!["Cannot resolve domain name for Broken (AWS::ApiGatewayV2::ApiMapping)."]
        );
    }
}
