use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::ImportIdStrategy;
use super::api_gateway::{
    ApiGatewayBasePathMappingImporter, ApiGatewayMethodImporter, ApiGatewayResourceImporter,
    ApiGatewayStageImporter, ApiGatewayUsagePlanKeyImporter, ApiGatewayV2ApiMappingImporter,
    ApiGatewayV2StageImporter,
};
use super::cognito::{
    IdentityPoolRoleAttachmentImporter, UserGroupImporter, UserPoolClientImporter,
};
use super::services::{
    DbOptionGroupImporter, EcsServiceImporter, LambdaPermissionImporter,
    ListenerCertificateImporter, Route53RecordImporter, ScalableTargetImporter,
    ScalingPolicyImporter,
};
use super::vpc::{NetworkAclRuleImporter, RouteImporter, RouteTableAssociationImporter};

/// Import id strategies keyed by Terraform resource type
pub trait ImporterRegistry: Send + Sync {
    /// Register a strategy for a Terraform type, replacing any existing one
    fn register(&self, terraform_type: &str, strategy: Box<dyn ImportIdStrategy>);

    /// Strategy for a Terraform type; `None` means import by physical id
    fn get(&self, terraform_type: &str) -> Option<Arc<dyn ImportIdStrategy>>;

    fn has(&self, terraform_type: &str) -> bool;

    /// Registered Terraform types, sorted
    fn list(&self) -> Vec<String>;
}

/// Default implementation of the importer registry using a HashMap
pub struct DefaultImporterRegistry {
    strategies: RwLock<HashMap<String, Arc<dyn ImportIdStrategy>>>,
}

impl DefaultImporterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            strategies: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with every built-in strategy
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register("aws_route53_record", Box::new(Route53RecordImporter));
        registry.register("aws_ecs_service", Box::new(EcsServiceImporter));
        registry.register("aws_route", Box::new(RouteImporter));
        registry.register("aws_route_table_association", Box::new(RouteTableAssociationImporter));
        registry.register("aws_lambda_permission", Box::new(LambdaPermissionImporter));
        registry.register("aws_appautoscaling_target", Box::new(ScalableTargetImporter));
        registry.register("aws_network_acl_rule", Box::new(NetworkAclRuleImporter));
        registry.register("aws_api_gateway_resource", Box::new(ApiGatewayResourceImporter));
        registry.register("aws_api_gateway_stage", Box::new(ApiGatewayStageImporter));
        registry.register("aws_lb_listener_certificate", Box::new(ListenerCertificateImporter));
        registry.register("aws_api_gateway_method", Box::new(ApiGatewayMethodImporter));
        registry.register(
            "aws_api_gateway_base_path_mapping",
            Box::new(ApiGatewayBasePathMappingImporter),
        );
        registry.register("aws_api_gateway_usage_plan_key", Box::new(ApiGatewayUsagePlanKeyImporter));
        registry.register("aws_apigatewayv2_stage", Box::new(ApiGatewayV2StageImporter));
        registry.register("aws_apigatewayv2_api_mapping", Box::new(ApiGatewayV2ApiMappingImporter));
        registry.register("aws_appautoscaling_policy", Box::new(ScalingPolicyImporter));
        registry.register(
            "aws_cognito_identity_pool_roles_attachment",
            Box::new(IdentityPoolRoleAttachmentImporter),
        );
        registry.register("aws_cognito_user_group", Box::new(UserGroupImporter));
        registry.register("aws_cognito_user_pool_client", Box::new(UserPoolClientImporter));
        registry.register("aws_db_option_group", Box::new(DbOptionGroupImporter));
        registry
    }
}

impl ImporterRegistry for DefaultImporterRegistry {
    fn register(&self, terraform_type: &str, strategy: Box<dyn ImportIdStrategy>) {
        let mut strategies = self.strategies.write().unwrap_or_else(|e| e.into_inner());
        strategies.insert(terraform_type.to_string(), Arc::from(strategy));
    }

    fn get(&self, terraform_type: &str) -> Option<Arc<dyn ImportIdStrategy>> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.get(terraform_type).cloned()
    }

    fn has(&self, terraform_type: &str) -> bool {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        strategies.contains_key(terraform_type)
    }

    fn list(&self) -> Vec<String> {
        let strategies = self.strategies.read().unwrap_or_else(|e| e.into_inner());
        let mut types: Vec<String> = strategies.keys().cloned().collect();
        types.sort();
        types
    }
}

impl Default for DefaultImporterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
