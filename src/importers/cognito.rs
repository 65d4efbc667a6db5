use super::{ImportContext, ImportIdStrategy};

const USER_POOL: &str = "AWS::Cognito::UserPool";

fn user_pool_scoped(ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
    let pool = ctx.require_related(USER_POOL, "UserPoolId", warnings)?;
    Some(format!("{}/{}", pool, ctx.mapping.physical_id))
}

/// `aws_cognito_identity_pool_roles_attachment`: the identity pool id
pub struct IdentityPoolRoleAttachmentImporter;

impl ImportIdStrategy for IdentityPoolRoleAttachmentImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        ctx.require_related("AWS::Cognito::IdentityPool", "IdentityPoolId", warnings)
    }
}

/// `aws_cognito_user_group`: `<user pool>/<group name>`
pub struct UserGroupImporter;

impl ImportIdStrategy for UserGroupImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        user_pool_scoped(ctx, warnings)
    }
}

/// `aws_cognito_user_pool_client`: `<user pool>/<client id>`
pub struct UserPoolClientImporter;

impl ImportIdStrategy for UserPoolClientImporter {
    fn import_id(&self, ctx: &ImportContext<'_>, warnings: &mut Vec<String>) -> Option<String> {
        user_pool_scoped(ctx, warnings)
    }
}
