/// A live CloudFormation resource paired with the Terraform resource it becomes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMapping {
    pub logical_id: String,
    pub physical_id: String,
    pub aws_type: String,
    pub terraform_type: String,
    /// Module path (`module.a.module.b`), `None` in the root module
    pub module: Option<String>,
    /// Set once `terraform import` succeeds
    pub imported: bool,
}

impl ResourceMapping {
    pub fn new(
        logical_id: impl Into<String>,
        physical_id: impl Into<String>,
        aws_type: impl Into<String>,
        terraform_type: impl Into<String>,
        module: Option<String>,
    ) -> Self {
        Self {
            logical_id: logical_id.into(),
            physical_id: physical_id.into(),
            aws_type: aws_type.into(),
            terraform_type: terraform_type.into(),
            module,
            imported: false,
        }
    }

    /// Address within the module that declares the resource
    pub fn address(&self) -> String {
        format!("{}.{}", self.terraform_type, self.logical_id)
    }

    /// Address as seen from the root module, used by `terraform import`
    pub fn import_address(&self) -> String {
        match &self.module {
            Some(module) => format!("{}.{}", module, self.address()),
            None => self.address(),
        }
    }

    /// How the resource is named in diagnostics
    pub fn aws_address(&self) -> String {
        format!("{} ({})", self.logical_id, self.aws_type)
    }
}
