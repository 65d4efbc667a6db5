use std::collections::BTreeMap;
use std::path::PathBuf;

use super::mapping::ResourceMapping;
use crate::cloudformation::CloudFormationStack;
use crate::hcl::InputVariable;

/// Index of a module in its [`ModuleTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

/// One CloudFormation stack and the Terraform module generated for it
#[derive(Debug)]
pub struct ModuleInfo {
    /// Stack name of a nested stack; `None` for the root module
    pub name: Option<String>,
    /// Logical id of the stack resource that creates this stack in its parent
    pub logical_id: Option<String>,
    pub directory: PathBuf,
    pub stack: CloudFormationStack,
    pub mappings: Vec<ResourceMapping>,
    pub inputs: Vec<InputVariable>,
    pub imported: bool,
    children: Vec<ModuleId>,
    parent: Option<ModuleId>,
}

impl ModuleInfo {
    pub fn root(directory: PathBuf, stack: CloudFormationStack) -> Self {
        Self {
            name: None,
            logical_id: None,
            directory,
            stack,
            mappings: Vec::new(),
            inputs: Vec::new(),
            imported: false,
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn nested(logical_id: &str, directory: PathBuf, stack: CloudFormationStack) -> Self {
        Self {
            name: Some(stack.name.clone()),
            logical_id: Some(logical_id.to_string()),
            ..Self::root(directory, stack)
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn friendly_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<ROOT>")
    }

    /// Logical id → Terraform type of every resource imported so far
    ///
    /// Only these end up in the final configuration, so only these may be
    /// referenced.
    pub fn imported_types(&self) -> BTreeMap<String, String> {
        self.mappings
            .iter()
            .filter(|m| m.imported)
            .map(|m| (m.logical_id.clone(), m.terraform_type.clone()))
            .collect()
    }
}

/// Arena of modules; parents own children through ids and children only
/// hold their parent's id
#[derive(Debug)]
pub struct ModuleTree {
    modules: Vec<ModuleInfo>,
}

impl ModuleTree {
    pub fn new(root: ModuleInfo) -> Self {
        Self {
            modules: vec![ModuleInfo {
                parent: None,
                children: Vec::new(),
                ..root
            }],
        }
    }

    pub fn root(&self) -> ModuleId {
        ModuleId(0)
    }

    pub fn add_child(&mut self, parent: ModuleId, child: ModuleInfo) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(ModuleInfo {
            parent: Some(parent),
            children: Vec::new(),
            ..child
        });
        self.modules[parent.0].children.push(id);
        id
    }

    pub fn get(&self, id: ModuleId) -> &ModuleInfo {
        &self.modules[id.0]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut ModuleInfo {
        &mut self.modules[id.0]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn parent(&self, id: ModuleId) -> Option<ModuleId> {
        self.get(id).parent
    }

    pub fn children(&self, id: ModuleId) -> &[ModuleId] {
        &self.get(id).children
    }

    /// Enclosing modules, nearest first
    pub fn ancestors(&self, id: ModuleId) -> Vec<ModuleId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(id);

        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.parent(parent);
        }

        ancestors
    }

    /// Every module, children before their parent
    pub fn post_order(&self) -> Vec<ModuleId> {
        let mut order = Vec::with_capacity(self.modules.len());
        self.visit_post_order(self.root(), &mut order);
        order
    }

    fn visit_post_order(&self, id: ModuleId, order: &mut Vec<ModuleId>) {
        for &child in self.children(id) {
            self.visit_post_order(child, order);
        }
        order.push(id);
    }

    /// Path of a module from the root (`module.a.module.b`); `None` for the root
    pub fn module_path(&self, id: ModuleId) -> Option<String> {
        let mut names: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|m| self.get(m).name.as_deref())
            .collect();

        if names.is_empty() {
            return None;
        }

        names.reverse();
        Some(
            names
                .iter()
                .map(|name| format!("module.{}", name))
                .collect::<Vec<_>>()
                .join("."),
        )
    }

    /// `source` of a child's module block, relative to its parent's directory
    ///
    /// All nested modules share one directory level, so the root reaches them
    /// under the modules directory and nested modules reach their siblings.
    pub fn source(&self, child: ModuleId, modules_directory: &str) -> String {
        let name = self.get(child).friendly_name();

        match self.parent(child) {
            Some(parent) if self.get(parent).is_root() => format!("./{}/{}", modules_directory, name),
            _ => format!("../{}", name),
        }
    }

    /// Logical id of each nested stack resource → module name
    pub fn child_modules(&self, id: ModuleId) -> BTreeMap<String, String> {
        self.children(id)
            .iter()
            .filter_map(|&child| {
                let module = self.get(child);
                Some((module.logical_id.clone()?, module.name.clone()?))
            })
            .collect()
    }

    pub fn find_by_logical_id(&self, parent: ModuleId, logical_id: &str) -> Option<ModuleId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.get(child).logical_id.as_deref() == Some(logical_id))
    }

    /// Every mapping in the tree, in module post-order
    pub fn all_mappings(&self) -> Vec<&ResourceMapping> {
        self.post_order()
            .into_iter()
            .flat_map(|id| self.get(id).mappings.iter())
            .collect()
    }
}
