use serde::{Deserialize, Serialize};

/// Index of an entity in the symbol table (declaration order)
pub type EntityId = u32;

/// Kind of a documented type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Class,
    Struct,
    Union,
    Enum,
    Concept,
}

impl EntityKind {
    /// Prefix used for the generated page name
    pub fn page_prefix(&self) -> &'static str {
        match self {
            EntityKind::Class => "class",
            EntityKind::Struct => "struct",
            EntityKind::Union => "union",
            EntityKind::Enum => "enum",
            EntityKind::Concept => "concept",
        }
    }
}

/// Kind of an entity member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Function,
    Variable,
    Typedef,
    Enumerator,
}

/// A symbol-table document as produced by the header parser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolFile {
    #[serde(default)]
    pub namespaces: Vec<NamespaceDecl>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceDecl {
    /// Fully qualified namespace name (`dxfcpp::detail`)
    pub name: String,
    #[serde(default)]
    pub brief: Option<String>,
}

/// One parsed type declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    /// Unqualified name, template arguments included (`Promise< void >`)
    pub name: String,
    pub kind: EntityKind,
    /// Qualified enclosing scope: a namespace or another declaration
    #[serde(default)]
    pub scope: Option<String>,
    /// Base-type references in declaration order
    #[serde(default)]
    pub bases: Vec<String>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    /// Header the declaration lives in
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub brief: Option<String>,
    /// Pinned anchor, overrides the generated one
    #[serde(default)]
    pub anchor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    pub kind: MemberKind,
    /// Opaque signature text (`(const std::string &address)`)
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub anchor: Option<String>,
}

/// Where an entity is declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    Global,
    Namespace(String),
    Entity(EntityId),
}

/// A resolved base-type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseRef {
    /// A documented entity
    Entity(EntityId),
    /// A concrete instantiation of a documented template
    Instantiation { template: EntityId, label: String },
}

impl BaseRef {
    /// Entity the hierarchy hangs the derived type under
    pub fn target(&self) -> EntityId {
        match self {
            BaseRef::Entity(id) => *id,
            BaseRef::Instantiation { template, .. } => *template,
        }
    }
}

/// A documented type in the immutable graph
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub qualified_name: String,
    pub kind: EntityKind,
    pub parent: Parent,
    pub bases: Vec<BaseRef>,
    pub members: Vec<Member>,
    pub file: Option<String>,
    pub brief: Option<String>,
    pub anchor: Option<String>,
}

impl Entity {
    /// Nested enums are rendered inside their owner's page
    pub fn has_own_page(&self) -> bool {
        !(self.kind == EntityKind::Enum && matches!(self.parent, Parent::Entity(_)))
    }

    /// Members sharing `name`, in declaration order
    pub fn overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Member> + 'a {
        self.members.iter().filter(move |m| m.name == name)
    }

    pub fn is_overloaded(&self, name: &str) -> bool {
        self.overloads(name).nth(1).is_some()
    }
}

/// A function, field, typedef or enumerator owned by one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub kind: MemberKind,
    pub signature: String,
    pub anchor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    pub brief: Option<String>,
}

impl Namespace {
    /// Last path segment
    pub fn short_name(&self) -> &str {
        split_scope(&self.name).last().copied().unwrap_or(&self.name)
    }

    pub fn parent(&self) -> Option<String> {
        let parts = split_scope(&self.name);
        if parts.len() > 1 {
            Some(parts[..parts.len() - 1].join("::"))
        } else {
            None
        }
    }
}

/// Whitespace-insensitive key used for every name comparison
pub fn lookup_key(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Join a scope and an unqualified name
pub fn qualify(scope: Option<&str>, name: &str) -> String {
    match scope.map(str::trim).filter(|s| !s.is_empty()) {
        Some(scope) => format!("{}::{}", scope.trim_start_matches("::"), name.trim()),
        None => name.trim().to_string(),
    }
}

/// Split a qualified name on `::` outside of template argument lists
pub fn split_scope(name: &str) -> Vec<&str> {
    let bytes = name.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                let part = name[start..i].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                i += 2;
                start = i;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    let tail = name[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

/// Template name without its argument list (`Promise< void >` -> `Promise`)
pub fn template_base(name: &str) -> Option<&str> {
    let idx = name.find('<')?;
    let base = name[..idx].trim();
    if base.is_empty() || base.ends_with("operator") {
        None
    } else {
        Some(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scope_respects_templates() {
        assert_eq!(split_scope("dxfcpp::DXEndpoint"), vec!["dxfcpp", "DXEndpoint"]);
        assert_eq!(
            split_scope("ns::Promise< std::shared_ptr< E > >"),
            vec!["ns", "Promise< std::shared_ptr< E > >"]
        );
        assert_eq!(split_scope("::Global"), vec!["Global"]);
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify(Some("dxfcpp"), "DXEndpoint"), "dxfcpp::DXEndpoint");
        assert_eq!(qualify(None, "AuthToken"), "AuthToken");
        assert_eq!(qualify(Some("  "), "AuthToken"), "AuthToken");
    }

    #[test]
    fn test_lookup_key_ignores_spacing() {
        assert_eq!(lookup_key("Promise< void >"), lookup_key("Promise<void>"));
    }

    #[test]
    fn test_template_base() {
        assert_eq!(template_base("CommonPromiseMixin< Promise< void > >"), Some("CommonPromiseMixin"));
        assert_eq!(template_base("DXEndpoint"), None);
        assert_eq!(template_base("operator<"), None);
    }

    #[test]
    fn test_namespace_parent() {
        let ns = Namespace { name: "dxfcpp::detail".to_string(), brief: None };
        assert_eq!(ns.short_name(), "detail");
        assert_eq!(ns.parent().as_deref(), Some("dxfcpp"));
    }

    #[test]
    fn test_declaration_defaults() {
        let decl: Declaration =
            serde_json::from_str(r#"{"name": "AuthToken", "kind": "struct"}"#).unwrap();
        assert!(decl.scope.is_none());
        assert!(decl.bases.is_empty());
        assert!(decl.members.is_empty());
    }
}
