use crate::config::{DocConfig, SectionConfig, SectionSource};
use crate::hierarchy::{Forest, HierarchyNode, NodeTarget};
use crate::search::{SearchCategory, SearchIndex};
use crate::symbols::{Entity, EntityId, EntityKind, Namespace, Parent, SymbolTable};
use crate::utils::LinkResolver;
use std::cmp::Ordering;

/// One entry of the navigation tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavNode {
    pub label: String,
    pub link: Option<String>,
    /// Script file holding the children; `None` renders them inline
    pub script: Option<String>,
    pub children: Vec<NavNode>,
    /// Symbol the link points at, for anchor collision checks
    pub identity: Option<String>,
    /// Further base types of a hierarchy node
    pub xrefs: Vec<String>,
}

impl NavNode {
    pub fn leaf(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: Some(link.into()),
            ..Self::default()
        }
    }

    fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Number of nodes in this subtree, this one included
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(&node.children);
        }
        total
    }
}

/// Everything the generated subtrees are derived from
pub struct NavInputs<'a> {
    pub table: &'a SymbolTable,
    pub forest: &'a Forest,
    pub search: &'a SearchIndex,
    pub links: &'a LinkResolver<'a>,
}

/// Navigation tree: the configured skeleton with generated subtrees attached
#[derive(Debug, Clone)]
pub struct NavTree {
    root: NavNode,
}

// Frees the tree without one stack frame per level
impl Drop for NavTree {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.root.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl NavTree {
    pub fn assemble(inputs: &NavInputs<'_>, config: &DocConfig) -> Self {
        let root = NavNode {
            label: config.project_name.clone(),
            link: Some(config.main_page.clone()),
            children: config
                .sections
                .iter()
                .map(|section| section_node(inputs, section))
                .collect(),
            ..NavNode::default()
        };
        Self { root }
    }

    pub fn root(&self) -> &NavNode {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    /// Nodes owning a script, pre-order; a script name shared by several
    /// nodes is reported once
    pub fn scripted(&self) -> Vec<&NavNode> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            if let Some(script) = &node.script {
                if seen.insert(script.as_str()) {
                    out.push(node);
                }
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

fn section_node(inputs: &NavInputs<'_>, section: &SectionConfig) -> NavNode {
    let mut node = NavNode {
        label: section.title.clone(),
        link: section.link.clone(),
        ..NavNode::default()
    };

    if let Some(source) = section.source {
        let generated = generate(inputs, source, section.link.as_deref());
        if !generated.is_empty() {
            node.script = Some(source.script_name());
        }
        node.children = generated;
    }

    node.children
        .extend(section.children.iter().map(|child| section_node(inputs, child)));
    node
}

fn generate(inputs: &NavInputs<'_>, source: SectionSource, link: Option<&str>) -> Vec<NavNode> {
    match source {
        SectionSource::ClassList => class_list(inputs),
        SectionSource::Hierarchy => hierarchy_nodes(inputs, inputs.forest.roots()),
        SectionSource::Namespaces => namespace_list(inputs),
        SectionSource::Concepts => concept_list(inputs),
        SectionSource::Files => file_list(inputs),
        SectionSource::Members { category } => member_letters(inputs, category, link),
    }
}

fn by_label(a: &NavNode, b: &NavNode) -> Ordering {
    a.label
        .to_lowercase()
        .cmp(&b.label.to_lowercase())
        .then_with(|| a.label.cmp(&b.label))
}

/// Row of an entity in the class list: links to its page, with the member
/// table as script
fn entity_row(inputs: &NavInputs<'_>, id: EntityId) -> NavNode {
    let entity = inputs.table.entity(id);
    let mut node = NavNode::leaf(&entity.name, inputs.links.entity_url(id))
        .with_identity(&entity.qualified_name);

    let children = member_table(inputs, entity);
    if !children.is_empty() {
        node.script = inputs.links.entity_page(id);
        node.children = children;
    }
    node
}

/// Nested types first, then the members in declaration order. Enums rendered
/// inside the page carry their enumerators as children.
fn member_table(inputs: &NavInputs<'_>, entity: &Entity) -> Vec<NavNode> {
    let mut rows: Vec<NavNode> = Vec::new();

    for &nested_id in inputs.table.nested(entity.id) {
        let nested = inputs.table.entity(nested_id);
        if nested.has_own_page() {
            rows.push(entity_row(inputs, nested_id));
        } else {
            let mut node = NavNode::leaf(&nested.name, inputs.links.entity_url(nested_id))
                .with_identity(&nested.qualified_name);
            node.children = member_rows(inputs, nested);
            rows.push(node);
        }
    }

    rows.extend(member_rows(inputs, entity));
    rows
}

fn member_rows(inputs: &NavInputs<'_>, entity: &Entity) -> Vec<NavNode> {
    entity
        .members
        .iter()
        .enumerate()
        .map(|(index, member)| {
            NavNode::leaf(&member.name, inputs.links.member_url(entity.id, index))
                .with_identity(LinkResolver::member_identity(entity, member))
        })
        .collect()
}

/// Namespace groups with their class rows, global types last
fn class_list(inputs: &NavInputs<'_>) -> Vec<NavNode> {
    let table = inputs.table;
    let mut out: Vec<NavNode> = child_namespaces(table, None)
        .into_iter()
        .filter_map(|ns| namespace_group(inputs, ns))
        .collect();

    let mut globals: Vec<NavNode> = table
        .top_level(None)
        .into_iter()
        .map(|id| entity_row(inputs, id))
        .collect();
    globals.sort_by(by_label);
    out.extend(globals);
    out
}

fn namespace_group(inputs: &NavInputs<'_>, ns: &Namespace) -> Option<NavNode> {
    let mut children: Vec<NavNode> = child_namespaces(inputs.table, Some(&ns.name))
        .into_iter()
        .filter_map(|child| namespace_group(inputs, child))
        .collect();

    let mut rows: Vec<NavNode> = inputs
        .table
        .top_level(Some(&ns.name))
        .into_iter()
        .map(|id| entity_row(inputs, id))
        .collect();
    rows.sort_by(by_label);
    children.extend(rows);

    if children.is_empty() {
        return None;
    }
    Some(NavNode {
        label: ns.short_name().to_string(),
        link: Some(inputs.links.namespace_url(&ns.name)),
        identity: Some(ns.name.clone()),
        children,
        ..NavNode::default()
    })
}

/// Every namespace with its nested namespaces and the types declared in it
fn namespace_list(inputs: &NavInputs<'_>) -> Vec<NavNode> {
    child_namespaces(inputs.table, None)
        .into_iter()
        .map(|ns| namespace_node(inputs, ns))
        .collect()
}

fn namespace_node(inputs: &NavInputs<'_>, ns: &Namespace) -> NavNode {
    let mut children: Vec<NavNode> = child_namespaces(inputs.table, Some(&ns.name))
        .into_iter()
        .map(|child| namespace_node(inputs, child))
        .collect();

    let mut rows: Vec<NavNode> = inputs
        .table
        .top_level(Some(&ns.name))
        .into_iter()
        .map(|id| {
            let entity = inputs.table.entity(id);
            NavNode::leaf(&entity.name, inputs.links.entity_url(id)).with_identity(&entity.qualified_name)
        })
        .collect();
    rows.sort_by(by_label);
    children.extend(rows);

    NavNode {
        label: ns.short_name().to_string(),
        link: Some(inputs.links.namespace_url(&ns.name)),
        identity: Some(ns.name.clone()),
        children,
        ..NavNode::default()
    }
}

/// Namespaces directly inside `parent` (`None` = global), sorted
fn child_namespaces<'t>(table: &'t SymbolTable, parent: Option<&str>) -> Vec<&'t Namespace> {
    table
        .namespaces()
        .iter()
        .filter(|ns| ns.parent().as_deref() == parent)
        .collect()
}

/// Hierarchy rows, converted bottom-up so deep base chains need no recursion
fn hierarchy_nodes(inputs: &NavInputs<'_>, roots: &[HierarchyNode]) -> Vec<NavNode> {
    enum Step<'a> {
        Enter(&'a HierarchyNode),
        Exit(&'a HierarchyNode),
    }

    let mut steps: Vec<Step<'_>> = roots.iter().rev().map(Step::Enter).collect();
    let mut built: Vec<NavNode> = Vec::new();

    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(node) => {
                steps.push(Step::Exit(node));
                steps.extend(node.children.iter().rev().map(Step::Enter));
            }
            Step::Exit(node) => {
                let children = built.split_off(built.len().saturating_sub(node.children.len()));
                built.push(hierarchy_row(inputs, node, children));
            }
        }
    }
    built
}

fn hierarchy_row(inputs: &NavInputs<'_>, node: &HierarchyNode, children: Vec<NavNode>) -> NavNode {
    let (link, identity) = match node.target {
        NodeTarget::Entity(id) => (
            inputs.links.entity_url(id),
            Some(inputs.table.entity(id).qualified_name.clone()),
        ),
        NodeTarget::Instantiation { template } => (inputs.links.entity_url(template), None),
    };

    NavNode {
        label: node.label.clone(),
        link: Some(link),
        children,
        identity,
        xrefs: node.also_derives.clone(),
        ..NavNode::default()
    }
}

fn concept_list(inputs: &NavInputs<'_>) -> Vec<NavNode> {
    let mut rows: Vec<NavNode> = inputs
        .table
        .entities()
        .iter()
        .filter(|e| e.kind == EntityKind::Concept)
        .map(|e| {
            NavNode::leaf(&e.qualified_name, inputs.links.entity_url(e.id)).with_identity(&e.qualified_name)
        })
        .collect();
    rows.sort_by(by_label);
    rows
}

/// Header files with the types they declare
fn file_list(inputs: &NavInputs<'_>) -> Vec<NavNode> {
    let table = inputs.table;
    table
        .files()
        .into_iter()
        .map(|file| {
            let mut children: Vec<NavNode> = table
                .entities()
                .iter()
                .filter(|e| e.file.as_deref() == Some(file) && !matches!(e.parent, Parent::Entity(_)))
                .map(|e| {
                    NavNode::leaf(&e.qualified_name, inputs.links.entity_url(e.id))
                        .with_identity(&e.qualified_name)
                })
                .collect();
            children.sort_by(by_label);

            NavNode {
                label: file.to_string(),
                link: Some(inputs.links.file_url(file)),
                identity: Some(file.to_string()),
                children,
                ..NavNode::default()
            }
        })
        .collect()
}

/// `a`, `b`, ... entries pointing at the letter sections of a member index page
fn member_letters(inputs: &NavInputs<'_>, category: SearchCategory, link: Option<&str>) -> Vec<NavNode> {
    let page = link.unwrap_or("functions.html");
    let page = page.split('#').next().unwrap_or(page);

    inputs
        .search
        .member_letters(category)
        .into_iter()
        .map(|c| NavNode::leaf(c.to_string(), format!("{}#index_{}", page, c)))
        .collect()
}
