//! Class hierarchy forest for display.
//!
//! Every entity is placed exactly once: under its first resolved base, or as
//! a root when it has none. Further bases are kept as cross-reference labels
//! instead of duplicating the subtree. Bases that are template
//! instantiations get one node per distinct instantiation below the
//! template, so a mixin applied to several types shows each application.
//!
//! Cycles in base chains are found before any tree is built, with an
//! iterative walk over primary-parent links; one entity per cycle is
//! detached and becomes a root.

use crate::error::IndexError;
use crate::symbols::{BaseRef, EntityId, SymbolTable, lookup_key};
use indexmap::IndexMap;
use tracing::warn;

/// What a hierarchy node links to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTarget {
    Entity(EntityId),
    /// A concrete instantiation of the given template
    Instantiation { template: EntityId },
}

#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub label: String,
    pub target: NodeTarget,
    pub children: Vec<HierarchyNode>,
    /// Secondary bases, listed by name
    pub also_derives: Vec<String>,
}

// Deep base chains would otherwise be freed one stack frame per level
impl Drop for HierarchyNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[derive(Debug, Default)]
pub struct Forest {
    roots: Vec<HierarchyNode>,
    detached: Vec<EntityId>,
    diagnostics: Vec<IndexError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnPath,
    Done,
}

/// Parent edges of the forest, after cycles have been cut
struct Links<'a> {
    table: &'a SymbolTable,
    children: Vec<Vec<EntityId>>,
    instantiations: Vec<IndexMap<String, (String, Vec<EntityId>)>>,
    detached: Vec<bool>,
}

impl Forest {
    pub fn build(table: &SymbolTable) -> Self {
        let count = table.len();
        let primary: Vec<Option<&BaseRef>> =
            table.entities().iter().map(|e| e.bases.first()).collect();

        let mut detached = vec![false; count];
        let mut diagnostics = Vec::new();
        let mut state = vec![Visit::New; count];

        for start in 0..count {
            if state[start] != Visit::New {
                continue;
            }

            let mut path: Vec<usize> = Vec::new();
            let mut current = start;
            loop {
                match state[current] {
                    Visit::Done => break,
                    Visit::OnPath => {
                        let pos = path.iter().position(|&p| p == current).unwrap_or(0);
                        let cycle = &path[pos..];
                        let victim_pos = cycle
                            .iter()
                            .enumerate()
                            .min_by_key(|&(_, &id)| id)
                            .map(|(i, _)| i)
                            .unwrap_or(0);
                        let victim = cycle[victim_pos];
                        detached[victim] = true;

                        let mut chain: Vec<String> = cycle[victim_pos..]
                            .iter()
                            .chain(&cycle[..victim_pos])
                            .map(|&id| table.entity(id as EntityId).qualified_name.clone())
                            .collect();
                        chain.push(table.entity(victim as EntityId).qualified_name.clone());

                        let err = IndexError::CyclicHierarchy {
                            name: table.entity(victim as EntityId).qualified_name.clone(),
                            chain,
                        };
                        warn!("{}; detaching as a root", err);
                        diagnostics.push(err);
                        break;
                    }
                    Visit::New => {
                        state[current] = Visit::OnPath;
                        path.push(current);
                        match primary[current] {
                            Some(base) => current = base.target() as usize,
                            None => break,
                        }
                    }
                }
            }

            for id in path {
                state[id] = Visit::Done;
            }
        }

        let mut links = Links {
            table,
            children: vec![Vec::new(); count],
            instantiations: vec![IndexMap::new(); count],
            detached,
        };

        let mut root_ids = Vec::new();
        for entity in table.entities() {
            let idx = entity.id as usize;
            let parent = if links.detached[idx] { None } else { primary[idx] };
            match parent {
                None => root_ids.push(entity.id),
                Some(BaseRef::Entity(base)) => links.children[*base as usize].push(entity.id),
                Some(BaseRef::Instantiation { template, label }) => {
                    links.instantiations[*template as usize]
                        .entry(lookup_key(label))
                        .or_insert_with(|| (label.clone(), Vec::new()))
                        .1
                        .push(entity.id);
                }
            }
        }

        let roots = links.build_nodes(&root_ids);

        let detached = links
            .detached
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d)
            .map(|(i, _)| i as EntityId)
            .collect();

        Self {
            roots,
            detached,
            diagnostics,
        }
    }

    pub fn roots(&self) -> &[HierarchyNode] {
        &self.roots
    }

    /// Entities cut out of a cycle
    pub fn detached(&self) -> &[EntityId] {
        &self.detached
    }

    pub fn diagnostics(&self) -> &[IndexError] {
        &self.diagnostics
    }

    /// All nodes in pre-order with their depth
    pub fn walk(&self) -> Vec<(usize, &HierarchyNode)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, &HierarchyNode)> =
            self.roots.iter().rev().map(|n| (0, n)).collect();

        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        }
        out
    }

    /// How many nodes point at `id` as an entity
    pub fn occurrences(&self, id: EntityId) -> usize {
        self.walk()
            .iter()
            .filter(|(_, n)| n.target == NodeTarget::Entity(id))
            .count()
    }

    /// Labels from a root down to the node of `id`
    pub fn path_to(&self, id: EntityId) -> Option<Vec<&str>> {
        let mut path: Vec<&str> = Vec::new();
        for (depth, node) in self.walk() {
            path.truncate(depth);
            path.push(&node.label);
            if node.target == NodeTarget::Entity(id) {
                return Some(path);
            }
        }
        None
    }

    pub fn max_depth(&self) -> usize {
        self.walk().iter().map(|(d, _)| d + 1).max().unwrap_or(0)
    }
}

impl Links<'_> {
    /// Subtrees of `roots`, built bottom-up with an explicit stack; the
    /// edges are acyclic at this point
    fn build_nodes(&self, roots: &[EntityId]) -> Vec<HierarchyNode> {
        enum Step {
            Enter(EntityId),
            Entity(EntityId),
            Instantiation { template: EntityId, index: usize },
        }

        let mut steps: Vec<Step> = roots.iter().map(|&id| Step::Enter(id)).collect();
        let mut built: Vec<HierarchyNode> = Vec::new();

        while let Some(step) = steps.pop() {
            match step {
                Step::Enter(id) => {
                    let idx = id as usize;
                    steps.push(Step::Entity(id));
                    for (index, (_, derived)) in self.instantiations[idx].values().enumerate() {
                        steps.push(Step::Instantiation { template: id, index });
                        steps.extend(derived.iter().map(|&child| Step::Enter(child)));
                    }
                    steps.extend(self.children[idx].iter().map(|&child| Step::Enter(child)));
                }
                Step::Instantiation { template, index } => {
                    let Some((label, derived)) = self.instantiations[template as usize]
                        .get_index(index)
                        .map(|(_, group)| group)
                    else {
                        continue;
                    };
                    let children = take_children(&mut built, derived.len());
                    built.push(HierarchyNode {
                        label: label.clone(),
                        target: NodeTarget::Instantiation { template },
                        children,
                        also_derives: Vec::new(),
                    });
                }
                Step::Entity(id) => {
                    let idx = id as usize;
                    let count = self.children[idx].len() + self.instantiations[idx].len();
                    let children = take_children(&mut built, count);
                    built.push(self.entity_node(id, children));
                }
            }
        }

        sort_nodes(&mut built);
        built
    }

    fn entity_node(&self, id: EntityId, children: Vec<HierarchyNode>) -> HierarchyNode {
        let entity = self.table.entity(id);
        let skip = if self.detached[id as usize] { 0 } else { 1 };
        let also_derives = entity
            .bases
            .iter()
            .skip(skip)
            .map(|base| match base {
                BaseRef::Entity(other) => self.table.entity(*other).qualified_name.clone(),
                BaseRef::Instantiation { label, .. } => label.clone(),
            })
            .collect();

        HierarchyNode {
            label: entity.qualified_name.clone(),
            target: NodeTarget::Entity(id),
            children,
            also_derives,
        }
    }
}

/// The last `count` finished nodes, sorted for display
fn take_children(built: &mut Vec<HierarchyNode>, count: usize) -> Vec<HierarchyNode> {
    let mut children = built.split_off(built.len().saturating_sub(count));
    sort_nodes(&mut children);
    children
}

fn sort_nodes(nodes: &mut [HierarchyNode]) {
    nodes.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.label.cmp(&b.label))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{Declaration, EntityKind, NamespaceDecl, SymbolFile};

    fn decl(name: &str, bases: &[&str]) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind: EntityKind::Struct,
            scope: Some("dxfcpp".to_string()),
            bases: bases.iter().map(|b| b.to_string()).collect(),
            members: Vec::new(),
            file: None,
            brief: None,
            anchor: None,
        }
    }

    fn table(declarations: Vec<Declaration>) -> SymbolTable {
        SymbolTable::ingest([SymbolFile {
            namespaces: vec![NamespaceDecl { name: "dxfcpp".to_string(), brief: None }],
            declarations,
        }])
    }

    fn id(table: &SymbolTable, name: &str) -> EntityId {
        table.lookup(name).unwrap().id
    }

    #[test]
    fn test_base_chain() {
        let table = table(vec![
            decl("DXEndpoint", &["SharedEntity"]),
            decl("SharedEntity", &["Entity"]),
            decl("Entity", &[]),
        ]);
        let forest = Forest::build(&table);

        assert_eq!(forest.roots().len(), 1);
        assert_eq!(
            forest.path_to(id(&table, "dxfcpp::DXEndpoint")).unwrap(),
            vec!["dxfcpp::Entity", "dxfcpp::SharedEntity", "dxfcpp::DXEndpoint"]
        );
        assert_eq!(forest.max_depth(), 3);
    }

    #[test]
    fn test_roots_appear_once() {
        let table = table(vec![decl("Quote", &[]), decl("AuthToken", &[]), decl("Trade", &[])]);
        let forest = Forest::build(&table);

        let labels: Vec<_> = forest.roots().iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["dxfcpp::AuthToken", "dxfcpp::Quote", "dxfcpp::Trade"]);
        for entity in table.entities() {
            assert_eq!(forest.occurrences(entity.id), 1);
        }
    }

    #[test]
    fn test_multiple_bases_use_first() {
        let table = table(vec![
            decl("EventType", &[]),
            decl("Lasting", &[]),
            decl("Quote", &["EventType", "Lasting"]),
        ]);
        let forest = Forest::build(&table);
        let quote = id(&table, "dxfcpp::Quote");

        assert_eq!(forest.occurrences(quote), 1);
        assert_eq!(
            forest.path_to(quote).unwrap(),
            vec!["dxfcpp::EventType", "dxfcpp::Quote"]
        );
        let node = forest
            .walk()
            .into_iter()
            .find(|(_, n)| n.target == NodeTarget::Entity(quote))
            .unwrap()
            .1;
        assert_eq!(node.also_derives, vec!["dxfcpp::Lasting".to_string()]);
    }

    #[test]
    fn test_instantiations_get_distinct_nodes() {
        let table = table(vec![
            decl("CommonPromiseMixin< P >", &[]),
            decl("Promise< void >", &["CommonPromiseMixin< Promise< void > >"]),
            decl(
                "Promise< std::shared_ptr< E > >",
                &["CommonPromiseMixin< Promise< std::shared_ptr< E > > >"],
            ),
        ]);
        let forest = Forest::build(&table);
        let mixin = id(&table, "dxfcpp::CommonPromiseMixin< P >");

        assert_eq!(forest.roots().len(), 1);
        let root = &forest.roots()[0];
        assert_eq!(root.target, NodeTarget::Entity(mixin));

        let labels: Vec<_> = root.children.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "CommonPromiseMixin< Promise< std::shared_ptr< E > > >",
                "CommonPromiseMixin< Promise< void > >",
            ]
        );
        for child in &root.children {
            assert_eq!(child.target, NodeTarget::Instantiation { template: mixin });
            assert_eq!(child.children.len(), 1);
        }
    }

    #[test]
    fn test_same_instantiation_shares_node() {
        let table = table(vec![
            decl("Mixin< T >", &[]),
            decl("A", &["Mixin< int >"]),
            decl("B", &["Mixin<int>"]),
        ]);
        let forest = Forest::build(&table);
        let root = &forest.roots()[0];
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children.len(), 2);
    }

    #[test]
    fn test_deep_base_chain() {
        let depth = 20_000;
        let declarations = (0..depth)
            .map(|i| {
                let name = format!("Level{}", i);
                let base = format!("Level{}", i.max(1) - 1);
                if i == 0 { decl(&name, &[]) } else { decl(&name, &[base.as_str()]) }
            })
            .collect();
        let table = table(declarations);
        let forest = Forest::build(&table);

        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.max_depth(), depth);
        assert!(forest.diagnostics().is_empty());
        let last = id(&table, &format!("dxfcpp::Level{}", depth - 1));
        assert_eq!(forest.path_to(last).unwrap().len(), depth);
    }

    #[test]
    fn test_cycle_is_detached() {
        let table = table(vec![decl("A", &["B"]), decl("B", &["C"]), decl("C", &["A"])]);
        let forest = Forest::build(&table);

        assert_eq!(forest.detached(), &[id(&table, "dxfcpp::A")]);
        assert_eq!(forest.diagnostics().len(), 1);
        match &forest.diagnostics()[0] {
            IndexError::CyclicHierarchy { name, chain } => {
                assert_eq!(name, "dxfcpp::A");
                assert_eq!(chain.len(), 4);
            }
            other => panic!("unexpected diagnostic: {other}"),
        }

        // A is a root; C hangs below A, B below C
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(
            forest.path_to(id(&table, "dxfcpp::B")).unwrap(),
            vec!["dxfcpp::A", "dxfcpp::C", "dxfcpp::B"]
        );
        for entity in table.entities() {
            assert_eq!(forest.occurrences(entity.id), 1);
        }
    }

    #[test]
    fn test_self_reference() {
        let table = table(vec![decl("Loop", &["Loop"]), decl("Other", &[])]);
        let forest = Forest::build(&table);

        assert_eq!(forest.detached().len(), 1);
        assert_eq!(forest.roots().len(), 2);
        assert_eq!(forest.diagnostics()[0].qualified_name(), "dxfcpp::Loop");
    }
}
