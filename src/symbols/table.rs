use crate::error::{IndexError, ReferenceKind};
use crate::symbols::types::*;
use regex::Regex;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

/// Declaration collected during the first pass, before scopes are resolved
struct Pending {
    name: String,
    qualified_name: String,
    kind: EntityKind,
    scope: Option<String>,
    bases: Vec<String>,
    members: Vec<Member>,
    file: Option<String>,
    brief: Option<String>,
    anchor: Option<String>,
}

enum PendingParent {
    Global,
    Namespace(String),
    Pending(usize),
    Missing,
}

/// Immutable Entity/Member graph built in one batch from parsed declarations
#[derive(Debug, Default)]
pub struct SymbolTable {
    entities: Vec<Entity>,
    namespaces: Vec<Namespace>,
    by_key: FxHashMap<String, EntityId>,
    /// Qualified template base name -> first documented template with that name
    templates: FxHashMap<String, EntityId>,
    nested: Vec<Vec<EntityId>>,
    diagnostics: Vec<IndexError>,
}

impl SymbolTable {
    /// Build the graph from one or more symbol-table documents.
    ///
    /// Declarations with an unknown parent scope are logged and skipped
    /// (together with anything nested in them); unknown bases are dropped
    /// from their entity. Both are kept as diagnostics.
    pub fn ingest<I>(files: I) -> Self
    where
        I: IntoIterator<Item = SymbolFile>,
    {
        let mut namespaces: BTreeMap<String, Namespace> = BTreeMap::new();
        let mut pending: Vec<Pending> = Vec::new();
        let mut pending_by_key: FxHashMap<String, usize> = FxHashMap::default();

        for file in files {
            for ns in file.namespaces {
                register_namespace(&mut namespaces, &ns.name, ns.brief);
            }

            for decl in file.declarations {
                if decl.name.trim().is_empty() {
                    warn!(scope = ?decl.scope, "skipping declaration without a name");
                    continue;
                }

                let qualified_name = qualify(decl.scope.as_deref(), &decl.name);
                let key = lookup_key(&qualified_name);

                if let Some(&idx) = pending_by_key.get(&key) {
                    merge_declaration(&mut pending[idx], decl);
                    continue;
                }

                let mut members = Vec::with_capacity(decl.members.len());
                for member in decl.members {
                    push_member(&mut members, member, &qualified_name);
                }

                pending_by_key.insert(key, pending.len());
                pending.push(Pending {
                    name: decl.name.trim().to_string(),
                    qualified_name,
                    kind: decl.kind,
                    scope: decl.scope,
                    bases: decl.bases,
                    members,
                    file: decl.file,
                    brief: decl.brief,
                    anchor: decl.anchor,
                });
            }
        }

        let mut diagnostics = Vec::new();

        // Resolve parent scopes, then drop orphans and everything nested in them
        let parents: Vec<PendingParent> = pending
            .iter()
            .map(|p| {
                let scope = match p.scope.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    Some(scope) => scope.trim_start_matches("::"),
                    None => return PendingParent::Global,
                };
                let key = lookup_key(scope);
                if let Some(ns) = namespaces.get(&key) {
                    PendingParent::Namespace(ns.name.clone())
                } else if let Some(&idx) = pending_by_key.get(&key) {
                    PendingParent::Pending(idx)
                } else {
                    PendingParent::Missing
                }
            })
            .collect();

        let mut alive: Vec<Option<bool>> = vec![None; pending.len()];
        for start in 0..pending.len() {
            let mut chain = Vec::new();
            let mut cur = start;
            let verdict = loop {
                if let Some(known) = alive[cur] {
                    break known;
                }
                chain.push(cur);
                match &parents[cur] {
                    PendingParent::Global | PendingParent::Namespace(_) => break true,
                    PendingParent::Missing => break false,
                    PendingParent::Pending(parent) => cur = *parent,
                }
            };
            for idx in chain {
                alive[idx] = Some(verdict);
            }
        }

        let mut new_ids: Vec<Option<EntityId>> = vec![None; pending.len()];
        let mut next: EntityId = 0;
        for (idx, p) in pending.iter().enumerate() {
            if alive[idx] == Some(true) {
                new_ids[idx] = Some(next);
                next += 1;
            } else {
                let err = IndexError::MalformedSymbol {
                    name: p.qualified_name.clone(),
                    reference: p.scope.clone().unwrap_or_default(),
                    kind: ReferenceKind::Scope,
                };
                warn!("{}; skipping", err);
                diagnostics.push(err);
            }
        }

        let mut table = SymbolTable {
            namespaces: namespaces.into_values().collect(),
            diagnostics,
            ..Default::default()
        };

        let mut raw_bases = Vec::with_capacity(next as usize);
        for (idx, p) in pending.into_iter().enumerate() {
            let Some(id) = new_ids[idx] else { continue };
            let parent = match &parents[idx] {
                PendingParent::Namespace(name) => Parent::Namespace(name.clone()),
                PendingParent::Pending(parent) => match new_ids[*parent] {
                    Some(parent_id) => Parent::Entity(parent_id),
                    None => Parent::Global,
                },
                PendingParent::Global | PendingParent::Missing => Parent::Global,
            };

            table.by_key.insert(lookup_key(&p.qualified_name), id);
            if let Some(base) = template_base(&p.name) {
                let scope = enclosing_scope(&p.qualified_name);
                let template_key = lookup_key(&qualify(scope.as_deref(), base));
                table.templates.entry(template_key).or_insert(id);
            }

            raw_bases.push(p.bases);
            table.entities.push(Entity {
                id,
                name: p.name,
                qualified_name: p.qualified_name,
                kind: p.kind,
                parent,
                bases: Vec::new(),
                members: p.members,
                file: p.file,
                brief: p.brief,
                anchor: p.anchor,
            });
        }

        table.nested = vec![Vec::new(); table.entities.len()];
        for entity in &table.entities {
            if let Parent::Entity(parent) = entity.parent {
                table.nested[parent as usize].push(entity.id);
            }
        }

        // Resolve base references now that every surviving entity is known
        for (idx, bases) in raw_bases.into_iter().enumerate() {
            let scope = enclosing_scope(&table.entities[idx].qualified_name);
            let mut resolved: Vec<BaseRef> = Vec::with_capacity(bases.len());

            for reference in bases {
                match table.resolve_base(scope.as_deref(), &reference) {
                    Some(base) => {
                        if !resolved.contains(&base) {
                            resolved.push(base);
                        }
                    }
                    None => {
                        let err = IndexError::MalformedSymbol {
                            name: table.entities[idx].qualified_name.clone(),
                            reference: reference.trim().to_string(),
                            kind: ReferenceKind::Base,
                        };
                        warn!("{}; dropping base", err);
                        table.diagnostics.push(err);
                    }
                }
            }

            table.entities[idx].bases = resolved;
        }

        debug!(
            entities = table.entities.len(),
            namespaces = table.namespaces.len(),
            diagnostics = table.diagnostics.len(),
            "symbol table ingested"
        );

        table
    }

    /// Resolve a base reference from within `scope`, innermost scope first
    fn resolve_base(&self, scope: Option<&str>, reference: &str) -> Option<BaseRef> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        for key in candidate_keys(scope, reference) {
            if let Some(&id) = self.by_key.get(&key) {
                return Some(BaseRef::Entity(id));
            }
        }

        let base = template_base(reference)?;
        for key in candidate_keys(scope, base) {
            if let Some(&id) = self.templates.get(&key).or_else(|| self.by_key.get(&key)) {
                return Some(BaseRef::Instantiation {
                    template: id,
                    label: normalize_label(reference),
                });
            }
        }

        None
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entity by id. Ids handed out by this table are always valid.
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id as usize]
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id as usize)
    }

    /// Find an entity by qualified name (whitespace-insensitive)
    pub fn lookup(&self, qualified_name: &str) -> Option<&Entity> {
        let key = lookup_key(qualified_name.trim_start_matches("::"));
        self.by_key.get(&key).map(|&id| self.entity(id))
    }

    /// Declared namespaces, sorted by name
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Types declared directly inside `id`, in declaration order
    pub fn nested(&self, id: EntityId) -> &[EntityId] {
        self.nested.get(id as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entities declared directly in a namespace (`None` = global scope)
    pub fn top_level(&self, namespace: Option<&str>) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|e| match (&e.parent, namespace) {
                (Parent::Global, None) => true,
                (Parent::Namespace(ns), Some(wanted)) => ns == wanted,
                _ => false,
            })
            .map(|e| e.id)
            .collect()
    }

    /// Label of the scope an entity is declared in
    pub fn scope_label(&self, id: EntityId) -> String {
        match &self.entity(id).parent {
            Parent::Global => String::new(),
            Parent::Namespace(ns) => ns.clone(),
            Parent::Entity(parent) => self.entity(*parent).qualified_name.clone(),
        }
    }

    /// Distinct header files, sorted
    pub fn files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.entities.iter().filter_map(|e| e.file.as_deref()).collect();
        files.sort_unstable();
        files.dedup();
        files
    }

    pub fn member_count(&self) -> usize {
        self.entities.iter().map(|e| e.members.len()).sum()
    }

    /// Recoverable problems found during ingestion
    pub fn diagnostics(&self) -> &[IndexError] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn register_namespace(namespaces: &mut BTreeMap<String, Namespace>, name: &str, brief: Option<String>) {
    let parts = split_scope(name.trim_start_matches("::"));
    for depth in 1..=parts.len() {
        let prefix = parts[..depth].join("::");
        namespaces
            .entry(lookup_key(&prefix))
            .or_insert_with(|| Namespace { name: prefix, brief: None });
    }

    if let Some(brief) = brief {
        let key = lookup_key(&parts.join("::"));
        if let Some(ns) = namespaces.get_mut(&key) {
            ns.brief.get_or_insert(brief);
        }
    }
}

fn merge_declaration(target: &mut Pending, decl: Declaration) {
    debug!(name = %target.qualified_name, "merging repeated declaration");

    if target.kind != decl.kind {
        warn!(
            name = %target.qualified_name,
            first = ?target.kind,
            repeated = ?decl.kind,
            "repeated declaration changes kind; keeping the first"
        );
    }

    for base in decl.bases {
        let key = lookup_key(&base);
        if !target.bases.iter().any(|b| lookup_key(b) == key) {
            target.bases.push(base);
        }
    }

    for member in decl.members {
        push_member(&mut target.members, member, &target.qualified_name);
    }

    if target.file.is_none() {
        target.file = decl.file;
    }
    if target.brief.is_none() {
        target.brief = decl.brief;
    }
    if target.anchor.is_none() {
        target.anchor = decl.anchor;
    }
}

fn push_member(members: &mut Vec<Member>, decl: MemberDecl, owner: &str) {
    let member = Member {
        name: decl.name.trim().to_string(),
        kind: decl.kind,
        signature: decl.signature.trim().to_string(),
        anchor: decl.anchor,
    };

    let duplicate = members.iter().any(|m| {
        m.name == member.name && m.kind == member.kind && m.signature == member.signature
    });
    if duplicate {
        debug!(owner, member = %member.name, "dropping duplicate member");
        return;
    }

    members.push(member);
}

/// Scope a qualified name is declared in (`a::b::C` -> `a::b`)
fn enclosing_scope(qualified_name: &str) -> Option<String> {
    let parts = split_scope(qualified_name);
    if parts.len() > 1 {
        Some(parts[..parts.len() - 1].join("::"))
    } else {
        None
    }
}

/// Lookup keys for `reference` seen from `scope`: innermost scope outwards, then global
fn candidate_keys(scope: Option<&str>, reference: &str) -> Vec<String> {
    if let Some(global) = reference.strip_prefix("::") {
        return vec![lookup_key(global)];
    }

    let parts = scope.map(split_scope).unwrap_or_default();
    let mut keys = Vec::with_capacity(parts.len() + 1);
    for depth in (1..=parts.len()).rev() {
        keys.push(lookup_key(&format!("{}::{}", parts[..depth].join("::"), reference)));
    }
    keys.push(lookup_key(reference));
    keys
}

/// Collapse whitespace runs so instantiation labels render consistently
fn normalize_label(label: &str) -> String {
    WHITESPACE.replace_all(label.trim(), " ").into_owned()
}
