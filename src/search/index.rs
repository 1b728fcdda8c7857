use crate::symbols::{Entity, EntityId, EntityKind, MemberKind, SymbolTable};
use crate::utils::name_terms;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Search section a hit belongs to; `All` contains every hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCategory {
    All,
    Classes,
    Functions,
    Variables,
    Typedefs,
    Enums,
    EnumValues,
    Concepts,
}

impl SearchCategory {
    pub const ALL: [SearchCategory; 8] = [
        SearchCategory::All,
        SearchCategory::Classes,
        SearchCategory::Functions,
        SearchCategory::Variables,
        SearchCategory::Typedefs,
        SearchCategory::Enums,
        SearchCategory::EnumValues,
        SearchCategory::Concepts,
    ];

    /// File-name prefix of the category's shards
    pub fn name(&self) -> &'static str {
        match self {
            SearchCategory::All => "all",
            SearchCategory::Classes => "classes",
            SearchCategory::Functions => "functions",
            SearchCategory::Variables => "variables",
            SearchCategory::Typedefs => "typedefs",
            SearchCategory::Enums => "enums",
            SearchCategory::EnumValues => "enumvalues",
            SearchCategory::Concepts => "concepts",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchCategory::All => "All",
            SearchCategory::Classes => "Classes",
            SearchCategory::Functions => "Functions",
            SearchCategory::Variables => "Variables",
            SearchCategory::Typedefs => "Typedefs",
            SearchCategory::Enums => "Enumerations",
            SearchCategory::EnumValues => "Enumerator",
            SearchCategory::Concepts => "Concepts",
        }
    }

    pub fn of_entity(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Class | EntityKind::Struct | EntityKind::Union => SearchCategory::Classes,
            EntityKind::Enum => SearchCategory::Enums,
            EntityKind::Concept => SearchCategory::Concepts,
        }
    }

    pub fn of_member(kind: MemberKind) -> Self {
        match kind {
            MemberKind::Function => SearchCategory::Functions,
            MemberKind::Variable => SearchCategory::Variables,
            MemberKind::Typedef => SearchCategory::Typedefs,
            MemberKind::Enumerator => SearchCategory::EnumValues,
        }
    }

    /// Whether hits of `category` are listed in this section
    pub fn includes(&self, category: SearchCategory) -> bool {
        *self == SearchCategory::All || *self == category
    }
}

/// Symbol a hit points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Entity(EntityId),
    Member { owner: EntityId, index: usize },
}

impl SearchTarget {
    /// Entity that owns the hit (the entity itself for type hits)
    pub fn owner(&self) -> EntityId {
        match self {
            SearchTarget::Entity(id) => *id,
            SearchTarget::Member { owner, .. } => *owner,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub target: SearchTarget,
    pub category: SearchCategory,
    /// `dxfcpp::DXEndpoint::connect()`
    pub label: String,
    /// Qualified name of the owning entity (or scope, for types)
    pub owner_label: String,
}

#[derive(Debug, Clone)]
pub struct TokenEntry {
    /// Spelling of the token where it first occurred
    pub display: String,
    pub hits: Vec<SearchHit>,
}

/// One emitted search file: tokens of a category sharing a leading character
#[derive(Debug)]
pub struct Shard<'a> {
    pub category: SearchCategory,
    pub bucket: char,
    /// Position of `bucket` in the category's bucket string
    pub index: usize,
    pub tokens: Vec<ShardToken<'a>>,
}

#[derive(Debug)]
pub struct ShardToken<'a> {
    pub token: &'a str,
    pub display: &'a str,
    pub hits: Vec<&'a SearchHit>,
}

impl Shard<'_> {
    /// `all_c.js` style file name
    pub fn file_name(&self) -> String {
        format!("{}_{:x}.js", self.category.name(), self.index)
    }
}

/// Token -> hits, in first-occurrence order
#[derive(Debug, Default)]
pub struct SearchIndex {
    tokens: IndexMap<String, TokenEntry>,
    hit_count: usize,
}

impl SearchIndex {
    /// Index every entity name, then its members, in declaration order
    pub fn build(table: &SymbolTable, min_segment_len: usize) -> Self {
        let mut index = SearchIndex::default();

        for entity in table.entities() {
            let hit = SearchHit {
                target: SearchTarget::Entity(entity.id),
                category: SearchCategory::of_entity(entity.kind),
                label: entity.qualified_name.clone(),
                owner_label: table.scope_label(entity.id),
            };
            index.insert(&entity.name, hit, min_segment_len);

            for (member_index, member) in entity.members.iter().enumerate() {
                let hit = SearchHit {
                    target: SearchTarget::Member {
                        owner: entity.id,
                        index: member_index,
                    },
                    category: SearchCategory::of_member(member.kind),
                    label: member_label(entity, member_index),
                    owner_label: entity.qualified_name.clone(),
                };
                index.insert(&member.name, hit, min_segment_len);
            }
        }

        debug!(
            tokens = index.tokens.len(),
            hits = index.hit_count,
            "search index built"
        );
        index
    }

    fn insert(&mut self, name: &str, hit: SearchHit, min_segment_len: usize) {
        for term in name_terms(name, min_segment_len) {
            let entry = self.tokens.entry(term.token).or_insert_with(|| TokenEntry {
                display: term.text,
                hits: Vec::new(),
            });
            entry.hits.push(hit.clone());
            self.hit_count += 1;
        }
    }

    /// Hits for an exact token
    pub fn lookup(&self, token: &str) -> &[SearchHit] {
        self.tokens
            .get(&token.to_lowercase())
            .map(|e| e.hits.as_slice())
            .unwrap_or(&[])
    }

    /// Tokens starting with `prefix`, sorted
    pub fn lookup_prefix(&self, prefix: &str) -> Vec<(&str, &TokenEntry)> {
        let prefix = prefix.to_lowercase();
        let mut found: Vec<(&str, &TokenEntry)> = self
            .tokens
            .iter()
            .filter(|(token, _)| token.starts_with(&prefix))
            .map(|(token, entry)| (token.as_str(), entry))
            .collect();
        found.sort_by(|a, b| a.0.cmp(b.0));
        found
    }

    /// Tokens in first-occurrence order
    pub fn tokens(&self) -> impl Iterator<Item = (&str, &TokenEntry)> {
        self.tokens.iter().map(|(token, entry)| (token.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn hit_count(&self) -> usize {
        self.hit_count
    }

    /// Leading characters with content in `category`, sorted
    pub fn buckets(&self, category: SearchCategory) -> String {
        self.shards(category).iter().map(|s| s.bucket).collect()
    }

    /// Shards of one category: one per leading character, tokens sorted,
    /// hits kept in insertion order
    pub fn shards(&self, category: SearchCategory) -> Vec<Shard<'_>> {
        let mut buckets: BTreeMap<char, Vec<ShardToken<'_>>> = BTreeMap::new();

        for (token, entry) in &self.tokens {
            let hits: Vec<&SearchHit> = entry
                .hits
                .iter()
                .filter(|hit| category.includes(hit.category))
                .collect();
            if hits.is_empty() {
                continue;
            }
            let Some(first) = token.chars().next() else { continue };
            buckets.entry(first).or_default().push(ShardToken {
                token,
                display: &entry.display,
                hits,
            });
        }

        buckets
            .into_iter()
            .enumerate()
            .map(|(index, (bucket, mut tokens))| {
                tokens.sort_by(|a, b| a.token.cmp(b.token));
                Shard {
                    category,
                    bucket,
                    index,
                    tokens,
                }
            })
            .collect()
    }

    /// Leading characters of member tokens of one category, for the member
    /// index pages
    pub fn member_letters(&self, category: SearchCategory) -> Vec<char> {
        self.shards(category)
            .into_iter()
            .filter(|shard| {
                shard
                    .tokens
                    .iter()
                    .any(|t| t.hits.iter().any(|h| matches!(h.target, SearchTarget::Member { .. })))
            })
            .map(|shard| shard.bucket)
            .collect()
    }
}

/// Label of a member hit: `Scope::name()` or, for overloads, with the signature
fn member_label(entity: &Entity, index: usize) -> String {
    let member = &entity.members[index];
    match member.kind {
        MemberKind::Function => {
            if entity.is_overloaded(&member.name) && !member.signature.is_empty() {
                format!("{}::{}{}", entity.qualified_name, member.name, member.signature)
            } else {
                format!("{}::{}()", entity.qualified_name, member.name)
            }
        }
        _ => format!("{}::{}", entity.qualified_name, member.name),
    }
}
