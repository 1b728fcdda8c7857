//! Page names, page directories and anchor ids.
//!
//! Anchors are a hash of (seed, entity, member, signature) and are only ever
//! produced here, at emission time. They are opaque and differ between
//! documentation versions; the stable key inside the crate is the qualified
//! name.

use crate::symbols::{Entity, EntityId, Member, MemberKind, Parent, SymbolTable};
use md5::{Digest, Md5};

/// Resolves link targets for entities, members, namespaces and files
pub struct LinkResolver<'a> {
    table: &'a SymbolTable,
    seed: String,
}

impl<'a> LinkResolver<'a> {
    pub fn new(table: &'a SymbolTable, seed: &str) -> Self {
        Self {
            table,
            seed: seed.to_string(),
        }
    }

    /// Page of an entity without extension (`d0/d03/structdxfcpp_1_1_d_x_endpoint`),
    /// `None` for types rendered inside their owner's page
    pub fn entity_page(&self, id: EntityId) -> Option<String> {
        let entity = self.table.entity(id);
        if !entity.has_own_page() {
            return None;
        }
        let name = format!("{}{}", entity.kind.page_prefix(), escape_name(&entity.qualified_name));
        Some(paged(&name))
    }

    /// Link of an entity: its own page, or an anchor in its owner's page
    pub fn entity_url(&self, id: EntityId) -> String {
        if let Some(page) = self.entity_page(id) {
            return format!("{}.html", page);
        }
        let owner = self.owner_page_url(id);
        format!("{}#{}", owner, self.entity_anchor(id))
    }

    /// Anchor of an entity inside its owner's page
    pub fn entity_anchor(&self, id: EntityId) -> String {
        let entity = self.table.entity(id);
        match &entity.anchor {
            Some(pinned) => pinned.clone(),
            None => format!("a{}", digest_hex(&[&self.seed, &entity.qualified_name])),
        }
    }

    /// Link of the `index`-th member of `owner`
    pub fn member_url(&self, owner: EntityId, index: usize) -> String {
        let page = match self.entity_page(owner) {
            Some(page) => format!("{}.html", page),
            None => self.owner_page_url(owner),
        };
        format!("{}#{}", page, self.member_anchor(owner, index))
    }

    pub fn member_anchor(&self, owner: EntityId, index: usize) -> String {
        let entity = self.table.entity(owner);
        let member = &entity.members[index];
        if let Some(pinned) = &member.anchor {
            return pinned.clone();
        }

        let own = digest_hex(&[&self.seed, &entity.qualified_name, &member.name, &member.signature]);
        if member.kind == MemberKind::Enumerator && !entity.has_own_page() {
            // Enumerators of an inline enum extend the enum's anchor
            format!("{}a{}", self.entity_anchor(owner), own)
        } else {
            format!("a{}", own)
        }
    }

    /// Identity used to detect two symbols sharing one anchor
    pub fn member_identity(entity: &Entity, member: &Member) -> String {
        format!("{}::{}{}", entity.qualified_name, member.name, member.signature)
    }

    pub fn namespace_page(&self, name: &str) -> String {
        paged(&format!("namespace{}", escape_name(name)))
    }

    pub fn namespace_url(&self, name: &str) -> String {
        format!("{}.html", self.namespace_page(name))
    }

    pub fn file_url(&self, file: &str) -> String {
        format!("{}.html", paged(&escape_name(file)))
    }

    fn owner_page_url(&self, id: EntityId) -> String {
        let mut current = id;
        loop {
            match self.table.entity(current).parent {
                Parent::Entity(parent) => {
                    if let Some(page) = self.entity_page(parent) {
                        return format!("{}.html", page);
                    }
                    current = parent;
                }
                _ => return "index.html".to_string(),
            }
        }
    }
}

/// Prefix a page name with its `dX/dYY` directory
fn paged(name: &str) -> String {
    let digest = Md5::digest(name.as_bytes());
    format!("d{:x}/d{:02x}/{}", digest[0] & 0x0f, digest[1], name)
}

/// Hex MD5 over the parts, separated so that ("ab", "c") != ("a", "bc")
fn digest_hex(parts: &[&str]) -> String {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0x1fu8]);
    }
    hex::encode(hasher.finalize())
}

/// Escape a symbol or file name into a file-system and JS-identifier safe name.
///
/// Uppercase letters become `_` + lowercase so names stay unique on
/// case-insensitive file systems; `::` becomes `_1_1`.
pub fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() * 2);
    for ch in name.chars() {
        match ch {
            '_' => out.push_str("__"),
            ':' => out.push_str("_1"),
            '/' => out.push_str("_2"),
            '<' => out.push_str("_3"),
            '>' => out.push_str("_4"),
            '*' => out.push_str("_5"),
            '&' => out.push_str("_6"),
            '|' => out.push_str("_7"),
            '.' => out.push_str("_8"),
            '!' => out.push_str("_9"),
            ',' => out.push_str("_00"),
            ' ' => out.push_str("_01"),
            '{' => out.push_str("_02"),
            '}' => out.push_str("_03"),
            '?' => out.push_str("_04"),
            '^' => out.push_str("_05"),
            '%' => out.push_str("_06"),
            '(' => out.push_str("_07"),
            ')' => out.push_str("_08"),
            '+' => out.push_str("_09"),
            '=' => out.push_str("_0a"),
            '$' => out.push_str("_0b"),
            '\\' => out.push_str("_0c"),
            '@' => out.push_str("_0d"),
            ']' => out.push_str("_0e"),
            '[' => out.push_str("_0f"),
            '#' => out.push_str("_0g"),
            '~' => out.push_str("_0h"),
            c if c.is_ascii_uppercase() => {
                out.push('_');
                out.push(c.to_ascii_lowercase());
            }
            c if c.is_ascii_alphanumeric() || c == '-' => out.push(c),
            c => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("_x{:02x}", byte));
                }
            }
        }
    }
    out
}
