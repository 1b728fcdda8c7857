use super::anchors::AnchorRegistry;
use crate::error::IndexError;
use crate::search::{SearchCategory, SearchHit, SearchIndex, SearchTarget, Shard};
use crate::symbols::SymbolTable;
use crate::utils::{LinkResolver, html_escape, js_single, js_string};
use std::fmt::Write;

/// `search/searchdata.js`: bucket strings, section names and labels of every
/// category with content
pub fn render_search_data(index: &SearchIndex) -> String {
    let sections: Vec<(SearchCategory, String)> = SearchCategory::ALL
        .iter()
        .map(|&category| (category, index.buckets(category)))
        .filter(|(_, buckets)| !buckets.is_empty())
        .collect();

    let table = |name: &str, value: &dyn Fn(SearchCategory, &str) -> String| {
        let rows: Vec<String> = sections
            .iter()
            .enumerate()
            .map(|(i, (category, buckets))| format!("  {}: {}", i, value(*category, buckets)))
            .collect();
        format!("var {} =\n{{\n{}\n}};\n", name, rows.join(",\n"))
    };

    [
        table("indexSectionsWithContent", &|_, buckets| js_string(buckets)),
        table("indexSectionNames", &|category, _| js_string(category.name())),
        table("indexSectionLabels", &|category, _| js_string(category.label())),
    ]
    .join("\n")
}

/// One `search/<category>_<n>.js` shard
pub fn render_shard(
    shard: &Shard<'_>,
    table: &SymbolTable,
    links: &LinkResolver<'_>,
    file: &str,
) -> Result<String, IndexError> {
    let mut registry = AnchorRegistry::new(file);
    let mut rows = Vec::with_capacity(shard.tokens.len());

    for (position, token) in shard.tokens.iter().enumerate() {
        let mut row = format!(
            "  [{},[{}",
            js_single(&format!("{}_{}", search_id(token.token), position)),
            js_single(&html_escape(token.display))
        );
        // A lone hit names its owner; several hits need their full labels
        // to be told apart
        let single = token.hits.len() == 1;
        for hit in &token.hits {
            let (link, identity) = hit_link(hit, table, links);
            let label = if single { &hit.owner_label } else { &hit.label };
            registry.register(&link, &identity)?;
            let _ = write!(
                row,
                ",[{},1,{}]",
                js_single(&format!("../{}", link)),
                js_single(&html_escape(label))
            );
        }
        row.push_str("]]");
        rows.push(row);
    }

    let mut out = String::from("var searchData=\n[\n");
    for row in rows {
        out.push_str(&row);
        out.push_str(",\n");
    }
    out.push_str("];\n");
    Ok(out)
}

fn hit_link(hit: &SearchHit, table: &SymbolTable, links: &LinkResolver<'_>) -> (String, String) {
    match hit.target {
        SearchTarget::Entity(id) => (links.entity_url(id), table.entity(id).qualified_name.clone()),
        SearchTarget::Member { owner, index } => {
            let entity = table.entity(owner);
            (
                links.member_url(owner, index),
                LinkResolver::member_identity(entity, &entity.members[index]),
            )
        }
    }
}

/// Token as used in search ids: ASCII letters and digits kept, anything else
/// as `_` + hex bytes (`max_sequence` -> `max_5fsequence`)
fn search_id(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for byte in token.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            let _ = write!(out, "_{:02x}", byte);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{Declaration, EntityKind, MemberDecl, MemberKind, SymbolFile};

    fn table(pinned: Option<&str>) -> SymbolTable {
        let member = |name: &str| MemberDecl {
            name: name.to_string(),
            kind: MemberKind::Function,
            signature: "()".to_string(),
            anchor: pinned.map(str::to_string),
        };
        SymbolTable::ingest([SymbolFile {
            namespaces: Vec::new(),
            declarations: vec![Declaration {
                name: "Promise< void >".to_string(),
                kind: EntityKind::Struct,
                scope: None,
                bases: Vec::new(),
                members: vec![member("getResult"), member("getException")],
                file: None,
                brief: None,
                anchor: None,
            }],
        }])
    }

    #[test]
    fn test_search_id() {
        assert_eq!(search_id("max_sequence"), "max_5fsequence");
        assert_eq!(search_id("operator<<"), "operator_3c_3c");
        assert_eq!(search_id("getrole"), "getrole");
    }

    #[test]
    fn test_shard_rows() {
        let table = table(None);
        let index = SearchIndex::build(&table, 2);
        let links = LinkResolver::new(&table, "");

        let shards = index.shards(SearchCategory::All);
        let shard = shards.iter().find(|s| s.bucket == 'p').unwrap();
        let js = render_shard(shard, &table, &links, "search/all_1.js").unwrap();

        let page = links.entity_url(0);
        assert_eq!(
            js,
            format!(
                "var searchData=\n[\n  ['promise_0',['Promise',['../{}',1,'']]],\n];\n",
                page
            )
        );
    }

    #[test]
    fn test_member_hits_share_one_token() {
        let table = table(None);
        let index = SearchIndex::build(&table, 2);
        let links = LinkResolver::new(&table, "");

        let shards = index.shards(SearchCategory::Functions);
        let shard = shards.iter().find(|s| s.bucket == 'g').unwrap();
        let js = render_shard(shard, &table, &links, "search/functions_0.js").unwrap();

        // "get" carries both members, "getexception" sorts before "getresult"
        assert!(js.contains("['get_0',['get',"));
        let get = js.lines().find(|line| line.contains("['get_0'")).unwrap();
        assert!(get.contains(",1,'Promise&lt; void &gt;::getResult()'],"));
        assert!(get.contains(",1,'Promise&lt; void &gt;::getException()']]]"));

        // A token with one hit names the owning entity only
        let lone = js.lines().find(|line| line.contains("['getresult_")).unwrap();
        assert!(lone.ends_with(",1,'Promise&lt; void &gt;']]],"));
        let exception = js.find("getexception_1").unwrap();
        let result = js.find("getresult_2").unwrap();
        assert!(exception < result);
    }

    #[test]
    fn test_pinned_duplicate_aborts_shard() {
        let table = table(Some("a_same"));
        let index = SearchIndex::build(&table, 2);
        let links = LinkResolver::new(&table, "");

        let shards = index.shards(SearchCategory::All);
        let shard = shards.iter().find(|s| s.bucket == 'g').unwrap();
        let err = render_shard(shard, &table, &links, "search/all_0.js").unwrap_err();
        assert!(matches!(err, IndexError::DuplicateAnchor { .. }));

        // Other shards of the same category are unaffected
        let other = shards.iter().find(|s| s.bucket == 'p').unwrap();
        assert!(render_shard(other, &table, &links, "search/all_1.js").is_ok());
    }

    #[test]
    fn test_search_data_lists_sections_with_content() {
        let table = table(None);
        let index = SearchIndex::build(&table, 2);
        let js = render_search_data(&index);

        assert!(js.starts_with("var indexSectionsWithContent =\n{\n  0: \"egpr\",\n  1: \"p\",\n  2: \"egr\"\n};\n"));
        assert!(js.contains("var indexSectionNames =\n{\n  0: \"all\",\n  1: \"classes\",\n  2: \"functions\"\n};\n"));
        assert!(js.contains("  2: \"Functions\""));
    }
}
