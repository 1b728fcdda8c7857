use super::anchors::AnchorRegistry;
use crate::error::IndexError;
use crate::nav::{NavNode, NavPage};
use crate::utils::js_string;
use std::fmt::Write;

const SYNC_MESSAGES: &str = "var SYNCONMSG = 'click to disable panel synchronisation';\n\
var SYNCOFFMSG = 'click to enable panel synchronisation';\n";

/// `navtreedata.js`: the tree down to the first scripted nodes, plus the
/// first link of every index page
pub fn render_navtree_data(root: &NavNode, pages: &[NavPage], file: &str) -> Result<String, IndexError> {
    let mut registry = AnchorRegistry::new(file);
    let mut out = String::from("var NAVTREE =\n[\n");
    render_nodes(&mut out, std::slice::from_ref(root), 2, &mut registry)?;
    out.push_str("\n];\n\nvar NAVTREEINDEX =\n[\n");

    let firsts: Vec<String> = pages
        .iter()
        .filter_map(|page| page.first_link())
        .map(js_string)
        .collect();
    out.push_str(&firsts.join(",\n"));
    out.push_str("\n];\n\n");
    out.push_str(SYNC_MESSAGES);
    Ok(out)
}

/// `navtreeindexN.js`: link -> child-index path
pub fn render_navtree_index(page: &NavPage) -> String {
    let mut out = format!("var NAVTREEINDEX{} =\n{{\n", page.index);
    let rows: Vec<String> = page
        .entries
        .iter()
        .map(|entry| {
            let path: Vec<String> = entry.path.iter().map(usize::to_string).collect();
            format!("{}:[{}]", js_string(&entry.link), path.join(","))
        })
        .collect();
    out.push_str(&rows.join(",\n"));
    out.push_str("\n};\n");
    out
}

/// Script holding the children of a scripted node
pub fn render_script(node: &NavNode, file: &str) -> Result<String, IndexError> {
    let script = node.script.as_deref().unwrap_or_default();
    let var = script.rsplit('/').next().unwrap_or(script);

    let mut registry = AnchorRegistry::new(file);
    let mut out = format!("var {} =\n[\n", var);
    render_nodes(&mut out, &node.children, 4, &mut registry)?;
    out.push_str("\n];\n");
    Ok(out)
}

/// One `[ label, link, children ]` row per node. Children go inline unless
/// the node names a script; `null` marks a leaf. Walks with an explicit
/// stack, so tree depth is not bounded by the call stack.
fn render_nodes(
    out: &mut String,
    nodes: &[NavNode],
    indent: usize,
    registry: &mut AnchorRegistry,
) -> Result<(), IndexError> {
    let mut steps = Vec::new();
    push_rows(&mut steps, nodes, indent);

    while let Some(step) = steps.pop() {
        match step {
            Step::Open { node, indent, first } => {
                if !first {
                    out.push_str(",\n");
                }
                if let (Some(link), Some(identity)) = (&node.link, &node.identity) {
                    registry.register(link, identity)?;
                }

                let link = node.link.as_deref().map(js_string).unwrap_or_else(|| "null".to_string());
                let _ = write!(out, "{:indent$}[ {}, {}, ", "", js_string(&node.label), link, indent = indent);

                match &node.script {
                    Some(script) => {
                        out.push_str(&js_string(script));
                        close_row(out, node);
                    }
                    None if node.children.is_empty() => {
                        out.push_str("null");
                        close_row(out, node);
                    }
                    None => {
                        out.push_str("[\n");
                        steps.push(Step::Close { node, indent });
                        push_rows(&mut steps, &node.children, indent + 2);
                    }
                }
            }
            Step::Close { node, indent } => {
                let _ = write!(out, "\n{:indent$}]", "", indent = indent);
                close_row(out, node);
            }
        }
    }
    Ok(())
}

enum Step<'a> {
    Open { node: &'a NavNode, indent: usize, first: bool },
    Close { node: &'a NavNode, indent: usize },
}

/// Queue `nodes` so the first one is rendered next
fn push_rows<'a>(steps: &mut Vec<Step<'a>>, nodes: &'a [NavNode], indent: usize) {
    for (i, node) in nodes.iter().enumerate().rev() {
        steps.push(Step::Open { node, indent, first: i == 0 });
    }
}

fn close_row(out: &mut String, node: &NavNode) {
    if !node.xrefs.is_empty() {
        let xrefs: Vec<String> = node.xrefs.iter().map(|x| js_string(x)).collect();
        let _ = write!(out, ", [ {} ]", xrefs.join(", "));
    }
    out.push_str(" ]");
}
