use super::tree::{NavNode, NavTree};

/// A linked node with its child-index path from the root (`[]` for the root)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub link: String,
    pub path: Vec<usize>,
}

/// One `navtreeindexN.js` page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPage {
    pub index: usize,
    pub entries: Vec<FlatEntry>,
}

impl NavPage {
    /// Link the page is found by in `NAVTREEINDEX`
    pub fn first_link(&self) -> Option<&str> {
        self.entries.first().map(|e| e.link.as_str())
    }
}

impl NavTree {
    /// Pre-order walk over the complete tree, script children included;
    /// nodes without a link are skipped but still count in the paths
    pub fn flatten(&self) -> Vec<FlatEntry> {
        let mut out = Vec::new();
        let mut stack: Vec<(&NavNode, Vec<usize>)> = vec![(self.root(), Vec::new())];

        while let Some((node, path)) = stack.pop() {
            for (i, child) in node.children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(i);
                stack.push((child, child_path));
            }
            if let Some(link) = &node.link {
                out.push(FlatEntry {
                    link: link.clone(),
                    path,
                });
            }
        }
        out
    }

    /// Cut the flattened tree into pages of `page_size` entries, ordered
    /// by link so a page is found by comparing against each page's first
    /// link. Boundaries are positional over that order; a repeated link
    /// keeps its first path.
    pub fn paginate(&self, page_size: usize) -> Vec<NavPage> {
        let page_size = page_size.max(1);
        let mut entries = self.flatten();
        entries.sort_by(|a, b| a.link.cmp(&b.link));
        entries.dedup_by(|later, earlier| later.link == earlier.link);

        entries
            .chunks(page_size)
            .enumerate()
            .map(|(index, chunk)| NavPage {
                index,
                entries: chunk.to_vec(),
            })
            .collect()
    }
}
