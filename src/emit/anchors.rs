use crate::error::IndexError;
use rustc_hash::FxHashMap;

/// Links already written to one output file, with the symbol each one names
#[derive(Debug)]
pub struct AnchorRegistry {
    file: String,
    seen: FxHashMap<String, String>,
}

impl AnchorRegistry {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            seen: FxHashMap::default(),
        }
    }

    /// Record `link` as naming `identity`. The same symbol may be linked
    /// any number of times; a second symbol on one anchor is an error.
    pub fn register(&mut self, link: &str, identity: &str) -> Result<(), IndexError> {
        // Only anchored links can collide; page links name the page itself
        let Some((_, anchor)) = link.split_once('#') else {
            return Ok(());
        };

        match self.seen.get(link) {
            Some(first) if first != identity => Err(IndexError::DuplicateAnchor {
                file: self.file.clone(),
                anchor: anchor.to_string(),
                first: first.clone(),
                name: identity.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.seen.insert(link.to_string(), identity.to_string());
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
