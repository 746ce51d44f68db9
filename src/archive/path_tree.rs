//! Hierarchical grouping of flat alias paths.
//!
//! A catalog is a flat list of '/'-separated names; consumers that want a
//! directory-like view get it from here. The tree is derived purely from
//! the alias strings: intermediate nodes exist because some alias passes
//! through them, not because the container carries directory entries.

use indexmap::IndexMap;

use super::source::InputSource;

/// One node of the path tree: an optional held value plus named children.
///
/// The root is valueless and nameless. A node holds a value exactly when
/// some inserted alias terminates at its path; inserting the same alias
/// again replaces that value without disturbing the rest of the tree.
pub struct PathTree<T> {
    name: String,
    value: Option<T>,
    children: IndexMap<String, PathTree<T>>,
}

impl<T> PathTree<T> {
    /// Create an empty, valueless root
    pub fn new_root() -> Self {
        Self::node(String::new())
    }

    fn node(name: String) -> Self {
        Self {
            name,
            value: None,
            children: IndexMap::new(),
        }
    }

    /// Path segment naming this node; empty for the root
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value held at this exact path, if any alias terminates here
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Insert `value` at `path`, creating intermediate nodes as needed.
    ///
    /// Splits on '/', ignoring empty segments (leading, trailing or
    /// doubled separators). A path with no segments is ignored; the root
    /// never holds a value.
    pub fn add(&mut self, path: &str, value: T) {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        if segments.peek().is_none() {
            return;
        }

        let mut node = self;
        for segment in segments {
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| PathTree::node(segment.to_string()));
        }
        node.value = Some(value);
    }

    /// Node at `path`, walking one segment per level
    pub fn node_at(&self, path: &str) -> Option<&PathTree<T>> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Value held at exactly `path`
    pub fn get(&self, path: &str) -> Option<&T> {
        self.node_at(path)?.value()
    }

    /// Direct child named `name`
    pub fn child(&self, name: &str) -> Option<&PathTree<T>> {
        self.children.get(name)
    }

    /// Direct children, in insertion order
    pub fn children(&self) -> impl Iterator<Item = &PathTree<T>> {
        self.children.values()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Group a collection of sources into a path tree keyed by their aliases.
///
/// Aliases sharing a prefix share intermediate nodes; a repeated alias
/// overwrites the value at that path only.
pub fn build_path_tree<T, I>(items: I) -> PathTree<T>
where
    T: InputSource,
    I: IntoIterator<Item = T>,
{
    let mut root = PathTree::new_root();
    for item in items {
        let alias = item.alias().to_string();
        root.add(&alias, item);
    }
    root
}
