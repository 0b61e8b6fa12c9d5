//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::tree::Tree;

/// The process-wide, atomically-swappable pointer to the running
/// configuration tree. Every session holds a clone of the same
/// `RunningCell`; readers never block, and only the commit manager's
/// serialising loop ever calls [`RunningCell::store`].
#[derive(Clone)]
pub struct RunningCell(Arc<ArcSwap<Tree>>);

impl RunningCell {
    pub fn new(initial: Tree) -> Self {
        RunningCell(Arc::new(ArcSwap::from_pointee(initial)))
    }

    /// A point-in-time snapshot of the running tree. Cheap: this is an
    /// `Arc` clone of the current pointee, not a deep copy.
    pub fn load(&self) -> Arc<Tree> {
        self.0.load_full()
    }

    /// Atomically publishes a new running tree. Callers must already hold
    /// whatever external serialisation guarantee (the commit manager's
    /// single in-flight commit) is required to make the swap meaningful;
    /// the cell itself only guarantees the store itself is atomic.
    pub fn store(&self, tree: Tree) {
        self.0.store(Arc::new(tree));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confd_schema::SchemaBuilder;

    use super::*;

    #[test]
    fn readers_see_latest_store() {
        let schema = SchemaBuilder::container("sys", "system").build();
        let cell = RunningCell::new(Tree::empty(schema.clone()));
        let first = cell.load();
        cell.store(Tree::empty(schema));
        let second = cell.load();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
