//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The in-memory configuration tree: owned candidate/running trees, the
//! lazily-merged union view over them, the diff engine that walks two
//! union views into a flat change list, and the native/RFC 7951
//! serializers used for `Show` and component dispatch.

pub mod diff;
pub mod error;
pub mod node;
pub mod path;
pub mod render;
pub mod running;
pub mod tree;
pub mod union;

pub use diff::{diff, Change, DiffEntry};
pub use error::Error;
pub use node::Node;
pub use path::{Path, Segment};
pub use render::{
    render_native, render_native_display, render_native_subtree, render_rfc7951, to_json_value,
};
pub use running::RunningCell;
pub use tree::Tree;
pub use union::{Defaults, Union};
