//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The commit pipeline: constraint validation, component dispatch, action
//! script scheduling and execution, hook directories, and the orchestrator
//! that ties them into the single serializing commit queue described in
//! `SPEC_FULL.md` §4.6.

pub mod component;
pub mod debug;
pub mod error;
pub mod hooks;
pub mod manager;
pub mod schedule;
pub mod script;
pub mod validate;

pub use component::{dispatch_order, slice, ComponentManager, ComponentSpec};
pub use debug::Debug;
pub use error::{Error, Result, ValidationError};
pub use manager::{CommitManager, CommitOutcome, CommitStatus, CommitWarning};
pub use schedule::build_schedule;
pub use script::{action_order, leaf_list_delete_cascade, LeafListOp, ProcessScriptExecutor, ScheduledAction, ScriptExecutor};
pub use validate::validate;
