//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The session and session-manager layer sitting atop `confd-tree` and
//! `confd-commit`: the candidate tree each client edits, the NETCONF-style
//! edit-config processor, and the registry mapping session ids to
//! sessions under an ownership/locking discipline (`SPEC_FULL.md` §4.3-§4.5).

pub mod authz;
pub mod debug;
pub mod editconfig;
pub mod error;
pub mod lock;
pub mod manager;
pub mod session;

pub use authz::{Authorizer, Command, CommandKind, PermitAll};
pub use debug::Debug;
pub use editconfig::{edit_config, EditConfigRequest, EditOp, ErrorOption, Operation, Target, TestOption};
pub use error::{Error, Result};
pub use lock::Lock;
pub use manager::SessionManager;
pub use session::{CommitReport, Session};
