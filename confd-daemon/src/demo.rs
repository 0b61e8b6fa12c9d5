//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! A hand-built schema and a logging `ComponentManager`, standing in for
//! the YANG compiler and the component-manager transport this crate treats
//! as external collaborators. Exists only so the binary has something to
//! serve; real deployments wire a compiled schema and a real transport
//! instead.

use std::sync::Arc;

use confd_commit::ComponentManager;
use confd_schema::{ActionKind, ActionScript, ActionTable, DataType, SchemaBuilder, SchemaNode};
use serde_json::Value as Json;
use tracing::info;

pub fn schema() -> Arc<SchemaNode> {
    SchemaBuilder::container("sys", "system")
        .child(
            SchemaBuilder::leaf("sys", "hostname", DataType::String)
                .default_value("confd")
                .actions(
                    ActionTable::new().with(ActionScript::new(ActionKind::Update, 0, "/bin/true")),
                ),
        )
        .child(
            SchemaBuilder::container("if", "interfaces")
                .defining_module("sys")
                .child(
                    SchemaBuilder::list("if", "interface", &["name"])
                        .child(SchemaBuilder::leaf("if", "name", DataType::String).mandatory(true))
                        .child(SchemaBuilder::leaf("if", "mtu", DataType::Uint32).default_value("1500"))
                        .child(SchemaBuilder::leaf("if", "enabled", DataType::Bool).default_value("true"))
                        .actions(
                            ActionTable::new()
                                .with(ActionScript::new(ActionKind::Create, 0, "/bin/true"))
                                .with(ActionScript::new(ActionKind::Update, 0, "/bin/true"))
                                .with(ActionScript::new(ActionKind::Delete, 0, "/bin/true")),
                        ),
                ),
        )
        .child(
            SchemaBuilder::container("if", "interfaces-state")
                .state()
                .actions(
                    ActionTable::new().with(ActionScript::new(ActionKind::GetState, 0, "/bin/true")),
                ),
        )
        .build()
}

/// A `ComponentManager` that just logs what it would have shipped out,
/// standing in for the real per-component JSON transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingComponents;

impl ComponentManager for LoggingComponents {
    fn set_running(&self, component: &str, config: &Json) -> Result<(), String> {
        info!(%component, %config, "dispatching component slice");
        Ok(())
    }
}
