// Copyright 2024 The Dynabridge Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Planning: parses one SQL statement, classifies it, binds it against the
//! target table's schema, and produces an immutable [`Plan`] (spec §3, §4.1).

pub mod cache;
pub mod ddl;
pub mod delete;
pub mod functions;
pub mod insert;
pub mod params;
pub mod query;
pub mod type_model;
pub mod update;

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::{CreateTableRequest, StoreClient};

use params::ParamRegistry;
use type_model::TypeModel;

/// Which of the six planners produced this plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Query,
    Insert,
    Update,
    Delete,
    CreateTable,
    DropTable,
}

/// The captured AST subset a DDL plan needs at execution time (spec §3).
#[derive(Debug, Clone)]
pub enum Ddl {
    CreateTable {
        if_not_exists: bool,
        request: CreateTableRequest,
    },
    DropTable {
        if_exists: bool,
        table_name: String,
    },
}

/// Immutable compiled form of one SQL statement (spec §3, GLOSSARY).
/// Built once per distinct SQL text and shared (via `Arc`) across every
/// execution and every `Execution State` drawn from its pool.
#[derive(Debug, Clone)]
pub struct Plan {
    pub kind: Kind,
    pub sql: String,
    pub table_name: String,
    pub partiql: String,
    pub type_model: TypeModel,
    pub params: ParamRegistry,
    pub limit: Option<usize>,
    pub ddl: Option<Ddl>,
}

impl Plan {
    pub fn num_input(&self) -> usize {
        self.params.num_input()
    }
}

/// Parses and classifies `sql` by its leading keyword, dispatching to one of
/// the six planners (spec §4.1). This is the single entry point `Connection`
/// calls on a plan-cache miss.
pub async fn build(sql: &str, store: &dyn StoreClient) -> Result<Plan> {
    let dialect = sqlparser::dialect::GenericDialect {};
    let mut statements = sqlparser::parser::Parser::parse_sql(&dialect, sql)
        .map_err(|e| Error::Parse(e.to_string()))?;
    if statements.len() != 1 {
        return Err(Error::Parse(format!(
            "expected exactly one statement, got {}",
            statements.len()
        )));
    }
    let statement = statements.remove(0);

    use sqlparser::ast::Statement;
    match statement {
        Statement::Query(query) => query::build(sql, *query, store).await,
        Statement::Insert { .. } => insert::build(sql, statement, store).await,
        Statement::Update { .. } => update::build(sql, statement, store).await,
        Statement::Delete { .. } => delete::build(sql, statement, store).await,
        Statement::CreateTable { .. } => ddl::build_create_table(sql, statement),
        Statement::Drop { .. } => ddl::build_drop_table(sql, statement),
        other => Err(Error::UnsupportedStatement(format!("{sql} ({other})"))),
    }
}

pub(crate) fn arc(plan: Plan) -> Arc<Plan> {
    Arc::new(plan)
}
