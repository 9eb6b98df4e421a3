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

//! DELETE planner (spec §4.1 "Delete plan"): requires a WHERE clause.

use sqlparser::ast::{FromTable, Statement};

use crate::error::{Error, Result};
use crate::sql_text::render_where;
use crate::store::StoreClient;

use super::params::ParamRegistry;
use super::type_model::TypeModel;
use super::{Kind, Plan};

pub async fn build(sql: &str, statement: Statement, _store: &dyn StoreClient) -> Result<Plan> {
    let Statement::Delete(delete) = statement else {
        return Err(Error::Unsupported("expected DELETE".to_string()));
    };

    let selection = delete.selection.ok_or(Error::WhereClauseRequired)?;

    let table_name = match &delete.from {
        FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables
            .first()
            .map(|t| t.relation.to_string())
            .ok_or_else(|| Error::Unsupported("DELETE with no target table".to_string()))?,
    };

    let mut params = ParamRegistry::new();
    let where_text = render_where(&selection, &mut params)?;
    let partiql = format!("DELETE FROM {table_name} WHERE {where_text}");

    Ok(Plan {
        kind: Kind::Delete,
        sql: sql.to_string(),
        table_name,
        partiql,
        type_model: TypeModel::new(),
        params,
        limit: None,
        ddl: None,
    })
}
