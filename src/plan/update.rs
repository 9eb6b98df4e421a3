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

//! UPDATE planner (spec §4.1 "Update plan"): borrows the same `SET col = …`
//! surface the insert planner parses, and requires a WHERE clause.

use sqlparser::ast::{AssignmentTarget, Expr, Statement, Value};

use crate::error::{Error, Result};
use crate::sql_text::render_where;
use crate::store::StoreClient;

use super::params::ParamRegistry;
use super::type_model::TypeModel;
use super::{Kind, Plan};

fn literal_text(value: &Value) -> String {
    match value {
        Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => format!("'{s}'"),
        Value::Number(n, _) => n.clone(),
        Value::Boolean(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

pub async fn build(sql: &str, statement: Statement, _store: &dyn StoreClient) -> Result<Plan> {
    let Statement::Update {
        table,
        assignments,
        selection,
        ..
    } = statement
    else {
        return Err(Error::Unsupported("expected UPDATE".to_string()));
    };

    let selection = selection.ok_or(Error::WhereClauseRequired)?;

    let table_name = table.relation.to_string();
    let mut params = ParamRegistry::new();

    let mut sets = Vec::with_capacity(assignments.len());
    for assignment in &assignments {
        let column = match &assignment.target {
            AssignmentTarget::ColumnName(name) => name
                .0
                .last()
                .map(|i| i.value.clone())
                .unwrap_or_default(),
            other => return Err(Error::Unsupported(format!("UPDATE assignment target: {other}"))),
        };
        let rendered = match &assignment.value {
            Expr::Value(Value::Placeholder(_)) => {
                params.push_list_placeholder(column.clone());
                "?".to_string()
            }
            Expr::Value(v) => literal_text(v),
            other => return Err(Error::Unsupported(format!("UPDATE value: {other}"))),
        };
        sets.push(format!("{column}={rendered}"));
    }

    let where_text = render_where(&selection, &mut params)?;

    let partiql = format!("UPDATE {table_name} SET {} WHERE {where_text}", sets.join(", "));

    Ok(Plan {
        kind: Kind::Update,
        sql: sql.to_string(),
        table_name,
        partiql,
        type_model: TypeModel::new(),
        params,
        limit: None,
        ddl: None,
    })
}
