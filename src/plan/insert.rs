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

//! INSERT planner (spec §4.1 "Insert plan").

use sqlparser::ast::{Expr, Statement, Value};

use crate::error::{Error, Result};
use crate::store::StoreClient;

use super::params::ParamRegistry;
use super::type_model::TypeModel;
use super::{Kind, Plan};

/// Value encoding for one VALUES-clause AST node (spec §4.1).
fn render_value(
    expr: &Expr,
    column: &str,
    model: &mut TypeModel,
    params: &mut ParamRegistry,
) -> Result<String> {
    match expr {
        Expr::Value(Value::Placeholder(_)) => {
            params.push_list_placeholder(column);
            Ok("?".to_string())
        }
        Expr::Value(v) => Ok(literal_text(v)),
        Expr::Function(func) => render_constructor_call(func, model),
        other => Err(Error::Unsupported(format!("INSERT value: {other}"))),
    }
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => format!("'{s}'"),
        Value::Number(n, _) => n.clone(),
        Value::Boolean(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

fn render_constructor_call(func: &sqlparser::ast::Function, _model: &mut TypeModel) -> Result<String> {
    use sqlparser::ast::{FunctionArg, FunctionArgExpr, FunctionArguments};
    let name = func.name.to_string().to_ascii_lowercase();
    let list = match &func.args {
        FunctionArguments::List(list) => &list.args,
        _ => return Err(Error::Unsupported(format!("constructor call shape: {}", func.name))),
    };
    let args: Vec<String> = list
        .iter()
        .map(|a| match a {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => Ok(e.to_string()),
            other => Err(Error::Unsupported(format!("constructor argument: {other}"))),
        })
        .collect::<Result<_>>()?;

    Ok(match name.as_str() {
        "strings" | "array" | "ints" | "decimals" => format!("<<{}>>", args.join(",")),
        "list" => format!("[{}]", args.join(",")),
        "map" | "t" => args.join(","),
        other => return Err(Error::Unsupported(format!("constructor function: {other}"))),
    })
}

pub async fn build(sql: &str, statement: Statement, store: &dyn StoreClient) -> Result<Plan> {
    let Statement::Insert(insert) = statement else {
        return Err(Error::Unsupported("expected INSERT".to_string()));
    };
    let table = insert.table.to_string();
    let columns: Vec<String> = insert.columns.iter().map(|c| c.value.clone()).collect();

    let values = match insert.source.as_deref().map(|q| q.body.as_ref()) {
        Some(sqlparser::ast::SetExpr::Values(values)) => values
            .rows
            .first()
            .cloned()
            .ok_or_else(|| Error::Plan("INSERT requires a VALUES row".to_string()))?,
        _ => return Err(Error::Plan("INSERT requires a VALUES clause".to_string())),
    };
    if columns.len() != values.len() {
        return Err(Error::Plan("column count does not match VALUES count".to_string()));
    }

    let description = store
        .describe_table(&table)
        .await?
        .ok_or_else(|| Error::Schema(format!("table not found: {table}")))?;

    // Every attribute the table description declares (DynamoDB only
    // declares key attributes) must be supplied (spec §4.1).
    let missing = description
        .attribute_definitions
        .iter()
        .map(|d| d.attribute_name.clone())
        .find(|name| !columns.iter().any(|c| c == name));
    if let Some(missing) = missing {
        return Err(Error::RequiredAttributeMissing(missing));
    }

    let mut model = TypeModel::new();
    let mut params = ParamRegistry::new();

    let mut partiql = format!("INSERT INTO {table} VALUE {{");
    for (i, (column, value)) in columns.iter().zip(values.iter()).enumerate() {
        if i > 0 {
            partiql.push(',');
        }
        partiql.push('\'');
        partiql.push_str(column);
        partiql.push_str("':");
        partiql.push_str(&render_value(value, column, &mut model, &mut params)?);
    }
    partiql.push('}');

    Ok(Plan {
        kind: Kind::Insert,
        sql: sql.to_string(),
        table_name: table,
        partiql,
        type_model: model,
        params,
        limit: None,
        ddl: None,
    })
}
