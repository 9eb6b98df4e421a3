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

//! SELECT planner (spec §4.1 "Query plan"). Supports one level of
//! outer-select wrapping: `SELECT … FROM (SELECT …) t [WHERE …]`.

use std::collections::HashMap;

use sqlparser::ast::{Expr, Query as AstQuery, Select, SelectItem, SetExpr, TableFactor};

use crate::error::{Error, Result};
use crate::sql_text::{cast_target, identifier_name, render_where};
use crate::store::StoreClient;
use crate::value::{AttrType, ColumnValue};

use super::functions;
use super::params::ParamRegistry;
use super::type_model::{Producer, TypeModel};
use super::{Kind, Plan};

struct OuterColumn {
    default: Option<ColumnValue>,
    alias: Option<String>,
}

fn scalar_attr_type(t: &aws_sdk_dynamodb::types::ScalarAttributeType) -> AttrType {
    match t {
        aws_sdk_dynamodb::types::ScalarAttributeType::N => AttrType::Int,
        aws_sdk_dynamodb::types::ScalarAttributeType::B => AttrType::Bytes,
        _ => AttrType::Str,
    }
}

/// Extracts `(name, default)` pairs for the outer projection, keyed by the
/// name under which the inner column is visible (spec §4.1 step 1).
fn outer_columns(select: &Select) -> Result<HashMap<String, OuterColumn>> {
    let mut out = HashMap::new();
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                let alias = match item {
                    SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.clone()),
                    _ => None,
                };
                match expr {
                    Expr::Function(func) if func.name.to_string().eq_ignore_ascii_case("coalesce") => {
                        let args = function_args(func)?;
                        let [source, default_expr] = args.as_slice() else {
                            return Err(Error::Unsupported("COALESCE requires 2 arguments".to_string()));
                        };
                        let source_name = identifier_name(source)?;
                        let default = crate::sql_text::literal_to_value(default_expr)?;
                        let key = alias.clone().unwrap_or_else(|| source_name.clone());
                        out.insert(key, OuterColumn { default: Some(default), alias });
                    }
                    _ => {
                        let name = identifier_name(expr)?;
                        let key = alias.clone().unwrap_or_else(|| name.clone());
                        out.insert(key, OuterColumn { default: None, alias });
                    }
                }
            }
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => {
                // outer wildcard: every inner column passes through untouched.
                return Ok(HashMap::new());
            }
        }
    }
    Ok(out)
}

fn function_args(func: &sqlparser::ast::Function) -> Result<Vec<Expr>> {
    use sqlparser::ast::{FunctionArg, FunctionArgExpr, FunctionArguments};
    let list = match &func.args {
        FunctionArguments::List(list) => &list.args,
        _ => return Err(Error::Unsupported(format!("function call shape: {}", func.name))),
    };
    let mut out = Vec::with_capacity(list.len());
    for arg in list {
        match arg {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) => out.push(e.clone()),
            other => return Err(Error::Unsupported(format!("function argument: {other}"))),
        }
    }
    Ok(out)
}

fn table_name(select: &Select) -> Result<(String, Option<Box<AstQuery>>)> {
    let from = select
        .from
        .first()
        .ok_or_else(|| Error::Unsupported("SELECT with no FROM".to_string()))?;
    match &from.relation {
        TableFactor::Table { name, .. } => Ok((name.to_string(), None)),
        TableFactor::Derived { subquery, .. } => {
            let inner_select = match subquery.body.as_ref() {
                SetExpr::Select(s) => s,
                _ => return Err(Error::Unsupported("nested FROM must be a simple SELECT".to_string())),
            };
            let (name, deeper) = table_name(inner_select)?;
            if deeper.is_some() {
                return Err(Error::Unsupported("only one level of FROM-subquery wrapping is supported".to_string()));
            }
            Ok((name, Some(subquery.clone())))
        }
        other => Err(Error::Unsupported(format!("FROM clause: {other}"))),
    }
}

pub async fn build(sql: &str, query: AstQuery, store: &dyn StoreClient) -> Result<Plan> {
    let outer_select = match query.body.as_ref() {
        SetExpr::Select(s) => s.as_ref().clone(),
        other => return Err(Error::Unsupported(format!("query body: {other}"))),
    };

    let (table, nested_subquery) = table_name(&outer_select)?;

    let (inner_select, outer_where, outer_cols) = if let Some(subquery) = nested_subquery {
        let inner = match subquery.body.as_ref() {
            SetExpr::Select(s) => s.as_ref().clone(),
            _ => return Err(Error::Unsupported("nested FROM must be a simple SELECT".to_string())),
        };
        (inner, outer_select.selection.clone(), outer_columns(&outer_select)?)
    } else {
        (outer_select.clone(), None, HashMap::new())
    };

    let description = store
        .describe_table(&table)
        .await?
        .ok_or_else(|| Error::Schema(format!("table not found: {table}")))?;

    let mut model = TypeModel::new();
    for key in &description.key_schema {
        model.key_attributes.push(key.name.clone());
    }

    let is_wildcard = matches!(
        inner_select.projection.as_slice(),
        [SelectItem::Wildcard(_)]
    );

    let mut params = ParamRegistry::new();

    if is_wildcard {
        for def in &description.attribute_definitions {
            let attr_type = scalar_attr_type(&def.attribute_type);
            let pos = model.add_field(def.attribute_name.clone(), attr_type, true);
            model.add_column(def.attribute_name.clone(), attr_type, None, Producer::Fields(vec![pos]));
        }
    } else {
        let known_types: HashMap<String, (AttrType, bool)> = description
            .attribute_definitions
            .iter()
            .map(|d| (d.attribute_name.clone(), (scalar_attr_type(&d.attribute_type), true)))
            .collect();

        for item in &inner_select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => {
                    let alias = match item {
                        SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.clone()),
                        _ => None,
                    };
                    build_projection_item(expr, alias, &known_types, &mut model, &mut params)?;
                }
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => {
                    return Err(Error::UnsupportedProjection("wildcard mixed with other items".to_string()));
                }
            }
        }
    }

    if !outer_cols.is_empty() {
        let mut kept = Vec::with_capacity(model.columns.len());
        for mut column in std::mem::take(&mut model.columns) {
            if let Some(outer) = outer_cols.get(&column.name) {
                if let Some(alias) = &outer.alias {
                    column.name = alias.clone();
                }
                if outer.default.is_some() {
                    column.default = outer.default.clone();
                }
                kept.push(column);
            }
        }
        for (idx, column) in kept.iter_mut().enumerate() {
            column.position = idx;
        }
        model.columns = kept;
    }

    let inner_where_text = match &inner_select.selection {
        Some(expr) => Some(render_where(expr, &mut params)?),
        None => None,
    };
    let outer_where_text = match &outer_where {
        Some(expr) => Some(render_where(expr, &mut params)?),
        None => None,
    };

    let mut partiql = String::from("SELECT ");
    if is_wildcard {
        partiql.push('*');
    } else {
        let names: Vec<&str> = model.fields.iter().map(|f| f.name.as_str()).collect();
        partiql.push_str(&names.join(", "));
    }
    partiql.push_str(" FROM ");
    partiql.push_str(&table);

    match (inner_where_text, outer_where_text) {
        (Some(inner), Some(outer)) => {
            partiql.push_str(" WHERE (");
            partiql.push_str(&inner);
            partiql.push_str(") AND ");
            partiql.push_str(&outer);
        }
        (Some(inner), None) => {
            partiql.push_str(" WHERE ");
            partiql.push_str(&inner);
        }
        (None, Some(outer)) => {
            partiql.push_str(" WHERE ");
            partiql.push_str(&outer);
        }
        (None, None) => {}
    }

    if let Some(order_by) = &query.order_by {
        partiql.push_str(" ORDER BY ");
        let rendered: Vec<String> = order_by
            .exprs
            .iter()
            .map(|o| {
                let mut text = o.expr.to_string();
                if let Some(asc) = o.asc {
                    text.push_str(if asc { " ASC" } else { " DESC" });
                }
                text
            })
            .collect();
        partiql.push_str(&rendered.join(", "));
    }

    let limit = match &query.limit {
        Some(Expr::Value(sqlparser::ast::Value::Number(n, _))) => n.parse::<usize>().ok(),
        _ => None,
    };

    Ok(Plan {
        kind: Kind::Query,
        sql: sql.to_string(),
        table_name: table,
        partiql,
        type_model: model,
        params,
        limit,
        ddl: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CreateTableRequest, ExecuteStatementOutput, TableDescription};
    use async_trait::async_trait;
    use aws_sdk_dynamodb::types::AttributeValue;

    struct FakeStore;

    #[async_trait]
    impl StoreClient for FakeStore {
        async fn execute_statement(
            &self,
            _statement: &str,
            _parameters: Vec<AttributeValue>,
            _next_token: Option<String>,
        ) -> Result<ExecuteStatementOutput> {
            Ok(ExecuteStatementOutput::default())
        }
        async fn create_table(&self, _request: CreateTableRequest) -> Result<()> {
            Ok(())
        }
        async fn delete_table(&self, _table_name: &str) -> Result<()> {
            Ok(())
        }
        async fn describe_table(&self, table_name: &str) -> Result<Option<TableDescription>> {
            Ok(Some(TableDescription {
                table_name: table_name.to_string(),
                key_schema: Vec::new(),
                attribute_definitions: Vec::new(),
                creating: false,
            }))
        }
    }

    async fn build_query(sql: &str) -> Plan {
        let dialect = sqlparser::dialect::GenericDialect {};
        let mut statements = sqlparser::parser::Parser::parse_sql(&dialect, sql).unwrap();
        let sqlparser::ast::Statement::Query(query) = statements.remove(0) else {
            panic!("expected a query");
        };
        build(sql, *query, &FakeStore).await.unwrap()
    }

    #[tokio::test]
    async fn order_by_renders_into_the_partiql_text() {
        let plan = build_query("SELECT ISBN FROM Publication ORDER BY ISBN DESC").await;
        assert!(plan.partiql.ends_with("ORDER BY ISBN DESC"));
    }

    #[tokio::test]
    async fn no_order_by_clause_renders_nothing() {
        let plan = build_query("SELECT ISBN FROM Publication").await;
        assert!(!plan.partiql.contains("ORDER BY"));
    }
}

fn build_projection_item(
    expr: &Expr,
    alias: Option<String>,
    known_types: &HashMap<String, (AttrType, bool)>,
    model: &mut TypeModel,
    params: &mut ParamRegistry,
) -> Result<()> {
    match expr {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
            let name = identifier_name(expr)?;
            let (attr_type, required) = known_types.get(&name).copied().unwrap_or((AttrType::Str, false));
            let pos = model.add_field(name.clone(), attr_type, required);
            let column_name = alias.unwrap_or(name);
            model.add_column(column_name, attr_type, None, Producer::Fields(vec![pos]));
            Ok(())
        }
        Expr::Function(func) => {
            let fname = func.name.to_string();
            let args = function_args(func)?;
            if let Some(target_type) = cast_target(&fname) {
                let arg = args
                    .first()
                    .ok_or_else(|| Error::Plan(format!("{fname} requires one argument")))?;
                let name = identifier_name(arg)?;
                let pos = model.add_field_typed(name.clone(), target_type, false);
                let column_name = alias.unwrap_or(name);
                model.add_column(column_name, target_type, None, Producer::Fields(vec![pos]));
                return Ok(());
            }
            let (func_impl, result_type) = functions::resolve(&fname, &args, model, params)?;
            let column_name = alias.unwrap_or_else(|| fname.clone());
            model.add_column(column_name, result_type, None, Producer::Function(func_impl));
            Ok(())
        }
        other => Err(Error::UnsupportedProjection(other.to_string())),
    }
}
