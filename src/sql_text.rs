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

//! Small AST helpers shared by the planners: identifier extraction and
//! PartiQL text rendering of expressions (spec §4.1 step 5).

use sqlparser::ast::{Expr, Value};

use crate::error::{Error, Result};
use crate::plan::params::ParamRegistry;
use crate::value::{AttrType, ColumnValue};

/// Converts a literal AST expression into a bound [`ColumnValue`] (used for
/// `COALESCE`'s default-value argument, spec §4.7).
pub fn literal_to_value(expr: &Expr) -> Result<ColumnValue> {
    match expr {
        Expr::Value(Value::SingleQuotedString(s)) | Expr::Value(Value::DoubleQuotedString(s)) => {
            Ok(ColumnValue::Str(s.clone()))
        }
        Expr::Value(Value::Number(n, _)) => {
            if n.contains('.') {
                n.parse().map(ColumnValue::Float).map_err(|_| Error::Plan(format!("invalid numeric literal: {n}")))
            } else {
                n.parse().map(ColumnValue::Int).map_err(|_| Error::Plan(format!("invalid numeric literal: {n}")))
            }
        }
        Expr::Value(Value::Boolean(b)) => Ok(ColumnValue::Bool(*b)),
        Expr::Value(Value::Null) => Ok(ColumnValue::Null),
        other => Err(Error::Unsupported(format!("literal: {other}"))),
    }
}

pub fn identifier_name(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Identifier(ident) => Ok(ident.value.clone()),
        Expr::CompoundIdentifier(parts) => Ok(parts.last().map(|p| p.value.clone()).unwrap_or_default()),
        other => Err(Error::Unsupported(format!("identifier: {other}"))),
    }
}

pub fn is_placeholder(expr: &Expr) -> bool {
    matches!(expr, Expr::Value(Value::Placeholder(_)))
}

/// Returns the target attribute type for one of the cast-shortcut function
/// names (spec §4.1 item 2b, §4.7).
pub fn cast_target(name: &str) -> Option<AttrType> {
    Some(match name.to_ascii_lowercase().as_str() {
        "array" | "strings" => AttrType::StringSet,
        "int" => AttrType::Int,
        "decimal" => AttrType::Float,
        "ints" => AttrType::IntSet,
        "decimals" => AttrType::FloatSet,
        "map" => AttrType::Map,
        _ => return None,
    })
}

/// Renders one value literal verbatim into PartiQL text.
fn render_value(value: &Value) -> String {
    match value {
        Value::Placeholder(_) => "?".to_string(),
        Value::Number(n, _) => n.clone(),
        Value::SingleQuotedString(s) => format!("'{s}'"),
        Value::DoubleQuotedString(s) => format!("'{s}'"),
        Value::Boolean(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Renders an expression tree into PartiQL text, registering each
/// placeholder it encounters as a criteria parameter (spec §4.1 step 4).
/// `side_name` is the identifier name associated with a placeholder, taken
/// from the opposite side of a binary comparison.
pub fn render_where(expr: &Expr, params: &mut ParamRegistry) -> Result<String> {
    Ok(match expr {
        Expr::Nested(inner) => format!("({})", render_where(inner, params)?),
        Expr::BinaryOp { left, op, right } => {
            let (left_text, right_text) = render_binary_sides(left, right, params)?;
            format!("{left_text} {op} {right_text}")
        }
        Expr::InList { expr, list, negated } => {
            let target = identifier_name(expr)?;
            let mut rendered = Vec::with_capacity(list.len());
            for item in list {
                if is_placeholder(item) {
                    params.push_criteria_placeholder(target.clone());
                    rendered.push("?".to_string());
                } else {
                    rendered.push(render_value_expr(item)?);
                }
            }
            let op = if *negated { "NOT IN" } else { "IN" };
            format!("{target} {op} ({})", rendered.join(", "))
        }
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => identifier_name(expr)?,
        Expr::Value(v) => render_value(v),
        other => return Err(Error::Unsupported(format!("WHERE expression: {other}"))),
    })
}

fn render_value_expr(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Value(v) => Ok(render_value(v)),
        other => Err(Error::Unsupported(format!("literal expression: {other}"))),
    }
}

fn render_binary_sides(left: &Expr, right: &Expr, params: &mut ParamRegistry) -> Result<(String, String)> {
    let left_is_placeholder = is_placeholder(left);
    let right_is_placeholder = is_placeholder(right);

    let left_text = if left_is_placeholder {
        let name = identifier_name(right).unwrap_or_default();
        params.push_criteria_placeholder(name);
        "?".to_string()
    } else {
        render_where(left, params)?
    };

    let right_text = if right_is_placeholder {
        let name = identifier_name(left).unwrap_or_default();
        params.push_criteria_placeholder(name);
        "?".to_string()
    } else {
        render_where(right, params)?
    };

    Ok((left_text, right_text))
}
