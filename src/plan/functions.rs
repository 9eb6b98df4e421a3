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

//! Function Registry (spec §4.7): a name-indexed map of constructors that
//! plug column-producing functions into the planner. Populated once, read
//! on every plan construction — grounded on the original's `registry.go`,
//! a bare `sync.RWMutex`-guarded map; `once_cell::sync::Lazy` gives the same
//! "populated before first use, read-mostly after" shape without a
//! process `init()`.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use sqlparser::ast::{Expr, Value};

use crate::error::{Error, Result};
use crate::plan::params::ParamRegistry;
use crate::plan::type_model::TypeModel;
use crate::value::{AttrType, ColumnValue};

/// Read-only view over the current row a [`Function`] needs at call time:
/// the row's decoded field values and the statement's bound arguments.
/// Implemented by `exec::state::ExecState`; kept as a trait here so
/// `plan` never has to depend on `exec`.
pub trait RowContext {
    fn field_value(&self, position: usize) -> &ColumnValue;
    fn arg_value(&self, bind_position: usize) -> &ColumnValue;
}

/// A column-producing function bound into a plan's Type Model.
pub trait Function: Send + Sync {
    fn call(&self, ctx: &dyn RowContext) -> Result<ColumnValue>;
}

/// One constructor-supplied extra argument: either fixed at plan time or
/// resolved from a bound placeholder at call time.
#[derive(Debug, Clone)]
enum ExtraArg {
    Literal(ColumnValue),
    Bind(usize),
}

fn resolve_extra(arg: &ExtraArg, ctx: &dyn RowContext) -> ColumnValue {
    match arg {
        ExtraArg::Literal(v) => v.clone(),
        ExtraArg::Bind(pos) => ctx.arg_value(*pos).clone(),
    }
}

/// `ARRAY_EXISTS(field, v1[, v2…])` — true iff any element of `field`
/// equals any of the extra values (spec §4.7).
struct ArrayExists {
    field_position: usize,
    extras: Vec<ExtraArg>,
}

impl Function for ArrayExists {
    fn call(&self, ctx: &dyn RowContext) -> Result<ColumnValue> {
        let field = ctx.field_value(self.field_position);
        let elements = set_elements(field);
        let found = self
            .extras
            .iter()
            .map(|extra| resolve_extra(extra, ctx))
            .any(|needle| elements.iter().any(|el| el == &needle));
        Ok(ColumnValue::Bool(found))
    }
}

fn set_elements(value: &ColumnValue) -> Vec<ColumnValue> {
    match value {
        ColumnValue::StringSet(items) => items.iter().cloned().map(ColumnValue::Str).collect(),
        ColumnValue::IntSet(items) => items.iter().copied().map(ColumnValue::Int).collect(),
        ColumnValue::FloatSet(items) => items.iter().copied().map(ColumnValue::Float).collect(),
        ColumnValue::ByteSet(items) => items.iter().cloned().map(ColumnValue::Bytes).collect(),
        ColumnValue::List(items) => items.clone(),
        other => vec![other.clone()],
    }
}

use crate::sql_text::{identifier_name, is_placeholder, literal_to_value as expr_to_literal};

fn construct_array_exists(
    args: &[Expr],
    model: &mut TypeModel,
    params: &mut ParamRegistry,
) -> Result<(Arc<dyn Function>, AttrType)> {
    let [field_arg, extra_args @ ..] = args else {
        return Err(Error::Plan("ARRAY_EXISTS requires a field and at least one value".to_string()));
    };
    let field_name = identifier_name(field_arg)?;
    let field_position = model.add_field(field_name.clone(), AttrType::List, false);

    let mut extras = Vec::with_capacity(extra_args.len());
    for arg in extra_args {
        if is_placeholder(arg) {
            let bind_position = params.push_function_placeholder(field_name.clone());
            extras.push(ExtraArg::Bind(bind_position));
        } else {
            extras.push(ExtraArg::Literal(expr_to_literal(arg)?));
        }
    }

    Ok((
        Arc::new(ArrayExists {
            field_position,
            extras,
        }),
        AttrType::Bool,
    ))
}

type Constructor = fn(&[Expr], &mut TypeModel, &mut ParamRegistry) -> Result<(Arc<dyn Function>, AttrType)>;

static REGISTRY: Lazy<RwLock<HashMap<String, Constructor>>> = Lazy::new(|| {
    let mut map: HashMap<String, Constructor> = HashMap::new();
    map.insert("array_exists".to_string(), construct_array_exists as Constructor);
    RwLock::new(map)
});

/// Resolves `name` (case-insensitively) to its constructor and invokes it.
pub fn resolve(
    name: &str,
    args: &[Expr],
    model: &mut TypeModel,
    params: &mut ParamRegistry,
) -> Result<(Arc<dyn Function>, AttrType)> {
    let key = name.to_ascii_lowercase();
    let constructor = {
        let registry = REGISTRY.read();
        registry.get(&key).copied()
    };
    match constructor {
        Some(constructor) => constructor(args, model, params),
        None => Err(Error::UnknownFunction(name.to_string())),
    }
}

/// Registers a custom constructor. Exposed for embedding applications that
/// want to extend the function set; writes are expected only at process
/// startup (spec §5).
pub fn register(name: impl Into<String>, constructor: Constructor) {
    REGISTRY.write().insert(name.into().to_ascii_lowercase(), constructor);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeCtx {
        fields: Vec<ColumnValue>,
        args: Vec<ColumnValue>,
    }

    impl RowContext for FakeCtx {
        fn field_value(&self, position: usize) -> &ColumnValue {
            &self.fields[position]
        }
        fn arg_value(&self, bind_position: usize) -> &ColumnValue {
            &self.args[bind_position]
        }
    }

    #[test]
    fn array_exists_resolves_and_matches() {
        let mut model = TypeModel::new();
        let mut params = ParamRegistry::new();
        let literal = Expr::Value(Value::SingleQuotedString("TRAVEL".to_string()));
        let field = Expr::Identifier(sqlparser::ast::Ident::new("Categories"));
        let (func, result_type) = resolve("ARRAY_EXISTS", &[field, literal], &mut model, &mut params).unwrap();
        assert_eq!(result_type, AttrType::Bool);

        let ctx = FakeCtx {
            fields: vec![ColumnValue::StringSet(vec!["TRAVEL".into(), "FINANCE".into()])],
            args: vec![],
        };
        let result = func.call(&ctx).unwrap();
        assert_eq!(result, ColumnValue::Bool(true));
    }

    #[test]
    fn array_exists_false_when_no_match() {
        let mut model = TypeModel::new();
        let mut params = ParamRegistry::new();
        let literal = Expr::Value(Value::SingleQuotedString("TRAVEL".to_string()));
        let field = Expr::Identifier(sqlparser::ast::Ident::new("Categories"));
        let (func, _) = resolve("array_exists", &[field, literal], &mut model, &mut params).unwrap();

        let ctx = FakeCtx {
            fields: vec![ColumnValue::StringSet(vec!["FINANCE".into()])],
            args: vec![],
        };
        assert_eq!(func.call(&ctx).unwrap(), ColumnValue::Bool(false));
    }

    #[test]
    fn unknown_function_is_reported() {
        let mut model = TypeModel::new();
        let mut params = ParamRegistry::new();
        let err = resolve("nope", &[], &mut model, &mut params).unwrap_err();
        assert!(matches!(err, Error::UnknownFunction(_)));
    }
}
