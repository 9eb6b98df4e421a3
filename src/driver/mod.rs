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

//! The relational driver contract (spec §6): `Connection`, `Statement` and
//! `Rows`. Everything above this module (planning, execution, streaming
//! decode) is transport- and registration-agnostic; this is the thin layer
//! that ties a caller's positional bind arguments to a `Plan`'s parameter
//! lists and turns a `Cursor` into the caller-facing row iterator.

pub mod connection;
pub mod rows;
pub mod statement;

pub use connection::Connection;
pub use rows::Rows;
pub use statement::Statement;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::{Error, Result};
use crate::plan::params::{ParamKind, ParamRegistry};
use crate::value::{encode_argument, ColumnValue};

/// Resolves every placeholder registered in `registry`'s list and criteria
/// parameter lists against the caller's positional `args`, in bind-position
/// order — the same order the `?` tokens appear in the plan's PartiQL text
/// (spec §4.3 "placeholder-to-argument mapping"). Literal and field/column-
/// referencing parameters never appear as `?` in the rendered text, so they
/// contribute nothing here — nor does `registry.function_params`: a
/// projection function's extra placeholder argument (spec §4.7) is resolved
/// client-side at reconcile time, never sent to the store.
fn bind_parameters(registry: &ParamRegistry, args: &[ColumnValue]) -> Result<Vec<AttributeValue>> {
    let expected = registry.num_input();
    if args.len() != expected {
        return Err(Error::Plan(format!(
            "expected {expected} bound argument(s), got {}",
            args.len()
        )));
    }

    let mut positions: Vec<usize> = registry
        .list_params
        .iter()
        .chain(registry.criteria_params.iter())
        .filter_map(|p| match p.kind {
            ParamKind::Placeholder { bind_position } => Some(bind_position),
            _ => None,
        })
        .collect();
    positions.sort_unstable();

    positions
        .into_iter()
        .map(|position| encode_argument(&args[position]))
        .collect()
}
