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

//! A SQL-to-PartiQL adapter driver: accepts a familiar SQL surface (SELECT,
//! INSERT, UPDATE, DELETE, CREATE TABLE, DROP TABLE), translates each
//! statement into DynamoDB's PartiQL dialect, drives the remote API, and
//! streams result rows back through a relational-style row cursor.
//!
//! The public surface is [`driver::Connection`] (`Open(dsn)`),
//! [`driver::Statement`] (`Prepare`) and [`driver::Rows`] (`Query`'s row
//! iterator). Everything else (`plan`, `exec`, `value`, `store`) is the
//! internal planning/execution/streaming-decode pipeline.

pub mod driver;
pub mod dsn;
pub mod error;
pub mod exec;
pub mod plan;
pub mod sql_text;
pub mod store;
pub mod value;

pub use driver::{Connection, Rows, Statement};
pub use dsn::Dsn;
pub use error::{Error, Result, TransportError};
pub use value::{AttrType, ColumnValue};
