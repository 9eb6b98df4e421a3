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

//! `Rows` (spec §6, §4.5): the caller-facing row iterator over a `Cursor`.

use crate::error::Result;
use crate::exec::cursor::Cursor;
use crate::value::{AttrType, ColumnValue};

pub struct Rows {
    cursor: Cursor,
}

impl Rows {
    pub(crate) fn new(cursor: Cursor) -> Self {
        Rows { cursor }
    }

    /// Column names, in plan order (spec §4.5).
    pub fn columns(&self) -> Vec<String> {
        self.cursor.columns()
    }

    /// Advances to the next row, writing each column's value into `dest`
    /// (sized to `columns().len()`). Returns `false` at end-of-stream.
    pub async fn next(&mut self, dest: &mut [Option<ColumnValue>]) -> Result<bool> {
        self.cursor.next(dest).await
    }

    pub fn column_type_scan_type(&self, index: usize) -> AttrType {
        self.cursor.scan_type(index)
    }

    pub fn column_type_database_type_name(&self, index: usize) -> &'static str {
        self.cursor.database_type_name(index)
    }

    pub fn column_type_nullable(&self, index: usize) -> bool {
        self.cursor.nullable(index)
    }

    /// Releases the cursor's execution state back to the plan's pool.
    /// Idempotent (spec §4.5).
    pub fn close(&mut self) {
        self.cursor.close();
    }
}
