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

//! End-to-end scenarios driving the full prepare/exec/query pipeline
//! against an in-memory store double, one per published scenario: a
//! simple select with a cast, a registered function, a nested-select
//! COALESCE default, a bound `IN` list, a row limit, and a wildcard
//! subquery wrapper.

use std::collections::HashMap;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeDefinition, AttributeValue, KeyType, ScalarAttributeType};

use dynabridge::error::{Error, Result};
use dynabridge::store::{
    CreateTableRequest, ExecuteStatementOutput, Item, KeyAttribute, StoreClient, TableDescription,
};
use dynabridge::{Connection, ColumnValue};

static LOG_INIT: Once = Once::new();

fn setup() {
    LOG_INIT.call_once(|| {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    });
}

struct Table {
    items: Vec<Item>,
    key_schema: Vec<KeyAttribute>,
    attribute_definitions: Vec<AttributeDefinition>,
}

/// An in-memory `StoreClient` double good enough to exercise planning,
/// parameter binding and the streaming decoder without a real DynamoDB
/// endpoint. `execute_statement` interprets the flat `SELECT <fields> FROM
/// <table> [WHERE ...]` text every query planner here ever emits; it is not
/// a general PartiQL engine.
struct FakeStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl FakeStore {
    fn new() -> Self {
        FakeStore {
            tables: Mutex::new(HashMap::new()),
        }
    }

    fn with_table(
        mut self,
        name: &str,
        key_schema: Vec<KeyAttribute>,
        attribute_definitions: Vec<AttributeDefinition>,
        items: Vec<Item>,
    ) -> Self {
        self.tables.get_mut().unwrap().insert(
            name.to_string(),
            Table {
                items,
                key_schema,
                attribute_definitions,
            },
        );
        self
    }
}

#[async_trait]
impl StoreClient for FakeStore {
    async fn execute_statement(
        &self,
        statement: &str,
        parameters: Vec<AttributeValue>,
        _next_token: Option<String>,
    ) -> Result<ExecuteStatementOutput> {
        let table_name = table_name(statement);
        let tables = self.tables.lock().unwrap();
        let table = tables
            .get(table_name)
            .ok_or_else(|| Error::Schema(format!("no such table: {table_name}")))?;

        let fields = select_fields(statement);
        let items = table
            .items
            .iter()
            .filter(|item| where_matches(statement, item, &parameters))
            .map(|item| project(item, fields.as_deref()))
            .collect();

        Ok(ExecuteStatementOutput {
            items,
            next_token: None,
        })
    }

    async fn create_table(&self, _request: CreateTableRequest) -> Result<()> {
        Ok(())
    }

    async fn delete_table(&self, _table_name: &str) -> Result<()> {
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<Option<TableDescription>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.get(table_name).map(|t| TableDescription {
            table_name: table_name.to_string(),
            key_schema: t.key_schema.clone(),
            attribute_definitions: t.attribute_definitions.clone(),
            creating: false,
        }))
    }
}

fn table_name(statement: &str) -> &str {
    let after_from = statement.split(" FROM ").nth(1).unwrap_or("");
    after_from.split(' ').next().unwrap_or("")
}

fn select_fields(statement: &str) -> Option<Vec<String>> {
    let fields_part = statement.strip_prefix("SELECT ")?.split(" FROM ").next()?;
    if fields_part.trim() == "*" {
        return None;
    }
    Some(fields_part.split(',').map(|s| s.trim().to_string()).collect())
}

fn project(item: &Item, fields: Option<&[String]>) -> Item {
    match fields {
        None => item.clone(),
        Some(names) => item
            .iter()
            .filter(|(k, _)| names.iter().any(|n| n == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

fn where_matches(statement: &str, item: &Item, parameters: &[AttributeValue]) -> bool {
    let Some(where_clause) = statement.split(" WHERE ").nth(1) else {
        return true;
    };
    let where_clause = where_clause.split(" ORDER BY ").next().unwrap_or(where_clause);
    let mut params = parameters.to_vec().into_iter();
    where_clause
        .split(" AND ")
        .all(|clause| eval_condition(clause, item, &mut params))
}

fn eval_condition(clause: &str, item: &Item, params: &mut std::vec::IntoIter<AttributeValue>) -> bool {
    let clause = clause.trim().trim_start_matches('(').trim_end_matches(')').trim();
    if let Some((lhs, list)) = clause.split_once(" NOT IN ") {
        let left = resolve_token(lhs.trim(), item, params);
        let list = list.trim().trim_start_matches('(').trim_end_matches(')');
        let any = list.split(',').any(|tok| attr_eq(&left, &resolve_token(tok.trim(), item, params)));
        return !any;
    }
    if let Some((lhs, list)) = clause.split_once(" IN ") {
        let left = resolve_token(lhs.trim(), item, params);
        let list = list.trim().trim_start_matches('(').trim_end_matches(')');
        return list.split(',').any(|tok| attr_eq(&left, &resolve_token(tok.trim(), item, params)));
    }
    if let Some((lhs, rhs)) = clause.split_once(" = ") {
        let left = resolve_token(lhs.trim(), item, params);
        let right = resolve_token(rhs.trim(), item, params);
        return attr_eq(&left, &right);
    }
    true
}

fn resolve_token(token: &str, item: &Item, params: &mut std::vec::IntoIter<AttributeValue>) -> AttributeValue {
    if token == "?" {
        return params.next().expect("fewer bound parameters than placeholders");
    }
    if token.starts_with('\'') && token.ends_with('\'') && token.len() >= 2 {
        return AttributeValue::S(token.trim_matches('\'').to_string());
    }
    if token.parse::<f64>().is_ok() {
        return AttributeValue::N(token.to_string());
    }
    item.get(token).cloned().unwrap_or(AttributeValue::Null(true))
}

fn attr_eq(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a, b) {
        (AttributeValue::S(x), AttributeValue::S(y)) => x == y,
        (AttributeValue::N(x), AttributeValue::N(y)) => x.parse::<f64>().ok() == y.parse::<f64>().ok(),
        (AttributeValue::Bool(x), AttributeValue::Bool(y)) => x == y,
        (AttributeValue::Null(_), AttributeValue::Null(_)) => true,
        _ => false,
    }
}

fn publication_key_schema() -> Vec<KeyAttribute> {
    vec![
        KeyAttribute {
            name: "ISBN".to_string(),
            key_type: KeyType::Hash,
            attribute_type: ScalarAttributeType::S,
        },
        KeyAttribute {
            name: "Published".to_string(),
            key_type: KeyType::Range,
            attribute_type: ScalarAttributeType::N,
        },
    ]
}

fn publication_attribute_definitions() -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::builder()
            .attribute_name("ISBN")
            .attribute_type(ScalarAttributeType::S)
            .build()
            .unwrap(),
        AttributeDefinition::builder()
            .attribute_name("Published")
            .attribute_type(ScalarAttributeType::N)
            .build()
            .unwrap(),
    ]
}

fn publication(isbn: &str, name: &str, published: i64, status: i64) -> Item {
    let mut item: Item = HashMap::new();
    item.insert("ISBN".to_string(), AttributeValue::S(isbn.to_string()));
    item.insert("Name".to_string(), AttributeValue::S(name.to_string()));
    item.insert("Published".to_string(), AttributeValue::N(published.to_string()));
    item.insert("Status".to_string(), AttributeValue::N(status.to_string()));
    item
}

fn strs(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

async fn rows_of(conn: &Connection, sql: &str, args: Vec<ColumnValue>) -> (Vec<String>, Vec<Vec<Option<ColumnValue>>>) {
    let stmt = conn.prepare(sql).await.expect("prepare");
    let mut rows = stmt.query(args).await.expect("query");
    let columns = rows.columns();
    let mut out = Vec::new();
    loop {
        let mut dest = vec![None; columns.len()];
        if !rows.next(&mut dest).await.expect("next") {
            break;
        }
        out.push(dest);
    }
    (columns, out)
}

#[tokio::test]
async fn simple_select_casts_status_to_int() {
    setup();
    let store = FakeStore::new().with_table(
        "Publication",
        publication_key_schema(),
        publication_attribute_definitions(),
        vec![
            publication("AAA-BBB", "Title 1", 20020121, 1),
            publication("AAA-CCB", "Title 2", 20020122, 1),
            publication("AAA-XCB", "Title 3", 20020124, 0),
        ],
    );
    let conn = Connection::from_store(std::sync::Arc::new(store), 100);

    let (columns, rows) = rows_of(
        &conn,
        "SELECT ISBN, Name, Published, INT(Status) AS Status FROM Publication",
        vec![],
    )
    .await;

    assert_eq!(columns, strs(&["ISBN", "Name", "Published", "Status"]));
    assert_eq!(rows.len(), 3);
    let statuses: Vec<ColumnValue> = rows.iter().map(|r| r[3].clone().unwrap()).collect();
    assert_eq!(statuses, vec![ColumnValue::Int(1), ColumnValue::Int(1), ColumnValue::Int(0)]);
}

#[tokio::test]
async fn array_exists_reports_set_membership() {
    setup();
    let mut travel = publication("AAA-BBB", "Title 1", 20020121, 1);
    travel.insert(
        "Categories".to_string(),
        AttributeValue::Ss(vec!["TRAVEL".to_string(), "FINANCE".to_string()]),
    );
    let mut finance_only = publication("AAA-XXX", "Title 2", 20020121, 1);
    finance_only.insert("Categories".to_string(), AttributeValue::Ss(vec!["FINANCE".to_string()]));

    let store = FakeStore::new().with_table(
        "Publication",
        publication_key_schema(),
        publication_attribute_definitions(),
        vec![travel, finance_only],
    );
    let conn = Connection::from_store(std::sync::Arc::new(store), 100);

    let (columns, rows) = rows_of(
        &conn,
        "SELECT ISBN, Name, ARRAY_EXISTS(Categories, 'TRAVEL') AS IsTravel, ARRAY_EXISTS(Categories, 'FINANCE') AS IsFinance FROM Publication",
        vec![],
    )
    .await;

    assert_eq!(columns, strs(&["ISBN", "Name", "IsTravel", "IsFinance"]));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][2], Some(ColumnValue::Bool(true)));
    assert_eq!(rows[0][3], Some(ColumnValue::Bool(true)));
    assert_eq!(rows[1][2], Some(ColumnValue::Bool(false)));
    assert_eq!(rows[1][3], Some(ColumnValue::Bool(true)));
}

#[tokio::test]
async fn outer_coalesce_wraps_a_bound_inner_query() {
    setup();
    let mut travel = publication("AAA-BBB", "Title 1", 20020121, 1);
    travel.insert(
        "Categories".to_string(),
        AttributeValue::Ss(vec!["TRAVEL".to_string(), "FINANCE".to_string()]),
    );
    let mut finance_only = publication("AAA-XXX", "Title 2", 20020121, 1);
    finance_only.insert("Categories".to_string(), AttributeValue::Ss(vec!["FINANCE".to_string()]));

    let store = FakeStore::new().with_table(
        "Publication",
        publication_key_schema(),
        publication_attribute_definitions(),
        vec![travel, finance_only],
    );
    let conn = Connection::from_store(std::sync::Arc::new(store), 100);

    let sql = "SELECT ISBN, Name, COALESCE(IsTravel, false) AS IsTravel, COALESCE(IsFinance, false) AS IsFinance \
               FROM (SELECT ISBN, Name, ARRAY_EXISTS(Categories, 'TRAVEL') AS IsTravel, \
               ARRAY_EXISTS(Categories, 'FINANCE') AS IsFinance FROM Publication WHERE ISBN = ?)";
    let (columns, rows) = rows_of(&conn, sql, vec![ColumnValue::Str("AAA-XXX".to_string())]).await;

    assert_eq!(columns, strs(&["ISBN", "Name", "IsTravel", "IsFinance"]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Some(ColumnValue::Str("AAA-XXX".to_string())));
    assert_eq!(rows[0][2], Some(ColumnValue::Bool(false)));
    assert_eq!(rows[0][3], Some(ColumnValue::Bool(true)));
}

#[tokio::test]
async fn placeholder_inside_an_in_list_filters_by_bound_values() {
    setup();
    let store = FakeStore::new().with_table(
        "Publication",
        publication_key_schema(),
        publication_attribute_definitions(),
        vec![
            publication("AAA-BBB", "Title 1", 20020121, 1),
            publication("AAA-XXX", "Title 2", 20020121, 1),
        ],
    );
    let conn = Connection::from_store(std::sync::Arc::new(store), 100);

    let (columns, rows) = rows_of(
        &conn,
        "SELECT ISBN, Name FROM Publication t WHERE ISBN IN (?, ?) AND 1=1",
        vec![
            ColumnValue::Str("AAA-BBB".to_string()),
            ColumnValue::Str("AAA-XXW".to_string()),
        ],
    )
    .await;

    assert_eq!(columns, strs(&["ISBN", "Name"]));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Some(ColumnValue::Str("AAA-BBB".to_string())));
}

#[tokio::test]
async fn limit_truncates_before_the_store_is_exhausted() {
    setup();
    let store = FakeStore::new().with_table(
        "Publication",
        publication_key_schema(),
        publication_attribute_definitions(),
        vec![
            publication("AAA-BBB", "Title 1", 20020121, 1),
            publication("AAA-CCB", "Title 2", 20020122, 1),
            publication("AAA-DDD", "Title 4", 20020123, 1),
            publication("AAA-XCB", "Title 3", 20020124, 0),
        ],
    );
    let conn = Connection::from_store(std::sync::Arc::new(store), 100);

    let (_, rows) = rows_of(
        &conn,
        "SELECT ISBN, Name, Published, INT(Status) AS Status FROM Publication WHERE Status = 1 LIMIT 2",
        vec![],
    )
    .await;

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], Some(ColumnValue::Str("AAA-BBB".to_string())));
    assert_eq!(rows[1][0], Some(ColumnValue::Str("AAA-CCB".to_string())));
}

#[tokio::test]
async fn wildcard_subquery_wrapper_passes_inner_columns_through() {
    setup();
    let store = FakeStore::new().with_table(
        "Publication",
        publication_key_schema(),
        publication_attribute_definitions(),
        vec![
            publication("AAA-BBB", "Title 1", 20020121, 1),
            publication("AAA-XXX", "Title 2", 20020121, 1),
        ],
    );
    let conn = Connection::from_store(std::sync::Arc::new(store), 100);

    let (columns, rows) = rows_of(
        &conn,
        "SELECT * FROM (SELECT ISBN, Name FROM Publication) t WHERE 1=1",
        vec![],
    )
    .await;

    assert_eq!(columns, strs(&["ISBN", "Name"]));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], Some(ColumnValue::Str("AAA-BBB".to_string())));
    assert_eq!(rows[1][0], Some(ColumnValue::Str("AAA-XXX".to_string())));
}
