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

//! Create/Drop-table planners (spec §4.1). Grounded on the original's
//! `CreateTableInput`/`DeleteTableInput` and `databaseAttributeType`
//! (`convert.go`): a lowercase-normalized map from DDL column type keywords
//! onto the store's scalar attribute types, and a `KEY` qualifier stripped
//! down to `HASH`/`RANGE`.

use aws_sdk_dynamodb::types::{AttributeDefinition, KeySchemaElement, KeyType, ScalarAttributeType};
use sqlparser::ast::Statement;

use crate::error::{Error, Result};
use crate::store::CreateTableRequest;

use super::params::ParamRegistry;
use super::type_model::TypeModel;
use super::{Ddl, Kind, Plan};

/// Case-insensitive mapping from a DDL column type keyword onto the store's
/// scalar attribute type (spec §4.1, §B). Only `HASH`/`RANGE` key columns
/// need an entry here — DynamoDB's key-schema attribute type has no `BOOL`
/// variant, so a `bool` column is only ever accepted as a non-key column
/// (see [`build_create_table`], which skips this lookup entirely for
/// non-key columns).
fn database_attribute_type(database_type: &str) -> Result<ScalarAttributeType> {
    match database_type.to_ascii_lowercase().as_str() {
        "int" | "numeric" | "decimal" => Ok(ScalarAttributeType::N),
        "varchar" | "text" | "string" => Ok(ScalarAttributeType::S),
        other => Err(Error::Unsupported(format!("unsupported key type: {other}"))),
    }
}

pub fn build_create_table(sql: &str, statement: Statement) -> Result<Plan> {
    let Statement::CreateTable(create) = statement else {
        return Err(Error::Unsupported("expected CREATE TABLE".to_string()));
    };

    let table_name = create.name.to_string();
    let mut attribute_definitions = Vec::with_capacity(create.columns.len());
    let mut key_schema = Vec::new();

    for column in &create.columns {
        let Some(key_type) = key_qualifier(column) else {
            // Non-key columns are schemaless in DynamoDB; only key columns
            // get an attribute definition (spec §4.1).
            continue;
        };

        let type_name = column.data_type.to_string();
        let attr_type = database_attribute_type(&type_name)?;
        attribute_definitions.push(
            AttributeDefinition::builder()
                .attribute_name(column.name.value.clone())
                .attribute_type(attr_type.clone())
                .build()
                .map_err(|e| Error::Plan(e.to_string()))?,
        );

        key_schema.push(
            KeySchemaElement::builder()
                .attribute_name(column.name.value.clone())
                .key_type(key_type)
                .build()
                .map_err(|e| Error::Plan(e.to_string()))?,
        );
    }

    Ok(Plan {
        kind: Kind::CreateTable,
        sql: sql.to_string(),
        table_name: table_name.clone(),
        partiql: String::new(),
        type_model: TypeModel::new(),
        params: ParamRegistry::new(),
        limit: None,
        ddl: Some(Ddl::CreateTable {
            if_not_exists: create.if_not_exists,
            request: CreateTableRequest {
                table_name,
                attribute_definitions,
                key_schema,
            },
        }),
    })
}

/// Column options in `sqlparser` don't model a bare trailing `HASH KEY` /
/// `RANGE KEY` qualifier, so this inspects the raw option text looking for
/// the `KEY` keyword and strips it down to `HASH`/`RANGE` (spec §4.1).
fn key_qualifier(column: &sqlparser::ast::ColumnDef) -> Option<KeyType> {
    for option in &column.options {
        let text = option.to_string().to_ascii_uppercase();
        if text.contains("HASH") {
            return Some(KeyType::Hash);
        }
        if text.contains("RANGE") {
            return Some(KeyType::Range);
        }
    }
    None
}

pub fn build_drop_table(sql: &str, statement: Statement) -> Result<Plan> {
    let Statement::Drop {
        names, if_exists, ..
    } = statement
    else {
        return Err(Error::Unsupported("expected DROP TABLE".to_string()));
    };
    let table_name = names
        .first()
        .map(|n| n.to_string())
        .ok_or_else(|| Error::Unsupported("DROP TABLE with no target".to_string()))?;

    Ok(Plan {
        kind: Kind::DropTable,
        sql: sql.to_string(),
        table_name: table_name.clone(),
        partiql: String::new(),
        type_model: TypeModel::new(),
        params: ParamRegistry::new(),
        limit: None,
        ddl: Some(Ddl::DropTable { if_exists, table_name }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_case_insensitively() {
        assert_eq!(database_attribute_type("INT").unwrap(), ScalarAttributeType::N);
        assert_eq!(database_attribute_type("Int").unwrap(), ScalarAttributeType::N);
        assert_eq!(database_attribute_type("text").unwrap(), ScalarAttributeType::S);
    }

    #[test]
    fn rejects_unknown_key_type() {
        assert!(database_attribute_type("json").is_err());
    }

    fn parse_create_table(sql: &str) -> Statement {
        let dialect = sqlparser::dialect::GenericDialect {};
        sqlparser::parser::Parser::parse_sql(&dialect, sql).unwrap().remove(0)
    }

    #[test]
    fn non_key_bool_column_is_accepted() {
        let statement = parse_create_table("CREATE TABLE t (id int HASH KEY, flag bool)");
        let plan = build_create_table("CREATE TABLE t (id int HASH KEY, flag bool)", statement).unwrap();
        let Some(Ddl::CreateTable { request, .. }) = plan.ddl else {
            panic!("expected a CreateTable plan");
        };
        assert_eq!(request.attribute_definitions.len(), 1);
        assert_eq!(request.attribute_definitions[0].attribute_name(), "id");
        assert_eq!(request.key_schema.len(), 1);
    }
}
