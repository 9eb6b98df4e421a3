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

//! The transport collaborator contract (spec §1, §6): the planner and
//! cursor only ever talk to the store through [`StoreClient`]. The wire
//! transport, request signing and retry are out of this crate's scope — the
//! real implementation just forwards to `aws_sdk_dynamodb::Client`, the same
//! crate the teacher depends on for its own DynamoDB access.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType};
use aws_sdk_dynamodb::Client;

use crate::dsn::Dsn;
use crate::error::{Error, Result, TransportError};

/// One item as returned by `ExecuteStatement`.
pub type Item = HashMap<String, AttributeValue>;

/// Result of a single `ExecuteStatement` call.
#[derive(Debug, Clone, Default)]
pub struct ExecuteStatementOutput {
    pub items: Vec<Item>,
    pub next_token: Option<String>,
}

/// One key-schema entry (`HASH` or `RANGE`) plus its scalar attribute type.
#[derive(Debug, Clone)]
pub struct KeyAttribute {
    pub name: String,
    pub key_type: KeyType,
    pub attribute_type: ScalarAttributeType,
}

/// A snapshot of a table's schema, enough for the planner's attribute-type
/// lookups and the DDL driver's create/drop polling.
#[derive(Debug, Clone)]
pub struct TableDescription {
    pub table_name: String,
    pub key_schema: Vec<KeyAttribute>,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub creating: bool,
}

/// A request to create a table (spec §4.1 Create-table plan).
#[derive(Debug, Clone)]
pub struct CreateTableRequest {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
}

/// The transport collaborator's contract. All methods are the only
/// suspension points in the core (spec §5).
#[async_trait]
pub trait StoreClient: Send + Sync {
    async fn execute_statement(
        &self,
        statement: &str,
        parameters: Vec<AttributeValue>,
        next_token: Option<String>,
    ) -> Result<ExecuteStatementOutput>;

    async fn create_table(&self, request: CreateTableRequest) -> Result<()>;

    async fn delete_table(&self, table_name: &str) -> Result<()>;

    /// `None` when the table does not exist.
    async fn describe_table(&self, table_name: &str) -> Result<Option<TableDescription>>;
}

/// Production [`StoreClient`] backed by the real DynamoDB SDK.
pub struct AwsStore {
    client: Client,
}

impl AwsStore {
    /// Builds a client from a parsed DSN (spec §6). Credential loading is
    /// the caller's concern (out of scope, per spec §1); this only wires up
    /// the region and, when the DSN names a non-`aws` host, a custom
    /// endpoint (mirrors the teacher's `DynamoDb::new` local-mode override).
    pub async fn connect(dsn: &Dsn) -> Self {
        let region = aws_config::Region::new(dsn.region.clone());
        let mut loader = aws_config::from_env().region(region);
        if let Some(endpoint) = &dsn.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let client = Client::new(&loader.load().await);
        AwsStore { client }
    }

    pub fn from_client(client: Client) -> Self {
        AwsStore { client }
    }
}

#[async_trait]
impl StoreClient for AwsStore {
    async fn execute_statement(
        &self,
        statement: &str,
        parameters: Vec<AttributeValue>,
        next_token: Option<String>,
    ) -> Result<ExecuteStatementOutput> {
        let mut request = self.client.execute_statement().statement(statement);
        if !parameters.is_empty() {
            request = request.set_parameters(Some(parameters));
        }
        if let Some(token) = next_token {
            request = request.next_token(token);
        }
        let output = request.send().await.map_err(map_sdk_error)?;
        Ok(ExecuteStatementOutput {
            items: output.items.unwrap_or_default(),
            next_token: output.next_token,
        })
    }

    async fn create_table(&self, request: CreateTableRequest) -> Result<()> {
        self.client
            .create_table()
            .table_name(request.table_name)
            .set_attribute_definitions(Some(request.attribute_definitions))
            .set_key_schema(Some(request.key_schema))
            .billing_mode(BillingMode::Provisioned)
            .provisioned_throughput(
                aws_sdk_dynamodb::types::ProvisionedThroughput::builder()
                    .read_capacity_units(1)
                    .write_capacity_units(1)
                    .build()
                    .map_err(|e| Error::Schema(e.to_string()))?,
            )
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn delete_table(&self, table_name: &str) -> Result<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> Result<Option<TableDescription>> {
        let result = self.client.describe_table().table_name(table_name).send().await;
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                if is_resource_not_found(&err) {
                    return Ok(None);
                }
                return Err(map_sdk_error(err));
            }
        };
        let Some(table) = output.table else {
            return Ok(None);
        };
        let key_schema = table
            .key_schema
            .unwrap_or_default()
            .into_iter()
            .map(|k| KeyAttribute {
                name: k.attribute_name,
                key_type: k.key_type,
                attribute_type: ScalarAttributeType::S,
            })
            .collect::<Vec<_>>();
        let attribute_definitions = table.attribute_definitions.unwrap_or_default();
        let mut key_schema = key_schema;
        for key in key_schema.iter_mut() {
            if let Some(def) = attribute_definitions.iter().find(|d| d.attribute_name == key.name) {
                key.attribute_type = def.attribute_type.clone();
            }
        }
        let creating = matches!(
            table.table_status,
            Some(aws_sdk_dynamodb::types::TableStatus::Creating)
        );
        Ok(Some(TableDescription {
            table_name: table_name.to_string(),
            key_schema,
            attribute_definitions,
            creating,
        }))
    }
}

fn is_resource_not_found<E, R>(err: &aws_sdk_dynamodb::error::SdkError<E, R>) -> bool
where
    E: std::fmt::Debug,
{
    format!("{err:?}").contains("ResourceNotFoundException")
}

fn map_sdk_error<E, R>(err: aws_sdk_dynamodb::error::SdkError<E, R>) -> Error
where
    E: std::fmt::Debug,
{
    let message = format!("{err:?}");
    let code = message
        .split(|c: char| !c.is_alphanumeric())
        .find(|token| token.ends_with("Exception") || *token == "InternalServerError" || *token == "RequestLimitExceeded")
        .unwrap_or("TransportError")
        .to_string();
    Error::Transport(TransportError::from_code(&code, message))
}
