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

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the driver core (see spec §7).
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("failed to parse SQL# {0}")]
    Parse(String),

    #[error("SchemaError# {0}")]
    Schema(String),

    #[error("PlanError# {0}")]
    Plan(String),

    #[error("PlanError# unknown function: {0}")]
    UnknownFunction(String),

    #[error("PlanError# unsupported projection node: {0}")]
    UnsupportedProjection(String),

    #[error("PlanError# {0} is required")]
    RequiredAttributeMissing(String),

    #[error("PlanError# where clause is required")]
    WhereClauseRequired,

    #[error("PlanError# unsupported: {0}")]
    Unsupported(String),

    #[error("BindError# failed to encode args: {0}")]
    Encode(String),

    #[error("TransportError# {0}")]
    Transport(#[from] TransportError),

    #[error("DecodeError# {message}, snapshot: {snapshot}")]
    Decode { message: String, snapshot: String },

    #[error("unsupported query: {0}")]
    UnsupportedStatement(String),

    #[error("unsupported options: {0:?}")]
    UnsupportedDsnOptions(Vec<String>),

    #[error("invalid dsn: {0}")]
    InvalidDsn(String),

    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Mirrors the recognized transport-layer error codes of spec §6; anything
/// else surfaces as `Generic`.
#[derive(ThisError, Debug)]
pub enum TransportError {
    #[error("ConditionalCheckFailedException: {0}")]
    ConditionalCheckFailed(String),
    #[error("DuplicateItemException: {0}")]
    DuplicateItem(String),
    #[error("InternalServerError: {0}")]
    InternalServerError(String),
    #[error("ItemCollectionSizeLimitExceededException: {0}")]
    ItemCollectionSizeLimitExceeded(String),
    #[error("ProvisionedThroughputExceededException: {0}")]
    ProvisionedThroughputExceeded(String),
    #[error("RequestLimitExceeded: {0}")]
    RequestLimitExceeded(String),
    #[error("ResourceNotFoundException: {0}")]
    ResourceNotFound(String),
    #[error("TransactionConflictException: {0}")]
    TransactionConflict(String),
    #[error("{code}: {message}")]
    Generic { code: String, message: String },
}

impl TransportError {
    /// Maps a store-reported error code/message pair onto the recognized
    /// taxonomy (spec §6), falling back to a sanitized generic error.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "ConditionalCheckFailedException" => Self::ConditionalCheckFailed(message),
            "DuplicateItemException" => Self::DuplicateItem(message),
            "InternalServerError" => Self::InternalServerError(message),
            "ItemCollectionSizeLimitExceededException" => {
                Self::ItemCollectionSizeLimitExceeded(message)
            }
            "ProvisionedThroughputExceededException" => {
                Self::ProvisionedThroughputExceeded(message)
            }
            "RequestLimitExceeded" => Self::RequestLimitExceeded(message),
            "ResourceNotFoundException" => Self::ResourceNotFound(message),
            "TransactionConflictException" => Self::TransactionConflict(message),
            other => Self::Generic {
                code: other.to_string(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn formats_plan_errors() {
        let err = Error::RequiredAttributeMissing("Name".to_string());
        expect!["PlanError# Name is required"].assert_eq(&err.to_string());
    }

    #[test]
    fn maps_known_transport_codes() {
        let err = TransportError::from_code("ResourceNotFoundException", "no such table");
        expect!["ResourceNotFoundException: no such table"].assert_eq(&err.to_string());
    }

    #[test]
    fn falls_back_to_generic_for_unknown_codes() {
        let err = TransportError::from_code("SomeNewException", "boom");
        expect!["SomeNewException: boom"].assert_eq(&err.to_string());
    }
}
