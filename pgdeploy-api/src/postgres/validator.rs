use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::postgres::service::{
    CreateRequest, CreateResponse, DeleteRequest, PostgresService, PostgresServiceError,
    UpdateRequest,
};

const MIN_DB_NAME_LENGTH: usize = 4;
const MAX_DB_NAME_LENGTH: usize = 100;
const MIN_USER_NAME_LENGTH: usize = 2;
const MAX_USER_NAME_LENGTH: usize = 100;
const MIN_USER_PASS_LENGTH: usize = 8;
const MAX_USER_PASS_LENGTH: usize = 64;
const MIN_PORT_NUM: i32 = 1024;
const MAX_PORT_NUM: i32 = 65353;
const MIN_REPLICAS: i32 = 1;
const MAX_REPLICAS: i32 = 10;

/// Access modes accepted for the backing volume, compared case-insensitively.
const VALID_ACCESS_MODES: [&str; 4] = [
    "ReadWriteOnce",
    "ReadOnlyMany",
    "ReadWriteMany",
    "ReadWriteOncePod",
];

/// Errors produced when a request fails a domain constraint.
///
/// Each variant carries the failing field and the offending value, so the
/// failing precondition can be reconstructed without inspecting logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A string field is outside its allowed length bounds.
    #[error("invalid {field} length of {actual} chars")]
    InvalidLength { field: &'static str, actual: usize },

    /// A numeric field is outside its allowed range.
    #[error("invalid {field} value of {actual}")]
    InvalidRange { field: &'static str, actual: i32 },

    /// A string field does not parse under its expected format.
    #[error("invalid {field} format of {actual}")]
    InvalidFormat { field: &'static str, actual: String },

    /// A field is not one of its supported enumeration values.
    #[error("invalid {field} value of {actual}")]
    InvalidEnum { field: &'static str, actual: String },

    /// The identifier is not a syntactically valid UUID.
    #[error("invalid {actual} UUID format")]
    InvalidUuid { actual: String },
}

/// Validates a create request against the domain constraints.
///
/// Checks run in a fixed order and return on the first failure.
pub fn validate_create(request: &CreateRequest) -> Result<(), ValidationError> {
    if request.db_name.len() < MIN_DB_NAME_LENGTH || request.db_name.len() > MAX_DB_NAME_LENGTH {
        return Err(ValidationError::InvalidLength {
            field: "db_name",
            actual: request.db_name.len(),
        });
    }
    if request.user_name.len() < MIN_USER_NAME_LENGTH
        || request.user_name.len() > MAX_USER_NAME_LENGTH
    {
        return Err(ValidationError::InvalidLength {
            field: "user_name",
            actual: request.user_name.len(),
        });
    }
    if request.user_pass.len() < MIN_USER_PASS_LENGTH
        || request.user_pass.len() > MAX_USER_PASS_LENGTH
    {
        return Err(ValidationError::InvalidLength {
            field: "user_pass",
            actual: request.user_pass.len(),
        });
    }
    if request.port_num < MIN_PORT_NUM || request.port_num > MAX_PORT_NUM {
        return Err(ValidationError::InvalidRange {
            field: "port_num",
            actual: request.port_num,
        });
    }
    if request.replicas < MIN_REPLICAS || request.replicas > MAX_REPLICAS {
        return Err(ValidationError::InvalidRange {
            field: "replicas",
            actual: request.replicas,
        });
    }
    if !is_valid_quantity(&request.capacity) {
        return Err(ValidationError::InvalidFormat {
            field: "capacity",
            actual: request.capacity.clone(),
        });
    }
    if !is_valid_access_mode(&request.access_mode) {
        return Err(ValidationError::InvalidEnum {
            field: "access_mode",
            actual: request.access_mode.clone(),
        });
    }

    Ok(())
}

/// Validates an update request: a well formed identifier and a replica count
/// within the same bounds as create.
pub fn validate_update(request: &UpdateRequest) -> Result<(), ValidationError> {
    if Uuid::parse_str(&request.id).is_err() {
        return Err(ValidationError::InvalidUuid {
            actual: request.id.clone(),
        });
    }
    if request.replicas < MIN_REPLICAS || request.replicas > MAX_REPLICAS {
        return Err(ValidationError::InvalidRange {
            field: "replicas",
            actual: request.replicas,
        });
    }

    Ok(())
}

/// Validates a delete request: the identifier must be a well formed UUID.
pub fn validate_delete(request: &DeleteRequest) -> Result<(), ValidationError> {
    if Uuid::parse_str(&request.id).is_err() {
        return Err(ValidationError::InvalidUuid {
            actual: request.id.clone(),
        });
    }

    Ok(())
}

fn is_valid_access_mode(access_mode: &str) -> bool {
    VALID_ACCESS_MODES
        .iter()
        .any(|valid| valid.eq_ignore_ascii_case(access_mode))
}

/// Reports whether `value` is a well formed Kubernetes resource quantity.
///
/// A quantity is a signed decimal number followed by an optional binary
/// suffix (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`), decimal suffix (`n`, `u`,
/// `m`, `k`, `M`, `G`, `T`, `P`, `E`), or decimal exponent (`e3`, `E-2`).
fn is_valid_quantity(value: &str) -> bool {
    let rest = value.strip_prefix(['+', '-']).unwrap_or(value);

    let integer_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if integer_end == 0 {
        return false;
    }
    let mut suffix = &rest[integer_end..];

    if let Some(fraction) = suffix.strip_prefix('.') {
        let fraction_end = fraction
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(fraction.len());
        if fraction_end == 0 {
            return false;
        }
        suffix = &fraction[fraction_end..];
    }

    match suffix {
        "" => true,
        "Ki" | "Mi" | "Gi" | "Ti" | "Pi" | "Ei" => true,
        "n" | "u" | "m" | "k" | "M" | "G" | "T" | "P" | "E" => true,
        _ => is_valid_exponent(suffix),
    }
}

fn is_valid_exponent(suffix: &str) -> bool {
    let Some(exponent) = suffix.strip_prefix(['e', 'E']) else {
        return false;
    };
    let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);

    !exponent.is_empty() && exponent.bytes().all(|b| b.is_ascii_digit())
}

/// Validating decorator around another [`PostgresService`].
///
/// Rejects requests violating the domain constraints before the inner service
/// is reached, so no cluster call is made for an invalid request. Composed at
/// construction time with either the real provisioner or the pass-through
/// default service.
pub struct ValidatedPostgresService<S> {
    inner: S,
}

impl<S> ValidatedPostgresService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: PostgresService> PostgresService for ValidatedPostgresService<S> {
    async fn create(
        &self,
        request: CreateRequest,
    ) -> Result<CreateResponse, PostgresServiceError> {
        validate_create(&request)?;
        self.inner.create(request).await
    }

    async fn update(&self, request: UpdateRequest) -> Result<(), PostgresServiceError> {
        validate_update(&request)?;
        self.inner.update(request).await
    }

    async fn delete(&self, request: DeleteRequest) -> Result<(), PostgresServiceError> {
        validate_delete(&request)?;
        self.inner.delete(request).await
    }
}
