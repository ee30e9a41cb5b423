use crate::validator::Validator;
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use serde::{Deserialize, Deserializer, Serialize};

pub const EMAIL_MAX_BYTES: usize = 50;
pub const NAME_MAX_BYTES: usize = 25;

/// One row of the `credentials` table.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Credential {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub email_address: String,
    pub name: String,
    /// Bumped by one on every update.
    pub version: i32,
}

impl Credential {
    /// A not-yet-persisted credential; `id`, `created_at` and `version` are
    /// filled in by the store on insert.
    pub fn new(email_address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            created_at: DateTime::<Utc>::default(),
            email_address: email_address.into(),
            name: name.into(),
            version: 0,
        }
    }
}

/// Body of `POST /v1/signin`. Missing or null fields decode as empty strings
/// and are reported by validation instead of the decoder.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewCredential {
    #[serde(deserialize_with = "null_as_empty")]
    pub email_address: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<NewCredential> for Credential {
    fn from(input: NewCredential) -> Self {
        Credential::new(input.email_address, input.name)
    }
}

/// Body of `PATCH /v1/signin/{id}`. `None` (absent or null) leaves the field
/// unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialPatch {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

pub fn merge(existing: Credential, patch: CredentialPatch) -> Credential {
    Credential {
        email_address: patch.email_address.unwrap_or(existing.email_address),
        name: patch.name.unwrap_or(existing.name),
        ..existing
    }
}

pub fn validate_credential(v: &mut Validator, credential: &Credential) {
    v.check(
        !credential.email_address.is_empty(),
        "email_address",
        "must be provided",
    );
    v.check(!credential.name.is_empty(), "name", "must be provided");
    v.check(
        credential.email_address.len() <= EMAIL_MAX_BYTES,
        "email_address",
        "must not be more than 50 bytes long",
    );
    v.check(
        credential.name.len() <= NAME_MAX_BYTES,
        "name",
        "must not be more than 25 bytes long",
    );
    // surrounding whitespace is not part of the address
    v.check(
        EmailAddress::is_valid(credential.email_address.trim()),
        "email_address",
        "invalid email provided",
    );
}
