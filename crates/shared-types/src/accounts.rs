//! # Accounts
//!
//! A local account holds the RSA keypair of one fleet.

use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_hex, FleetKeyPair};

use crate::entities::Fleet;
use crate::errors::ModelError;

/// A locally stored fleet keypair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Local storage id.
    #[serde(default)]
    pub id: Option<u64>,
    /// Unique local name.
    pub name: String,
    /// The account used for mining.
    pub active: bool,
    /// PKCS#8 PEM private key.
    pub private_key: String,
    /// Shrunk public key.
    pub public_key: String,
}

impl Account {
    /// Build an account from a keypair.
    pub fn from_keypair(name: impl Into<String>, keypair: &FleetKeyPair) -> Result<Self, ModelError> {
        Ok(Self {
            id: None,
            name: name.into(),
            active: false,
            private_key: (*keypair.private_pem()?).clone(),
            public_key: keypair.public_key().to_string(),
        })
    }

    /// Restore the signing keypair.
    pub fn keypair(&self) -> Result<FleetKeyPair, ModelError> {
        Ok(FleetKeyPair::from_private_pem(&self.private_key)?)
    }

    /// `SHA-256(public_key)`.
    pub fn fleet_hash(&self) -> String {
        sha256_hex(&self.public_key)
    }

    /// Full fleet reference for events.
    pub fn fleet(&self) -> Fleet {
        Fleet {
            hash: self.fleet_hash(),
            public_key: Some(self.public_key.clone()),
        }
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active)
            .field("fleet_hash", &self.fleet_hash())
            .finish_non_exhaustive()
    }
}
