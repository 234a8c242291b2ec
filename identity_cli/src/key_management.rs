use crate::error::ConfigError;
use libidentity::{FieldElement, IssuerKeyPair, IssuerPublicKey, IssuerSecret, KeyError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use zeroize::Zeroize;

/// An issuer key as written to the key file. The secret is a decimal string.
#[derive(Clone, Deserialize, Serialize)]
pub struct StoredIssuerKey {
    secret: String,
    public_key: IssuerPublicKey,
}

impl StoredIssuerKey {
    pub fn from_key_pair(key_pair: &IssuerKeyPair) -> Self {
        let secret = key_pair.secret().expose_decimal().to_string();
        Self { secret, public_key: *key_pair.public_key() }
    }

    pub fn public_key(&self) -> &IssuerPublicKey {
        &self.public_key
    }

    /// Rebuilds the key pair, checking that the stored public key belongs to the stored secret.
    pub fn to_key_pair(&self) -> Result<IssuerKeyPair, KeyError> {
        let secret = IssuerSecret::from_decimal(&self.secret)?;
        IssuerKeyPair::from_parts(secret, self.public_key)
    }
}

impl Drop for StoredIssuerKey {
    fn drop(&mut self) {
        self.secret.zeroize();
    }
}

impl Display for StoredIssuerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pk = self.public_key.as_point();
        write!(f, "pk = ({}, {})", FieldElement::from_fq(&pk.x()), FieldElement::from_fq(&pk.y()))
    }
}

#[derive(Default, Deserialize, Serialize)]
pub struct LocalKeySet {
    pub keys: BTreeMap<String, StoredIssuerKey>,
}

impl LocalKeySet {
    pub fn try_load<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let keys = load_config_file(path)?;
        Ok(keys)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        save_config_file(path, self)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&StoredIssuerKey> {
        self.keys.get(name)
    }

    pub fn insert(&mut self, name: String, key: StoredIssuerKey) -> Option<StoredIssuerKey> {
        self.keys.insert(name, key)
    }

    pub fn remove<S: AsRef<str>>(&mut self, name: S) -> Option<StoredIssuerKey> {
        self.keys.remove(name.as_ref())
    }

    /// The key pair stored under `name`, or the first one in the file when no name is given.
    pub fn key_pair(&self, name: Option<&str>) -> Option<Result<IssuerKeyPair, ConfigError>> {
        let (name, stored) = match name {
            Some(name) => self.keys.get_key_value(name)?,
            None => self.keys.iter().next()?,
        };
        Some(stored.to_key_pair().map_err(|source| ConfigError::InvalidKey { name: name.clone(), source }))
    }
}

pub fn random_key_name() -> String {
    format!("issuer-{:08x}", rand::rng().random::<u32>())
}

pub fn default_config_path() -> PathBuf {
    let mut home = std::env::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.push(".rwa-identity");
    home.push("config.yml");
    home
}

pub fn load_config_file<P: AsRef<Path>>(path: Option<P>) -> Result<LocalKeySet, ConfigError> {
    let path = path.map(|p| p.as_ref().to_path_buf()).unwrap_or_else(default_config_path);
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let keys = serde_yml::from_reader(reader)?;
    Ok(keys)
}

pub fn save_config_file<P: AsRef<Path>>(path: P, keys: &LocalKeySet) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_yml::to_writer(writer, keys)?;
    Ok(())
}
