use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RWA identity provider.
///
/// Issues circuit-ready passport credentials for government-attested MRZ data.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Config {
    /// Path to the key file. The default is `$HOME/.rwa-identity/config.yml`.
    #[arg(long = "config-file", short = 'c', env = "RWA_IDENTITY_CONFIG")]
    pub config_file: Option<PathBuf>,
    /// Issuer key to sign with. If omitted, the first key in the key file is used.
    #[arg(long = "key")]
    pub key_name: Option<String>,
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Add, list or delete issuer keys.
    #[command(subcommand, name = "key")]
    Key(KeyCommand),
    /// Print the field element a string encodes to.
    Encode {
        /// At most 32 bytes of UTF-8 text.
        text: String,
    },
    /// Print the string a decimal field element encodes.
    Decode {
        value: String,
    },
    /// Check the government signature on an attestation payload.
    Verify {
        /// JSON file holding `credential`, `signature` and `pk` hex strings.
        payload: PathBuf,
    },
    /// Verify an attestation payload and sign the passport it covers.
    Issue {
        /// JSON file holding `credential`, `signature` and `pk` hex strings.
        payload: PathBuf,
        /// Write the signed credential here instead of to stdout.
        #[arg(long = "output", short = 'o')]
        output: Option<PathBuf>,
    },
    /// Check the issuer signature on a signed credential.
    Check {
        /// JSON file produced by `issue`.
        signed: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeyCommand {
    /// Create a new issuer key.
    #[command(name = "new", alias = "create")]
    Create {
        /// The name of the new key. If omitted, a random name is generated.
        name: Option<String>,
    },
    /// List all issuer keys.
    #[command(name = "list", alias = "ls")]
    List,
    /// Delete an issuer key.
    #[command(name = "delete", alias = "del", alias = "rm")]
    Delete {
        /// The name of the key to delete.
        name: String,
    },
}

pub struct GlobalOptions {
    pub config_file: Option<PathBuf>,
    pub key_name: Option<String>,
}

impl Config {
    pub fn to_parts(self) -> (GlobalOptions, CliCommand) {
        let global = GlobalOptions { config_file: self.config_file, key_name: self.key_name };
        (global, self.command)
    }
}
