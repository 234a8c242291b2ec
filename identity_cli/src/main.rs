use anyhow::anyhow;
use clap::Parser;
use identity_cli::config::{CliCommand, Config, GlobalOptions, KeyCommand};
use identity_cli::error::ConfigError;
use identity_cli::key_management::{default_config_path, random_key_name, LocalKeySet, StoredIssuerKey};
use libidentity::{
    decode_text, encode, verify_government_signature, verify_signed_credential, Blake2bPrimitives, FieldElement,
    GovernmentSignaturePayload, IdentityProvider, IssuerKeyPair, SignedCredential,
};
use log::*;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();
    let config: Config = Config::parse();
    let (global_options, command) = config.to_parts();

    let result = match command {
        CliCommand::Key(key_command) => exec_key_command(key_command, global_options),
        CliCommand::Encode { text } => exec_encode(&text),
        CliCommand::Decode { value } => exec_decode(&value),
        CliCommand::Verify { payload } => exec_verify(&payload),
        CliCommand::Issue { payload, output } => exec_issue(&payload, output.as_deref(), global_options),
        CliCommand::Check { signed } => exec_check(&signed),
    };

    if let Err(err) = result {
        eprintln!("** Error ** \n {err}");
        std::process::exit(1);
    }
}

fn exec_key_command(cmd: KeyCommand, options: GlobalOptions) -> Result<(), anyhow::Error> {
    let path = options.config_file.unwrap_or_else(default_config_path);
    match cmd {
        KeyCommand::Create { name } => {
            let mut keys = load_or_create_keys(&path)?;
            let name = name.unwrap_or_else(random_key_name);
            if keys.contains(&name) {
                return Err(anyhow!("Key with name {name} already exists."));
            }
            let stored = StoredIssuerKey::from_key_pair(&IssuerKeyPair::random(&mut rand::rng()));
            println!("Key created: {name}: {stored}");
            keys.insert(name, stored);
            println!("Saving keys to {}", path.to_str().unwrap_or("[invalid utf-8 path]"));
            keys.save(&path)?;
        }
        KeyCommand::List => {
            let keys = load_or_create_keys(&path)?;
            println!("{} issuer keys found.", keys.len());
            for (name, key) in &keys.keys {
                println!("{name}: {key}");
            }
        }
        KeyCommand::Delete { name } => {
            let mut keys = load_or_create_keys(&path)?;
            match keys.remove(&name) {
                Some(key) => {
                    println!("Key deleted: {name}: {key}");
                    keys.save(&path)?;
                }
                None => return Err(anyhow!("Key with name {name} not found.")),
            }
        }
    }
    Ok(())
}

fn load_or_create_keys(path: &PathBuf) -> Result<LocalKeySet, anyhow::Error> {
    match LocalKeySet::try_load(Some(path)) {
        Ok(keys) => Ok(keys),
        Err(ConfigError::IoError(err)) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                println!("No configuration file found at {}", path.to_str().unwrap_or("[invalid utf-8 path]"));
                Ok(LocalKeySet::default())
            } else {
                Err(anyhow!("Error reading configuration file: {err}"))
            }
        }
        Err(err) => Err(anyhow!("Configuration error: {err}")),
    }
}

fn assign_key_pair(options: &GlobalOptions) -> Result<IssuerKeyPair, anyhow::Error> {
    let path = options.config_file.clone().unwrap_or_else(default_config_path);
    info!("Loading issuer keys from {}", path.to_str().unwrap_or("[invalid utf-8 path]"));
    let keys = load_or_create_keys(&path)?;
    if keys.is_empty() {
        return Err(anyhow!("No issuer keys found. Use `rwa-identity key new` to create one."));
    }
    match keys.key_pair(options.key_name.as_deref()) {
        Some(pair) => Ok(pair?),
        None => Err(anyhow!("Key not found: {}", options.key_name.as_deref().unwrap_or_default())),
    }
}

fn read_file(path: &Path) -> Result<String, anyhow::Error> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Could not read {}: {e}", path.to_str().unwrap_or("[invalid utf-8 path]")))
}

fn exec_encode(text: &str) -> Result<(), anyhow::Error> {
    println!("{}", encode(text)?);
    Ok(())
}

fn exec_decode(value: &str) -> Result<(), anyhow::Error> {
    let value: FieldElement = value.parse()?;
    let text = decode_text(&value).ok_or_else(|| anyhow!("{value} does not encode UTF-8 text"))?;
    println!("{text}");
    Ok(())
}

fn exec_verify(payload: &Path) -> Result<(), anyhow::Error> {
    let payload = GovernmentSignaturePayload::from_json_str(&read_file(payload)?)?;
    verify_government_signature(&payload)?;
    println!("Government signature is valid.");
    Ok(())
}

fn exec_issue(payload: &Path, output: Option<&Path>, options: GlobalOptions) -> Result<(), anyhow::Error> {
    let key_pair = assign_key_pair(&options)?;
    let provider = IdentityProvider::new(key_pair);
    let signed = provider.issue_json_str(&read_file(payload)?)?;
    let json = serde_json::to_string_pretty(&signed)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Signed credential written to {}", path.to_str().unwrap_or("[invalid utf-8 path]"));
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn exec_check(signed: &Path) -> Result<(), anyhow::Error> {
    let signed: SignedCredential = serde_json::from_str(&read_file(signed)?)?;
    if verify_signed_credential(&Blake2bPrimitives, &signed)? {
        println!("Issuer signature is valid.");
        Ok(())
    } else {
        Err(anyhow!("Issuer signature is invalid."))
    }
}
