//! TrustDoc CLI
//!
//! Operator front end for fetching and verifying trust documents, managing
//! root keys, and writing requests for the master key provider.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use zeroize::Zeroizing;

use trustdoc_core::Config;
use trustdoc_crypto::KdfParams;
use trustdoc_document::{
    issue_document, new_user_request, DocumentError, MasterRequest, TrustDocument,
    TrustDocumentFetcher, TrustDocumentVerifier, TrustPayload,
};
use trustdoc_keys::{
    KeychainDirLoader, LoadOptions, RootKey, RootKeyChain, TracingAuditSink,
};

const DEFAULT_PASSPHRASE_ENV: &str = "TRUSTDOC_PASSPHRASE";

#[derive(Parser)]
#[command(name = "trustdoc")]
#[command(about = "Fetch and verify trust documents, manage root keys")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct PassphraseArg {
    /// Environment variable holding the key passphrase
    #[arg(long, default_value = DEFAULT_PASSPHRASE_ENV)]
    passphrase_env: String,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a trust document from the first reachable url and verify it
    Testdoc {
        /// Candidate url, tried in the order given
        #[arg(long = "url", required = true)]
        urls: Vec<String>,

        /// Per-url timeout, overrides fetch.timeout_ms
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Only accept documents whose _ROOT key is stored in this keychain directory
        #[arg(long)]
        pinned: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Generate a new root key and store it in a keychain directory
    Keygen {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        comment: String,

        /// Keychain directory, defaults to keys.keychain_dir
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        passphrase: PassphraseArg,

        #[arg(long)]
        json: bool,
    },

    /// Sign a payload JSON file into a trust document
    Issue {
        /// Root key file (JSON)
        #[arg(long)]
        key: PathBuf,

        /// Payload file with `urls` and `keys`
        #[arg(long)]
        payload: PathBuf,

        /// Write the armored document here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        passphrase: PassphraseArg,
    },

    /// Load a keychain directory and report which keys were admitted
    Keychain {
        /// Keychain directory, defaults to keys.keychain_dir
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Admit keys without running their self-test
        #[arg(long)]
        skip_validation: bool,

        #[command(flatten)]
        passphrase: PassphraseArg,

        #[arg(long)]
        json: bool,
    },

    /// Write a request for the master key provider
    Request {
        #[arg(long, required_unless_present = "new_user")]
        action: Option<String>,

        /// Request data as JSON
        #[arg(long, default_value = "null")]
        data: String,

        /// Shortcut for a new_user request with this name
        #[arg(long, conflicts_with = "action")]
        new_user: Option<String>,

        #[arg(long, default_value = "")]
        comment: String,

        #[arg(long)]
        out: PathBuf,

        /// Sign the request with this root key file
        #[arg(long)]
        sign_with: Option<PathBuf>,

        #[command(flatten)]
        passphrase: PassphraseArg,
    },
}

/// JSON output for testdoc command
#[derive(Debug, Serialize)]
struct TestdocOutput {
    verified: bool,
    resolved_url: Option<String>,
    failed_step: Option<String>,
    message: String,
    key_names: Vec<String>,
}

/// JSON output for keygen command
#[derive(Debug, Serialize)]
struct KeygenOutput {
    name: String,
    key_id: String,
    public: String,
    path: String,
}

/// JSON output for keychain command
#[derive(Debug, Serialize)]
struct KeychainOutput {
    directory: String,
    writable: bool,
    admitted: Vec<String>,
    rejected: Vec<String>,
    failed: Vec<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize output: {}", e))?;
    println!("{}", text);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .map_err(|e| format!("Failed to load config {}: {}", path.display(), e))?,
        None => Config::default(),
    };
    config
        .validate()
        .map_err(|e| format!("Invalid config: {}", e))?;
    Ok(config)
}

fn read_passphrase(arg: &PassphraseArg) -> Result<Zeroizing<String>, String> {
    std::env::var(&arg.passphrase_env)
        .map(Zeroizing::new)
        .map_err(|_| format!("Passphrase variable {} is not set", arg.passphrase_env))
}

fn read_key(path: &Path) -> Result<RootKey, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read key {}: {}", path.display(), e))?;
    RootKey::from_json(&json).map_err(|e| format!("Failed to parse key {}: {}", path.display(), e))
}

fn keychain_dir(explicit: Option<PathBuf>, config: &Config) -> Result<PathBuf, String> {
    explicit
        .or_else(|| config.keys.keychain_dir.clone())
        .ok_or_else(|| "No keychain directory given and keys.keychain_dir is not set".to_string())
}

fn cmd_testdoc(
    config: &Config,
    urls: Vec<String>,
    timeout_ms: Option<u64>,
    pinned: Option<PathBuf>,
    json: bool,
) -> Result<(), String> {
    let mut fetch_config = config.fetch.clone();
    if let Some(ms) = timeout_ms {
        if ms == 0 {
            return Err("--timeout-ms must be greater than zero".to_string());
        }
        fetch_config.timeout_ms = ms;
    }

    let fetcher = TrustDocumentFetcher::from_config(&fetch_config)
        .map_err(|e| format!("Failed to build fetcher: {}", e))?;
    let verifier = match pinned {
        Some(dir) => {
            let chain = Arc::new(RootKeyChain::new(Arc::new(TracingAuditSink)));
            KeychainDirLoader::new(dir)
                .load(
                    &chain,
                    &LoadOptions {
                        passphrase: Zeroizing::default(),
                        skip_validation: true,
                    },
                )
                .map_err(|e| format!("Failed to load pinned keys: {}", e))?;
            TrustDocumentVerifier::with_pinned_roots(chain)
        }
        None => TrustDocumentVerifier::new(),
    };

    let mut doc = TrustDocument::new(urls).map_err(|e| e.to_string())?;
    let outcome = doc
        .load(&fetcher)
        .and_then(|_| doc.validate(&verifier).map(|_| ()));

    match outcome {
        Ok(()) => {
            let key_names: Vec<String> = doc
                .payload()
                .map(|p| p.keys.keys().cloned().collect())
                .unwrap_or_default();
            if json {
                print_json(&TestdocOutput {
                    verified: true,
                    resolved_url: doc.resolved_url().map(str::to_string),
                    failed_step: None,
                    message: "Document is valid".to_string(),
                    key_names,
                })?;
            } else {
                println!("✓ Document is VALID");
                println!("  Url:  {}", doc.resolved_url().unwrap_or_default());
                println!("  Keys: {}", key_names.join(", "));
            }
            Ok(())
        }
        Err(e) => {
            report_document_failure(&doc, &e, json)?;
            Err(format!("Verification failed at {}: {}", e.step(), e))
        }
    }
}

fn report_document_failure(doc: &TrustDocument, err: &DocumentError, json: bool) -> Result<(), String> {
    if json {
        print_json(&TestdocOutput {
            verified: false,
            resolved_url: doc.resolved_url().map(str::to_string),
            failed_step: Some(err.step().to_string()),
            message: err.to_string(),
            key_names: Vec::new(),
        })
    } else {
        println!("✗ Document is INVALID");
        println!("  Step:  {}", err.step());
        println!("  Error: {}", err);
        Ok(())
    }
}

fn cmd_keygen(
    config: &Config,
    name: String,
    comment: String,
    out: Option<PathBuf>,
    passphrase: &PassphraseArg,
    json: bool,
) -> Result<(), String> {
    let dir = keychain_dir(out, config)?;
    let passphrase = read_passphrase(passphrase)?;
    let key = RootKey::generate(&passphrase, name, comment, KdfParams::from(&config.keys.kdf))
        .map_err(|e| format!("Failed to generate key: {}", e))?;

    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    let path = KeychainDirLoader::new(&dir)
        .store(&key)
        .map_err(|e| format!("Failed to store key: {}", e))?;

    if json {
        print_json(&KeygenOutput {
            name: key.name().to_string(),
            key_id: key.key_id(),
            public: key.public_key().to_text(),
            path: path.display().to_string(),
        })?;
    } else {
        println!("Key id: {}", key.key_id());
        println!("Public: {}", key.public_key().to_text());
        println!("Key saved to: {}", path.display());
    }
    Ok(())
}

fn cmd_issue(
    key: PathBuf,
    payload: PathBuf,
    out: Option<PathBuf>,
    passphrase: &PassphraseArg,
) -> Result<(), String> {
    let key = read_key(&key)?;
    let payload_json = fs::read_to_string(&payload)
        .map_err(|e| format!("Failed to read payload {}: {}", payload.display(), e))?;
    let payload: TrustPayload = serde_json::from_str(&payload_json)
        .map_err(|e| format!("Failed to parse payload: {}", e))?;
    let passphrase = read_passphrase(passphrase)?;

    let armored = issue_document(&payload, &key, &passphrase)
        .map_err(|e| format!("Failed to issue document: {}", e))?;

    match out {
        Some(path) => {
            fs::write(&path, armored).map_err(|e| format!("Failed to write output: {}", e))?;
            eprintln!("Document saved to: {}", path.display());
        }
        None => print!("{}", armored),
    }
    Ok(())
}

fn cmd_keychain(
    config: &Config,
    dir: Option<PathBuf>,
    skip_validation: bool,
    passphrase: &PassphraseArg,
    json: bool,
) -> Result<(), String> {
    let dir = keychain_dir(dir, config)?;
    let passphrase = if skip_validation {
        Zeroizing::new(String::new())
    } else {
        read_passphrase(passphrase)?
    };

    let chain = RootKeyChain::new(Arc::new(TracingAuditSink));
    let loader = KeychainDirLoader::new(&dir);
    let report = loader
        .load(
            &chain,
            &LoadOptions {
                passphrase,
                skip_validation,
            },
        )
        .map_err(|e| format!("Failed to load keychain: {}", e))?;

    if json {
        print_json(&KeychainOutput {
            directory: dir.display().to_string(),
            writable: report.writable,
            admitted: report.admitted.clone(),
            rejected: report.rejected.clone(),
            failed: report
                .failed
                .iter()
                .map(|(path, reason)| format!("{}: {}", path.display(), reason))
                .collect(),
        })?;
    } else {
        println!("Keychain: {}", dir.display());
        for name in &report.admitted {
            println!("  ✓ {}", name);
        }
        for name in &report.rejected {
            println!("  ✗ {} (self-test failed)", name);
        }
        for (path, reason) in &report.failed {
            println!("  ✗ {} ({})", path.display(), reason);
        }
        if !report.writable {
            println!("  (read-only: new keys cannot be written)");
        }
    }

    if report.admitted.is_empty() && report.total() > 0 {
        return Err("No keys admitted".to_string());
    }
    Ok(())
}

struct RequestArgs {
    action: Option<String>,
    data: String,
    new_user: Option<String>,
    comment: String,
    out: PathBuf,
    sign_with: Option<PathBuf>,
}

fn cmd_request(args: RequestArgs, passphrase: &PassphraseArg) -> Result<(), String> {
    let request = match (args.new_user, args.action) {
        (Some(name), _) => new_user_request(&name, &args.comment),
        (None, Some(action)) => {
            let data = serde_json::from_str(&args.data)
                .map_err(|e| format!("Failed to parse --data: {}", e))?;
            MasterRequest::new(action, data)
        }
        (None, None) => return Err("Either --action or --new-user is required".to_string()),
    };

    match args.sign_with {
        Some(key_path) => {
            let key = read_key(&key_path)?;
            let passphrase = read_passphrase(passphrase)?;
            let armored = request
                .sign(&key, &passphrase)
                .map_err(|e| format!("Failed to sign request: {}", e))?;
            fs::write(&args.out, armored).map_err(|e| format!("Failed to write request: {}", e))?;
        }
        None => request
            .write_to_file(&args.out)
            .map_err(|e| format!("Failed to write request: {}", e))?,
    }

    println!("Request '{}' saved to: {}", request.action, args.out.display());
    Ok(())
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(cli.config.as_deref())?;

    let mut logging = config.logging.clone();
    logging.json |= cli.log_json;
    trustdoc_core::logging::init_from_config(&logging);
    tracing::debug!(timeout_ms = config.fetch.timeout_ms, "Configuration loaded");

    match cli.command {
        Command::Testdoc {
            urls,
            timeout_ms,
            pinned,
            json,
        } => cmd_testdoc(&config, urls, timeout_ms, pinned, json),
        Command::Keygen {
            name,
            comment,
            out,
            passphrase,
            json,
        } => cmd_keygen(&config, name, comment, out, &passphrase, json),
        Command::Issue {
            key,
            payload,
            out,
            passphrase,
        } => cmd_issue(key, payload, out, &passphrase),
        Command::Keychain {
            dir,
            skip_validation,
            passphrase,
            json,
        } => cmd_keychain(&config, dir, skip_validation, &passphrase, json),
        Command::Request {
            action,
            data,
            new_user,
            comment,
            out,
            sign_with,
            passphrase,
        } => cmd_request(
            RequestArgs {
                action,
                data,
                new_user,
                comment,
                out,
                sign_with,
            },
            &passphrase,
        ),
    }
}

fn main() {
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
