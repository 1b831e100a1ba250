#![deny(unused_must_use)]

#[macro_use]
extern crate log;

use std::error::Error;
use std::str::FromStr;

use clap::{Arg, ArgMatches, Command, value_parser};
use env_logger::Env;

use rusty_envelope::{aes, envelope, hash, kdf, rsa};
use rusty_envelope::kdf::Salt;
use rusty_envelope::misc::get_password_from_tty;
use rusty_envelope::params::*;
use rusty_envelope::selftest::{Peer, TestRunner};

type CommandResult = Result<String, Box<dyn Error>>;

fn hash_arg() -> Arg {
    Arg::new("hash").long("hash")
        .help("Hash algorithm: SHA-1, SHA-256, SHA-384 or SHA-512")
        .default_value("SHA-256")
        .value_parser(HashAlgorithm::from_str)
}

fn length_arg() -> Arg {
    Arg::new("length").long("length")
        .help("AES key length in bits")
        .default_value("256")
        .value_parser(value_parser!(u32))
}

fn key_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name)
        .help(help)
        .required(true)
}

fn input_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
}

fn cli() -> Command {
    Command::new("Rusty Envelope").version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .subcommand(Command::new("selftest")
            .about("Run the interoperability tests against an in-process peer")
            .arg(Arg::new("peer-modulus").long("peer-modulus")
                .help("Modulus length of the peer's RSA key")
                .default_value("4096")
                .value_parser(value_parser!(u32))))
        .subcommand(Command::new("aes-key")
            .about("Generate a base64 AES-GCM key")
            .arg(length_arg()))
        .subcommand(Command::new("aes-encrypt")
            .about("Encrypt text with AES-GCM")
            .arg(key_arg("key", "Base64 AES key"))
            .arg(input_arg("message", "Text to encrypt")))
        .subcommand(Command::new("aes-decrypt")
            .about("Decrypt base64 AES-GCM cipher text")
            .arg(key_arg("key", "Base64 AES key"))
            .arg(input_arg("cipher-text", "Base64 iv and cipher text")))
        .subcommand(Command::new("key-pair")
            .about("Generate an RSA-OAEP key pair as JSON")
            .arg(Arg::new("modulus").long("modulus")
                .help("Modulus length in bits")
                .default_value("4096")
                .value_parser(value_parser!(u32)))
            .arg(hash_arg()))
        .subcommand(Command::new("rsa-encrypt")
            .about("Encrypt text for the holder of a private key")
            .arg(key_arg("public-key", "Base64 SPKI public key"))
            .arg(hash_arg())
            .arg(input_arg("message", "Text to encrypt")))
        .subcommand(Command::new("rsa-decrypt")
            .about("Decrypt base64 RSA-OAEP cipher text")
            .arg(key_arg("private-key", "Base64 PKCS8 private key"))
            .arg(hash_arg())
            .arg(input_arg("cipher-text", "Base64 cipher text")))
        .subcommand(Command::new("seal")
            .about("Wrap an AES key under an RSA public key")
            .arg(key_arg("public-key", "Base64 SPKI public key"))
            .arg(key_arg("key", "Base64 AES key"))
            .arg(hash_arg()))
        .subcommand(Command::new("open")
            .about("Unwrap an AES key with an RSA private key")
            .arg(key_arg("private-key", "Base64 PKCS8 private key"))
            .arg(hash_arg())
            .arg(length_arg())
            .arg(input_arg("envelope", "Base64 envelope")))
        .subcommand(Command::new("derive")
            .about("Derive an AES key from a password read from the terminal")
            .arg(Arg::new("salt").long("salt")
                .help("Base64 salt, a fresh one is generated if omitted"))
            .arg(Arg::new("iterations").long("iterations")
                .help("PBKDF2 iterations")
                .default_value("250000")
                .value_parser(value_parser!(u32)))
            .arg(hash_arg())
            .arg(length_arg()))
        .subcommand(Command::new("hash")
            .about("Digest text, printing base64")
            .arg(hash_arg())
            .arg(input_arg("text", "Text to digest")))
}

fn text<'a>(args: &'a ArgMatches, name: &str) -> &'a str {
    args.get_one::<String>(name).map(String::as_str).unwrap_or_else(|| {
        error!("Missing argument {}", name);
        std::process::exit(2);
    })
}

fn number(args: &ArgMatches, name: &str) -> u32 {
    args.get_one::<u32>(name).copied().unwrap_or_else(|| {
        error!("Missing argument {}", name);
        std::process::exit(2);
    })
}

fn hash_algorithm(args: &ArgMatches) -> HashAlgorithm {
    args.get_one::<HashAlgorithm>("hash").copied().unwrap_or(HashAlgorithm::Sha256)
}

async fn selftest(args: &ArgMatches) -> CommandResult {
    let peer = Peer::new(number(args, "peer-modulus")).await?;
    let results = TestRunner::with_default_tests(peer).run().await;
    let failed = results.iter().filter(|result| !result.is_ok).count();
    let output = serde_json::to_string_pretty(&results)?;
    if failed > 0 {
        println!("{}", output);
        return Err(format!("{} of {} tests failed", failed, results.len()).into());
    }
    Ok(output)
}

async fn execute(command: &str, args: &ArgMatches) -> CommandResult {
    let output = match command {
        "selftest" => return selftest(args).await,
        "aes-key" => {
            aes::generate_key_base64(AesKeyParams { length: number(args, "length") }).await?
        },
        "aes-encrypt" => {
            aes::encrypt_string(text(args, "key"), text(args, "message"), &AesGcmParams::default()).await?
        },
        "aes-decrypt" => {
            aes::decrypt_string(text(args, "key"), text(args, "cipher-text"), &AesGcmParams::default()).await?
        },
        "key-pair" => {
            let params = RsaKeyParams {
                modulus_length: number(args, "modulus"),
                hash: hash_algorithm(args),
                ..Default::default()
            };
            let pair = rsa::generate_key_pair_base64(params).await?;
            serde_json::to_string_pretty(&pair)?
        },
        "rsa-encrypt" => {
            let params = RsaImportParams { hash: hash_algorithm(args) };
            let key = rsa::import_public_key(text(args, "public-key"), params).await?;
            rsa::encrypt_string_with_public_key(key, text(args, "message"), &OaepParams::default()).await?
        },
        "rsa-decrypt" => {
            let params = RsaImportParams { hash: hash_algorithm(args) };
            let key = rsa::import_private_key(text(args, "private-key"), params).await?;
            rsa::decrypt_string_with_private_key(key, text(args, "cipher-text"), &OaepParams::default()).await?
        },
        "seal" => {
            let params = RsaImportParams { hash: hash_algorithm(args) };
            let key = rsa::import_public_key(text(args, "public-key"), params).await?;
            envelope::seal_envelope_base64(key, text(args, "key"), &OaepParams::default()).await?
        },
        "open" => {
            let params = RsaImportParams { hash: hash_algorithm(args) };
            let key = rsa::import_private_key(text(args, "private-key"), params).await?;
            let key_params = AesKeyParams { length: number(args, "length") };
            let aes_key = envelope::open_envelope_base64(text(args, "envelope"), key, &OaepParams::default(), key_params).await?;
            aes::export_key_base64(&aes_key).await?
        },
        "derive" => {
            let params = KdfParams {
                iterations: number(args, "iterations"),
                hash: hash_algorithm(args),
                key: AesKeyParams { length: number(args, "length") },
            };
            let salt = args.get_one::<String>("salt").map(|salt| Salt::from(salt.as_str()));
            let password = get_password_from_tty("Password: ")?;
            let derived = kdf::derive_aes_key_from_password_base64(&password, salt, &params).await?;
            serde_json::to_string_pretty(&derived)?
        },
        "hash" => {
            hash::digest_string(hash_algorithm(args), text(args, "text")).await?
        },
        _ => return Err(format!("unknown command {}", command).into()),
    };
    Ok(output)
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("rusty_envelope=info")).init();

    let args = cli().get_matches();
    let (command, args) = match args.subcommand() {
        Some(subcommand) => subcommand,
        None => {
            error!("No command given");
            std::process::exit(2);
        },
    };

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        error!("Cannot create runtime: {}", e);
        std::process::exit(1);
    });
    debug!("Running {} {}", command, env!("CARGO_PKG_VERSION"));
    match runtime.block_on(execute(command, args)) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{} failed: {}", command, e);
            std::process::exit(1);
        },
    }
}
