// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `ecoid` - create, counter-sign, register and mint EcoID attestations
//! from the command line with a local key file.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use alloy::primitives::Address;
use clap::{Parser, Subcommand};

use ecoid_attest::attestation::{
    derive_status, verify_signature, AttestationDocument, AttestationMessage, MessageDocument,
    Role, Status,
};
use ecoid_attest::blockchain::{ContractGateway, RegistryGateway, ScriptedGateway};
use ecoid_attest::config::Config;
use ecoid_attest::file_transfer;
use ecoid_attest::machine::{Disposition, Effect, Event, Step};
use ecoid_attest::runtime::{EffectExecutor, Session};
use ecoid_attest::telemetry::init_tracing;
use ecoid_attest::wallet::{LocalWallet, SignatureService};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "ecoid")]
#[command(about = "EcoID attestation co-signing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an attestation file and its signing status
    Inspect {
        /// Path to the attestation file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Author and sign a new attestation as the verifier
    Create {
        /// Verifier key file (PEM or hex)
        #[arg(long)]
        key: PathBuf,
        /// Recipient address
        #[arg(long)]
        recipient: String,
        /// Last valid day, YYYY-MM-DD
        #[arg(long)]
        deadline: String,
        /// Claim text, 4 to 35 characters
        #[arg(long)]
        claim: String,
        /// Mark the attestation as not revocable
        #[arg(long)]
        irrevocable: bool,
        /// Directory to write the signed attestation into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Counter-sign an attestation as the recipient and optionally register and mint it
    Claim {
        /// Path to the attestation file
        file: PathBuf,
        /// Recipient key file (PEM or hex)
        #[arg(long)]
        key: PathBuf,
        /// Register the attestation on-chain
        #[arg(long)]
        register: bool,
        /// Mint the EcoID (after registering when --register is set)
        #[arg(long)]
        mint: bool,
        /// Use an in-process ledger instead of the configured network
        #[arg(long)]
        offline: bool,
        /// Directory to write the counter-signed attestation into
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match Config::from_env() {
        Ok(config) => {
            init_tracing(config.log_format);
            run(cli.command, config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: Config) -> CliResult<()> {
    match command {
        Commands::Inspect { file, json } => inspect(&file, json),
        Commands::Create {
            key,
            recipient,
            deadline,
            claim,
            irrevocable,
            out,
        } => {
            let wallet = LocalWallet::from_key_file(&key)?;
            let message = AttestationMessage::try_from(MessageDocument {
                recipient,
                verifier: wallet.address().to_checksum(None),
                deadline,
                revocable: !irrevocable,
                claim,
            })?;
            // Authoring never touches the ledger.
            let mut session = session(wallet, ScriptedGateway::default(), &config);
            create(&mut session, message, &out).await
        }
        Commands::Claim {
            file,
            key,
            register,
            mint,
            offline,
            out,
        } => {
            let bytes = std::fs::read(&file)?;
            let wallet = LocalWallet::from_key_file(&key)?;
            let address = wallet.address();
            let options = ClaimOptions {
                register,
                mint,
                out,
            };
            if offline {
                let mut session = session(wallet, ScriptedGateway::default(), &config);
                claim(&mut session, address, bytes, &options).await
            } else {
                let gateway = RegistryGateway::new(
                    config.network.clone(),
                    config.registry_address,
                    wallet.ethereum_wallet(),
                );
                let mut session = session(wallet, gateway, &config);
                claim(&mut session, address, bytes, &options).await
            }
        }
    }
}

fn inspect(file: &Path, json: bool) -> CliResult<()> {
    let record = file_transfer::import(&std::fs::read(file)?)?;
    let status = derive_status(&record);

    if json {
        let mut value = serde_json::to_value(AttestationDocument::from(&record))?;
        value["status"] = serde_json::to_value(status)?;
        value["valid"] = serde_json::json!({
            "verifier": verify_signature(&record, Role::Verifier),
            "receiver": verify_signature(&record, Role::Receiver),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let message = record.message();
    println!("Recipient:  {}", message.recipient.to_checksum(None));
    println!("Verifier:   {}", message.verifier.to_checksum(None));
    println!("Deadline:   {}", message.deadline);
    println!("Revocable:  {}", message.revocable);
    println!("Claim:      {}", message.claim);
    for role in [Role::Verifier, Role::Receiver] {
        let state = match record.signature(role) {
            None => "missing",
            Some(_) if verify_signature(&record, role) => "valid",
            Some(_) => "INVALID",
        };
        println!("{:<11} {}", format!("{role} sig:"), state);
    }
    println!("Status:     {}", status);
    Ok(())
}

fn session<S, G>(wallet: S, gateway: G, config: &Config) -> Session<S, G>
where
    S: SignatureService + 'static,
    G: ContractGateway + 'static,
{
    Session::new(EffectExecutor::new(
        Arc::new(wallet),
        Arc::new(gateway),
        config.timeouts,
    ))
}

async fn create<G: ContractGateway + 'static>(
    session: &mut Session<LocalWallet, G>,
    message: AttestationMessage,
    out: &Path,
) -> CliResult<()> {
    let address = message.verifier;
    drive(session, Event::WalletConnected(address)).await?;
    drive(session, Event::GoToCreateFlow).await?;
    drive(session, Event::FormSubmitted(message)).await?;
    drive(session, Event::RequestSignature).await?;

    let steps = drive(session, Event::Download).await?;
    save(&steps, out)
}

struct ClaimOptions {
    register: bool,
    mint: bool,
    out: Option<PathBuf>,
}

async fn claim<G: ContractGateway + 'static>(
    session: &mut Session<LocalWallet, G>,
    address: Address,
    bytes: Vec<u8>,
    options: &ClaimOptions,
) -> CliResult<()> {
    drive(session, Event::WalletConnected(address)).await?;
    drive(session, Event::GoToClaimFlow).await?;
    drive(session, Event::UploadAttestation(bytes)).await?;

    if session.machine().status() == Status::VerifierSigned {
        drive(session, Event::Sign).await?;
    }
    if let Some(out) = &options.out {
        let steps = drive(session, Event::Download).await?;
        save(&steps, out)?;
    }

    if options.register {
        drive(session, Event::Register).await?;
        if let Some(receipt) = session.machine().context().registration() {
            println!("Registered in block {} ({})", receipt.block_number, receipt.tx_hash);
        }
    }
    if options.mint {
        let event = if options.register {
            Event::Mint
        } else {
            Event::SelfMint
        };
        drive(session, event).await?;
        if let Some(token_id) = session.machine().context().token_id() {
            println!("Minted EcoID #{token_id}");
        }
    }

    println!("Status: {}", session.machine().status());
    if session.machine().status() < Status::BothSigned {
        return Err("attestation is not fully signed".into());
    }
    Ok(())
}

/// Send `event` and fail on anything other than a clean transition.
async fn drive<G: ContractGateway + 'static>(
    session: &mut Session<LocalWallet, G>,
    event: Event,
) -> CliResult<Vec<Step>> {
    let steps = session.send(event).await;
    for step in &steps {
        match &step.disposition {
            Disposition::Applied => {}
            Disposition::Rejected(error) => return Err(error.clone().into()),
            Disposition::Ignored(reason) => {
                return Err(format!("event ignored in state {} ({reason:?})", step.state).into())
            }
        }
    }
    if let Some(error) = session.machine().context().last_error() {
        return Err(error.to_string().into());
    }
    Ok(steps)
}

fn save(steps: &[Step], out: &Path) -> CliResult<()> {
    for step in steps {
        if let Some(Effect::Export(file)) = &step.effect {
            let path = file.write_into(out)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
