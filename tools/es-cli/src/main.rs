//! ES-CLI: Escrow Swap operator tool
//!
//! Derives record addresses and encodes or decodes asset envelopes offline,
//! exactly as any client would before submitting an operation.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use es_01_address_derivation::AddressDeriver;
use es_02_asset_codec::{decode, encode, AssetPayload};
use es_cli::{parse_seed_args, DerivationReport, EnvelopeReport, PayloadReport};
use shared_types::{Address, AssetKind};

/// ES-CLI: Escrow Swap operator tool
#[derive(Parser, Debug)]
#[command(name = "es-cli")]
#[command(about = "Offline address derivation and asset envelope codec for Escrow Swap")]
struct Args {
    /// Program id (base58) every address is derived under
    #[arg(long, env = "ES_PROGRAM_ID", global = true)]
    program_id: Option<Address>,

    /// Print compact JSON
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authority singleton address
    Authority,

    /// Trade address by index
    Trade {
        /// Trade index
        #[arg(long)]
        index: u32,
    },

    /// Offer address by trade and index
    Offer {
        /// Trade address
        #[arg(long)]
        trade: Address,
        /// Offer index
        #[arg(long)]
        index: u32,
    },

    /// Asset item address by parent, kind and kind-specific index
    AssetItem {
        /// Parent trade or offer address
        #[arg(long)]
        parent: Address,
        /// Asset kind
        #[arg(long, value_enum)]
        kind: KindArg,
        /// Index within the parent's items of this kind
        #[arg(long)]
        type_index: u32,
    },

    /// Arbitrary seed tuple, e.g. --seed text:trade --seed u32:0
    Seeds {
        /// Seed as <kind>:<value>, kind one of text, u8, u32, addr
        #[arg(long = "seed", required = true)]
        seeds: Vec<String>,
    },

    /// Encode a native amount envelope
    EncodeNative {
        /// Amount in base units
        #[arg(long)]
        amount: u64,
    },

    /// Encode a token account envelope
    EncodeToken {
        /// Mint address
        #[arg(long)]
        mint: Address,
        /// Token account address
        #[arg(long)]
        token_account: Address,
    },

    /// Decode an envelope body
    Decode {
        /// Asset type code
        #[arg(long)]
        type_code: u8,
        /// Body as hex
        #[arg(long)]
        hex: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Native,
    Token,
}

impl From<KindArg> for AssetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Native => AssetKind::Native,
            KindArg::Token => AssetKind::Token,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    debug!("es-cli {:?}", args.command);

    match args.command {
        Command::EncodeNative { amount } => {
            let envelope = encode(&AssetPayload::Native { amount })?;
            print(&EnvelopeReport::from(envelope), args.compact)
        }
        Command::EncodeToken {
            mint,
            token_account,
        } => {
            let envelope = encode(&AssetPayload::Token {
                mint,
                token_account,
            })?;
            print(&EnvelopeReport::from(envelope), args.compact)
        }
        Command::Decode { type_code, hex } => {
            let body = hex::decode(hex.trim_start_matches("0x")).context("body is not valid hex")?;
            let payload = decode(type_code, &body)?;
            print(&PayloadReport::from(payload), args.compact)
        }
        command => {
            let Some(program_id) = args.program_id else {
                bail!("--program-id or ES_PROGRAM_ID is required for derivations");
            };
            let report = derive(AddressDeriver::new(program_id), command)?;
            print(&report, args.compact)
        }
    }
}

fn derive(deriver: AddressDeriver, command: Command) -> Result<DerivationReport> {
    let program_id = *deriver.program_id();
    let report = match command {
        Command::Authority => DerivationReport::new(program_id, "authority", deriver.authority()?),
        Command::Trade { index } => {
            DerivationReport::new(program_id, format!("trade {index}"), deriver.trade(index)?)
        }
        Command::Offer { trade, index } => DerivationReport::new(
            program_id,
            format!("offer {index} of {trade}"),
            deriver.offer(&trade, index)?,
        ),
        Command::AssetItem {
            parent,
            kind,
            type_index,
        } => {
            let kind = AssetKind::from(kind);
            DerivationReport::new(
                program_id,
                format!("{kind} item {type_index} of {parent}"),
                deriver.asset_item(&parent, kind, type_index)?,
            )
        }
        Command::Seeds { seeds } => {
            let (values, schema) = parse_seed_args(&seeds)?;
            DerivationReport::new(
                program_id,
                seeds.join(" "),
                deriver.derive_with_schema(&values, &schema)?,
            )
        }
        other => bail!("{other:?} is not a derivation"),
    };
    Ok(report)
}

fn print<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{text}");
    Ok(())
}
