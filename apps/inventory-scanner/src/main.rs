//! Inventory Scanner - command-line client for the inventory API

use clap::{Parser, Subcommand};
use core_config::tracing::{init_cli_tracing, install_color_eyre};
use core_config::FromEnv;
use domain_products::{ProductFilter, StockAction};
use eyre::{bail, Result};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use inventory_scanner::dashboard::{ProductDetails, ProductList, StatsSummary};
use inventory_scanner::interactive::{detail_view, scan_loop};
use inventory_scanner::prompt::{edit_product_form, new_product_form, Prompt};
use inventory_scanner::{
    Dashboard, ImageUpload, InventoryClient, RxingDecoder, ScanSession, ScanState, ScannerConfig,
    ScriptedCapture,
};

#[derive(Parser)]
#[command(name = "inventory-scanner")]
#[command(about = "Scan barcodes and manage inventory", version)]
struct Cli {
    /// Inventory API base URL, including /api (overrides INVENTORY_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan barcodes from a hand-held scanner or typed input
    Scan {
        /// Look up these codes instead of reading from the terminal
        #[arg(long, value_delimiter = ',', conflicts_with = "image")]
        codes: Option<Vec<String>>,

        /// Decode barcodes from these image files (repeatable)
        #[arg(long)]
        image: Vec<PathBuf>,
    },

    /// List products, most recently updated first
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only products at or below their minimum stock
        #[arg(short, long)]
        low_stock: bool,
    },

    /// List categories in use
    Categories,

    /// Show inventory statistics
    Stats,

    /// Show a product (records the scan time)
    Show { barcode: String },

    /// Register a product
    Add { barcode: String },

    /// Change stock: increase, decrease or set
    Stock {
        barcode: String,

        #[arg(value_parser = parse_action)]
        action: StockAction,

        #[arg(short, long, default_value_t = 1)]
        quantity: i64,
    },

    /// Edit a product's details
    Edit { barcode: String },

    /// Delete a product
    Delete {
        barcode: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn parse_action(value: &str) -> Result<StockAction, String> {
    StockAction::from_str(value).map_err(|_| "expected increase, decrease or set".to_string())
}

fn report<R: BufRead, W: Write>(prompt: &mut Prompt<R, W>, state: &ScanState) -> io::Result<()> {
    match state {
        ScanState::Existing(product) => prompt.say(ProductDetails(product)),
        ScanState::NewProduct(barcode) => prompt.say(format!("{barcode}: not registered\n")),
        _ => Ok(()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();
    init_cli_tracing();

    let cli = Cli::parse();
    let config = ScannerConfig::from_env()?.with_api_url(cli.api_url);
    let client = InventoryClient::new(&config.api_url)?;

    let stdin = io::stdin();
    let mut prompt = Prompt::new(stdin.lock(), io::stdout());

    match cli.command {
        Commands::Scan {
            codes: Some(codes),
            ..
        } => {
            let mut device = ScriptedCapture::new(codes);
            let mut session = ScanSession::new();

            while device.remaining() > 0 {
                let state = session.scan(&mut device, &client).await?;
                report(&mut prompt, state)?;
            }
        }
        Commands::Scan { image, .. } if !image.is_empty() => {
            let mut device = ImageUpload::new(RxingDecoder);
            let mut session = ScanSession::new();

            for path in image {
                device.select(&path);
                match session.scan(&mut device, &client).await {
                    Ok(state) => report(&mut prompt, state)?,
                    Err(e) => prompt.say(format!("{}: {e}", path.display()))?,
                }
            }
        }
        Commands::Scan { .. } => scan_loop(&mut prompt, &client).await?,
        Commands::List {
            category,
            low_stock,
        } => {
            let filter = ProductFilter {
                category,
                low_stock: low_stock.then(|| "true".to_string()),
            };
            let products = client.list_products(&filter).await?;
            prompt.say(ProductList(&products))?;
        }
        Commands::Categories => {
            for category in client.categories().await? {
                prompt.say(category)?;
            }
        }
        Commands::Stats => {
            let stats = client.stats().await?;
            prompt.say(StatsSummary(&stats))?;
        }
        Commands::Show { barcode } => match client.lookup(&barcode).await?.into_product() {
            Some(product) => prompt.say(ProductDetails(&product))?,
            None => bail!("{barcode}: not registered"),
        },
        Commands::Add { barcode } => {
            let mut session = ScanSession::new();
            if let ScanState::Existing(_) = session.open(&barcode, &client).await? {
                bail!("{barcode}: already registered");
            }

            let mut dashboard = Dashboard::default();
            dashboard.refresh(&client, false).await?;

            let Some(form) = new_product_form(&mut prompt, &barcode, &dashboard.categories)?
            else {
                return Ok(());
            };
            session.create(form, &client, &mut dashboard).await?;
            detail_view(&mut prompt, &mut session, &client, &mut dashboard).await?;
        }
        Commands::Stock {
            barcode,
            action,
            quantity,
        } => {
            let product = client.update_stock(&barcode, action, quantity).await?;
            prompt.say(ProductDetails(&product))?;
        }
        Commands::Edit { barcode } => {
            let Some(current) = client.lookup(&barcode).await?.into_product() else {
                bail!("{barcode}: not registered");
            };
            let Some(changes) = edit_product_form(&mut prompt, &current)? else {
                return Ok(());
            };
            let product = client.update_product(&barcode, &changes).await?;
            prompt.say(ProductDetails(&product))?;
        }
        Commands::Delete { barcode, yes } => {
            if !yes && !prompt.confirm(&format!("Delete {barcode}? This cannot be undone"))? {
                return Ok(());
            }
            let result = client.delete_product(&barcode).await?;
            prompt.say(result.message)?;
        }
    }

    Ok(())
}
