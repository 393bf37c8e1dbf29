//! Terminal scan loop: capture, then the detail view or the creation form

use domain_products::StockAction;
use std::io::{self, BufRead, Write};

use crate::capture::{CaptureDevice, KeyboardWedge};
use crate::client::InventoryClient;
use crate::dashboard::{Dashboard, ProductDetails, StatsSummary};
use crate::prompt::{edit_product_form, new_product_form, Prompt};
use crate::session::{ScanSession, ScanState};

const DETAIL_MENU: &str = "[+] add one  [-] remove one  [s]et  [e]dit  [d]elete  [Enter] back";

/// Scan with the keyboard wedge until an empty line or end of input.
///
/// API failures are printed and the loop carries on; only terminal I/O
/// errors end it early.
pub async fn scan_loop<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    client: &InventoryClient,
) -> io::Result<()> {
    let mut session = ScanSession::new();
    let mut dashboard = Dashboard::default();

    match dashboard.refresh(client, session.show_low_stock()).await {
        Ok(()) => prompt.say(StatsSummary(&dashboard.stats))?,
        Err(e) => prompt.say(format!("Error: {e}"))?,
    }

    loop {
        prompt.say("Scan a barcode (empty line to quit)")?;

        let scanned = {
            let mut wedge = KeyboardWedge::new(prompt.input_mut());
            scan_once(&mut session, &mut wedge, client).await
        };

        match scanned {
            Ok(ScanState::Idle) => break,
            Ok(ScanState::Existing(_)) => {
                detail_view(prompt, &mut session, client, &mut dashboard).await?
            }
            Ok(ScanState::NewProduct(barcode)) => {
                register(prompt, &barcode, &mut session, client, &mut dashboard).await?
            }
            Ok(_) => {}
            Err(message) => prompt.say(format!("Error: {message}"))?,
        }
    }

    prompt.say("Bye")
}

async fn scan_once<D: CaptureDevice + ?Sized>(
    session: &mut ScanSession,
    device: &mut D,
    client: &InventoryClient,
) -> Result<ScanState, String> {
    session
        .scan(device, client)
        .await
        .cloned()
        .map_err(|e| e.to_string())
}

async fn register<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    barcode: &str,
    session: &mut ScanSession,
    client: &InventoryClient,
    dashboard: &mut Dashboard,
) -> io::Result<()> {
    let Some(form) = new_product_form(prompt, barcode, &dashboard.categories)? else {
        session.cancel();
        return Ok(());
    };

    let created = session
        .create(form, client, dashboard)
        .await
        .map(|p| p.name.clone());

    match created {
        Ok(name) => {
            prompt.say(format!("Product added: {name}"))?;
            detail_view(prompt, session, client, dashboard).await
        }
        Err(e) => {
            session.cancel();
            prompt.say(format!("Error: {e}"))
        }
    }
}

/// Stock and edit actions on the open product until the user goes back.
pub async fn detail_view<R: BufRead, W: Write>(
    prompt: &mut Prompt<R, W>,
    session: &mut ScanSession,
    client: &InventoryClient,
    dashboard: &mut Dashboard,
) -> io::Result<()> {
    while let Some(product) = session.current_product() {
        prompt.say(ProductDetails(product))?;

        let choice = prompt.ask(DETAIL_MENU)?;
        let result = match choice.as_deref() {
            None | Some("") => {
                session.cancel();
                break;
            }
            Some("+") => session
                .adjust_stock(StockAction::Increase, 1, client, dashboard)
                .await
                .map(|_| ()),
            Some("-") => session
                .adjust_stock(StockAction::Decrease, 1, client, dashboard)
                .await
                .map(|_| ()),
            Some("s") => {
                let Some(quantity) = prompt.ask_parsed::<i64>("New stock", None)? else {
                    break;
                };
                session
                    .adjust_stock(StockAction::Set, quantity, client, dashboard)
                    .await
                    .map(|_| ())
            }
            Some("e") => {
                let Some(current) = session.current_product().cloned() else {
                    break;
                };
                let Some(changes) = edit_product_form(prompt, &current)? else {
                    break;
                };
                let edited = session.edit(&changes, client, dashboard).await.map(|_| ());
                if edited.is_ok() {
                    prompt.say("Product updated")?;
                }
                edited
            }
            Some("d") => {
                if !prompt.confirm("Delete this product? This cannot be undone")? {
                    continue;
                }
                let deleted = session.delete(client, dashboard).await;
                if deleted.is_ok() {
                    prompt.say("Product deleted")?;
                }
                deleted
            }
            Some(other) => {
                prompt.say(format!("Unknown choice '{other}'"))?;
                continue;
            }
        };

        if let Err(e) = result {
            prompt.say(format!("Error: {e}"))?;
        }
    }

    prompt.say(StatsSummary(&dashboard.stats))
}
