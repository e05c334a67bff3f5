use std::path::PathBuf;

use agrilog_core::error::AgrilogError;
use agrilog_core::irrigation::monthly_bills;
use agrilog_core::mail::{DryRunSender, EmailMessage, MailSender};
use agrilog_core::store::xlsx::XlsxStore;

use crate::output;

pub fn run(
    workbook: PathBuf,
    year: i32,
    month: u32,
    send: bool,
    output_format: &str,
) -> Result<(), AgrilogError> {
    let store = XlsxStore::open(&workbook)?;
    let bills = monthly_bills(&store, year, month)?;

    match output_format {
        "json" => output::json::print(&bills)?,
        _ => output::table::print_bills(&bills),
    }

    if send {
        let mut sender = DryRunSender::new();
        for bill in &bills {
            if bill.email.trim().is_empty() {
                eprintln!("No email on file for meter {}, bill not sent.", bill.meter);
                continue;
            }
            sender.send(&EmailMessage {
                to: bill.email.clone(),
                subject: format!("Facture irrigation {}-{:02}", bill.year, bill.month),
                body: format!(
                    "Bonjour {},\n\nConsommation du compteur {} : {} m3.\nMontant : {} EUR ({} EUR/m3).\n",
                    bill.contact, bill.meter, bill.volume_m3, bill.amount, bill.unit_price
                ),
                attachment: None,
            })?;
        }
        eprintln!("{} bill(s) handed to the mail sender (dry run).", sender.sent.len());
    }
    Ok(())
}
