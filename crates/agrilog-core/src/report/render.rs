use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AgrilogError;
use crate::irrigation::IrrigationBill;
use crate::report::{FertiBalance, PhytoRegister, PrepSheet, TechnicalItinerary};

/// A report payload ready to be laid out.
#[derive(Debug, Clone)]
pub enum ReportDocument {
    Phyto(PhytoRegister),
    Ferti(FertiBalance),
    Itinerary(TechnicalItinerary),
    Prep(PrepSheet),
    Bill(IrrigationBill),
}

/// Layout seam: turns a payload into a file at `out`. The PDF engine lives
/// behind this trait, outside the core.
pub trait ReportRenderer {
    fn render(&self, document: &ReportDocument, out: &Path) -> Result<PathBuf, AgrilogError>;
}

/// Plain-text layout, the default renderer. A document is rendered into a
/// scratch directory first and copied to its destination only when complete,
/// so a failed render never leaves a truncated file at the output path. The
/// scratch directory is removed when the renderer call returns.
#[derive(Debug, Default)]
pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn render(&self, document: &ReportDocument, out: &Path) -> Result<PathBuf, AgrilogError> {
        let scratch = tempfile::tempdir()?;
        let staged = scratch.path().join("report.txt");
        fs::write(&staged, render_text(document))?;
        if let Some(parent) = out.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::copy(&staged, out).map_err(|e| AgrilogError::Render {
            path: out.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %out.display(), "report rendered");
        Ok(out.to_path_buf())
    }
}

fn render_text(document: &ReportDocument) -> String {
    match document {
        ReportDocument::Phyto(register) => {
            let mut text = format!("REGISTRE PHYTOSANITAIRE - Campagne {}\n", register.campaign);
            for section in &register.sections {
                let info = &section.info;
                let _ = write!(
                    text,
                    "\nParcelle : {} ({} - {:.2} ha, îlot {})\n",
                    info.parcel, info.culture, info.surface_ha, info.pac_islet
                );
                for row in &section.rows {
                    let _ = writeln!(
                        text,
                        "  {}  {}  {} {}  cible: {}",
                        crate::grouping::date_label(row.date),
                        row.product,
                        row.dose_raw,
                        row.dose_unit,
                        row.target
                    );
                }
            }
            text
        }
        ReportDocument::Ferti(balance) => {
            let mut text = format!("BILAN DE FERTILISATION - Campagne {}\n", balance.campaign);
            for section in &balance.sections {
                let _ = write!(
                    text,
                    "\nParcelle : {} ({})\n",
                    section.info.parcel, section.info.culture
                );
                for row in &section.rows {
                    let _ = writeln!(
                        text,
                        "  {}  {}  {} {}  N={} P={} K={}",
                        crate::grouping::date_label(row.date),
                        row.product,
                        row.dose_raw,
                        row.dose_unit,
                        row.npk.n,
                        row.npk.p,
                        row.npk.k
                    );
                }
                let _ = writeln!(
                    text,
                    "  Apports N={} P={} K={} / Besoins N={} P={} K={}",
                    section.inputs.n,
                    section.inputs.p,
                    section.inputs.k,
                    section.needs.n,
                    section.needs.p,
                    section.needs.k
                );
            }
            text
        }
        ReportDocument::Itinerary(itinerary) => {
            let mut text = format!("ITINERAIRE TECHNIQUE - Campagne {}\n", itinerary.campaign);
            for section in &itinerary.sections {
                let _ = write!(text, "\nParcelle : {}\n", section.info.parcel);
                for bucket in &section.buckets {
                    let _ = writeln!(text, "  [{}]", bucket.title);
                    for step in &bucket.steps {
                        let _ = writeln!(
                            text,
                            "    {}  {}  {} {}",
                            step.date_label,
                            step.products.replace('\n', " + "),
                            step.doses.replace('\n', " / "),
                            step.units.replace('\n', " / ")
                        );
                    }
                }
            }
            text
        }
        ReportDocument::Prep(sheet) => {
            let mut text = format!(
                "FICHE DE PREPARATION - {}\nParcelles : {}\nSurface : {} ha, volume {} L/ha, cuve {} L\n",
                sheet.date_label,
                sheet.parcels.join(" & "),
                sheet.surface_ha,
                sheet.volume_l_ha,
                sheet.tank_volume_l
            );
            for line in &sheet.lines {
                let _ = writeln!(
                    text,
                    "  {}. {} [{}]  {} {}  total {} {}",
                    line.order,
                    line.product,
                    line.formulation,
                    line.dose,
                    line.dose_unit,
                    line.total_qty,
                    line.dose_unit
                );
            }
            if let Some(payload) = &sheet.qr_payload {
                let _ = writeln!(text, "Validation : {payload}");
            }
            text
        }
        ReportDocument::Bill(bill) => format!(
            "FACTURE IRRIGATION {}-{:02}\nCompteur : {}\nContact : {}\nVolume : {} m3 x {} = {} EUR\n",
            bill.year, bill.month, bill.meter, bill.contact, bill.volume_m3, bill.unit_price, bill.amount
        ),
    }
}
