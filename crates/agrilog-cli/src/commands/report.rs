use std::path::PathBuf;

use agrilog_core::error::AgrilogError;
use agrilog_core::report::render::{ReportDocument, ReportRenderer, TextRenderer};
use agrilog_core::report::{self, report_stem};
use agrilog_core::store::xlsx::XlsxStore;

use crate::ReportKind;

pub fn run(
    workbook: PathBuf,
    campaign: i32,
    kind: ReportKind,
    parcel: Option<&str>,
    out: PathBuf,
) -> Result<(), AgrilogError> {
    let store = XlsxStore::open(&workbook)?;
    let renderer = TextRenderer;

    // One file per parcel section, named after the report kind.
    let documents: Vec<(String, ReportDocument)> = match kind {
        ReportKind::Phyto => report::phyto_register(&store, campaign, parcel)?
            .sections
            .into_iter()
            .map(|section| {
                let stem = report_stem("registre_phyto", campaign, &section.info.parcel);
                let document = ReportDocument::Phyto(report::PhytoRegister {
                    campaign,
                    sections: vec![section],
                });
                (stem, document)
            })
            .collect(),
        ReportKind::Ferti => report::ferti_balance(&store, campaign, parcel)?
            .sections
            .into_iter()
            .map(|section| {
                let stem = report_stem("bilan_ferti", campaign, &section.info.parcel);
                let document = ReportDocument::Ferti(report::FertiBalance {
                    campaign,
                    sections: vec![section],
                });
                (stem, document)
            })
            .collect(),
        ReportKind::Itk => report::technical_itinerary(&store, campaign, parcel)?
            .sections
            .into_iter()
            .map(|section| {
                let stem = report_stem("itineraire", campaign, &section.info.parcel);
                let document = ReportDocument::Itinerary(report::TechnicalItinerary {
                    campaign,
                    sections: vec![section],
                });
                (stem, document)
            })
            .collect(),
    };

    if documents.is_empty() {
        println!("No data for campaign {campaign}.");
        return Ok(());
    }

    for (stem, document) in &documents {
        let path = renderer.render(document, &out.join(format!("{stem}.txt")))?;
        eprintln!("Written: {}", path.display());
    }
    Ok(())
}
