use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::error::AgrilogError;
use crate::sheet::Sheet;
use crate::store::{RecordStore, SHEET_METERS, SHEET_READINGS};

/// Water meter from the meter reference sheet, with its network contact.
#[derive(Debug, Clone, Serialize)]
pub struct Meter {
    pub id: String,
    pub contact: String,
    pub email: String,
    pub unit_price: Decimal,
}

/// One dated index reading of a meter, in cubic meters.
#[derive(Debug, Clone, Serialize)]
pub struct MeterReading {
    pub meter: String,
    pub date: NaiveDate,
    pub index_m3: Decimal,
}

/// Consumption between two consecutive readings of one meter.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionPeriod {
    pub meter: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub volume_m3: Decimal,
}

/// Monthly bill payload for one meter, ready for rendering and mailing.
#[derive(Debug, Clone, Serialize)]
pub struct IrrigationBill {
    pub meter: String,
    pub contact: String,
    pub email: String,
    pub year: i32,
    pub month: u32,
    pub volume_m3: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

pub fn decode_meters(sheet: &Sheet) -> Vec<Meter> {
    sheet
        .iter_rows()
        .filter_map(|row| {
            let id = row.text_any(&["ID_Compteur", "Compteur"]);
            if id.is_empty() {
                return None;
            }
            Some(Meter {
                id: id.to_string(),
                contact: row.text("Contact").to_string(),
                email: row.text_any(&["Email", "Mail"]).to_string(),
                unit_price: row.decimal("Prix_m3"),
            })
        })
        .collect()
}

/// Decode meter readings; rows without a parseable date or meter id are
/// unusable for delta computation and are dropped with a warning.
pub fn decode_readings(sheet: &Sheet) -> Vec<MeterReading> {
    sheet
        .iter_rows()
        .filter_map(|row| {
            let meter = row.text_any(&["ID_Compteur", "Compteur"]);
            if meter.is_empty() {
                return None;
            }
            let Some(date) = row.date("Date") else {
                warn!(meter, "dropping meter reading without a parseable date");
                return None;
            };
            Some(MeterReading {
                meter: meter.to_string(),
                date,
                index_m3: row.decimal("Index_m3"),
            })
        })
        .collect()
}

/// Index deltas between consecutive readings, per meter, date-sorted.
/// A negative delta (meter swap or typo) is dropped with a warning rather
/// than billed.
pub fn consumption_periods(readings: &[MeterReading]) -> Vec<ConsumptionPeriod> {
    let mut by_meter: BTreeMap<&str, Vec<&MeterReading>> = BTreeMap::new();
    for reading in readings {
        by_meter.entry(reading.meter.as_str()).or_default().push(reading);
    }

    let mut periods = Vec::new();
    for (meter, mut meter_readings) in by_meter {
        meter_readings.sort_by_key(|r| r.date);
        for pair in meter_readings.windows(2) {
            let volume = pair[1].index_m3 - pair[0].index_m3;
            if volume < Decimal::ZERO {
                warn!(
                    meter,
                    from = %pair[0].date,
                    to = %pair[1].date,
                    "dropping negative consumption delta"
                );
                continue;
            }
            periods.push(ConsumptionPeriod {
                meter: meter.to_string(),
                from: pair[0].date,
                to: pair[1].date,
                volume_m3: volume,
            });
        }
    }
    periods
}

/// Bills for every meter with consumption ending in the given month.
/// Amount = summed volume x the meter's unit price.
pub fn monthly_bills(
    store: &dyn RecordStore,
    year: i32,
    month: u32,
) -> Result<Vec<IrrigationBill>, AgrilogError> {
    let meters = decode_meters(&store.read_rows(SHEET_METERS)?);
    let readings = decode_readings(&store.read_rows(SHEET_READINGS)?);
    let periods = consumption_periods(&readings);

    let mut bills = Vec::new();
    for meter in meters {
        let volume: Decimal = periods
            .iter()
            .filter(|p| p.meter == meter.id && p.to.year() == year && p.to.month() == month)
            .map(|p| p.volume_m3)
            .sum();
        if volume == Decimal::ZERO {
            continue;
        }
        bills.push(IrrigationBill {
            amount: volume * meter.unit_price,
            meter: meter.id,
            contact: meter.contact,
            email: meter.email,
            year,
            month,
            volume_m3: volume,
            unit_price: meter.unit_price,
        });
    }
    Ok(bills)
}
