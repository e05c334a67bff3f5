use agrilog_core::grouping::Mix;
use agrilog_core::irrigation::IrrigationBill;

pub fn print_mixes(mixes: &[Mix]) {
    if mixes.is_empty() {
        println!("No planned treatment found.");
        return;
    }

    for (i, mix) in mixes.iter().enumerate() {
        println!("{:>3}. {}", i + 1, mix.label);
        println!(
            "     {} ha, {} L/ha{}",
            mix.surface_ha,
            mix.volume_ha,
            match &mix.group_id {
                Some(id) => format!("  [{id}]"),
                None => String::new(),
            }
        );
        for record in &mix.records {
            let formulation = if record.formulation.is_empty() {
                "-".to_string()
            } else {
                record.formulation.clone()
            };
            println!(
                "       {:<24} {:<8} {} {}",
                record.product, formulation, record.dose_raw, record.dose_unit
            );
        }
    }
}

pub fn print_bills(bills: &[IrrigationBill]) {
    if bills.is_empty() {
        println!("No consumption for this month.");
        return;
    }

    let max_meter = bills.iter().map(|b| b.meter.len()).max().unwrap_or(8);
    println!(
        "{:<width$}  {:>10}  {:>8}  {:>10}  Contact",
        "Meter",
        "Volume m3",
        "EUR/m3",
        "Amount",
        width = max_meter
    );
    for bill in bills {
        println!(
            "{:<width$}  {:>10}  {:>8}  {:>10}  {} <{}>",
            bill.meter,
            bill.volume_m3,
            bill.unit_price,
            bill.amount,
            bill.contact,
            bill.email,
            width = max_meter
        );
    }
}
