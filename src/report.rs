//! Spreadsheet and CSV serialization for the report tables.
//!
//! Formatting here is presentation only: frozen header rows, column widths,
//! and number formats. All arithmetic happens upstream in the table builder.

use anyhow::Result;
use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, info};

use crate::model::VEHICLE_TOP_CODE;
use crate::tabulate::{ReportTables, WideRow};

/// Static documentation block written to the Notes sheet.
const NOTES: &[&str] = &[
    "Household vehicle availability by tenure, income bracket, and PUMA",
    "",
    "Source: ACS 1-year PUMS household records (SERIALNO, WGTP, PUMA, VEH, TEN, HINCP).",
    "Counts are sums of household survey weights (WGTP), so each cell estimates a",
    "population total, not a sample size.",
    "",
    "Tenure: TEN codes 1-2 (owned with mortgage, owned free and clear) are reported",
    "as Homeowner; codes 3-4 (rented, occupied without payment of rent) as Renter.",
    "",
    "Income brackets are shares of the $64,400 area median income: caps at $19,320",
    "(30%), $38,640 (60%), $57,960 (90%), and $77,280 (120%), each cap inclusive.",
    "Vacant units and group quarters are excluded.",
    "",
    "Vehicle columns follow the VEH top code: the 6+ column counts households",
    "reporting six or more vehicles.",
    "",
    "Share columns divide each vehicle column by the row total and are rounded to",
    "four decimal places (ties to even), so a row's shares may sum to slightly",
    "more or less than 1.0000.",
    "",
    "Summary sheets sum the same records across all PUMAs; they are re-tabulated",
    "from the microdata rather than derived from the per-PUMA sheets.",
];

/// Writes the four report tables plus the Notes sheet to an xlsx workbook.
pub fn write_workbook(path: &str, tables: &ReportTables) -> Result<()> {
    let mut workbook = Workbook::new();

    write_table_sheet(
        workbook.add_worksheet(),
        "Renter by PUMA",
        &tables.renter_by_subarea,
        true,
    )?;
    write_table_sheet(
        workbook.add_worksheet(),
        "Renter Summary",
        &tables.renter_rollup,
        false,
    )?;
    write_table_sheet(
        workbook.add_worksheet(),
        "Homeowner by PUMA",
        &tables.owner_by_subarea,
        true,
    )?;
    write_table_sheet(
        workbook.add_worksheet(),
        "Homeowner Summary",
        &tables.owner_rollup,
        false,
    )?;
    write_notes_sheet(workbook.add_worksheet())?;

    workbook.save(path)?;
    info!(path, "Workbook written");

    Ok(())
}

fn category_label(cat: u8) -> String {
    match cat {
        1 => "1 vehicle".to_string(),
        c if c == VEHICLE_TOP_CODE => "6+ vehicles".to_string(),
        c => format!("{c} vehicles"),
    }
}

fn write_table_sheet(
    sheet: &mut Worksheet,
    name: &str,
    rows: &[WideRow],
    with_subarea: bool,
) -> Result<(), XlsxError> {
    sheet.set_name(name)?;

    let header_format = Format::new().set_bold();
    let count_format = Format::new().set_num_format("#,##0");
    let share_format = Format::new().set_num_format("0.0000");

    let mut headers: Vec<String> = Vec::new();
    if with_subarea {
        headers.push("PUMA".to_string());
    }
    headers.push("Income bracket".to_string());
    for cat in 0..=VEHICLE_TOP_CODE {
        headers.push(category_label(cat));
    }
    headers.push("Total households".to_string());
    for cat in 0..=VEHICLE_TOP_CODE {
        headers.push(format!("Share: {}", category_label(cat)));
    }

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        let mut col: u16 = 0;

        if with_subarea {
            sheet.write_string(excel_row, col, row.subarea.as_deref().unwrap_or(""))?;
            col += 1;
        }
        sheet.write_string(excel_row, col, row.bracket.label())?;
        col += 1;

        for count in row.counts() {
            sheet.write_number_with_format(excel_row, col, count, &count_format)?;
            col += 1;
        }
        sheet.write_number_with_format(excel_row, col, row.total, &count_format)?;
        col += 1;
        for share in row.shares() {
            sheet.write_number_with_format(excel_row, col, share, &share_format)?;
            col += 1;
        }
    }

    let mut col: u16 = 0;
    if with_subarea {
        sheet.set_column_width(col, 10)?;
        col += 1;
    }
    sheet.set_column_width(col, 14)?;
    col += 1;
    for _ in 0..(2 * (VEHICLE_TOP_CODE as u16 + 1) + 1) {
        sheet.set_column_width(col, 15)?;
        col += 1;
    }

    sheet.set_freeze_panes(1, 0)?;

    debug!(sheet = name, rows = rows.len(), "Sheet written");
    Ok(())
}

fn write_notes_sheet(sheet: &mut Worksheet) -> Result<(), XlsxError> {
    sheet.set_name("Notes")?;

    let title_format = Format::new().set_bold();
    sheet.write_string_with_format(0, 0, NOTES[0], &title_format)?;
    for (i, line) in NOTES.iter().enumerate().skip(1) {
        sheet.write_string(i as u32, 0, *line)?;
    }

    let generated = format!("Generated {}", Utc::now().format("%Y-%m-%d"));
    sheet.write_string(NOTES.len() as u32 + 1, 0, &generated)?;

    sheet.set_column_width(0, 100)?;
    Ok(())
}

/// Writes one report table as a CSV file.
pub fn write_table_csv(path: &str, rows: &[WideRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    debug!(path, rows = rows.len(), "Table CSV written");
    Ok(())
}
