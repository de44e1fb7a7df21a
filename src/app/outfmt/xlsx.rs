use std::{collections::HashMap, path::PathBuf};

use rust_decimal::Decimal;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};

use crate::{portfolio::render::RenderTable, util::date::parse_standard_date};

use super::model::{Error, OutputType, ReportWriter};

// Excel rejects longer sheet names
const MAX_SHEET_NAME_LEN: usize = 31;

/// Writes every table to its own worksheet of one workbook, which is saved
/// on finish.
pub struct XlsxWriter {
    out_path: PathBuf,
    workbook: Workbook,
    sheet_names: Vec<String>,
}

impl XlsxWriter {
    pub fn new(out_path: &str) -> XlsxWriter {
        XlsxWriter {
            out_path: PathBuf::from(out_path),
            workbook: Workbook::new(),
            sheet_names: Vec::new(),
        }
    }

    fn unique_sheet_name(&mut self, out_type: OutputType, name: &str) -> String {
        let base: String = out_type.slug(name).chars().take(MAX_SHEET_NAME_LEN).collect();
        let mut sheet_name = base.clone();
        let mut i = 2;
        while self.sheet_names.contains(&sheet_name) {
            let suffix = format!("-{i}");
            sheet_name = base.chars().take(MAX_SHEET_NAME_LEN - suffix.len()).collect::<String>()
                + &suffix;
            i += 1;
        }
        self.sheet_names.push(sheet_name.clone());
        sheet_name
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell_str: &str,
    date_format: &Format,
) -> Result<(), XlsxError> {
    let date_parts = parse_standard_date(cell_str)
        .ok()
        .and_then(|d| u16::try_from(d.year()).ok().map(|y| (y, u8::from(d.month()), d.day())));
    if let Some((year, month, day)) = date_parts {
        let date_data = ExcelDateTime::from_ymd(year, month, day)?;
        sheet.write_with_format(row, col, &date_data, date_format)?;
    } else if let Ok(num) = cell_str.parse::<Decimal>() {
        sheet.write(row, col, f64::try_from(num).unwrap_or(f64::NAN))?;
    } else {
        sheet.write(row, col, cell_str)?;
    }
    Ok(())
}

fn write_table(
    sheet: &mut Worksheet,
    table_model: &RenderTable,
    date_format: &Format,
) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold();
    let mut col_widths = HashMap::<u16, usize>::new();
    let mut row_i: u32 = 0;

    let mut track_width = |col: u16, s: &str| {
        let w = col_widths.entry(col).or_insert(0);
        *w = (*w).max(s.len());
    };

    for (c_i, h) in table_model.header.iter().enumerate() {
        let col = c_i as u16;
        track_width(col, h);
        sheet.write_with_format(row_i, col, h.as_str(), &header_format)?;
    }
    row_i += 1;

    let footer_rows = if table_model.footer.is_empty() {
        vec![]
    } else {
        vec![&table_model.footer]
    };
    for row in table_model.rows.iter().chain(footer_rows) {
        for (c_i, cell_str) in row.iter().enumerate() {
            let col = c_i as u16;
            track_width(col, cell_str);
            write_cell(sheet, row_i, col, cell_str, date_format)?;
        }
        row_i += 1;
    }

    for line in table_model.errors.iter().map(|e| format!("[!] {e}"))
        .chain(table_model.notes.iter().cloned())
    {
        sheet.write(row_i, 0, line.as_str())?;
        row_i += 1;
    }

    for (col, width) in col_widths {
        sheet.set_column_width(col, width as f64 + 1.0)?;
    }
    Ok(())
}

impl ReportWriter for XlsxWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        let sheet_name = self.unique_sheet_name(out_type, name);
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        let sheet = self.workbook.add_worksheet();
        sheet.set_name(&sheet_name).map_err(|e| format!("Sheet {sheet_name}: {e}"))?;
        write_table(sheet, table_model, &date_format)
            .map_err(|e| format!("Sheet {sheet_name}: {e}"))
    }

    fn finish(mut self: Box<Self>) -> Result<(), Error> {
        self.workbook
            .save(&self.out_path)
            .map_err(|e| format!("Failed to save {}: {}", self.out_path.display(), e))?;
        tracing::info!("Wrote {}", self.out_path.display());
        Ok(())
    }
}
