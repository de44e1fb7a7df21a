use std::io::Write;

use tabled::settings::{object::Rows, Alignment, Border, Style};

use crate::{portfolio::render::RenderTable, util::rw::WriteHandle};

use super::model::{Error, OutputType, ReportWriter};

pub struct TextWriter {
    w: WriteHandle,
}

impl TextWriter {
    pub fn new(w: WriteHandle) -> TextWriter {
        TextWriter { w }
    }
}

fn render_table_text(table_model: &RenderTable) -> String {
    let mut table_bldr = tabled::builder::Builder::default();
    table_bldr.push_record(table_model.header.iter().map(|h| h.to_uppercase()));
    for row in &table_model.rows {
        table_bldr.push_record(row.iter().cloned());
    }

    // The footer sits under the main table, after a blank separator row.
    let footer_sep_row = if !table_model.footer.is_empty() {
        let n_rows = table_model.rows.len();
        table_bldr.push_record(vec![String::new(); table_model.footer.len()]);
        table_bldr.push_record(table_model.footer.iter().cloned());
        Some(1 + n_rows)
    } else {
        None
    };

    let mut table = table_bldr.build();
    table.with(Style::ascii());
    table.modify(Rows::first(), Alignment::center());
    if let Some(sep_row) = footer_sep_row {
        table.modify(Rows::single(sep_row), Border::new().set_left(' ').set_right(' '));
    }
    table.to_string()
}

impl ReportWriter for TextWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error> {
        let map_write_err = |e| format!("{e}");

        for err in &table_model.errors {
            writeln!(self.w, "[!] {}", err).map_err(map_write_err)?;
        }

        writeln!(self.w, "{}", out_type.title(name)).map_err(map_write_err)?;
        writeln!(self.w, "{}", render_table_text(table_model)).map_err(map_write_err)?;

        for note in &table_model.notes {
            writeln!(self.w, "{note}").map_err(map_write_err)?;
        }

        writeln!(self.w).map_err(map_write_err)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), Error> {
        self.w.flush().map_err(|e| e.to_string())
    }
}
