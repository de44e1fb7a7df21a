use crate::portfolio::render::RenderTable;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum OutputType {
    // name is the period, or the tax year for the whole-year table
    CapitalGains,
    Dividends,
    Interest,
    PeriodSummary,
    AnnualSummary,
}

impl OutputType {
    pub fn title(&self, name: &str) -> String {
        match self {
            OutputType::CapitalGains => format!("Capital Gains ({name})"),
            OutputType::Dividends => format!("Dividends ({name})"),
            OutputType::Interest => format!("Interest ({name})"),
            OutputType::PeriodSummary => format!("Period Summary ({name})"),
            OutputType::AnnualSummary => format!("Annual Summary ({name})"),
        }
    }

    // Lowercase, with runs of anything that isn't alphanumeric replaced by a
    // single '-'. Used for file and sheet names.
    pub fn slug(&self, name: &str) -> String {
        let prefix = match self {
            OutputType::CapitalGains => "capital-gains",
            OutputType::Dividends => "dividends",
            OutputType::Interest => "interest",
            OutputType::PeriodSummary => "period-summary",
            OutputType::AnnualSummary => "annual-summary",
        };
        let mut slug = prefix.to_string();
        let mut pending_dash = true;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash {
                    slug.push('-');
                    pending_dash = false;
                }
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }
        slug
    }
}

pub type Error = String;

pub trait ReportWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error>;

    fn finish(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}
