use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    fx::DEFAULT_LOOKBACK_DAYS,
    portfolio::bookkeeping::{TaxYearOptions, UnmatchedClosePolicy},
    util::{date::mid_year, decimal::GreaterEqualZeroDecimal},
};

use super::input_parse::parse_split_dates;

pub type Error = String;

#[derive(Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct TaxpayerInfo {
    pub name: String,
    #[serde(default)]
    pub id_number: Option<String>,
}

impl std::fmt::Display for TaxpayerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.id_number {
            Some(id) => write!(f, "{} ({})", self.name, id),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Settings for a tax year computation. Read from a json file, where every
/// field is optional, and then overridden by command line flags.
#[derive(Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct TaxConfig {
    pub tax_year: Option<i32>,
    pub loss_from_prev_years: Decimal,
    pub rate_lookback_days: u32,
    // Partition the year at July 1st. Ignored when split_dates is set.
    pub split_half_year: bool,
    // YYYY-MM-DD
    pub split_dates: Vec<String>,
    pub unmatched_close_policy: UnmatchedClosePolicy,
    pub taxpayer: Option<TaxpayerInfo>,
}

impl Default for TaxConfig {
    fn default() -> Self {
        TaxConfig {
            tax_year: None,
            loss_from_prev_years: Decimal::ZERO,
            rate_lookback_days: DEFAULT_LOOKBACK_DAYS,
            split_half_year: true,
            split_dates: Vec::new(),
            unmatched_close_policy: UnmatchedClosePolicy::default(),
            taxpayer: None,
        }
    }
}

impl TaxConfig {
    pub fn from_json_str(desc: &str, json_text: &str) -> Result<TaxConfig, Error> {
        serde_json::from_str(json_text).map_err(|e| format!("Invalid config in {desc}: {e}"))
    }

    /// Validates the config and converts it into the options of the
    /// tax year computation.
    pub fn tax_year_options(&self) -> Result<TaxYearOptions, Error> {
        let tax_year = self
            .tax_year
            .ok_or_else(|| Error::from("No tax year was provided"))?;
        let loss = GreaterEqualZeroDecimal::try_from(self.loss_from_prev_years).map_err(|_| {
            format!("Loss from previous years ({}) must not be negative", self.loss_from_prev_years)
        })?;
        if self.rate_lookback_days == 0 {
            return Err("Rate lookback days must be at least 1".to_string());
        }

        // Validates the year itself, before any date within it is built.
        let single_period =
            TaxYearOptions::new(tax_year, loss, Vec::new(), self.unmatched_close_policy)?;
        let split_dates = if !self.split_dates.is_empty() {
            parse_split_dates(&self.split_dates)?
        } else if self.split_half_year {
            vec![mid_year(tax_year)]
        } else {
            return Ok(single_period);
        };

        TaxYearOptions::new(tax_year, loss, split_dates, self.unmatched_close_policy)
    }
}

pub fn load_config(path: &Path) -> Result<TaxConfig, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Unable to read config {}: {}", path.display(), e))?;
    let config = TaxConfig::from_json_str(&path.display().to_string(), &text)?;
    tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}
