use rust_decimal::Decimal;
use time::Date;

/// A cash dividend as reported by the broker, in trade currency.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Dividend {
    pub symbol: String,
    pub date: Date,
    pub currency: String,
    pub amount: Decimal,
    // Withholding tax taken at source, as a positive amount
    pub tax_withheld: Decimal,
    pub description: String,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Interest {
    pub date: Date,
    pub currency: String,
    pub amount: Decimal,
    pub description: String,
}
