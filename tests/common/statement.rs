// Builds activity statement text, as exported by Interactive Brokers.
use ilcg::util::rw::DescribedReader;

const TRADES_HEADER: &str = "Trades,Header,DataDiscriminator,Asset Category,Currency,Symbol,\
Date/Time,Quantity,T. Price,C. Price,Proceeds,Comm/Fee,Basis,Realized P/L,MTM P/L,Code";

const DIVIDENDS_HEADER: &str = "Dividends,Header,Currency,Date,Description,Amount";
const WITHHOLDING_HEADER: &str = "Withholding Tax,Header,Currency,Date,Description,Amount,Code";
const INTEREST_HEADER: &str = "Interest,Header,Currency,Date,Description,Amount";

#[derive(Default)]
pub struct StatementBuilder {
    trades: Vec<String>,
    dividends: Vec<String>,
    withholdings: Vec<String>,
    interest: Vec<String>,
}

impl StatementBuilder {
    pub fn new() -> StatementBuilder {
        StatementBuilder::default()
    }

    /// shares is negative for sells. code is O or C.
    pub fn trade(
        mut self, symbol: &str, date: &str, shares: &str, price: &str, comm: &str, code: &str,
    ) -> Self {
        self.trades.push(format!(
            "Trades,Data,Order,Stocks,USD,{symbol},\"{date}, 10:00:00\",\"{shares}\",{price},\
             {price},0,-{comm},0,0,0,{code}"
        ));
        self
    }

    pub fn dividend(mut self, symbol: &str, date: &str, amount: &str, withheld: &str) -> Self {
        self.dividends.push(format!(
            "Dividends,Data,USD,{date},{symbol}(US0000000000) Cash Dividend USD 0.10 per Share,{amount}"
        ));
        if !withheld.is_empty() {
            self.withholdings.push(format!(
                "Withholding Tax,Data,USD,{date},{symbol}(US0000000000) Cash Dividend - US Tax,\
                 -{withheld},"
            ));
        }
        self
    }

    pub fn interest(mut self, date: &str, amount: &str) -> Self {
        self.interest.push(format!("Interest,Data,USD,{date},USD Credit Interest,{amount}"));
        self
    }

    pub fn text(&self) -> String {
        let mut lines = vec![
            "Statement,Header,Field Name,Field Value".to_string(),
            "Statement,Data,BrokerName,Interactive Brokers".to_string(),
            TRADES_HEADER.to_string(),
        ];
        lines.extend(self.trades.iter().cloned());
        lines.push(DIVIDENDS_HEADER.to_string());
        lines.extend(self.dividends.iter().cloned());
        lines.push(WITHHOLDING_HEADER.to_string());
        lines.extend(self.withholdings.iter().cloned());
        lines.push(INTEREST_HEADER.to_string());
        lines.extend(self.interest.iter().cloned());
        lines.join("\n") + "\n"
    }

    pub fn reader(&self, desc: &str) -> DescribedReader {
        DescribedReader::from_string(desc.to_string(), self.text())
    }
}

pub fn rates_reader(rates: &[(&str, &str)]) -> DescribedReader {
    let mut text = "Date,Rate\n".to_string();
    for (d, r) in rates {
        text += &format!("{d},{r}\n");
    }
    DescribedReader::from_string("rates.csv".to_string(), text)
}
