mod credits;
mod error;
mod income;
mod lot_matching;
mod report;
mod tax_year;
mod taxable_gain;

pub use self::credits::*;
pub use self::error::*;
pub use self::income::*;
pub use self::lot_matching::*;
pub use self::report::*;
pub use self::tax_year::*;
pub use self::taxable_gain::*;
