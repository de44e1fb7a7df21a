pub mod bookkeeping;
pub mod io;
pub mod model;
pub mod render;

#[cfg(any(test, feature = "testlib"))]
pub mod pub_testlib;

pub use self::model::gain::*;
pub use self::model::income::*;
pub use self::model::trade::*;
