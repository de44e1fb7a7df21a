pub mod ib_statement;
