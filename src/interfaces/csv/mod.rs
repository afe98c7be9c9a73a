pub mod operation_reader;
pub mod statement_writer;
