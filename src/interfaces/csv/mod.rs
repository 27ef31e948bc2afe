//! CSV form of the transaction log.
//!
//! Columns: `id,merchant_id,network,fee,confirmation_time,decision_method,amount,status,timestamp`.

pub mod transaction_reader;
pub mod transaction_writer;
