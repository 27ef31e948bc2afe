use crate::domain::transaction::TransactionRecord;
use crate::error::LoadError;
use std::io::Read;

/// Reads transaction log records from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<TransactionRecord, LoadError>`. Fields are trimmed, and networks may
/// be given either by identifier or by display label.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransactionReader<R> {
    /// Creates a new `TransactionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes records.
    pub fn records(self) -> impl Iterator<Item = Result<TransactionRecord, LoadError>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LoadError::from))
    }

    /// Reads every record, failing on the first malformed row.
    pub fn read_all(self) -> Result<Vec<TransactionRecord>, LoadError> {
        self.records().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::decision::DecisionMethod;
    use crate::domain::network::NetworkId;
    use crate::domain::transaction::TransactionStatus;
    use rust_decimal_macros::dec;

    const HEADER: &str =
        "id,merchant_id,network,fee,confirmation_time,decision_method,amount,status,timestamp";

    #[test]
    fn test_reader_valid_stream() {
        let data = format!(
            "{HEADER}\n\
             tx1, merchant123, Ethereum Mainnet, 0.0045 ETH, 15 seconds, heuristic, 1.25 ETH, completed, 2023-11-10T12:30:45Z\n\
             tx2, merchant123, polygon, 0.0012 MATIC, 8 seconds, hybrid, 50 MATIC, pending, 2023-11-10T11:15:22Z"
        );
        let records = TransactionReader::new(data.as_bytes()).read_all().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].network, NetworkId::Ethereum);
        assert_eq!(records[0].fee.value, dec!(0.0045));
        assert_eq!(records[1].network, NetworkId::Polygon);
        assert_eq!(records[1].decision_method, DecisionMethod::Hybrid);
        assert_eq!(records[1].status, TransactionStatus::Pending);
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = format!(
            "{HEADER}\ntx1, m, solana, 0.1 SOL, 1 seconds, heuristic, 1 SOL, completed, 2023-11-10T12:30:45Z"
        );
        let results: Vec<_> = TransactionReader::new(data.as_bytes()).records().collect();

        assert!(results[0].is_err());
    }
}
