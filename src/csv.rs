use serde::Serialize;
use std::io;

use crate::model::GiftRecord;

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    counterparty: &'a str,
    amount: String,
    release_timestamp: u64,
}

/// Write gift records in csv format, amounts in whole tokens.
pub fn write_gifts<'a, W: io::Write>(
    writer: W,
    gifts: impl IntoIterator<Item = &'a GiftRecord>,
) -> Result<(), csv::Error> {
    // header written by hand so an empty list still has one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(["counterparty", "amount", "release_timestamp"])?;

    for gift in gifts {
        let row = OutputRow {
            counterparty: gift.counterparty.as_str(),
            amount: gift.amount.to_string(),
            release_timestamp: gift.release_timestamp,
        };
        writer.serialize(&row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn gift(address: &str, base_units: u64, release: u64) -> GiftRecord {
        GiftRecord::new(address.parse().unwrap(), Amount::from_base_units(base_units), release)
    }

    fn render(gifts: &[GiftRecord]) -> String {
        let mut out = Vec::new();
        write_gifts(&mut out, gifts).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn writes_header_and_rows() {
        let output = render(&[gift("0xB", 150_000_000, 50), gift("0xA", 500_000_000, 100)]);
        assert_eq!(
            output,
            "counterparty,amount,release_timestamp\n0xB,1.5,50\n0xA,5,100\n"
        );
    }

    #[test]
    fn empty_list_still_has_header() {
        assert_eq!(render(&[]), "counterparty,amount,release_timestamp\n");
    }

    #[test]
    fn writes_to_file() {
        let mut file = NamedTempFile::new().unwrap();
        write_gifts(file.as_file_mut(), &[gift("0xC", 1, 7)]).unwrap();

        let mut content = String::new();
        file.reopen().unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "counterparty,amount,release_timestamp\n0xC,0.00000001,7\n");
    }
}
