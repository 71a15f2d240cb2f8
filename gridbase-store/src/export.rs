//! CSV export of cell documents.

use std::io::Write;

use crate::document::CellDocument;

/// Header row of every export.
pub const CSV_HEADER: [&str; 2] = ["Cell ID", "Value"];
/// Suggested download filename.
pub const CSV_FILENAME: &str = "spreadsheet.csv";

/// Write `cells` as two-column CSV, header first, in the given order.
pub fn write_csv<W: Write>(cells: &[CellDocument], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADER)?;
    for cell in cells {
        csv_writer.write_record([cell.cell_id.as_str(), cell.value.to_string().as_str()])?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Render `cells` to an in-memory CSV document.
pub fn to_csv_bytes(cells: &[CellDocument]) -> Result<Vec<u8>, csv::Error> {
    let mut buf = Vec::new();
    write_csv(cells, &mut buf)?;
    Ok(buf)
}
