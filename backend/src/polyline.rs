//! Google encoded polylines (`overview_polyline.points`), precision 1e5,
//! latitude first. Decoding is done by the `polyline` crate; the input is
//! screened first so malformed provider data surfaces as an error.

const PRECISION: u32 = 5;
/// Six 5-bit chunks cover any delta between valid coordinates at 1e5.
const MAX_CHUNKS_PER_VALUE: usize = 7;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PolylineError {
    #[error("polyline ends in the middle of a value at byte {0}")]
    Truncated(usize),
    #[error("invalid polyline byte {byte:#04x} at {index}")]
    InvalidByte { index: usize, byte: u8 },
    #[error("polyline value starting at byte {0} is out of range")]
    OutOfRange(usize),
    #[error("undecodable polyline: {0}")]
    Decode(String),
}

/// Decodes into `[lat, lon]` pairs.
pub fn decode(encoded: &str) -> Result<Vec<[f64; 2]>, PolylineError> {
    screen(encoded.as_bytes())?;
    let line = ::polyline::decode_polyline(encoded, PRECISION).map_err(PolylineError::Decode)?;
    Ok(line.0.into_iter().map(|c| [c.y, c.x]).collect())
}

/// Every byte in the alphabet, every value complete and bounded, values in
/// lat/lon pairs.
fn screen(bytes: &[u8]) -> Result<(), PolylineError> {
    let mut values = 0usize;
    let mut chunks = 0usize;
    let mut value_start = 0usize;

    for (index, &byte) in bytes.iter().enumerate() {
        if !(63..127).contains(&byte) {
            return Err(PolylineError::InvalidByte { index, byte });
        }
        if chunks == 0 {
            value_start = index;
        }
        chunks += 1;
        if chunks > MAX_CHUNKS_PER_VALUE {
            return Err(PolylineError::OutOfRange(value_start));
        }
        if byte - 63 < 0x20 {
            values += 1;
            chunks = 0;
        }
    }

    if chunks != 0 || values % 2 != 0 {
        return Err(PolylineError::Truncated(bytes.len()));
    }
    Ok(())
}
