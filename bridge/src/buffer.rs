//! Layout of the single string returned for a full set of cells and proofs.
//!
//! # Format
//!
//! Both [crate::Session::compute_cells_and_proofs] and [crate::Session::recover_cells_and_proofs]
//! produce the same layout: every proof followed by every cell, each hex-encoded in place with no
//! separators.
//!
//! ```text
//! +-----------+-----+---------------+----------+-----+--------------+
//! |  proof_0  | ... |  proof_{N-1}  |  cell_0  | ... | cell_{N-1}   |
//! +-----------+-----+---------------+----------+-----+--------------+
//!   96 chars           96 chars       4096 chars        4096 chars
//!
//! N = CELLS_PER_EXT_BLOB
//! ```
//!
//! The total length is always [LEN] characters. When the buffer is handed across a C boundary it
//! additionally carries one terminating NUL byte.

use crate::{
    hex, Bytes48, Cell, Error, BYTES_PER_CELL, BYTES_PER_PROOF, CELLS_PER_EXT_BLOB,
};

/// Number of characters in an encoded buffer.
pub const LEN: usize =
    2 * (CELLS_PER_EXT_BLOB * BYTES_PER_PROOF + CELLS_PER_EXT_BLOB * BYTES_PER_CELL);

/// Character offset of the first cell.
pub const CELLS_OFFSET: usize = 2 * CELLS_PER_EXT_BLOB * BYTES_PER_PROOF;

/// Every cell of an extended blob together with the proof for each cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellsAndProofs {
    cells: Vec<Cell>,
    proofs: Vec<Bytes48>,
}

impl CellsAndProofs {
    /// Creates a new [CellsAndProofs], requiring exactly [CELLS_PER_EXT_BLOB] of each.
    pub fn new(cells: Vec<Cell>, proofs: Vec<Bytes48>) -> Result<Self, Error> {
        if cells.len() != CELLS_PER_EXT_BLOB {
            return Err(Error::MismatchedLengths("cells"));
        }
        if proofs.len() != CELLS_PER_EXT_BLOB {
            return Err(Error::MismatchedLengths("proofs"));
        }
        Ok(Self { cells, proofs })
    }

    /// Returns the cells, ordered by cell index.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the proofs, ordered by cell index.
    pub fn proofs(&self) -> &[Bytes48] {
        &self.proofs
    }

    /// Splits into cells and proofs.
    pub fn into_parts(self) -> (Vec<Cell>, Vec<Bytes48>) {
        (self.cells, self.proofs)
    }
}

/// Encodes all proofs then all cells into a single string of [LEN] characters.
pub fn encode(value: &CellsAndProofs) -> Result<String, Error> {
    let mut out = String::new();
    out.try_reserve_exact(LEN + 1).map_err(|_| Error::Allocation)?;
    for proof in value.proofs() {
        hex::encode_into(&mut out, proof);
    }
    for cell in value.cells() {
        hex::encode_into(&mut out, cell);
    }
    debug_assert_eq!(out.len(), LEN);
    Ok(out)
}

/// Parses a string produced by [encode].
pub fn decode(value: &str) -> Result<CellsAndProofs, Error> {
    let value = hex::strip_prefix(value);
    if value.len() != LEN {
        return Err(hex::Error::InvalidLength(LEN, value.len()).into());
    }
    if let Some((index, character)) = value
        .char_indices()
        .find(|(_, c)| !c.is_ascii_hexdigit())
    {
        return Err(hex::Error::InvalidCharacter(character, index).into());
    }

    let proof_len = hex::encoded_len(BYTES_PER_PROOF);
    let proofs = value[..CELLS_OFFSET]
        .as_bytes()
        .chunks(proof_len)
        .map(|chunk| {
            let mut proof = [0u8; BYTES_PER_PROOF];
            hex::decode_into(ascii(chunk), &mut proof)?;
            Ok(Bytes48::new(proof))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let cell_len = hex::encoded_len(BYTES_PER_CELL);
    let cells = value[CELLS_OFFSET..]
        .as_bytes()
        .chunks(cell_len)
        .map(|chunk| Cell::from_hex(ascii(chunk)))
        .collect::<Result<Vec<_>, Error>>()?;

    CellsAndProofs::new(cells, proofs)
}

fn ascii(chunk: &[u8]) -> &str {
    // Every character was checked to be a hex digit.
    std::str::from_utf8(chunk).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CellsAndProofs {
        let cells = (0..CELLS_PER_EXT_BLOB)
            .map(|i| {
                let mut cell = Cell::zeroed();
                cell[0] = i as u8;
                cell[BYTES_PER_CELL - 1] = 0xee;
                cell
            })
            .collect();
        let proofs = (0..CELLS_PER_EXT_BLOB)
            .map(|i| {
                let mut proof = [0xc0u8; BYTES_PER_PROOF];
                proof[1] = i as u8;
                Bytes48::new(proof)
            })
            .collect();
        CellsAndProofs::new(cells, proofs).unwrap()
    }

    #[test]
    fn test_len() {
        assert_eq!(LEN, 2 * (128 * 48 + 128 * 2048));
        assert_eq!(CELLS_OFFSET, 2 * 128 * 48);
    }

    #[test]
    fn test_layout() {
        let value = sample();
        let encoded = encode(&value).unwrap();
        assert_eq!(encoded.len(), LEN);

        // Proofs come first, in order
        assert_eq!(&encoded[..96], value.proofs()[0].to_hex());
        assert_eq!(&encoded[96..192], value.proofs()[1].to_hex());
        assert!(encoded[..4].eq("C000"));

        // Cells follow
        let cell_len = 2 * BYTES_PER_CELL;
        assert_eq!(
            &encoded[CELLS_OFFSET..CELLS_OFFSET + cell_len],
            value.cells()[0].to_hex()
        );
        assert_eq!(&encoded[LEN - cell_len..], value.cells()[127].to_hex());
        assert!(encoded.ends_with("EE"));

        assert_eq!(decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_new_rejects_wrong_counts() {
        let (mut cells, proofs) = sample().into_parts();
        cells.pop();
        assert!(matches!(
            CellsAndProofs::new(cells.clone(), proofs.clone()),
            Err(Error::MismatchedLengths("cells"))
        ));
        cells.push(Cell::zeroed());
        let mut short = proofs;
        short.truncate(1);
        assert!(matches!(
            CellsAndProofs::new(cells, short),
            Err(Error::MismatchedLengths("proofs"))
        ));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let encoded = encode(&sample()).unwrap();
        assert!(decode(&encoded[1..]).is_err());

        let mut corrupted = encoded.clone();
        corrupted.replace_range(CELLS_OFFSET..CELLS_OFFSET + 1, "Z");
        assert!(matches!(
            decode(&corrupted),
            Err(Error::Hex(hex::Error::InvalidCharacter('Z', CELLS_OFFSET)))
        ));

        let mut wide = encoded;
        wide.replace_range(0..2, "é");
        assert!(matches!(
            decode(&wide),
            Err(Error::Hex(hex::Error::InvalidCharacter('é', 0)))
        ));
    }

    #[test]
    fn test_reencode_is_canonical() {
        let encoded = encode(&sample()).unwrap();
        let loose = format!("0x{}", encoded.to_lowercase());
        let reencoded = encode(&decode(&loose).unwrap()).unwrap();
        assert_eq!(reencoded, encoded);
        assert_ne!(reencoded, loose.to_uppercase());
    }
}
