//! Every operation in the form a string/numeric-only host can call.
//!
//! Inputs are hex strings (an optional `0x` prefix is accepted) and outputs are upper-case hex
//! strings, the constant strings of [signal], or composite codes. No function here returns a rich
//! error: failures are collapsed with [signal::owned], [signal::verdict], or [signal::composite].
//!
//! # Surfaces
//!
//! | Operation                        | Output                                   |
//! |----------------------------------|------------------------------------------|
//! | [blob_to_kzg_commitment]         | commitment hex or error message          |
//! | [compute_kzg_proof]              | `proof ‖ y` hex or error message         |
//! | [compute_blob_kzg_proof]         | proof hex or error message               |
//! | [compute_cells_and_kzg_proofs]   | [crate::buffer] string or error message  |
//! | [recover_cells_and_kzg_proofs]   | [crate::buffer] string or error message  |
//! | `verify_*`                       | `"true"`, `"false"`, or error message    |
//! | `load_*`                         | composite code                           |

use crate::{
    buffer, hex, signal, Blob, Bytes32, Bytes48, Cell, CKzg, Code, Engine, Error, Session,
};
use std::io::Read;

fn encode(bytes: &[u8]) -> Result<String, Error> {
    Ok(hex::try_encode(bytes)?)
}

fn encode_all(parts: &[&[u8]]) -> Result<String, Error> {
    Ok(hex::try_encode_all(parts)?)
}

fn owned(f: impl FnOnce() -> Result<String, Error>) -> String {
    signal::owned(f())
}

fn verdict(f: impl FnOnce() -> Result<bool, Error>) -> &'static str {
    signal::verdict(f())
}

fn parse_all<T>(
    values: &[&str],
    parse: impl Fn(&str) -> Result<T, Error>,
) -> Result<Vec<T>, Error> {
    let mut out = Vec::new();
    out.try_reserve_exact(values.len())
        .map_err(|_| Error::Allocation)?;
    for &value in values {
        out.push(parse(value)?);
    }
    Ok(out)
}

/// Loads a trusted setup from raw compressed points, returning a composite code.
pub fn load_trusted_setup<E: Engine>(
    session: &mut Session<E>,
    g1_monomial: &[u8],
    g1_lagrange: &[u8],
    g2_monomial: &[u8],
    precompute: u64,
) -> u32 {
    let result = session.load(g1_monomial, g1_lagrange, g2_monomial, precompute);
    signal::composite(&result)
}

/// Loads a trusted setup from its textual serialization, returning the primary [Code] only.
pub fn load_trusted_setup_from_reader<E: Engine>(
    session: &mut Session<E>,
    source: impl Read,
    precompute: u64,
) -> Code {
    match session.load_from_reader(source, precompute) {
        Ok(()) => Code::Ok,
        Err(err) => err.code(),
    }
}

/// Installs the Ethereum mainnet trusted setup, returning a composite code.
pub fn load_ethereum(session: &mut Session<CKzg>, precompute: u64) -> u32 {
    signal::composite(&session.load_ethereum(precompute))
}

/// Releases the active trusted setup.
pub fn free_trusted_setup<E: Engine>(session: &mut Session<E>) {
    session.release();
}

/// Commits to a hex-encoded blob.
pub fn blob_to_kzg_commitment<E: Engine>(session: &Session<E>, blob: &str) -> String {
    owned(|| {
        let blob = Blob::from_hex(blob)?;
        encode(&session.blob_to_commitment(&blob)?)
    })
}

/// Computes the proof and claimed value of a blob at `z`, returned as `hex(proof) ‖ hex(y)`.
pub fn compute_kzg_proof<E: Engine>(session: &Session<E>, blob: &str, z: &str) -> String {
    owned(|| {
        let blob = Blob::from_hex(blob)?;
        let z = Bytes32::from_hex(z)?;
        let (proof, y) = session.compute_proof(&blob, &z)?;
        encode_all(&[&proof[..], &y[..]])
    })
}

/// Computes the proof for a blob and its commitment.
pub fn compute_blob_kzg_proof<E: Engine>(
    session: &Session<E>,
    blob: &str,
    commitment: &str,
) -> String {
    owned(|| {
        let blob = Blob::from_hex(blob)?;
        let commitment = Bytes48::from_hex(commitment)?;
        encode(&session.compute_blob_proof(&blob, &commitment)?)
    })
}

/// Verifies that the committed polynomial evaluates to `y` at `z`.
pub fn verify_kzg_proof<E: Engine>(
    session: &Session<E>,
    commitment: &str,
    z: &str,
    y: &str,
    proof: &str,
) -> &'static str {
    verdict(|| {
        let commitment = Bytes48::from_hex(commitment)?;
        let z = Bytes32::from_hex(z)?;
        let y = Bytes32::from_hex(y)?;
        let proof = Bytes48::from_hex(proof)?;
        session.verify_proof(&commitment, &z, &y, &proof)
    })
}

/// Verifies a blob proof.
pub fn verify_blob_kzg_proof<E: Engine>(
    session: &Session<E>,
    blob: &str,
    commitment: &str,
    proof: &str,
) -> &'static str {
    verdict(|| {
        let blob = Blob::from_hex(blob)?;
        let commitment = Bytes48::from_hex(commitment)?;
        let proof = Bytes48::from_hex(proof)?;
        session.verify_blob_proof(&blob, &commitment, &proof)
    })
}

/// Verifies many blob proofs at once. The slices are correlated by position.
pub fn verify_blob_kzg_proof_batch<E: Engine>(
    session: &Session<E>,
    blobs: &[&str],
    commitments: &[&str],
    proofs: &[&str],
) -> &'static str {
    verdict(|| {
        let blobs = parse_all(blobs, Blob::from_hex)?;
        let commitments = parse_all(commitments, Bytes48::from_hex)?;
        let proofs = parse_all(proofs, Bytes48::from_hex)?;
        session.verify_blob_proof_batch(&blobs, &commitments, &proofs)
    })
}

/// Extends a blob into cells and computes the proof of each, returned in [buffer] layout.
pub fn compute_cells_and_kzg_proofs<E: Engine>(session: &Session<E>, blob: &str) -> String {
    owned(|| {
        let blob = Blob::from_hex(blob)?;
        buffer::encode(&session.compute_cells_and_proofs(&blob)?)
    })
}

/// Reconstructs every cell and proof from a subset of cells, returned in [buffer] layout.
///
/// `cell_indices[i]` is the index of `cells[i]` in the extended blob.
pub fn recover_cells_and_kzg_proofs<E: Engine>(
    session: &Session<E>,
    cell_indices: &[u64],
    cells: &[&str],
) -> String {
    owned(|| {
        let cells = parse_all(cells, Cell::from_hex)?;
        buffer::encode(&session.recover_cells_and_proofs(cell_indices, &cells)?)
    })
}

/// Verifies a batch of cells. The slices are correlated by position in the batch.
pub fn verify_cell_kzg_proof_batch<E: Engine>(
    session: &Session<E>,
    commitments: &[&str],
    cell_indices: &[u64],
    cells: &[&str],
    proofs: &[&str],
) -> &'static str {
    verdict(|| {
        let commitments = parse_all(commitments, Bytes48::from_hex)?;
        let cells = parse_all(cells, Cell::from_hex)?;
        let proofs = parse_all(proofs, Bytes48::from_hex)?;
        session.verify_cell_proof_batch(&commitments, cell_indices, &cells, &proofs)
    })
}

/// Verifies one cell at `cell_index` against its commitment.
pub fn verify_cell_kzg_proof<E: Engine>(
    session: &Session<E>,
    commitment: &str,
    cell_index: u64,
    cell: &str,
    proof: &str,
) -> &'static str {
    verdict(|| {
        let commitment = Bytes48::from_hex(commitment)?;
        let cell = Cell::from_hex(cell)?;
        let proof = Bytes48::from_hex(proof)?;
        session.verify_cell_proof(&commitment, cell_index, &cell, &proof)
    })
}
