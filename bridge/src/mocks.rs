//! A deterministic [crate::Engine] for testing the session lifecycle without a real trusted setup.
//!
//! The mock mirrors the shape of the real engine (input validation, setup detail codes, cell
//! extension, and recovery) but replaces every curve operation with SHA-256. Proofs are bound to
//! the setup they were produced under, so a proof computed with one setup never verifies under
//! another.
//!
//! Cells are produced by a simple repetition code: cell `2k` is the `k`-th chunk of the blob and
//! cell `2k + 1` is the same chunk reversed. Recovery succeeds whenever at least
//! [CELLS_FOR_RECOVERY] distinct cells are supplied and every chunk is covered by one of them.
//!
//! # Setup Formats
//!
//! Raw setups are accepted when every buffer has the expected length, the first byte of every
//! point has the compression flag (`0x80`) set, and the Lagrange basis differs from the monomial
//! basis. Textual setups are any text that begins with `mock`.

use crate::{
    Blob, Bytes32, Bytes48, Cell, CellsAndProofs, Code, Error, SettingsError,
    BYTES_PER_CELL, BYTES_PER_FIELD_ELEMENT, BYTES_PER_G1, BYTES_PER_G2, CELLS_FOR_RECOVERY,
    CELLS_PER_EXT_BLOB, MAX_PRECOMPUTE, NUM_G1_POINTS, NUM_G2_POINTS,
};
use sha2::{Digest, Sha256};
use std::cell::Cell as Counter;

thread_local! {
    static RELEASED: Counter<usize> = const { Counter::new(0) };
}

/// Returns how many mock setups have been released on the current thread.
pub fn released() -> usize {
    RELEASED.with(|released| released.get())
}

/// Returns a raw setup the mock accepts, varied by `seed`.
pub fn setup(seed: u8) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let g1_monomial = vec![0x80 | (seed & 0x3f); NUM_G1_POINTS * BYTES_PER_G1];
    let g1_lagrange = vec![0xc0 | (seed & 0x3f); NUM_G1_POINTS * BYTES_PER_G1];
    let g2_monomial = vec![0x80; NUM_G2_POINTS * BYTES_PER_G2];
    (g1_monomial, g1_lagrange, g2_monomial)
}

/// A mock trusted setup.
#[derive(Debug)]
pub struct Engine {
    fingerprint: [u8; 32],
    precompute: u64,
}

impl Drop for Engine {
    fn drop(&mut self) {
        RELEASED.with(|released| released.set(released.get() + 1));
    }
}

fn hash(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn points_valid(bytes: &[u8], size: usize) -> bool {
    bytes.chunks(size).all(|point| point[0] & 0x80 != 0)
}

fn setup_error(detail: SettingsError) -> Error {
    Error::Setup(Code::BadArguments, detail)
}

impl Engine {
    /// Returns the precompute value the setup was loaded with.
    pub fn precompute(&self) -> u64 {
        self.precompute
    }

    /// Returns a digest identifying the setup.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    fn digest48(&self, tag: &[u8], parts: &[&[u8]]) -> Bytes48 {
        let mut inputs = vec![&self.fingerprint[..], tag];
        inputs.extend_from_slice(parts);
        let first = hash(&inputs);
        inputs.push(&b"extend"[..]);
        let second = hash(&inputs);

        let mut out = [0u8; 48];
        out[..32].copy_from_slice(&first);
        out[32..].copy_from_slice(&second[..16]);
        // Keep the compression flag set, like a real compressed point.
        out[0] |= 0x80;
        Bytes48::new(out)
    }

    fn check_blob(blob: &Blob) -> Result<(), Error> {
        // Reject elements above the top byte of the BLS12-381 scalar modulus.
        if blob
            .chunks(BYTES_PER_FIELD_ELEMENT)
            .any(|element| element[0] > 0x73)
        {
            return Err(Error::Rejected);
        }
        Ok(())
    }

    fn cell_proof(&self, commitment: &Bytes48, index: u64, cell: &[u8]) -> Bytes48 {
        self.digest48(b"cell", &[&commitment[..], &index.to_be_bytes()[..], cell])
    }

    fn extend(&self, blob: &Blob) -> Result<CellsAndProofs, Error> {
        let commitment = self.blob_to_commitment_inner(blob)?;
        let mut cells = Vec::with_capacity(CELLS_PER_EXT_BLOB);
        let mut proofs = Vec::with_capacity(CELLS_PER_EXT_BLOB);
        for (index, chunk) in (0..CELLS_PER_EXT_BLOB as u64)
            .zip(blob.chunks(BYTES_PER_CELL).flat_map(|chunk| [chunk, chunk]))
        {
            let mut cell = Cell::try_from(chunk)?;
            if index % 2 == 1 {
                cell.reverse();
            }
            proofs.push(self.cell_proof(&commitment, index, &cell));
            cells.push(cell);
        }
        CellsAndProofs::new(cells, proofs)
    }

    fn blob_to_commitment_inner(&self, blob: &Blob) -> Result<Bytes48, Error> {
        Self::check_blob(blob)?;
        Ok(self.digest48(b"commitment", &[&blob[..]]))
    }
}

impl crate::Engine for Engine {
    fn load(
        g1_monomial: &[u8],
        g1_lagrange: &[u8],
        g2_monomial: &[u8],
        precompute: u64,
    ) -> Result<Self, Error> {
        if precompute > MAX_PRECOMPUTE {
            return Err(setup_error(SettingsError::BadPrecompute));
        }
        if g1_monomial.len() != NUM_G1_POINTS * BYTES_PER_G1 {
            return Err(setup_error(SettingsError::BadG1MonomialLength));
        }
        if g1_lagrange.len() != NUM_G1_POINTS * BYTES_PER_G1 {
            return Err(setup_error(SettingsError::BadG1LagrangeLength));
        }
        if g2_monomial.len() != NUM_G2_POINTS * BYTES_PER_G2 {
            return Err(setup_error(SettingsError::BadG2MonomialLength));
        }
        if !points_valid(g1_monomial, BYTES_PER_G1) {
            return Err(setup_error(SettingsError::BadG1Monomial));
        }
        if !points_valid(g1_lagrange, BYTES_PER_G1) {
            return Err(setup_error(SettingsError::BadG1Lagrange));
        }
        if !points_valid(g2_monomial, BYTES_PER_G2) {
            return Err(setup_error(SettingsError::BadG2Monomial));
        }
        if g1_lagrange == g1_monomial {
            return Err(setup_error(SettingsError::BadLagrange));
        }
        Ok(Self {
            fingerprint: hash(&[g1_monomial, g1_lagrange, g2_monomial]),
            precompute,
        })
    }

    fn parse(text: &str, precompute: u64) -> Result<Self, Error> {
        if precompute > MAX_PRECOMPUTE || !text.starts_with("mock") {
            return Err(Error::Rejected);
        }
        Ok(Self {
            fingerprint: hash(&[text.as_bytes()]),
            precompute,
        })
    }

    fn blob_to_commitment(&self, blob: &Blob) -> Result<Bytes48, Error> {
        self.blob_to_commitment_inner(blob)
    }

    fn compute_proof(&self, blob: &Blob, z: &Bytes32) -> Result<(Bytes48, Bytes32), Error> {
        let commitment = self.blob_to_commitment_inner(blob)?;
        let mut y = hash(&[&self.fingerprint[..], &b"evaluate"[..], &blob[..], &z[..]]);
        y[0] = 0;
        let y = Bytes32::new(y);
        let proof = self.digest48(b"proof", &[&commitment[..], &z[..], &y[..]]);
        Ok((proof, y))
    }

    fn compute_blob_proof(&self, blob: &Blob, commitment: &Bytes48) -> Result<Bytes48, Error> {
        Self::check_blob(blob)?;
        Ok(self.digest48(b"blob", &[&commitment[..], &blob[..]]))
    }

    fn verify_proof(
        &self,
        commitment: &Bytes48,
        z: &Bytes32,
        y: &Bytes32,
        proof: &Bytes48,
    ) -> Result<bool, Error> {
        Ok(self.digest48(b"proof", &[&commitment[..], &z[..], &y[..]]) == *proof)
    }

    fn verify_blob_proof(
        &self,
        blob: &Blob,
        commitment: &Bytes48,
        proof: &Bytes48,
    ) -> Result<bool, Error> {
        let expected = self.blob_to_commitment_inner(blob)?;
        Ok(expected == *commitment
            && self.digest48(b"blob", &[&commitment[..], &blob[..]]) == *proof)
    }

    fn verify_blob_proof_batch(
        &self,
        blobs: &[Blob],
        commitments: &[Bytes48],
        proofs: &[Bytes48],
    ) -> Result<bool, Error> {
        if blobs.len() != commitments.len() || blobs.len() != proofs.len() {
            return Err(Error::Rejected);
        }
        let mut verified = true;
        for ((blob, commitment), proof) in blobs.iter().zip(commitments).zip(proofs) {
            verified &= crate::Engine::verify_blob_proof(self, blob, commitment, proof)?;
        }
        Ok(verified)
    }

    fn compute_cells_and_proofs(&self, blob: &Blob) -> Result<CellsAndProofs, Error> {
        self.extend(blob)
    }

    fn recover_cells_and_proofs(
        &self,
        cell_indices: &[u64],
        cells: &[Cell],
    ) -> Result<CellsAndProofs, Error> {
        if cell_indices.len() != cells.len() || cells.len() < CELLS_FOR_RECOVERY {
            return Err(Error::Rejected);
        }
        let mut seen = [false; CELLS_PER_EXT_BLOB];
        let mut chunks: Vec<Option<Cell>> = vec![None; CELLS_PER_EXT_BLOB / 2];
        for (&index, cell) in cell_indices.iter().zip(cells) {
            let slot = seen.get_mut(index as usize).ok_or(Error::Rejected)?;
            if *slot {
                return Err(Error::Rejected);
            }
            *slot = true;

            let mut chunk = cell.clone();
            if index % 2 == 1 {
                chunk.reverse();
            }
            chunks[(index / 2) as usize] = Some(chunk);
        }

        let mut blob = Blob::zeroed();
        for (chunk, out) in chunks.into_iter().zip(blob.chunks_mut(BYTES_PER_CELL)) {
            out.copy_from_slice(&chunk.ok_or(Error::Rejected)?);
        }
        self.extend(&blob)
    }

    fn verify_cell_proof_batch(
        &self,
        commitments: &[Bytes48],
        cell_indices: &[u64],
        cells: &[Cell],
        proofs: &[Bytes48],
    ) -> Result<bool, Error> {
        let n = cells.len();
        if commitments.len() != n || cell_indices.len() != n || proofs.len() != n {
            return Err(Error::Rejected);
        }
        let mut verified = true;
        for i in 0..n {
            if cell_indices[i] >= CELLS_PER_EXT_BLOB as u64 {
                return Err(Error::Rejected);
            }
            verified &= self.cell_proof(&commitments[i], cell_indices[i], &cells[i]) == proofs[i];
        }
        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine as _;

    fn blob(seed: u8) -> Blob {
        let mut blob = Blob::zeroed();
        for (i, byte) in blob.iter_mut().enumerate() {
            if i % BYTES_PER_FIELD_ELEMENT != 0 {
                *byte = seed.wrapping_add(i as u8);
            }
        }
        blob
    }

    fn engine(seed: u8) -> Engine {
        let (g1_monomial, g1_lagrange, g2_monomial) = setup(seed);
        Engine::load(&g1_monomial, &g1_lagrange, &g2_monomial, 0).unwrap()
    }

    #[test]
    fn test_load_details() {
        let (g1_monomial, g1_lagrange, g2_monomial) = setup(1);
        let detail = |result: Result<Engine, Error>| result.unwrap_err().detail();

        assert_eq!(
            detail(Engine::load(&g1_monomial, &g1_lagrange, &g2_monomial, 16)),
            Some(SettingsError::BadPrecompute)
        );
        assert_eq!(
            detail(Engine::load(&g1_monomial[1..], &g1_lagrange, &g2_monomial, 0)),
            Some(SettingsError::BadG1MonomialLength)
        );
        assert_eq!(
            detail(Engine::load(&g1_monomial, &g1_lagrange[1..], &g2_monomial, 0)),
            Some(SettingsError::BadG1LagrangeLength)
        );
        assert_eq!(
            detail(Engine::load(&g1_monomial, &g1_lagrange, &g2_monomial[1..], 0)),
            Some(SettingsError::BadG2MonomialLength)
        );
        let mut bad = g2_monomial.clone();
        bad[BYTES_PER_G2] = 0;
        assert_eq!(
            detail(Engine::load(&g1_monomial, &g1_lagrange, &bad, 0)),
            Some(SettingsError::BadG2Monomial)
        );
        assert_eq!(
            detail(Engine::load(&g1_monomial, &g1_monomial, &g2_monomial, 0)),
            Some(SettingsError::BadLagrange)
        );
    }

    #[test]
    fn test_released_on_drop() {
        let before = released();
        drop(engine(1));
        assert_eq!(released(), before + 1);
    }

    #[test]
    fn test_proofs_bound_to_setup() {
        let first = engine(1);
        let second = engine(2);
        assert_ne!(first.fingerprint(), second.fingerprint());

        let blob = blob(3);
        let commitment = first.blob_to_commitment(&blob).unwrap();
        let proof = first.compute_blob_proof(&blob, &commitment).unwrap();
        assert!(first.verify_blob_proof(&blob, &commitment, &proof).unwrap());
        assert!(!second.verify_blob_proof(&blob, &commitment, &proof).unwrap());
    }

    #[test]
    fn test_rejects_non_canonical_blob() {
        let mut blob = blob(0);
        blob[0] = 0xff;
        assert!(matches!(
            engine(1).blob_to_commitment(&blob),
            Err(Error::Rejected)
        ));
    }

    #[test]
    fn test_recover() {
        let engine = engine(1);
        let full = engine.compute_cells_and_proofs(&blob(5)).unwrap();

        let indices: Vec<u64> = (0..CELLS_PER_EXT_BLOB as u64).filter(|i| i % 2 == 1).collect();
        let cells: Vec<Cell> = indices
            .iter()
            .map(|&i| full.cells()[i as usize].clone())
            .collect();
        assert_eq!(engine.recover_cells_and_proofs(&indices, &cells).unwrap(), full);

        // The first half covers only half of the chunks
        let indices: Vec<u64> = (0..CELLS_FOR_RECOVERY as u64).collect();
        let cells: Vec<Cell> = full.cells()[..CELLS_FOR_RECOVERY].to_vec();
        assert!(engine.recover_cells_and_proofs(&indices, &cells).is_err());
    }
}
