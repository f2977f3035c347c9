//! Ownership of the loaded trusted setup.
//!
//! A [Session] holds at most one loaded setup. Every load first releases whatever was loaded
//! before, so a failed load leaves the session empty rather than falling back to the previous
//! setup. Operations invoked while nothing is loaded fail with [Error::NotLoaded].

use crate::{
    Blob, Bytes32, Bytes48, CKzg, Cell, CellsAndProofs, Engine, Error, SettingsError,
    CELLS_FOR_RECOVERY, CELLS_PER_EXT_BLOB,
};
use std::io::Read;
use tracing::{debug, info, warn};

/// Configuration for a [Session].
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of bytes read from a serialized trusted setup.
    pub max_setup_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_setup_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Owns the active trusted setup and exposes every operation against it.
pub struct Session<E: Engine = CKzg> {
    cfg: Config,
    settings: Option<E>,
    last_settings_error: Option<SettingsError>,
}

impl<E: Engine> Default for Session<E> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<E: Engine> Session<E> {
    /// Creates an empty session.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            settings: None,
            last_settings_error: None,
        }
    }

    /// Returns whether a trusted setup is loaded.
    pub fn is_loaded(&self) -> bool {
        self.settings.is_some()
    }

    /// Returns the detail recorded by the most recent load of raw setup points.
    pub fn last_settings_error(&self) -> Option<SettingsError> {
        self.last_settings_error
    }

    /// Loads a trusted setup from raw compressed points.
    ///
    /// Any previously loaded setup is released first, even if this load fails.
    pub fn load(
        &mut self,
        g1_monomial: &[u8],
        g1_lagrange: &[u8],
        g2_monomial: &[u8],
        precompute: u64,
    ) -> Result<(), Error> {
        self.release();
        match E::load(g1_monomial, g1_lagrange, g2_monomial, precompute) {
            Ok(settings) => {
                info!(precompute, "loaded trusted setup");
                self.install(settings);
                Ok(())
            }
            Err(err) => {
                self.last_settings_error = err.detail();
                warn!(precompute, error = %err, "failed to load trusted setup");
                Err(err)
            }
        }
    }

    /// Loads a trusted setup from its textual serialization.
    ///
    /// The source is read to completion (up to [Config::max_setup_bytes]). Any previously loaded
    /// setup is released first, even if this load fails.
    pub fn load_from_reader(&mut self, source: impl Read, precompute: u64) -> Result<(), Error> {
        self.release();
        self.last_settings_error = None;

        let limit = self.cfg.max_setup_bytes;
        let mut text = String::new();
        source
            .take((limit as u64).saturating_add(1))
            .read_to_string(&mut text)
            .inspect_err(|err| warn!(error = %err, "failed to read trusted setup"))?;
        if text.len() > limit {
            warn!(limit, "trusted setup exceeds limit");
            return Err(Error::SetupTooLarge(limit));
        }

        let settings = E::parse(&text, precompute)
            .inspect_err(|err| warn!(precompute, error = %err, "failed to parse trusted setup"))?;
        info!(precompute, bytes = text.len(), "loaded trusted setup");
        self.install(settings);
        Ok(())
    }

    /// Makes a freshly loaded setup the active one.
    fn install(&mut self, settings: E) {
        self.last_settings_error = None;
        self.settings = Some(settings);
    }

    /// Releases the active trusted setup (if any).
    pub fn release(&mut self) {
        if self.settings.take().is_some() {
            debug!("released trusted setup");
        }
    }

    /// Returns the active trusted setup.
    pub(crate) fn current(&self) -> Result<&E, Error> {
        self.settings.as_ref().ok_or(Error::NotLoaded)
    }

    /// Commits to a blob.
    pub fn blob_to_commitment(&self, blob: &Blob) -> Result<Bytes48, Error> {
        self.current()?.blob_to_commitment(blob)
    }

    /// Computes the proof and value `y` of the blob's polynomial at `z`.
    pub fn compute_proof(&self, blob: &Blob, z: &Bytes32) -> Result<(Bytes48, Bytes32), Error> {
        self.current()?.compute_proof(blob, z)
    }

    /// Computes the proof for a blob and its commitment.
    pub fn compute_blob_proof(&self, blob: &Blob, commitment: &Bytes48) -> Result<Bytes48, Error> {
        self.current()?.compute_blob_proof(blob, commitment)
    }

    /// Verifies that the committed polynomial evaluates to `y` at `z`.
    pub fn verify_proof(
        &self,
        commitment: &Bytes48,
        z: &Bytes32,
        y: &Bytes32,
        proof: &Bytes48,
    ) -> Result<bool, Error> {
        self.current()?.verify_proof(commitment, z, y, proof)
    }

    /// Verifies a blob proof.
    pub fn verify_blob_proof(
        &self,
        blob: &Blob,
        commitment: &Bytes48,
        proof: &Bytes48,
    ) -> Result<bool, Error> {
        self.current()?.verify_blob_proof(blob, commitment, proof)
    }

    /// Verifies many blob proofs at once. An empty batch verifies.
    pub fn verify_blob_proof_batch(
        &self,
        blobs: &[Blob],
        commitments: &[Bytes48],
        proofs: &[Bytes48],
    ) -> Result<bool, Error> {
        let settings = self.current()?;
        if blobs.len() != commitments.len() {
            return Err(Error::MismatchedLengths("commitments"));
        }
        if blobs.len() != proofs.len() {
            return Err(Error::MismatchedLengths("proofs"));
        }
        if blobs.is_empty() {
            return Ok(true);
        }
        settings.verify_blob_proof_batch(blobs, commitments, proofs)
    }

    /// Extends a blob into cells and computes the proof of each.
    pub fn compute_cells_and_proofs(&self, blob: &Blob) -> Result<CellsAndProofs, Error> {
        self.current()?.compute_cells_and_proofs(blob)
    }

    /// Reconstructs every cell and proof from at least [CELLS_FOR_RECOVERY] distinct cells.
    ///
    /// `cell_indices[i]` is the index of `cells[i]` in the extended blob.
    pub fn recover_cells_and_proofs(
        &self,
        cell_indices: &[u64],
        cells: &[Cell],
    ) -> Result<CellsAndProofs, Error> {
        let settings = self.current()?;
        if cell_indices.len() != cells.len() {
            return Err(Error::MismatchedLengths("cell indices"));
        }
        if cells.len() < CELLS_FOR_RECOVERY {
            return Err(Error::InsufficientCells(cells.len(), CELLS_FOR_RECOVERY));
        }
        if cells.len() > CELLS_PER_EXT_BLOB {
            return Err(Error::TooManyCells(cells.len(), CELLS_PER_EXT_BLOB));
        }
        check_indices(cell_indices)?;
        settings.recover_cells_and_proofs(cell_indices, cells)
    }

    /// Verifies a batch of cells.
    ///
    /// The slices are correlated by position in the batch, not by the cell index each entry
    /// carries. An empty batch verifies.
    pub fn verify_cell_proof_batch(
        &self,
        commitments: &[Bytes48],
        cell_indices: &[u64],
        cells: &[Cell],
        proofs: &[Bytes48],
    ) -> Result<bool, Error> {
        let settings = self.current()?;
        if commitments.len() != cells.len() {
            return Err(Error::MismatchedLengths("commitments"));
        }
        if cell_indices.len() != cells.len() {
            return Err(Error::MismatchedLengths("cell indices"));
        }
        if proofs.len() != cells.len() {
            return Err(Error::MismatchedLengths("proofs"));
        }
        check_indices(cell_indices)?;
        settings.verify_cell_proof_batch(commitments, cell_indices, cells, proofs)
    }

    /// Verifies a single cell at `cell_index` against its commitment.
    pub fn verify_cell_proof(
        &self,
        commitment: &Bytes48,
        cell_index: u64,
        cell: &Cell,
        proof: &Bytes48,
    ) -> Result<bool, Error> {
        self.verify_cell_proof_batch(
            std::slice::from_ref(commitment),
            &[cell_index],
            std::slice::from_ref(cell),
            std::slice::from_ref(proof),
        )
    }
}

impl Session<CKzg> {
    /// Installs the Ethereum mainnet trusted setup, releasing the previous one.
    pub fn load_ethereum(&mut self, precompute: u64) -> Result<(), Error> {
        self.release();
        match CKzg::ethereum(precompute) {
            Ok(settings) => {
                info!(precompute, "loaded ethereum trusted setup");
                self.install(settings);
                Ok(())
            }
            Err(err) => {
                self.last_settings_error = err.detail();
                warn!(precompute, error = %err, "failed to load ethereum trusted setup");
                Err(err)
            }
        }
    }
}

fn check_indices(cell_indices: &[u64]) -> Result<(), Error> {
    match cell_indices
        .iter()
        .find(|&&index| index >= CELLS_PER_EXT_BLOB as u64)
    {
        Some(&index) => Err(Error::CellIndexOutOfRange(index)),
        None => Ok(()),
    }
}
