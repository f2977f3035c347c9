//! Carry KZG commitments, proofs, and cells across a string-only boundary.
//!
//! Hosts that can only exchange integers and text (for example, a WASM guest talking to
//! JavaScript) cannot share rich structures with a polynomial-commitment engine. This crate is the
//! marshalling layer between the two:
//!
//! * [Session] owns the loaded trusted setup. Loading a new setup always releases the previous
//!   one (even when the new load fails).
//! * [hex] converts between bytes and the upper-case hexadecimal strings the host understands.
//! * [signal] collapses the rich [Error] taxonomy into the strings and 32-bit codes the boundary
//!   can carry.
//! * [buffer] defines the fixed layout used to return a full set of cells and proofs.
//! * [boundary] and [ffi] expose every operation in hex-string and C ABI form, respectively.
//!
//! The commitment-scheme mathematics live behind the [Engine] trait. [CKzg] implements it with
//! the c-kzg library; [mocks::Engine] is a deterministic stand-in for tests.
//!
//! # Example
//!
//! ```rust
//! use kzg_bridge::{boundary, signal, Blob, CKzg, Session};
//!
//! // Install the Ethereum mainnet trusted setup
//! let mut session = Session::<CKzg>::default();
//! session.load_ethereum(0).unwrap();
//!
//! // Commit to a blob and prove it
//! let mut blob = Blob::zeroed();
//! blob[0] = 0x01;
//! blob[1] = 0x02;
//! let blob = blob.to_hex();
//! let commitment = boundary::blob_to_kzg_commitment(&session, &blob);
//! let proof = boundary::compute_blob_kzg_proof(&session, &blob, &commitment);
//!
//! // Verify the proof
//! let verified = boundary::verify_blob_kzg_proof(&session, &blob, &commitment, &proof);
//! assert_eq!(verified, signal::TRUE);
//! ```
//!
//! # Thread Safety
//!
//! A [Session] is an ordinary value: share it across threads by wrapping the whole session in a
//! lock. The [ffi] surface does exactly that for its single process-wide session.

pub mod boundary;
pub mod buffer;
pub use buffer::CellsAndProofs;
mod ckzg;
pub use ckzg::CKzg;
mod error;
pub use error::{Code, Error, SettingsError};
pub mod ffi;
pub mod hex;
pub mod mocks;
mod session;
pub use session::{Config, Session};
pub mod signal;
mod types;
pub use types::{Blob, Bytes32, Bytes48, Cell, FixedBytes};

/// Number of bytes in a serialized field element.
pub const BYTES_PER_FIELD_ELEMENT: usize = 32;

/// Number of field elements in a blob.
pub const FIELD_ELEMENTS_PER_BLOB: usize = 4096;

/// Number of bytes in a blob.
pub const BYTES_PER_BLOB: usize = BYTES_PER_FIELD_ELEMENT * FIELD_ELEMENTS_PER_BLOB;

/// Number of bytes in a commitment.
pub const BYTES_PER_COMMITMENT: usize = 48;

/// Number of bytes in a proof.
pub const BYTES_PER_PROOF: usize = 48;

/// Number of field elements in a cell.
pub const FIELD_ELEMENTS_PER_CELL: usize = 64;

/// Number of bytes in a cell.
pub const BYTES_PER_CELL: usize = BYTES_PER_FIELD_ELEMENT * FIELD_ELEMENTS_PER_CELL;

/// Number of cells in an extended blob.
pub const CELLS_PER_EXT_BLOB: usize = 2 * FIELD_ELEMENTS_PER_BLOB / FIELD_ELEMENTS_PER_CELL;

/// Minimum number of distinct cells needed to recover an extended blob.
pub const CELLS_FOR_RECOVERY: usize = CELLS_PER_EXT_BLOB / 2;

/// Number of bytes in a compressed G1 point.
pub const BYTES_PER_G1: usize = 48;

/// Number of bytes in a compressed G2 point.
pub const BYTES_PER_G2: usize = 96;

/// Number of G1 points in each basis of a trusted setup.
pub const NUM_G1_POINTS: usize = FIELD_ELEMENTS_PER_BLOB;

/// Number of G2 points in a trusted setup.
pub const NUM_G2_POINTS: usize = 65;

/// Largest supported precompute value.
pub const MAX_PRECOMPUTE: u64 = 15;

/// The polynomial-commitment engine the bridge delegates to.
///
/// An implementation is itself the loaded trusted setup: it is created by [Engine::load] or
/// [Engine::parse] and released when dropped. Inputs arrive already length-checked; the engine is
/// responsible for everything else (point and field element validity, duplicate indices, and the
/// mathematics).
pub trait Engine: Sized + Send + Sync {
    /// Loads a trusted setup from raw compressed points.
    ///
    /// On failure, the returned [Error::Setup] narrows the cause with a [SettingsError].
    fn load(
        g1_monomial: &[u8],
        g1_lagrange: &[u8],
        g2_monomial: &[u8],
        precompute: u64,
    ) -> Result<Self, Error>;

    /// Loads a trusted setup from its textual serialization.
    fn parse(text: &str, precompute: u64) -> Result<Self, Error>;

    /// Commits to a blob.
    fn blob_to_commitment(&self, blob: &Blob) -> Result<Bytes48, Error>;

    /// Computes a proof that the blob's polynomial evaluates to `y` at `z`, returning the proof
    /// and `y`.
    fn compute_proof(&self, blob: &Blob, z: &Bytes32) -> Result<(Bytes48, Bytes32), Error>;

    /// Computes the proof for a blob and its commitment.
    fn compute_blob_proof(&self, blob: &Blob, commitment: &Bytes48) -> Result<Bytes48, Error>;

    /// Verifies that the committed polynomial evaluates to `y` at `z`.
    fn verify_proof(
        &self,
        commitment: &Bytes48,
        z: &Bytes32,
        y: &Bytes32,
        proof: &Bytes48,
    ) -> Result<bool, Error>;

    /// Verifies a blob proof.
    fn verify_blob_proof(
        &self,
        blob: &Blob,
        commitment: &Bytes48,
        proof: &Bytes48,
    ) -> Result<bool, Error>;

    /// Verifies many blob proofs at once.
    fn verify_blob_proof_batch(
        &self,
        blobs: &[Blob],
        commitments: &[Bytes48],
        proofs: &[Bytes48],
    ) -> Result<bool, Error>;

    /// Extends a blob into [CELLS_PER_EXT_BLOB] cells and computes a proof for each.
    fn compute_cells_and_proofs(&self, blob: &Blob) -> Result<CellsAndProofs, Error>;

    /// Reconstructs every cell (and proof) from a subset of cells.
    fn recover_cells_and_proofs(
        &self,
        cell_indices: &[u64],
        cells: &[Cell],
    ) -> Result<CellsAndProofs, Error>;

    /// Verifies a batch of cells. The slices are correlated by position in the batch.
    fn verify_cell_proof_batch(
        &self,
        commitments: &[Bytes48],
        cell_indices: &[u64],
        cells: &[Cell],
        proofs: &[Bytes48],
    ) -> Result<bool, Error>;
}
