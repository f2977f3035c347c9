//! [Engine] backed by [c_kzg].

use crate::{
    Blob, Bytes32, Bytes48, Cell, CellsAndProofs, Code, Engine, Error, SettingsError,
    BYTES_PER_G1, BYTES_PER_G2, MAX_PRECOMPUTE, NUM_G1_POINTS, NUM_G2_POINTS,
};
use blst::{
    blst_final_exp, blst_fp12, blst_fp12_is_equal, blst_miller_loop, blst_p1, blst_p1_affine,
    blst_p1_from_affine, blst_p1_in_g1, blst_p1_uncompress, blst_p2, blst_p2_affine,
    blst_p2_from_affine, blst_p2_in_g2, blst_p2_uncompress, BLST_ERROR,
};
use c_kzg::{CkzgError, KzgSettings};
use tracing::debug;

enum Settings {
    Owned(Box<KzgSettings>),
    Embedded(&'static KzgSettings),
}

/// A trusted setup loaded into c-kzg.
pub struct CKzg {
    settings: Settings,
    precompute: u64,
}

impl CKzg {
    /// Returns the Ethereum mainnet trusted setup embedded in c-kzg.
    ///
    /// The setup is shared for the lifetime of the process; releasing a session that holds it
    /// only drops the reference.
    pub fn ethereum(precompute: u64) -> Result<Self, Error> {
        if precompute > MAX_PRECOMPUTE {
            return Err(Error::Setup(Code::BadArguments, SettingsError::BadPrecompute));
        }
        Ok(Self {
            settings: Settings::Embedded(c_kzg::ethereum_kzg_settings(precompute)),
            precompute,
        })
    }

    /// Returns the precompute value the setup was loaded with.
    pub fn precompute(&self) -> u64 {
        self.precompute
    }

    fn inner(&self) -> &KzgSettings {
        match &self.settings {
            Settings::Owned(settings) => settings,
            Settings::Embedded(settings) => settings,
        }
    }
}

fn ret_code(ret: CkzgError) -> Code {
    match ret {
        CkzgError::C_KZG_OK => Code::Ok,
        CkzgError::C_KZG_BADARGS => Code::BadArguments,
        CkzgError::C_KZG_ERROR => Code::InternalError,
        CkzgError::C_KZG_MALLOC => Code::AllocationFailure,
    }
}

fn code(err: &c_kzg::Error) -> Code {
    match err {
        c_kzg::Error::CError(ret) => ret_code(*ret),
        // Setup loading reports its return code only inside the message.
        c_kzg::Error::InvalidTrustedSetup(msg) => {
            [CkzgError::C_KZG_MALLOC, CkzgError::C_KZG_ERROR]
                .into_iter()
                .find(|ret| msg.ends_with(&format!("{ret:?}")))
                .map_or(Code::BadArguments, ret_code)
        }
        _ => Code::BadArguments,
    }
}

fn convert(err: c_kzg::Error) -> Error {
    debug!(error = ?err, "engine returned error");
    match code(&err) {
        Code::AllocationFailure => Error::Allocation,
        Code::InternalError => Error::Internal,
        _ => Error::Rejected,
    }
}

fn g1(bytes: &[u8]) -> Option<blst_p1_affine> {
    let mut affine = blst_p1_affine::default();
    let mut point = blst_p1::default();
    unsafe {
        if blst_p1_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
            return None;
        }
        blst_p1_from_affine(&mut point, &affine);
        if !blst_p1_in_g1(&point) {
            return None;
        }
    }
    Some(affine)
}

fn g2(bytes: &[u8]) -> Option<blst_p2_affine> {
    let mut affine = blst_p2_affine::default();
    let mut point = blst_p2::default();
    unsafe {
        if blst_p2_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
            return None;
        }
        blst_p2_from_affine(&mut point, &affine);
        if !blst_p2_in_g2(&point) {
            return None;
        }
    }
    Some(affine)
}

fn pairing(p: &blst_p1_affine, q: &blst_p2_affine) -> blst_fp12 {
    let mut res = blst_fp12::default();
    unsafe {
        blst_miller_loop(&mut res, q, p);
        blst_final_exp(&mut res, &res);
    }
    res
}

/// Returns true if the supplied "Lagrange" points are actually in monomial form.
///
/// For monomial points `e([τ]G1, G2) == e(G1, [τ]G2)`, which never holds for the first two
/// Lagrange basis points.
fn monomial_form(g1_lagrange: &[u8], g2_monomial: &[u8]) -> bool {
    let (Some(l0), Some(l1)) = (
        g1(&g1_lagrange[..BYTES_PER_G1]),
        g1(&g1_lagrange[BYTES_PER_G1..2 * BYTES_PER_G1]),
    ) else {
        return false;
    };
    let (Some(s0), Some(s1)) = (
        g2(&g2_monomial[..BYTES_PER_G2]),
        g2(&g2_monomial[BYTES_PER_G2..2 * BYTES_PER_G2]),
    ) else {
        return false;
    };
    let left = pairing(&l1, &s0);
    let right = pairing(&l0, &s1);
    unsafe { blst_fp12_is_equal(&left, &right) }
}

/// Narrows why c-kzg rejected a raw trusted setup.
fn diagnose(
    g1_monomial: &[u8],
    g1_lagrange: &[u8],
    g2_monomial: &[u8],
    precompute: u64,
) -> SettingsError {
    if precompute > MAX_PRECOMPUTE {
        return SettingsError::BadPrecompute;
    }
    if g1_monomial.len() != NUM_G1_POINTS * BYTES_PER_G1 {
        return SettingsError::BadG1MonomialLength;
    }
    if g1_lagrange.len() != NUM_G1_POINTS * BYTES_PER_G1 {
        return SettingsError::BadG1LagrangeLength;
    }
    if g2_monomial.len() != NUM_G2_POINTS * BYTES_PER_G2 {
        return SettingsError::BadG2MonomialLength;
    }
    if !g1_monomial.chunks_exact(BYTES_PER_G1).all(|p| g1(p).is_some()) {
        return SettingsError::BadG1Monomial;
    }
    if !g1_lagrange.chunks_exact(BYTES_PER_G1).all(|p| g1(p).is_some()) {
        return SettingsError::BadG1Lagrange;
    }
    if !g2_monomial.chunks_exact(BYTES_PER_G2).all(|p| g2(p).is_some()) {
        return SettingsError::BadG2Monomial;
    }
    if monomial_form(g1_lagrange, g2_monomial) {
        return SettingsError::BadLagrange;
    }
    SettingsError::Unknown
}

const _: () = assert!(crate::BYTES_PER_BLOB == c_kzg::BYTES_PER_BLOB);

/// Copies a blob into c-kzg's representation on the heap (a blob does not fit comfortably on the
/// stack).
fn blob(value: &Blob) -> Box<c_kzg::Blob> {
    let mut out = Box::<c_kzg::Blob>::default();
    out.copy_from_slice(value);
    out
}

fn blobs(values: &[Blob]) -> Result<Vec<c_kzg::Blob>, Error> {
    let mut out = Vec::new();
    out.try_reserve_exact(values.len())
        .map_err(|_| Error::Allocation)?;
    out.resize(values.len(), c_kzg::Blob::default());
    for (slot, value) in out.iter_mut().zip(values) {
        slot.copy_from_slice(value);
    }
    Ok(out)
}

fn bytes32(value: &Bytes32) -> Result<c_kzg::Bytes32, Error> {
    c_kzg::Bytes32::from_bytes(value).map_err(convert)
}

fn bytes48(value: &Bytes48) -> Result<c_kzg::Bytes48, Error> {
    c_kzg::Bytes48::from_bytes(value).map_err(convert)
}

fn bytes48s(values: &[Bytes48]) -> Result<Vec<c_kzg::Bytes48>, Error> {
    values.iter().map(bytes48).collect()
}

fn cells(values: &[Cell]) -> Result<Vec<c_kzg::Cell>, Error> {
    values
        .iter()
        .map(|cell| c_kzg::Cell::from_bytes(cell).map_err(convert))
        .collect()
}

fn cells_and_proofs<'a>(
    cells: impl Iterator<Item = &'a c_kzg::Cell>,
    proofs: impl Iterator<Item = &'a c_kzg::KzgProof>,
) -> Result<CellsAndProofs, Error> {
    let cells = cells
        .map(|cell| Cell::try_from(&cell.to_bytes()[..]))
        .collect::<Result<Vec<_>, _>>()?;
    let proofs = proofs
        .map(|proof| Bytes48::try_from(proof.as_slice()))
        .collect::<Result<Vec<_>, _>>()?;
    CellsAndProofs::new(cells, proofs)
}

impl Engine for CKzg {
    fn load(
        g1_monomial: &[u8],
        g1_lagrange: &[u8],
        g2_monomial: &[u8],
        precompute: u64,
    ) -> Result<Self, Error> {
        match KzgSettings::load_trusted_setup(g1_monomial, g1_lagrange, g2_monomial, precompute) {
            Ok(settings) => Ok(Self {
                settings: Settings::Owned(Box::new(settings)),
                precompute,
            }),
            Err(err) => {
                debug!(error = ?err, "engine rejected trusted setup");
                let detail = diagnose(g1_monomial, g1_lagrange, g2_monomial, precompute);
                Err(Error::Setup(code(&err), detail))
            }
        }
    }

    fn parse(text: &str, precompute: u64) -> Result<Self, Error> {
        let settings = KzgSettings::parse_kzg_trusted_setup(text, precompute).map_err(convert)?;
        Ok(Self {
            settings: Settings::Owned(Box::new(settings)),
            precompute,
        })
    }

    fn blob_to_commitment(&self, value: &Blob) -> Result<Bytes48, Error> {
        let commitment = self
            .inner()
            .blob_to_kzg_commitment(&*blob(value))
            .map_err(convert)?;
        Bytes48::try_from(commitment.as_slice())
    }

    fn compute_proof(&self, value: &Blob, z: &Bytes32) -> Result<(Bytes48, Bytes32), Error> {
        let (proof, y) = self
            .inner()
            .compute_kzg_proof(&*blob(value), &bytes32(z)?)
            .map_err(convert)?;
        Ok((Bytes48::try_from(proof.as_slice())?, Bytes32::new(*y)))
    }

    fn compute_blob_proof(&self, value: &Blob, commitment: &Bytes48) -> Result<Bytes48, Error> {
        let proof = self
            .inner()
            .compute_blob_kzg_proof(&*blob(value), &bytes48(commitment)?)
            .map_err(convert)?;
        Bytes48::try_from(proof.as_slice())
    }

    fn verify_proof(
        &self,
        commitment: &Bytes48,
        z: &Bytes32,
        y: &Bytes32,
        proof: &Bytes48,
    ) -> Result<bool, Error> {
        self.inner()
            .verify_kzg_proof(
                &bytes48(commitment)?,
                &bytes32(z)?,
                &bytes32(y)?,
                &bytes48(proof)?,
            )
            .map_err(convert)
    }

    fn verify_blob_proof(
        &self,
        value: &Blob,
        commitment: &Bytes48,
        proof: &Bytes48,
    ) -> Result<bool, Error> {
        self.inner()
            .verify_blob_kzg_proof(&*blob(value), &bytes48(commitment)?, &bytes48(proof)?)
            .map_err(convert)
    }

    fn verify_blob_proof_batch(
        &self,
        values: &[Blob],
        commitments: &[Bytes48],
        proofs: &[Bytes48],
    ) -> Result<bool, Error> {
        self.inner()
            .verify_blob_kzg_proof_batch(
                &blobs(values)?,
                &bytes48s(commitments)?,
                &bytes48s(proofs)?,
            )
            .map_err(convert)
    }

    fn compute_cells_and_proofs(&self, value: &Blob) -> Result<CellsAndProofs, Error> {
        let (cells, proofs) = self
            .inner()
            .compute_cells_and_kzg_proofs(&*blob(value))
            .map_err(convert)?;
        cells_and_proofs(cells.iter(), proofs.iter())
    }

    fn recover_cells_and_proofs(
        &self,
        cell_indices: &[u64],
        values: &[Cell],
    ) -> Result<CellsAndProofs, Error> {
        let (cells, proofs) = self
            .inner()
            .recover_cells_and_kzg_proofs(cell_indices, &cells(values)?)
            .map_err(convert)?;
        cells_and_proofs(cells.iter(), proofs.iter())
    }

    fn verify_cell_proof_batch(
        &self,
        commitments: &[Bytes48],
        cell_indices: &[u64],
        values: &[Cell],
        proofs: &[Bytes48],
    ) -> Result<bool, Error> {
        self.inner()
            .verify_cell_kzg_proof_batch(
                &bytes48s(commitments)?,
                cell_indices,
                &cells(values)?,
                &bytes48s(proofs)?,
            )
            .map_err(convert)
    }
}
