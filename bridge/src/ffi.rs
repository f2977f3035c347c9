//! C ABI over a single process-wide [Session].
//!
//! Every function locks the session for its whole duration, so calls from different threads are
//! serialized rather than interleaved.
//!
//! # Strings
//!
//! Inputs are NUL-terminated hex strings (an optional `0x` prefix is accepted). Outputs come in
//! two kinds:
//!
//! * Functions returning `*mut c_char` allocate a new string (a payload or an error message) that
//!   the caller must release with [bridge_free_string].
//! * Functions returning `*const c_char` return one of the static strings of [crate::signal]. These
//!   must not be freed.
//!
//! Loads return a composite code (see [crate::signal::pack]).

use crate::{boundary, hex, signal, CKzg, Error, Session};
use std::{
    ffi::{c_char, CStr, CString},
    fs::File,
    io::BufReader,
    ptr, slice,
    sync::{Mutex, MutexGuard, OnceLock, PoisonError},
};

static SESSION: OnceLock<Mutex<Session<CKzg>>> = OnceLock::new();

fn session() -> MutexGuard<'static, Session<CKzg>> {
    SESSION
        .get_or_init(|| Mutex::new(Session::default()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

unsafe fn text<'a>(value: *const c_char) -> Result<&'a str, Error> {
    if value.is_null() {
        return Err(Error::NullPointer);
    }
    CStr::from_ptr(value).to_str().map_err(|err| {
        hex::Error::InvalidCharacter(char::REPLACEMENT_CHARACTER, err.valid_up_to()).into()
    })
}

unsafe fn array<'a, T>(values: *const T, count: usize) -> Result<&'a [T], Error> {
    if count == 0 {
        return Ok(&[]);
    }
    if values.is_null() {
        return Err(Error::NullPointer);
    }
    Ok(slice::from_raw_parts(values, count))
}

unsafe fn texts<'a>(values: *const *const c_char, count: usize) -> Result<Vec<&'a str>, Error> {
    let mut out = Vec::new();
    out.try_reserve_exact(count).map_err(|_| Error::Allocation)?;
    for &value in array(values, count)? {
        out.push(text(value)?);
    }
    Ok(out)
}

fn allocated(mut value: String) -> *mut c_char {
    // No-op for encoders, which already reserve the terminator.
    if value.try_reserve_exact(1).is_err() {
        return ptr::null_mut();
    }
    CString::new(value).map_or(ptr::null_mut(), CString::into_raw)
}

fn constant(value: &'static str) -> *const c_char {
    let value: &'static CStr = match value {
        signal::TRUE => c"true",
        signal::FALSE => c"false",
        signal::INVALID_ARGUMENT => c"invalid argument",
        signal::ALLOCATION_FAILURE => c"unable to allocate memory",
        _ => c"internal error",
    };
    value.as_ptr()
}

fn owned(f: impl FnOnce() -> Result<String, Error>) -> *mut c_char {
    allocated(signal::owned(f()))
}

fn verdict(f: impl FnOnce() -> Result<&'static str, Error>) -> *const c_char {
    constant(f().unwrap_or_else(|err| signal::verdict(Err(err))))
}

/// Releases a string returned by any function of this module that returns `*mut c_char`.
///
/// # Safety
///
/// `value` must be null or a pointer previously returned by this module that has not been freed.
#[no_mangle]
pub unsafe extern "C" fn bridge_free_string(value: *mut c_char) {
    if !value.is_null() {
        drop(CString::from_raw(value));
    }
}

/// Loads a trusted setup from raw compressed points, returning a composite code.
///
/// # Safety
///
/// Each pointer must be valid for reads of its paired length.
#[no_mangle]
pub unsafe extern "C" fn bridge_load_trusted_setup(
    g1_monomial: *const u8,
    g1_monomial_len: usize,
    g1_lagrange: *const u8,
    g1_lagrange_len: usize,
    g2_monomial: *const u8,
    g2_monomial_len: usize,
    precompute: u64,
) -> u32 {
    let inputs = (|| {
        Ok::<_, Error>((
            array(g1_monomial, g1_monomial_len)?,
            array(g1_lagrange, g1_lagrange_len)?,
            array(g2_monomial, g2_monomial_len)?,
        ))
    })();
    let mut session = session();
    match inputs {
        Ok((g1_monomial, g1_lagrange, g2_monomial)) => boundary::load_trusted_setup(
            &mut session,
            g1_monomial,
            g1_lagrange,
            g2_monomial,
            precompute,
        ),
        Err(err) => {
            session.release();
            signal::composite::<()>(&Err(err))
        }
    }
}

/// Loads a trusted setup from a file in the textual format, returning the primary code.
///
/// # Safety
///
/// `path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_load_trusted_setup_file(
    path: *const c_char,
    precompute: u64,
) -> u32 {
    let mut session = session();
    let file = text(path).and_then(|path| Ok(File::open(path)?));
    match file {
        Ok(file) => {
            boundary::load_trusted_setup_from_reader(&mut session, BufReader::new(file), precompute)
                as u32
        }
        Err(err) => {
            session.release();
            signal::composite::<()>(&Err(err)) & 0xFFFF
        }
    }
}

/// Installs the Ethereum mainnet trusted setup, returning a composite code.
#[no_mangle]
pub extern "C" fn bridge_load_ethereum(precompute: u64) -> u32 {
    boundary::load_ethereum(&mut session(), precompute)
}

/// Releases the active trusted setup.
#[no_mangle]
pub extern "C" fn bridge_free_trusted_setup() {
    session().release();
}

/// Commits to a blob.
///
/// # Safety
///
/// `blob` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_blob_to_kzg_commitment(blob: *const c_char) -> *mut c_char {
    owned(|| Ok(boundary::blob_to_kzg_commitment(&session(), text(blob)?)))
}

/// Computes the proof and claimed value of a blob at `z` (`hex(proof) ‖ hex(y)`).
///
/// # Safety
///
/// Every pointer must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_compute_kzg_proof(
    blob: *const c_char,
    z: *const c_char,
) -> *mut c_char {
    owned(|| Ok(boundary::compute_kzg_proof(&session(), text(blob)?, text(z)?)))
}

/// Computes the proof for a blob and its commitment.
///
/// # Safety
///
/// Every pointer must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_compute_blob_kzg_proof(
    blob: *const c_char,
    commitment: *const c_char,
) -> *mut c_char {
    owned(|| {
        Ok(boundary::compute_blob_kzg_proof(
            &session(),
            text(blob)?,
            text(commitment)?,
        ))
    })
}

/// Verifies that the committed polynomial evaluates to `y` at `z`.
///
/// # Safety
///
/// Every pointer must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_verify_kzg_proof(
    commitment: *const c_char,
    z: *const c_char,
    y: *const c_char,
    proof: *const c_char,
) -> *const c_char {
    verdict(|| {
        Ok(boundary::verify_kzg_proof(
            &session(),
            text(commitment)?,
            text(z)?,
            text(y)?,
            text(proof)?,
        ))
    })
}

/// Verifies a blob proof.
///
/// # Safety
///
/// Every pointer must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_verify_blob_kzg_proof(
    blob: *const c_char,
    commitment: *const c_char,
    proof: *const c_char,
) -> *const c_char {
    verdict(|| {
        Ok(boundary::verify_blob_kzg_proof(
            &session(),
            text(blob)?,
            text(commitment)?,
            text(proof)?,
        ))
    })
}

/// Verifies `count` blob proofs at once.
///
/// # Safety
///
/// Each array must hold `count` valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn bridge_verify_blob_kzg_proof_batch(
    blobs: *const *const c_char,
    commitments: *const *const c_char,
    proofs: *const *const c_char,
    count: usize,
) -> *const c_char {
    verdict(|| {
        Ok(boundary::verify_blob_kzg_proof_batch(
            &session(),
            &texts(blobs, count)?,
            &texts(commitments, count)?,
            &texts(proofs, count)?,
        ))
    })
}

/// Extends a blob into cells and computes the proof of each.
///
/// # Safety
///
/// `blob` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_compute_cells_and_kzg_proofs(blob: *const c_char) -> *mut c_char {
    owned(|| Ok(boundary::compute_cells_and_kzg_proofs(&session(), text(blob)?)))
}

/// Reconstructs every cell and proof from `count` cells.
///
/// # Safety
///
/// `cell_indices` must hold `count` values and `cells` must hold `count` valid NUL-terminated
/// strings.
#[no_mangle]
pub unsafe extern "C" fn bridge_recover_cells_and_kzg_proofs(
    cell_indices: *const u64,
    cells: *const *const c_char,
    count: usize,
) -> *mut c_char {
    owned(|| {
        Ok(boundary::recover_cells_and_kzg_proofs(
            &session(),
            array(cell_indices, count)?,
            &texts(cells, count)?,
        ))
    })
}

/// Verifies a batch of `count` cells.
///
/// # Safety
///
/// `cell_indices` must hold `count` values and every other array must hold `count` valid
/// NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn bridge_verify_cell_kzg_proof_batch(
    commitments: *const *const c_char,
    cell_indices: *const u64,
    cells: *const *const c_char,
    proofs: *const *const c_char,
    count: usize,
) -> *const c_char {
    verdict(|| {
        Ok(boundary::verify_cell_kzg_proof_batch(
            &session(),
            &texts(commitments, count)?,
            array(cell_indices, count)?,
            &texts(cells, count)?,
            &texts(proofs, count)?,
        ))
    })
}

/// Verifies one cell at `cell_index` against its commitment.
///
/// # Safety
///
/// Every pointer must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_verify_cell_kzg_proof(
    commitment: *const c_char,
    cell_index: u64,
    cell: *const c_char,
    proof: *const c_char,
) -> *const c_char {
    verdict(|| {
        Ok(boundary::verify_cell_kzg_proof(
            &session(),
            text(commitment)?,
            cell_index,
            text(cell)?,
            text(proof)?,
        ))
    })
}
