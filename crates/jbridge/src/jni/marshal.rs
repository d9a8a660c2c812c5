//! Argument marshaling into `jvalue` arrays
//!
//! The `Call*MethodA` family takes a pointer to a contiguous array of
//! `jvalue` cells. Each cell is zeroed before one member is written, since
//! narrower members leave the rest of the 8 bytes untouched.

use jbridge_sys::{jvalue, JNI_FALSE, JNI_TRUE};
use log::{debug, error};

use super::JArg;
use crate::error::{BridgeError, Result};

/// Required start alignment of a jvalue array
pub const JVALUE_ALIGNMENT: usize = 8;

/// Whether misaligned buffers are refused on this target.
///
/// Apple silicon traps or silently corrupts on unaligned jvalue arrays.
pub const STRICT_ALIGNMENT: bool = cfg!(all(target_arch = "aarch64", target_os = "macos"));

/// An owned, populated jvalue array
pub struct JValueArray {
    cells: Vec<jvalue>,
}

impl JValueArray {
    fn allocate(len: usize) -> Self {
        JValueArray {
            cells: vec![jvalue::zeroed(); len],
        }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cells are present
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Pointer handed to JNI
    pub fn as_ptr(&self) -> *const jvalue {
        self.cells.as_ptr()
    }

    /// Start address of the buffer
    pub fn address(&self) -> usize {
        self.cells.as_ptr() as usize
    }

    /// Populated cells
    pub fn cells(&self) -> &[jvalue] {
        &self.cells
    }
}

/// Marshal `args` into a jvalue array.
///
/// # Returns
///
/// * `Ok(None)` - no arguments; JNI receives a null pointer
/// * `Ok(Some(array))` - one cell per argument, in order
/// * `Err(Alignment)` - the buffer could not be placed on an 8-byte boundary
pub fn marshal_args(args: &[JArg]) -> Result<Option<JValueArray>> {
    if args.is_empty() {
        return Ok(None);
    }

    let mut array = allocate_aligned(args.len())?;
    for (cell, arg) in array.cells.iter_mut().zip(args) {
        write_cell(cell, arg);
    }
    Ok(Some(array))
}

fn write_cell(cell: &mut jvalue, arg: &JArg) {
    *cell = jvalue::zeroed();
    match *arg {
        JArg::Bool(b) => cell.z = if b { JNI_TRUE } else { JNI_FALSE },
        JArg::Byte(v) => cell.b = v,
        JArg::Char(v) => cell.c = v,
        JArg::Short(v) => cell.s = v,
        JArg::Int(v) => cell.i = v,
        JArg::Long(v) => cell.j = v,
        JArg::Float(v) => cell.f = v,
        JArg::Double(v) => cell.d = v,
        JArg::Object(r) => cell.l = r.as_raw(),
    }
}

fn allocate_aligned(len: usize) -> Result<JValueArray> {
    let first = JValueArray::allocate(len);
    if !STRICT_ALIGNMENT || is_aligned(first.address()) {
        return Ok(first);
    }

    debug!(
        "jvalue array at {:#x} is misaligned, reallocating",
        first.address()
    );
    // Allocate before releasing the first buffer so the allocator cannot
    // hand back the same address.
    let retry = JValueArray::allocate(len);
    drop(first);
    check_alignment(retry.address(), true)?;
    Ok(retry)
}

/// True when `address` is a multiple of [`JVALUE_ALIGNMENT`].
#[inline]
pub fn is_aligned(address: usize) -> bool {
    address % JVALUE_ALIGNMENT == 0
}

/// Refuse a misaligned buffer when `strict` is set.
pub fn check_alignment(address: usize, strict: bool) -> Result<()> {
    if strict && !is_aligned(address) {
        error!("jvalue array misaligned on ARM64: {:#x}", address);
        return Err(BridgeError::Alignment { address });
    }
    Ok(())
}

/// Alignment check applied right before a call on this target.
pub fn ensure_aligned(ptr: *const jvalue) -> Result<()> {
    if ptr.is_null() {
        return Ok(());
    }
    check_alignment(ptr as usize, STRICT_ALIGNMENT)
}
