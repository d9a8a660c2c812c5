//! Scoped local-reference frames

use super::{NativeInterface, ObjectRef};
use crate::error::Result;

/// Smallest frame pushed around a call
pub const MIN_CALL_FRAME: i32 = 10;

/// Frame capacity for a call with `argc` arguments: `max(10, 2 * argc)`.
///
/// Each argument may create up to two transient references while it is
/// converted (a string plus a boxed value).
pub fn call_frame_capacity(argc: usize) -> i32 {
    let wanted = argc.saturating_mul(2).min(i32::MAX as usize) as i32;
    wanted.max(MIN_CALL_FRAME)
}

/// A pushed `PushLocalFrame` scope that is popped exactly once.
///
/// [`pop`](LocalFrame::pop) carries one reference out of the frame. A frame
/// dropped without an explicit pop (early return, `?`, panic) pops with a
/// null result, so pushes and pops stay balanced on every path.
pub struct LocalFrame<'a> {
    env: &'a dyn NativeInterface,
    popped: bool,
}

impl<'a> LocalFrame<'a> {
    /// Push a frame with room for `capacity` local references.
    pub fn push(env: &'a dyn NativeInterface, capacity: i32) -> Result<Self> {
        env.push_local_frame(capacity)?;
        Ok(LocalFrame { env, popped: false })
    }

    /// Pop the frame, keeping `result` alive in the enclosing frame.
    pub fn pop(mut self, result: ObjectRef) -> ObjectRef {
        self.popped = true;
        self.env.pop_local_frame(result)
    }
}

impl Drop for LocalFrame<'_> {
    fn drop(&mut self) {
        if !self.popped {
            self.env.pop_local_frame(ObjectRef::NULL);
        }
    }
}
