//! Ciphertext handles: arithmetic proxies over engine-held slots.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

use crate::engine::Engine;
use crate::error::{Error, Result};

/// Right-hand side of a handle operation: a borrowed handle or a plain
/// integer awaiting broadcast promotion.
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    /// Borrowed ciphertext handle.
    Ctxt(&'a CtxtHandle),
    /// Plain integer, promoted to a transient ciphertext before use.
    Scalar(i64),
}

impl<'a> From<&'a CtxtHandle> for Operand<'a> {
    fn from(h: &'a CtxtHandle) -> Self {
        Operand::Ctxt(h)
    }
}

impl From<i64> for Operand<'_> {
    fn from(v: i64) -> Self {
        Operand::Scalar(v)
    }
}

impl From<i32> for Operand<'_> {
    fn from(v: i32) -> Self {
        Operand::Scalar(i64::from(v))
    }
}

#[derive(Clone, Copy)]
enum SlotOp {
    Add,
    Sub,
    Mul,
    Dot,
}

/// Vector ciphertext handle.
///
/// A handle owns an ordered list of slot ids inside one engine; arithmetic
/// delegates to that engine, and dropping the handle releases its slots.
/// Width is fixed at construction and every operation checks its operands
/// before the engine allocates or mutates anything, so a failed operation
/// leaves both sides untouched.
pub struct CtxtHandle {
    len: usize,
    ids: Vec<String>,
    engine: Engine,
}

impl CtxtHandle {
    /// Declare a blank handle of the given width.
    ///
    /// A blank handle holds no slots and refuses arithmetic with
    /// `LengthMismatch`; populated handles come from the engine's encrypt
    /// methods and from `try_clone`.
    pub fn new(engine: &Engine, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::InvalidLength { given: 0 });
        }
        Ok(Self {
            len,
            ids: Vec::new(),
            engine: engine.clone(),
        })
    }

    pub(crate) fn from_parts(engine: Engine, len: usize, ids: Vec<String>) -> Self {
        Self { len, ids, engine }
    }

    /// Declared width of the vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True while the handle has no slots behind it.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ordered engine slot ids, one per vector position once populated.
    pub fn slot_ids(&self) -> &[String] {
        &self.ids
    }

    /// Engine this handle lives in.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Deep copy: duplicates every slot into a fresh handle.
    pub fn try_clone(&self) -> Result<Self> {
        let ids = self.engine.clone_slots(&self.ids)?;
        Ok(Self {
            len: self.len,
            ids,
            engine: self.engine.clone(),
        })
    }

    /// `self + rhs` into a fresh handle.
    pub fn try_add<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        self.apply_copy(rhs.into(), SlotOp::Add)
    }

    /// `self - rhs` into a fresh handle.
    pub fn try_sub<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        self.apply_copy(rhs.into(), SlotOp::Sub)
    }

    /// Slot-wise `self * rhs` into a fresh handle.
    pub fn try_mul<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        self.apply_copy(rhs.into(), SlotOp::Mul)
    }

    /// Scalar product into a fresh handle. Every slot of the result carries
    /// the total, so the width is preserved.
    pub fn try_dot<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        self.apply_copy(rhs.into(), SlotOp::Dot)
    }

    /// `self += rhs` in place. The slot ids keep their identity.
    pub fn try_add_assign<'a>(&mut self, rhs: impl Into<Operand<'a>>) -> Result<()> {
        self.apply_assign(rhs.into(), SlotOp::Add)
    }

    /// `self -= rhs` in place.
    pub fn try_sub_assign<'a>(&mut self, rhs: impl Into<Operand<'a>>) -> Result<()> {
        self.apply_assign(rhs.into(), SlotOp::Sub)
    }

    /// `self *= rhs` in place, slot-wise.
    pub fn try_mul_assign<'a>(&mut self, rhs: impl Into<Operand<'a>>) -> Result<()> {
        self.apply_assign(rhs.into(), SlotOp::Mul)
    }

    /// Scalar product in place: afterwards every slot carries the total.
    pub fn try_dot_assign<'a>(&mut self, rhs: impl Into<Operand<'a>>) -> Result<()> {
        self.apply_assign(rhs.into(), SlotOp::Dot)
    }

    fn check_storage(&self) -> Result<()> {
        if self.ids.len() != self.len {
            return Err(Error::LengthMismatch {
                lhs: self.len,
                rhs: self.ids.len(),
            });
        }
        Ok(())
    }

    /// All fail-fast checks for one operation, in a fixed order: engine
    /// identity, declared widths, slot backing, scalar range. Nothing is
    /// allocated before these pass.
    fn check_operand(&self, rhs: &Operand<'_>) -> Result<()> {
        match rhs {
            Operand::Ctxt(other) => {
                if !self.engine.same_engine(other.engine()) {
                    return Err(Error::EngineMismatch);
                }
                if self.len != other.len {
                    return Err(Error::LengthMismatch {
                        lhs: self.len,
                        rhs: other.len,
                    });
                }
                self.check_storage()?;
                other.check_storage()
            }
            Operand::Scalar(k) => {
                let bound = self.engine.plain_bound();
                if k.unsigned_abs() > bound.unsigned_abs() {
                    return Err(Error::PlainOutOfRange { value: *k, bound });
                }
                self.check_storage()
            }
        }
    }

    fn delegate(&self, op: SlotOp, src: &[String]) -> Result<()> {
        match op {
            SlotOp::Add => self.engine.add_slots(&self.ids, src, false),
            SlotOp::Sub => self.engine.add_slots(&self.ids, src, true),
            SlotOp::Mul => self.engine.mult_slots(&self.ids, src),
            SlotOp::Dot => self.engine.dot_slots(&self.ids, src),
        }
    }

    fn apply_assign(&mut self, rhs: Operand<'_>, op: SlotOp) -> Result<()> {
        self.check_operand(&rhs)?;
        match rhs {
            Operand::Ctxt(other) => self.delegate(op, other.slot_ids()),
            Operand::Scalar(k) => {
                let transient = self.engine.encrypt_broadcast(k, self.len)?;
                let out = self.delegate(op, transient.slot_ids());
                // transient dropped here, releasing the promoted slots on
                // success and on error alike
                out
            }
        }
    }

    fn apply_copy(&self, rhs: Operand<'_>, op: SlotOp) -> Result<Self> {
        self.check_operand(&rhs)?;
        let mut out = self.try_clone()?;
        out.apply_assign(rhs, op)?;
        Ok(out)
    }
}

impl Drop for CtxtHandle {
    fn drop(&mut self) {
        self.engine.release_slots(&self.ids);
    }
}

impl fmt::Debug for CtxtHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtxtHandle")
            .field("len", &self.len)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

/// Deep copy through the engine. A bitwise copy would share slot ids and
/// double-release them on drop, so `Clone` goes through `try_clone` and
/// panics when the engine refuses.
impl Clone for CtxtHandle {
    fn clone(&self) -> Self {
        self.try_clone().expect("engine refused to clone slots")
    }
}

// ---- 演算子糖衣: &T ⊕ &T が本体、所有型は委譲 ----

impl Add<&CtxtHandle> for &CtxtHandle {
    type Output = CtxtHandle;
    fn add(self, rhs: &CtxtHandle) -> CtxtHandle {
        self.try_add(rhs).expect("handle addition failed")
    }
}

impl Add<&CtxtHandle> for CtxtHandle {
    type Output = CtxtHandle;
    fn add(self, rhs: &CtxtHandle) -> CtxtHandle {
        &self + rhs
    }
}

impl Add<CtxtHandle> for &CtxtHandle {
    type Output = CtxtHandle;
    fn add(self, rhs: CtxtHandle) -> CtxtHandle {
        self + &rhs
    }
}

impl Add for CtxtHandle {
    type Output = CtxtHandle;
    fn add(self, rhs: CtxtHandle) -> CtxtHandle {
        &self + &rhs
    }
}

impl Add<i64> for &CtxtHandle {
    type Output = CtxtHandle;
    fn add(self, rhs: i64) -> CtxtHandle {
        self.try_add(rhs).expect("handle addition failed")
    }
}

impl Add<i64> for CtxtHandle {
    type Output = CtxtHandle;
    fn add(self, rhs: i64) -> CtxtHandle {
        &self + rhs
    }
}

impl Sub<&CtxtHandle> for &CtxtHandle {
    type Output = CtxtHandle;
    fn sub(self, rhs: &CtxtHandle) -> CtxtHandle {
        self.try_sub(rhs).expect("handle subtraction failed")
    }
}

impl Sub<&CtxtHandle> for CtxtHandle {
    type Output = CtxtHandle;
    fn sub(self, rhs: &CtxtHandle) -> CtxtHandle {
        &self - rhs
    }
}

impl Sub<CtxtHandle> for &CtxtHandle {
    type Output = CtxtHandle;
    fn sub(self, rhs: CtxtHandle) -> CtxtHandle {
        self - &rhs
    }
}

impl Sub for CtxtHandle {
    type Output = CtxtHandle;
    fn sub(self, rhs: CtxtHandle) -> CtxtHandle {
        &self - &rhs
    }
}

impl Sub<i64> for &CtxtHandle {
    type Output = CtxtHandle;
    fn sub(self, rhs: i64) -> CtxtHandle {
        self.try_sub(rhs).expect("handle subtraction failed")
    }
}

impl Sub<i64> for CtxtHandle {
    type Output = CtxtHandle;
    fn sub(self, rhs: i64) -> CtxtHandle {
        &self - rhs
    }
}

impl Mul<&CtxtHandle> for &CtxtHandle {
    type Output = CtxtHandle;
    fn mul(self, rhs: &CtxtHandle) -> CtxtHandle {
        self.try_mul(rhs).expect("handle multiplication failed")
    }
}

impl Mul<&CtxtHandle> for CtxtHandle {
    type Output = CtxtHandle;
    fn mul(self, rhs: &CtxtHandle) -> CtxtHandle {
        &self * rhs
    }
}

impl Mul<CtxtHandle> for &CtxtHandle {
    type Output = CtxtHandle;
    fn mul(self, rhs: CtxtHandle) -> CtxtHandle {
        self * &rhs
    }
}

impl Mul for CtxtHandle {
    type Output = CtxtHandle;
    fn mul(self, rhs: CtxtHandle) -> CtxtHandle {
        &self * &rhs
    }
}

impl Mul<i64> for &CtxtHandle {
    type Output = CtxtHandle;
    fn mul(self, rhs: i64) -> CtxtHandle {
        self.try_mul(rhs).expect("handle multiplication failed")
    }
}

impl Mul<i64> for CtxtHandle {
    type Output = CtxtHandle;
    fn mul(self, rhs: i64) -> CtxtHandle {
        &self * rhs
    }
}

impl AddAssign<&CtxtHandle> for CtxtHandle {
    fn add_assign(&mut self, rhs: &CtxtHandle) {
        self.try_add_assign(rhs).expect("handle addition failed");
    }
}

impl AddAssign<i64> for CtxtHandle {
    fn add_assign(&mut self, rhs: i64) {
        self.try_add_assign(rhs).expect("handle addition failed");
    }
}

impl SubAssign<&CtxtHandle> for CtxtHandle {
    fn sub_assign(&mut self, rhs: &CtxtHandle) {
        self.try_sub_assign(rhs).expect("handle subtraction failed");
    }
}

impl SubAssign<i64> for CtxtHandle {
    fn sub_assign(&mut self, rhs: i64) {
        self.try_sub_assign(rhs).expect("handle subtraction failed");
    }
}

impl MulAssign<&CtxtHandle> for CtxtHandle {
    fn mul_assign(&mut self, rhs: &CtxtHandle) {
        self.try_mul_assign(rhs).expect("handle multiplication failed");
    }
}

impl MulAssign<i64> for CtxtHandle {
    fn mul_assign(&mut self, rhs: i64) {
        self.try_mul_assign(rhs).expect("handle multiplication failed");
    }
}
