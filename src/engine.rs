//! Engine facade: keys, slot store and evaluator behind one shared core.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use itertools::Itertools;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::channel::Channel;
use crate::cipher::Cipher;
use crate::error::{Error, Result};
use crate::evaluator::Evaluator;
use crate::handle::CtxtHandle;
use crate::params::Params;
use crate::ptxt::Ptxt;
use crate::scheme::{Scheme, SecretKey};

/// Engine-held ciphertexts, addressed by opaque string ids.
struct SlotStore {
    slots: HashMap<String, Cipher>,
    next_id: u64,
}

impl SlotStore {
    fn insert(&mut self, cipher: Cipher) -> String {
        let id = format!("s{}", self.next_id);
        self.next_id += 1;
        self.slots.insert(id.clone(), cipher);
        id
    }

    fn get(&self, id: &str) -> Result<&Cipher> {
        self.slots.get(id).ok_or_else(|| Error::UnknownSlot {
            id: id.to_owned(),
        })
    }
}

struct EngineCore {
    params: Params,
    scheme: Scheme,
    secret: SecretKey,
    eval: Evaluator,
    store: Mutex<SlotStore>,
    rng: Mutex<StdRng>,
}

/// Shared front end over one key set and one slot store.
///
/// An `Engine` value is a cheap handle on an `Arc`-shared core; every clone
/// addresses the same store, and slot operations are serialized through the
/// store lock. Handles compare engines by core identity, not by parameters.
#[derive(Clone)]
pub struct Engine {
    core: Arc<EngineCore>,
}

impl Engine {
    /// Build a keyed engine from a parameter set.
    ///
    /// Validation happens first, so a rejected set costs no key generation.
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let chan = Channel::new(&params, &mut rng);
        let (scheme, secret) = Scheme::keygen(&chan, &mut rng);
        let eval = Evaluator::with_rng(&chan, &secret, &mut rng);
        debug!(
            "engine ready: p={} q={} deg={} dim={}",
            params.p, params.q, params.deg, params.dim
        );
        Ok(Self {
            core: Arc::new(EngineCore {
                params,
                scheme,
                secret,
                eval,
                store: Mutex::new(SlotStore {
                    slots: HashMap::new(),
                    next_id: 0,
                }),
                rng: Mutex::new(rng),
            }),
        })
    }

    fn store(&self) -> MutexGuard<'_, SlotStore> {
        self.core.store.lock().expect("slot store poisoned")
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.core.rng.lock().expect("rng poisoned")
    }

    /// True when `other` shares this engine's core.
    #[must_use]
    pub fn same_engine(&self, other: &Engine) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    /// Parameter set the engine was built from.
    pub fn params(&self) -> &Params {
        &self.core.params
    }

    /// Largest encryptable magnitude, (p-1)/2.
    pub fn plain_bound(&self) -> i64 {
        self.core.scheme.channel().plain_bound()
    }

    /// Number of ciphertexts currently held in the store.
    #[must_use]
    pub fn allocated_slots(&self) -> usize {
        self.store().slots.len()
    }

    /// Encrypt a plaintext vector into fresh slots and hand back its handle.
    ///
    /// Every value is range-checked before the first slot is allocated.
    pub fn encrypt(&self, ptxt: &Ptxt) -> Result<CtxtHandle> {
        let bound = self.plain_bound();
        for &v in ptxt.values() {
            if v.unsigned_abs() > bound.unsigned_abs() {
                return Err(Error::PlainOutOfRange { value: v, bound });
            }
        }

        let ciphers = {
            let mut rng = self.rng();
            ptxt.values()
                .iter()
                .map(|&v| self.core.scheme.encrypt(v, &mut *rng))
                .collect::<Result<Vec<_>>>()?
        };
        let ids: Vec<String> = {
            let mut store = self.store();
            ciphers.into_iter().map(|c| store.insert(c)).collect()
        };
        debug!("encrypt len={} slots=[{}]", ptxt.len(), ids.iter().join(", "));
        Ok(CtxtHandle::from_parts(self.clone(), ptxt.len(), ids))
    }

    /// Encrypt `len` copies of one value: the promotion path for plain
    /// integer operands.
    pub fn encrypt_broadcast(&self, value: i64, len: usize) -> Result<CtxtHandle> {
        self.encrypt(&Ptxt::broadcast(value, len)?)
    }

    /// Decrypt every slot of a handle owned by this engine, in slot order.
    pub fn decrypt(&self, handle: &CtxtHandle) -> Result<Vec<i64>> {
        if !self.same_engine(handle.engine()) {
            return Err(Error::EngineMismatch);
        }
        let ids = handle.slot_ids();
        if ids.len() != handle.len() {
            return Err(Error::LengthMismatch {
                lhs: handle.len(),
                rhs: ids.len(),
            });
        }

        let store = self.store();
        let bound = self.core.scheme.channel().level_bound();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let c = store.get(id)?;
            if c.level > bound {
                return Err(Error::NoiseBudget {
                    level: c.level,
                    bound,
                });
            }
            out.push(self.core.scheme.decrypt(c, &self.core.secret));
        }
        Ok(out)
    }

    /// Current noise levels of a handle's slots, in slot order.
    pub fn slot_levels(&self, handle: &CtxtHandle) -> Result<Vec<u128>> {
        if !self.same_engine(handle.engine()) {
            return Err(Error::EngineMismatch);
        }
        let store = self.store();
        handle
            .slot_ids()
            .iter()
            .map(|id| store.get(id).map(|c| c.level))
            .collect()
    }

    /// Duplicate the given slots into fresh ids, order preserved.
    ///
    /// All sources are resolved before the first insert, so a stale id
    /// leaves the store unchanged.
    pub fn clone_slots(&self, ids: &[String]) -> Result<Vec<String>> {
        let mut store = self.store();
        let ciphers = ids
            .iter()
            .map(|id| store.get(id).cloned())
            .collect::<Result<Vec<_>>>()?;
        let fresh: Vec<String> = ciphers.into_iter().map(|c| store.insert(c)).collect();
        debug!(
            "clone slots [{}] -> [{}]",
            ids.iter().join(", "),
            fresh.iter().join(", ")
        );
        Ok(fresh)
    }

    /// Remove the given slots from the store.
    ///
    /// Ids already gone are ignored, so releasing twice is harmless.
    pub fn release_slots(&self, ids: &[String]) {
        let mut store = self.store();
        let removed = ids
            .iter()
            .filter(|id| store.slots.remove(id.as_str()).is_some())
            .count();
        trace!("release [{}]: {} removed", ids.iter().join(", "), removed);
    }

    /// Slot-wise sum (or difference) of `src` into `dst`.
    pub fn add_slots(&self, dst: &[String], src: &[String], subtract: bool) -> Result<()> {
        let label = if subtract { "sub" } else { "add" };
        self.binary_slot_op(dst, src, label, |ev, a, b| ev.add(a, b, subtract))
    }

    /// Slot-wise product of `src` into `dst`.
    pub fn mult_slots(&self, dst: &[String], src: &[String]) -> Result<()> {
        self.binary_slot_op(dst, src, "mult", Evaluator::mult)
    }

    /// Scalar product: multiply slot-wise, chain-add the products and write
    /// the total into every `dst` slot, so the handle keeps its width.
    pub fn dot_slots(&self, dst: &[String], src: &[String]) -> Result<()> {
        if dst.is_empty() {
            return Err(Error::InvalidLength { given: 0 });
        }
        if dst.len() != src.len() {
            return Err(Error::LengthMismatch {
                lhs: dst.len(),
                rhs: src.len(),
            });
        }

        let mut store = self.store();
        let bound = self.core.scheme.channel().level_bound();

        let mut products = Vec::with_capacity(dst.len());
        for (d, s) in dst.iter().zip_eq(src) {
            products.push(self.core.eval.mult(store.get(d)?, store.get(s)?));
        }
        let total = products
            .iter()
            .skip(1)
            .fold(products[0].clone(), |acc, p| {
                self.core.eval.add(&acc, p, false)
            });
        if total.level > bound {
            return Err(Error::NoiseBudget {
                level: total.level,
                bound,
            });
        }
        trace!("dot total level {}", total.level);

        for d in dst {
            store.slots.insert(d.clone(), total.clone());
        }
        debug!(
            "dot dst=[{}] src=[{}]",
            dst.iter().join(", "),
            src.iter().join(", ")
        );
        Ok(())
    }

    /// Two-phase slot-wise operation: compute every result and check every
    /// level first, then commit. A failure in phase one mutates nothing.
    fn binary_slot_op(
        &self,
        dst: &[String],
        src: &[String],
        label: &str,
        op: impl Fn(&Evaluator, &Cipher, &Cipher) -> Cipher,
    ) -> Result<()> {
        if dst.len() != src.len() {
            return Err(Error::LengthMismatch {
                lhs: dst.len(),
                rhs: src.len(),
            });
        }

        let mut store = self.store();
        let bound = self.core.scheme.channel().level_bound();

        let mut results = Vec::with_capacity(dst.len());
        for (d, s) in dst.iter().zip_eq(src) {
            let r = op(&self.core.eval, store.get(d)?, store.get(s)?);
            if r.level > bound {
                return Err(Error::NoiseBudget {
                    level: r.level,
                    bound,
                });
            }
            results.push(r);
        }
        for (d, r) in dst.iter().zip_eq(results) {
            store.slots.insert(d.clone(), r);
        }
        debug!(
            "{} dst=[{}] src=[{}]",
            label,
            dst.iter().join(", "),
            src.iter().join(", ")
        );
        Ok(())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("p", &self.core.params.p)
            .field("q", &self.core.params.q)
            .field("deg", &self.core.params.deg)
            .field("dim", &self.core.params.dim)
            .finish_non_exhaustive()
    }
}
