//! Cache of verified CRLs shared between verification calls

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use log::debug;
use x509_cert::name::Name;

use crate::revocation::crl_item::{CrlContextKey, CrlItem, CrlState};
use crate::util::error::*;
use crate::util::tp_utilities::{compare_names, name_to_string};
use crate::validator::policy_settings::TrustStatuses;

/// Default maximum number of CRLs retained by a [`RevocationCache`]
pub const MAX_CACHED_CRLS: usize = 256;

/// The parts of a [`CrlContextKey`] that must match for a cached CRL to be reused. The time of
/// interest is not included; a CRL is reused at any time within its validity window.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct CacheScope {
    anchors: Vec<u8>,
    tolerated: TrustStatuses,
    check_signer_revocation: bool,
}

impl From<&CrlContextKey> for CacheScope {
    fn from(key: &CrlContextKey) -> Self {
        CacheScope {
            anchors: key.anchors.clone(),
            tolerated: key.tolerated.clone(),
            check_signer_revocation: key.check_signer_revocation,
        }
    }
}

#[derive(Clone, Debug)]
struct CachedCrl {
    issuer: Name,
    encoded: Vec<u8>,
    this_update: u64,
    next_update: Option<u64>,
    tolerated: TrustStatuses,
    inserted: u64,
}

impl CachedCrl {
    fn covers(&self, toi: u64) -> bool {
        self.this_update <= toi && !self.is_expired(toi)
    }

    fn is_expired(&self, toi: u64) -> bool {
        matches!(self.next_update, Some(nu) if nu <= toi)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: BTreeMap<(CacheScope, Vec<u8>), CachedCrl>,
    counter: u64,
}

impl CacheState {
    fn purge_expired(&mut self, toi: u64) {
        self.entries.retain(|_, c| !c.is_expired(toi));
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, c)| c.inserted)
            .map(|(k, _)| k.clone());
        if let Some(k) = oldest {
            debug!("Evicting CRL from {} from cache", name_to_string(&self.entries[&k].issuer));
            self.entries.remove(&k);
        }
    }
}

/// `RevocationCache` retains CRLs that verified so that later calls made with the same trust
/// anchors, tolerated statuses and signer revocation setting can use them without repeating signer
/// chain verification.
///
/// A cached CRL is served for any time of interest t where thisUpdate <= t < nextUpdate. Entries
/// whose nextUpdate has passed are evicted as the cache is used and the number of entries is capped,
/// with the oldest entry evicted first.
#[derive(Debug)]
pub struct RevocationCache {
    state: Mutex<CacheState>,
    max_entries: usize,
}

impl Default for RevocationCache {
    fn default() -> Self {
        RevocationCache::with_capacity(MAX_CACHED_CRLS)
    }
}

impl RevocationCache {
    /// instantiates a new, empty RevocationCache that holds up to [`MAX_CACHED_CRLS`] entries
    pub fn new() -> RevocationCache {
        RevocationCache::default()
    }

    /// instantiates a new, empty RevocationCache that holds up to `max_entries` entries
    pub fn with_capacity(max_entries: usize) -> RevocationCache {
        RevocationCache {
            state: Mutex::new(CacheState::default()),
            max_entries: max_entries.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheState>> {
        match self.state.lock() {
            Ok(g) => Ok(g),
            Err(_e) => Err(Error::Trust(TrustStatus::InternalError)),
        }
    }

    /// `add` records a CRL that verified under the given context. A CRL whose nextUpdate is not
    /// after the time of interest is not retained.
    pub fn add(&self, key: &CrlContextKey, crl: &CrlItem) -> Result<()> {
        let toi = key.time_of_interest;
        let mut state = self.lock()?;
        state.purge_expired(toi);

        let cached = CachedCrl {
            issuer: crl.issuer().clone(),
            encoded: crl.encoded_crl.clone(),
            this_update: crl.this_update,
            next_update: crl.next_update,
            tolerated: crl.tolerated_statuses(key),
            inserted: state.counter,
        };
        if cached.is_expired(toi) {
            return Ok(());
        }
        state.counter += 1;
        debug!(
            "Caching CRL from {} verified at {}",
            name_to_string(crl.issuer()),
            toi
        );
        state
            .entries
            .insert((CacheScope::from(key), crl.sha256_digest()), cached);
        while state.entries.len() > self.max_entries {
            state.evict_oldest();
        }
        Ok(())
    }

    /// `get_for_issuer` returns the CRLs from the given issuer that verified under a context with
    /// the same scope as `key` and whose validity window covers the time of interest. The returned
    /// items are marked `Good` for `key`.
    pub fn get_for_issuer(&self, issuer: &Name, key: &CrlContextKey) -> Result<Vec<CrlItem>> {
        let toi = key.time_of_interest;
        let scope = CacheScope::from(key);
        let mut state = self.lock()?;
        state.purge_expired(toi);

        let mut retval = vec![];
        for ((s, _), cached) in state.entries.iter() {
            if *s != scope || !cached.covers(toi) || !compare_names(&cached.issuer, issuer) {
                continue;
            }
            let crl = CrlItem::from_der(&cached.encoded)?;
            crl.set_tolerated_statuses(key, cached.tolerated.clone());
            crl.set_state(key, CrlState::Good);
            retval.push(crl);
        }
        Ok(retval)
    }

    /// Returns the number of cached entries
    pub fn len(&self) -> usize {
        match self.state.lock() {
            Ok(g) => g.entries.len(),
            Err(_e) => 0,
        }
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries
    pub fn clear(&self) {
        if let Ok(mut g) = self.state.lock() {
            g.entries.clear();
        }
    }
}
