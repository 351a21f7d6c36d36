//! Ordered certificate chains and unordered CRL sets that either own or borrow their items

use x509_cert::name::Name;

use crate::revocation::crl_item::CrlItem;
use crate::util::tp_utilities::compare_names;
use crate::validator::cert_item::CertificateItem;

/// `CertificateChain` holds certificates ordered leaf first. The container does not enforce linkage.
#[derive(Clone, Debug)]
pub enum CertificateChain<'a> {
    /// The chain owns its items
    Owned(Vec<CertificateItem>),
    /// The items are owned elsewhere
    Borrowed(Vec<&'a CertificateItem>),
}

impl Default for CertificateChain<'_> {
    fn default() -> Self {
        CertificateChain::Owned(vec![])
    }
}

impl<'a> CertificateChain<'a> {
    /// Returns the number of certificates in the chain
    pub fn len(&self) -> usize {
        match self {
            CertificateChain::Owned(v) => v.len(),
            CertificateChain::Borrowed(v) => v.len(),
        }
    }

    /// Returns true if the chain contains no certificates
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the certificate at the given position, where 0 is the leaf
    pub fn get(&self, index: usize) -> Option<&CertificateItem> {
        match self {
            CertificateChain::Owned(v) => v.get(index),
            CertificateChain::Borrowed(v) => v.get(index).copied(),
        }
    }

    /// Returns the leaf certificate
    pub fn leaf(&self) -> Option<&CertificateItem> {
        self.get(0)
    }

    /// Returns the last certificate, i.e., the nominal root
    pub fn last(&self) -> Option<&CertificateItem> {
        match self.len() {
            0 => None,
            n => self.get(n - 1),
        }
    }

    /// Iterates over the certificates leaf first
    pub fn iter(&self) -> ChainIter<'_, 'a> {
        ChainIter {
            chain: self,
            index: 0,
        }
    }

    /// Appends a borrowed certificate. An owned chain stores a copy.
    pub fn push(&mut self, cert: &'a CertificateItem) {
        match self {
            CertificateChain::Owned(v) => v.push(cert.clone()),
            CertificateChain::Borrowed(v) => v.push(cert),
        }
    }

    /// Appends a certificate, converting a borrowed chain to an owned chain first.
    pub fn push_owned(&mut self, cert: CertificateItem) {
        if let CertificateChain::Borrowed(_) = self {
            *self = self.to_owned_chain();
        }
        if let CertificateChain::Owned(v) = self {
            v.push(cert);
        }
    }

    /// Returns an owned copy of the chain
    pub fn to_owned_chain(&self) -> CertificateChain<'static> {
        CertificateChain::Owned(self.iter().cloned().collect())
    }

    /// Consumes the chain, returning an owned chain
    pub fn into_owned(self) -> CertificateChain<'static> {
        match self {
            CertificateChain::Owned(v) => CertificateChain::Owned(v),
            CertificateChain::Borrowed(v) => {
                CertificateChain::Owned(v.into_iter().cloned().collect())
            }
        }
    }

    /// Returns true if the chain owns its items
    pub fn is_owned(&self) -> bool {
        matches!(self, CertificateChain::Owned(_))
    }
}

/// `CrlSet` holds an unordered collection of CRLs.
#[derive(Clone, Debug)]
pub enum CrlSet<'a> {
    /// The set owns its items
    Owned(Vec<CrlItem>),
    /// The items are owned elsewhere
    Borrowed(Vec<&'a CrlItem>),
}

impl Default for CrlSet<'_> {
    fn default() -> Self {
        CrlSet::Owned(vec![])
    }
}

impl<'a> CrlSet<'a> {
    /// Returns the number of CRLs in the set
    pub fn len(&self) -> usize {
        match self {
            CrlSet::Owned(v) => v.len(),
            CrlSet::Borrowed(v) => v.len(),
        }
    }

    /// Returns true if the set contains no CRLs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the CRL at the given position
    pub fn get(&self, index: usize) -> Option<&CrlItem> {
        match self {
            CrlSet::Owned(v) => v.get(index),
            CrlSet::Borrowed(v) => v.get(index).copied(),
        }
    }

    /// Iterates over the CRLs
    pub fn iter(&self) -> CrlSetIter<'_, 'a> {
        CrlSetIter { set: self, index: 0 }
    }

    /// Adds a borrowed CRL. An owned set stores a copy.
    pub fn push(&mut self, crl: &'a CrlItem) {
        match self {
            CrlSet::Owned(v) => v.push(crl.clone()),
            CrlSet::Borrowed(v) => v.push(crl),
        }
    }

    /// Adds a CRL, converting a borrowed set to an owned set first.
    pub fn push_owned(&mut self, crl: CrlItem) {
        if let CrlSet::Borrowed(_) = self {
            *self = CrlSet::Owned(self.iter().cloned().collect());
        }
        if let CrlSet::Owned(v) = self {
            v.push(crl);
        }
    }

    /// Returns the CRLs whose issuer matches the given name
    pub fn for_issuer(&self, issuer: &Name) -> Vec<&CrlItem> {
        self.iter()
            .filter(|crl| compare_names(crl.issuer(), issuer))
            .collect()
    }
}

/// Iterator over the certificates in a [`CertificateChain`]
pub struct ChainIter<'c, 'a> {
    chain: &'c CertificateChain<'a>,
    index: usize,
}

impl<'c, 'a> Iterator for ChainIter<'c, 'a> {
    type Item = &'c CertificateItem;

    fn next(&mut self) -> Option<Self::Item> {
        let r = self.chain.get(self.index);
        self.index += 1;
        r
    }
}

/// Iterator over the CRLs in a [`CrlSet`]
pub struct CrlSetIter<'c, 'a> {
    set: &'c CrlSet<'a>,
    index: usize,
}

impl<'c, 'a> Iterator for CrlSetIter<'c, 'a> {
    type Item = &'c CrlItem;

    fn next(&mut self) -> Option<Self::Item> {
        let r = self.set.get(self.index);
        self.index += 1;
        r
    }
}
