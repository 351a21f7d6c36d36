//! Error types

use core::fmt;

use serde::{Deserialize, Serialize};

/// Result type
pub type Result<T> = core::result::Result<T, Error>;

/// `TrustStatus` enumerates the specific conditions reported by chain, policy and revocation checks.
///
/// Each check site reports one of these values via a [`PolicyContext`](crate::PolicyContext). A caller
/// may declare some of them tolerable, in which case they are accumulated instead of aborting
/// verification.
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrustStatus {
    /// No errors were encountered
    Valid,
    /// A certificate could not be parsed or its validity period could not be read.
    MalformedCertificate,
    /// A CRL could not be parsed or its thisUpdate field could not be read.
    MalformedCrl,
    /// A certificate features a critical extension that is not understood.
    UnknownCriticalExtension,
    /// A CRL or CRL entry features a critical extension that is not understood.
    UnknownCrlExtension,
    /// A certificate's notAfter precedes the time of interest.
    CertificateExpired,
    /// A certificate's notBefore follows the time of interest.
    CertificateNotValidYet,
    /// A CRL's nextUpdate precedes the time of interest.
    CrlExpired,
    /// A CRL's thisUpdate follows the time of interest.
    CrlNotValidYet,
    /// An RSA public key is shorter than 1024 bits.
    WeakKeySize,
    /// A certificate was signed using a denylisted algorithm (i.e., MD2, MD4 or MD5).
    UntrustedSignatureAlgorithm,
    /// A keyUsage extension does not permit the operation required by the position or policy.
    InvalidKeyUsage,
    /// An extendedKeyUsage extension does not include a purpose required by the policy.
    InvalidExtendedKeyUsage,
    /// An extension the policy requires is absent.
    MissingRequiredExtension,
    /// An authorityKeyIdentifier does not match the subjectKeyIdentifier of the issuer.
    IdentifierLinkageMismatch,
    /// A pathLenConstraint is exceeded by the number of CA certificates below it.
    PathLengthExceeded,
    /// An intermediate CA certificate has no basicConstraints extension.
    MissingBasicConstraints,
    /// An intermediate CA certificate asserts cA=false.
    InvalidBasicConstraints,
    /// The requested host name does not match the leaf certificate.
    HostnameMismatch,
    /// The requested email address does not match the leaf certificate.
    EmailAddressMismatch,
    /// The chain does not have the length the policy requires.
    BadChainLength,
    /// The chain ends in a certificate that is not an acceptable anchor.
    InvalidAnchor,
    /// The chain could not be linked to a trust anchor.
    NotTrusted,
    /// A certificate has been revoked.
    CertificateRevoked,
    /// A certificate has an empty subject without a critical subjectAltName, or is not a leaf.
    InvalidSubjectName,
    /// A required certificate policy is absent.
    InvalidPolicyIdentifiers,
    /// A name in a subordinate certificate violates a nameConstraints extension.
    NameConstraintsViolation,
    /// A code signing certificate is a development certificate.
    CodeSignDevelopment,
    /// An issuingDistributionPoint extension limits the CRL to a different class of certificate.
    CrlIdpRestriction,
    /// The CRL signer could not be linked to a trust anchor.
    CrlNotTrusted,
    /// The CRL signer chain ends in a certificate that is not a trust anchor.
    CrlInvalidAnchor,
    /// No usable CRL was found for a certificate.
    CrlNotFound,
    /// A CRL was consulted before it was verified.
    CrlNotVerified,
    /// Verification of a CRL requires verification of the same CRL.
    CrlVerificationCycle,
    /// The subject name of a superior certificate does not match the issuer name of the immediately
    /// subordinate certificate.
    NameChainingFailure,
    /// A public key failed to verify a signature.
    SignatureVerificationFailure,
    /// A public key requires parameters inherited from its issuer.
    PublicKeyIncomplete,
    /// A store or crypto provider failure occurred.
    InternalError,
}

/// Error type
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A trust policy, chain or revocation check failed
    Trust(TrustStatus),
    /// NotFound occurs when an action failed because a necessary artifact was not found.
    NotFound,
    /// Unrecognized occurs when an error conditions does not match anything else here.
    Unrecognized,
    /// An artifact could not be parsed
    ParseError,
    /// A certificate or CRL store failed to answer a query.
    StoreUnavailable,
    /// Asn1Error is used to propagate error information from the der crate.
    Asn1Error(der::Error),
    /// Error encapsulates an error derived from [std::io::ErrorKind]
    StdIoError(std::io::ErrorKind),
}

impl Error {
    /// Returns the [`TrustStatus`] that best describes the error.
    pub fn status(&self) -> TrustStatus {
        match self {
            Error::Trust(s) => *s,
            _ => TrustStatus::InternalError,
        }
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1Error(err)
    }
}

impl From<TrustStatus> for Error {
    fn from(status: TrustStatus) -> Error {
        Error::Trust(status)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::StdIoError(err.kind())
    }
}

impl fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustStatus::Valid => write!(f, "Valid"),
            TrustStatus::MalformedCertificate => write!(f, "MalformedCertificate"),
            TrustStatus::MalformedCrl => write!(f, "MalformedCrl"),
            TrustStatus::UnknownCriticalExtension => write!(f, "UnknownCriticalExtension"),
            TrustStatus::UnknownCrlExtension => write!(f, "UnknownCrlExtension"),
            TrustStatus::CertificateExpired => write!(f, "CertificateExpired"),
            TrustStatus::CertificateNotValidYet => write!(f, "CertificateNotValidYet"),
            TrustStatus::CrlExpired => write!(f, "CrlExpired"),
            TrustStatus::CrlNotValidYet => write!(f, "CrlNotValidYet"),
            TrustStatus::WeakKeySize => write!(f, "WeakKeySize"),
            TrustStatus::UntrustedSignatureAlgorithm => write!(f, "UntrustedSignatureAlgorithm"),
            TrustStatus::InvalidKeyUsage => write!(f, "InvalidKeyUsage"),
            TrustStatus::InvalidExtendedKeyUsage => write!(f, "InvalidExtendedKeyUsage"),
            TrustStatus::MissingRequiredExtension => write!(f, "MissingRequiredExtension"),
            TrustStatus::IdentifierLinkageMismatch => write!(f, "IdentifierLinkageMismatch"),
            TrustStatus::PathLengthExceeded => write!(f, "PathLengthExceeded"),
            TrustStatus::MissingBasicConstraints => write!(f, "MissingBasicConstraints"),
            TrustStatus::InvalidBasicConstraints => write!(f, "InvalidBasicConstraints"),
            TrustStatus::HostnameMismatch => write!(f, "HostnameMismatch"),
            TrustStatus::EmailAddressMismatch => write!(f, "EmailAddressMismatch"),
            TrustStatus::BadChainLength => write!(f, "BadChainLength"),
            TrustStatus::InvalidAnchor => write!(f, "InvalidAnchor"),
            TrustStatus::NotTrusted => write!(f, "NotTrusted"),
            TrustStatus::CertificateRevoked => write!(f, "CertificateRevoked"),
            TrustStatus::InvalidSubjectName => write!(f, "InvalidSubjectName"),
            TrustStatus::InvalidPolicyIdentifiers => write!(f, "InvalidPolicyIdentifiers"),
            TrustStatus::NameConstraintsViolation => write!(f, "NameConstraintsViolation"),
            TrustStatus::CodeSignDevelopment => write!(f, "CodeSignDevelopment"),
            TrustStatus::CrlIdpRestriction => write!(f, "CrlIdpRestriction"),
            TrustStatus::CrlNotTrusted => write!(f, "CrlNotTrusted"),
            TrustStatus::CrlInvalidAnchor => write!(f, "CrlInvalidAnchor"),
            TrustStatus::CrlNotFound => write!(f, "CrlNotFound"),
            TrustStatus::CrlNotVerified => write!(f, "CrlNotVerified"),
            TrustStatus::CrlVerificationCycle => write!(f, "CrlVerificationCycle"),
            TrustStatus::NameChainingFailure => write!(f, "Name chaining failure"),
            TrustStatus::SignatureVerificationFailure => {
                write!(f, "Signature verification failure")
            }
            TrustStatus::PublicKeyIncomplete => write!(f, "PublicKeyIncomplete"),
            TrustStatus::InternalError => write!(f, "InternalError"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Trust(err) => write!(f, "TrustError: {}", err),
            Error::NotFound => write!(f, "NotFound"),
            Error::Unrecognized => write!(f, "Unrecognized"),
            Error::ParseError => write!(f, "ParseError"),
            Error::StoreUnavailable => write!(f, "StoreUnavailable"),
            Error::Asn1Error(err) => write!(f, "Asn1Error: {}", err),
            Error::StdIoError(err) => write!(f, "StdError: {:?}", err),
        }
    }
}

#[test]
fn error_test() {
    let _s = format!("{}", TrustStatus::Valid);
    let _s = format!("{}", TrustStatus::MalformedCertificate);
    let _s = format!("{}", TrustStatus::MalformedCrl);
    let _s = format!("{}", TrustStatus::UnknownCriticalExtension);
    let _s = format!("{}", TrustStatus::UnknownCrlExtension);
    let _s = format!("{}", TrustStatus::CertificateExpired);
    let _s = format!("{}", TrustStatus::CertificateNotValidYet);
    let _s = format!("{}", TrustStatus::CrlExpired);
    let _s = format!("{}", TrustStatus::CrlNotValidYet);
    let _s = format!("{}", TrustStatus::WeakKeySize);
    let _s = format!("{}", TrustStatus::UntrustedSignatureAlgorithm);
    let _s = format!("{}", TrustStatus::InvalidKeyUsage);
    let _s = format!("{}", TrustStatus::InvalidExtendedKeyUsage);
    let _s = format!("{}", TrustStatus::MissingRequiredExtension);
    let _s = format!("{}", TrustStatus::IdentifierLinkageMismatch);
    let _s = format!("{}", TrustStatus::PathLengthExceeded);
    let _s = format!("{}", TrustStatus::MissingBasicConstraints);
    let _s = format!("{}", TrustStatus::InvalidBasicConstraints);
    let _s = format!("{}", TrustStatus::HostnameMismatch);
    let _s = format!("{}", TrustStatus::EmailAddressMismatch);
    let _s = format!("{}", TrustStatus::BadChainLength);
    let _s = format!("{}", TrustStatus::InvalidAnchor);
    let _s = format!("{}", TrustStatus::NotTrusted);
    let _s = format!("{}", TrustStatus::CertificateRevoked);
    let _s = format!("{}", TrustStatus::InvalidSubjectName);
    let _s = format!("{}", TrustStatus::InvalidPolicyIdentifiers);
    let _s = format!("{}", TrustStatus::NameConstraintsViolation);
    let _s = format!("{}", TrustStatus::CodeSignDevelopment);
    let _s = format!("{}", TrustStatus::CrlIdpRestriction);
    let _s = format!("{}", TrustStatus::CrlNotTrusted);
    let _s = format!("{}", TrustStatus::CrlInvalidAnchor);
    let _s = format!("{}", TrustStatus::CrlNotFound);
    let _s = format!("{}", TrustStatus::CrlNotVerified);
    let _s = format!("{}", TrustStatus::CrlVerificationCycle);
    let _s = format!("{}", TrustStatus::NameChainingFailure);
    let _s = format!("{}", TrustStatus::SignatureVerificationFailure);
    let _s = format!("{}", TrustStatus::PublicKeyIncomplete);
    let _s = format!("{}", TrustStatus::InternalError);

    assert_eq!(
        "TrustError: CertificateRevoked",
        format!("{}", Error::Trust(TrustStatus::CertificateRevoked))
    );
    let _s = format!("{}", Error::NotFound);
    let _s = format!("{}", Error::Unrecognized);
    let _s = format!("{}", Error::ParseError);
    let _s = format!("{}", Error::StoreUnavailable);
    let _s = format!("{}", Error::StdIoError(std::io::ErrorKind::NotFound));

    assert_eq!(
        TrustStatus::InternalError,
        Error::StoreUnavailable.status()
    );
    assert_eq!(
        TrustStatus::WeakKeySize,
        Error::from(TrustStatus::WeakKeySize).status()
    );
}
