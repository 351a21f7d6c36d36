//! Provides implementations of crypto-related [`PkiEnvironment`] interfaces using libraries from the
//! [Rust Crypto](https://github.com/RustCrypto) project for support.

use der::{asn1::ObjectIdentifier, Decode, Encode};
use p256::ecdsa::{Signature as Signature256, VerifyingKey as VerifyingKey256};
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey as RsaVerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::util::error::{Error, Result, TrustStatus};
use crate::{environment::pki_environment::*, log_message, util::tp_oids::*, PeLogLevels};

/// is_rsa returns true is the presented OID is one of the RSA PKCS #1 v1.5 signature algorithms with
/// a SHA-1 or SHA-2 digest and false otherwise.
pub(crate) fn is_rsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_SHA1_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA256_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA384_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA224_WITH_RSA_ENCRYPTION
        || *oid == PKIXALG_SHA512_WITH_RSA_ENCRYPTION
}

/// is_ecdsa returns true is the presented OID is one of [`PKIXALG_ECDSA_WITH_SHA256`] or
/// [`PKIXALG_ECDSA_WITH_SHA384`] and false otherwise.
pub(crate) fn is_ecdsa(oid: &ObjectIdentifier) -> bool {
    *oid == PKIXALG_ECDSA_WITH_SHA256 || *oid == PKIXALG_ECDSA_WITH_SHA384
}

/// calculate_hash_rust_crypto implements the [`CalculateHash`](crate::CalculateHash) interface for
/// [`PkiEnvironment`] using implementations from the Rust Crypto project.
///
/// It supports [`PKIXALG_SHA1`], [`PKIXALG_SHA224`], [`PKIXALG_SHA256`], [`PKIXALG_SHA384`] and [`PKIXALG_SHA512`].
pub fn calculate_hash_rust_crypto(
    _pe: &PkiEnvironment,
    hash_alg: &AlgorithmIdentifierOwned,
    buffer_to_hash: &[u8],
) -> Result<Vec<u8>> {
    match hash_alg.oid {
        PKIXALG_SHA1 => Ok(Sha1::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA224 => Ok(Sha224::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA256 => Ok(Sha256::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA384 => Ok(Sha384::digest(buffer_to_hash).to_vec()),
        PKIXALG_SHA512 => Ok(Sha512::digest(buffer_to_hash).to_vec()),
        _ => Err(Error::Unrecognized),
    }
}

fn get_named_curve_parameter(alg_id: &AlgorithmIdentifierOwned) -> Option<ObjectIdentifier> {
    match &alg_id.parameters {
        Some(params) => params.decode_as::<ObjectIdentifier>().ok(),
        None => None,
    }
}

fn signature_failure<E>(_e: E) -> Error {
    Error::Trust(TrustStatus::SignatureVerificationFailure)
}

/// verify_signature_message_rust_crypto implements the [`VerifySignatureMessage`](crate::VerifySignatureMessage)
/// interface for [`PkiEnvironment`] using implementations from the [Rust Crypto](https://github.com/RustCrypto) project.
///
/// RSA PKCS #1 v1.5 signatures and P256 signatures are supported at present. An EC public key that
/// does not carry a named curve is reported as `TrustStatus::PublicKeyIncomplete`.
pub fn verify_signature_message_rust_crypto(
    _pe: &PkiEnvironment,
    message_to_verify: &[u8],                 // buffer to verify
    signature: &[u8],                         // signature
    signature_alg: &AlgorithmIdentifierOwned, // signature algorithm
    spki: &SubjectPublicKeyInfoOwned,         // public key
) -> Result<()> {
    if is_rsa(&signature_alg.oid) {
        let enc_spki = spki.to_der()?;
        let rsa = RsaPublicKey::from_public_key_der(&enc_spki).map_err(signature_failure)?;
        let s = RsaSignature::try_from(signature).map_err(signature_failure)?;
        let r = match signature_alg.oid {
            PKIXALG_SHA1_WITH_RSA_ENCRYPTION => {
                RsaVerifyingKey::<Sha1>::new(rsa).verify(message_to_verify, &s)
            }
            PKIXALG_SHA224_WITH_RSA_ENCRYPTION => {
                RsaVerifyingKey::<Sha224>::new(rsa).verify(message_to_verify, &s)
            }
            PKIXALG_SHA256_WITH_RSA_ENCRYPTION => {
                RsaVerifyingKey::<Sha256>::new(rsa).verify(message_to_verify, &s)
            }
            PKIXALG_SHA384_WITH_RSA_ENCRYPTION => {
                RsaVerifyingKey::<Sha384>::new(rsa).verify(message_to_verify, &s)
            }
            _ => RsaVerifyingKey::<Sha512>::new(rsa).verify(message_to_verify, &s),
        };
        return r.map_err(signature_failure);
    } else if is_ecdsa(&signature_alg.oid) {
        if spki.algorithm.oid != PKIXALG_EC_PUBLIC_KEY {
            return Err(Error::Trust(TrustStatus::SignatureVerificationFailure));
        }
        let named_curve = match get_named_curve_parameter(&spki.algorithm) {
            Some(nc) => nc,
            None => return Err(Error::Trust(TrustStatus::PublicKeyIncomplete)),
        };

        if PKIXALG_SECP256R1 == named_curve && PKIXALG_ECDSA_WITH_SHA256 == signature_alg.oid {
            let ecdsa = VerifyingKey256::from_sec1_bytes(spki.subject_public_key.raw_bytes())
                .map_err(signature_failure)?;
            let s = Signature256::from_der(signature).map_err(signature_failure)?;
            return ecdsa
                .verify(message_to_verify, &s)
                .map_err(signature_failure);
        }
        log_message(
            &PeLogLevels::PeError,
            format!(
                "Unrecognized or unsupported named curve and algorithm combination: {} {}",
                named_curve, signature_alg.oid
            )
            .as_str(),
        );
        return Err(Error::Unrecognized);
    }
    log_message(
        &PeLogLevels::PeError,
        format!("Unrecognized signature algorithm: {}", signature_alg.oid).as_str(),
    );
    Err(Error::Unrecognized)
}

/// `is_partial_key` returns true for an EC public key whose domain parameters were omitted, i.e.,
/// a key that must inherit its parameters from the issuer's key.
pub fn is_partial_key(spki: &SubjectPublicKeyInfoOwned) -> bool {
    spki.algorithm.oid == PKIXALG_EC_PUBLIC_KEY && spki.algorithm.parameters.is_none()
}

/// `complete_key` returns `spki` with the parameters of `issuer_spki` filled in when `spki` lacks
/// them and both keys use the same algorithm. None is returned when there is nothing to inherit.
pub fn complete_key(
    spki: &SubjectPublicKeyInfoOwned,
    issuer_spki: &SubjectPublicKeyInfoOwned,
) -> Option<SubjectPublicKeyInfoOwned> {
    if !is_partial_key(spki)
        || issuer_spki.algorithm.oid != spki.algorithm.oid
        || issuer_spki.algorithm.parameters.is_none()
    {
        return None;
    }
    let mut completed = spki.clone();
    completed.algorithm.parameters = issuer_spki.algorithm.parameters.clone();
    Some(completed)
}

/// `rsa_modulus_bits` returns the size of the modulus of an RSA public key, or None if the key is
/// not an RSA key.
pub fn rsa_modulus_bits(spki: &SubjectPublicKeyInfoOwned) -> Result<Option<usize>> {
    if spki.algorithm.oid != PKIXALG_RSA_ENCRYPTION {
        return Ok(None);
    }
    let key = match rsa::pkcs1::RsaPublicKey::from_der(spki.subject_public_key.raw_bytes()) {
        Ok(key) => key,
        Err(_e) => return Err(Error::Trust(TrustStatus::MalformedCertificate)),
    };
    let modulus = key.modulus.as_bytes();
    match modulus.first() {
        Some(b) => Ok(Some((modulus.len() - 1) * 8 + (8 - b.leading_zeros() as usize))),
        None => Err(Error::Trust(TrustStatus::MalformedCertificate)),
    }
}

#[test]
fn test_calculate_hash() {
    use hex_literal::hex;
    let mut pe = PkiEnvironment::default();
    pe.add_calculate_hash_callback(calculate_hash_rust_crypto);

    let hash_algorithm = AlgorithmIdentifierOwned {
        oid: PKIXALG_SHA256,
        parameters: None,
    };
    let result = pe.calculate_hash(&hash_algorithm, "abc".as_bytes()).unwrap();
    assert_eq!(
        result,
        hex!("BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD")
    );

    let hash_algorithm = AlgorithmIdentifierOwned {
        oid: PKIXALG_SHA1,
        parameters: None,
    };
    let result = pe.calculate_hash(&hash_algorithm, "abc".as_bytes()).unwrap();
    assert_eq!(result, hex!("A9993E364706816ABA3E25717850C26C9CD0D89D"));
}

#[test]
fn test_incomplete_ec_key() {
    use der::asn1::BitString;
    let pe = PkiEnvironment::default();
    let spki = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: PKIXALG_EC_PUBLIC_KEY,
            parameters: None,
        },
        subject_public_key: BitString::from_bytes(&[4, 1, 2]).unwrap(),
    };
    let alg = AlgorithmIdentifierOwned {
        oid: PKIXALG_ECDSA_WITH_SHA256,
        parameters: None,
    };
    assert_eq!(
        Err(Error::Trust(TrustStatus::PublicKeyIncomplete)),
        verify_signature_message_rust_crypto(&pe, b"msg", b"sig", &alg, &spki)
    );
}

#[test]
fn test_complete_key() {
    use der::asn1::{Any, BitString};
    let named_curve = AlgorithmIdentifierOwned {
        oid: PKIXALG_EC_PUBLIC_KEY,
        parameters: Some(Any::encode_from(&PKIXALG_SECP256R1).unwrap()),
    };
    let issuer = SubjectPublicKeyInfoOwned {
        algorithm: named_curve.clone(),
        subject_public_key: BitString::from_bytes(&[4, 9, 9]).unwrap(),
    };
    let partial = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: PKIXALG_EC_PUBLIC_KEY,
            parameters: None,
        },
        subject_public_key: BitString::from_bytes(&[4, 1, 2]).unwrap(),
    };
    assert!(is_partial_key(&partial));
    assert!(!is_partial_key(&issuer));

    let completed = complete_key(&partial, &issuer).unwrap();
    assert_eq!(named_curve, completed.algorithm);
    assert_eq!(partial.subject_public_key, completed.subject_public_key);

    // nothing to inherit from another partial key or a key that is already complete
    assert_eq!(None, complete_key(&partial, &partial));
    assert_eq!(None, complete_key(&issuer, &issuer));
}
