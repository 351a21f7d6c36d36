//! Provides definitions of algorithm, extended key usage, marker extension and certificate policy
//! OIDs that are not available from the const-oid database.

use der::asn1::ObjectIdentifier;

// -------------------------------------------------------------------------------------------------
// Algorithms
// -------------------------------------------------------------------------------------------------

/// rsaEncryption OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) rsadsi(113549) pkcs(1)
///     pkcs-1(1) 1 }
pub const PKIXALG_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// id-ecPublicKey OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) ansi-X9-62(10045) keyType(2) 1 }
pub const PKIXALG_EC_PUBLIC_KEY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// secp256r1 OBJECT IDENTIFIER ::= {
///     iso(1) member-body(2) us(840) ansi-X9-62(10045) curves(3)
///     prime(1) 7 }
pub const PKIXALG_SECP256R1: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

/// md2WithRSAEncryption (denylisted)
pub const PKIXALG_MD2_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.2");

/// md4WithRSAEncryption (denylisted)
pub const PKIXALG_MD4_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.3");

/// md5WithRSAEncryption (denylisted)
pub const PKIXALG_MD5_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.4");

/// sha1WithRSAEncryption
pub const PKIXALG_SHA1_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");

/// sha224WithRSAEncryption
pub const PKIXALG_SHA224_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.14");

/// sha256WithRSAEncryption
pub const PKIXALG_SHA256_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

/// sha384WithRSAEncryption
pub const PKIXALG_SHA384_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");

/// sha512WithRSAEncryption
pub const PKIXALG_SHA512_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

/// ecdsa-with-SHA256
pub const PKIXALG_ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

/// ecdsa-with-SHA384
pub const PKIXALG_ECDSA_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");

/// id-sha1
pub const PKIXALG_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");

/// id-sha224
pub const PKIXALG_SHA224: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.4");

/// id-sha256
pub const PKIXALG_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

/// id-sha384
pub const PKIXALG_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");

/// id-sha512
pub const PKIXALG_SHA512: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");

/// Signature algorithms that cause a certificate to be rejected with UntrustedSignatureAlgorithm.
pub const DENYLISTED_SIGNATURE_ALGS: &[ObjectIdentifier] = &[
    PKIXALG_MD2_WITH_RSA_ENCRYPTION,
    PKIXALG_MD4_WITH_RSA_ENCRYPTION,
    PKIXALG_MD5_WITH_RSA_ENCRYPTION,
];

// -------------------------------------------------------------------------------------------------
// Extended key usages
// -------------------------------------------------------------------------------------------------

/// id-kp-ipsecEndSystem
pub const ID_KP_IPSEC_END_SYSTEM: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.5");

/// id-kp-ipsecIKE (RFC 4945)
pub const ID_KP_IPSEC_IKE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.17");

/// Netscape server gated crypto
pub const NETSCAPE_SGC: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.113730.4.1");

/// Microsoft server gated crypto
pub const MICROSOFT_SGC: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.3");

/// id-pkinit-KPClientAuth (RFC 4556)
pub const ID_PKINIT_KP_CLIENT_AUTH: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.2.3.4");

/// id-pkinit-KPKdc (RFC 4556)
pub const ID_PKINIT_KP_KDC: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.2.3.5");

/// Code signing, development certificates
pub const APPLE_EKU_CODE_SIGNING_DEV: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.4.1.1");

/// Resource signing
pub const APPLE_EKU_RESOURCE_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.4.1.4");

/// iChat signing
pub const APPLE_EKU_ICHAT_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.4.2");

/// iChat encryption
pub const APPLE_EKU_ICHAT_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.4.3");

/// Passbook signing
pub const APPLE_EKU_PASSBOOK_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.4.14");

// -------------------------------------------------------------------------------------------------
// Private marker extensions
// -------------------------------------------------------------------------------------------------

/// Leaf marker for code signing certificates
pub const APPLE_EXT_CODE_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.1.1");

/// Leaf marker for App Store receipt signing certificates
pub const APPLE_EXT_APP_STORE_RECEIPT: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.11.1");

/// Leaf marker for Mobile Store signing certificates
pub const APPLE_EXT_MOBILE_STORE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.1.12");

/// Leaf marker for Mobile Store signing certificates issued for testing
pub const APPLE_EXT_TEST_MOBILE_STORE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.1.12.1");

/// Leaf marker for Passbook signing certificates
pub const APPLE_EXT_PASSBOOK_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.1.16");

/// Leaf marker for provisioning profile signing certificates
pub const APPLE_EXT_PROVISIONING_PROFILE_SIGNING: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.1.26");

/// Leaf marker for Developer ID application and installer certificates
pub const APPLE_EXT_DEVELOPER_ID_LEAF: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.1.13");

/// Leaf marker for escrow service encryption certificates
pub const APPLE_EXT_ESCROW_SERVICE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.23.1");

/// Leaf marker for server authentication certificates
pub const APPLE_EXT_SERVER_AUTHENTICATION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.27.1");

/// Intermediate marker for the WWDR CA
pub const APPLE_EXT_WWDR_INTERMEDIATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.2.1");

/// Intermediate marker for the ITMS CA
pub const APPLE_EXT_ITMS_INTERMEDIATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.2.2");

/// Intermediate marker for the Developer ID CA
pub const APPLE_EXT_DEVELOPER_ID_INTERMEDIATE: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.6.2.6");

/// id-pe-qcStatements (RFC 3739)
pub const ID_PE_QC_STATEMENTS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.3");

/// Marker extensions recorded in an [`ExtensionInfo`](crate::ExtensionInfo). All are understood
/// when marked critical.
pub const MARKER_EXTENSIONS: &[ObjectIdentifier] = &[
    APPLE_EXT_CODE_SIGNING,
    APPLE_EXT_APP_STORE_RECEIPT,
    APPLE_EXT_MOBILE_STORE,
    APPLE_EXT_TEST_MOBILE_STORE,
    APPLE_EXT_PASSBOOK_SIGNING,
    APPLE_EXT_PROVISIONING_PROFILE_SIGNING,
    APPLE_EXT_DEVELOPER_ID_LEAF,
    APPLE_EXT_ESCROW_SERVICE,
    APPLE_EXT_SERVER_AUTHENTICATION,
    APPLE_EXT_WWDR_INTERMEDIATE,
    APPLE_EXT_ITMS_INTERMEDIATE,
    APPLE_EXT_DEVELOPER_ID_INTERMEDIATE,
];

// -------------------------------------------------------------------------------------------------
// Certificate policies
// -------------------------------------------------------------------------------------------------

/// Apple certificate policy
pub const APPLE_CERTIFICATE_POLICY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.5.1");

/// Mobile Store signing policy
pub const APPLE_MOBILE_STORE_POLICY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.5.12");

/// Mobile Store signing policy for test certificates
pub const APPLE_TEST_MOBILE_STORE_POLICY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113635.100.5.13");

/// id-fpki-common-authentication (PIV authentication)
pub const PIV_AUTHENTICATION_POLICY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.3.13");

/// id-fpki-common-cardAuth (PIV card authentication)
pub const PIV_CARD_AUTH_POLICY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.16.840.1.101.3.2.1.3.17");

// -------------------------------------------------------------------------------------------------
// Attribute types
// -------------------------------------------------------------------------------------------------

/// id-at-commonName
pub const ID_AT_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");

/// pkcs-9-at-emailAddress
pub const PKCS9_EMAIL_ADDRESS: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");
