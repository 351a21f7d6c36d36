//! Utility functions used when comparing names, extracting attribute values and logging

use der::asn1::{Ia5String, PrintableString, Utf8StringRef};
use der::{Encode, Tagged};
use log::error;
use subtle_encoding::hex;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::Name;

use crate::util::error::*;
use crate::util::tp_oids::{ID_AT_COMMON_NAME, PKCS9_EMAIL_ADDRESS};
use crate::CertificateItem;

/// `name_to_string` returns a string representation of given Name value.
pub fn name_to_string(name: &Name) -> String {
    name.to_string()
}

/// `buffer_to_hex` returns a lower case hex representation of the given buffer.
pub fn buffer_to_hex(buffer: &[u8]) -> String {
    let hex = hex::encode(buffer);
    // hex::encode only emits ASCII characters
    String::from_utf8(hex).unwrap_or_default()
}

/// `hex_to_buffer` parses a hex string, in either case, into a buffer.
pub fn hex_to_buffer(hex_str: &str) -> Result<Vec<u8>> {
    hex::decode(hex_str.to_lowercase().as_bytes()).map_err(|_e| Error::ParseError)
}

pub(crate) fn log_error_for_name(name: &Name, msg: &str) {
    let name_str = name_to_string(name);
    error!(
        "Encountered error while processing certificate with subject {}: {}",
        name_str, msg
    );
}

/// log a message with subject name of the certificate appended
pub fn log_error_for_cert(cert: &CertificateItem, msg: &str) {
    log_error_for_name(&cert.decoded_cert.tbs_certificate.subject, msg);
}

/// Returns the attribute value as a string if it uses one of the common string types.
fn attribute_value_as_string(atav: &AttributeTypeAndValue) -> Option<String> {
    match atav.value.tag() {
        der::Tag::PrintableString => atav
            .value
            .decode_as()
            .ok()
            .map(|s: PrintableString| s.to_string()),
        der::Tag::Utf8String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Utf8StringRef<'_>| s.to_string()),
        der::Tag::Ia5String => atav
            .value
            .decode_as()
            .ok()
            .map(|s: Ia5String| s.to_string()),
        _ => None,
    }
}

/// get_value_from_rdn returns the value from AttributeTypeAndValue as a string for use in comparing
/// values where leading whitespace may be a factor
pub fn get_value_from_rdn(atav: &AttributeTypeAndValue) -> Result<String> {
    let mut s = "".to_string();
    if let Some(val) = attribute_value_as_string(atav) {
        let mut iter = val.char_indices().peekable();
        while let Some((i, c)) = iter.next() {
            match c {
                '#' if i == 0 => s.push_str("\\#"),
                ' ' if i == 0 || iter.peek().is_none() => s.push_str("\\ "),
                '"' | '+' | ',' | ';' | '<' | '>' | '\\' => s.push_str(format!("\\{}", c).as_str()),
                '\x00'..='\x1f' | '\x7f' => s.push_str(format!("\\{:02x}", c as u8).as_str()),
                _ => s.push(c),
            }
        }
    } else {
        let val = atav.value.to_der()?;
        s.push_str(format!("{}=#", atav.oid).as_str());
        s.push_str(&buffer_to_hex(&val));
    }
    Ok(s)
}

/// Lower cases the value and collapses runs of whitespace into a single space.
fn normalize_value(value: &str) -> String {
    value
        .replace("\\ ", " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// [`compare_names`] compares two Name values returning true if they match and false otherwise.
///
/// Attribute values that do not match exactly are compared again ignoring case, leading and trailing
/// whitespace and repeated interior whitespace.
pub fn compare_names(left: &Name, right: &Name) -> bool {
    // no match if not the same number of RDNs
    if left.0.len() != right.0.len() {
        return false;
    }

    for (lrdn, rrdn) in left.0.iter().zip(right.0.iter()) {
        if lrdn.0.len() != rrdn.0.len() {
            return false;
        }

        if lrdn == rrdn {
            continue;
        }

        for (l, r) in lrdn.0.iter().zip(rrdn.0.iter()) {
            if l.oid != r.oid {
                return false;
            }

            let l_val = match get_value_from_rdn(l) {
                Ok(val) => normalize_value(&val),
                Err(_e) => return false,
            };
            let r_val = match get_value_from_rdn(r) {
                Ok(val) => normalize_value(&val),
                Err(_e) => return false,
            };
            if l_val != r_val {
                return false;
            }
        }
    }
    true
}

/// Returns the string values of all attributes of the given type in the presented name, in order.
pub fn get_attribute_values(name: &Name, oid: &der::asn1::ObjectIdentifier) -> Vec<String> {
    let mut retval = vec![];
    for rdn in name.0.iter() {
        for atav in rdn.0.iter() {
            if atav.oid == *oid {
                if let Some(v) = attribute_value_as_string(atav) {
                    retval.push(v);
                }
            }
        }
    }
    retval
}

/// Returns the common name values from the presented name.
pub fn get_common_names(name: &Name) -> Vec<String> {
    get_attribute_values(name, &ID_AT_COMMON_NAME)
}

/// Returns the emailAddress values from the presented name.
pub fn get_email_addresses(name: &Name) -> Vec<String> {
    get_attribute_values(name, &PKCS9_EMAIL_ADDRESS)
}
