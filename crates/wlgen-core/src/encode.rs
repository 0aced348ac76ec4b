//! Reverse-domain encoding of email addresses.
//!
//! A raw corpus line `localpart@label1.label2.….labelK` becomes
//! `labelK.….label2.label1.@localpart`: the host labels in reverse order, each
//! followed by a `.`, then `@` and the local part. Keys sharing a domain
//! suffix are therefore lexicographically adjacent, which gives range scans
//! the same locality reverse-DNS row keys have in sorted key-value stores.
//!
//! ```
//! use wlgen_core::encode::{decode, reverse_host_name};
//!
//! let k = reverse_host_name("alice@mail.example.com\n")?;
//! assert_eq!(k, "com.example.mail.@alice");
//! let back = decode(&k).expect("well-formed key");
//! assert_eq!(back.local, "alice");
//! assert_eq!(back.host, "mail.example.com");
//! # Ok::<(), wlgen_core::KeymapError>(())
//! ```

use crate::error::{KeymapError, Result};

/// Encode one raw corpus line into an external key.
///
/// The line is split at the **first** `@`. Exactly one trailing line
/// terminator (`\n` or `\r\n`) is stripped from the host before it is split
/// on `.`; empty labels are kept as they are.
pub fn reverse_host_name(raw: &str) -> Result<String> {
    let Some((local, host)) = raw.split_once('@') else {
        return Err(KeymapError::MalformedEmail { raw: raw.to_owned(), reason: "no '@'" });
    };
    let host = strip_terminator(host);
    if host.is_empty() {
        return Err(KeymapError::MalformedEmail { raw: raw.to_owned(), reason: "empty host" });
    }

    let mut out = String::with_capacity(raw.len() + 1);
    for label in host.rsplit('.') {
        out.push_str(label);
        out.push('.');
    }
    out.push('@');
    out.push_str(local);
    Ok(out)
}

/// An encoded key split back into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedEmail {
    /// Local part, exactly as it appeared before the first `@`.
    pub local: String,
    /// Host in natural (non-reversed) label order.
    pub host: String,
}

impl DecodedEmail {
    /// Reassemble `local@host`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}@{}", self.local, self.host)
    }
}

/// Local part of an encoded key.
///
/// The encoder appends `@local` last and the local part never contains `@`,
/// so the split happens at the **last** `@`.
#[must_use]
pub fn local_part(encoded: &str) -> Option<&str> {
    encoded.rsplit_once('@').map(|(_, local)| local)
}

/// Invert [`reverse_host_name`]. Returns `None` for strings that are not of
/// the form `labels….@local`.
#[must_use]
pub fn decode(encoded: &str) -> Option<DecodedEmail> {
    let (rev_host, local) = encoded.rsplit_once('@')?;
    let rev_host = rev_host.strip_suffix('.')?;
    let host = rev_host.rsplit('.').collect::<Vec<_>>().join(".");
    Some(DecodedEmail { local: local.to_owned(), host })
}

#[inline]
fn strip_terminator(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s)
}
