//! Encrypted reply-to addresses (`reply-<hex ciphertext>@<domain>`).
//!
//! A token carries `salt ++ post_id ++ "|" ++ user_id`, sealed with
//! ChaCha20-Poly1305 under a key derived from the configured secret. The nonce
//! is random per call, so two tokens for the same pair differ byte-wise but
//! decode to the same pair. Hex is used for the ciphertext because mail
//! transports are free to case-fold the local part.
//!
//! Only one key is ever active: rotating the secret or the salt invalidates
//! every address issued before the rotation.

use std::fmt;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::CodecError;
use crate::invite::parse_recipient;

const PREFIX: &str = "reply-";
const DELIMITER: char = '|';
const NONCE_LEN: usize = 12;

/// The identifier pair a reply address resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub post_id: String,
    pub user_id: String,
}

#[derive(Clone)]
pub struct ReplyAddressCodec {
    cipher: ChaCha20Poly1305,
    salt: String,
    domain: String,
}

impl ReplyAddressCodec {
    /// The 256-bit key is the SHA-256 digest of `secret`.
    pub fn new(secret: &str, salt: &str, domain: &str) -> Self {
        let key = Sha256::digest(secret.as_bytes());
        Self {
            cipher: ChaCha20Poly1305::new(&key),
            salt: salt.to_string(),
            domain: domain.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.reply_address_key,
            &config.reply_address_salt,
            &config.reply_address_domain,
        )
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Seal `(post_id, user_id)` into a reply address.
    pub fn encode(&self, post_id: &str, user_id: &str) -> Result<String, CodecError> {
        for id in [post_id, user_id] {
            if id.contains(DELIMITER) {
                return Err(CodecError::Identifier(id.to_string()));
            }
        }

        let plaintext = format!("{}{}{}{}", self.salt, post_id, DELIMITER, user_id);

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| CodecError::Format(format!("encryption failed: {}", e)))?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);

        Ok(format!("{}{}@{}", PREFIX, hex::encode(sealed), self.domain))
    }

    /// Recover the pair from an inbound address. Accepts the bare address or
    /// any string containing it (e.g. `"Hylo <reply-...@domain>"`).
    pub fn decode(&self, address: &str) -> Result<ReplyTarget, CodecError> {
        let encoded = extract_ciphertext(address)?;

        let sealed = hex::decode(&encoded)
            .map_err(|e| CodecError::Format(format!("ciphertext is not hex: {}", e)))?;
        if sealed.len() <= NONCE_LEN {
            return Err(CodecError::Format("ciphertext too short".to_string()));
        }

        let (nonce, body) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| CodecError::Format("ciphertext failed authentication".to_string()))?;
        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| CodecError::Format("plaintext is not UTF-8".to_string()))?;

        let ids = self.strip_salt(&plaintext).ok_or(CodecError::Integrity)?;
        let (post_id, user_id) = ids
            .split_once(DELIMITER)
            .ok_or_else(|| CodecError::Format("missing identifier delimiter".to_string()))?;

        Ok(ReplyTarget {
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
        })
    }

    /// Reply-to address for a notification about `post_id` sent to `user_id`.
    pub fn post_reply_address(&self, post_id: &str, user_id: &str) -> Result<String, CodecError> {
        self.encode(post_id, user_id)
    }

    /// Inverse of [`post_reply_address`](Self::post_reply_address), used by the inbound webhook.
    pub fn decode_post_reply_address(&self, address: &str) -> Result<ReplyTarget, CodecError> {
        self.decode(address)
    }

    fn strip_salt<'a>(&self, plaintext: &'a str) -> Option<&'a str> {
        let salt = self.salt.as_bytes();
        let head = plaintext.as_bytes().get(..salt.len())?;
        if bool::from(head.ct_eq(salt)) {
            Some(&plaintext[salt.len()..])
        } else {
            None
        }
    }
}

impl fmt::Debug for ReplyAddressCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyAddressCodec")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Only the bracketed address of a display form is searched, so a display
/// name like `Reply-Bot` is never mistaken for the prefix. Mail transports
/// may case-fold the local part, so matching is done on the ASCII-lowercased
/// address; hex survives that unchanged.
fn extract_ciphertext(address: &str) -> Result<String, CodecError> {
    let lowered = parse_recipient(address).to_ascii_lowercase();
    let start = lowered
        .find(PREFIX)
        .ok_or_else(|| CodecError::Format(format!("missing `{}` prefix", PREFIX)))?
        + PREFIX.len();
    let rest = &lowered[start..];
    let end = rest
        .find('@')
        .ok_or_else(|| CodecError::Format("missing `@` delimiter".to_string()))?;

    match &rest[..end] {
        "" => Err(CodecError::Format("empty ciphertext".to_string())),
        encoded => Ok(encoded.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> ReplyAddressCodec {
        ReplyAddressCodec::new("test-secret", "s4lt:", "reply.hylo.test")
    }

    fn ciphertext_of(address: &str) -> String {
        extract_ciphertext(address).expect("address has a ciphertext")
    }

    #[test]
    fn test_round_trip() {
        let codec = codec();
        for (post, user) in [("42", "7"), ("", ""), ("post-abc", "user with spaces"), ("é", "42")] {
            let address = codec.encode(post, user).expect("Should encode");
            let target = codec.decode(&address).expect("Should decode");
            assert_eq!(target.post_id, post);
            assert_eq!(target.user_id, user);
        }
    }

    #[test]
    fn test_address_shape() {
        let address = codec().post_reply_address("1", "2").unwrap();
        assert!(address.starts_with("reply-"));
        assert!(address.ends_with("@reply.hylo.test"));
        let encoded = &address["reply-".len()..address.find('@').unwrap()];
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_ciphertext_is_randomized() {
        let codec = codec();
        let a = codec.encode("1", "2").unwrap();
        let b = codec.encode("1", "2").unwrap();
        assert_ne!(a, b);
        assert_eq!(codec.decode(&a).unwrap(), codec.decode(&b).unwrap());
    }

    #[test]
    fn test_survives_restart_and_case_folding() {
        let address = codec().encode("99", "100").unwrap();
        let restarted = codec();

        let target = restarted
            .decode_post_reply_address(&address.to_uppercase())
            .expect("Should decode upper-cased address");
        assert_eq!(target.post_id, "99");
        assert_eq!(target.user_id, "100");
    }

    #[test]
    fn test_decodes_display_form() {
        let codec = codec();
        let address = codec.encode("5", "6").unwrap();
        let target = codec.decode(&format!("Hylo <{}>", address)).unwrap();
        assert_eq!(target.post_id, "5");
    }

    #[test]
    fn test_display_name_with_prefix_is_ignored() {
        let codec = codec();
        let address = codec.encode("8", "9").unwrap();

        let target = codec.decode(&format!("Reply-Bot <{}>", address)).unwrap();
        assert_eq!(target.post_id, "8");
        assert_eq!(target.user_id, "9");

        let target = codec
            .decode(&format!("\"reply-team@hylo.test\" <{}>", address.to_uppercase()))
            .unwrap();
        assert_eq!(target.post_id, "8");
    }

    #[test]
    fn test_rejects_delimiter_in_identifier() {
        assert_eq!(
            codec().encode("1|2", "3"),
            Err(CodecError::Identifier("1|2".to_string()))
        );
    }

    #[test]
    fn test_malformed_addresses() {
        let codec = codec();
        for address in [
            "someone@example.com",
            "reply-abcdef",
            "reply-@reply.hylo.test",
            "reply-zz11@reply.hylo.test",
            "reply-00ff@reply.hylo.test",
        ] {
            assert!(
                matches!(codec.decode(address), Err(CodecError::Format(_))),
                "{} should be a format error",
                address
            );
        }
    }

    #[test]
    fn test_every_mutated_digit_is_rejected() {
        let codec = codec();
        let address = codec.encode("12", "34").unwrap();
        let encoded = ciphertext_of(&address);

        for i in 0..encoded.len() {
            let mut bytes = encoded.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let mutated = format!(
                "reply-{}@reply.hylo.test",
                String::from_utf8(bytes).unwrap()
            );

            match codec.decode(&mutated) {
                Err(CodecError::Format(_)) | Err(CodecError::Integrity) => {}
                other => panic!("mutation at {} decoded to {:?}", i, other),
            }
        }
    }

    #[test]
    fn test_salt_rotation_is_integrity_error() {
        let address = codec().encode("1", "2").unwrap();
        let rotated = ReplyAddressCodec::new("test-secret", "other-salt:", "reply.hylo.test");
        assert_eq!(rotated.decode(&address), Err(CodecError::Integrity));
    }

    #[test]
    fn test_key_rotation_is_format_error() {
        let address = codec().encode("1", "2").unwrap();
        let rotated = ReplyAddressCodec::new("new-secret", "s4lt:", "reply.hylo.test");
        assert!(matches!(rotated.decode(&address), Err(CodecError::Format(_))));
    }
}
