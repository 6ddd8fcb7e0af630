//! Session cipher for encrypted Viera sessions
//!
//! Newer firmware only accepts NetworkControl commands wrapped in an encrypted
//! envelope. The pairing step hands out a base64 encryption key; its 16 decoded
//! bytes are the AES IV, the AES key is the IV with every 4-byte group reordered
//! and the HMAC key is the IV twice over.
//!
//! Payload layout before encryption:
//! `12 random bytes | u32 BE plaintext length | plaintext | zero padding`.
//! The transmitted form is `base64(ciphertext | HMAC-SHA256(ciphertext))`.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::{ApiError, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type HmacSha256 = Hmac<Sha256>;

const BLOCK: usize = 16;
const HEADER: usize = 16;
const MAC_LEN: usize = 32;

/// Keys derived from a pairing encryption key
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    key: [u8; 16],
    iv: [u8; 16],
    hmac_key: [u8; 32],
}

impl SessionKeys {
    /// Derive the session keys from the base64 encryption key
    ///
    /// Fails with [`ApiError::AuthenticationFailed`] when the key is not base64
    /// or does not decode to 16 bytes.
    pub fn derive(encryption_key: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(encryption_key.trim())
            .map_err(|e| ApiError::AuthenticationFailed(format!("encryption key is not base64: {}", e)))?;

        let iv: [u8; 16] = decoded.as_slice().try_into().map_err(|_| {
            ApiError::AuthenticationFailed(format!(
                "encryption key must decode to 16 bytes, got {}",
                decoded.len()
            ))
        })?;

        let mut key = [0u8; 16];
        for i in (0..16).step_by(4) {
            key[i] = iv[i + 2];
            key[i + 1] = iv[i + 3];
            key[i + 2] = iv[i];
            key[i + 3] = iv[i + 1];
        }

        let mut hmac_key = [0u8; 32];
        hmac_key[..16].copy_from_slice(&iv);
        hmac_key[16..].copy_from_slice(&iv);

        Ok(Self { key, iv, hmac_key })
    }

    /// Encrypt and sign a plaintext payload, returning base64
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let data = plaintext.as_bytes();
        let length = u32::try_from(data.len())
            .map_err(|_| ApiError::InvalidArgument("payload too large to encrypt".to_string()))?;

        let mut buffer = Vec::with_capacity(HEADER + data.len() + BLOCK);
        buffer.extend_from_slice(&rand::random::<[u8; 12]>());
        buffer.extend_from_slice(&length.to_be_bytes());
        buffer.extend_from_slice(data);
        let padded = buffer.len().div_ceil(BLOCK) * BLOCK;
        buffer.resize(padded, 0);

        let mut ciphertext = Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<NoPadding>(&buffer);
        let signature = self.sign(&ciphertext)?;
        ciphertext.extend_from_slice(&signature);

        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt a base64 payload produced by the TV
    ///
    /// A trailing HMAC is verified and stripped when present. The plaintext ends
    /// at the first NUL byte since the TV does not fill in the length header.
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ApiError::ProtocolError(format!("encrypted payload is not base64: {}", e)))?;

        let ciphertext = self.strip_signature(&raw)?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK != 0 {
            return Err(ApiError::ProtocolError(format!(
                "encrypted payload has invalid length {}",
                ciphertext.len()
            )));
        }

        let plain = Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| ApiError::ProtocolError("failed to decrypt payload".to_string()))?;

        let body = plain.get(HEADER..).unwrap_or_default();
        let end = body.iter().position(|b| *b == 0).unwrap_or(body.len());
        Ok(String::from_utf8_lossy(&body[..end]).into_owned())
    }

    fn sign(&self, data: &[u8]) -> Result<[u8; MAC_LEN]> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.hmac_key)
            .map_err(|e| ApiError::AuthenticationFailed(format!("invalid HMAC key: {}", e)))?;
        mac.update(data);
        let mut out = [0u8; MAC_LEN];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }

    fn strip_signature<'a>(&self, raw: &'a [u8]) -> Result<&'a [u8]> {
        if raw.len() >= BLOCK + MAC_LEN {
            let (body, tag) = raw.split_at(raw.len() - MAC_LEN);
            if self.sign(body)?.as_slice() == tag {
                return Ok(body);
            }
        }
        Ok(raw)
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}
