//! Payload encryption framing.
//!
//! The crypto primitive itself is a consumed capability: anything that can
//! encrypt and decrypt 16-byte-aligned blocks. The link layer only owns the
//! framing around it: a 1-byte plaintext length prefix plus zero padding to
//! the block boundary, so arbitrary payload lengths survive a block cipher.
//!
//! ```text
//! plaintext:   [ len (1B) | payload (len B) | zero pad ]   -> multiple of 16
//! ```
//!
//! The framing is applied to every outgoing payload when a codec is
//! configured, including internally generated ACK frames; a 1-byte ACK
//! grows to a full 16-byte block on the air.

/// Cipher block granularity in bytes.
pub const CIPHER_BLOCK_LEN: usize = 16;

/// Symmetric block codec capability.
///
/// Implementations receive buffers whose length is a multiple of
/// [`CIPHER_BLOCK_LEN`] and must return output of the same length.
pub trait CryptoCodec: Send + Sync {
    /// Encrypt a block-aligned buffer.
    fn encrypt(&self, block: &[u8]) -> Vec<u8>;

    /// Decrypt a block-aligned buffer.
    fn decrypt(&self, block: &[u8]) -> Vec<u8>;
}

/// Frame a plaintext payload and encrypt it.
///
/// Prepends the plaintext length, zero-pads to the next block boundary and
/// runs the codec over the whole buffer. The result is always a non-empty
/// multiple of 16 bytes, even for an empty payload.
pub(crate) fn encrypt_payload(codec: &dyn CryptoCodec, plaintext: &[u8]) -> Vec<u8> {
    let framed_len = 1 + plaintext.len();
    let padding = (CIPHER_BLOCK_LEN - framed_len % CIPHER_BLOCK_LEN) % CIPHER_BLOCK_LEN;

    let mut buf = Vec::with_capacity(framed_len + padding);
    buf.push(plaintext.len() as u8);
    buf.extend_from_slice(plaintext);
    buf.resize(framed_len + padding, 0);

    codec.encrypt(&buf)
}

/// Decrypt a payload and strip the length-prefix framing.
///
/// The first decrypted byte is the original plaintext length `L`; bytes
/// `[1 .. 1+L]` are returned. A length byte pointing past the buffer is
/// clamped rather than trusted.
pub(crate) fn decrypt_payload(codec: &dyn CryptoCodec, ciphertext: &[u8]) -> Vec<u8> {
    let clear = codec.decrypt(ciphertext);
    let Some((&len, rest)) = clear.split_first() else {
        return Vec::new();
    };
    let len = (len as usize).min(rest.len());
    rest[..len].to_vec()
}
