//! Minimal ABI codec for the registry contract
//!
//! The registry contract's surface is small enough that a generic ABI
//! library is not warranted: calls take at most five arguments and
//! return flat tuples of words and strings. Encoding follows the
//! standard head/tail layout; dynamic values carry a 32-byte offset in
//! the head and length-prefixed padded bytes in the tail.

use sha3::{Digest, Keccak256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AbiError {
    #[error("Response truncated: wanted slot {0}")]
    Truncated(usize),

    #[error("Malformed ABI value: {0}")]
    Malformed(String),
}

/// An encodable call argument.
#[derive(Debug, Clone)]
pub enum Token {
    Bytes32([u8; 32]),
    Address([u8; 20]),
    Uint(u64),
    Bool(bool),
    Str(String),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Token::Str(_))
    }

    fn head_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            Token::Bytes32(b) => word.copy_from_slice(b),
            Token::Address(a) => word[12..].copy_from_slice(a),
            Token::Uint(v) => word[24..].copy_from_slice(&v.to_be_bytes()),
            Token::Bool(b) => word[31] = *b as u8,
            // Dynamic tokens get their offset patched in later.
            Token::Str(_) => {}
        }
        word
    }

    fn tail_bytes(&self) -> Vec<u8> {
        match self {
            Token::Str(s) => {
                let mut out = Vec::new();
                let mut len_word = [0u8; 32];
                len_word[24..].copy_from_slice(&(s.len() as u64).to_be_bytes());
                out.extend_from_slice(&len_word);
                out.extend_from_slice(s.as_bytes());
                // pad to a word boundary
                let rem = s.len() % 32;
                if rem != 0 {
                    out.extend(std::iter::repeat(0u8).take(32 - rem));
                }
                out
            }
            _ => Vec::new(),
        }
    }
}

/// First four bytes of the Keccak-256 hash of the function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Encode a full calldata payload: selector followed by head/tail
/// encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let head_size = 32 * args.len();
    let mut head: Vec<[u8; 32]> = Vec::with_capacity(args.len());
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        if arg.is_dynamic() {
            let mut offset_word = [0u8; 32];
            let offset = (head_size + tail.len()) as u64;
            offset_word[24..].copy_from_slice(&offset.to_be_bytes());
            head.push(offset_word);
            tail.extend(arg.tail_bytes());
        } else {
            head.push(arg.head_word());
        }
    }

    let mut out = Vec::with_capacity(4 + head_size + tail.len());
    out.extend_from_slice(&selector(signature));
    for word in head {
        out.extend_from_slice(&word);
    }
    out.extend_from_slice(&tail);
    out
}

/// Slot-addressed reader over a returned ABI tuple.
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word(&self, slot: usize) -> Result<&'a [u8], AbiError> {
        let start = slot * 32;
        self.data
            .get(start..start + 32)
            .ok_or(AbiError::Truncated(slot))
    }

    pub fn bool_at(&self, slot: usize) -> Result<bool, AbiError> {
        Ok(self.word(slot)?[31] != 0)
    }

    pub fn u64_at(&self, slot: usize) -> Result<u64, AbiError> {
        let word = self.word(slot)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&word[24..]);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn address_at(&self, slot: usize) -> Result<[u8; 20], AbiError> {
        let word = self.word(slot)?;
        let mut buf = [0u8; 20];
        buf.copy_from_slice(&word[12..]);
        Ok(buf)
    }

    /// Read a dynamic string whose offset lives at `slot`.
    pub fn string_at(&self, slot: usize) -> Result<String, AbiError> {
        let offset = self.u64_at(slot)? as usize;
        let len_end = offset
            .checked_add(32)
            .ok_or_else(|| AbiError::Malformed("string offset overflow".into()))?;
        let len_word = self
            .data
            .get(offset..len_end)
            .ok_or(AbiError::Truncated(slot))?;
        let mut len_buf = [0u8; 8];
        len_buf.copy_from_slice(&len_word[24..]);
        let len = u64::from_be_bytes(len_buf) as usize;

        let data_end = len_end
            .checked_add(len)
            .ok_or_else(|| AbiError::Malformed("string length overflow".into()))?;
        let bytes = self
            .data
            .get(len_end..data_end)
            .ok_or(AbiError::Truncated(slot))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AbiError::Malformed("string is not valid UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_is_four_bytes_and_signature_sensitive() {
        assert_ne!(
            selector("isValid(bytes32)"),
            selector("getCredential(bytes32)")
        );
    }

    #[test]
    fn encode_static_args() {
        let data = encode_call("isValid(bytes32)", &[Token::Bytes32([7u8; 32])]);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[4..36], &[7u8; 32]);
    }

    #[test]
    fn encode_then_decode_dynamic_string() {
        // Layout matches a returned tuple, so the decoder can read back
        // what the encoder wrote (minus the selector).
        let data = encode_call(
            "f(bytes32,string,uint64)",
            &[
                Token::Bytes32([1u8; 32]),
                Token::Str("bafybeigdyrzt5".to_string()),
                Token::Uint(1_700_000_000),
            ],
        );
        let dec = Decoder::new(&data[4..]);
        assert_eq!(dec.string_at(1).unwrap(), "bafybeigdyrzt5");
        assert_eq!(dec.u64_at(2).unwrap(), 1_700_000_000);
    }

    #[test]
    fn encoded_calls_are_word_aligned() {
        let data = encode_call(
            "g(string,string)",
            &[
                Token::Str("a".repeat(33)),
                Token::Str(String::new()),
            ],
        );
        assert_eq!((data.len() - 4) % 32, 0);
        let dec = Decoder::new(&data[4..]);
        assert_eq!(dec.string_at(0).unwrap(), "a".repeat(33));
        assert_eq!(dec.string_at(1).unwrap(), "");
    }

    #[test]
    fn decoder_rejects_truncated_input() {
        let dec = Decoder::new(&[0u8; 16]);
        assert!(matches!(dec.bool_at(0), Err(AbiError::Truncated(0))));
    }

    #[test]
    fn decoder_rejects_absurd_string_length() {
        // Offset word pointing at slot 1, whose length word claims
        // u64::MAX bytes of string data follow.
        let mut data = vec![0u8; 64];
        data[31] = 32;
        data[32..64].copy_from_slice(&{
            let mut word = [0u8; 32];
            word[24..].copy_from_slice(&u64::MAX.to_be_bytes());
            word
        });
        let dec = Decoder::new(&data);
        assert!(dec.string_at(0).is_err());
    }
}
