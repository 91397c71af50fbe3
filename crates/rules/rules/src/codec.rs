//! Binary encoding of compiled policies.
//!
//! A policy is serialized with `bincode` and then zlib-compressed. The format
//! carries no version header: any structural change to the IR makes old
//! artifacts fail to decode, which the repair pass handles by recompiling
//! every stored source.

use std::io::{Read, Write};

use bincode::Options;
use flate2::Compression;
use flate2::bufread::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::RuleError;
use crate::ir::policy::CompiledPolicy;

/// Upper bound on the decompressed size of an artifact.
const MAX_DECODED_LEN: u64 = 16 * 1024 * 1024;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_DECODED_LEN)
        .reject_trailing_bytes()
}

/// Serialize and compress a compiled policy.
pub fn encode(policy: &CompiledPolicy) -> Result<Vec<u8>, RuleError> {
    let raw = options()
        .serialize(policy)
        .map_err(|e| RuleError::Encode(e.to_string()))?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&raw)
        .map_err(|e| RuleError::Encode(e.to_string()))?;
    encoder.finish().map_err(|e| RuleError::Encode(e.to_string()))
}

/// Decompress and deserialize a compiled policy.
///
/// An empty buffer is not an error: it decodes to [`CompiledPolicy::empty`].
/// Anything after the end of the compressed stream is rejected.
pub fn decode(bytes: &[u8]) -> Result<CompiledPolicy, RuleError> {
    if bytes.is_empty() {
        return Ok(CompiledPolicy::empty());
    }

    let mut raw = Vec::new();
    let mut decoder = ZlibDecoder::new(bytes);
    decoder
        .by_ref()
        .take(MAX_DECODED_LEN)
        .read_to_end(&mut raw)
        .map_err(|e| RuleError::Decode(format!("decompression failed: {e}")))?;

    let rest = decoder.into_inner();
    if !rest.is_empty() {
        return Err(RuleError::Decode(format!(
            "{} unexpected bytes after compressed policy",
            rest.len()
        )));
    }

    options()
        .deserialize(&raw)
        .map_err(|e| RuleError::Decode(format!("malformed policy: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::build_range;
    use crate::ir::matcher::{PolicyRegex, ValueMatcher};
    use crate::ir::policy::RuleRow;

    fn sample_policy() -> CompiledPolicy {
        CompiledPolicy::new(
            true,
            vec![
                RuleRow::new(false, "group")
                    .with_negate(true)
                    .with_expression(ValueMatcher::Literal("admins".into()))
                    .with_expression(ValueMatcher::Regex(PolicyRegex::new("^ops-").unwrap())),
                RuleRow::new(true, "remote_ip")
                    .with_expression(ValueMatcher::CidrRange(build_range("10.0.0.0/8").unwrap())),
            ],
        )
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let policy = sample_policy();
        let bytes = encode(&policy).unwrap();
        assert_eq!(decode(&bytes).unwrap(), policy);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(
            encode(&sample_policy()).unwrap(),
            encode(&sample_policy()).unwrap()
        );
    }

    #[test]
    fn decoded_regex_still_matches() {
        let bytes = encode(&sample_policy()).unwrap();
        let policy = decode(&bytes).unwrap();
        let ValueMatcher::Regex(re) = &policy.rules[0].expressions[1] else {
            panic!("expected a regex matcher");
        };
        assert!(re.is_match("OPS-team"));
    }

    #[test]
    fn empty_bytes_decode_to_empty_policy() {
        assert_eq!(decode(&[]).unwrap(), CompiledPolicy::empty());
    }

    #[test]
    fn empty_policy_is_not_empty_bytes() {
        let bytes = encode(&CompiledPolicy::empty()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(decode(&bytes).unwrap(), CompiledPolicy::empty());
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode(b"definitely not zlib").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn valid_zlib_with_bad_payload_is_a_decode_error() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0xff; 12]).unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(decode(&bytes).unwrap_err().is_decode());
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let raw = {
            let mut raw = options().serialize(&sample_policy()).unwrap();
            raw.push(0);
            raw
        };
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(decode(&bytes).unwrap_err().is_decode());
    }

    #[test]
    fn bytes_after_compressed_stream_are_rejected() {
        let mut bytes = encode(&sample_policy()).unwrap();
        bytes.extend_from_slice(b"junk");
        let err = decode(&bytes).unwrap_err();
        assert!(err.is_decode(), "unexpected error: {err}");
        assert!(err.to_string().contains("4 unexpected bytes"));
    }

    #[test]
    fn invalid_stored_regex_is_a_decode_error() {
        let mut policy = sample_policy();
        policy.rules[0].expressions = vec![ValueMatcher::Literal("(unclosed".into())];
        let mut raw = options().serialize(&policy).unwrap();

        // varint layout: variant tag, string length, string bytes
        let needle = b"(unclosed";
        let start = raw.windows(needle.len()).position(|w| w == needle).unwrap();
        assert_eq!(raw[start - 2], 2, "Literal is the third variant");
        raw[start - 2] = 0;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let bytes = encoder.finish().unwrap();
        let err = decode(&bytes).unwrap_err();
        assert!(err.is_decode(), "unexpected error: {err}");
    }
}
