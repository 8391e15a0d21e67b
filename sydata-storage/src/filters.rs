//! Per-dataset filter pipeline: byte shuffle followed by compression.
//!
//! Stored payload blobs start with a 12-byte header so a reader can undo the
//! pipeline without consulting the dataset node:
//!
//!   byte  0      : codec (0 = none, 1 = lz4, 2 = zstd)
//!   byte  1      : shuffle element width (0 or 1 = no shuffle)
//!   bytes 2..=3  : reserved (0)
//!   bytes 4..=11 : raw length (u64)

use bitcode::{Decode, Encode};
use sydata_result::{Error, Result};

use crate::codecs::{read_u64_le, write_u64_le};

const PAYLOAD_HEADER_LEN: usize = 12;

const CODEC_NONE: u8 = 0;
const CODEC_LZ4: u8 = 1;
const CODEC_ZSTD: u8 = 2;

/// Highest standard zstd compression level.
pub const ZSTD_MAX_LEVEL: i32 = 22;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub enum Compression {
    /// LZ4 block codec with the raw size prepended.
    Lz4,
    Zstd { level: i32 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct FilterPipeline {
    pub compression: Option<Compression>,
    pub shuffle: bool,
}

impl FilterPipeline {
    /// Store bytes as-is.
    pub const NONE: FilterPipeline = FilterPipeline {
        compression: None,
        shuffle: false,
    };

    /// Fast codec for files that are linked into from other files.
    pub const fn internal() -> Self {
        FilterPipeline {
            compression: Some(Compression::Lz4),
            shuffle: true,
        }
    }

    /// High-ratio codec for files handed to other tools.
    pub const fn shareable() -> Self {
        FilterPipeline {
            compression: Some(Compression::Zstd {
                level: ZSTD_MAX_LEVEL,
            }),
            shuffle: true,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    /// Run the pipeline forward over `raw`, treating it as elements of
    /// `elem_size` bytes for the shuffle step.
    pub fn encode(&self, raw: &[u8], elem_size: usize) -> Result<Vec<u8>> {
        let width = if self.shuffle { elem_size.min(u8::MAX as usize) } else { 1 };
        let shuffled;
        let input: &[u8] = if width > 1 {
            shuffled = shuffle(raw, width);
            &shuffled
        } else {
            raw
        };

        let (codec, body) = match self.compression {
            None => (CODEC_NONE, input.to_vec()),
            Some(Compression::Lz4) => (CODEC_LZ4, lz4_flex::compress_prepend_size(input)),
            Some(Compression::Zstd { level }) => {
                (CODEC_ZSTD, zstd::encode_all(input, level).map_err(Error::codec)?)
            }
        };

        let mut out = Vec::with_capacity(PAYLOAD_HEADER_LEN + body.len());
        out.push(codec);
        out.push(width as u8);
        out.extend_from_slice(&[0u8; 2]);
        write_u64_le(&mut out, raw.len() as u64);
        out.extend_from_slice(&body);
        Ok(out)
    }
}

/// Undo whatever pipeline produced `stored`.
pub fn decode_payload(stored: &[u8]) -> Result<Vec<u8>> {
    if stored.len() < PAYLOAD_HEADER_LEN {
        return Err(Error::Codec("payload header truncated".into()));
    }
    let codec = stored[0];
    let width = stored[1] as usize;
    let mut o = 4usize;
    let raw_len = read_u64_le(stored, &mut o) as usize;
    let body = &stored[PAYLOAD_HEADER_LEN..];

    let decoded = match codec {
        CODEC_NONE => body.to_vec(),
        CODEC_LZ4 => lz4_flex::decompress_size_prepended(body).map_err(Error::codec)?,
        CODEC_ZSTD => zstd::decode_all(body).map_err(Error::codec)?,
        other => return Err(Error::Codec(format!("unknown payload codec {other}"))),
    };
    if decoded.len() != raw_len {
        return Err(Error::Codec(format!(
            "payload length mismatch: header says {raw_len}, decoded {}",
            decoded.len()
        )));
    }

    if width > 1 {
        Ok(unshuffle(&decoded, width))
    } else {
        Ok(decoded)
    }
}

/// Byte-transpose `data` as elements of `width` bytes: all first bytes, then
/// all second bytes, and so on. Trailing bytes that do not fill an element
/// are copied verbatim.
pub fn shuffle(data: &[u8], width: usize) -> Vec<u8> {
    let n = data.len() / width;
    let body = n * width;
    let mut out = vec![0u8; data.len()];
    for i in 0..n {
        for b in 0..width {
            out[b * n + i] = data[i * width + b];
        }
    }
    out[body..].copy_from_slice(&data[body..]);
    out
}

/// Inverse of [`shuffle`].
pub fn unshuffle(data: &[u8], width: usize) -> Vec<u8> {
    let n = data.len() / width;
    let body = n * width;
    let mut out = vec![0u8; data.len()];
    for i in 0..n {
        for b in 0..width {
            out[i * width + b] = data[b * n + i];
        }
    }
    out[body..].copy_from_slice(&data[body..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_groups_bytes_by_position() {
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let s = shuffle(&data, 2);
        assert_eq!(s, vec![1, 3, 5, 2, 4, 6, 7]);
        assert_eq!(unshuffle(&s, 2), data.to_vec());
    }

    #[test]
    fn every_profile_restores_input() {
        let raw: Vec<u8> = (0..5000u32).flat_map(|v| (v / 7).to_le_bytes()).collect();
        for pipeline in [
            FilterPipeline::NONE,
            FilterPipeline::internal(),
            FilterPipeline::shareable(),
        ] {
            let stored = pipeline.encode(&raw, 4).unwrap();
            assert_eq!(decode_payload(&stored).unwrap(), raw, "{pipeline:?}");
            if pipeline.is_compressed() {
                assert!(stored.len() < raw.len());
            }
        }
    }

    #[test]
    fn corrupt_header_is_a_codec_error() {
        let mut stored = FilterPipeline::internal().encode(b"abcdefgh", 8).unwrap();
        stored[0] = 9;
        assert!(matches!(decode_payload(&stored), Err(Error::Codec(_))));
        assert!(matches!(decode_payload(&[0u8; 3]), Err(Error::Codec(_))));
    }
}
