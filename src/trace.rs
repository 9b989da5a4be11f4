use std::{
    fs,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use serde::Serialize;
use xz2::{read::XzDecoder, write::XzEncoder};

use crate::{error::SimError, rng::MtRng, tlb::Vpn};

// On-disk record: vpn then offset, both little-endian u64
const RECORD_SIZE: usize = 16;
const XZ_LEVEL: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TraceRef {
    pub vpn: Vpn,
    /// Byte offset inside the page. Carried along, never looked at by the TLB.
    pub offset: u64,
}

/// Rejects workload parameters the generator cannot honor.
pub(crate) fn check_trace_params(
    n_accesses: usize,
    vpages: u64,
    page_size: u64,
    locality_prob: f64,
    locality_window: u64,
) -> Result<(), SimError> {
    if n_accesses == 0 {
        return Err(SimError::invalid("n_accesses", "must be positive"));
    }
    if vpages == 0 {
        return Err(SimError::invalid("vpages", "must be positive"));
    }
    if page_size == 0 {
        return Err(SimError::invalid("page_size", "must be positive"));
    }
    if !(0.0..=1.0).contains(&locality_prob) {
        return Err(SimError::invalid(
            "locality_prob",
            format!("must lie in [0, 1], got {locality_prob}"),
        ));
    }
    if locality_window == 0 {
        return Err(SimError::invalid("locality_window", "must be positive"));
    }
    if locality_window > i64::MAX as u64 {
        return Err(SimError::invalid(
            "locality_window",
            format!("must not exceed {}", i64::MAX),
        ));
    }
    Ok(())
}

/// Generates a reproducible reference stream with spatial locality.
///
/// With probability `locality_prob` a reference lands within
/// `±locality_window / 2` pages of the current locality center (wrapping
/// modulo `vpages`); otherwise it jumps to a uniform page, which becomes the
/// new center. The stream is reseeded from `seed` on every call.
pub fn generate_trace(
    n_accesses: usize,
    vpages: u64,
    page_size: u64,
    locality_prob: f64,
    locality_window: u64,
    seed: u64,
) -> Result<Vec<TraceRef>, SimError> {
    check_trace_params(n_accesses, vpages, page_size, locality_prob, locality_window)?;

    let mut rng = MtRng::from_seed(seed);
    let half = (locality_window / 2) as i64;
    let mut refs = Vec::with_capacity(n_accesses);
    let mut center = rng.below(vpages);

    for _ in 0..n_accesses {
        let vpn = if rng.random() < locality_prob {
            let delta = rng.range_inclusive(-half, half);
            (center as i128 + delta as i128).rem_euclid(vpages as i128) as Vpn
        } else {
            center = rng.below(vpages);
            center
        };
        let offset = rng.below(page_size);
        refs.push(TraceRef { vpn, offset });
    }

    Ok(refs)
}

pub struct TraceFile;

impl TraceFile {
    /// Writes `refs` as an xz-compressed stream of fixed-size records.
    pub fn write(path: &Path, refs: &[TraceRef]) -> Result<(), SimError> {
        let file = fs::File::create(path)?;
        let mut xz_stream = XzEncoder::new(BufWriter::new(file), XZ_LEVEL);
        for r in refs {
            xz_stream.write_all(&r.vpn.to_le_bytes())?;
            xz_stream.write_all(&r.offset.to_le_bytes())?;
        }
        xz_stream.finish()?.flush()?;
        log::debug!("wrote {} references to {}", refs.len(), path.display());
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Vec<TraceRef>, SimError> {
        let file = fs::File::open(path)?;
        let refs = Self::decode(XzDecoder::new(BufReader::new(file)))?;
        log::debug!("read {} references from {}", refs.len(), path.display());
        Ok(refs)
    }

    fn decode(mut stream: impl Read) -> Result<Vec<TraceRef>, SimError> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes).map_err(|err| match err.kind() {
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
                SimError::Trace(err.to_string())
            }
            _ => SimError::Io(err),
        })?;
        if bytes.len() % RECORD_SIZE != 0 {
            return Err(SimError::Trace(format!(
                "{} trailing bytes after last record",
                bytes.len() % RECORD_SIZE
            )));
        }

        Ok(bytes
            .chunks_exact(RECORD_SIZE)
            .map(|rec| {
                let (vpn, offset) = rec.split_at(RECORD_SIZE / 2);
                TraceRef {
                    vpn: u64::from_le_bytes(vpn.try_into().unwrap_or_default()),
                    offset: u64::from_le_bytes(offset.try_into().unwrap_or_default()),
                }
            })
            .collect())
    }
}
