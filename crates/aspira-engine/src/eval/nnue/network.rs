//! Network weights, file loading and the forward pass.
//!
//! ## File layout (little-endian)
//!
//! ```text
//! u32              hidden width H
//! u32              input features (must be 768)
//! i16[768 * H]     feature weights, feature-major       (scale QA)
//! i16[H]           feature bias                         (scale QA)
//! i16[2 * H]       output weights, side to move first   (scale QB)
//! i16              output bias                          (scale QA * QB)
//! ```

use std::fmt;
use std::path::Path;

use super::NnueError;
use super::features::FEATURES;

/// Widest hidden layer the fixed-size accumulators can hold.
pub const MAX_HIDDEN: usize = 1024;

const HEADER_BYTES: usize = 8;

/// First-layer quantization.
const QA: i32 = 255;

/// Output-layer quantization.
const QB: i32 = 64;

/// Maps the dequantized output to centipawns.
const SCALE: i32 = 400;

/// A quantized (768 -> H) x 2 -> 1 perspective network.
pub struct Network {
    hidden: usize,
    feature_weights: Box<[i16]>,
    feature_bias: Box<[i16]>,
    output_weights: Box<[i16]>,
    output_bias: i16,
}

impl Network {
    /// Read and validate a network file.
    pub fn load(path: impl AsRef<Path>) -> Result<Network, NnueError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| NnueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let net = Network::from_bytes(&bytes)?;
        tracing::debug!(path = %path.display(), hidden = net.hidden, "network loaded");
        Ok(net)
    }

    /// Parse a network from its file image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Network, NnueError> {
        if bytes.len() < HEADER_BYTES {
            return Err(NnueError::Truncated { len: bytes.len() });
        }
        let hidden = read_u32(&bytes[0..4]) as usize;
        let features = read_u32(&bytes[4..8]);
        if features as usize != FEATURES {
            return Err(NnueError::FeatureCount(features));
        }
        if hidden == 0 {
            return Err(NnueError::ZeroHidden);
        }
        if hidden > MAX_HIDDEN {
            return Err(NnueError::HiddenTooWide { hidden, max: MAX_HIDDEN });
        }

        let values = FEATURES * hidden + hidden + 2 * hidden + 1;
        let expected = HEADER_BYTES + 2 * values;
        if bytes.len() != expected {
            return Err(NnueError::Size { hidden, expected, actual: bytes.len() });
        }

        let mut words = bytes[HEADER_BYTES..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]));
        let mut take = |n: usize| -> Box<[i16]> { words.by_ref().take(n).collect() };

        let feature_weights = take(FEATURES * hidden);
        let feature_bias = take(hidden);
        let output_weights = take(2 * hidden);
        let output_bias = take(1)[0];

        Ok(Network { hidden, feature_weights, feature_bias, output_weights, output_bias })
    }

    #[inline]
    pub fn hidden(&self) -> usize {
        self.hidden
    }

    #[inline]
    pub(crate) fn feature_weights(&self, feature: usize) -> &[i16] {
        &self.feature_weights[feature * self.hidden..(feature + 1) * self.hidden]
    }

    #[inline]
    pub(crate) fn feature_bias(&self) -> &[i16] {
        &self.feature_bias
    }

    /// Forward pass with SCReLU. Centipawns from the `us` perspective.
    pub(crate) fn forward(&self, us: &[i32], them: &[i32]) -> i32 {
        let (own, other) = self.output_weights.split_at(self.hidden);
        let mut output: i64 = 0;
        for (&x, &w) in us.iter().zip(own) {
            output += i64::from(screlu(x)) * i64::from(w);
        }
        for (&x, &w) in them.iter().zip(other) {
            output += i64::from(screlu(x)) * i64::from(w);
        }
        // QA * QA * QB -> QA * QB, then bias, then to centipawns.
        output /= i64::from(QA);
        output += i64::from(self.output_bias);
        output *= i64::from(SCALE);
        output /= i64::from(QA * QB);
        output as i32
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network").field("hidden", &self.hidden).finish_non_exhaustive()
    }
}

#[inline]
fn screlu(x: i32) -> i32 {
    let y = x.clamp(0, QA);
    y * y
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
