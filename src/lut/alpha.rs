use std::sync::OnceLock;

use crate::lut::gamma::LINEAR_MAX;

/// Number of luminance buckets per axis.
pub const LUMINANCE_BUCKETS: usize = 16;

/// Raw alpha -> corrected alpha for one (source, destination) bucket pair.
pub type AlphaTable = [u8; 256];

/// All destination-bucket tables for one source bucket.
pub type SourceAlphaTables = [AlphaTable; LUMINANCE_BUCKETS];

static ALPHA_LUT: OnceLock<AlphaLut> = OnceLock::new();

/// 4-bit luminance bucket of a linear-light color.
///
/// Rec.709 weights in 8-bit fixed point (`54 + 183 + 19 == 256`), so `y <= LINEAR_MAX` and
/// `y >> 11` is always in `0..16`.
#[inline(always)]
pub fn luminance_bucket(r: u32, g: u32, b: u32) -> usize {
    let y = (54 * r + 183 * g + 19 * b) >> 8;
    (y >> 11) as usize & (LUMINANCE_BUCKETS - 1)
}

/// Perceptual alpha correction tables, indexed `[source bucket][destination bucket][alpha]`.
///
/// Linear-light blending makes light-on-dark coverage look too heavy and dark-on-light too
/// thin. Each table maps a raw alpha `t` to the linear alpha that lands on the luminance a
/// CIE L* interpolation between the two bucket luminances would give at `t`. Equal buckets
/// get the identity. Every table is monotonic with `t[0] == 0` and `t[255] == 255`.
pub struct AlphaLut {
    tables: Box<[SourceAlphaTables]>,
}

impl std::fmt::Debug for AlphaLut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaLut")
            .field("buckets", &self.tables.len())
            .finish()
    }
}

impl AlphaLut {
    /// Process-wide tables, built on first use.
    pub fn get() -> &'static AlphaLut {
        ALPHA_LUT.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut tables = vec![[[0u8; 256]; LUMINANCE_BUCKETS]; LUMINANCE_BUCKETS];
        for (ls, src_tables) in tables.iter_mut().enumerate() {
            for (ld, table) in src_tables.iter_mut().enumerate() {
                fill_table(table, ls, ld);
            }
        }
        tracing::debug!("built alpha correction tables");
        Self {
            tables: tables.into_boxed_slice(),
        }
    }

    /// Tables for a source luminance bucket; index the result by destination bucket.
    #[inline(always)]
    pub fn source_tables(&self, ls: usize) -> &SourceAlphaTables {
        &self.tables[ls & (LUMINANCE_BUCKETS - 1)]
    }

    /// Table for a (source, destination) bucket pair.
    pub fn table(&self, ls: usize, ld: usize) -> &AlphaTable {
        &self.source_tables(ls)[ld & (LUMINANCE_BUCKETS - 1)]
    }
}

fn fill_table(table: &mut AlphaTable, ls: usize, ld: usize) {
    if ls == ld {
        for (a, slot) in table.iter_mut().enumerate() {
            *slot = a as u8;
        }
        return;
    }

    let ys = bucket_luminance(ls);
    let yd = bucket_luminance(ld);
    let (l_src, l_dst) = (lstar(ys), lstar(yd));

    for (a, slot) in table.iter_mut().enumerate() {
        let t = a as f64 / 255.0;
        let y = lstar_to_y(l_dst + (l_src - l_dst) * t);
        let corrected = ((y - yd) / (ys - yd)).clamp(0.0, 1.0);
        *slot = (corrected * 255.0 + 0.5).floor() as u8;
    }
    table[0] = 0;
    table[255] = 255;
}

/// Linear luminance (0..1) at the middle of a bucket's `[k << 11, (k + 1) << 11)` span.
fn bucket_luminance(bucket: usize) -> f64 {
    let lo = (bucket as u32) << 11;
    let hi = (lo + (1 << 11)).min(LINEAR_MAX + 1);
    f64::from(lo + hi) / 2.0 / f64::from(LINEAR_MAX)
}

const CIE_EPSILON: f64 = 216.0 / 24389.0;
const CIE_KAPPA: f64 = 24389.0 / 27.0;

fn lstar(y: f64) -> f64 {
    if y > CIE_EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        CIE_KAPPA * y
    }
}

fn lstar_to_y(l: f64) -> f64 {
    if l > CIE_KAPPA * CIE_EPSILON {
        let f = (l + 16.0) / 116.0;
        f * f * f
    } else {
        l / CIE_KAPPA
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lut/alpha.rs"]
mod tests;
