use std::sync::OnceLock;

/// Largest linear-light channel value (`255 * 127`, fits in 15 bits).
pub const LINEAR_MAX: u32 = 32385;

const LINEAR_LEN: usize = LINEAR_MAX as usize + 1;

static GAMMA_LUT: OnceLock<GammaLut> = OnceLock::new();

/// sRGB <-> linear-light integer tables.
///
/// `forward` maps an sRGB byte to `[0, LINEAR_MAX]` and is strictly increasing. `inverse`
/// covers every linear value with the nearest sRGB byte, so `inverse[forward[b]] == b`.
pub struct GammaLut {
    forward: [u32; 256],
    inverse: Box<[u8]>,
}

impl std::fmt::Debug for GammaLut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GammaLut")
            .field("forward_len", &self.forward.len())
            .field("inverse_len", &self.inverse.len())
            .finish()
    }
}

impl GammaLut {
    /// Process-wide tables, built on first use.
    pub fn get() -> &'static GammaLut {
        GAMMA_LUT.get_or_init(Self::build)
    }

    fn build() -> Self {
        let scale = f64::from(LINEAR_MAX);

        let mut forward = [0u32; 256];
        for (b, slot) in forward.iter_mut().enumerate() {
            *slot = (srgb_to_linear(b as f64 / 255.0) * scale + 0.5).floor() as u32;
        }

        let inverse = (0..LINEAR_LEN)
            .map(|l| {
                let s = linear_to_srgb(l as f64 / scale);
                (s * 255.0 + 0.5).floor().clamp(0.0, 255.0) as u8
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        tracing::debug!(inverse_len = inverse.len(), "built gamma tables");
        Self { forward, inverse }
    }

    /// sRGB byte (low 8 bits of `c`) to linear light.
    #[inline(always)]
    pub fn to_linear(&self, c: u32) -> u32 {
        self.forward[(c & 0xFF) as usize]
    }

    /// Linear light in `[0, LINEAR_MAX]` back to an sRGB byte.
    #[inline(always)]
    pub fn to_srgb(&self, l: u32) -> u32 {
        u32::from(self.inverse[l as usize])
    }

    /// The 256-entry forward table.
    pub fn forward(&self) -> &[u32; 256] {
        &self.forward
    }

    /// The `LINEAR_MAX + 1` entry inverse table.
    pub fn inverse(&self) -> &[u8] {
        &self.inverse
    }
}

fn srgb_to_linear(x: f64) -> f64 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(x: f64) -> f64 {
    if x <= 0.003_130_8 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
#[path = "../../tests/unit/lut/gamma.rs"]
mod tests;
