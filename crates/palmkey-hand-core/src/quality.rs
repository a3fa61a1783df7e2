pub const LUMINOSITY_MIN: f64 = 50.0;
pub const LUMINOSITY_MAX: f64 = 200.0;
pub const BLUR_THRESHOLD: f64 = 500.0;

const SAMPLE_STEP: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMetrics {
    pub luminosity: f64,
    pub blur_variance: f64,
}

impl QualityMetrics {
    pub fn lighting(&self) -> LightingState {
        LightingState::classify(self.luminosity)
    }

    pub fn is_sharp(&self) -> bool {
        is_sharp(self.blur_variance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingState {
    TooDark,
    Normal,
    TooBright,
}

impl LightingState {
    pub fn classify(luminosity: f64) -> Self {
        if luminosity < LUMINOSITY_MIN {
            LightingState::TooDark
        } else if luminosity > LUMINOSITY_MAX {
            LightingState::TooBright
        } else {
            LightingState::Normal
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LightingState::TooDark => "Too Dark",
            LightingState::Normal => "Normal",
            LightingState::TooBright => "Too Bright",
        }
    }

    pub fn feedback(&self) -> Option<&'static str> {
        match self {
            LightingState::TooDark => Some("Lighting is too Low. Find a brighter spot."),
            LightingState::TooBright => Some("Lighting is too Bright. Avoid direct light."),
            LightingState::Normal => None,
        }
    }
}

pub fn is_sharp(blur_variance: f64) -> bool {
    blur_variance > BLUR_THRESHOLD
}

pub fn measure_quality(data: &[u8], width: u32, height: u32) -> QualityMetrics {
    QualityMetrics {
        luminosity: luminosity(data),
        blur_variance: blur_variance(data, width, height),
    }
}

/// Mean perceptual luma over interleaved RGBA pixels. A frame with no
/// complete pixel group measures 0.0 rather than erroring.
pub fn luminosity(data: &[u8]) -> f64 {
    let mut sum = 0.0;
    let mut pixels = 0usize;
    for group in data.chunks_exact(4) {
        let r = group[0] as f64;
        let g = group[1] as f64;
        let b = group[2] as f64;
        sum += 0.299 * r + 0.587 * g + 0.114 * b;
        pixels += 1;
    }
    if pixels > 0 {
        sum / pixels as f64
    } else {
        0.0
    }
}

/// Population variance of a discrete Laplacian sampled on every 4th row and
/// column, skipping a 1-pixel border. Channel 0 of the buffer stands in for
/// luminance. Degenerate frames measure 0.0.
pub fn blur_variance(data: &[u8], width: u32, height: u32) -> f64 {
    let width = width as usize;
    let height = height as usize;
    if width < 3 || height < 3 || data.len() < width * height {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut sq_sum = 0.0;
    let mut count = 0usize;

    let mut y = 1;
    while y < height - 1 {
        let mut x = 1;
        while x < width - 1 {
            let index = y * width + x;
            let pixel = data[index] as i32;
            let left = data[index - 1] as i32;
            let right = data[index + 1] as i32;
            let up = data[index - width] as i32;
            let down = data[index + width] as i32;

            let laplacian = (4 * pixel - (left + right + up + down)) as f64;
            sum += laplacian;
            sq_sum += laplacian * laplacian;
            count += 1;

            x += SAMPLE_STEP;
        }
        y += SAMPLE_STEP;
    }

    if count == 0 {
        return 0.0;
    }

    let mean = sum / count as f64;
    sq_sum / count as f64 - mean * mean
}
