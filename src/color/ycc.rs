use super::Rgb;

/// Limited-range luma/chroma triple, every component in [0, 1]
///
/// Cb and Cr sit around 128/255 for neutral colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ycc {
    pub y: f32,
    pub cb: f32,
    pub cr: f32,
}

/// Chroma moved to [-1, 1] so that neutral colours sit at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenteredChroma {
    pub cb: f32,
    pub cr: f32,
}

impl CenteredChroma {
    pub fn is_origin(&self) -> bool {
        self.cb.abs() <= f32::EPSILON && self.cr.abs() <= f32::EPSILON
    }
}

/// Convert normalized RGB into the BT.709-derived keying YCC variant
///
/// Y lands in 16..235 and Cb/Cr in 16..240 on the 0-255 scale before being
/// divided back down to [0, 1].
pub fn to_ycc(rgb: Rgb) -> Ycc {
    let sr = 255.0 * rgb[0];
    let sg = 255.0 * rgb[1];
    let sb = 255.0 * rgb[2];

    let y = (0.183 * sr) + (0.614 * sg) + (0.062 * sb) + 16.0;
    let cb = (-0.101 * sr) - (0.338 * sg) + (0.439 * sb) + 128.0;
    let cr = (0.439 * sr) - (0.399 * sg) - (0.040 * sb) + 128.0;

    Ycc {
        y: y / 255.0,
        cb: cb / 255.0,
        cr: cr / 255.0,
    }
}

#[inline]
pub fn recenter_chroma(ycc: Ycc) -> CenteredChroma {
    CenteredChroma {
        cb: ycc.cb * 2.0 - 1.0,
        cr: ycc.cr * 2.0 - 1.0,
    }
}
