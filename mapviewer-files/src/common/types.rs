/// Packed 0xRRGGBB colour as stored in the config archives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Rgb(pub u32);

impl Rgb {
    pub fn r(&self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    pub fn g(&self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub fn b(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

/// Hue, saturation and lightness, each quantized into 0..=255 as the engine expects them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Hsl {
    pub hue: u8,
    pub saturation: u8,
    pub lightness: u8,
}

impl From<Rgb> for Hsl {
    fn from(rgb: Rgb) -> Self {
        let r = rgb.r() as f64 / 256.0;
        let g = rgb.g() as f64 / 256.0;
        let b = rgb.b() as f64 / 256.0;

        let min = r.min(g).min(b);
        let max = r.max(g).max(b);

        let mut hue = 0.0;
        let mut saturation = 0.0;
        let lightness = (min + max) / 2.0;

        if min != max {
            let delta = max - min;
            saturation = if lightness < 0.5 {
                delta / (max + min)
            } else {
                delta / (2.0 - max - min)
            };

            if r == max {
                hue = (g - b) / delta;
            } else if g == max {
                hue = 2.0 + (b - r) / delta;
            } else {
                hue = 4.0 + (r - g) / delta;
            }
        }

        hue /= 6.0;
        if hue < 0.0 {
            hue += 1.0;
        }

        let quantize = |value: f64| (value * 256.0).clamp(0.0, 255.0) as u8;
        Hsl {
            hue: quantize(hue),
            saturation: quantize(saturation),
            lightness: quantize(lightness),
        }
    }
}
