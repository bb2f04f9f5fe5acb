use std::io;

use fbmux_vt::Rgb;

/// A rectangle of pixels that can be written, saved and put back.
pub trait Surface {
    fn height(&self) -> usize;
    fn width(&self) -> usize;

    /// Set the pixel at `(y, x)`; out of range writes are dropped.
    fn set_pixel(&mut self, y: usize, x: usize, color: Rgb);

    fn fill(&mut self, y: usize, x: usize, height: usize, width: usize, color: Rgb) {
        let bottom = (y + height).min(self.height());
        let right = (x + width).min(self.width());
        for py in y..bottom {
            for px in x..right {
                self.set_pixel(py, px, color);
            }
        }
    }

    /// Copy out every pixel.
    fn save(&self) -> Vec<u8>;

    /// Put back pixels from [`Surface::save`]; fails on a size mismatch.
    fn load(&mut self, pixels: &[u8]) -> bool;

    /// Reprogram the color map where the hardware needs one.
    fn reload_colormap(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A surface in memory, `0xRRGGBB` per pixel.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    height: usize,
    width: usize,
    pixels: Vec<u32>,
}

impl PixelBuffer {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            pixels: vec![0; height * width],
        }
    }

    pub fn pixel(&self, y: usize, x: usize) -> Rgb {
        Rgb::from_u32(self.pixels[y * self.width + x])
    }
}

impl Surface for PixelBuffer {
    fn height(&self) -> usize {
        self.height
    }

    fn width(&self) -> usize {
        self.width
    }

    fn set_pixel(&mut self, y: usize, x: usize, color: Rgb) {
        if y < self.height && x < self.width {
            self.pixels[y * self.width + x] = color.to_u32();
        }
    }

    fn save(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_ne_bytes()).collect()
    }

    fn load(&mut self, pixels: &[u8]) -> bool {
        if pixels.len() != self.pixels.len() * 4 {
            return false;
        }
        for (dst, src) in self.pixels.iter_mut().zip(pixels.chunks_exact(4)) {
            *dst = u32::from_ne_bytes([src[0], src[1], src[2], src[3]]);
        }
        true
    }
}
