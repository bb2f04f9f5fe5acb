//! Linux fbdev access: screen info ioctls, the pixel mapping and the color map.

use std::fs::{File, OpenOptions};
use std::io;
use std::num::NonZeroUsize;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;

use fbmux_vt::Rgb;
use nix::libc::{c_char, c_ulong, c_void};
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};

use crate::surface::Surface;

const FB_VISUAL_TRUECOLOR: u32 = 2;
const FB_VISUAL_DIRECTCOLOR: u32 = 4;

#[repr(C)]
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

#[repr(C)]
#[allow(dead_code)]
#[derive(Clone, Copy, Debug, Default)]
struct FbFixScreeninfo {
    id: [c_char; 16],
    smem_start: c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

#[repr(C)]
#[allow(dead_code)]
struct FbCmap {
    start: u32,
    len: u32,
    red: *mut u16,
    green: *mut u16,
    blue: *mut u16,
    transp: *mut u16,
}

nix::ioctl_read_bad!(fbioget_vscreeninfo, 0x4600, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, 0x4602, FbFixScreeninfo);
nix::ioctl_write_ptr_bad!(fbioputcmap, 0x4605, FbCmap);

#[derive(Debug, thiserror::Error)]
pub enum FbError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("screen info ioctl failed: {0}")]
    Info(nix::errno::Errno),
    #[error("cannot map the framebuffer: {0}")]
    Map(nix::errno::Errno),
    #[error("unsupported pixel depth of {0} bits")]
    Depth(u32),
    #[error("framebuffer memory is smaller than the visible screen")]
    Size,
}

/// How one color channel is packed into a pixel.
#[derive(Clone, Copy, Debug)]
struct Channel {
    offset: u32,
    length: u32,
}

impl Channel {
    fn pack(self, value: u8) -> u32 {
        let length = self.length.min(8);
        ((value as u32) >> (8 - length)) << self.offset
    }

    /// A linear ramp over the channel's levels.
    fn ramp(self) -> Vec<u16> {
        let levels = 1usize << self.length.min(16);
        (0..levels)
            .map(|i| (i * 0xffff / (levels - 1).max(1)) as u16)
            .collect()
    }
}

impl From<FbBitfield> for Channel {
    fn from(b: FbBitfield) -> Self {
        Self {
            offset: b.offset,
            length: b.length,
        }
    }
}

/// A mapped framebuffer device.
pub struct Framebuffer {
    file: File,
    map: NonNull<c_void>,
    map_len: usize,
    /// Byte offset of the visible screen in the mapping.
    start: usize,
    height: usize,
    width: usize,
    bytes_per_pixel: usize,
    line_length: usize,
    channels: [Channel; 3],
    direct_color: bool,
}

impl Framebuffer {
    /// Open and map the framebuffer at `path`.
    pub fn open(path: &Path) -> Result<Self, FbError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| FbError::Open {
                path: path.display().to_string(),
                source,
            })?;

        let mut var = FbVarScreeninfo::default();
        let mut fix = FbFixScreeninfo::default();
        // SAFETY: both structs match the kernel layout and outlive the calls.
        unsafe {
            fbioget_vscreeninfo(file.as_raw_fd(), &mut var).map_err(FbError::Info)?;
            fbioget_fscreeninfo(file.as_raw_fd(), &mut fix).map_err(FbError::Info)?;
        }

        let bytes_per_pixel = match var.bits_per_pixel {
            16 | 24 | 32 => var.bits_per_pixel as usize / 8,
            other => return Err(FbError::Depth(other)),
        };
        let line_length = fix.line_length as usize;
        let start = var.yoffset as usize * line_length + var.xoffset as usize * bytes_per_pixel;
        let height = var.yres as usize;
        let width = var.xres as usize;
        let map_len = fix.smem_len as usize;
        if start + height * line_length > map_len {
            return Err(FbError::Size);
        }
        let len = NonZeroUsize::new(map_len).ok_or(FbError::Size)?;

        // SAFETY: a fresh shared mapping of the device; unmapped in Drop.
        let map = unsafe {
            mmap(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                0,
            )
        }
        .map_err(FbError::Map)?;

        log::info!(
            "framebuffer {}: {width}x{height}, {} bpp, visual {}",
            path.display(),
            var.bits_per_pixel,
            fix.visual
        );
        if fix.visual != FB_VISUAL_TRUECOLOR && fix.visual != FB_VISUAL_DIRECTCOLOR {
            log::warn!("unexpected framebuffer visual {}", fix.visual);
        }

        let mut fb = Self {
            file,
            map,
            map_len,
            start,
            height,
            width,
            bytes_per_pixel,
            line_length,
            channels: [var.red.into(), var.green.into(), var.blue.into()],
            direct_color: fix.visual == FB_VISUAL_DIRECTCOLOR,
        };
        if let Err(e) = fb.reload_colormap() {
            log::warn!("cannot set the color map: {e}");
        }
        Ok(fb)
    }

    fn memory(&self) -> &[u8] {
        // SAFETY: `map` points to `map_len` mapped bytes owned by `self`.
        unsafe { std::slice::from_raw_parts(self.map.as_ptr() as *const u8, self.map_len) }
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `memory`, and `&mut self` makes the access exclusive.
        unsafe { std::slice::from_raw_parts_mut(self.map.as_ptr() as *mut u8, self.map_len) }
    }

    fn pack(&self, color: Rgb) -> u32 {
        let [r, g, b] = self.channels;
        r.pack(color.r) | g.pack(color.g) | b.pack(color.b)
    }

    fn visible_len(&self) -> usize {
        self.height * self.line_length
    }
}

impl Surface for Framebuffer {
    fn height(&self) -> usize {
        self.height
    }

    fn width(&self) -> usize {
        self.width
    }

    fn set_pixel(&mut self, y: usize, x: usize, color: Rgb) {
        if y >= self.height || x >= self.width {
            return;
        }
        let bpp = self.bytes_per_pixel;
        let at = self.start + y * self.line_length + x * bpp;
        let bytes = self.pack(color).to_ne_bytes();
        self.memory_mut()[at..at + bpp].copy_from_slice(&bytes[..bpp]);
    }

    fn fill(&mut self, y: usize, x: usize, height: usize, width: usize, color: Rgb) {
        let bottom = (y + height).min(self.height);
        let right = (x + width).min(self.width);
        if x >= right {
            return;
        }
        let bpp = self.bytes_per_pixel;
        let packed = self.pack(color).to_ne_bytes();
        let row: Vec<u8> = (x..right).flat_map(|_| packed[..bpp].iter().copied()).collect();
        for py in y..bottom {
            let at = self.start + py * self.line_length + x * bpp;
            self.memory_mut()[at..at + row.len()].copy_from_slice(&row);
        }
    }

    fn save(&self) -> Vec<u8> {
        self.memory()[self.start..self.start + self.visible_len()].to_vec()
    }

    fn load(&mut self, pixels: &[u8]) -> bool {
        let (start, len) = (self.start, self.visible_len());
        if pixels.len() != len {
            return false;
        }
        self.memory_mut()[start..start + len].copy_from_slice(pixels);
        true
    }

    /// Direct-color devices get a linear ramp per channel.
    fn reload_colormap(&mut self) -> io::Result<()> {
        if !self.direct_color {
            return Ok(());
        }
        let [r, g, b] = self.channels;
        let (mut red, mut green, mut blue) = (r.ramp(), g.ramp(), b.ramp());
        let len = red.len().max(green.len()).max(blue.len());
        for ramp in [&mut red, &mut green, &mut blue] {
            let last = ramp.last().copied().unwrap_or(0xffff);
            ramp.resize(len, last);
        }
        let cmap = FbCmap {
            start: 0,
            len: len as u32,
            red: red.as_mut_ptr(),
            green: green.as_mut_ptr(),
            blue: blue.as_mut_ptr(),
            transp: std::ptr::null_mut(),
        };
        // SAFETY: the three ramps hold `len` entries and outlive the call.
        unsafe { fbioputcmap(self.file.as_raw_fd(), &cmap) }.map_err(io::Error::from)?;
        Ok(())
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        // SAFETY: `map` came from `mmap` with `map_len` and is not used after this.
        if let Err(e) = unsafe { munmap(self.map, self.map_len) } {
            log::debug!("munmap: {e}");
        }
    }
}
