use std::ffi::c_void;

use flume::{Receiver, TryRecvError};
use thiserror::Error;

/// What happens to filtering after a real image lands in the texture.
///
/// Classic GL constraints: only power-of-two textures may repeat-wrap or be
/// mip-filtered. Non-power-of-two images render with clamped coordinates and
/// plain linear minification instead. The quality loss is deliberate, not a
/// bug to fix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MipmapPolicy {
    Generate,
    ClampNoMips,
}

impl MipmapPolicy {
    pub fn for_size(width: u32, height: u32) -> Self {
        if width.is_power_of_two() && height.is_power_of_two() {
            MipmapPolicy::Generate
        } else {
            MipmapPolicy::ClampNoMips
        }
    }
}

pub struct Texture2D {
    id: u32,
}

impl Texture2D {
    /// A 1x1 opaque-blue texture, complete and sampleable the moment this
    /// returns. A single level-0 mip of size 1x1 is already a full chain.
    pub fn placeholder() -> Self {
        let mut id = 0;
        let pixel: [u8; 4] = [0, 0, 255, 255];

        unsafe {
            gl::GenTextures(1, (&mut id) as *mut u32);
            gl::BindTexture(gl::TEXTURE_2D, id);

            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                1,
                1,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixel.as_ptr() as *const c_void,
            );
        }

        Self { id }
    }

    /// Replaces the current contents with `data` (tightly packed RGBA8,
    /// bottom row first) and applies the mipmap policy for the new size.
    pub fn upload_image(&self, width: u32, height: u32, data: &[u8]) -> Result<(), TextureError> {
        if (width as usize * height as usize * 4) != data.len() {
            return Err(TextureError::InvalidSrcLength);
        }

        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.id);

            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                width as i32,
                height as i32,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                data.as_ptr() as *const c_void,
            );

            match MipmapPolicy::for_size(width, height) {
                MipmapPolicy::Generate => {
                    gl::GenerateMipmap(gl::TEXTURE_2D);
                }
                MipmapPolicy::ClampNoMips => {
                    gl::TexParameteri(
                        gl::TEXTURE_2D,
                        gl::TEXTURE_WRAP_S,
                        gl::CLAMP_TO_EDGE as i32,
                    );
                    gl::TexParameteri(
                        gl::TEXTURE_2D,
                        gl::TEXTURE_WRAP_T,
                        gl::CLAMP_TO_EDGE as i32,
                    );
                    gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
                }
            }
        }

        Ok(())
    }

    pub fn bind(&self, unit: u8) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + unit as u32);
            gl::BindTexture(gl::TEXTURE_2D, self.id)
        }
    }
}

impl Drop for Texture2D {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, (&self.id) as *const u32);
        }
    }
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Invalid source data length")]
    InvalidSrcLength,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// RGBA8 pixels ready for GL, already flipped to its bottom-up row order.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub(crate) fn decode_image(bytes: &[u8]) -> Result<DecodedImage, FetchError> {
    let image = image::load_from_memory(bytes)?.flipv().into_rgba8();

    let (width, height) = image.dimensions();

    Ok(DecodedImage {
        width,
        height,
        pixels: image.into_raw(),
    })
}

/// Where a remote texture is in its life. Transitions only move forward:
/// `Fetching` ends in either `Uploaded` or `FetchFailed` and then never
/// changes again.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextureState {
    Placeholder,
    Fetching,
    Uploaded,
    FetchFailed,
}

impl TextureState {
    /// The single forward step: `Fetching` resolves to one of the two
    /// terminal states, exactly once. Every other state is already final
    /// and ignores the outcome.
    fn resolve(self, succeeded: bool) -> TextureState {
        match self {
            TextureState::Fetching => {
                if succeeded {
                    TextureState::Uploaded
                } else {
                    TextureState::FetchFailed
                }
            }
            other => other,
        }
    }
}

/// A texture that is usable immediately and swaps in a remote image once the
/// fetch lands.
///
/// The HTTP round-trip and the image decode run on ehttp's background
/// thread; the finished pixels come back over a channel and are uploaded
/// from [`poll`](Self::poll) on the GL thread. A frame rendered before the
/// handoff samples the blue placeholder, a frame rendered after samples the
/// image, and nothing in between is observable.
///
/// There is no cancellation and no retry: a failed fetch is logged once and
/// the placeholder stays forever.
pub struct RemoteTexture {
    texture: Texture2D,
    state: TextureState,
    pending: Option<Receiver<Result<DecodedImage, FetchError>>>,
}

impl RemoteTexture {
    pub fn load(url: &str) -> Self {
        let texture = Texture2D::placeholder();

        let (tx, rx) = flume::bounded(1);

        ehttp::fetch(ehttp::Request::get(url), move |result| {
            let decoded = result
                .map_err(FetchError::Network)
                .and_then(|response| {
                    if response.ok {
                        Ok(response)
                    } else {
                        Err(FetchError::Status(response.status))
                    }
                })
                .and_then(|response| decode_image(&response.bytes));

            // the receiver may be gone if the scene was torn down
            let _ = tx.send(decoded);
        });

        Self {
            texture,
            state: TextureState::Fetching,
            pending: Some(rx),
        }
    }

    /// Wraps an already-resident placeholder with no fetch in flight.
    pub fn placeholder_only() -> Self {
        Self {
            texture: Texture2D::placeholder(),
            state: TextureState::Placeholder,
            pending: None,
        }
    }

    pub fn state(&self) -> TextureState {
        self.state
    }

    pub fn bind(&self, unit: u8) {
        self.texture.bind(unit)
    }

    /// Runs once per frame on the GL thread. Picks up the fetch result if
    /// one arrived and moves the state machine one step forward; a frame in
    /// which nothing arrived leaves everything untouched.
    pub fn poll(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };

        let succeeded = match rx.try_recv() {
            Ok(Ok(image)) => {
                match self.texture.upload_image(image.width, image.height, &image.pixels) {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("texture upload rejected: {e}");
                        false
                    }
                }
            }
            Ok(Err(e)) => {
                log::warn!("texture fetch failed, keeping placeholder: {e}");
                false
            }
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                log::warn!("texture fetch dropped without a result, keeping placeholder");
                false
            }
        };

        self.state = self.state.resolve(succeeded);
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn mipmap_policy_for_power_of_two() {
        assert_eq!(MipmapPolicy::for_size(2, 2), MipmapPolicy::Generate);
        assert_eq!(MipmapPolicy::for_size(256, 64), MipmapPolicy::Generate);
    }

    #[test]
    fn mipmap_policy_for_odd_sizes() {
        assert_eq!(MipmapPolicy::for_size(3, 3), MipmapPolicy::ClampNoMips);
        assert_eq!(MipmapPolicy::for_size(2, 3), MipmapPolicy::ClampNoMips);
        assert_eq!(MipmapPolicy::for_size(640, 480), MipmapPolicy::ClampNoMips);
        // zero is not a power of two, unlike the naive bit trick
        assert_eq!(MipmapPolicy::for_size(0, 2), MipmapPolicy::ClampNoMips);
    }

    #[test]
    fn decode_flips_rows_for_gl() {
        let mut source = RgbaImage::new(2, 2);
        source.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        source.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        source.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        source.put_pixel(1, 1, Rgba([255, 255, 255, 255]));

        let mut bytes = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();

        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.pixels.len(), 16);
        // bottom source row comes first after the flip
        assert_eq!(&decoded.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&decoded.pixels[8..12], &[255, 0, 0, 255]);
    }

    #[test]
    fn fetching_resolves_exactly_once() {
        assert_eq!(
            TextureState::Fetching.resolve(true),
            TextureState::Uploaded
        );
        assert_eq!(
            TextureState::Fetching.resolve(false),
            TextureState::FetchFailed
        );
    }

    #[test]
    fn resolved_states_are_terminal() {
        // a later outcome can never move a resolved texture again
        assert_eq!(
            TextureState::Uploaded.resolve(false),
            TextureState::Uploaded
        );
        assert_eq!(
            TextureState::FetchFailed.resolve(true),
            TextureState::FetchFailed
        );
        // and a texture with no fetch in flight stays on the placeholder
        assert_eq!(
            TextureState::Placeholder.resolve(true),
            TextureState::Placeholder
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode_image(&[0x00, 0x01, 0x02, 0x03]),
            Err(FetchError::Decode(_))
        ));
    }
}
