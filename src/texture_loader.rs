use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use exif::{In, Reader, Tag, Value};
use raylib::prelude::*;
use tracing::{debug, warn};

use crate::error::MediaError;

/// Encoded image bytes fetched off the render thread.
#[derive(Debug)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub file_type: String,
    pub orientation: u16,
}

// --- Helper: Resolve a URI to bytes (http(s), file:// or plain path) ---
pub fn fetch_image(uri: &str) -> Result<FetchedImage, MediaError> {
    let bytes = if uri.starts_with("http://") || uri.starts_with("https://") {
        let response = reqwest::blocking::get(uri).map_err(|e| MediaError::fetch(uri, e))?;
        if !response.status().is_success() {
            return Err(MediaError::fetch(uri, format!("HTTP {}", response.status())));
        }
        response
            .bytes()
            .map_err(|e| MediaError::fetch(uri, e))?
            .to_vec()
    } else {
        fs::read(local_path(uri)).map_err(|source| MediaError::Io {
            uri: uri.to_string(),
            source,
        })?
    };

    let file_type = sniff_file_type(&bytes)
        .map(str::to_string)
        .or_else(|| uri_extension(uri).map(|ext| format!(".{ext}")))
        .ok_or_else(|| MediaError::decode(uri, "unknown image format"))?;
    let orientation = read_orientation(&bytes);

    Ok(FetchedImage {
        bytes,
        file_type,
        orientation,
    })
}

pub fn local_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

fn uri_extension(uri: &str) -> Option<String> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// File type hint for raylib, taken from the leading magic bytes.
pub fn sniff_file_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG") {
        Some(".png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(".jpg")
    } else if bytes.starts_with(b"GIF8") {
        Some(".gif")
    } else if bytes.starts_with(b"BM") {
        Some(".bmp")
    } else if bytes.starts_with(b"qoif") {
        Some(".qoi")
    } else {
        None
    }
}

/// EXIF orientation tag, 1 (no rotation) when absent or unreadable.
pub fn read_orientation(bytes: &[u8]) -> u16 {
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => match exif.get_field(Tag::Orientation, In::PRIMARY).map(|f| &f.value) {
            Some(Value::Short(values)) => values.first().copied().unwrap_or(1),
            _ => 1,
        },
        Err(_) => 1,
    }
}

// --- Decode fetched bytes, apply EXIF rotation, create texture ---
pub fn load_texture(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    uri: &str,
    fetched: &FetchedImage,
) -> Result<Texture2D, MediaError> {
    let mut image = Image::load_image_from_mem(&fetched.file_type, &fetched.bytes)
        .map_err(|e| MediaError::decode(uri, format!("{e:?}")))?;

    // 3 = 180 deg, 6 = 90 deg CW, 8 = 90 deg CCW; flips are ignored
    match fetched.orientation {
        3 => {
            image.rotate_cw();
            image.rotate_cw();
        }
        6 => image.rotate_cw(),
        8 => image.rotate_ccw(),
        _ => {}
    }

    rl.load_texture_from_image(thread, &image)
        .map_err(|e| MediaError::decode(uri, format!("{e:?}")))
}

enum LoadState {
    Pending(Receiver<Result<FetchedImage, MediaError>>),
    Ready(Texture2D),
    Failed,
}

/// Image fetched on a worker thread and uploaded once the bytes arrive.
pub struct ImageLoader {
    uri: String,
    state: LoadState,
}

impl ImageLoader {
    pub fn spawn(uri: &str) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker_uri = uri.to_string();
        thread::spawn(move || {
            // The receiver is gone if the scene ended first.
            let _ = tx.send(fetch_image(&worker_uri));
        });
        Self {
            uri: uri.to_string(),
            state: LoadState::Pending(rx),
        }
    }

    /// Uploads the texture if the worker has finished. True once drawable.
    pub fn poll(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) -> bool {
        if let LoadState::Pending(rx) = &self.state {
            let outcome = match rx.try_recv() {
                Ok(fetched) => {
                    fetched.and_then(|fetched| load_texture(rl, thread, &self.uri, &fetched))
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    Err(MediaError::fetch(&self.uri, "loader thread exited"))
                }
            };
            self.state = match outcome {
                Ok(texture) => {
                    debug!(uri = %self.uri, width = texture.width(), height = texture.height(), "image ready");
                    LoadState::Ready(texture)
                }
                Err(e) => {
                    warn!("image will not be shown: {e}");
                    LoadState::Failed
                }
            };
        }
        self.texture().is_some()
    }

    pub fn texture(&self) -> Option<&Texture2D> {
        match &self.state {
            LoadState::Ready(texture) if texture.width() > 0 && texture.height() > 0 => {
                Some(texture)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_file_type(b"\x89PNG\r\n\x1a\n...."), Some(".png"));
        assert_eq!(sniff_file_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(".jpg"));
        assert_eq!(sniff_file_type(b"GIF89a"), Some(".gif"));
        assert_eq!(sniff_file_type(b"<html>"), None);
    }

    #[test]
    fn file_uris_map_to_paths() {
        assert_eq!(local_path("file:///tmp/a.png"), PathBuf::from("/tmp/a.png"));
        assert_eq!(local_path("assets/b.jpg"), PathBuf::from("assets/b.jpg"));
    }

    #[test]
    fn uri_extension_ignores_query() {
        assert_eq!(uri_extension("http://h/x/1*abc.JPEG?w=2"), Some("jpeg".to_string()));
        assert_eq!(uri_extension("http://h/x/noext"), None);
    }

    #[test]
    fn orientation_defaults_without_exif() {
        assert_eq!(read_orientation(b"\x89PNG\r\n\x1a\n"), 1);
        assert_eq!(read_orientation(&[]), 1);
    }

    #[test]
    fn fetch_reads_local_files_and_reports_missing_ones() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG\r\n\x1a\nrest").unwrap();
        let uri = format!("file://{}", file.path().display());

        let fetched = fetch_image(&uri).unwrap();
        assert_eq!(fetched.file_type, ".png");
        assert_eq!(fetched.orientation, 1);
        assert_eq!(fetched.bytes.len(), 12);

        let err = fetch_image("/no/such/image.png").unwrap_err();
        assert!(matches!(err, MediaError::Io { .. }));
    }
}
