use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use raylib::prelude::*;
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::error::MediaError;
use crate::media::{VideoControl, VideoOptions};

const PAUSE_POLL: Duration = Duration::from_millis(10);

/// Pipes rendered frames into an ffmpeg process that encodes an MP4.
pub struct Encoder {
    process: Child,
    stdin: Option<ChildStdin>,
}

impl Encoder {
    pub fn new(width: i32, height: i32, fps: u32, output: &Path) -> Result<Encoder, MediaError> {
        let mut process = Command::new("ffmpeg")
            .stdin(Stdio::piped())
            .args(["-loglevel", "error"])
            .arg("-y")
            .args(["-f", "rawvideo"])
            .args(["-pixel_format", "rgba"])
            .args(["-video_size", &format!("{}x{}", width, height)])
            .args(["-framerate", &format!("{}", fps)])
            .args(["-i", "-"])
            .args(["-c:v", "libx264"])
            .args(["-pix_fmt", "yuv420p"])
            .arg(output)
            .spawn()
            .map_err(MediaError::Spawn)?;
        let stdin = process.stdin.take();
        info!(output = %output.display(), "recording started");
        Ok(Encoder { process, stdin })
    }

    /// Writes one framebuffer readback. Rows arrive bottom-up from the GPU,
    /// ffmpeg expects them top-down.
    pub fn write(&mut self, image: &Image) -> std::io::Result<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(std::io::Error::other("ffmpeg stdin closed"));
        };
        let width = image.width() as usize;
        let height = image.height() as usize;
        let row_len = width * 4; // 4 bytes per pixel (RGBA)
        // SAFETY: a framebuffer readback is RGBA8 with width * height pixels.
        let pixels =
            unsafe { std::slice::from_raw_parts(image.data() as *const u8, row_len * height) };
        for row in pixels.chunks_exact(row_len).rev() {
            stdin.write_all(row)?;
        }
        Ok(())
    }

    /// Closes the pipe and waits for ffmpeg to finish the file.
    pub fn finish(mut self) -> std::io::Result<()> {
        self.stdin = None;
        let status = self.process.wait()?;
        if !status.success() {
            return Err(std::io::Error::other(format!("ffmpeg exited with {status}")));
        }
        info!("recording finished");
        Ok(())
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            if let Err(e) = self.process.wait() {
                warn!("failed to wait for ffmpeg encoder: {e}");
            }
        }
    }
}

struct Shared {
    paused: AtomicBool,
    stop: AtomicBool,
    latest: Mutex<Option<Vec<u8>>>,
}

/// A video decoded by an ffmpeg child into raw RGBA frames at canvas size.
/// A reader thread paces frames and publishes the most recent one.
pub struct VideoDecoder {
    uri: String,
    process: Child,
    reader: Option<JoinHandle<()>>,
    shared: Arc<Shared>,
}

impl VideoDecoder {
    pub fn open(
        uri: &str,
        width: i32,
        height: i32,
        options: &VideoOptions,
    ) -> Result<VideoDecoder, MediaError> {
        let mut command = Command::new("ffmpeg");
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .args(["-loglevel", "error"]);
        if options.looping {
            command.args(["-stream_loop", "-1"]);
        }
        command
            .args(["-ss", &format!("{:.3}", options.start_offset)])
            .args(["-i", uri])
            .args([
                "-vf",
                &format!("fps={},scale={}:{}", VIDEO_DECODE_FPS, width, height),
            ])
            .args(["-f", "rawvideo"])
            .args(["-pix_fmt", "rgba"]);
        if options.muted {
            command.arg("-an");
        }
        let mut process = command.arg("pipe:1").spawn().map_err(MediaError::Spawn)?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| MediaError::Spawn(std::io::Error::other("ffmpeg stdout missing")))?;
        let shared = Arc::new(Shared {
            paused: AtomicBool::new(!options.autoplay),
            stop: AtomicBool::new(false),
            latest: Mutex::new(None),
        });
        let frame_len = width as usize * height as usize * 4;
        let worker = Arc::clone(&shared);
        let worker_uri = uri.to_string();
        let reader = thread::spawn(move || read_frames(stdout, worker, frame_len, &worker_uri));

        debug!(uri, autoplay = options.autoplay, "video decoder started");
        Ok(VideoDecoder {
            uri: uri.to_string(),
            process,
            reader: Some(reader),
            shared,
        })
    }

    /// Most recent frame not yet taken.
    pub fn take_frame(&self) -> Option<Vec<u8>> {
        self.shared.latest.lock().ok().and_then(|mut slot| slot.take())
    }
}

fn read_frames(mut stdout: ChildStdout, shared: Arc<Shared>, frame_len: usize, uri: &str) {
    let frame_time = Duration::from_secs_f64(1.0 / f64::from(VIDEO_DECODE_FPS));
    let mut deadline: Option<Instant> = None;
    let mut buffer = vec![0u8; frame_len];

    while !shared.stop.load(Ordering::Acquire) {
        if shared.paused.load(Ordering::Acquire) {
            // Not reading back-pressures ffmpeg, which stalls the decode.
            deadline = None;
            thread::sleep(PAUSE_POLL);
            continue;
        }
        if let Err(e) = stdout.read_exact(&mut buffer) {
            if !shared.stop.load(Ordering::Acquire) {
                debug!(uri, "video stream ended: {e}");
            }
            break;
        }
        let due = *deadline.get_or_insert_with(Instant::now);
        if let Some(wait) = due.checked_duration_since(Instant::now()) {
            thread::sleep(wait);
        }
        if let Ok(mut slot) = shared.latest.lock() {
            *slot = Some(buffer.clone());
        }
        deadline = Some(due + frame_time);
    }
}

impl VideoControl for VideoDecoder {
    fn play(&mut self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    fn pause(&mut self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    fn stop(&mut self) {
        let Some(reader) = self.reader.take() else {
            return;
        };
        self.shared.stop.store(true, Ordering::Release);
        if let Err(e) = self.process.kill() {
            debug!(uri = %self.uri, "ffmpeg already exited: {e}");
        }
        if let Err(e) = self.process.wait() {
            warn!(uri = %self.uri, "failed to reap ffmpeg decoder: {e}");
        }
        if reader.join().is_err() {
            warn!(uri = %self.uri, "video reader thread panicked");
        }
        debug!(uri = %self.uri, "video decoder stopped");
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    #[test]
    fn decoder_pause_flag_follows_autoplay_and_controls() {
        if !ffmpeg_available() {
            return;
        }
        let options = VideoOptions {
            start_offset: 0.0,
            muted: true,
            looping: false,
            autoplay: false,
        };
        let mut decoder = VideoDecoder::open("/no/such/clip.mp4", 16, 16, &options).unwrap();
        assert!(decoder.is_paused());
        decoder.play();
        assert!(!decoder.is_paused());
        decoder.stop();
        decoder.stop();
        assert!(decoder.take_frame().is_none());
    }

    #[test]
    fn decoder_produces_frames_from_synthetic_source() {
        if !ffmpeg_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.mp4");
        let status = Command::new("ffmpeg")
            .args(["-v", "error", "-y", "-f", "lavfi", "-i", "testsrc=size=64x64:rate=30"])
            .args(["-t", "1", "-pix_fmt", "yuv420p"])
            .arg(&clip)
            .status()
            .unwrap();
        if !status.success() {
            return;
        }

        let options = VideoOptions {
            start_offset: 0.0,
            muted: true,
            looping: false,
            autoplay: true,
        };
        let decoder = VideoDecoder::open(clip.to_str().unwrap(), 8, 8, &options).unwrap();
        let started = Instant::now();
        let frame = loop {
            if let Some(frame) = decoder.take_frame() {
                break Some(frame);
            }
            if started.elapsed() > Duration::from_secs(10) {
                break None;
            }
            thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(frame.map(|f| f.len()), Some(8 * 8 * 4));
    }
}
