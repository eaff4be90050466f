use std::ffi::CString;
use std::path::Path;

use anyhow::{Context, anyhow};
use raylib::prelude::*;
use tracing::{debug, warn};

use crate::constants::*;
use crate::ffmpeg::{Encoder, VideoDecoder};
use crate::media::{VideoControl, VideoOptions};
use crate::presenter::{Backend, MediaLayer, TextDraw};
use crate::texture_loader::ImageLoader;

const ENDED_BACKGROUND: Color = Color::new(0x24, 0x24, 0x24, 255);
const ENDED_BORDER_COLOR: Color = Color::new(0x33, 0x33, 0x33, 255);

/// Video scene media: the decoder plus the texture its frames stream into.
pub struct StageVideo {
    decoder: Option<VideoDecoder>,
    texture: Option<Texture2D>,
    paused: bool,
}

impl StageVideo {
    fn open(uri: &str, options: &VideoOptions) -> Self {
        let decoder = match VideoDecoder::open(uri, CANVAS_WIDTH, CANVAS_HEIGHT, options) {
            Ok(decoder) => Some(decoder),
            Err(e) => {
                warn!(uri, "video will not be shown: {e}");
                None
            }
        };
        Self {
            decoder,
            texture: None,
            paused: !options.autoplay,
        }
    }

    /// Streams the newest decoded frame into the texture. True once a frame exists.
    fn refresh(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread) -> bool {
        let Some(frame) = self.decoder.as_ref().and_then(VideoDecoder::take_frame) else {
            return self.texture.is_some();
        };
        if self.texture.is_none() {
            let blank = Image::gen_image_color(CANVAS_WIDTH, CANVAS_HEIGHT, Color::BLACK);
            match rl.load_texture_from_image(thread, &blank) {
                Ok(texture) => self.texture = Some(texture),
                Err(e) => {
                    warn!("failed to create video texture: {e:?}");
                    return false;
                }
            }
        }
        if let Some(texture) = self.texture.as_mut() {
            if let Err(e) = texture.update_texture(&frame) {
                warn!("failed to upload video frame: {e:?}");
            }
        }
        self.texture.is_some()
    }
}

impl VideoControl for StageVideo {
    fn play(&mut self) {
        self.paused = false;
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.play();
        }
    }

    fn pause(&mut self) {
        self.paused = true;
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.pause();
        }
    }

    fn is_paused(&self) -> bool {
        self.decoder.as_ref().map_or(self.paused, VideoDecoder::is_paused)
    }

    fn stop(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            decoder.stop();
        }
    }
}

pub struct StageOptions<'a> {
    pub fps: u32,
    pub record: Option<&'a Path>,
}

/// Window, fixed-size framebuffer and input. Everything is drawn into the
/// framebuffer at canvas resolution, then stretched to the window.
pub struct Stage {
    rl: RaylibHandle,
    thread: RaylibThread,
    framebuffer: RenderTexture2D,
    encoder: Option<Encoder>,
    fps: u32,
    frames_presented: u64,
}

impl Stage {
    pub fn new(options: &StageOptions) -> anyhow::Result<Self> {
        let (mut rl, thread) = raylib::init()
            .size(CANVAS_WIDTH, CANVAS_HEIGHT)
            .title("Scene Player")
            .vsync()
            .resizable()
            .build();
        rl.set_target_fps(options.fps);
        rl.set_trace_log(TraceLogLevel::LOG_ERROR);

        let framebuffer = rl
            .load_render_texture(&thread, CANVAS_WIDTH as u32, CANVAS_HEIGHT as u32)
            .map_err(|e| anyhow!("failed to create framebuffer: {e:?}"))?;

        let encoder = options
            .record
            .map(|path| Encoder::new(CANVAS_WIDTH, CANVAS_HEIGHT, options.fps, path))
            .transpose()
            .context("start recording")?;

        Ok(Self {
            rl,
            thread,
            framebuffer,
            encoder,
            fps: options.fps,
            frames_presented: 0,
        })
    }

    pub fn should_close(&self) -> bool {
        self.rl.window_should_close()
    }

    /// Playback clock in seconds. Recording steps a fixed 1/fps per frame.
    pub fn now(&self) -> f64 {
        if self.encoder.is_some() {
            self.frames_presented as f64 / f64::from(self.fps)
        } else {
            self.rl.get_time()
        }
    }

    /// True when the left button was pressed inside the canvas this frame.
    pub fn take_click(&mut self) -> bool {
        if !self.rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
            return false;
        }
        let mouse = self.rl.get_mouse_position();
        let screen = (
            self.rl.get_screen_width() as f32,
            self.rl.get_screen_height() as f32,
        );
        let hit = window_to_canvas((mouse.x, mouse.y), screen);
        debug!(?hit, "canvas click");
        hit.is_some()
    }

    /// Blits the framebuffer to the window and feeds the encoder, if any.
    pub fn present(&mut self) -> anyhow::Result<()> {
        let mut d = self.rl.begin_drawing(&self.thread);
        let sw = d.get_screen_width() as f32;
        let sh = d.get_screen_height() as f32;
        d.clear_background(Color::BLACK);
        // Render textures are stored upside down, hence the negative height.
        d.draw_texture_pro(
            &self.framebuffer,
            Rectangle::new(
                0.0,
                0.0,
                self.framebuffer.width() as f32,
                -(self.framebuffer.height() as f32),
            ),
            Rectangle::new(0.0, 0.0, sw, sh),
            Vector2::new(0.0, 0.0),
            0.0,
            Color::WHITE,
        );
        drop(d);

        if let Some(encoder) = self.encoder.as_mut() {
            let image = self
                .framebuffer
                .load_image()
                .map_err(|e| anyhow!("failed to read back framebuffer: {e:?}"))?;
            encoder.write(&image).context("write frame to ffmpeg")?;
        }
        self.frames_presented += 1;
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        if let Some(encoder) = self.encoder.take() {
            encoder.finish().context("finish recording")?;
        }
        Ok(())
    }
}

impl Backend for Stage {
    type Image = ImageLoader;
    type Video = StageVideo;

    fn canvas_size(&self) -> (f32, f32) {
        (CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32)
    }

    fn load_image(&mut self, uri: &str) -> ImageLoader {
        ImageLoader::spawn(uri)
    }

    fn open_video(&mut self, uri: &str, options: &VideoOptions) -> StageVideo {
        StageVideo::open(uri, options)
    }

    fn image_ready(&mut self, image: &mut ImageLoader) -> bool {
        image.poll(&mut self.rl, &self.thread)
    }

    fn video_ready(&mut self, video: &mut StageVideo) -> bool {
        video.refresh(&mut self.rl, &self.thread)
    }

    fn draw_scene(
        &mut self,
        media: Option<MediaLayer<'_, ImageLoader, StageVideo>>,
        text: Option<TextDraw<'_>>,
    ) {
        let texture = match &media {
            Some(MediaLayer::Image(image)) => image.texture(),
            Some(MediaLayer::Video(video)) => video.texture.as_ref(),
            None => None,
        };
        let Self {
            rl,
            thread,
            framebuffer,
            ..
        } = self;
        let thread: &RaylibThread = thread;
        rl.draw_texture_mode(thread, framebuffer, |mut tmd| {
            let mut d = tmd.begin_drawing(thread);
            d.clear_background(Color::WHITE);

            if let Some(texture) = texture {
                // Stretch to fill, no aspect preservation
                d.draw_texture_pro(
                    texture,
                    Rectangle::new(0.0, 0.0, texture.width() as f32, texture.height() as f32),
                    Rectangle::new(0.0, 0.0, CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32),
                    Vector2::new(0.0, 0.0),
                    0.0,
                    Color::WHITE,
                );
            }

            if let Some(text) = text {
                let width = measure_text_width(text.text) as f32;
                let x = text.anchor.left_edge(width);
                // Anchor y is the baseline; raylib draws from the top edge.
                let y = text.anchor.y - FONT_SIZE as f32;
                d.draw_text(text.text, x.round() as i32, y.round() as i32, FONT_SIZE, Color::BLACK);
            }
        });
    }

    fn draw_ended(&mut self) {
        let Self {
            rl,
            thread,
            framebuffer,
            ..
        } = self;
        let thread: &RaylibThread = thread;
        rl.draw_texture_mode(thread, framebuffer, |mut tmd| {
            let mut d = tmd.begin_drawing(thread);
            d.clear_background(ENDED_BACKGROUND);
            d.draw_rectangle_lines_ex(
                Rectangle::new(0.0, 0.0, CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32),
                ENDED_BORDER,
                ENDED_BORDER_COLOR,
            );
            let width = measure_text_width(ENDED_TEXT);
            d.draw_text(
                ENDED_TEXT,
                (CANVAS_WIDTH - width) / 2,
                (CANVAS_HEIGHT - FONT_SIZE) / 2,
                FONT_SIZE,
                Color::WHITE,
            );
        });
    }
}

fn measure_text_width(text: &str) -> i32 {
    let Ok(c_text) = CString::new(text) else {
        return 0;
    };
    // SAFETY: c_text is a valid NUL-terminated string for the whole call.
    unsafe { raylib::ffi::MeasureText(c_text.as_ptr(), FONT_SIZE) }
}

/// Maps a window position onto canvas coordinates, `None` outside the canvas.
pub fn window_to_canvas(point: (f32, f32), screen: (f32, f32)) -> Option<(f32, f32)> {
    if screen.0 <= 0.0 || screen.1 <= 0.0 {
        return None;
    }
    let x = point.0 * CANVAS_WIDTH as f32 / screen.0;
    let y = point.1 * CANVAS_HEIGHT as f32 / screen.1;
    let inside = (0.0..CANVAS_WIDTH as f32).contains(&x) && (0.0..CANVAS_HEIGHT as f32).contains(&y);
    inside.then_some((x, y))
}
