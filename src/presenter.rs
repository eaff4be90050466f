use tracing::{debug, info};

use crate::clock::SceneClock;
use crate::constants::*;
use crate::media::{MediaSlot, VideoControl, VideoOptions, reconcile};
use crate::scene::{MediaKind, Scene};
use crate::state::{Event, PlaybackState};
use crate::text::{Anchor, text_anchor, visible_text};

/// Media frame handed to the backend for compositing. Only passed when ready.
pub enum MediaLayer<'a, I, V> {
    Image(&'a I),
    Video(&'a V),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextDraw<'a> {
    pub text: &'a str,
    pub anchor: Anchor,
}

/// Drawing surface and media factory the presenter runs against.
pub trait Backend {
    type Image;
    type Video: VideoControl;

    fn canvas_size(&self) -> (f32, f32);
    fn load_image(&mut self, uri: &str) -> Self::Image;
    fn open_video(&mut self, uri: &str, options: &VideoOptions) -> Self::Video;
    /// Polls an in-flight load; true once the image has usable pixels.
    fn image_ready(&mut self, image: &mut Self::Image) -> bool;
    /// Polls the decoder; true once a frame is available to draw.
    fn video_ready(&mut self, video: &mut Self::Video) -> bool;
    /// Clears the canvas, then draws the media layer and the text in that order.
    fn draw_scene(
        &mut self,
        media: Option<MediaLayer<'_, Self::Image, Self::Video>>,
        text: Option<TextDraw<'_>>,
    );
    fn draw_ended(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    Ended,
}

pub struct Presenter<B: Backend> {
    scenes: Vec<Scene>,
    state: PlaybackState,
    clock: SceneClock,
    video: MediaSlot<B::Video>,
    image: Option<(usize, B::Image)>,
}

impl<B: Backend> Presenter<B> {
    pub fn new(scenes: Vec<Scene>) -> Self {
        let state = PlaybackState::start(scenes.len());
        Self {
            scenes,
            state,
            clock: SceneClock::new(),
            video: MediaSlot::new(),
            image: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn elapsed(&self, now: f64) -> f64 {
        self.clock.elapsed(now)
    }

    /// Runs one display refresh: media, then text, then the advance check.
    pub fn frame(&mut self, now: f64, backend: &mut B) -> FrameOutcome {
        let Some(index) = self.state.index() else {
            self.release_media();
            backend.draw_ended();
            return FrameOutcome::Ended;
        };

        let playing = self.state.is_playing();
        self.clock.start_if_idle(now, playing);
        let elapsed = self.elapsed(now);

        self.prepare_media(index, backend);

        let scene = &self.scenes[index];
        let duration = scene.duration;
        let (width, height) = backend.canvas_size();
        let anchor = text_anchor(width, height, scene.text_position);
        let text = visible_text(&scene.sentence, scene.text_animation, elapsed)
            .map(|text| TextDraw { text, anchor });

        let media = match scene.media_kind() {
            MediaKind::Image => match self.image.as_mut() {
                Some((_, image)) => {
                    if backend.image_ready(image) {
                        Some(MediaLayer::Image(&*image))
                    } else {
                        None
                    }
                }
                None => None,
            },
            MediaKind::Video => match self.video.get_mut() {
                Some(video) => {
                    if backend.video_ready(video) {
                        Some(MediaLayer::Video(&*video))
                    } else {
                        None
                    }
                }
                None => None,
            },
        };
        backend.draw_scene(media, text);

        if playing && elapsed >= duration {
            self.advance(now);
        }
        FrameOutcome::Continue
    }

    /// Pointer click on the canvas. Only toggles while a video is live.
    pub fn click(&mut self, now: f64) {
        let Some(video) = self.video.get_mut() else {
            debug!("click ignored, no active video");
            return;
        };
        let next = self.state.next(Event::Toggle, self.scenes.len());
        match next {
            PlaybackState::Paused { index } => {
                video.pause();
                self.clock.pause(now);
                info!(scene = index, "paused");
            }
            PlaybackState::Playing { index } => {
                video.play();
                self.clock.resume(now);
                info!(scene = index, "resumed");
            }
            PlaybackState::Ended => {}
        }
        self.state = next;
    }

    /// Stops all media. Called once when the loop shuts down.
    pub fn teardown(&mut self) {
        debug!(had_video = !self.video.is_empty(), "presenter teardown");
        self.release_media();
    }

    fn prepare_media(&mut self, index: usize, backend: &mut B) {
        let scene = &self.scenes[index];
        match scene.media_kind() {
            MediaKind::Image => {
                self.video.release();
                if self.image.as_ref().map(|(owner, _)| *owner) != Some(index) {
                    debug!(scene = scene.index, uri = %scene.media, "loading image");
                    self.image = Some((index, backend.load_image(&scene.media)));
                }
            }
            MediaKind::Video => {
                self.image = None;
                let playing = self.state.is_playing();
                let options = VideoOptions {
                    start_offset: VIDEO_START_OFFSET,
                    muted: true,
                    looping: false,
                    autoplay: playing,
                };
                let video = self.video.acquire(index, || {
                    debug!(scene = scene.index, uri = %scene.media, "opening video");
                    backend.open_video(&scene.media, &options)
                });
                reconcile(video, playing);
            }
        }
    }

    fn advance(&mut self, now: f64) {
        let from = self.state.index();
        self.state = self.state.next(Event::Elapsed, self.scenes.len());
        self.release_media();
        match self.state {
            PlaybackState::Playing { index } => {
                info!(from = ?from, to = index, "advancing scene");
                self.clock.restart(now, true);
            }
            PlaybackState::Ended => info!("slideshow ended"),
            PlaybackState::Paused { .. } => {}
        }
    }

    fn release_media(&mut self) {
        self.video.release();
        self.image = None;
    }
}
