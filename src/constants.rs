pub const CANVAS_WIDTH: i32 = 1280;           // Width of the drawing surface
pub const CANVAS_HEIGHT: i32 = 720;           // Height of the drawing surface
pub const FPS: u32 = 60;                      // Default frames per second

pub const FONT_SIZE: i32 = 32;                // Overlay text size (px)
pub const TYPING_CHARS_PER_SEC: f64 = 20.0;   // Reveal rate for the typing animation
pub const BLINK_HALF_PERIODS_PER_SEC: f64 = 2.0; // On/off toggles every 0.5s

pub const VIDEO_START_OFFSET: f64 = 3.0;      // Seek offset for every video scene (seconds)
pub const VIDEO_DECODE_FPS: u32 = 30;         // Rate at which decoded video frames are paced

pub const ENDED_TEXT: &str = "Scene ended";
pub const ENDED_BORDER: f32 = 2.0;            // Placeholder border thickness (px)
