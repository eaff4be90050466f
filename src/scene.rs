use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::SceneError;

/// Where the overlay text is anchored on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TextPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    #[default]
    MiddleCenter,
}

impl From<String> for TextPosition {
    fn from(value: String) -> Self {
        match value.as_str() {
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            _ => Self::MiddleCenter,
        }
    }
}

/// How the overlay text is revealed over the scene's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TextAnimation {
    Typing,
    Blink,
    #[default]
    Static,
}

impl From<String> for TextAnimation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "typing" => Self::Typing,
            "blink" => Self::Blink,
            _ => Self::Static,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "webm", "mov", "mkv", "m4v"];

impl MediaKind {
    /// Infers the media kind from the extension of the URI path.
    pub fn from_uri(uri: &str) -> Self {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match file_name.rsplit_once('.') {
            Some((_, ext)) if VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)) => {
                Self::Video
            }
            _ => Self::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(default)]
    pub index: usize,
    pub media: String,
    pub duration: f64,
    pub sentence: String,
    #[serde(default)]
    pub text_position: TextPosition,
    #[serde(default)]
    pub text_animation: TextAnimation,
}

impl Scene {
    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_uri(&self.media)
    }
}

pub fn default_scenes() -> Vec<Scene> {
    vec![
        Scene {
            index: 0,
            media: "https://miro.medium.com/max/1024/1*OK8xc3Ic6EGYg2k6BeGabg.jpeg".to_string(),
            duration: 3.0,
            sentence: "This is a simple Javascript test".to_string(),
            text_position: TextPosition::MiddleCenter,
            text_animation: TextAnimation::Typing,
        },
        Scene {
            index: 1,
            media: "http://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4"
                .to_string(),
            duration: 5.0,
            sentence: "Here comes the video!".to_string(),
            text_position: TextPosition::TopRight,
            text_animation: TextAnimation::Blink,
        },
    ]
}

pub fn parse_scenes(json: &str) -> Result<Vec<Scene>, serde_json::Error> {
    serde_json::from_str(json)
}

pub fn load_scenes(path: &Path) -> Result<Vec<Scene>, SceneError> {
    let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenes(&text).map_err(|source| SceneError::Json {
        path: path.to_path_buf(),
        source,
    })
}
