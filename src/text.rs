use crate::constants::*;
use crate::scene::{TextAnimation, TextPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    End,
    Center,
}

/// Baseline point and horizontal alignment for the overlay text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
    pub align: TextAlign,
}

impl Anchor {
    /// Left edge of a run of `text_width` pixels placed at this anchor.
    pub fn left_edge(&self, text_width: f32) -> f32 {
        match self.align {
            TextAlign::Start => self.x,
            TextAlign::End => self.x - text_width,
            TextAlign::Center => self.x - text_width * 0.5,
        }
    }
}

pub fn text_anchor(width: f32, height: f32, position: TextPosition) -> Anchor {
    let (fx, fy, align) = match position {
        TextPosition::TopLeft => (0.1, 0.1, TextAlign::Start),
        TextPosition::TopRight => (0.9, 0.1, TextAlign::End),
        TextPosition::BottomLeft => (0.1, 0.9, TextAlign::Start),
        TextPosition::BottomRight => (0.9, 0.9, TextAlign::End),
        TextPosition::MiddleCenter => (0.5, 0.5, TextAlign::Center),
    };
    Anchor {
        x: width * fx,
        y: height * fy,
        align,
    }
}

/// Portion of `sentence` to draw `elapsed` seconds into the scene.
/// `None` means nothing is drawn this frame.
pub fn visible_text(sentence: &str, animation: TextAnimation, elapsed: f64) -> Option<&str> {
    match animation {
        TextAnimation::Typing => {
            let chars = (elapsed * TYPING_CHARS_PER_SEC).floor().max(0.0) as usize;
            let end = sentence
                .char_indices()
                .nth(chars)
                .map_or(sentence.len(), |(i, _)| i);
            Some(&sentence[..end])
        }
        TextAnimation::Blink => {
            let half_periods = (elapsed * BLINK_HALF_PERIODS_PER_SEC).floor() as i64;
            (half_periods % 2 == 0).then_some(sentence)
        }
        TextAnimation::Static => Some(sentence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: f32 = 1280.0;
    const H: f32 = 720.0;

    #[test]
    fn anchors_follow_position_table() {
        let cases = [
            (TextPosition::TopLeft, 128.0, 72.0, TextAlign::Start),
            (TextPosition::TopRight, 1152.0, 72.0, TextAlign::End),
            (TextPosition::BottomLeft, 128.0, 648.0, TextAlign::Start),
            (TextPosition::BottomRight, 1152.0, 648.0, TextAlign::End),
            (TextPosition::MiddleCenter, 640.0, 360.0, TextAlign::Center),
        ];
        for (position, x, y, align) in cases {
            let a = text_anchor(W, H, position);
            assert!((a.x - x).abs() < 1e-3, "{position:?} x={}", a.x);
            assert!((a.y - y).abs() < 1e-3, "{position:?} y={}", a.y);
            assert_eq!(a.align, align, "{position:?}");
        }
    }

    #[test]
    fn unknown_position_centers() {
        let position = TextPosition::from("diagonal".to_string());
        assert_eq!(text_anchor(W, H, position), text_anchor(W, H, TextPosition::MiddleCenter));
    }

    #[test]
    fn left_edge_respects_alignment() {
        let start = Anchor { x: 100.0, y: 0.0, align: TextAlign::Start };
        let end = Anchor { align: TextAlign::End, ..start };
        let center = Anchor { align: TextAlign::Center, ..start };
        assert_eq!(start.left_edge(40.0), 100.0);
        assert_eq!(end.left_edge(40.0), 60.0);
        assert_eq!(center.left_edge(40.0), 80.0);
    }

    #[test]
    fn typing_reveals_twenty_chars_per_second() {
        let s = "This is a simple Javascript test";
        assert_eq!(visible_text(s, TextAnimation::Typing, 0.0), Some(""));
        assert_eq!(visible_text(s, TextAnimation::Typing, 0.5), Some("This is a "));
        let full_at = s.chars().count() as f64 / 20.0;
        assert_eq!(visible_text(s, TextAnimation::Typing, full_at), Some(s));
        assert_eq!(visible_text(s, TextAnimation::Typing, 30.0), Some(s));
    }

    #[test]
    fn typing_counts_characters_not_bytes() {
        let s = "héllo wörld";
        assert_eq!(visible_text(s, TextAnimation::Typing, 0.1), Some("hé"));
    }

    #[test]
    fn blink_alternates_every_half_second() {
        let s = "Here comes the video!";
        assert_eq!(visible_text(s, TextAnimation::Blink, 0.24), Some(s));
        assert_eq!(visible_text(s, TextAnimation::Blink, 0.6), None);
        assert_eq!(visible_text(s, TextAnimation::Blink, 1.0), Some(s));
    }

    #[test]
    fn static_text_is_always_full() {
        assert_eq!(visible_text("abc", TextAnimation::Static, 0.0), Some("abc"));
        assert_eq!(visible_text("abc", TextAnimation::Static, 99.9), Some("abc"));
    }
}
