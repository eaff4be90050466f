#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PlaybackState {
    Playing { index: usize }, // Scene `index` is on screen and its clock runs
    Paused { index: usize },  // Scene `index` is on screen, clock and video frozen
    Ended,                    // All scenes shown; terminal
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Event {
    Elapsed, // The current scene's duration has run out
    Toggle,  // Pointer click on the canvas
}

impl PlaybackState {
    pub fn start(scene_count: usize) -> Self {
        if scene_count == 0 {
            PlaybackState::Ended
        } else {
            PlaybackState::Playing { index: 0 }
        }
    }

    pub fn next(self, event: Event, scene_count: usize) -> Self {
        match (self, event) {
            (PlaybackState::Playing { index }, Event::Elapsed) => {
                if index + 1 < scene_count {
                    PlaybackState::Playing { index: index + 1 }
                } else {
                    PlaybackState::Ended
                }
            }
            (PlaybackState::Playing { index }, Event::Toggle) => PlaybackState::Paused { index },
            (PlaybackState::Paused { index }, Event::Toggle) => PlaybackState::Playing { index },
            (PlaybackState::Paused { .. }, Event::Elapsed) => self,
            (PlaybackState::Ended, _) => self,
        }
    }

    /// Index of the scene on screen, `None` once ended.
    pub fn index(self) -> Option<usize> {
        match self {
            PlaybackState::Playing { index } | PlaybackState::Paused { index } => Some(index),
            PlaybackState::Ended => None,
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackState::Playing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_walks_the_list_then_ends() {
        let s = PlaybackState::start(2);
        assert_eq!(s, PlaybackState::Playing { index: 0 });
        let s = s.next(Event::Elapsed, 2);
        assert_eq!(s, PlaybackState::Playing { index: 1 });
        let s = s.next(Event::Elapsed, 2);
        assert_eq!(s, PlaybackState::Ended);
        assert!(!s.is_playing());
        assert_eq!(s.index(), None);
    }

    #[test]
    fn toggle_pauses_and_resumes_same_scene() {
        let s = PlaybackState::Playing { index: 1 }.next(Event::Toggle, 3);
        assert_eq!(s, PlaybackState::Paused { index: 1 });
        assert_eq!(s.next(Event::Elapsed, 3), s);
        assert_eq!(s.next(Event::Toggle, 3), PlaybackState::Playing { index: 1 });
    }

    #[test]
    fn ended_is_terminal() {
        let s = PlaybackState::Ended;
        assert_eq!(s.next(Event::Elapsed, 2), PlaybackState::Ended);
        assert_eq!(s.next(Event::Toggle, 2), PlaybackState::Ended);
    }

    #[test]
    fn empty_list_starts_ended() {
        assert_eq!(PlaybackState::start(0), PlaybackState::Ended);
    }
}
