use tracing::debug;

/// Options a video handle is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoOptions {
    pub start_offset: f64,
    pub muted: bool,
    pub looping: bool,
    pub autoplay: bool,
}

/// Control surface of a live decoded video.
pub trait VideoControl {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    /// Halts decoding for good; the handle is never used again afterwards.
    fn stop(&mut self);
}

/// Exclusive slot holding at most one live video handle, tagged with the
/// scene it was acquired for.
pub struct MediaSlot<V: VideoControl> {
    active: Option<(usize, V)>,
}

impl<V: VideoControl> Default for MediaSlot<V> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<V: VideoControl> MediaSlot<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `scene`, releasing any handle held for another
    /// scene before `open` creates the new one.
    pub fn acquire(&mut self, scene: usize, open: impl FnOnce() -> V) -> &mut V {
        if self.owner().is_some_and(|owner| owner != scene) {
            self.release();
        }
        let (_, handle) = self.active.get_or_insert_with(|| {
            debug!(scene, "acquiring video handle");
            (scene, open())
        });
        handle
    }

    pub fn release(&mut self) {
        if let Some((scene, mut handle)) = self.active.take() {
            debug!(scene, "releasing video handle");
            handle.pause();
            handle.stop();
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut V> {
        self.active.as_mut().map(|(_, handle)| handle)
    }

    pub fn owner(&self) -> Option<usize> {
        self.active.as_ref().map(|(scene, _)| *scene)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none()
    }
}

impl<V: VideoControl> Drop for MediaSlot<V> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Brings the handle's paused flag in line with whether playback should run.
pub fn reconcile(video: &mut impl VideoControl, should_play: bool) {
    if should_play && video.is_paused() {
        video.play();
    } else if !should_play && !video.is_paused() {
        video.pause();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Records every call so tests can check ordering across handles.
    #[derive(Clone, Default)]
    pub struct Journal(pub Rc<RefCell<Vec<String>>>);

    impl Journal {
        pub fn push(&self, entry: String) {
            self.0.borrow_mut().push(entry);
        }

        pub fn entries(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    pub struct FakeVideo {
        pub name: String,
        pub paused: bool,
        pub stopped: bool,
        pub journal: Journal,
    }

    impl FakeVideo {
        pub fn new(name: &str, autoplay: bool, journal: &Journal) -> Self {
            journal.push(format!("open {name}"));
            Self {
                name: name.to_string(),
                paused: !autoplay,
                stopped: false,
                journal: journal.clone(),
            }
        }
    }

    impl VideoControl for FakeVideo {
        fn play(&mut self) {
            assert!(!self.stopped, "play on stopped handle {}", self.name);
            self.paused = false;
            self.journal.push(format!("play {}", self.name));
        }

        fn pause(&mut self) {
            self.paused = true;
            self.journal.push(format!("pause {}", self.name));
        }

        fn is_paused(&self) -> bool {
            self.paused
        }

        fn stop(&mut self) {
            self.stopped = true;
            self.journal.push(format!("stop {}", self.name));
        }
    }

    #[test]
    fn acquire_reuses_handle_for_same_scene() {
        let journal = Journal::default();
        let mut slot = MediaSlot::new();
        slot.acquire(1, || FakeVideo::new("a", true, &journal));
        slot.acquire(1, || FakeVideo::new("b", true, &journal));
        assert_eq!(slot.owner(), Some(1));
        assert_eq!(journal.entries(), vec!["open a"]);
    }

    #[test]
    fn acquire_for_new_scene_releases_old_handle_first() {
        let journal = Journal::default();
        let mut slot = MediaSlot::new();
        slot.acquire(1, || FakeVideo::new("a", true, &journal));
        slot.acquire(2, || FakeVideo::new("b", true, &journal));
        assert_eq!(
            journal.entries(),
            vec!["open a", "pause a", "stop a", "open b"]
        );
        assert_eq!(slot.owner(), Some(2));
    }

    #[test]
    fn release_and_drop_stop_the_handle() {
        let journal = Journal::default();
        let mut slot = MediaSlot::new();
        slot.acquire(0, || FakeVideo::new("a", true, &journal));
        slot.release();
        assert!(slot.is_empty());
        slot.release();
        slot.acquire(3, || FakeVideo::new("b", false, &journal));
        drop(slot);
        assert_eq!(
            journal.entries(),
            vec!["open a", "pause a", "stop a", "open b", "pause b", "stop b"]
        );
    }

    #[test]
    fn reconcile_only_acts_on_mismatch() {
        let journal = Journal::default();
        let mut video = FakeVideo::new("v", false, &journal);
        reconcile(&mut video, false);
        reconcile(&mut video, true);
        reconcile(&mut video, true);
        reconcile(&mut video, false);
        assert_eq!(journal.entries(), vec!["open v", "play v", "pause v"]);
    }
}
