//! Play / pause / seek state machine.
//!
//! The controller owns only indices and flags. Each command
//! returns a [`Transition`]: the resulting state and, when
//! the command calls for it, the frame index the presenter
//! should decode and draw. Nothing here touches frames or
//! any windowing toolkit.

use std::time::Duration;

use serde_derive::*;

/// Period of the playback tick (about 30 frames a second).
pub const DEFAULT_TICK: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    /// No document; every command but `open` is a no-op.
    Unloaded,
    Paused { frame: usize },
    Playing { frame: usize },
}

impl PlaybackState {
    pub fn frame(&self) -> Option<usize> {
        match *self {
            PlaybackState::Unloaded => None,
            PlaybackState::Paused { frame } | PlaybackState::Playing { frame } => Some(frame),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: PlaybackState,
    /// Frame to render as a consequence of the command.
    pub render: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    frame_count: usize,
    current: usize,
    playing: bool,
    seeking: bool,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.frame_count > 0
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn state(&self) -> PlaybackState {
        if !self.is_loaded() {
            PlaybackState::Unloaded
        } else if self.playing {
            PlaybackState::Playing {
                frame: self.current,
            }
        } else {
            PlaybackState::Paused {
                frame: self.current,
            }
        }
    }

    /// Reset for a freshly opened document and request its
    /// first frame. A document without frames leaves the
    /// controller unloaded.
    pub fn open(&mut self, frame_count: usize) -> Transition {
        *self = PlaybackController {
            frame_count,
            ..Self::default()
        };
        let render = if self.is_loaded() { Some(0) } else { None };
        self.transition(render)
    }

    pub fn close(&mut self) -> Transition {
        *self = Self::default();
        self.transition(None)
    }

    pub fn toggle_play(&mut self) -> Transition {
        if self.is_loaded() {
            self.playing = !self.playing;
        }
        self.transition(None)
    }

    pub fn pause(&mut self) -> Transition {
        self.playing = false;
        self.transition(None)
    }

    /// Pause and rewind to the first frame.
    pub fn stop(&mut self) -> Transition {
        if !self.is_loaded() {
            return self.transition(None);
        }
        self.playing = false;
        self.current = 0;
        self.transition(Some(0))
    }

    /// Move by `delta` frames, pausing playback. Clamps at
    /// both ends of the document.
    pub fn step(&mut self, delta: isize) -> Transition {
        if !self.is_loaded() {
            return self.transition(None);
        }
        self.playing = false;
        self.current = self.clamp(self.current as f64 + delta as f64);
        self.transition(Some(self.current))
    }

    /// Jump to the frame nearest `value`.
    ///
    /// Renders immediately unless the user is dragging the
    /// seek control while playing; then only the target
    /// moves.
    pub fn seek(&mut self, value: f64) -> Transition {
        if !self.is_loaded() || value.is_nan() {
            return self.transition(None);
        }
        self.current = self.clamp(value.round());
        let render = if !self.seeking || !self.playing {
            Some(self.current)
        } else {
            None
        };
        self.transition(render)
    }

    /// Periodic advance. While playing and not seeking,
    /// renders the current frame and moves to the next,
    /// wrapping to 0 after the last.
    pub fn tick(&mut self) -> Transition {
        if !self.is_loaded() || !self.playing || self.seeking {
            return self.transition(None);
        }
        let render = self.current;
        self.current = (self.current + 1) % self.frame_count;
        self.transition(Some(render))
    }

    pub fn begin_seek_gesture(&mut self) -> Transition {
        if self.is_loaded() {
            self.seeking = true;
        }
        self.transition(None)
    }

    pub fn end_seek_gesture(&mut self) -> Transition {
        self.seeking = false;
        self.transition(None)
    }

    fn clamp(&self, frame: f64) -> usize {
        let last = self.frame_count.saturating_sub(1) as f64;
        frame.max(0.).min(last) as usize
    }

    fn transition(&self, render: Option<usize>) -> Transition {
        Transition {
            state: self.state(),
            render,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::PlaybackState::*;

    fn loaded(frames: usize) -> PlaybackController {
        let mut ctl = PlaybackController::new();
        ctl.open(frames);
        ctl
    }

    #[test]
    fn open_pauses_at_zero() {
        let mut ctl = PlaybackController::new();
        assert_eq!(ctl.state(), Unloaded);
        let t = ctl.open(10);
        assert_eq!(t.state, Paused { frame: 0 });
        assert_eq!(t.render, Some(0));
    }

    #[test]
    fn unloaded_commands_are_noops() {
        let mut ctl = PlaybackController::new();
        for t in vec![
            ctl.toggle_play(),
            ctl.step(1),
            ctl.seek(3.),
            ctl.tick(),
            ctl.begin_seek_gesture(),
            ctl.stop(),
        ] {
            assert_eq!(t, Transition { state: Unloaded, render: None });
        }
        assert!(!ctl.is_seeking());
        assert_eq!(ctl.open(0).state, Unloaded);
    }

    #[test]
    fn tick_while_paused_does_nothing() {
        let mut ctl = loaded(5);
        for _ in 0..20 {
            assert_eq!(ctl.tick().render, None);
        }
        assert_eq!(ctl.state(), Paused { frame: 0 });
    }

    #[test]
    fn ten_frame_walkthrough() {
        let mut ctl = loaded(10);
        assert_eq!(ctl.toggle_play().state, Playing { frame: 0 });
        for expected in 0..9 {
            assert_eq!(ctl.tick().render, Some(expected));
        }
        assert_eq!(ctl.state(), Playing { frame: 9 });
        let t = ctl.tick();
        assert_eq!(t.render, Some(9));
        assert_eq!(t.state, Playing { frame: 0 });
    }

    #[test]
    fn tick_wraps_from_last_frame() {
        let mut ctl = loaded(4);
        ctl.seek(3.);
        ctl.toggle_play();
        assert_eq!(ctl.tick().state, Playing { frame: 0 });
    }

    #[test]
    fn step_clamps_and_pauses() {
        let mut ctl = loaded(3);
        assert_eq!(ctl.step(-1), Transition { state: Paused { frame: 0 }, render: Some(0) });
        ctl.toggle_play();
        ctl.step(1);
        let t = ctl.step(1);
        assert_eq!(t.state, Paused { frame: 2 });
        assert_eq!(ctl.step(1).state, Paused { frame: 2 });
        assert_eq!(ctl.step(-5).state, Paused { frame: 0 });
    }

    #[test]
    fn seek_rounds_and_clamps() {
        let mut ctl = loaded(10);
        assert_eq!(ctl.seek(3.6).render, Some(4));
        assert_eq!(ctl.seek(-2.).render, Some(0));
        assert_eq!(ctl.seek(42.).render, Some(9));
        assert_eq!(ctl.seek(f64::NAN).render, None);
        assert_eq!(ctl.current_frame(), 9);
    }

    #[test]
    fn dragging_while_playing_defers_render() {
        let mut ctl = loaded(10);
        ctl.toggle_play();
        ctl.begin_seek_gesture();
        let t = ctl.seek(6.);
        assert_eq!(t.render, None);
        assert_eq!(t.state, Playing { frame: 6 });
        assert_eq!(ctl.tick().render, None, "ticks do not fight the user");

        ctl.end_seek_gesture();
        assert_eq!(ctl.tick().render, Some(6));
        assert_eq!(ctl.current_frame(), 7);
    }

    #[test]
    fn dragging_while_paused_renders() {
        let mut ctl = loaded(10);
        ctl.begin_seek_gesture();
        assert_eq!(ctl.seek(2.).render, Some(2));
    }

    #[test]
    fn stop_rewinds() {
        let mut ctl = loaded(10);
        ctl.toggle_play();
        ctl.tick();
        ctl.tick();
        let t = ctl.stop();
        assert_eq!(t, Transition { state: Paused { frame: 0 }, render: Some(0) });
    }

    #[test]
    fn reopen_resets_everything() {
        let mut ctl = loaded(10);
        ctl.toggle_play();
        ctl.begin_seek_gesture();
        ctl.seek(7.);
        let t = ctl.open(3);
        assert_eq!(t.state, Paused { frame: 0 });
        assert!(!ctl.is_seeking());
        assert_eq!(ctl.frame_count(), 3);
        assert_eq!(ctl.close().state, Unloaded);
    }
}
