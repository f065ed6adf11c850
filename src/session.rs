//! Session lock state, consulted by the frame loop next to occlusion.

/// Whether the interactive desktop is currently shown to the user.
pub trait SessionState {
    /// True while the workstation is locked (or the secure desktop is up).
    fn is_desktop_locked(&self) -> bool;
}

/// Frame gate combining lock state and occlusion: rendering is pointless
/// when either hides the surface.
pub fn should_skip_frame<S: SessionState + ?Sized>(session: &S, occluded: bool) -> bool {
    occluded || session.is_desktop_locked()
}
