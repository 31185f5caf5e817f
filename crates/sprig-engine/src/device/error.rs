/// What the caller should do after a surface acquisition error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was configured again; the next frame may render.
    Reconfigured,
    /// Drop this frame and try the next one.
    SkipFrame,
    /// Unrecoverable (usually out of memory); shut down.
    Fatal,
}
