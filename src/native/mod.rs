/// Native module runs submissions as plain child processes of the judge,
/// without containers or kernel isolation. Every run gets its own
/// workspace directory that disappears with the run.
pub mod probe;
pub mod sandbox;
pub mod toolchain;
pub mod workspace;
