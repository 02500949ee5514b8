use thiserror::Error;

/// Errors raised while assembling a demo from a scene description.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("unknown demo kind `{0}` (expected `static` or `physics`)")]
    UnknownDemo(String),

    #[error("the physics demo needs an object of type `player`")]
    MissingPlayer,

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Errors raised while parsing a scripted key timeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("script entry `{0}` must look like `frame:down|up|repeat:Code`")]
    Malformed(String),

    #[error("script entry `{entry}` has an invalid frame number")]
    InvalidFrame { entry: String },

    #[error("script entry `{entry}` uses unknown key state `{state}`")]
    UnknownState { entry: String, state: String },

    #[error("script entry `{entry}` uses unknown key code `{code}`")]
    UnknownKey { entry: String, code: String },
}
