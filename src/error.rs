/*!
# Unified Error Type

A flat error enum covering every failure kind that can arise while serving the
MST command protocol, from a malformed command line up to a fatal reactor
failure. Mirrors the shape of `graphina`'s original `GraphinaError`: a plain
`enum` with a hand-written `Display`/`Error` impl rather than a derive macro,
since most variants carry a free-form message rather than structured fields.
*/

use std::error::Error;
use std::fmt;

/// Unified error type for graph, MST, and server operations.
#[derive(Debug)]
pub enum MstError {
    /// Command line could not be parsed (wrong arity, non-integer token, unknown verb).
    InputMalformed(String),

    /// A precondition the command depends on was not met (no graph, no MST, bad vertex, ...).
    PreconditionUnmet(String),

    /// A try-lock on shared state failed; the caller should report "resource busy".
    Contention(String),

    /// The underlying transport failed or the peer closed the connection.
    Transport(String),

    /// Listener/socket setup failed irrecoverably.
    FatalSetup(String),

    /// The reactor's multiplex wait failed for a reason other than an interrupted syscall.
    FatalRuntime(String),
}

impl MstError {
    pub fn malformed(message: impl Into<String>) -> Self {
        MstError::InputMalformed(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        MstError::PreconditionUnmet(message.into())
    }

    pub fn contention(message: impl Into<String>) -> Self {
        MstError::Contention(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        MstError::Transport(message.into())
    }

    pub fn fatal_setup(message: impl Into<String>) -> Self {
        MstError::FatalSetup(message.into())
    }

    pub fn fatal_runtime(message: impl Into<String>) -> Self {
        MstError::FatalRuntime(message.into())
    }

    /// The one-line message sent back to the client for per-command failures.
    ///
    /// Transport/fatal variants are never rendered to a client; they close the
    /// session or terminate the process instead.
    pub fn client_message(&self) -> String {
        match self {
            MstError::InputMalformed(msg) | MstError::PreconditionUnmet(msg) => msg.clone(),
            MstError::Contention(_) => "Resource busy, try again.".to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for MstError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MstError::InputMalformed(msg) => write!(f, "Invalid command: {msg}"),
            MstError::PreconditionUnmet(msg) => write!(f, "{msg}"),
            MstError::Contention(msg) => write!(f, "resource busy: {msg}"),
            MstError::Transport(msg) => write!(f, "transport error: {msg}"),
            MstError::FatalSetup(msg) => write!(f, "fatal setup error: {msg}"),
            MstError::FatalRuntime(msg) => write!(f, "fatal runtime error: {msg}"),
        }
    }
}

impl Error for MstError {}

impl From<std::io::Error> for MstError {
    fn from(e: std::io::Error) -> Self {
        MstError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MstError>;
