use std::fmt;

#[derive(Debug)]
pub enum ClipError {
    Initialization(String),
    PermissionDenied(String),
    Capture(String),
    Stream(String),
    Encoding(String),
    Muxing(String),
    Io(String),
    Concat(String),
    Export(String),
}

impl fmt::Display for ClipError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClipError::Initialization(msg) => write!(f, "Camera initialization error: {}", msg),
            ClipError::PermissionDenied(msg) => write!(f, "Permission denied error: {}", msg),
            ClipError::Capture(msg) => write!(f, "Capture error: {}", msg),
            ClipError::Stream(msg) => write!(f, "Stream error: {}", msg),
            ClipError::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            ClipError::Muxing(msg) => write!(f, "Muxing error: {}", msg),
            ClipError::Io(msg) => write!(f, "IO error: {}", msg),
            ClipError::Concat(msg) => write!(f, "Concatenation error: {}", msg),
            ClipError::Export(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl std::error::Error for ClipError {}
