use std::{error::Error, fmt, io};

pub type GenericError = Box<dyn Error + Send + Sync + 'static>;

/// Fatal conditions that abort a trace. Per-probe failures (timeouts, send
/// errors) are not errors at this level; they are absorbed into the hop
/// results.
#[derive(Debug)]
pub enum TraceError {
    /// The destination name could not be turned into an IPv4 address. The
    /// sweep never starts.
    ResolutionFailure { destination: String, cause: String },
    /// Raw ICMP channel creation is not permitted. Distinct from a probe
    /// timeout so a caller can fall back to a non-raw strategy.
    PermissionDenied { cause: io::Error },
    /// The raw channel could not be opened for a reason other than missing
    /// privileges.
    ChannelOpen { cause: io::Error },
    /// The session parameters are unusable (zero queries, out-of-range
    /// max hops, ...).
    InvalidSession { message: String },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            TraceError::ResolutionFailure { destination, cause } => {
                write!(f, "cannot resolve host '{destination}': {cause}")
            }
            TraceError::PermissionDenied { cause } => {
                write!(f, "raw ICMP socket requires elevated privileges: {cause}")
            }
            TraceError::ChannelOpen { cause } => {
                write!(f, "cannot open raw ICMP socket: {cause}")
            }
            TraceError::InvalidSession { message } => {
                write!(f, "invalid session parameters: {message}")
            }
        }
    }
}

impl Error for TraceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TraceError::PermissionDenied { cause } | TraceError::ChannelOpen { cause } => {
                Some(cause)
            }
            _ => None,
        }
    }
}

impl TraceError {
    /// Classifies a raw-socket open failure.
    pub(crate) fn from_open_error(cause: io::Error) -> TraceError {
        if cause.kind() == io::ErrorKind::PermissionDenied {
            TraceError::PermissionDenied { cause }
        } else {
            TraceError::ChannelOpen { cause }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn fmt_resolution_failure() {
        let error = TraceError::ResolutionFailure {
            destination: "no.such.host".to_string(),
            cause: "not found".to_string(),
        };
        assert_eq!(
            "cannot resolve host 'no.such.host': not found",
            format!("{error}")
        );
    }

    #[test]
    fn open_error_classification() {
        let denied = TraceError::from_open_error(io::Error::from(ErrorKind::PermissionDenied));
        assert!(matches!(denied, TraceError::PermissionDenied { .. }));

        let other = TraceError::from_open_error(io::Error::from(ErrorKind::AddrNotAvailable));
        assert!(matches!(other, TraceError::ChannelOpen { .. }));
    }

    #[test]
    fn permission_denied_keeps_source() {
        let error = TraceError::PermissionDenied {
            cause: io::Error::from(ErrorKind::PermissionDenied),
        };
        assert!(error.source().is_some());
    }
}
