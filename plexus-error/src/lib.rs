use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

pub type PlexusResult<T> = Result<T, PlexusError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    Configuration,
    Cancellation,
    Evaluation,
    MutationSentinel,
    MutationExhaustion,
    RegistryNotFound,
    RegistryDuplicate,
    RegistryVersionMismatch,
    RegistryIncompatible,
    Multiple,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

/// Sentinel reasons an operator can raise to signal "no applicable target",
/// recovered locally by the mutation chooser rather than surfaced as fatal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SentinelKind {
    NoSynapses,
    NoNeurons,
}

impl Display for SentinelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSynapses => write!(f, "no synapses to operate on"),
            Self::NoNeurons => write!(f, "no neurons to operate on"),
        }
    }
}

#[derive(Debug)]
pub enum PlexusError {
    Configuration {
        message: ErrString,
    },
    Cancellation,
    Evaluation {
        message: ErrString,
    },
    MutationSentinel {
        kind: SentinelKind,
        operator: ErrString,
    },
    MutationExhaustion {
        attempted: usize,
        budget: usize,
    },
    RegistryNotFound {
        name: ErrString,
    },
    RegistryDuplicate {
        name: ErrString,
    },
    RegistryVersionMismatch {
        name: ErrString,
        message: ErrString,
    },
    RegistryIncompatible {
        name: ErrString,
        message: ErrString,
    },

    Multiple(MultiDisplay),

    Context {
        context: ErrorContext,
        source: Box<PlexusError>,
        #[cfg(feature = "backtrace")]
        backtrace: Backtrace,
    },
}

impl PlexusError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { .. } => ErrorCode::Configuration,
            Self::Cancellation => ErrorCode::Cancellation,
            Self::Evaluation { .. } => ErrorCode::Evaluation,
            Self::MutationSentinel { .. } => ErrorCode::MutationSentinel,
            Self::MutationExhaustion { .. } => ErrorCode::MutationExhaustion,
            Self::RegistryNotFound { .. } => ErrorCode::RegistryNotFound,
            Self::RegistryDuplicate { .. } => ErrorCode::RegistryDuplicate,
            Self::RegistryVersionMismatch { .. } => ErrorCode::RegistryVersionMismatch,
            Self::RegistryIncompatible { .. } => ErrorCode::RegistryIncompatible,
            Self::Multiple(_) => ErrorCode::Multiple,
            Self::Context { .. } => ErrorCode::Context,
        }
    }

    /// True for the sentinel "no-target" family the mutation chooser retries locally.
    pub fn is_mutation_sentinel(&self) -> bool {
        matches!(self, Self::MutationSentinel { .. })
    }

    pub fn with_context(self, msg: impl Into<String>) -> Self {
        PlexusError::Context {
            context: ErrorContext::new(msg),
            source: Box::new(self),
            #[cfg(feature = "backtrace")]
            backtrace: Backtrace::capture(),
        }
    }
}

impl Display for PlexusError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "invalid configuration: {}", message),
            Self::Cancellation => write!(f, "run cancelled"),
            Self::Evaluation { message } => write!(f, "evaluation error: {}", message),
            Self::MutationSentinel { kind, operator } => {
                write!(f, "operator {} found {}", operator, kind)
            }
            Self::MutationExhaustion { attempted, budget } => write!(
                f,
                "mutation retry budget exhausted: {attempted} attempts against a budget of {budget}"
            ),
            Self::RegistryNotFound { name } => write!(f, "registry entry not found: {}", name),
            Self::RegistryDuplicate { name } => {
                write!(f, "duplicate registry entry: {}", name)
            }
            Self::RegistryVersionMismatch { name, message } => {
                write!(f, "version mismatch for {}: {}", name, message)
            }
            Self::RegistryIncompatible { name, message } => {
                write!(f, "incompatible registry entry {}: {}", name, message)
            }
            Self::Multiple(m) => write!(f, "multiple errors:\n{}", m),
            Self::Context { context, source, .. } => write!(f, "{}\nCaused by: {}", context, source),
        }
    }
}

impl std::error::Error for PlexusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ErrorContext {
    message: String,
}
impl ErrorContext {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}
impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl std::error::Error for ErrorContext {}

#[derive(Debug)]
pub struct MultiDisplay(Vec<PlexusError>);
impl Display for MultiDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {} (code: {:?})", i, e, e.code())?;
        }
        Ok(())
    }
}
impl From<Vec<PlexusError>> for MultiDisplay {
    fn from(v: Vec<PlexusError>) -> Self {
        Self(v)
    }
}

pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> PlexusResult<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> PlexusResult<T>;
}

impl<T, E: Into<PlexusError>> ResultExt<T> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> PlexusResult<T> {
        self.map_err(|e| e.into().with_context(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> PlexusResult<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[doc(hidden)]
pub mod __private {
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(e: E) -> E {
        e
    }
}

#[macro_export]
macro_rules! plexus_err {
    (Configuration: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::PlexusError::Configuration { message: format!($fmt, $($arg),*).into() })
    };
    (Evaluation: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::PlexusError::Evaluation { message: format!($fmt, $($arg),*).into() })
    };
    (RegistryNotFound: $name:expr) => {
        $crate::__private::must_use($crate::PlexusError::RegistryNotFound { name: $name.into() })
    };
    (RegistryDuplicate: $name:expr) => {
        $crate::__private::must_use($crate::PlexusError::RegistryDuplicate { name: $name.into() })
    };
}

#[macro_export]
macro_rules! plexus_bail {
    ($($tt:tt)+) => { return Err($crate::plexus_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($tt:tt)+) => {
        if !$cond { $crate::plexus_bail!($($tt)+); }
    };
}
