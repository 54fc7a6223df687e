// Error kinds and context shared by the registry, negotiation, loader, and host.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Conversion,
    PackageNotFound,
    VersionIncompatible,
    StubsUnsupported,
    ModuleLoad,
    UnknownCommand,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    package: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            package: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Message text as the host records it in the interpreter result.
    pub fn result_text(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => default_message(self.kind).to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(package) = &self.package {
            write!(f, " (package: {package})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn default_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "usage error",
        ErrorKind::Conversion => "conversion error",
        ErrorKind::PackageNotFound => "package not found",
        ErrorKind::VersionIncompatible => "version conflict",
        ErrorKind::StubsUnsupported => "stubs not supported",
        ErrorKind::ModuleLoad => "module load failed",
        ErrorKind::UnknownCommand => "invalid command name",
        ErrorKind::Io => "i/o error",
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Conversion => 3,
        ErrorKind::PackageNotFound => 4,
        ErrorKind::VersionIncompatible => 5,
        ErrorKind::StubsUnsupported => 6,
        ErrorKind::ModuleLoad => 7,
        ErrorKind::UnknownCommand => 8,
        ErrorKind::Io => 9,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use std::error::Error as _;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Conversion, 3),
            (ErrorKind::PackageNotFound, 4),
            (ErrorKind::VersionIncompatible, 5),
            (ErrorKind::StubsUnsupported, 6),
            (ErrorKind::ModuleLoad, 7),
            (ErrorKind::UnknownCommand, 8),
            (ErrorKind::Io, 9),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_package_and_source_chain() {
        let inner = Error::new(ErrorKind::VersionIncompatible).with_message("have 8.6.0, need 9");
        let err = Error::new(ErrorKind::ModuleLoad)
            .with_message("Sample_Init failed")
            .with_package("Sample")
            .with_source(inner);
        assert_eq!(
            err.to_string(),
            "ModuleLoad: Sample_Init failed (package: Sample)"
        );
        let source = err.source().expect("source");
        assert!(source.to_string().contains("have 8.6.0, need 9"));
    }

    #[test]
    fn result_text_falls_back_to_kind_default() {
        let err = Error::new(ErrorKind::StubsUnsupported);
        assert_eq!(err.result_text(), "stubs not supported");
    }
}
