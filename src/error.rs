use snafu::Snafu;

/// The error type for this crate (spec section 7's taxonomy).
///
/// Variants are public, since a host implementing [`crate::visitor::ReadVisitor`] or
/// [`crate::visitor::WriteEmitter`] calls straight into [`crate::session::Session`] helpers that
/// can fail — there is no single crate boundary to hide the error shape behind the way a
/// whole-file parser has. The enum is `#[non_exhaustive]` so a future variant isn't a breaking
/// change, and only this crate can build one directly.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(context(suffix(false)))]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("{}: cannot open the MIDI file: {}", site, source))]
    Open { site: String, source: std::io::Error },

    #[snafu(display("{}: cannot determine the file size", site))]
    FileSize { site: String },

    #[snafu(display("{}: file is missing the required MThd chunk", site))]
    NoMidi { site: String },

    #[snafu(display("{}: read error: {}", site, source))]
    Io { site: String, source: std::io::Error },

    #[snafu(display("{}: write error: {}", site, source))]
    Write { site: String, source: std::io::Error },

    #[snafu(display("{}: malformed MIDI data: {}", site, description))]
    Bad { site: String, description: String },

    #[snafu(display("{}: running status used where none was latched", site))]
    Status { site: String },

    #[snafu(display("{}: unknown status byte {:#04x} inside MTrk", site, status))]
    Event { site: String, status: u8 },

    #[snafu(display("{}: host callback returned error code {}", site, code))]
    Host { site: String, code: i32 },
}

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! site {
    () => {
        format!("{}:{}", file!(), line!())
    };
}

/// Shorthand for the `error::Io` snafu context selector, stamped with the call site.
macro_rules! io {
    () => {
        crate::error::Io { site: site!() }
    };
}

/// Shorthand for the `error::Write` snafu context selector, stamped with the call site.
macro_rules! wr {
    () => {
        crate::error::Write { site: site!() }
    };
}

/// Builds and returns an `Err(Error::Bad { .. })`, matching `MIDIERRBAD`.
macro_rules! bad {
    ($msg:expr) => {
        return crate::error::Bad {
            site: site!(),
            description: $msg,
        }
        .fail()
    };
    ($fmt:expr, $($arg:expr),+) => {
        return crate::error::Bad {
            site: site!(),
            description: format!($fmt, $($arg),+),
        }
        .fail()
    };
}

impl Error {
    /// The numeric error code from spec section 7's taxonomy (1-8). Codes 9 and above are
    /// host-defined and only ever appear wrapped from a callback's own return value.
    pub fn code(&self) -> i32 {
        match self {
            Error::Open { .. } => 1,
            Error::FileSize { .. } => 2,
            Error::NoMidi { .. } => 3,
            Error::Io { .. } => 4,
            Error::Write { .. } => 5,
            Error::Bad { .. } => 6,
            Error::Status { .. } => 7,
            Error::Event { .. } => 8,
            Error::Host { code, .. } => *code,
        }
    }

    /// Wraps a non-zero host callback return code as a fatal error (spec section 6.2), which the
    /// engine then propagates upward unchanged.
    pub fn from_host_code(code: i32) -> Self {
        Error::Host {
            site: site!(),
            code,
        }
    }
}

/// Mirrors the original DLL's `MidiGetErr`: formats a diagnostic string for a bare numeric
/// error code, without requiring a live `Error` value (spec section 6.3's `error_message`
/// helper).
pub fn error_message(code: i32) -> &'static str {
    match code {
        1 => "cannot open the MIDI file",
        2 => "cannot determine the file size",
        3 => "file is missing the required MThd chunk",
        4 => "read error or short read",
        5 => "write error",
        6 => "malformed MIDI data",
        7 => "running status used where none was latched",
        8 => "unknown status byte inside MTrk",
        _ => "host-defined error",
    }
}

#[test]
fn site_test() {
    let line = line!() + 1;
    let site = site!();
    assert!(site.contains("error.rs"));
    assert!(site.contains(format!("{}", line).as_str()));
}

#[test]
fn error_codes_match_taxonomy() {
    assert_eq!(3, Error::NoMidi { site: site!() }.code());
    assert_eq!(
        6,
        Error::Bad {
            site: site!(),
            description: "x".into()
        }
        .code()
    );
    assert_eq!(7, Error::Status { site: site!() }.code());
    assert_eq!(
        8,
        Error::Event {
            site: site!(),
            status: 0x00
        }
        .code()
    );
    assert_eq!(42, Error::from_host_code(42).code());
}

#[test]
fn error_message_matches_taxonomy() {
    assert_eq!("file is missing the required MThd chunk", error_message(3));
    assert_eq!("host-defined error", error_message(42));
}
