//! Normalised HTTP/WebDAV method tokens.

use std::fmt;

/// An HTTP method as used for dispatch-table lookup.
///
/// Parsing is case-insensitive and total: verbs outside the known WebDAV
/// set become [`Method::Extension`] values carrying the upper-cased token,
/// so an unrecognised method is a routable value rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `PROPFIND`
    Propfind,
    /// `PROPPATCH`
    Proppatch,
    /// `MKCOL`
    Mkcol,
    /// `COPY`
    Copy,
    /// `MOVE`
    Move,
    /// `LOCK`
    Lock,
    /// `UNLOCK`
    Unlock,
    /// Any other verb, normalised to upper case.
    Extension(String),
}

impl Method {
    /// Parses a method token (case-insensitive). Never fails.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let normalised = token.trim().to_ascii_uppercase();
        match normalised.as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PUT" => Self::Put,
            "POST" => Self::Post,
            "DELETE" => Self::Delete,
            "PROPFIND" => Self::Propfind,
            "PROPPATCH" => Self::Proppatch,
            "MKCOL" => Self::Mkcol,
            "COPY" => Self::Copy,
            "MOVE" => Self::Move,
            "LOCK" => Self::Lock,
            "UNLOCK" => Self::Unlock,
            _ => Self::Extension(normalised),
        }
    }

    /// Returns the canonical upper-case token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Propfind => "PROPFIND",
            Self::Proppatch => "PROPPATCH",
            Self::Mkcol => "MKCOL",
            Self::Copy => "COPY",
            Self::Move => "MOVE",
            Self::Lock => "LOCK",
            Self::Unlock => "UNLOCK",
            Self::Extension(token) => token,
        }
    }

    /// Returns true for the verbs that mutate the resource tree and thus
    /// trigger snapshot persistence: PROPPATCH, DELETE, MKCOL, MOVE, COPY,
    /// POST and PUT.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Proppatch
                | Self::Delete
                | Self::Mkcol
                | Self::Move
                | Self::Copy
                | Self::Post
                | Self::Put
        )
    }
}

impl fmt::Display for Method {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Method::parse("get"), Method::Get);
        assert_eq!(Method::parse("Get"), Method::Get);
        assert_eq!(Method::parse("PROPFIND"), Method::Propfind);
        assert_eq!(Method::parse("proppatch"), Method::Proppatch);
        assert_eq!(Method::parse("mkcol"), Method::Mkcol);
    }

    #[test]
    fn unknown_verbs_become_extensions() {
        let method = Method::parse("frob");
        assert_eq!(method, Method::Extension("FROB".to_owned()));
        assert_eq!(method.as_str(), "FROB");
    }

    #[test]
    fn mutating_set_matches_persistence_triggers() {
        for token in ["PROPPATCH", "DELETE", "MKCOL", "MOVE", "COPY", "POST", "PUT"] {
            assert!(Method::parse(token).is_mutating(), "{token}");
        }
        for token in ["GET", "HEAD", "OPTIONS", "PROPFIND", "LOCK", "UNLOCK", "FROB"] {
            assert!(!Method::parse(token).is_mutating(), "{token}");
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for token in ["GET", "MOVE", "FROB"] {
            let method = Method::parse(token);
            assert_eq!(Method::parse(&method.to_string()), method);
        }
    }
}
