//! EHLO keywords the client acts on.

/// What an EHLO reply advertised.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    /// `STARTTLS` was listed.
    pub starttls: bool,
    /// Mechanism names from the `AUTH` line, uppercased. `None` when the
    /// server sent no `AUTH` line.
    pub auth: Option<Vec<String>>,
}

impl Extensions {
    /// Reads the keyword lines of an EHLO reply, greeting line excluded.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut found = Self::default();
        for line in lines {
            let mut words = line.split_whitespace().map(str::to_ascii_uppercase);
            let Some(keyword) = words.next() else {
                continue;
            };

            if keyword == "STARTTLS" {
                found.starttls = true;
            } else if keyword == "AUTH" {
                found.auth.get_or_insert_with(Vec::new).extend(words);
            } else if let Some(first) = keyword.strip_prefix("AUTH=") {
                // "AUTH=LOGIN PLAIN" from pre-RFC 4954 servers
                let names = found.auth.get_or_insert_with(Vec::new);
                names.push(first.to_string());
                names.extend(words);
            }
        }
        found
    }

    /// Advertised mechanisms this client can use, in advertised order.
    #[must_use]
    pub fn mechanisms(&self) -> Vec<AuthMechanism> {
        self.auth
            .iter()
            .flatten()
            .filter_map(|name| AuthMechanism::parse(name))
            .collect()
    }
}

/// SASL mechanisms the client implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMechanism {
    /// RFC 4616, credentials in one initial response.
    Plain,
    /// Username and password in two 334 round trips.
    Login,
}

impl AuthMechanism {
    /// Matches a mechanism name, ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("PLAIN") {
            Some(Self::Plain)
        } else if name.eq_ignore_ascii_case("LOGIN") {
            Some(Self::Login)
        } else {
            None
        }
    }

    /// Name as sent in `AUTH`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "PLAIN",
            Self::Login => "LOGIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starttls_in_any_case() {
        assert!(Extensions::from_lines(["starttls"]).starttls);
        assert!(!Extensions::from_lines(["8BITMIME", "SIZE 1000"]).starttls);
    }

    #[test]
    fn auth_keeps_unusable_names() {
        let ext = Extensions::from_lines(["AUTH xoauth2 LOGIN PLAIN"]);
        assert_eq!(
            ext.auth,
            Some(vec!["XOAUTH2".into(), "LOGIN".into(), "PLAIN".into()])
        );
        assert_eq!(
            ext.mechanisms(),
            vec![AuthMechanism::Login, AuthMechanism::Plain]
        );
    }

    #[test]
    fn legacy_auth_equals_form() {
        let ext = Extensions::from_lines(["AUTH=LOGIN PLAIN"]);
        assert_eq!(
            ext.mechanisms(),
            vec![AuthMechanism::Login, AuthMechanism::Plain]
        );
    }

    #[test]
    fn no_auth_line() {
        let ext = Extensions::from_lines(["PIPELINING", "", "AUTHX PLAIN"]);
        assert_eq!(ext.auth, None);
        assert!(ext.mechanisms().is_empty());
    }

    #[test]
    fn mechanism_names() {
        assert_eq!(AuthMechanism::parse("plain"), Some(AuthMechanism::Plain));
        assert_eq!(AuthMechanism::parse("CRAM-MD5"), None);
        assert_eq!(AuthMechanism::Login.as_str(), "LOGIN");
    }
}
