//! Console command parsing
//!
//! One line in, one `Command` out. Verbs are case-insensitive; arguments are
//! taken verbatim. Blank lines parse to `None` so the read loop can skip
//! them without special-casing.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Register { email: String, password: String },
    Login { email: String, password: String },
    Verify { subject_id: String },
    Status { subject_id: String },
    Refresh,
    Logout,
    Whoami,
    Demo,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command: {0} (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = parts.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("register", [email, password]) => Command::Register {
            email: (*email).to_string(),
            password: (*password).to_string(),
        },
        ("register", _) => return Err(ParseError::Usage("register <email> <password>")),
        ("login", [email, password]) => Command::Login {
            email: (*email).to_string(),
            password: (*password).to_string(),
        },
        ("login", _) => return Err(ParseError::Usage("login <email> <password>")),
        ("verify", [subject_id]) => Command::Verify {
            subject_id: (*subject_id).to_string(),
        },
        ("verify", _) => return Err(ParseError::Usage("verify <subject-id>")),
        ("status", [subject_id]) => Command::Status {
            subject_id: (*subject_id).to_string(),
        },
        ("status", _) => return Err(ParseError::Usage("status <subject-id>")),
        ("refresh", []) => Command::Refresh,
        ("refresh", _) => return Err(ParseError::Usage("refresh")),
        ("logout", []) => Command::Logout,
        ("logout", _) => return Err(ParseError::Usage("logout")),
        ("whoami", []) => Command::Whoami,
        ("whoami", _) => return Err(ParseError::Usage("whoami")),
        ("demo", []) => Command::Demo,
        ("demo", _) => return Err(ParseError::Usage("demo")),
        ("help", []) => Command::Help,
        ("help", _) => return Err(ParseError::Usage("help")),
        ("quit" | "exit", []) => Command::Quit,
        ("quit" | "exit", _) => return Err(ParseError::Usage("quit")),
        (other, _) => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

pub fn help_text() -> &'static str {
    "commands:\n  register <email> <password>   create an account\n  login <email> <password>      start a session\n  verify <subject-id>           activate an account with its emailed code\n  status <subject-id>           check whether an account is enabled\n  refresh                       mint a fresh access token now\n  logout                        end the session\n  whoami                        show session state\n  demo                          call the authenticated probe endpoint\n  help                          this text\n  quit                          leave"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_with_both_arguments() {
        let command = parse("register user@example.com pw1234567").unwrap().unwrap();
        assert_eq!(
            command,
            Command::Register {
                email: "user@example.com".into(),
                password: "pw1234567".into(),
            }
        );
    }

    #[test]
    fn register_without_password_is_usage_error() {
        let err = parse("register user@example.com").unwrap_err();
        assert_eq!(err, ParseError::Usage("register <email> <password>"));
        assert!(err.to_string().starts_with("usage: "));
    }

    #[test]
    fn parses_login() {
        let command = parse("login user@example.com pw1234567").unwrap().unwrap();
        assert!(matches!(command, Command::Login { .. }));
    }

    #[test]
    fn parses_verify_and_status_with_subject_id() {
        assert_eq!(
            parse("verify subj-42").unwrap().unwrap(),
            Command::Verify {
                subject_id: "subj-42".into()
            }
        );
        assert_eq!(
            parse("status subj-42").unwrap().unwrap(),
            Command::Status {
                subject_id: "subj-42".into()
            }
        );
    }

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse("refresh").unwrap().unwrap(), Command::Refresh);
        assert_eq!(parse("logout").unwrap().unwrap(), Command::Logout);
        assert_eq!(parse("whoami").unwrap().unwrap(), Command::Whoami);
        assert_eq!(parse("demo").unwrap().unwrap(), Command::Demo);
        assert_eq!(parse("help").unwrap().unwrap(), Command::Help);
    }

    #[test]
    fn quit_and_exit_both_quit() {
        assert_eq!(parse("quit").unwrap().unwrap(), Command::Quit);
        assert_eq!(parse("exit").unwrap().unwrap(), Command::Quit);
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(parse("LOGOUT").unwrap().unwrap(), Command::Logout);
        assert!(matches!(
            parse("Login a@b.co pw1234567").unwrap().unwrap(),
            Command::Login { .. }
        ));
    }

    #[test]
    fn arguments_keep_their_case() {
        let command = parse("login User@Example.COM Secret1").unwrap().unwrap();
        assert_eq!(
            command,
            Command::Login {
                email: "User@Example.COM".into(),
                password: "Secret1".into(),
            }
        );
    }

    #[test]
    fn blank_lines_parse_to_none() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   \t  ").unwrap(), None);
    }

    #[test]
    fn unknown_verb_is_reported() {
        let err = parse("frobnicate").unwrap_err();
        assert_eq!(err, ParseError::Unknown("frobnicate".into()));
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn extra_arguments_on_bare_command_are_rejected() {
        assert_eq!(parse("logout now").unwrap_err(), ParseError::Usage("logout"));
        assert_eq!(parse("demo please").unwrap_err(), ParseError::Usage("demo"));
    }

    #[test]
    fn help_text_mentions_every_command() {
        let help = help_text();
        for verb in [
            "register", "login", "verify", "status", "refresh", "logout", "whoami", "demo",
            "help", "quit",
        ] {
            assert!(help.contains(verb), "help text is missing: {verb}");
        }
    }
}
