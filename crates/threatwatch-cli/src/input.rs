//! Shell command parsing and prompt helpers.

use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(Option<String>),
    Register,
    Logout,
    Open(String),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Command::Empty;
        };
        let arg = parts.next().map(str::to_string);

        match verb.to_lowercase().as_str() {
            "login" | "signin" => Command::Login(arg),
            "register" | "signup" => Command::Register,
            "logout" | "signout" => Command::Logout,
            "open" | "go" | "cd" => match arg {
                Some(path) => Command::Open(normalize_path(&path)),
                None => Command::Unknown(line.trim().to_string()),
            },
            "status" | "whoami" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Unknown(line.trim().to_string()),
        }
    }
}

/// Accept `alerts` as shorthand for `/alerts`.
fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

pub const HELP: &str = "\
Commands:
  login [username]   sign in
  register           create an account
  logout             sign out
  open <path>        go to a page (/, /dashboard, /alerts, /network-traffic, /settings)
  status             show the current session
  help               show this help
  quit               exit";

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn is_valid_username(value: &str) -> bool {
    value.chars().count() <= MAX_USERNAME_LENGTH && value.chars().all(is_valid_input_char)
}

pub fn is_valid_password(value: &str) -> bool {
    value.chars().count() <= MAX_PASSWORD_LENGTH && value.chars().all(is_valid_input_char)
}

/// Print `label` and read one trimmed line. `None` on end of input.
pub fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub fn prompt_password(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(label)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("login"), Command::Login(None));
        assert_eq!(Command::parse("  LOGIN alice "), Command::Login(Some("alice".to_string())));
        assert_eq!(Command::parse("register"), Command::Register);
        assert_eq!(Command::parse("logout"), Command::Logout);
        assert_eq!(Command::parse("status"), Command::Status);
        assert_eq!(Command::parse("exit"), Command::Quit);
        assert_eq!(Command::parse(""), Command::Empty);
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn test_parse_open_normalizes_path() {
        assert_eq!(Command::parse("open /alerts"), Command::Open("/alerts".to_string()));
        assert_eq!(Command::parse("go settings"), Command::Open("/settings".to_string()));
        assert_eq!(Command::parse("open"), Command::Unknown("open".to_string()));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Command::parse("scan now"), Command::Unknown("scan now".to_string()));
    }

    #[test]
    fn test_username_validation() {
        assert!(is_valid_username("alice"));
        assert!(is_valid_username(&"a".repeat(50)));
        assert!(!is_valid_username(&"a".repeat(51)));
        assert!(!is_valid_username("al\tice"));
    }

    #[test]
    fn test_password_validation() {
        assert!(is_valid_password("correct horse battery staple!"));
        assert!(is_valid_password(&"p".repeat(128)));
        assert!(!is_valid_password(&"p".repeat(129)));
        assert!(!is_valid_password("pass\u{0}word"));
    }
}
