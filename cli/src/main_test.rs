use super::*;

#[test]
fn parses_login_with_password_flag() {
    let cli = Cli::try_parse_from(["itsm", "login", "--username", "jane", "--password", "pw"]).unwrap();
    match cli.command {
        Command::Login { username, password } => {
            assert_eq!(username, "jane");
            assert_eq!(password.as_deref(), Some("pw"));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn list_defaults_to_first_page_of_ten() {
    let cli = Cli::try_parse_from(["itsm", "list", "tickets/"]).unwrap();
    match cli.command {
        Command::List { path, page, page_size } => {
            assert_eq!(path, "tickets/");
            assert_eq!((page, page_size), (1, 10));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn global_flags_precede_subcommand() {
    let cli = Cli::try_parse_from([
        "itsm",
        "--base-url",
        "https://desk.example.com/api/",
        "--session-file",
        "/tmp/itsm.json",
        "-v",
        "whoami",
    ])
    .unwrap();
    assert_eq!(cli.base_url.as_deref(), Some("https://desk.example.com/api/"));
    assert_eq!(cli.session_file, Some(PathBuf::from("/tmp/itsm.json")));
    assert!(cli.verbose);
    assert!(matches!(cli.command, Command::Whoami));
}

#[test]
fn base_url_flag_is_normalized() {
    let config = resolve_config(Some("https://desk.example.com/api/")).unwrap();
    assert_eq!(config.base_url, "https://desk.example.com/api");
    assert_eq!(config.url("tickets/"), "https://desk.example.com/api/tickets/");
}

#[test]
fn login_requires_username() {
    assert!(Cli::try_parse_from(["itsm", "login"]).is_err());
}
