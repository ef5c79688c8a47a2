use clap::{CommandFactory, Parser};
use shadowgen::generate_shadow_line;
use snafu::ResultExt;
use std::ffi::OsString;
use std::time::SystemTime;
use zeroize::Zeroizing;

/// Generate the /etc/shadow line for a user and password.
///
/// The password is hashed with the MD5-based crypt format ($1$). When SALT
/// is missing (or empty) a random 8-character alphanumeric salt is generated.
#[derive(Parser)]
#[command(name = "shadowgen")]
#[command(version, about, long_about)]
struct Cli {
    /// A user name, as in /etc/passwd
    user: Option<String>,
    /// The chosen password for this user
    password: Option<OsString>,
    /// Salt to hash the password with
    salt: Option<String>,
}

type Result<T> = ::std::result::Result<T, snafu::Whatever>;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let (Some(user), Some(password)) = (cli.user, cli.password) else {
        log::debug!("USER or PASSWORD missing, printing usage");
        print!("{}", Cli::command().render_long_help());
        return Ok(());
    };

    let password = Zeroizing::new(password.into_encoded_bytes());
    let salt = cli.salt.as_deref().filter(|salt| !salt.is_empty());

    let line = generate_shadow_line(&user, password.as_slice(), salt, SystemTime::now())
        .whatever_context("Can't generate shadow line")?;

    println!("{}", line);
    Ok(())
}

#[snafu::report]
fn main() -> Result<()> {
    run()
}
