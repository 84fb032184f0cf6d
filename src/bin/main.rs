use anyhow::{bail, Context, Error};
use librarium::{
    endpoints::{Payment, Registration},
    CredentialsFile, Identity, Role, SessionManager,
};
use std::path::PathBuf;
use structopt::StructOpt;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    log::debug!("Starting with {:#?}", args);

    let client = librarium::default_client()?;
    let credentials = CredentialsFile::new(credentials_dir()?);
    let manager =
        SessionManager::new(client.clone(), args.base_url.clone(), credentials);

    // Pick up any session left over from a previous run before doing
    // anything else.
    manager.bootstrap().await;

    match args.cmd {
        Command::Status => status(&client, &args.base_url, &manager).await,
        Command::Login { email, password } => {
            login(&client, &args.base_url, &manager, &email, &password).await
        },
        Command::Register {
            username,
            email,
            password,
            role,
            payment_method,
            payment_details,
        } => {
            register(
                &client,
                &args.base_url,
                &manager,
                &username,
                &email,
                &password,
                role,
                payment_method.as_deref(),
                payment_details.as_deref(),
            )
            .await
        },
        Command::Whoami => whoami(&manager),
        Command::Logout => {
            manager.logout();
            println!("Logged out.");
            Ok(())
        },
    }
}

async fn status(
    client: &reqwest::Client,
    base_url: &Url,
    manager: &SessionManager,
) -> Result<(), Error> {
    let health = librarium::probe(client, base_url.as_str()).await;
    println!("{}", health.diagnostic);

    match manager.session().current().identity() {
        Some(identity) => println!("Logged in as {}", identity.username),
        None => println!("Not logged in."),
    }

    Ok(())
}

async fn login(
    client: &reqwest::Client,
    base_url: &Url,
    manager: &SessionManager,
    email: &str,
    password: &str,
) -> Result<(), Error> {
    if email.is_empty() || password.is_empty() {
        bail!("Please fill in both email and password");
    }

    // Same order as the login form: make sure the backend is there before
    // sending credentials anywhere, and show the probe's diagnosis if not.
    let health = librarium::probe(client, base_url.as_str()).await;
    if !health.connected {
        bail!("{}", health.diagnostic);
    }

    match manager.login(email, password).await {
        Ok(identity) => {
            println!("Login successful!");
            println!("Welcome to the {}, {}.", landing(&identity), identity.username);
            Ok(())
        },
        Err(err) => bail!("{}", err),
    }
}

async fn register(
    client: &reqwest::Client,
    base_url: &Url,
    manager: &SessionManager,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
    payment_method: Option<&str>,
    payment_details: Option<&str>,
) -> Result<(), Error> {
    if username.len() < 3 {
        bail!("Username must be at least 3 characters");
    }
    if password.len() < 6 {
        bail!("Password must be at least 6 characters");
    }
    if email.is_empty() {
        bail!("Please fill in an email address");
    }
    if role == Role::Member && payment_method.is_none() {
        bail!(
            "Member registration requires --payment-method for the \
             registration fee"
        );
    }

    let health = librarium::probe(client, base_url.as_str()).await;
    if !health.connected {
        bail!("{}", health.diagnostic);
    }

    let details = match payment_details {
        Some(raw) => serde_json::from_str(raw)
            .context("--payment-details must be valid JSON")?,
        None => serde_json::json!({}),
    };
    let payment = payment_method.map(|method| Payment { method, details });

    let registration = Registration {
        username,
        email,
        password,
        role,
        payment,
    };

    match manager.register(&registration).await {
        Ok(identity) => {
            println!("Registration successful!");
            println!("Welcome to the {}, {}.", landing(&identity), identity.username);
            Ok(())
        },
        Err(err) => bail!("{}", err),
    }
}

fn whoami(manager: &SessionManager) -> Result<(), Error> {
    match manager.session().current().record {
        Some(record) => {
            println!(
                "{} <{}> ({})",
                record.identity.username,
                record.identity.email,
                record.identity.role
            );
            Ok(())
        },
        None => bail!("Not logged in."),
    }
}

/// Where a freshly authenticated user lands. Only a confirmed admin gets
/// the admin dashboard.
fn landing(identity: &Identity) -> &'static str {
    if identity.role.is_admin() {
        "admin dashboard"
    } else {
        "member dashboard"
    }
}

fn credentials_dir() -> Result<PathBuf, Error> {
    dirs::home_dir()
        .map(|home| home.join(".librarium"))
        .context("Unable to find your home directory")
}

#[derive(Debug, StructOpt)]
struct Args {
    #[structopt(
        long = "base-url",
        default_value = "http://localhost:5000/api",
        help = "The Librarium backend's base URL"
    )]
    base_url: Url,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Check whether the backend is reachable and who is logged in.
    Status,
    /// Log into an existing account.
    Login {
        #[structopt(short = "e", long = "email", help = "Your email address")]
        email: String,
        #[structopt(short = "p", long = "password", help = "Your password")]
        password: String,
    },
    /// Create an account and log straight into it.
    Register {
        #[structopt(short = "u", long = "username")]
        username: String,
        #[structopt(short = "e", long = "email")]
        email: String,
        #[structopt(short = "p", long = "password")]
        password: String,
        #[structopt(
            long = "role",
            default_value = "member",
            help = "Either \"member\" or \"admin\""
        )]
        role: Role,
        #[structopt(
            long = "payment-method",
            help = "How the member registration fee is being paid"
        )]
        payment_method: Option<String>,
        #[structopt(
            long = "payment-details",
            help = "Fee payment details as a JSON object"
        )]
        payment_details: Option<String>,
    },
    /// Show who is currently logged in.
    Whoami,
    /// Forget the current session.
    Logout,
}
