//! Application state for the evolution CLI.
//!
//! `App` wires the configuration, the shared session, the navigator that guards
//! protected pages, and the API client together. Login and registration live here;
//! the pages are in `pages`.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use evolution_core::auth::{FileTokenStore, Subscription};
use evolution_core::config::TokenBackend;
use evolution_core::models::RegisterRequest;
use evolution_core::{ApiClient, ApiError, Config, Navigator, Route, SessionManager, SessionState};
use tracing::{debug, error, info, warn};

use crate::cli::RegisterArgs;

pub struct App {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub navigator: Navigator,
    pub api: ApiClient,
    session_log: Option<Subscription>,
}

impl App {
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let mut config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        if let Some(url) = api_url {
            config.api_base_url = url;
        }
        debug!(api = %config.base_url(), backend = ?config.token_backend, "Config loaded");

        let session = Arc::new(SessionManager::new(config.token_store()?));
        let state = session.initialize();
        debug!(authenticated = state.is_authenticated(), "Session loaded");

        let session_log = session.subscribe(|state: &SessionState| match state {
            SessionState::LoggedIn(_) => info!("Signed in"),
            SessionState::LoggedOut => info!("Signed out"),
        });

        let navigator = Navigator::new(Arc::clone(&session));
        let api = ApiClient::new(config.base_url(), Arc::clone(&session))?;

        Ok(Self {
            config,
            session,
            navigator,
            api,
            session_log: Some(session_log),
        })
    }

    /// Enter a protected page, failing with a login hint when there is no session
    pub fn enter(&self, route: Route) -> Result<()> {
        let landed = self.navigator.navigate(route);
        if landed == Route::Login && route != Route::Login {
            bail!("Not logged in. Run `evolution login` first.");
        }
        debug!(route = %landed, "Entered page");
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        if self.navigator.navigate(Route::Login) != Route::Login {
            println!("Already logged in; signing in again replaces the current session.");
        }

        let username = match username.or_else(|| self.config.last_username.clone()) {
            Some(last) if !last.is_empty() => {
                print!("Username [{}]: ", last);
                io::stdout().flush()?;
                let input = read_line()?;
                if input.is_empty() {
                    last
                } else {
                    input
                }
            }
            _ => prompt("Username: ")?,
        };

        let password = match std::env::var("EVOLUTION_PASSWORD") {
            Ok(p) if !p.is_empty() => p,
            _ => rpassword::prompt_password("Password: ")?,
        };

        if username.is_empty() || password.is_empty() {
            bail!("Username and password required");
        }

        println!("Authenticating...");
        match self.api.login(&username, &password).await {
            Ok(token) => {
                self.session.set_credential(Some(&token));

                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                info!(route = %self.navigator.current(), "Login successful");
                println!("Login successful!");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                match e.downcast_ref::<ApiError>() {
                    Some(ApiError::LoginFailed(message)) => bail!("{}", message),
                    _ => Err(e),
                }
            }
        }
    }

    pub async fn register(&mut self, args: RegisterArgs) -> Result<()> {
        self.navigator.navigate(Route::Register);

        let password = match std::env::var("EVOLUTION_PASSWORD") {
            Ok(p) if !p.is_empty() => p,
            _ => rpassword::prompt_password("Choose a password: ")?,
        };

        let request = RegisterRequest {
            username: args.username,
            password,
            email: args.email,
            name: args.name,
            country: args.country,
            bio: args.bio,
            profile_image: args.image,
        };

        let response = self.api.register(&request).await?;
        println!(
            "{}",
            response.message.as_deref().unwrap_or("Registration successful.")
        );

        // The new account's token is not kept; sign in explicitly
        self.config.last_username = Some(request.username);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
        self.navigator.navigate(Route::Login);
        println!("Run `evolution login` to sign in.");
        Ok(())
    }

    pub fn logout(&mut self) {
        if !self.session.is_authenticated() {
            println!("Not logged in.");
            return;
        }
        self.session.logout();
        println!("Logged out.");
    }

    pub fn print_status(&self) {
        let backend = match self.config.token_backend {
            TokenBackend::File => match self.config.data_dir() {
                Ok(dir) => FileTokenStore::in_dir(&dir).path().display().to_string(),
                Err(_) => "file".to_string(),
            },
            TokenBackend::Keyring => "the system keychain".to_string(),
        };
        if self.navigator.gate().can_enter() {
            let user = self.config.last_username.as_deref().unwrap_or("unknown user");
            println!("Logged in as {}", user);
        } else {
            println!("Not logged in");
        }
        println!("Server:  {}", self.config.base_url());
        println!("Session: stored in {}", backend);
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(subscription) = self.session_log.take() {
            subscription.unsubscribe();
        }
    }
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    read_line()
}
