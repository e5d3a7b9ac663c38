//! Admin console entry point.
//!
//! Wires the REST identity provider and role endpoint into the session
//! resolver, then drives a small command loop. Navigation is derived from
//! published snapshots, never from command return values.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use trackacademy_auth::{RouteTracker, route_for};
use trackacademy_client::{
    CredentialStore, FileCredentialStore, IdentityConfig, InMemoryCredentialStore,
    RestIdentityProvider, RestRoleApi,
};
use trackacademy_observability::LogFormat;
use trackacademy_session::{ResolverHandle, SessionResolver, SignUpOutcome, SignUpRequest};

#[tokio::main]
async fn main() {
    let format = std::env::var("TRACKACADEMY_LOG_FORMAT")
        .map(|value| LogFormat::parse(&value))
        .unwrap_or_default();
    trackacademy_observability::init(format);

    let identity_url = std::env::var("TRACKACADEMY_IDENTITY_URL").unwrap_or_else(|_| {
        warn!("TRACKACADEMY_IDENTITY_URL not set; using local dev default");
        "http://localhost:54321".to_string()
    });
    let anon_key = std::env::var("TRACKACADEMY_ANON_KEY").unwrap_or_else(|_| {
        warn!("TRACKACADEMY_ANON_KEY not set; using insecure dev default");
        "dev-anon-key".to_string()
    });
    let api_url = std::env::var("TRACKACADEMY_API_URL").unwrap_or_else(|_| {
        warn!("TRACKACADEMY_API_URL not set; using local dev default");
        "http://localhost:8080".to_string()
    });

    let store: Arc<dyn CredentialStore> = match FileCredentialStore::default_location() {
        Some(store) => {
            info!(path = %store.path().display(), "using file credential store");
            Arc::new(store)
        }
        None => {
            warn!("no config directory on this platform; credentials will not persist");
            Arc::new(InMemoryCredentialStore::new())
        }
    };

    let provider = Arc::new(RestIdentityProvider::new(
        IdentityConfig::new(identity_url, anon_key),
        store,
    ));
    let roles = Arc::new(RestRoleApi::new(api_url));

    let handle = SessionResolver::new(provider, roles).spawn();
    run_console(handle).await;
}

async fn run_console(handle: ResolverHandle<RestIdentityProvider>) {
    let mut snapshots = handle.watch();
    let mut tracker = RouteTracker::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("trackacademy console (type `help` for commands)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; shutting down");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if let Some(route) = tracker.observe(&snapshot) {
                    info!(route = %route, "navigate");
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_command(&handle, line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        warn!(%error, "stdin read failed");
                        break;
                    }
                }
            }
        }
    }

    handle.shutdown().await;
}

/// Returns false when the console should exit.
async fn handle_command(handle: &ResolverHandle<RestIdentityProvider>, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => true,
        Some("help") => {
            println!("commands:");
            println!("  signin <email> <password>   authenticate");
            println!("  signup <email> <password>   create an account");
            println!("  signout                     revoke the session");
            println!("  status                      show session, role, and route");
            println!("  quit                        exit");
            true
        }
        Some("status") => {
            let snapshot = handle.snapshot();
            let route = route_for(&snapshot);
            match &snapshot.session {
                Some(session) => {
                    let role = snapshot
                        .role
                        .as_ref()
                        .map(|role| role.label())
                        .unwrap_or("unresolved");
                    println!(
                        "signed in as {} (role: {role}, route: {route})",
                        session.user.email
                    );
                }
                None => println!("signed out (route: {route})"),
            }
            true
        }
        Some("signin") | Some("login") => {
            let (Some(email), Some(password)) = (parts.next(), parts.next()) else {
                println!("usage: signin <email> <password>");
                return true;
            };
            match handle.sign_in(email, password).await {
                Ok(session) => println!("signed in as {}", session.user.email),
                Err(error) => println!("sign-in failed: {error}"),
            }
            true
        }
        Some("signup") => {
            let (Some(email), Some(password)) = (parts.next(), parts.next()) else {
                println!("usage: signup <email> <password>");
                return true;
            };
            match handle.sign_up(SignUpRequest::new(email, password)).await {
                Ok(SignUpOutcome::SignedIn(session)) => {
                    println!("account created; signed in as {}", session.user.email);
                }
                Ok(SignUpOutcome::ConfirmationRequired { email }) => {
                    println!("confirmation email sent to {email}");
                }
                Err(error) => println!("sign-up failed: {error}"),
            }
            true
        }
        Some("signout") | Some("logout") => {
            match handle.sign_out().await {
                Ok(()) => println!("signed out"),
                Err(error) => println!("sign-out failed: {error}"),
            }
            true
        }
        Some("quit") | Some("exit") => false,
        Some(other) => {
            println!("unknown command `{other}`; type `help`");
            true
        }
    }
}
