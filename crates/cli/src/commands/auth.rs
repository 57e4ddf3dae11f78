//! Session commands: register, confirm, login, logout, whoami.

#![allow(clippy::print_stdout)]

use retailcloud_client::session::AuthError;

use super::App;

/// Register a new account.
pub async fn register(app: &App, email: &str, password: &str) -> Result<(), AuthError> {
    let outcome = app.session.register(email, password).await?;

    if outcome.confirmed {
        println!("Account created for {email}. You can log in now.");
    } else {
        println!(
            "Account created for {email} (user {}). Check your inbox for a confirmation code,\n\
             then run: retail confirm -e {email} -c <code>",
            outcome.user_sub
        );
    }

    Ok(())
}

/// Confirm a registration with an emailed code.
pub async fn confirm(app: &App, email: &str, code: &str) -> Result<(), AuthError> {
    app.session.confirm(email, code).await?;
    println!("Account confirmed. You can log in now.");
    Ok(())
}

/// Sign in and persist the session.
pub async fn login(app: &App, email: &str, password: &str) -> Result<(), AuthError> {
    let identity = app.session.login(email, password).await?;
    println!(
        "Signed in as {}",
        identity.email.as_deref().unwrap_or(&identity.subject_id)
    );
    Ok(())
}

/// Sign out and clear the persisted session.
pub async fn logout(app: &App) {
    app.session.logout().await;
    println!("Signed out.");
}

/// Show the current session.
pub fn whoami(app: &App) {
    match app.session.current_user() {
        Some(identity) => {
            println!(
                "Signed in as {} (subject {})",
                identity.email.as_deref().unwrap_or("<no email claim>"),
                identity.subject_id
            );
            if let Some(expires_at) = identity.expires_at() {
                println!("Session expires at {expires_at}");
            }
        }
        None => println!("Not signed in."),
    }
}
