//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use karma_core::config::Config;
use karma_core::registration::RegistrationForm;
use karma_core::session::{PendingOtpFlow, SessionManager, VerifyOutcome, mask_token};

pub async fn login(
    session: &mut SessionManager,
    phone: &str,
    code: Option<&str>,
    remember: bool,
) -> Result<()> {
    if let Some(user) = session.user() {
        println!("Replacing existing session for {}", user.display_name());
    }

    let mut flow = PendingOtpFlow::new(phone);
    flow.send(session).await?;
    println!("OTP sent to {}", flow.phone);

    let code = match code {
        Some(code) => code.to_string(),
        None => prompt_otp(&mut flow, session).await?,
    };

    match flow.verify(session, &code, remember).await? {
        VerifyOutcome::SignedIn(user) => {
            println!();
            println!("✓ Logged in as {}", user.display_name());
            if remember {
                println!("  Session remembered until `karma logout`");
            } else {
                println!("  Session lasts until reboot (use --remember to keep it)");
            }
            Ok(())
        }
        VerifyOutcome::AccountMissing => anyhow::bail!(
            "No admin account exists for {}. Run `karma register --phone {}` to create one.",
            flow.phone,
            flow.phone
        ),
    }
}

/// Registration input gathered from flags.
pub struct RegisterInput<'a> {
    pub phone: &'a str,
    pub code: Option<&'a str>,
    pub form: RegistrationForm,
    pub prompt_password: bool,
    pub prompt_confirmation: bool,
}

pub async fn register(
    session: &mut SessionManager,
    config: &Config,
    input: RegisterInput<'_>,
) -> Result<()> {
    let mut form = input.form;
    if input.prompt_password {
        form.password = prompt("Password: ")?;
    }
    if input.prompt_confirmation {
        form.confirm_password = prompt("Confirm password: ")?;
    }
    let username = form.username.trim().to_string();
    let request = form.into_request(&config.registration_region)?;

    let mut flow = PendingOtpFlow::new(input.phone);
    flow.send(session).await?;
    println!("OTP sent to {}", flow.phone);

    let code = match input.code {
        Some(code) => code.to_string(),
        None => prompt_otp(&mut flow, session).await?,
    };

    match flow.verify(session, &code, false).await? {
        VerifyOutcome::AccountMissing => {
            println!("Phone verified. Submitting registration...");
            session.register_admin(&request).await?;
            println!();
            println!("✓ Registered admin {username}");
            println!("  Log in with `karma login --phone {}`", flow.phone);
        }
        VerifyOutcome::SignedIn(user) => {
            println!("An account with this phone number already exists.");
            println!(
                "✓ Signed in as {} for this session (run `karma login --phone {} --remember` to stay signed in)",
                user.display_name(),
                flow.phone
            );
        }
    }
    Ok(())
}

pub fn logout(session: &mut SessionManager) -> Result<()> {
    let had_session = session.logout()?;

    if had_session {
        println!("✓ Logged out");
        println!("  Stored session removed");
    } else {
        println!("Not logged in (no session found).");
    }

    Ok(())
}

pub fn whoami(session: &SessionManager) {
    let (Some(user), Some(token)) = (session.user(), session.token()) else {
        println!("Not logged in.");
        return;
    };

    println!("{}", user.display_name());
    println!("  uid:    {}", user.uid);
    if !user.email.is_empty() {
        println!("  email:  {}", user.email);
    }
    if !user.phone.is_empty() {
        println!("  phone:  {}", user.phone);
    }
    if !user.region.is_empty() {
        println!("  region: {}", user.region);
    }
    println!("  admin:  {}", if user.admin { "yes" } else { "no" });
    println!("  token:  {}", mask_token(token));
}

/// Reads the OTP from stdin. A blank line re-sends it.
async fn prompt_otp(flow: &mut PendingOtpFlow, session: &SessionManager) -> Result<String> {
    loop {
        let input = prompt("Enter OTP (blank line to resend): ")?;
        if !input.is_empty() {
            return Ok(input);
        }
        flow.send(session).await?;
        println!("OTP re-sent to {}", flow.phone);
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        anyhow::bail!("No input provided");
    }
    Ok(input.trim().to_string())
}
