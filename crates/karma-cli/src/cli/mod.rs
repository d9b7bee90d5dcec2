//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use karma_core::api::banners::BannerStatus;
use karma_core::api::help::HelpStatus;
use karma_core::api::withdrawals::{Decision, WithdrawalStatus};
use karma_core::config;
use karma_core::listing::StatusFilter;
use karma_core::session::SessionManager;

use crate::logging;

mod commands;

#[derive(Parser)]
#[command(name = "karma")]
#[command(version = "0.1")]
#[command(about = "Karma admin console")]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr (overrides KARMA_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Upload a file and print its public URL
    Upload {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    #[command(flatten)]
    Admin(AdminCommands),
}

/// Commands that run against a restored session.
#[derive(clap::Subcommand)]
enum AdminCommands {
    /// Sign in with a phone number and one-time password
    Login {
        /// Phone number, including country code
        #[arg(long)]
        phone: String,
        /// OTP code (prompted for when omitted)
        #[arg(long)]
        code: Option<String>,
        /// Keep the session across reboots
        #[arg(long)]
        remember: bool,
    },

    /// Register a new admin account
    Register(RegisterArgs),

    /// Sign out and remove the stored session
    Logout,

    /// Show the signed-in administrator
    Whoami,

    /// Browse users
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Manage promotional banners
    Banners {
        #[command(subcommand)]
        command: BannerCommands,
    },

    /// Triage help and callback requests
    Help {
        #[command(subcommand)]
        command: HelpCommands,
    },

    /// Review withdrawal requests
    Withdrawals {
        #[command(subcommand)]
        command: WithdrawalCommands,
    },

    /// Manage products
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Send a notification to a user
    Notify(NotifyArgs),
}

#[derive(clap::Args, Debug)]
struct RegisterArgs {
    /// Phone number to verify, including country code
    #[arg(long)]
    phone: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    dob: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long)]
    referral_code: Option<String>,
    /// OTP code (prompted for when omitted)
    #[arg(long)]
    code: Option<String>,
    /// Password (prompted for when omitted)
    #[arg(long)]
    password: Option<String>,
    /// Password confirmation (prompted for when omitted)
    #[arg(long)]
    confirm_password: Option<String>,
}

#[derive(clap::Args, Debug)]
struct NotifyArgs {
    /// Recipient user id
    #[arg(long)]
    user: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// Image to upload and attach
    #[arg(long, value_name = "FILE")]
    media: Option<PathBuf>,
    #[arg(long, default_value = karma_core::api::notifications::DEFAULT_EVENT_TYPE)]
    event_type: String,
}

/// Search and paging flags shared by list commands.
#[derive(clap::Args, Debug, Clone)]
struct ListArgs {
    /// Case-insensitive text filter
    #[arg(long, default_value = "")]
    search: String,
    /// 1-based page number
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(clap::Subcommand)]
enum UserCommands {
    /// List users
    List(ListArgs),
    /// Show aggregate user statistics
    Stats,
}

#[derive(clap::Subcommand)]
enum BannerCommands {
    /// List banners
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// all, active or inactive
        #[arg(long, default_value = "all")]
        status: StatusFilter<BannerStatus>,
    },
    /// Create a banner
    Create {
        #[arg(long)]
        name: String,
        /// Image URL (see `karma upload`)
        #[arg(long)]
        image: String,
        #[arg(long)]
        redirect_url: String,
        /// Start date/time (YYYY-MM-DD or YYYY-MM-DDTHH:MM, local time)
        #[arg(long)]
        start: String,
        /// End date/time; also the expiry
        #[arg(long)]
        end: String,
        /// Create the banner inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Edit a banner
    Update {
        #[arg(value_name = "BANNER_ID")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        redirect_url: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// Flip a banner between active and inactive
    Toggle {
        #[arg(value_name = "BANNER_ID")]
        id: String,
    },
    /// Delete a banner
    Delete {
        #[arg(value_name = "BANNER_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum HelpCommands {
    /// List help requests
    List {
        /// all, pending, in_progress or resolved
        #[arg(long, default_value = "all")]
        status: StatusFilter<HelpStatus>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show request counts
    Stats,
    /// Delete a help request
    Delete {
        #[arg(value_name = "REQUEST_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum WithdrawalCommands {
    /// List withdrawal requests
    List {
        /// all, pending, approved or rejected
        #[arg(long, default_value = "all")]
        status: StatusFilter<WithdrawalStatus>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show pending and today's decisions
    Stats,
    /// Approve a pending withdrawal
    Approve {
        #[arg(value_name = "REQUEST_ID")]
        id: String,
    },
    /// Reject a pending withdrawal
    Reject {
        #[arg(value_name = "REQUEST_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ProductCommands {
    /// Register a product URL
    Add {
        #[arg(value_name = "URL")]
        url: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set a single config value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        // Config commands must work even when config.toml is broken.
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Set { key, value } => commands::config::set(&key, &value),
        },
        Commands::Upload { file } => {
            let config = config::Config::load().context("load config")?;
            commands::upload::run(&config, &file).await
        }
        Commands::Admin(command) => {
            let config = config::Config::load().context("load config")?;
            let mut session = SessionManager::from_config(&config).context("create session")?;
            session.restore();
            dispatch_admin(command, &config, &mut session).await
        }
    }
}

async fn dispatch_admin(
    command: AdminCommands,
    config: &config::Config,
    session: &mut SessionManager,
) -> Result<()> {
    match command {
        AdminCommands::Login {
            phone,
            code,
            remember,
        } => commands::auth::login(session, &phone, code.as_deref(), remember).await,
        AdminCommands::Register(args) => {
            let prompt_password = args.password.is_none();
            let prompt_confirmation = args.confirm_password.is_none();
            let form = karma_core::registration::RegistrationForm {
                phone: Some(args.phone.clone()),
                username: args.username,
                password: args.password.unwrap_or_default(),
                confirm_password: args.confirm_password.unwrap_or_default(),
                email: args.email,
                address: args.address,
                dob: args.dob,
                referral_code: args.referral_code,
            };
            commands::auth::register(
                session,
                config,
                commands::auth::RegisterInput {
                    phone: &args.phone,
                    code: args.code.as_deref(),
                    form,
                    prompt_password,
                    prompt_confirmation,
                },
            )
            .await
        }
        AdminCommands::Logout => commands::auth::logout(session),
        AdminCommands::Whoami => {
            commands::auth::whoami(session);
            Ok(())
        }

        AdminCommands::Users { command } => {
            let api = commands::authorized_api(session, config)?;
            match command {
                UserCommands::List(list) => {
                    commands::users::list(
                        &api,
                        &list.search,
                        list.page,
                        config.effective_page_size(),
                    )
                    .await
                }
                UserCommands::Stats => commands::users::stats(&api).await,
            }
        }

        AdminCommands::Banners { command } => {
            let api = commands::authorized_api(session, config)?;
            match command {
                BannerCommands::List { search, status } => {
                    commands::banners::list(&api, &search, status).await
                }
                BannerCommands::Create {
                    name,
                    image,
                    redirect_url,
                    start,
                    end,
                    inactive,
                } => {
                    commands::banners::create(
                        &api,
                        commands::banners::CreateInput {
                            name,
                            image,
                            redirect_url,
                            start,
                            end,
                            active: !inactive,
                        },
                    )
                    .await
                }
                BannerCommands::Update {
                    id,
                    name,
                    image,
                    redirect_url,
                    start,
                    end,
                } => {
                    commands::banners::update(
                        &api,
                        &id,
                        commands::banners::UpdateInput {
                            name,
                            image,
                            redirect_url,
                            start,
                            end,
                        },
                    )
                    .await
                }
                BannerCommands::Toggle { id } => commands::banners::toggle(&api, &id).await,
                BannerCommands::Delete { id } => commands::banners::delete(&api, &id).await,
            }
        }

        AdminCommands::Help { command } => {
            let api = commands::authorized_api(session, config)?;
            match command {
                HelpCommands::List { status, list } => {
                    commands::help::list(
                        &api,
                        status,
                        &list.search,
                        list.page,
                        config.effective_page_size(),
                    )
                    .await
                }
                HelpCommands::Stats => commands::help::stats(&api).await,
                HelpCommands::Delete { id } => commands::help::delete(&api, &id).await,
            }
        }

        AdminCommands::Withdrawals { command } => {
            let api = commands::authorized_api(session, config)?;
            match command {
                WithdrawalCommands::List { status, list } => {
                    commands::withdrawals::list(
                        &api,
                        status,
                        &list.search,
                        list.page,
                        config.effective_page_size(),
                    )
                    .await
                }
                WithdrawalCommands::Stats => commands::withdrawals::stats(&api).await,
                WithdrawalCommands::Approve { id } => {
                    commands::withdrawals::decide(&api, &id, Decision::Approve).await
                }
                WithdrawalCommands::Reject { id } => {
                    commands::withdrawals::decide(&api, &id, Decision::Reject).await
                }
            }
        }

        AdminCommands::Products { command } => {
            let api = commands::authorized_api(session, config)?;
            match command {
                ProductCommands::Add { url } => commands::products::add(&api, &url).await,
            }
        }

        AdminCommands::Notify(args) => {
            let api = commands::authorized_api(session, config)?;
            commands::notify::run(
                &api,
                config,
                commands::notify::NotifyInput {
                    user: args.user,
                    title: args.title,
                    description: args.description,
                    media: args.media,
                    event_type: args.event_type,
                },
            )
            .await
        }
    }
}
