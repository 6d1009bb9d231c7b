use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use std::path::PathBuf;
use tg_autoreg::automation::{AppiumCapabilities, AppiumDriver, DEFAULT_SERVER_URL};
use tg_autoreg::registration::{RegistrationConfig, TelegramRegistrar};
use tg_autoreg::registry::DEFAULT_REGISTRY_PATH;
use tg_autoreg::service::DEFAULT_MAX_PRICE;
use tg_autoreg::session::{GrammersLogin, SessionConfig, SessionFinalizer};
use tg_autoreg::sms_activate::{
    ActivationStatus, DEFAULT_API_URL, ProxyConfig, Service, SmsActivateClient,
    SmsActivateProvider,
};
use tg_autoreg::{
    ActivationId, ActivationService, ActivationServiceTrait, NumberGet, RegisterUserData,
    RetryConfig, RetryableError, SmsRetryableProvider,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

type Activations = ActivationService<SmsRetryableProvider<SmsActivateProvider>>;

#[derive(Parser, Debug)]
#[command(name = "tg-autoreg", version)]
#[command(about = "Register Telegram accounts on rented SMS-Activate numbers")]
struct Cli {
    /// SMS-Activate API key
    #[arg(long, env = "SMS_ACTIVATE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Handler API endpoint
    #[arg(long, env = "SMS_ACTIVATE_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// File tracking rented numbers
    #[arg(long, env = "ACTIVATIONS_FILE", default_value = DEFAULT_REGISTRY_PATH)]
    activations_file: PathBuf,

    /// Retries of a provider request after a transient failure
    #[arg(long, env = "SMS_HTTP_RETRIES", default_value_t = 0)]
    http_retries: usize,

    /// Highest price accepted for a number
    #[arg(long, env = "MAX_PRICE", default_value_t = DEFAULT_MAX_PRICE)]
    max_price: f64,

    #[command(flatten)]
    proxy: ProxyArgs,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct ProxyArgs {
    /// Route provider requests through the proxy below
    #[arg(long, env = "USE_PROXY")]
    use_proxy: bool,

    #[arg(long, env = "PROXY_HOST")]
    proxy_host: Option<String>,

    #[arg(long, env = "PROXY_PORT")]
    proxy_port: Option<u16>,

    #[arg(long, env = "PROXY_USERNAME")]
    proxy_username: Option<String>,

    #[arg(long, env = "PROXY_PASSWORD", hide_env_values = true)]
    proxy_password: Option<String>,
}

impl ProxyArgs {
    fn config(&self) -> Option<ProxyConfig> {
        if !self.use_proxy {
            return None;
        }

        let (Some(host), Some(port)) = (&self.proxy_host, self.proxy_port) else {
            warn!("USE_PROXY is set but PROXY_HOST or PROXY_PORT is missing, going direct");
            return None;
        };

        let proxy = ProxyConfig::new(host.clone(), port);
        Some(match (&self.proxy_username, &self.proxy_password) {
            (Some(user), Some(password)) => proxy.with_credentials(user.clone(), password.clone()),
            _ => proxy,
        })
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Android device (adb serial) Appium drives
    #[arg(long, env = "DEVICE_NAME")]
    device_name: Option<String>,

    #[arg(long, env = "APPIUM_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    appium_url: String,

    /// Telegram application id from my.telegram.org
    #[arg(long, env = "APP_API_ID")]
    api_id: Option<i32>,

    #[arg(long, env = "APP_API_HASH", hide_env_values = true)]
    api_hash: Option<String>,

    #[arg(long, env = "FIRST_NAME", default_value = "Artem")]
    first_name: String,

    #[arg(long, env = "LAST_NAME", default_value = "")]
    last_name: String,

    #[arg(long, env = "SCREENSHOT_DIR", default_value = ".")]
    screenshot_dir: PathBuf,

    #[arg(long, env = "SESSION_DIR", default_value = ".")]
    session_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rent numbers until one registers, then save its session (default)
    Run,
    /// Show the account balance
    Balance,
    /// List countries with numbers in the price range, cheapest first
    Countries {
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// List tracked activations
    Pending,
    /// Cancel an activation once the provider allows it
    Cancel { id: String },
    /// Cancel every tracked activation old enough to be cancelled
    Cleanup,
    /// Set the final status of an activation (6 = finish, 8 = cancel)
    SetStatus { id: String, status: u8 },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tg_autoreg=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command.as_ref() else {
        return run(&cli).await;
    };

    match command {
        Command::Run => run(&cli).await,
        Command::Balance => {
            let balance = build_service(&cli, cli.max_price)?.balance().await?;
            println!("Balance: {balance:.2}");
            Ok(())
        }
        Command::Countries { max_price } => {
            let service = build_service(&cli, max_price.unwrap_or(cli.max_price))?;
            let offers = service.available_countries(&Service::Telegram).await?;
            println!("{:>5}  {:<24} {:>8} {:>7}  prefix", "id", "country", "cost", "count");
            for offer in offers {
                println!(
                    "{:>5}  {:<24} {:>8.2} {:>7}  {}",
                    offer.id,
                    offer.name,
                    offer.cost,
                    offer.count,
                    offer.prefix()
                );
            }
            Ok(())
        }
        Command::Pending => {
            let service = build_service(&cli, cli.max_price)?;
            for pending in service.pending() {
                let age = pending
                    .age
                    .map(|age| format!("{}s", age.as_secs()))
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "{}  {}  age {}",
                    pending.record.activation_id, pending.record.phone_number, age
                );
            }
            Ok(())
        }
        Command::Cancel { id } => {
            let service = build_service(&cli, cli.max_price)?;
            service.cancel_activation(&ActivationId::from(id.as_str())).await?;
            println!("Activation {id} cancelled");
            Ok(())
        }
        Command::Cleanup => {
            let report = build_service(&cli, cli.max_price)?.cleanup().await?;
            println!(
                "Cancelled {}, skipped {} (too young), failed {}",
                report.cancelled.len(),
                report.skipped.len(),
                report.failed.len()
            );
            for (id, reason) in &report.failed {
                println!("  {id}: {reason}");
            }
            Ok(())
        }
        Command::SetStatus { id, status } => {
            let service = build_service(&cli, cli.max_price)?;
            let activation_id = ActivationId::from(id.as_str());
            match ActivationStatus::try_from(*status)? {
                ActivationStatus::Finish => service.finish_activation(&activation_id).await?,
                ActivationStatus::Cancel => service.cancel_activation(&activation_id).await?,
            }
            println!("Activation {id} set to status {status}");
            Ok(())
        }
    }
}

fn build_service(cli: &Cli, max_price: f64) -> Result<Activations> {
    let endpoint = Url::parse(&cli.api_url).context("SMS_ACTIVATE_URL is not a valid URL")?;
    let mut builder = SmsActivateClient::builder(cli.api_key.clone()).endpoint(endpoint);
    if let Some(proxy) = cli.proxy.config() {
        builder = builder.proxy(proxy);
    }

    let provider = SmsRetryableProvider::with_config(
        SmsActivateProvider::new(builder.build()?),
        RetryConfig::default().with_max_retries(cli.http_retries),
    );

    Ok(ActivationService::builder(provider)
        .registry_path(&cli.activations_file)
        .max_price(max_price)
        .build()?)
}

async fn run(cli: &Cli) -> Result<()> {
    let args = &cli.run;
    let device = args.device_name.clone().context("DEVICE_NAME is not set")?;
    let api_id = args.api_id.context("APP_API_ID is not set")?;
    let api_hash = SecretString::from(args.api_hash.clone().context("APP_API_HASH is not set")?);

    let service = build_service(cli, cli.max_price)?;
    let user = RegisterUserData::new(args.first_name.clone(), args.last_name.clone());
    let registration = RegistrationConfig::default().with_screenshot_dir(&args.screenshot_dir);
    let session = SessionConfig::default().with_session_dir(&args.session_dir);

    loop {
        let number = match service.acquire_number(Service::Telegram).await {
            Ok(number) => number,
            Err(e) => {
                error!(error = %e, "Failed to get a number");
                eprintln!("Could not get a number. Check access to the SMS-Activate API.");
                eprintln!("Possible causes:");
                eprintln!("- access is blocked for your country (use a proxy or VPN)");
                eprintln!("- the balance is too low");
                eprintln!("- no numbers are available");
                return Err(e.into());
            }
        };

        info!(
            activation_id = %number.activation_id,
            phone = %number.full_phone_number,
            "Number acquired"
        );

        let caps = AppiumCapabilities::telegram(device.as_str()).with_no_reset(false);
        let driver = AppiumDriver::connect(&args.appium_url, &caps).await?;

        let registered = TelegramRegistrar::with_config(&driver, &service, registration.clone())
            .register(&number, &user)
            .await;

        match registered {
            Ok(()) => {
                let saved =
                    save_session(&driver, &service, &session, api_id, &api_hash, &number).await;
                if let Err(e) = saved {
                    error!(error = %e, "Failed to save the Telegram session");
                }
                close(driver).await;
                return Ok(());
            }
            Err(e) if e.should_retry_operation() => {
                warn!(error = %e, "Registration failed, trying the next number");
                close(driver).await;
            }
            Err(e) => {
                close(driver).await;
                return Err(e.into());
            }
        }
    }
}

async fn save_session(
    driver: &AppiumDriver,
    service: &Activations,
    config: &SessionConfig,
    api_id: i32,
    api_hash: &SecretString,
    number: &NumberGet,
) -> Result<()> {
    let mut client = GrammersLogin::connect(api_id, api_hash, config.session_path(number)).await?;
    SessionFinalizer::new(driver, service, config.clone())
        .finalize(&mut client, number)
        .await?;
    Ok(())
}

async fn close(driver: AppiumDriver) {
    if let Err(e) = driver.quit().await {
        warn!(error = %e, "Failed to close the Appium session");
    }
}
