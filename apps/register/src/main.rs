use std::io::{self, Write};

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;
use client_core::{
    FlowOptions, HttpRegistrationApi, RegistrationApi, RegistrationFlow, StepOutcome,
};
use shared::registration::{iso_date, RegistrationStep};
use stepper::AccessibilityMode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Register a bike for the extended warranty")]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long)]
    serial_number: String,
    #[arg(long, value_parser = iso_date::parse)]
    date_of_purchase: NaiveDate,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    /// Country code, e.g. FR
    #[arg(long)]
    country: String,
    #[arg(long)]
    language: String,
    #[arg(long)]
    gender: String,
    #[arg(long, value_parser = iso_date::parse)]
    date_of_birth: Option<NaiveDate>,
    #[arg(long)]
    news_opt_in: bool,
    #[arg(long)]
    consent: bool,
    /// Disable back navigation between steps.
    #[arg(long)]
    forward_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
    let args = Args::parse();

    let api = HttpRegistrationApi::new(&args.server_url)?;
    info!(api_base = %api.api_base(), "starting registration");
    let mut out = io::stdout().lock();
    run(api, &args, &mut out).await
}

async fn run<A: RegistrationApi>(api: A, args: &Args, out: &mut impl Write) -> Result<()> {
    let options = FlowOptions {
        mode: if args.forward_only {
            AccessibilityMode::ForwardOnly
        } else {
            AccessibilityMode::Free
        },
        default_step: 0,
    };
    let mut flow = RegistrationFlow::new(api, options);
    flow.mount();

    print_step(&flow, out)?;
    flow.set_serial_number(args.serial_number.as_str());
    let outcome = flow.find_bike().await?;
    expect_moved(&flow, outcome, RegistrationStep::SerialNumber)?;

    print_step(&flow, out)?;
    let bike = flow.form().payload();
    writeln!(out, "  Serial number: {}", bike.serial_number)?;
    writeln!(out, "  Model:         {}", bike.model_description)?;
    writeln!(out, "  Shop:          {}", bike.shop_name)?;
    flow.set_date_of_purchase(Some(args.date_of_purchase));
    let outcome = flow.confirm_bike()?;
    expect_moved(&flow, outcome, RegistrationStep::BikeInformation)?;

    print_step(&flow, out)?;
    let form = flow.form_mut();
    form.set_first_name(args.first_name.as_str());
    form.set_last_name(args.last_name.as_str());
    form.set_email(args.email.as_str());
    form.set_country(args.country.as_str());
    form.set_preferred_language(args.language.as_str());
    form.set_gender(args.gender.as_str());
    form.set_date_of_birth(args.date_of_birth);
    form.set_news_opt_in(args.news_opt_in);
    form.set_consent(args.consent);
    let outcome = flow.submit().await?;
    expect_moved(&flow, outcome, RegistrationStep::PersonalInformation)?;

    print_step(&flow, out)?;
    let Some(confirmation) = flow.confirmation() else {
        bail!("registration finished without a confirmation");
    };
    writeln!(out, "  {}", confirmation.heading())?;
    writeln!(out, "  {}", confirmation.message)?;
    if !confirmation.success {
        bail!("registration failed: {}", confirmation.message);
    }
    Ok(())
}

fn print_step<A: RegistrationApi>(flow: &RegistrationFlow<A>, out: &mut impl Write) -> Result<()> {
    let stepper = flow.stepper()?;
    writeln!(out, "{}", stepper.render_strip())?;
    if let Some(title) = stepper.active_title() {
        writeln!(out, "{title}")?;
    }
    Ok(())
}

fn expect_moved<A: RegistrationApi>(
    flow: &RegistrationFlow<A>,
    outcome: StepOutcome,
    step: RegistrationStep,
) -> Result<()> {
    if outcome == StepOutcome::Moved {
        return Ok(());
    }
    let errors = flow
        .form()
        .errors()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    if errors.is_empty() {
        bail!("stuck on '{}' ({outcome:?})", step.label());
    }
    bail!("stuck on '{}': {}", step.label(), errors.join("; "));
}
