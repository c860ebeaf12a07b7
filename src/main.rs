use std::process::ExitCode;

use budget_sync::config::Config;
use budget_sync::controller::{
    CategoryChoice, Command, Controller, ExpenseForm, PlanForm, View,
};
use budget_sync::models::ProfileUpdate;
use budget_sync::money;
use budget_sync::transport::Transport;
use budget_sync::views::Dashboard;
use budget_sync::VERSION;
use chrono::{Local, NaiveDate};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "\
usage: budget-sync <command> [args]

  login <email> <password>
  register <username> <email> <password>
  logout
  summary                                   home view (default)
  expenses                                  expense table
  categories | plans                        selectable options
  quote
  add-category <name> [description]
  seed-categories
  add-plan <category_id> <amount> <start YYYY-MM-DD> <end YYYY-MM-DD>
  delete-plan <plan_id>
  add-expense <category_id | new:NAME> <amount> [date] [description]
  delete-expense <expense_id>
  rename <username>
  password <old> <new>
  currency <RWF|USD|EUR|CNY>
  picture <url>";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "budget_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    tracing::debug!(version = VERSION, api_base = %config.api_base, "Starting budget-sync");

    let controller = match Controller::from_config(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = controller.restore() {
        tracing::warn!(error = %e, "Could not read persisted session");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&controller, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run<T: Transport>(controller: &Controller<T>, args: &[String]) -> Result<(), String> {
    let name = args.first().map(String::as_str).unwrap_or("summary");

    match name {
        "help" | "-h" | "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        "quote" => {
            println!("{}", controller.quote().await.display());
            Ok(())
        }
        "summary" => {
            execute(controller, Command::Navigate(View::Home)).await?;
            println!("{}", controller.quote().await.display());
            print_summary(&controller.dashboard());
            Ok(())
        }
        "expenses" => {
            execute(controller, Command::Navigate(View::Dashboard)).await?;
            print_expenses(&controller.dashboard());
            Ok(())
        }
        "categories" | "plans" => {
            execute(controller, Command::Navigate(View::AddExpense)).await?;
            let dashboard = controller.dashboard();
            let options = if name == "plans" {
                &dashboard.plan_options
            } else {
                &dashboard.category_options
            };
            for option in options {
                println!("{:>6}  {}", option.value, option.label);
            }
            Ok(())
        }
        _ => {
            let command = parse_command(name, &args[1..])?;
            execute(controller, command).await
        }
    }
}

async fn execute<T: Transport>(controller: &Controller<T>, command: Command) -> Result<(), String> {
    match controller.dispatch(command).await {
        Ok(notice) => {
            if let Some(message) = notice.message() {
                println!("{}", message);
            }
            Ok(())
        }
        Err(e) => Err(e.user_message()),
    }
}

fn parse_command(name: &str, args: &[String]) -> Result<Command, String> {
    let arg = |i: usize| positional(args, i, name);

    let command = match name {
        "login" => Command::Login {
            email: arg(0)?.to_string(),
            password: arg(1)?.to_string(),
        },
        "register" => Command::Register {
            username: arg(0)?.to_string(),
            email: arg(1)?.to_string(),
            password: arg(2)?.to_string(),
        },
        "logout" => Command::Logout,
        "refresh" => Command::Refresh,
        "add-category" => Command::CreateCategory {
            name: arg(0)?.to_string(),
            description: args.get(1).cloned(),
        },
        "seed-categories" => Command::SeedDefaultCategories,
        "add-plan" => Command::CreatePlan(PlanForm {
            category_id: parse_id(arg(0)?)?,
            amount: parse_amount(arg(1)?)?,
            start_date: parse_date(arg(2)?)?,
            end_date: parse_date(arg(3)?)?,
        }),
        "delete-plan" => Command::DeletePlan(parse_id(arg(0)?)?),
        "add-expense" => {
            let category = match arg(0)?.strip_prefix("new:") {
                Some(new_name) => CategoryChoice::New(new_name.to_string()),
                None => CategoryChoice::Existing(parse_id(arg(0)?)?),
            };
            let expense_date = match args.get(2) {
                Some(d) => parse_date(d)?,
                None => Local::now().date_naive(),
            };
            Command::AddExpense(ExpenseForm {
                plan_id: None,
                category,
                amount: parse_amount(arg(1)?)?,
                description: args.get(3).cloned(),
                expense_date,
            })
        }
        "delete-expense" => Command::DeleteExpense(parse_id(arg(0)?)?),
        "rename" => Command::UpdateProfile(ProfileUpdate {
            username: Some(arg(0)?.to_string()),
            ..Default::default()
        }),
        "password" => Command::UpdateProfile(ProfileUpdate {
            old_password: Some(arg(0)?.to_string()),
            new_password: Some(arg(1)?.to_string()),
            ..Default::default()
        }),
        "currency" => Command::UpdateCurrency(arg(0)?.to_string()),
        "picture" => Command::UpdatePicture(arg(0)?.to_string()),
        other => return Err(format!("unknown command '{}'\n\n{}", other, USAGE)),
    };

    Ok(command)
}

fn positional<'a>(args: &'a [String], index: usize, command: &str) -> Result<&'a str, String> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument for '{}'\n\n{}", command, USAGE))
}

fn parse_id(value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("'{}' is not a valid id", value))
}

fn parse_amount(value: &str) -> Result<i64, String> {
    money::parse_amount(value).map_err(|e| e.user_message())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date (expected YYYY-MM-DD)", value))
}

fn print_summary(dashboard: &Dashboard) {
    if let Some(username) = &dashboard.username {
        println!("Signed in as {}", username);
    }

    let summary = &dashboard.summary;
    println!("Budget:    {}", dashboard.amount_display());
    println!("Remaining: {}", dashboard.remaining_display());
    if summary.has_plan() {
        println!(
            "Spent:     {} ({}, {})",
            money::format_money(summary.spent, &dashboard.currency),
            money::format_percent(summary.spent_percentage),
            summary.severity.as_str()
        );
    }
    println!(
        "{} plans, {} expenses, {} categories",
        dashboard.counts.plans, dashboard.counts.expenses, dashboard.counts.categories
    );
}

fn print_expenses(dashboard: &Dashboard) {
    if dashboard.expense_rows.is_empty() {
        println!("No expenses yet.");
        return;
    }
    for row in &dashboard.expense_rows {
        println!(
            "{:>6}  {}  {:<16} {:>14}  {}",
            row.expense_id, row.date, row.category_name, row.amount, row.description
        );
    }
}
