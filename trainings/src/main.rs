//! Prints the training log and this week's distance chart.
//!
//! Loads every training from the configured server, then renders the table
//! (filtered and sorted per `FITLOG_FILTER` and `FITLOG_SORT`) and the chart
//! for the current ISO week.

use fitlog_core::environment::SystemClock;
use fitlog_runtime::Store;
use fitlog_trainings::{
    Config, HttpTrainingsApi, SortColumn, TableSort, TracingNotifier, Training, TrainingsAction,
    TrainingsEnvironment, TrainingsReducer, TrainingsState, WeekChart, sort_trainings,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(api = %config.api.base_url, "Configuration loaded");

    let mut sort = TableSort::default();
    if let Some(column) = config.view.sort {
        sort.toggle(column);
    }

    let api = HttpTrainingsApi::from_config(&config.api)?;
    let env = TrainingsEnvironment::new(Arc::new(api), Arc::new(TracingNotifier), Arc::new(SystemClock));
    let state = TrainingsState::starting_at(env.clock.as_ref());
    let store = Store::new(state, TrainingsReducer::new(), env);

    let mut handle = store.send(TrainingsAction::FetchTrainings).await?;
    handle.wait().await;
    store
        .send(TrainingsAction::WorkoutFilterChanged { filter: config.view.filter })
        .await?;

    let (rows, chart) = store
        .state(|state| {
            let rows: Vec<Training> = sort_trainings(state.filtered(), sort).into_iter().cloned().collect();
            (rows, state.week_chart())
        })
        .await;

    print_table(&rows);
    print_chart(&chart);

    store.shutdown(config.shutdown_timeout).await?;
    Ok(())
}

fn print_table(rows: &[Training]) {
    println!(
        "{:<12} {:<10} {:>8}  {}",
        SortColumn::Date.title(),
        "Type",
        "km",
        SortColumn::Comment.title()
    );
    for row in rows {
        println!(
            "{:<12} {:<10} {:>8.1}  {}",
            row.date.to_string(),
            row.workout_type.label(),
            row.distance_in_km,
            row.comment
        );
    }
    println!("{} training(s)\n", rows.len());
}

fn print_chart(chart: &WeekChart) {
    println!("Week {} ({} to {})", chart.week, chart.dates[0], chart.dates[6]);
    print!("{:<8}", "");
    for day in &chart.categories {
        print!("{day:>7}");
    }
    println!();
    for series in &chart.series {
        print!("{:<8}", series.name);
        for km in &series.data {
            print!("{km:>7.1}");
        }
        println!();
    }
    println!("Total: {:.1} km", chart.total());
}
