use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use quiniela_pool::config::AppConfig;
use quiniela_pool::error::AppError;
use quiniela_pool::pool::repository::{collections, LEDGER_DOC, SCORING_RULES_DOC};
use quiniela_pool::pool::{
    pool_router, DocumentStore, Fixture, LedgerConfig, Member, MemberId, MemoryStore, Pick,
    PoolService, Prediction, Round, RoundId, RuleSet,
};
use quiniela_pool::telemetry;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Quiniela Pool",
    about = "Run and demonstrate the prediction-pool service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a sample season in memory and print standings and the ledger
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
    /// Preload the in-memory store with the sample season
    #[arg(long)]
    seed_demo: bool,
}

#[derive(Args, Debug, Default)]
struct DemoArgs {
    /// Write the ledger export to this path
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Include every ledger line in the output
    #[arg(long)]
    list_lines: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo(args) => run_demo(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(MemoryStore::default());
    if args.seed_demo {
        seed_sample_season(store.as_ref())?;
    }
    let service = Arc::new(PoolService::new(store));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(pool_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "quiniela pool service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(MemoryStore::default());
    seed_sample_season(store.as_ref())?;
    let service = PoolService::new(store);

    let summary = service.season_summary()?;
    println!("Sample season, {} played rounds", summary.played_rounds);
    println!("\nStandings");
    for total in &summary.totals {
        println!(
            "- {}: {} pts ({} hits, {:+} bonus, {:.2}€ prizes)",
            total.name, total.points, total.hits, total.bonus, total.prize_money
        );
    }

    let last_played = summary
        .standings
        .iter()
        .map(|row| row.round_number)
        .max();
    if let Some(number) = last_played {
        let outcome = service.round_outcome(number)?;
        let snapshot = service.snapshot()?;
        let name = |id: MemberId| {
            snapshot
                .member(id)
                .map(|member| member.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        println!("\nRound {number}");
        println!("- winner (plays doubles next): {}", name(outcome.winner));
        println!("- loser (stamps the ticket): {}", name(outcome.loser));
        for award in &outcome.prize_winners {
            println!(
                "- prize: {} with {} hits -> {:.2}€",
                name(award.member_id),
                award.hits,
                award.amount
            );
        }
    }

    let ledger = service.ledger()?;
    println!(
        "\nFund: {:.2}€ initial, {:.2}€ after {} ledger lines",
        ledger.initial_fund,
        ledger.final_fund,
        ledger.lines.len()
    );

    if args.list_lines {
        println!("\nLedger lines");
        for line in &ledger.lines {
            println!(
                "- {} J{}: due {:.2} penalty {:.2} sellado {:.2} prize {:.2} net {:.2} (running {:.2})",
                line.member_name,
                line.round_number,
                line.weekly_due,
                line.ones_penalty,
                line.sellado,
                line.prize,
                line.net,
                line.cumulative
            );
        }
    }

    if let Some(path) = args.csv {
        std::fs::write(&path, service.ledger_csv()?)?;
        println!("\nLedger export written to {}", path.display());
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn fixtures(pairs: &[(&str, &str)], results: &str) -> Vec<Fixture> {
    let results: Vec<&str> = results.split(',').collect();
    pairs
        .iter()
        .zip(results)
        .map(|((home, away), result)| Fixture {
            home: home.to_string(),
            away: away.to_string(),
            result: result.trim().to_string(),
        })
        .collect()
}

fn column(signs: &str, pleno: &str) -> Vec<Option<Pick>> {
    let mut selection: Vec<Option<Pick>> = signs
        .chars()
        .map(|sign| Some(Pick::new(sign.to_string())))
        .collect();
    selection.push(Some(Pick::new(pleno)));
    selection
}

fn save_json<T: serde::Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    record: &T,
) -> Result<(), AppError> {
    let document = serde_json::to_value(record).expect("demo record serializes");
    store.save(collection, document).map_err(|err| {
        AppError::Pool(quiniela_pool::pool::PoolServiceError::Store(err))
    })
}

/// Two played rounds plus an open one, with enough texture to exercise
/// prizes, exemptions, sellado, and the doubles gate.
fn seed_sample_season(store: &dyn DocumentStore) -> Result<(), AppError> {
    let members = [
        (1, "Alvaro"),
        (2, "Carlos"),
        (3, "Edu"),
        (4, "Marcelo"),
    ];
    for (id, name) in members {
        save_json(
            store,
            collections::MEMBERS,
            &Member {
                id: MemberId(id),
                name: name.to_string(),
                nickname: None,
            },
        )?;
    }

    let pairs_one = [
        ("Getafe", "Sevilla"),
        ("Girona", "Osasuna"),
        ("Betis", "Mallorca"),
        ("Celta", "Valencia"),
        ("Rayo", "Athletic"),
        ("Espanyol", "Alavés"),
        ("Villarreal", "Oviedo"),
        ("Atlético", "Elche"),
        ("Sociedad", "Levante"),
        ("Almería", "Cádiz"),
        ("Granada", "Eibar"),
        ("Málaga", "Córdoba"),
        ("Zaragoza", "Burgos"),
        ("Huesca", "Leganés"),
        ("Barcelona", "Real Madrid"),
    ];

    let mut round_one = Round {
        id: RoundId("j1".to_string()),
        number: 1,
        date: "24/08/2025".to_string(),
        matches: fixtures(
            &pairs_one,
            "2,1,1,2,X,2,1,1,1,X,2,1,X,X,1-1",
        ),
        active: true,
        min_hits_to_win: 10,
        prizes: Default::default(),
    };
    round_one.prizes = serde_json::from_value(json!({ "12": "6,00 €", "13": 15.0 }))
        .expect("demo prize table");
    save_json(store, collections::ROUNDS, &round_one)?;

    let mut round_two = Round {
        id: RoundId("j2".to_string()),
        number: 2,
        date: "31/08/2025".to_string(),
        matches: fixtures(
            &pairs_one,
            "X,X,2,1,X,1,2,1,2,2,2,X,2,2,1-2",
        ),
        active: true,
        min_hits_to_win: 10,
        prizes: Default::default(),
    };
    round_two.prizes =
        serde_json::from_value(json!({ "11": 4.5, "12": 9.0 })).expect("demo prize table");
    save_json(store, collections::ROUNDS, &round_two)?;

    let round_three = Round {
        id: RoundId("j3".to_string()),
        number: 3,
        date: "7 de septiembre de 2025".to_string(),
        matches: fixtures(
            &pairs_one,
            ",,,,,,,,,,,,,,",
        ),
        active: true,
        min_hits_to_win: 10,
        prizes: Default::default(),
    };
    save_json(store, collections::ROUNDS, &round_three)?;

    let selections = [
        // Round 1: Alvaro takes the round and a prize tier, Edu hands his
        // column in late, Marcelo sinks.
        (1, "j1", "21X122111X21XX", "1-1", false),
        (2, "j1", "X2X122111X21XX", "X", false),
        (3, "j1", "2112X2111X2121", "1-1", true),
        (4, "j1", "21211122211211", "2", false),
        // Round 2: Carlos takes the round, Alvaro sits out.
        (2, "j2", "XX21X12122211X", "1-2", false),
        (3, "j2", "12122X21222X22", "X", false),
        (4, "j2", "XX212X121112XX", "1", false),
    ];
    for (member, round, signs, pleno, late) in selections {
        let round_id = RoundId(round.to_string());
        let member_id = MemberId(member);
        let prediction = Prediction {
            id: Prediction::storage_id(&round_id, member_id),
            round_id,
            member_id,
            selection: column(signs, pleno),
            submitted_at: None,
            late,
            pardoned: false,
        };
        save_json(store, collections::PREDICTIONS, &prediction)?;
    }

    save_json(
        store,
        collections::CASH_ENTRIES,
        &quiniela_pool::pool::CashEntry {
            id: "ing-1".to_string(),
            member_id: MemberId(2),
            date: NaiveDate::from_ymd_opt(2025, 8, 30).expect("valid date"),
            amount: 20.0,
        },
    )?;

    let ledger_config = LedgerConfig {
        column_cost: 0.75,
        doubles_cost: 12.0,
        weekly_due: 1.0,
        initial_fund: 150.0,
    };
    let mut ledger_doc = serde_json::to_value(&ledger_config).expect("ledger config serializes");
    ledger_doc["id"] = json!(LEDGER_DOC);
    store
        .save(collections::CONFIG, ledger_doc)
        .map_err(|err| AppError::Pool(quiniela_pool::pool::PoolServiceError::Store(err)))?;

    let rules_doc = json!({
        "id": SCORING_RULES_DOC,
        "entries": [{ "effective": "2025-08-01", "rules": RuleSet::default() }],
    });
    store
        .save(collections::CONFIG, rules_doc)
        .map_err(|err| AppError::Pool(quiniela_pool::pool::PoolServiceError::Store(err)))?;

    Ok(())
}
