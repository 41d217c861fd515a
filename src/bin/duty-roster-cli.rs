#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use duty_roster::{
    io,
    model::{DutyId, DutyKind, DutyShift, PersonId, SwapRequestId, SwapRequestView},
    service::{CreateDutyRequest, DutyQuery, DutyService, GenerateDutyRequest, SwapService, UpdateDutyRequest},
    storage::JsonStorage,
    store::Repository,
    AuditSink, DutyError, JsonLinesAuditSink, TracingAuditSink,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de tours de garde et d'échanges (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du roster
    #[arg(long, global = true, env = "DUTY_ROSTER_FILE", default_value = "duties.json")]
    roster: String,

    /// Journal d'audit JSON-lines (sinon : tracing)
    #[arg(long, global = true, env = "DUTY_ROSTER_AUDIT_LOG")]
    audit_log: Option<String>,

    /// Identifiant de la personne qui agit
    #[arg(long = "as", global = true, env = "DUTY_ROSTER_ACTOR")]
    actor: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer une garde isolée
    Create {
        #[arg(long)]
        kind: DutyKind,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        floor: Option<i32>,
        #[arg(long)]
        assignee: String,
    },

    /// Afficher une garde
    Show {
        #[arg(long)]
        id: String,
    },

    /// Lister les gardes (filtres optionnels)
    List {
        #[arg(long)]
        kind: Option<DutyKind>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },

    /// Modifier partiellement une garde
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        kind: Option<DutyKind>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        floor: Option<i32>,
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Supprimer une garde
    Delete {
        #[arg(long)]
        id: String,
    },

    /// Marquer une garde comme effectuée
    Complete {
        #[arg(long)]
        id: String,
    },

    /// Générer les gardes d'une période en round-robin
    Generate {
        #[arg(long)]
        kind: DutyKind,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// liste "id1,id2,..."
        #[arg(long)]
        assignees: String,
        #[arg(long)]
        floor: Option<i32>,
    },

    /// Échanger immédiatement les titulaires de deux gardes
    Swap {
        #[arg(long)]
        duty: String,
        #[arg(long)]
        with: String,
    },

    /// Proposer un échange de sa garde contre une autre
    Propose {
        #[arg(long)]
        duty: String,
        #[arg(long)]
        target: String,
    },

    /// Approuver une demande reçue
    Approve {
        #[arg(long)]
        request: String,
    },

    /// Refuser une demande reçue
    Reject {
        #[arg(long)]
        request: String,
    },

    /// Demandes en attente sur mes gardes
    Pending,

    /// Mes demandes
    Mine,

    /// Exporter le roster
    Export {
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },
}

fn print_duty(d: &DutyShift) {
    let floor = d.floor.map(|f| f.to_string()).unwrap_or_else(|| "-".to_string());
    println!(
        "{} | {} | {} | floor {} | {}{}",
        d.id,
        d.date,
        d.kind,
        floor,
        d.assignee_id,
        if d.completed { " | done" } else { "" }
    );
}

fn print_swap(v: &SwapRequestView) {
    println!(
        "{} | {} | {} | {} ({}) <-> {} ({})",
        v.request.id,
        v.request.status,
        v.request.requester_id,
        v.source.id,
        v.source.date,
        v.target.id,
        v.target.date
    );
}

fn actor(cli: &Cli) -> Result<PersonId> {
    cli.actor
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PersonId::new)
        .context("missing acting person: pass --as <PERSON_ID> or set DUTY_ROSTER_ACTOR")
}

fn run(cli: Cli) -> Result<i32> {
    let repo = Arc::new(Repository::new(JsonStorage::open(&cli.roster)?));
    let audit: Arc<dyn AuditSink> = match cli.audit_log.as_deref() {
        Some(path) => Arc::new(JsonLinesAuditSink::new(path)),
        None => Arc::new(TracingAuditSink),
    };
    let duties = DutyService::new(Arc::clone(&repo), Arc::clone(&audit));
    let swaps = SwapService::new(Arc::clone(&repo), audit);

    match &cli.cmd {
        Commands::Create { kind, date, floor, assignee } => {
            let who = actor(&cli)?;
            let req = CreateDutyRequest {
                kind: *kind,
                date: date.clone(),
                floor: *floor,
                assignee_id: PersonId::new(assignee),
            };
            print_duty(&duties.create(&who, &req)?);
        }
        Commands::Show { id } => {
            print_duty(&duties.get(&DutyId::new(id))?);
        }
        Commands::List { kind, assignee, from, to } => {
            let query = DutyQuery {
                kind: *kind,
                assignee_id: assignee.as_deref().map(PersonId::new),
                start_date: from.clone(),
                end_date: to.clone(),
            };
            for d in duties.list(&query)? {
                print_duty(&d);
            }
        }
        Commands::Update { id, kind, date, floor, assignee } => {
            let who = actor(&cli)?;
            let req = UpdateDutyRequest {
                kind: *kind,
                date: date.clone(),
                floor: *floor,
                assignee_id: assignee.as_deref().map(PersonId::new),
            };
            print_duty(&duties.update(&who, &DutyId::new(id), &req)?);
        }
        Commands::Delete { id } => {
            let who = actor(&cli)?;
            duties.delete(&who, &DutyId::new(id))?;
            println!("deleted {id}");
        }
        Commands::Complete { id } => {
            let who = actor(&cli)?;
            print_duty(&duties.complete(&who, &DutyId::new(id))?);
        }
        Commands::Generate { kind, start, end, assignees, floor } => {
            let who = actor(&cli)?;
            let assignee_ids: Vec<PersonId> = assignees
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PersonId::new)
                .collect();
            let req = GenerateDutyRequest {
                kind: *kind,
                start_date: start.clone(),
                end_date: end.clone(),
                assignee_ids,
                floor: *floor,
            };
            for d in duties.generate(&who, &req)? {
                print_duty(&d);
            }
        }
        Commands::Swap { duty, with } => {
            let who = actor(&cli)?;
            let (a, b) = duties.exchange_assignees(&who, &DutyId::new(duty), &DutyId::new(with))?;
            print_duty(&a);
            print_duty(&b);
        }
        Commands::Propose { duty, target } => {
            let who = actor(&cli)?;
            print_swap(&swaps.propose(&who, &DutyId::new(duty), &DutyId::new(target))?);
        }
        Commands::Approve { request } => {
            let who = actor(&cli)?;
            print_swap(&swaps.approve(&SwapRequestId::new(request), &who)?);
        }
        Commands::Reject { request } => {
            let who = actor(&cli)?;
            print_swap(&swaps.reject(&SwapRequestId::new(request), &who)?);
        }
        Commands::Pending => {
            let who = actor(&cli)?;
            for v in swaps.list_pending_for_assignee(&who)? {
                print_swap(&v);
            }
        }
        Commands::Mine => {
            let who = actor(&cli)?;
            for v in swaps.list_mine(&who)? {
                print_swap(&v);
            }
        }
        Commands::Export { out_json, out_csv } => {
            let all = duties.list(&DutyQuery::default())?;
            if let Some(path) = out_json {
                let roster = repo.read(|tx| Ok::<_, DutyError>(tx.clone()))?;
                io::export_roster_json(path, &roster)?;
            }
            if let Some(path) = out_csv {
                io::export_duties_csv(path, &all)?;
            }
            println!("exported {} duties", all.len());
        }
    }

    Ok(0)
}

fn main() {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            match err.downcast_ref::<DutyError>() {
                Some(duty_err) => eprintln!("error[{}]: {duty_err}", duty_err.kind()),
                None => eprintln!("error: {err:#}"),
            }
            1
        }
    };

    std::process::exit(code);
}
