use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use medstock_core::actions::stock_status;
use medstock_core::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medstock")]
#[command(about = "Medication stock tracking and dose scheduling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, hide = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage people
    #[command(subcommand)]
    Person(PersonCommand),

    /// Manage medications
    #[command(subcommand)]
    Medication(MedicationCommand),

    /// Manage person/medication associations
    #[command(subcommand)]
    Assoc(AssocCommand),

    /// Track stock and doses
    #[command(subcommand)]
    Stock(StockCommand),

    /// Export associations to CSV
    Export {
        file: PathBuf,

        /// Only export this person's associations
        #[arg(long)]
        person: Option<u32>,
    },

    /// Import associations from CSV
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum PersonCommand {
    Add {
        #[arg(long)]
        first_names: String,
        #[arg(long)]
        surname: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: NaiveDate,
    },
    List,
    Delete {
        #[arg(long)]
        id: u32,
    },
}

#[derive(Subcommand)]
enum MedicationCommand {
    Add { name: String },
    Rename {
        #[arg(long)]
        id: u32,
        #[arg(long)]
        name: String,
    },
    List,
    Delete {
        #[arg(long)]
        id: u32,
    },
}

#[derive(Args)]
struct AssociationFields {
    #[arg(long)]
    person: u32,
    #[arg(long)]
    medication: u32,
    /// Tablets per day
    #[arg(long, allow_negative_numbers = true)]
    dose: i32,
    /// Tablets in stock
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    stock: i32,
    /// Date the ledger was last reconciled (YYYY-MM-DD)
    #[arg(long)]
    last_taken: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum AssocCommand {
    Add {
        #[command(flatten)]
        fields: AssociationFields,
    },
    Update {
        #[arg(long)]
        id: u32,
        #[command(flatten)]
        fields: AssociationFields,
        /// Mark the association inactive
        #[arg(long)]
        inactive: bool,
    },
    Activate {
        #[arg(long)]
        id: u32,
    },
    Deactivate {
        #[arg(long)]
        id: u32,
    },
    SetDose {
        #[arg(long)]
        id: u32,
        #[arg(long, allow_negative_numbers = true)]
        dose: i32,
    },
    List {
        /// Only list this person's associations
        #[arg(long)]
        person: Option<u32>,
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    Delete {
        #[arg(long)]
        id: u32,
    },
}

/// A single association or all of a person's associations
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Association ID
    #[arg(long)]
    id: Option<u32>,
    /// Person ID (applies to all of their active associations)
    #[arg(long)]
    person: Option<u32>,
}

impl Target {
    fn person(&self) -> Result<u32> {
        self.person
            .ok_or_else(|| Error::Other("either --id or --person is required".into()))
    }
}

#[derive(Subcommand)]
enum StockCommand {
    /// Add tablets to the stock
    Add {
        #[arg(long)]
        id: u32,
        #[arg(long, allow_negative_numbers = true)]
        tablets: i32,
    },
    /// Set the stock level
    Set {
        #[arg(long)]
        id: u32,
        #[arg(long, allow_negative_numbers = true)]
        tablets: i32,
    },
    /// Record doses taken
    Take {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 1)]
        doses: u32,
    },
    /// Reverse doses previously recorded
    Untake {
        #[command(flatten)]
        target: Target,
        #[arg(long, default_value_t = 1)]
        doses: u32,
    },
    /// Catch the ledger up to today
    FastForward {
        #[command(flatten)]
        target: Target,
    },
    /// Skip a dose
    Skip {
        #[command(flatten)]
        target: Target,
    },
}

fn main() {
    medstock_core::logging::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config() -> Result<Config> {
    match std::env::var_os("MEDSTOCK_CONFIG") {
        Some(path) => Config::load_from(&PathBuf::from(path)),
        None => Config::load(),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;
    let data_path = match cli.data_dir {
        Some(dir) => dir.join(medstock_core::data::DATA_FILE_NAME),
        None => config.data_file(),
    };

    let clock: Arc<dyn Clock> = match cli.today {
        Some(date) => Arc::new(FixedClock::new(date)),
        None => Arc::new(SystemClock),
    };
    tracing::debug!("Using data file {:?}, today is {}", data_path, clock.today());

    let store = FileStore::new(data_path, clock.clone());

    match cli.command {
        Commands::Person(command) => cmd_person(store, command),
        Commands::Medication(command) => cmd_medication(store, command),
        Commands::Assoc(command) => cmd_assoc(store, clock, &config, command),
        Commands::Stock(command) => {
            let actions = ActionGenerator::new(config.medication.order_lead_time_days);
            let mut ledger = StockLedger::new(store, clock, actions);
            cmd_stock(&mut ledger, &config, command)
        }
        Commands::Export { file, person } => {
            let count = export_associations(
                &store,
                &|a| person.map_or(true, |p| a.person_id == p),
                &file,
            )?;
            println!("✓ Exported {} associations to {}", count, file.display());
            Ok(())
        }
        Commands::Import { file } => {
            let mut store = store;
            let count = import_associations(&mut store, &file)?;
            println!("✓ Imported {} associations", count);
            Ok(())
        }
    }
}

type Store = FileStore<Arc<dyn Clock>>;

fn cmd_person(mut store: Store, command: PersonCommand) -> Result<()> {
    match command {
        PersonCommand::Add {
            first_names,
            surname,
            dob,
        } => {
            let person = store.add_person(&first_names, &surname, dob)?;
            println!("✓ Added person {} with ID {}", person.name(), person.id);
        }
        PersonCommand::List => {
            let people = store.list_people()?;
            if people.is_empty() {
                println!("No people found.");
            }
            for person in people {
                println!("  [{}] {} (born {})", person.id, person.name(), person.date_of_birth);
            }
        }
        PersonCommand::Delete { id } => {
            store.delete_person(id)?;
            println!("✓ Deleted person with ID {}", id);
        }
    }
    Ok(())
}

fn cmd_medication(mut store: Store, command: MedicationCommand) -> Result<()> {
    match command {
        MedicationCommand::Add { name } => {
            let medication = store.add_medication(&name)?;
            println!("✓ Added medication '{}' with ID {}", medication.name, medication.id);
        }
        MedicationCommand::Rename { id, name } => match store.rename_medication(id, &name)? {
            Some(medication) => println!("✓ Renamed medication {} to '{}'", id, medication.name),
            None => return Err(Error::MedicationNotFound(id)),
        },
        MedicationCommand::List => {
            let medications = store.list_medications()?;
            if medications.is_empty() {
                println!("No medications found.");
            }
            for medication in medications {
                println!("  [{}] {}", medication.id, medication.name);
            }
        }
        MedicationCommand::Delete { id } => {
            store.delete_medication(id)?;
            println!("✓ Deleted medication with ID {}", id);
        }
    }
    Ok(())
}

fn cmd_assoc(mut store: Store, clock: Arc<dyn Clock>, config: &Config, command: AssocCommand) -> Result<()> {
    let actions = ActionGenerator::new(config.medication.order_lead_time_days);
    let today = clock.today();

    let changed = match command {
        AssocCommand::Add { fields } => Some(store.add(
            fields.person,
            fields.medication,
            fields.dose,
            fields.stock,
            fields.last_taken,
        )?),
        AssocCommand::Update {
            id,
            fields,
            inactive,
        } => {
            let update = AssociationUpdate {
                person_id: fields.person,
                medication_id: fields.medication,
                daily_dose: fields.dose,
                stock: fields.stock,
                last_taken: fields.last_taken,
                active: !inactive,
            };
            Some(require(id, store.update(id, &update)?)?)
        }
        AssocCommand::Activate { id } => Some(require(id, store.activate(id)?)?),
        AssocCommand::Deactivate { id } => Some(require(id, store.deactivate(id)?)?),
        AssocCommand::SetDose { id, dose } => Some(require(id, store.set_dose(id, dose)?)?),
        AssocCommand::Delete { id } => {
            store.delete(id)?;
            println!("✓ Deleted medication association with ID {}", id);
            None
        }
        AssocCommand::List { person, page, json } => {
            let associations = store.list(
                &|a| person.map_or(true, |p| a.person_id == p),
                page,
                config.display.page_size,
            )?;
            let tracked = actions.track_all(associations, today);

            if json {
                println!("{}", serde_json::to_string_pretty(&tracked)?);
            } else if tracked.is_empty() {
                println!("No medication associations found.");
            } else {
                let data = store.snapshot()?;
                for association in &tracked {
                    display_association(association, &data, config);
                }
            }
            None
        }
    };

    if let Some(association) = changed {
        let data = store.snapshot()?;
        println!("✓ Saved medication association with ID {}", association.id);
        display_association(&actions.track(association, today), &data, config);
    }
    Ok(())
}

fn cmd_stock(ledger: &mut StockLedger<Store, Arc<dyn Clock>>, config: &Config, command: StockCommand) -> Result<()> {
    let updated = match command {
        StockCommand::Add { id, tablets } => vec![require(id, ledger.add_stock(id, tablets)?)?],
        StockCommand::Set { id, tablets } => vec![require(id, ledger.set_stock(id, tablets)?)?],
        StockCommand::Take { target, doses } => match target.id {
            Some(id) => vec![require(id, ledger.decrement(id, doses)?)?],
            None => ledger.decrement_all(target.person()?, doses)?,
        },
        StockCommand::Untake { target, doses } => match target.id {
            Some(id) => vec![require(id, ledger.increment(id, doses)?)?],
            None => ledger.increment_all(target.person()?, doses)?,
        },
        StockCommand::FastForward { target } => match target.id {
            Some(id) => {
                // Fast forward leaves a ledger reconciled through today untouched
                let current = require(id, ledger.get(id)?)?;
                if !current.association.is_due(ledger.today()) {
                    println!("✓ Medication association with ID {} is already up to date", id);
                    return Ok(());
                }
                vec![require(id, ledger.fast_forward(id)?)?]
            }
            None => ledger.fast_forward_all(target.person()?)?,
        },
        StockCommand::Skip { target } => match target.id {
            Some(id) => vec![require(id, ledger.skip(id)?)?],
            None => ledger.skip_all(target.person()?)?,
        },
    };

    if updated.is_empty() {
        println!("No medication associations needed updating.");
        return Ok(());
    }

    let data = ledger.store().snapshot()?;
    println!("✓ Updated {} medication association(s)", updated.len());
    for association in &updated {
        display_association(association, &data, config);
    }
    Ok(())
}

fn require<T>(id: u32, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| Error::Other(format!("Medication association with ID {} does not exist", id)))
}

fn display_association(tracked: &TrackedAssociation, data: &HealthData, config: &Config) {
    let association = &tracked.association;
    let person = data
        .person(association.person_id)
        .map(|p| p.name())
        .unwrap_or_else(|| format!("person {}", association.person_id));
    let medication = data
        .medication(association.medication_id)
        .map(|m| m.name.clone())
        .unwrap_or_else(|| format!("medication {}", association.medication_id));
    let status = stock_status(
        association,
        config.medication.days_remaining_warning_days,
        config.medication.days_remaining_critical_days,
    );
    let last_taken = association
        .last_taken
        .map_or_else(|| "never".to_string(), |d| d.to_string());

    println!();
    println!(
        "  [{}] {} / {}{}",
        association.id,
        person,
        medication,
        if association.active { "" } else { " (inactive)" }
    );
    println!(
        "      Dose: {}/day  Stock: {} ({} days, {})  Last taken: {}",
        association.daily_dose,
        association.stock,
        association.days_remaining(),
        status,
        last_taken
    );
    if let Some(order_date) = association.order_more_date(config.medication.order_lead_time_days) {
        println!("      Order by: {}", order_date);
    }
    if tracked.shortfall > 0 {
        println!("      ! {} tablets short, stock clamped to 0", tracked.shortfall);
    }
    for action in &tracked.actions {
        println!("      → {}", action);
    }
}
